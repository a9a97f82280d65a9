use std::time::Duration;

/// Presets offered by the reference server, in display order.
pub const DEFAULT_PRESETS: [&str; 4] = [
    "Video (Best MP4)",
    "Video (4K/High Res)",
    "Video (1080p MP4)",
    "Audio (MP3 Best)",
];

/// Startup configuration that only seeds the submission form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefaults {
    pub presets: Vec<String>,
    pub default_preset: String,
    pub download_dir: String,
    pub cookies_available: bool,
    pub cookies_path: Option<String>,
}

impl Default for FormDefaults {
    fn default() -> Self {
        let presets: Vec<String> = DEFAULT_PRESETS.iter().map(|p| p.to_string()).collect();
        Self {
            default_preset: presets[0].clone(),
            presets,
            download_dir: "/downloads".to_string(),
            cookies_available: false,
            cookies_path: None,
        }
    }
}

impl FormDefaults {
    pub fn has_preset(&self, preset: &str) -> bool {
        self.presets.iter().any(|p| p == preset)
    }

    pub fn cookie_hint(&self) -> String {
        match (&self.cookies_path, self.cookies_available) {
            (Some(path), true) => format!("Using cookies from {path}"),
            _ => "cookies.txt not mounted. Set COOKIES_PATH to enable.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub status: Duration,
    pub tasks: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            status: Duration::from_millis(1000),
            tasks: Duration::from_millis(1500),
        }
    }
}
