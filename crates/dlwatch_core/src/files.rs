use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use watch_logging::{watch_debug, watch_warn};

/// One completed output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    /// Seconds since the epoch.
    pub mtime: Option<i64>,
}

/// Bytes `encodeURIComponent` leaves alone: alphanumerics and `-_.!~*'()`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes `name` as a single URL component.
pub fn encode_component(name: &str) -> String {
    utf8_percent_encode(name, COMPONENT).to_string()
}

/// Server path of an artifact, with the name percent-encoded as one
/// component.
pub fn download_path(name: &str) -> String {
    format!("/download/{}", encode_component(name))
}

/// Snapshot of `GET /api/files`, refreshed on demand.
///
/// A refresh requested while one is outstanding is remembered and issued
/// once the outstanding one resolves, so a `Done` job arriving mid-fetch
/// still shows its artifact.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileRegistry {
    files: Vec<FileEntry>,
    loaded: bool,
    in_flight: bool,
    refresh_pending: bool,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// False until the first snapshot arrived.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns whether a fetch should be issued now.
    pub fn request_refresh(&mut self) -> bool {
        if self.in_flight {
            watch_debug!("File refresh already in flight; queued another");
            self.refresh_pending = true;
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Returns whether a queued follow-up fetch should be issued now.
    pub fn apply_snapshot(&mut self, files: Vec<FileEntry>) -> bool {
        self.files = files;
        self.loaded = true;
        self.finish()
    }

    pub fn apply_failure(&mut self, error: &str) -> bool {
        watch_warn!("File list refresh failed: {}", error);
        self.finish()
    }

    fn finish(&mut self) -> bool {
        self.in_flight = false;
        if std::mem::take(&mut self.refresh_pending) {
            self.in_flight = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_path_encodes_name_as_single_component() {
        assert_eq!(download_path("a.mp4"), "/download/a.mp4");
        assert_eq!(
            download_path("My Clip + more/x?.mp4"),
            "/download/My%20Clip%20%2B%20more%2Fx%3F.mp4"
        );
    }

    #[test]
    fn download_path_keeps_component_safe_punctuation() {
        assert_eq!(
            download_path("My Clip (1) & Friends' ~*!.mp4"),
            "/download/My%20Clip%20(1)%20%26%20Friends'%20~*!.mp4"
        );
        assert_eq!(download_path("Café.mp3"), "/download/Caf%C3%A9.mp3");
    }

    #[test]
    fn refresh_during_fetch_is_coalesced_into_one_follow_up() {
        let mut registry = FileRegistry::new();
        assert!(registry.request_refresh());
        assert!(!registry.request_refresh());
        assert!(!registry.request_refresh());

        assert!(registry.apply_snapshot(Vec::new()));
        assert!(!registry.apply_failure("boom"));
        assert!(registry.request_refresh());
    }
}
