use serde::Serialize;
use thiserror::Error;

use crate::config::FormDefaults;
use crate::job::JobId;

/// Body of `POST /api/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub url: String,
    pub preset: String,
    pub use_cookies: bool,
}

/// Raw, unvalidated form fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitForm {
    pub url: String,
    pub preset: String,
    pub use_cookies: bool,
}

impl SubmitForm {
    pub fn from_defaults(defaults: &FormDefaults) -> Self {
        Self {
            url: String::new(),
            preset: defaults.default_preset.clone(),
            use_cookies: defaults.cookies_available,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please paste a URL.")]
    EmptyUrl,
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

/// What the server made of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Job(JobId),
    /// Multi-URL text the server split into `count` jobs without returning ids.
    Batch { count: usize },
}

/// Checks the form locally; no request is made for a rejected form.
///
/// The url is only trimmed. Multi-line text is forwarded as-is and the
/// server decides how many jobs it becomes.
pub fn validate(form: &SubmitForm, defaults: &FormDefaults) -> Result<Submission, ValidationError> {
    let url = form.url.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let preset = match form.preset.trim() {
        "" => defaults.default_preset.clone(),
        name if defaults.has_preset(name) => name.to_string(),
        name => return Err(ValidationError::UnknownPreset(name.to_string())),
    };

    Ok(Submission {
        url: url.to_string(),
        preset,
        use_cookies: form.use_cookies && defaults.cookies_available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(url: &str, preset: &str, use_cookies: bool) -> SubmitForm {
        SubmitForm {
            url: url.to_string(),
            preset: preset.to_string(),
            use_cookies,
        }
    }

    #[test]
    fn blank_url_is_rejected() {
        let defaults = FormDefaults::default();
        assert_eq!(
            validate(&form("  \n ", "", false), &defaults),
            Err(ValidationError::EmptyUrl)
        );
    }

    #[test]
    fn multi_line_url_text_is_forwarded_unsplit() {
        let defaults = FormDefaults::default();
        let submission = validate(&form(" http://a\nhttp://b \n", "", false), &defaults).unwrap();
        assert_eq!(submission.url, "http://a\nhttp://b");
        assert_eq!(submission.preset, defaults.default_preset);
    }

    #[test]
    fn unknown_preset_is_rejected_and_cookies_need_a_mounted_file() {
        let mut defaults = FormDefaults::default();
        assert_eq!(
            validate(&form("http://x", "mkv", true), &defaults),
            Err(ValidationError::UnknownPreset("mkv".into()))
        );

        let submission = validate(&form("http://x", "Audio (MP3 Best)", true), &defaults).unwrap();
        assert!(!submission.use_cookies);

        defaults.cookies_available = true;
        let submission = validate(&form("http://x", "Audio (MP3 Best)", true), &defaults).unwrap();
        assert!(submission.use_cookies);
    }
}
