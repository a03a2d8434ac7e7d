// Client configuration.
//
// The binary fills this from flags and environment variables; the library
// only ever sees the finished struct.

use std::fmt;

use reqwest::Url;

use crate::api::TriggerAction;
use crate::error::AdaError;

/// Everything the client needs to talk to one Ada deployment.
#[derive(Clone)]
pub struct AdaConfig {
    /// Always ends with a single `/`, endpoints are appended directly.
    pub base_url: String,
    pub email: String,
    pub password: String,
    /// Template used by `trigger_default`. Zero means "not configured".
    pub default_template_id: i64,
    pub default_trigger_action: TriggerAction,
}

impl AdaConfig {
    /// Build a config with the default template (0) and action (`load`).
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, AdaError> {
        let base_url = normalize_base_url(&base_url.into())?;
        Ok(AdaConfig {
            base_url,
            email: email.into(),
            password: password.into(),
            default_template_id: 0,
            default_trigger_action: TriggerAction::Load,
        })
    }

    pub fn with_template_id(mut self, template_id: i64) -> Self {
        self.default_template_id = template_id;
        self
    }

    pub fn with_trigger_action(mut self, action: TriggerAction) -> Self {
        self.default_trigger_action = action;
        self
    }

    /// Absolute URL for a path relative to the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// Keep the password out of logs and panic messages.
impl fmt::Debug for AdaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("password", &"***")
            .field("default_template_id", &self.default_template_id)
            .field("default_trigger_action", &self.default_trigger_action)
            .finish()
    }
}

fn normalize_base_url(raw: &str) -> Result<String, AdaError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AdaError::Config("base URL must not be empty".into()));
    }
    let normalized = format!("{trimmed}/");
    Url::parse(&normalized)
        .map_err(|e| AdaError::Config(format!("invalid base URL {trimmed:?}: {e}")))?;
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_exactly_one_trailing_slash() {
        let a = AdaConfig::new("https://ada.example.com", "e", "p").unwrap();
        let b = AdaConfig::new("https://ada.example.com//", "e", "p").unwrap();
        assert_eq!(a.base_url, "https://ada.example.com/");
        assert_eq!(b.base_url, "https://ada.example.com/");
        assert_eq!(a.url("api/v2/upload/"), "https://ada.example.com/api/v2/upload/");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let err = AdaConfig::new("  / ", "e", "p").unwrap_err();
        assert!(matches!(err, AdaError::Config(_)));
    }

    #[test]
    fn unparseable_base_url_is_rejected() {
        let err = AdaConfig::new("ada.example.com", "e", "p").unwrap_err();
        assert!(err.to_string().contains("invalid base URL"));
    }

    #[test]
    fn defaults_and_overrides() {
        let cfg = AdaConfig::new("http://x", "e", "p").unwrap();
        assert_eq!(cfg.default_template_id, 0);
        assert_eq!(cfg.default_trigger_action, TriggerAction::Load);

        let cfg = cfg
            .with_template_id(7)
            .with_trigger_action(TriggerAction::Difference);
        assert_eq!(cfg.default_template_id, 7);
        assert_eq!(cfg.default_trigger_action, TriggerAction::Difference);
    }

    #[test]
    fn debug_hides_password() {
        let cfg = AdaConfig::new("http://x", "me@example.com", "hunter2").unwrap();
        let rendered = format!("{cfg:?}");
        assert!(rendered.contains("me@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
