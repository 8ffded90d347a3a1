//! Installation settings.
//!
//! Settings are read fresh for every reconciliation batch and passed
//! explicitly into each engine operation.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use stonks_primitives::Shares;

/// Placeholder replaced by the numeric shares value.
pub const SHARES_PLACEHOLDER: &str = "{{shares}}";

/// Placeholder replaced by "s" when shares > 1.
pub const PLURAL_PLACEHOLDER: &str = "{{s}}";

pub const DEFAULT_SHARES_FACTOR: f64 = 0.1;
pub const DEFAULT_BADGE_TEXT: &str = ":stonks: {{shares}} share{{s}}";
pub const DEFAULT_BADGE_CSS_CLASS: &str = "april24";
pub const DEFAULT_LEADERBOARD_MIN_SCORE: Shares = 1;
pub const DEFAULT_LEADERBOARD_PAGE_SIZE: usize = 7;
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 60;

/// Settings shared between the periodic job and the settings boundary.
pub type SharedSettings = Arc<RwLock<Settings>>;

/// Errors raised at the settings boundary. Never reach the engine.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Badge text must not be empty.")]
    BadgeTextEmpty,

    #[error("Badge text must contain the placeholder {{{{shares}}}}.")]
    BadgeTextMissingPlaceholder,

    #[error("shares factor must be a positive number, got {0}")]
    InvalidSharesFactor(f64),

    #[error("leaderboard page size must be at least 1")]
    InvalidPageSize,

    #[error("update interval must be at least one second")]
    InvalidUpdateInterval,

    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Per-installation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Whether new submissions are tracked.
    pub accepting_new_submissions: bool,

    /// Shares awarded per point of cumulative score.
    pub shares_factor: f64,

    /// Replace badges that were assigned by someone else.
    pub badge_overwrite: bool,

    /// Badge template applied alongside the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_template_id: Option<String>,

    /// Badge text, must contain `{{shares}}`.
    pub badge_text: String,

    pub badge_css_class: String,

    /// Minimum shares to appear on the leaderboard.
    pub leaderboard_min_score: Shares,

    /// Link shown next to the leaderboard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard_help_url: Option<String>,

    pub leaderboard_page_size: usize,

    /// Stop the periodic job and ignore moderation triggers.
    pub disable_updates: bool,

    /// Seconds between reconciliation batches.
    pub update_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accepting_new_submissions: false,
            shares_factor: DEFAULT_SHARES_FACTOR,
            badge_overwrite: false,
            badge_template_id: None,
            badge_text: DEFAULT_BADGE_TEXT.to_owned(),
            badge_css_class: DEFAULT_BADGE_CSS_CLASS.to_owned(),
            leaderboard_min_score: DEFAULT_LEADERBOARD_MIN_SCORE,
            leaderboard_help_url: None,
            leaderboard_page_size: DEFAULT_LEADERBOARD_PAGE_SIZE,
            disable_updates: false,
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
        }
    }
}

/// Validate a badge text template as entered by the operator.
pub fn validate_badge_text(text: &str) -> Result<(), SettingsError> {
    if text.is_empty() {
        return Err(SettingsError::BadgeTextEmpty);
    }
    if !text.contains(SHARES_PLACEHOLDER) {
        return Err(SettingsError::BadgeTextMissingPlaceholder);
    }
    Ok(())
}

impl Settings {
    /// Check every field an operator can get wrong.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_badge_text(&self.badge_text)?;
        if !self.shares_factor.is_finite() || self.shares_factor <= 0.0 {
            return Err(SettingsError::InvalidSharesFactor(self.shares_factor));
        }
        if self.leaderboard_page_size == 0 {
            return Err(SettingsError::InvalidPageSize);
        }
        if self.update_interval_secs == 0 {
            return Err(SettingsError::InvalidUpdateInterval);
        }
        Ok(())
    }

    /// Non-empty badge template id.
    pub fn template_id(&self) -> Option<&str> {
        self.badge_template_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Load settings from a TOML file, or defaults if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save the settings to the given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    pub fn shared(self) -> SharedSettings {
        Arc::new(RwLock::new(self))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert!(!settings.accepting_new_submissions);
        assert_eq!(settings.shares_factor, 0.1);
        assert_eq!(settings.badge_css_class, "april24");
        assert_eq!(settings.leaderboard_min_score, 1);
        assert_eq!(settings.update_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_badge_text_validation() {
        assert_matches!(validate_badge_text(""), Err(SettingsError::BadgeTextEmpty));
        assert_matches!(
            validate_badge_text("{shares} shares"),
            Err(SettingsError::BadgeTextMissingPlaceholder)
        );
        validate_badge_text("{{shares}}").unwrap();

        assert_eq!(
            SettingsError::BadgeTextMissingPlaceholder.to_string(),
            "Badge text must contain the placeholder {{shares}}."
        );
    }

    #[test]
    fn test_shares_factor_validation() {
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let settings = Settings {
                shares_factor: factor,
                ..Default::default()
            };
            assert_matches!(settings.validate(), Err(SettingsError::InvalidSharesFactor(_)));
        }
    }

    #[test]
    fn test_empty_template_id_is_ignored() {
        let mut settings = Settings {
            badge_template_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(settings.template_id(), None);

        settings.badge_template_id = Some("tmpl-1".into());
        assert_eq!(settings.template_id(), Some("tmpl-1"));
    }

    #[test]
    fn test_toml_roundtrip_with_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        assert_eq!(Settings::load_or_default(&path).unwrap(), Settings::default());

        let settings = Settings {
            accepting_new_submissions: true,
            shares_factor: 0.5,
            badge_template_id: Some("abc".into()),
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load_or_default(&path).unwrap(), settings);

        std::fs::write(&path, "sharesFactor = 2.0\nbadgeOverwrite = true\n").unwrap();
        let partial = Settings::load_or_default(&path).unwrap();
        assert_eq!(partial.shares_factor, 2.0);
        assert!(partial.badge_overwrite);
        assert_eq!(partial.badge_text, DEFAULT_BADGE_TEXT);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "badgeText = \"no placeholder\"\n").unwrap();
        assert_matches!(
            Settings::load_or_default(&path),
            Err(SettingsError::BadgeTextMissingPlaceholder)
        );
    }
}
