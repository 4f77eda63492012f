//! Configuration management.

use serde::Deserialize;

/// Main configuration for the memory engine.
#[derive(Debug, Clone)]
pub struct MnemographConfig {
    /// Canonical id of the speaking user's entity. First-person references
    /// ("I", "me", "my") normalize to this entity.
    pub user_entity_id: String,
    /// Display name for the user entity.
    pub user_display_name: String,
    /// Entity resolution behavior.
    pub normalization: NormalizationConfig,
    /// Contradiction resolution and write-path behavior.
    pub resolution: ResolutionConfig,
    /// Reminder evaluation behavior.
    pub reminders: ReminderConfig,
}

/// Entity resolution settings.
#[derive(Debug, Clone)]
pub struct NormalizationConfig {
    /// When true, an unresolvable entity reference rejects the ingest
    /// instead of optimistically creating a new entity.
    pub strict_resolution: bool,
    /// Similarity threshold in `[0, 1]` above which a surface form is
    /// treated as an alias of an existing entity.
    pub fuzzy_match_threshold: f32,
}

/// Contradiction resolution and write-path settings.
#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    /// A later observation whose confidence falls more than this far below
    /// the current value's confidence is flagged instead of superseding.
    pub confidence_floor: f32,
    /// How many times a write retries a contended slot before surfacing
    /// a conflict.
    pub max_write_attempts: u32,
    /// Base backoff between slot acquisition attempts, in milliseconds.
    /// Grows linearly with the attempt count.
    pub write_backoff_ms: u64,
}

/// Reminder evaluation settings.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// How far ahead of the due time a commitment surfaces as upcoming,
    /// in seconds.
    pub horizon_secs: i64,
}

impl Default for MnemographConfig {
    fn default() -> Self {
        Self {
            user_entity_id: "user".to_string(),
            user_display_name: "User".to_string(),
            normalization: NormalizationConfig {
                strict_resolution: false,
                fuzzy_match_threshold: 0.8,
            },
            resolution: ResolutionConfig {
                confidence_floor: 0.25,
                max_write_attempts: 8,
                write_backoff_ms: 5,
            },
            reminders: ReminderConfig {
                horizon_secs: 24 * 60 * 60,
            },
        }
    }
}

impl MnemographConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file, falling back to defaults for
    /// any omitted key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] if the file cannot be read or
    /// parsed, or a loaded value is out of range.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Validation(format!("read config file: {e}")))?;
        let file: ConfigFile = toml::from_str(&contents)
            .map_err(|e| crate::Error::Validation(format!("parse config file: {e}")))?;
        Self::from_config_file(file)
    }

    fn from_config_file(file: ConfigFile) -> crate::Result<Self> {
        let mut config = Self::default();
        if let Some(id) = file.user_entity_id {
            config.user_entity_id = id;
        }
        if let Some(name) = file.user_display_name {
            config.user_display_name = name;
        }
        if let Some(n) = file.normalization {
            if let Some(strict) = n.strict_resolution {
                config.normalization.strict_resolution = strict;
            }
            if let Some(threshold) = n.fuzzy_match_threshold {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(crate::Error::Validation(format!(
                        "fuzzy_match_threshold {threshold} outside [0, 1]"
                    )));
                }
                config.normalization.fuzzy_match_threshold = threshold;
            }
        }
        if let Some(r) = file.resolution {
            if let Some(floor) = r.confidence_floor {
                if !(0.0..=1.0).contains(&floor) {
                    return Err(crate::Error::Validation(format!(
                        "confidence_floor {floor} outside [0, 1]"
                    )));
                }
                config.resolution.confidence_floor = floor;
            }
            if let Some(attempts) = r.max_write_attempts {
                if attempts == 0 {
                    return Err(crate::Error::Validation(
                        "max_write_attempts must be at least 1".to_string(),
                    ));
                }
                config.resolution.max_write_attempts = attempts;
            }
            if let Some(backoff) = r.write_backoff_ms {
                config.resolution.write_backoff_ms = backoff;
            }
        }
        if let Some(rem) = file.reminders {
            if let Some(horizon) = rem.horizon_secs {
                if horizon < 0 {
                    return Err(crate::Error::Validation(
                        "reminder horizon_secs must be non-negative".to_string(),
                    ));
                }
                config.reminders.horizon_secs = horizon;
            }
        }
        Ok(config)
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Canonical user entity id.
    pub user_entity_id: Option<String>,
    /// User display name.
    pub user_display_name: Option<String>,
    /// Normalization section.
    pub normalization: Option<ConfigFileNormalization>,
    /// Resolution section.
    pub resolution: Option<ConfigFileResolution>,
    /// Reminders section.
    pub reminders: Option<ConfigFileReminders>,
}

/// Normalization section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileNormalization {
    /// Strict resolution flag.
    pub strict_resolution: Option<bool>,
    /// Fuzzy match threshold.
    pub fuzzy_match_threshold: Option<f32>,
}

/// Resolution section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileResolution {
    /// Confidence floor.
    pub confidence_floor: Option<f32>,
    /// Max write attempts.
    pub max_write_attempts: Option<u32>,
    /// Write backoff in milliseconds.
    pub write_backoff_ms: Option<u64>,
}

/// Reminders section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileReminders {
    /// Upcoming horizon in seconds.
    pub horizon_secs: Option<i64>,
}
