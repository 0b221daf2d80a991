// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as known log levels, non-empty paths, and bounded face-match thresholds.

use crate::diagnostic::ConfigError;
use crate::model::PinvaultConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// The smallest PIN length the vault will ever accept. Config may only raise it.
pub const MIN_PIN_LENGTH_FLOOR: usize = 6;

/// Generated passwords need one slot per required character class.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PinvaultConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.general.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "general.log_level `{}` is not one of {}",
                config.general.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.security.min_pin_length < MIN_PIN_LENGTH_FLOOR {
        errors.push(ConfigError::Validation {
            message: format!(
                "security.min_pin_length must be at least {MIN_PIN_LENGTH_FLOOR}, got {}",
                config.security.min_pin_length
            ),
        });
    }

    if config.security.password_length < MIN_PASSWORD_LENGTH {
        errors.push(ConfigError::Validation {
            message: format!(
                "security.password_length must be at least {MIN_PASSWORD_LENGTH}, got {}",
                config.security.password_length
            ),
        });
    }

    let threshold = config.face.match_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        errors.push(ConfigError::Validation {
            message: format!("face.match_threshold must be within 0.0..=1.0, got {threshold}"),
        });
    }

    let max_angle = config.face.max_angle_degrees;
    if !(0.0..=90.0).contains(&max_angle) {
        errors.push(ConfigError::Validation {
            message: format!("face.max_angle_degrees must be within 0..=90, got {max_angle}"),
        });
    }

    if config.face.required_templates == 0 {
        errors.push(ConfigError::Validation {
            message: "face.required_templates must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
