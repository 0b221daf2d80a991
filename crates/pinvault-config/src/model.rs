// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Pinvault credential vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Pinvault configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PinvaultConfig {
    /// Logging and process-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Local document store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// PIN and password policy.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Face-match verification settings.
    #[serde(default)]
    pub face: FaceConfig,
}

/// Logging and process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Local document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "pinvault.db".to_string()
}

/// PIN and generated-password policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Minimum master PIN length accepted at enrollment (default: 6).
    #[serde(default = "default_min_pin_length")]
    pub min_pin_length: usize,

    /// Length of generated passwords (default: 16).
    #[serde(default = "default_password_length")]
    pub password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            min_pin_length: default_min_pin_length(),
            password_length: default_password_length(),
        }
    }
}

fn default_min_pin_length() -> usize {
    6
}

fn default_password_length() -> usize {
    16
}

/// Face-match verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FaceConfig {
    /// A candidate matches when its best similarity score exceeds this value.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    /// Maximum absolute roll, pitch, and yaw (degrees) for a front-facing capture.
    #[serde(default = "default_max_angle_degrees")]
    pub max_angle_degrees: f64,

    /// Accepted captures needed to complete face enrollment.
    #[serde(default = "default_required_templates")]
    pub required_templates: usize,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            max_angle_degrees: default_max_angle_degrees(),
            required_templates: default_required_templates(),
        }
    }
}

fn default_match_threshold() -> f64 {
    0.8
}

fn default_max_angle_degrees() -> f64 {
    20.0
}

fn default_required_templates() -> usize {
    4
}
