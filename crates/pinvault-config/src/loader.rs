// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pinvault.toml` > `~/.config/pinvault/pinvault.toml` > `/etc/pinvault/pinvault.toml`
//! with environment variable overrides via `PINVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PinvaultConfig;

/// System-wide config file path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/pinvault/pinvault.toml";

/// Config file name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "pinvault.toml";

/// Path of the per-user XDG config file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pinvault/pinvault.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pinvault/pinvault.toml` (system-wide)
/// 3. `~/.config/pinvault/pinvault.toml` (user XDG config)
/// 4. `./pinvault.toml` (local directory)
/// 5. `PINVAULT_*` environment variables
pub fn load_config() -> Result<PinvaultConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PinvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PinvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PinvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PinvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PinvaultConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PINVAULT_SECURITY_MIN_PIN_LENGTH` must map to
/// `security.min_pin_length`, not `security.min.pin.length`.
fn env_provider() -> Env {
    // PINVAULT_MASTER_KEY carries the master secret for headless use, not config.
    Env::prefixed("PINVAULT_")
        .ignore(&["master_key"])
        .map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config key.
///
/// Only the section prefix is rewritten; unknown names pass through unchanged.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ["general", "storage", "security", "face"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("security_min_pin_length"), "security.min_pin_length");
        assert_eq!(map_env_key("face_match_threshold"), "face.match_threshold");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("general_log_level"), "general.log_level");
    }

    #[test]
    fn upper_case_env_keys_map_to_sections() {
        assert_eq!(
            map_env_key(&"SECURITY_MIN_PIN_LENGTH".to_ascii_lowercase()),
            "security.min_pin_length"
        );
    }

    #[test]
    #[serial_test::serial]
    fn env_provider_applies_section_overrides() {
        // SAFETY: serialized with every other env-mutating test.
        unsafe {
            std::env::set_var("PINVAULT_SECURITY_MIN_PIN_LENGTH", "9");
            std::env::set_var("PINVAULT_GENERAL_LOG_LEVEL", "debug");
        }
        let config: Result<PinvaultConfig, figment::Error> = Figment::new()
            .merge(Serialized::defaults(PinvaultConfig::default()))
            .merge(env_provider())
            .extract();
        unsafe {
            std::env::remove_var("PINVAULT_SECURITY_MIN_PIN_LENGTH");
            std::env::remove_var("PINVAULT_GENERAL_LOG_LEVEL");
        }

        let config = config.expect("env overrides should load");
        assert_eq!(config.security.min_pin_length, 9);
        assert_eq!(config.general.log_level, "debug");
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("master_key"), "master_key");
    }
}
