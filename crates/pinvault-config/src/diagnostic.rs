// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment errors into miette diagnostics.
//!
//! Unknown keys are pointed at in the TOML file they came from and get a
//! "did you mean" hint ranked by Jaro-Winkler similarity.

#![allow(unused_assignments)] // emitted by the miette Diagnostic derive

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Suggestions scoring at or below this are dropped as noise.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One problem found while loading or validating `pinvault.toml`.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(pinvault::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, if any is close enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted in the same section.
        valid_keys: String,
        #[label("not a pinvault setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(pinvault::config::invalid_type), help("use a {expected}"))]
    InvalidType {
        /// Dotted path such as `security.min_pin_length`.
        key: String,
        detail: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(pinvault::config::missing_key),
        help("set `{key}` in pinvault.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but is out of range.
    #[error("validation error: {message}")]
    #[diagnostic(code(pinvault::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(pinvault::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by `err` into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs for the files that were
/// read, so unknown keys can be underlined in place.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = locate_unknown_key(&error, field, toml_sources)
                    .map_or((None, None), |(span, src)| (Some(span), Some(src)));
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.clone(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Pick the source that produced `error` and find `field` in it.
///
/// Errors from in-memory TOML carry no file path; a single supplied source
/// is then assumed to be the origin.
fn locate_unknown_key(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|source| match source {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let (path, content) = match origin {
        Some(origin) => toml_sources.iter().find(|(path, _)| *path == origin)?,
        None if toml_sources.len() == 1 => &toml_sources[0],
        None => return None,
    };

    let offset = find_key_offset(content, &error.path, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(path, content.clone()),
    ))
}

/// Byte offset of `field` inside the table named by `path`.
///
/// Only the first path segment selects a table (`[face]`); an empty path
/// means the top level, before any table header.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let wanted = path.first().map(String::as_str);
    let mut table: Option<&str> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(header) = trimmed.strip_prefix('[') {
            table = header.split(']').next().map(str::trim);
        } else if table == wanted {
            let is_key = matches!(
                trimmed.strip_prefix(field),
                Some(rest) if rest.trim_start().starts_with('=')
            );
            if is_key {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// The valid key most similar to `unknown`, if it clears the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print each error to stderr with miette's graphical renderer.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typo_in_security_key_is_suggested() {
        let valid = &["min_pin_length", "password_length"];
        assert_eq!(
            suggest_key("min_pin_lenght", valid).as_deref(),
            Some("min_pin_length")
        );
    }

    #[test]
    fn closest_of_several_candidates_wins() {
        let valid = &["max_angle_degrees", "match_threshold", "required_templates"];
        assert_eq!(
            suggest_key("match_treshold", valid).as_deref(),
            Some("match_threshold")
        );
    }

    #[test]
    fn unrelated_word_gets_no_suggestion() {
        assert_eq!(suggest_key("zzzzzz", &["min_pin_length"]), None);
    }

    #[test]
    fn key_is_found_inside_its_table_only() {
        let content = "match_treshold = 1\n[storage]\ndatabase_path = \"a.db\"\n\n[face]\n  match_treshold = 0.9\n";
        let offset = find_key_offset(content, &["face".to_string()], "match_treshold").unwrap();
        assert_eq!(&content[offset..offset + 14], "match_treshold");
        assert!(offset > content.find("[face]").unwrap());
    }

    #[test]
    fn top_level_key_is_found_before_tables() {
        let content = "databse = 1\n[general]\nlog_level = \"info\"\n";
        assert_eq!(find_key_offset(content, &[], "databse"), Some(0));
    }

    #[test]
    fn prefix_of_longer_key_does_not_match() {
        let content = "[face]\nmatch_threshold_x = 0.9\n";
        assert!(find_key_offset(content, &["face".to_string()], "match_threshold").is_none());
    }

    #[test]
    fn missing_table_yields_none() {
        let content = "[storage]\ndatabase_path = \"a.db\"\n";
        assert!(find_key_offset(content, &["face".to_string()], "match_threshold").is_none());
    }

    #[test]
    fn unknown_key_help_lists_valid_keys() {
        let help = unknown_key_help(Some("log_level"), "log_level");
        assert!(help.contains("did you mean `log_level`?"));
        assert_eq!(unknown_key_help(None, "a, b"), "valid keys: a, b");
    }
}
