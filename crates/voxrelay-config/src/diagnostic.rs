// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment errors are turned into [`ConfigError`]s that name the voxrelay
//! table they occurred in (`[relay]`, `[tenants.acme]`, ...), point at the
//! offending key in the TOML source when it can be found, and offer a
//! Jaro-Winkler "did you mean" for misspelled keys.

#![allow(unused_assignments)] // triggered by the miette derive

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no voxrelay table accepts.
    #[error("unknown key `{key}` in {table}")]
    #[diagnostic(
        code(voxrelay::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), table, valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Human-readable table name, e.g. `[tenants.acme]`.
        table: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a voxrelay setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(voxrelay::config::invalid_type), help("`{key}` expects {expected}"))]
    InvalidType {
        /// Dotted path of the key, e.g. `server.port`.
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(code(voxrelay::config::missing_key), help("{}", missing_key_help(key)))]
    MissingKey { key: String },

    /// A value that parsed but makes no sense for a running relay.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(voxrelay::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(voxrelay::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, table: &str, valid_keys: &str) -> String {
    let accepted = format!("{table} accepts: {valid_keys}");
    match suggestion {
        Some(key) => format!("did you mean `{key}`? {accepted}"),
        None => accepted,
    }
}

fn missing_key_help(key: &str) -> String {
    match key {
        "realtime.api_key" => "set `api_key` under [realtime] in voxrelay.toml, or export \
                               VOXRELAY_REALTIME_API_KEY (OPENAI_API_KEY is also read)"
            .to_string(),
        _ => {
            let (table, field) = key.rsplit_once('.').unwrap_or(("", key));
            if table.is_empty() {
                format!("add `{field} = ...` to voxrelay.toml")
            } else {
                format!("add `{field} = ...` under [{table}] in voxrelay.toml")
            }
        }
    }
}

/// Names a table path the way it is written in voxrelay.toml.
fn table_name(path: &[String]) -> String {
    if path.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{}]", path.join("."))
    }
}

/// Loaded TOML text keyed by display path, used to attach source spans.
struct SourceIndex<'a> {
    sources: &'a [(String, String)],
}

impl SourceIndex<'_> {
    /// The source the error was read from. Errors raised from an in-memory
    /// TOML string carry no file path; those resolve to the only source
    /// given, if there is exactly one.
    fn source_for(&self, error: &figment::Error) -> Option<&(String, String)> {
        let origin = error.metadata.as_ref().and_then(|m| m.source.as_ref());
        match origin {
            Some(figment::Source::File(path)) => {
                let path = path.display().to_string();
                self.sources.iter().find(|(p, _)| *p == path)
            }
            _ => match self.sources {
                [only] => Some(only),
                _ => None,
            },
        }
    }

    fn locate(
        &self,
        error: &figment::Error,
        table: &[String],
        key: &str,
    ) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
        let Some((path, content)) = self.source_for(error) else {
            return (None, None);
        };
        match find_key_offset(content, table, key) {
            Some(offset) => (
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(path, content.clone())),
            ),
            None => (None, None),
        }
    }
}

/// Converts a (possibly chained) figment error into diagnostics.
///
/// `toml_sources` pairs each loaded file's display path with its contents.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    let index = SourceIndex {
        sources: toml_sources,
    };
    err.into_iter()
        .map(|error| convert(&index, &error))
        .collect()
}

fn convert(index: &SourceIndex<'_>, error: &figment::Error) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(key, expected) => {
            let (span, src) = index.locate(error, &error.path, key);
            ConfigError::UnknownKey {
                key: key.clone(),
                table: table_name(&error.path),
                suggestion: suggest_key(key, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => {
            let mut path = error.path.clone();
            path.push(field.to_string());
            ConfigError::MissingKey {
                key: path.join("."),
            }
        }
        Kind::InvalidType(found, expected) => {
            let (table, key) = match error.path.split_last() {
                Some((key, table)) => (table, key.as_str()),
                None => (&[][..], ""),
            };
            let (span, src) = index.locate(error, table, key);
            ConfigError::InvalidType {
                key: error.path.join("."),
                found: found.to_string(),
                expected: expected.to_string(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Byte offset of `field` inside the table at `path`.
///
/// `path = ["tenants", "support"]` finds the `[tenants.support]` header and
/// scans its body only; the next table header ends the search. An empty
/// path scans the keys before the first header.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let body_start = if path.is_empty() {
        0
    } else {
        let header = format!("[{}]", path.join("."));
        content.find(&header)? + header.len()
    };

    let mut offset = body_start;
    for line in content[body_start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            return None;
        }
        let is_key = trimmed
            .strip_prefix(field)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if is_key {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Closest valid key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Renders every error with miette's graphical handler under a count header.
pub fn render_to_string(errors: &[ConfigError]) -> String {
    let handler = GraphicalReportHandler::new();
    let mut out = match errors.len() {
        1 => "voxrelay: 1 configuration error\n\n".to_string(),
        n => format!("voxrelay: {n} configuration errors\n\n"),
    };
    for error in errors {
        if handler.render_report(&mut out, error as &dyn Diagnostic).is_err() {
            out.push_str(&format!("Error: {error}\n"));
        }
    }
    out
}

/// Writes [`render_to_string`] to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprint!("{}", render_to_string(errors));
}
