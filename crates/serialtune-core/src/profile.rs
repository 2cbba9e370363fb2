//! Tuning profile
//!
//! Output formatting and diagnostic switches for the interpreter. Defaults
//! come from cargo features, so firmware builds can fix them at compile time;
//! host tools may load a profile from JSON instead. Either way the profile is
//! handed to the interpreter once, at construction.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// Reply template for query commands
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{label}={value}\n";

/// Placeholder replaced by the variable label
pub const LABEL_PLACEHOLDER: &str = "{label}";

/// Placeholder replaced by the formatted value
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Output and diagnostic settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuneProfile {
    /// Reply template with `{label}` and `{value}` placeholders
    pub output_template: String,
    /// Report commands naming an unregistered variable
    pub warn_not_found: bool,
    /// Echo how every line was split into label and value
    pub log_parse_result: bool,
}

impl Default for TuneProfile {
    fn default() -> Self {
        Self {
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            warn_not_found: cfg!(feature = "warn-not-found"),
            log_parse_result: cfg!(feature = "log-parse-result"),
        }
    }
}

impl TuneProfile {
    /// Parse a profile from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that the output template carries both placeholders
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.output_template.contains(LABEL_PLACEHOLDER) {
            return Err(ProfileError::MissingPlaceholder(LABEL_PLACEHOLDER));
        }
        if !self.output_template.contains(VALUE_PLACEHOLDER) {
            return Err(ProfileError::MissingPlaceholder(VALUE_PLACEHOLDER));
        }
        Ok(())
    }

    /// Write the reply for `label` into `out`.
    ///
    /// Placeholders are substituted in a single pass, so braces inside the
    /// label or value are emitted verbatim.
    pub fn render_into<W: fmt::Write + ?Sized>(
        &self,
        out: &mut W,
        label: &str,
        value: &str,
    ) -> fmt::Result {
        self.render_with(out, label, |out| out.write_str(value))
    }

    /// Like [`render_into`](Self::render_into), but the value is produced by
    /// `write_value` directly into `out` at each `{value}` placeholder.
    pub fn render_with<W, F>(&self, out: &mut W, label: &str, mut write_value: F) -> fmt::Result
    where
        W: fmt::Write + ?Sized,
        F: FnMut(&mut W) -> fmt::Result,
    {
        let mut rest = self.output_template.as_str();

        while let Some(start) = rest.find('{') {
            out.write_str(&rest[..start])?;
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix(LABEL_PLACEHOLDER) {
                out.write_str(label)?;
                rest = after;
            } else if let Some(after) = tail.strip_prefix(VALUE_PLACEHOLDER) {
                write_value(out)?;
                rest = after;
            } else {
                out.write_char('{')?;
                rest = &tail[1..];
            }
        }

        out.write_str(rest)
    }

    /// Render the reply for `label` as a new string
    pub fn render(&self, label: &str, value: &str) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.render_into(&mut out, label, value);
        out
    }
}
