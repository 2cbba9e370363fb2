//! Line command interpreter
//!
//! Each call to [`Interpreter::process`] handles exactly one line:
//!
//! - `label` (or `label=`) queries: the current value is written to the output
//!   sink using the profile's template
//! - `label=value` sets: the value is parsed into the variable, nothing is
//!   written, and the update hook runs
//! - blank lines and lines with an empty label are ignored
//!
//! No error ever escapes `process`; malformed input is consumed and reported
//! through the returned [`Outcome`] and, optionally, a diagnostic line.

use std::fmt;
use std::marker::PhantomData;

use crate::convert::{DefaultReader, DefaultWriter, ValueReader, ValueWriter};
use crate::error::{RegistryError, SlotError};
use crate::profile::TuneProfile;
use crate::registry::{Registry, DEFAULT_MAX_ITEMS};
use crate::slot::Slot;

/// Notified after a successful set with the label and the updated slot.
///
/// Implemented for every `FnMut(&str, Slot<'a>)` closure and for [`NoHook`].
pub trait UpdateHook<'a> {
    /// Called once per successful set
    fn updated(&mut self, label: &str, slot: Slot<'a>);
}

impl<'a, F> UpdateHook<'a> for F
where
    F: FnMut(&str, Slot<'a>),
{
    fn updated(&mut self, label: &str, slot: Slot<'a>) {
        self(label, slot)
    }
}

/// The absent hook
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl<'a> UpdateHook<'a> for NoHook {
    fn updated(&mut self, _label: &str, _slot: Slot<'a>) {}
}

/// A command line split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'l> {
    /// Text left of the first `=`, trimmed
    pub label: &'l str,
    /// Text right of the first `=`, untouched apart from the line terminator
    pub value: &'l str,
}

/// Split a line at the first `=`.
///
/// The value keeps surrounding whitespace so text variables can hold it; only
/// a trailing `\r`/`\n` left by the transport is removed.
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
    match line.split_once('=') {
        Some((label, value)) => ParsedLine {
            label: label.trim(),
            value,
        },
        None => ParsedLine {
            label: line.trim(),
            value: "",
        },
    }
}

/// What processing a line did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Blank line or empty label
    Ignored,
    /// A variable was overwritten
    Updated,
    /// A variable's value was written to the output
    Queried,
    /// No variable carries the label
    NotFound,
    /// The variable's storage was borrowed by the application
    Rejected,
}

/// Executes line commands against a registry.
///
/// The hook is a type parameter, so notifying it is a direct call.
pub struct Interpreter<
    'a,
    const N: usize = DEFAULT_MAX_ITEMS,
    R = DefaultReader,
    W = DefaultWriter,
    H = NoHook,
> {
    registry: Registry<'a, N>,
    profile: TuneProfile,
    on_update: H,
    codec: PhantomData<fn() -> (R, W)>,
}

impl<'a, const N: usize, R: ValueReader, W: ValueWriter> Interpreter<'a, N, R, W> {
    /// Create an interpreter with the build's default profile
    pub fn new() -> Self {
        Self::with_profile(TuneProfile::default())
    }

    /// Create an interpreter with an explicit profile
    pub fn with_profile(profile: TuneProfile) -> Self {
        Self {
            registry: Registry::new(),
            profile,
            on_update: NoHook,
            codec: PhantomData,
        }
    }
}

impl<'a, const N: usize, R: ValueReader, W: ValueWriter, H: UpdateHook<'a>>
    Interpreter<'a, N, R, W, H>
{
    /// Register a variable; see [`Registry::add`]
    pub fn add(&mut self, label: &str, variable: impl Into<Slot<'a>>) -> Result<(), RegistryError> {
        self.registry.add(label, variable)
    }

    /// Register a prebuilt slot; see [`Registry::insert`]
    pub fn insert(&mut self, label: &str, slot: Slot<'a>) -> Result<(), RegistryError> {
        self.registry.insert(label, slot)
    }

    /// The underlying registry
    pub fn registry(&self) -> &Registry<'a, N> {
        &self.registry
    }

    /// The active profile
    pub fn profile(&self) -> &TuneProfile {
        &self.profile
    }

    /// Install a closure as the update hook, replacing any previous one
    pub fn on_update<F>(self, hook: F) -> Interpreter<'a, N, R, W, F>
    where
        F: FnMut(&str, Slot<'a>),
    {
        self.with_hook(hook)
    }

    /// Install any [`UpdateHook`], replacing any previous one
    pub fn with_hook<G: UpdateHook<'a>>(self, hook: G) -> Interpreter<'a, N, R, W, G> {
        Interpreter {
            registry: self.registry,
            profile: self.profile,
            on_update: hook,
            codec: PhantomData,
        }
    }

    /// Remove the update hook
    pub fn clear_update_hook(self) -> Interpreter<'a, N, R, W> {
        self.with_hook(NoHook)
    }

    /// The installed hook
    pub fn hook(&self) -> &H {
        &self.on_update
    }

    /// Process one command line, writing any reply or diagnostic to `out`
    pub fn process<O: fmt::Write + ?Sized>(&mut self, line: &str, out: &mut O) -> Outcome {
        let ParsedLine { label, value } = parse_line(line);

        tracing::debug!("Parsed {line:?} --> label={label:?}, value={value:?}");
        if self.profile.log_parse_result {
            emit(
                out,
                format_args!(
                    "[TuneSet] parsed '{}' --> label='{}', value='{}'\n",
                    line.trim_end_matches(|c: char| c == '\r' || c == '\n'),
                    label,
                    value
                ),
            );
        }

        if label.is_empty() {
            return Outcome::Ignored;
        }

        let Some(slot) = self.registry.lookup(label).copied() else {
            tracing::debug!("No variable named '{label}'");
            if self.profile.warn_not_found {
                emit(
                    out,
                    format_args!("[TuneSet] error: could not find variable '{}'\n", label),
                );
            }
            return Outcome::NotFound;
        };

        if value.is_empty() {
            self.query(label, slot, out)
        } else {
            self.update(label, slot, value)
        }
    }

    /// Process every line in `text`, returning how many were handled
    pub fn process_all<O: fmt::Write + ?Sized>(&mut self, text: &str, out: &mut O) -> usize {
        let mut count = 0;
        for line in text.lines() {
            self.process(line, out);
            count += 1;
        }
        count
    }

    fn query<O: fmt::Write + ?Sized>(&self, label: &str, slot: Slot<'a>, out: &mut O) -> Outcome {
        // A busy variable must not leave half a reply in the sink
        if !slot.is_readable() {
            tracing::warn!("Cannot read '{label}': {}", SlotError::Busy);
            return Outcome::Rejected;
        }

        let written = self.profile.render_with(out, label, |out| {
            slot.write_with::<W, O>(out).map_err(|_| fmt::Error)
        });
        if written.is_err() {
            tracing::warn!("Failed to write value of '{label}' to output");
        }
        Outcome::Queried
    }

    fn update(&mut self, label: &str, slot: Slot<'a>, value: &str) -> Outcome {
        match slot.set_with::<R>(value) {
            Ok(()) => {
                tracing::debug!("Set '{label}' ({}) from {value:?}", slot.primitive_type());
                self.on_update.updated(label, slot);
                Outcome::Updated
            }
            Err(e) => {
                tracing::warn!("Cannot set '{label}': {e}");
                Outcome::Rejected
            }
        }
    }
}

impl<const N: usize, R: ValueReader, W: ValueWriter> Default for Interpreter<'_, N, R, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, R, W, H> fmt::Debug for Interpreter<'_, N, R, W, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("registry", &self.registry)
            .field("profile", &self.profile)
            .field("on_update", &std::any::type_name::<H>())
            .finish()
    }
}

fn emit<O: fmt::Write + ?Sized>(out: &mut O, args: fmt::Arguments<'_>) {
    if out.write_fmt(args).is_err() {
        tracing::warn!("Failed to write diagnostic to output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse_line("  kp = 1.5"),
            ParsedLine {
                label: "kp",
                value: " 1.5"
            }
        );
    }

    #[test]
    fn test_parse_query() {
        assert_eq!(
            parse_line(" kp \r\n"),
            ParsedLine {
                label: "kp",
                value: ""
            }
        );
    }

    #[test]
    fn test_parse_splits_at_first_equals() {
        assert_eq!(
            parse_line("expr=a=b\r"),
            ParsedLine {
                label: "expr",
                value: "a=b"
            }
        );
    }

    #[test]
    fn test_parse_blank_forms() {
        assert_eq!(parse_line("").label, "");
        assert_eq!(parse_line("=").label, "");
        assert_eq!(parse_line("   =5").label, "");
    }
}
