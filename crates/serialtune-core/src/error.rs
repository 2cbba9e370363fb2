//! Error types
//!
//! None of these ever escape [`Interpreter::process`](crate::Interpreter::process);
//! they are surfaced to setup code and to the host transport only.

use thiserror::Error;

/// Errors returned when registering a variable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Registry full: capacity of {capacity} variables reached, '{label}' dropped")]
    Full { label: String, capacity: usize },

    #[error("Label '{0}' is already registered")]
    DuplicateLabel(String),

    #[error("Label '{label}' exceeds {max} bytes")]
    LabelTooLong { label: String, max: usize },

    #[error("Label must not be empty")]
    EmptyLabel,
}

/// Errors raised while touching a slot's storage
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    /// The application currently holds a borrow of the text variable
    #[error("Variable storage is borrowed elsewhere")]
    Busy,

    /// The output sink refused the formatted value
    #[error("Output sink rejected the value")]
    Sink(#[from] std::fmt::Error),
}

/// Errors that can occur while loading a tuning profile
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid profile: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Output template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Errors that can occur on the host transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
