//! # SerialTune Core Library
//!
//! Live tuning of firmware variables over a line-oriented text protocol.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Typed, non-owning slots over application variables (integers, floats, text)
//! - A fixed-capacity registry mapping labels to slots
//! - A command interpreter for `label` queries and `label=value` sets
//! - Line framing and serial port helpers for host consoles
//!
//! ## Example
//!
//! ```rust
//! use std::cell::Cell;
//! use serialtune_core::{Interpreter, Outcome};
//!
//! let gain = Cell::new(0i32);
//! let mut tuner: Interpreter<8> = Interpreter::new();
//! tuner.add("gain", &gain).unwrap();
//!
//! let mut out = String::new();
//! assert_eq!(tuner.process("gain=5", &mut out), Outcome::Updated);
//! assert_eq!(gain.get(), 5);
//!
//! tuner.process("gain", &mut out);
//! assert_eq!(out, "gain=5\n");
//! ```

pub mod convert;
pub mod error;
pub mod interpreter;
pub mod profile;
pub mod registry;
pub mod slot;
pub mod transport;

pub use error::{ProfileError, RegistryError, SlotError, TransportError};
pub use interpreter::{parse_line, Interpreter, NoHook, Outcome, ParsedLine, UpdateHook};
pub use profile::TuneProfile;
pub use registry::Registry;
pub use slot::{PrimitiveType, Slot};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::convert::{DefaultReader, DefaultWriter, ValueReader, ValueWriter};
    pub use crate::interpreter::{Interpreter, Outcome, UpdateHook};
    pub use crate::profile::TuneProfile;
    pub use crate::registry::Registry;
    pub use crate::slot::{PrimitiveType, Slot};
    pub use crate::transport::{LineBuffer, LineLink};
    pub use crate::tune;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
