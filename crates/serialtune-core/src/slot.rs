//! Typed slots
//!
//! A [`Slot`] is a tagged, non-owning reference to one application variable.
//! Numeric variables live in a [`Cell`], text variables in a [`RefCell`], so
//! the application keeps reading them while the registry holds a handle. The
//! borrow lifetime ties every slot to storage that outlives it.
//!
//! The supported types form a closed list. Parsing and formatting dispatch
//! with a plain `match` over that list.

use std::cell::{Cell, RefCell};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::convert::{DefaultReader, DefaultWriter, ValueReader, ValueWriter};
use crate::error::SlotError;

/// Generates [`PrimitiveType`], [`Slot`] and the typed `From` constructors
/// from a single list so the three can never disagree.
macro_rules! primitive_types {
    ($( $(#[$doc:meta])* $variant:ident($storage:ty) => $name:literal, )*) => {
        /// Closed set of primitive types a slot can reference
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum PrimitiveType {
            $( $(#[$doc])* #[serde(rename = $name)] $variant, )*
        }

        impl PrimitiveType {
            /// Every supported type, in declaration order
            pub const ALL: &'static [PrimitiveType] = &[$( PrimitiveType::$variant, )*];

            /// Short name used in diagnostics and profiles
            pub fn name(self) -> &'static str {
                match self {
                    $( PrimitiveType::$variant => $name, )*
                }
            }
        }

        /// Tagged reference to an externally owned variable
        #[derive(Debug, Clone, Copy)]
        pub enum Slot<'a> {
            $( $(#[$doc])* $variant(&'a $storage), )*
        }

        impl<'a> Slot<'a> {
            /// The type tag of this slot
            pub fn primitive_type(&self) -> PrimitiveType {
                match self {
                    $( Slot::$variant(_) => PrimitiveType::$variant, )*
                }
            }

            /// Address of the referenced storage
            pub fn as_ptr(&self) -> *const () {
                match *self {
                    $( Slot::$variant(storage) => storage as *const $storage as *const (), )*
                }
            }
        }

        $(
            impl<'a> From<&'a $storage> for Slot<'a> {
                fn from(storage: &'a $storage) -> Self {
                    Slot::$variant(storage)
                }
            }
        )*
    };
}

primitive_types! {
    /// Signed 8-bit integer
    I8(Cell<i8>) => "i8",
    /// Signed 16-bit integer
    I16(Cell<i16>) => "i16",
    /// Signed 32-bit integer
    I32(Cell<i32>) => "i32",
    /// Signed 64-bit integer
    I64(Cell<i64>) => "i64",
    /// Unsigned 8-bit integer
    U8(Cell<u8>) => "u8",
    /// Unsigned 16-bit integer
    U16(Cell<u16>) => "u16",
    /// Unsigned 32-bit integer
    U32(Cell<u32>) => "u32",
    /// Unsigned 64-bit integer
    U64(Cell<u64>) => "u64",
    /// 32-bit floating point
    F32(Cell<f32>) => "f32",
    /// 64-bit floating point (double)
    F64(Cell<f64>) => "f64",
    /// Text string
    Text(RefCell<String>) => "string",
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'a> Slot<'a> {
    /// Overwrite the variable from command text using the default reader
    pub fn set(&self, text: &str) -> Result<(), SlotError> {
        self.set_with::<DefaultReader>(text)
    }

    /// Overwrite the variable from command text.
    ///
    /// Integers are parsed at 64 bits and then truncated to the slot width.
    pub fn set_with<R: ValueReader>(&self, text: &str) -> Result<(), SlotError> {
        match *self {
            Slot::I8(cell) => cell.set(R::read_signed(text) as i8),
            Slot::I16(cell) => cell.set(R::read_signed(text) as i16),
            Slot::I32(cell) => cell.set(R::read_signed(text) as i32),
            Slot::I64(cell) => cell.set(R::read_signed(text)),
            Slot::U8(cell) => cell.set(R::read_unsigned(text) as u8),
            Slot::U16(cell) => cell.set(R::read_unsigned(text) as u16),
            Slot::U32(cell) => cell.set(R::read_unsigned(text) as u32),
            Slot::U64(cell) => cell.set(R::read_unsigned(text)),
            Slot::F32(cell) => cell.set(R::read_float(text) as f32),
            Slot::F64(cell) => cell.set(R::read_float(text)),
            Slot::Text(cell) => {
                let mut target = cell.try_borrow_mut().map_err(|_| SlotError::Busy)?;
                R::read_text(text, &mut target);
            }
        }
        Ok(())
    }

    /// Render the current value using the default writer
    pub fn format(&self) -> Result<String, SlotError> {
        self.format_with::<DefaultWriter>()
    }

    /// Render the current value into a new string
    pub fn format_with<W: ValueWriter>(&self) -> Result<String, SlotError> {
        let mut text = String::new();
        self.write_with::<W, _>(&mut text)?;
        Ok(text)
    }

    /// Write the current value to `out` using the default writer
    pub fn write_to<O: fmt::Write + ?Sized>(&self, out: &mut O) -> Result<(), SlotError> {
        self.write_with::<DefaultWriter, O>(out)
    }

    /// Write the current value to `out` without an intermediate buffer
    pub fn write_with<W: ValueWriter, O: fmt::Write + ?Sized>(
        &self,
        out: &mut O,
    ) -> Result<(), SlotError> {
        match *self {
            Slot::I8(cell) => W::write_signed(out, cell.get().into()),
            Slot::I16(cell) => W::write_signed(out, cell.get().into()),
            Slot::I32(cell) => W::write_signed(out, cell.get().into()),
            Slot::I64(cell) => W::write_signed(out, cell.get()),
            Slot::U8(cell) => W::write_unsigned(out, cell.get().into()),
            Slot::U16(cell) => W::write_unsigned(out, cell.get().into()),
            Slot::U32(cell) => W::write_unsigned(out, cell.get().into()),
            Slot::U64(cell) => W::write_unsigned(out, cell.get()),
            Slot::F32(cell) => W::write_f32(out, cell.get()),
            Slot::F64(cell) => W::write_f64(out, cell.get()),
            Slot::Text(cell) => {
                let value = cell.try_borrow().map_err(|_| SlotError::Busy)?;
                W::write_text(out, &value)
            }
        }?;
        Ok(())
    }

    /// Whether the value can be read right now.
    ///
    /// Only a text slot mutably borrowed by the application is unreadable.
    pub fn is_readable(&self) -> bool {
        match *self {
            Slot::Text(cell) => cell.try_borrow().is_ok(),
            _ => true,
        }
    }

    /// Whether this slot references `storage`
    pub fn aliases<T>(&self, storage: &T) -> bool {
        std::ptr::eq(self.as_ptr(), storage as *const T as *const ())
    }
}
