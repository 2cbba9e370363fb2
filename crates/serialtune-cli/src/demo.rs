//! Demo variable set
//!
//! Mirrors a small firmware's tunables so the console can be exercised
//! without a board attached.

use std::cell::{Cell, RefCell};

use serialtune_core::{Interpreter, RegistryError};

/// Variables exposed by the demo console
pub struct DemoVariables {
    pub u8_value: Cell<u8>,
    pub i16_value: Cell<i16>,
    pub u32_value: Cell<u32>,
    pub i64_value: Cell<i64>,
    pub kp: Cell<f32>,
    pub ki: Cell<f64>,
    pub name: RefCell<String>,
}

impl Default for DemoVariables {
    fn default() -> Self {
        Self {
            u8_value: Cell::new(0),
            i16_value: Cell::new(0),
            u32_value: Cell::new(0),
            i64_value: Cell::new(0),
            kp: Cell::new(1.0),
            ki: Cell::new(0.05),
            name: RefCell::new(String::from("demo")),
        }
    }
}

impl DemoVariables {
    /// Register every demo variable with `tuner`
    pub fn register<'a, const N: usize>(
        &'a self,
        tuner: &mut Interpreter<'a, N>,
    ) -> Result<(), RegistryError> {
        tuner.add("u8", &self.u8_value)?;
        tuner.add("i16", &self.i16_value)?;
        tuner.add("u32", &self.u32_value)?;
        tuner.add("i64", &self.i64_value)?;
        tuner.add("f", &self.kp)?;
        tuner.add("d", &self.ki)?;
        tuner.add("name", &self.name)?;
        Ok(())
    }

    /// One-line status report, printed after every update
    pub fn status(&self) -> String {
        format!(
            "u8:{},i16:{},u32:{},i64:{},f:{:.9},d:{:.9},name:{}",
            self.u8_value.get(),
            self.i16_value.get(),
            self.u32_value.get(),
            self.i64_value.get(),
            self.kp.get(),
            self.ki.get(),
            self.name.borrow()
        )
    }
}
