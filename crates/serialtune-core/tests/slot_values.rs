//! Formatting a value and parsing the text back must reproduce it

use serialtune_core::convert::{F32_PRECISION, F64_PRECISION};
use serialtune_core::Slot;
use std::cell::{Cell, RefCell};

/// Format `value` from one slot and set it into a fresh one
fn reparse<T: Copy + Default>(value: T) -> T
where
    for<'a> Slot<'a>: From<&'a Cell<T>>,
{
    let source = Cell::new(value);
    let text = Slot::from(&source).format().unwrap();
    let target = Cell::new(T::default());
    Slot::from(&target).set(&text).unwrap();
    target.get()
}

#[test]
fn test_integer_extremes() {
    for v in [i8::MIN, -1, 0, i8::MAX] {
        assert_eq!(reparse(v), v);
    }
    for v in [i16::MIN, i16::MAX] {
        assert_eq!(reparse(v), v);
    }
    for v in [i32::MIN, -123_456, i32::MAX] {
        assert_eq!(reparse(v), v);
    }
    for v in [i64::MIN, i64::MAX] {
        assert_eq!(reparse(v), v);
    }
    for v in [0u8, u8::MAX] {
        assert_eq!(reparse(v), v);
    }
    assert_eq!(reparse(u16::MAX), u16::MAX);
    assert_eq!(reparse(u32::MAX), u32::MAX);
    for v in [0u64, 1 << 63, u64::MAX] {
        assert_eq!(reparse(v), v);
    }
}

#[test]
fn test_float_within_precision() {
    let f32_tolerance = 10f32.powi(-(F32_PRECISION as i32));
    for v in [0.0f32, 1.0, -2.5, 3.141_592_7, 1234.5677, -0.000_123] {
        let back = reparse(v);
        assert!((back - v).abs() <= f32_tolerance * v.abs().max(1.0), "{v} -> {back}");
    }

    let f64_tolerance = 10f64.powi(-(F64_PRECISION as i32));
    for v in [0.0f64, -1.0 / 3.0, std::f64::consts::E, 98_765.432_1] {
        let back = reparse(v);
        assert!((back - v).abs() <= f64_tolerance * v.abs().max(1.0), "{v} -> {back}");
    }
}

#[test]
fn test_text_is_exact() {
    for v in ["", "plain", " padded ", "key=value", "ünïcødé"] {
        let source = RefCell::new(v.to_string());
        let text = Slot::from(&source).format().unwrap();
        let target = RefCell::new(String::from("stale"));
        Slot::from(&target).set(&text).unwrap();
        assert_eq!(*target.borrow(), v);
    }
}

#[test]
fn test_width_narrowing_matches_c_assignment() {
    let a = Cell::new(0i16);
    Slot::from(&a).set("70000").unwrap();
    assert_eq!(a.get(), 70000i64 as i16);

    let b = Cell::new(0u32);
    Slot::from(&b).set("0x1_0000_0001").unwrap();
    // parsing stops at the underscore
    assert_eq!(b.get(), 1);

    let c = Cell::new(0u32);
    Slot::from(&c).set("0x100000001").unwrap();
    assert_eq!(c.get(), 1);

    let d = Cell::new(0i8);
    Slot::from(&d).set("-129").unwrap();
    assert_eq!(d.get(), 127);
}
