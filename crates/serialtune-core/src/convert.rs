//! Text conversion rules
//!
//! Numeric parsing is deliberately lenient: it mirrors the C library's
//! `strtoll`/`strtoull`/`strtod` family, consuming the longest valid prefix
//! and yielding zero when there is none. A typo therefore zeroes a variable
//! instead of halting the device.
//!
//! [`ValueReader`] and [`ValueWriter`] are the customization points. Every
//! method has a default body, so a custom reader only overrides what it needs:
//!
//! ```rust
//! use serialtune_core::convert::{DefaultReader, ValueReader};
//!
//! struct PercentReader;
//!
//! impl ValueReader for PercentReader {
//!     fn read_float(text: &str) -> f64 {
//!         DefaultReader::read_float(text.trim_end_matches('%')) / 100.0
//!     }
//! }
//!
//! assert_eq!(PercentReader::read_float("50%"), 0.5);
//! assert_eq!(PercentReader::read_signed("0x10"), 16);
//! ```

use std::fmt;

/// Fractional digits used when formatting 32-bit floats
pub const F32_PRECISION: usize = 6;

/// Fractional digits used when formatting 64-bit floats
pub const F64_PRECISION: usize = 15;

/// Converts command text into raw values
pub trait ValueReader {
    /// Parse text destined for a signed integer slot
    fn read_signed(text: &str) -> i64 {
        parse_signed(text)
    }

    /// Parse text destined for an unsigned integer slot
    fn read_unsigned(text: &str) -> u64 {
        parse_unsigned(text)
    }

    /// Parse text destined for a floating point slot
    fn read_float(text: &str) -> f64 {
        parse_float(text)
    }

    /// Replace the contents of a text slot
    fn read_text(text: &str, target: &mut String) {
        target.clear();
        target.push_str(text);
    }
}

/// Writes raw values as reply text straight into the output sink
pub trait ValueWriter {
    /// Format a signed integer
    fn write_signed<O: fmt::Write + ?Sized>(out: &mut O, value: i64) -> fmt::Result {
        write!(out, "{}", value)
    }

    /// Format an unsigned integer
    fn write_unsigned<O: fmt::Write + ?Sized>(out: &mut O, value: u64) -> fmt::Result {
        write!(out, "{}", value)
    }

    /// Format a 32-bit float
    fn write_f32<O: fmt::Write + ?Sized>(out: &mut O, value: f32) -> fmt::Result {
        write!(out, "{:.*}", F32_PRECISION, value)
    }

    /// Format a 64-bit float
    fn write_f64<O: fmt::Write + ?Sized>(out: &mut O, value: f64) -> fmt::Result {
        write!(out, "{:.*}", F64_PRECISION, value)
    }

    /// Format a text value
    fn write_text<O: fmt::Write + ?Sized>(out: &mut O, value: &str) -> fmt::Result {
        out.write_str(value)
    }
}

/// Reader with C library parsing semantics
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultReader;

impl ValueReader for DefaultReader {}

/// Writer producing decimal integers and fixed-precision floats
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultWriter;

impl ValueWriter for DefaultWriter {}

/// Characters `isspace` accepts in the C locale
fn skip_space(text: &str) -> &str {
    text.trim_start_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'))
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    }
}

/// Pick the radix from the literal prefix and return the digits that follow it
fn split_radix(text: &str) -> (u32, &str) {
    let bytes = text.as_bytes();
    if bytes.len() > 2
        && bytes[0] == b'0'
        && (bytes[1] | 0x20) == b'x'
        && bytes[2].is_ascii_hexdigit()
    {
        (16, &text[2..])
    } else if bytes.first() == Some(&b'0') {
        (8, text)
    } else {
        (10, text)
    }
}

/// Accumulate the longest run of valid digits; the flag reports overflow
fn accumulate(digits: &str, radix: u32) -> (u64, bool) {
    let mut value: u64 = 0;
    let mut overflow = false;

    for d in digits.chars().map_while(|c| c.to_digit(radix)) {
        match value
            .checked_mul(u64::from(radix))
            .and_then(|v| v.checked_add(u64::from(d)))
        {
            Some(next) => value = next,
            None => overflow = true,
        }
    }

    (value, overflow)
}

/// Parse a signed integer the way `strtoll(text, _, 0)` does.
///
/// Out-of-range input saturates to `i64::MIN`/`i64::MAX`.
pub fn parse_signed(text: &str) -> i64 {
    let (negative, rest) = split_sign(skip_space(text));
    let (radix, digits) = split_radix(rest);
    let (magnitude, overflow) = accumulate(digits, radix);

    if negative {
        if overflow || magnitude > i64::MIN.unsigned_abs() {
            i64::MIN
        } else {
            (magnitude as i64).wrapping_neg()
        }
    } else if overflow || magnitude > i64::MAX as u64 {
        i64::MAX
    } else {
        magnitude as i64
    }
}

/// Parse an unsigned integer the way `strtoull(text, _, 0)` does.
///
/// A leading minus negates in two's complement; overflow saturates to
/// `u64::MAX` regardless of sign.
pub fn parse_unsigned(text: &str) -> u64 {
    let (negative, rest) = split_sign(skip_space(text));
    let (radix, digits) = split_radix(rest);
    let (magnitude, overflow) = accumulate(digits, radix);

    if overflow {
        u64::MAX
    } else if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}

/// Parse a float the way `strtod` does.
///
/// Hexadecimal float literals are not recognised: `0x1p3` reads as `0`, the
/// value of its leading zero.
pub fn parse_float(text: &str) -> f64 {
    let (negative, rest) = split_sign(skip_space(text));
    let sign = if negative { -1.0 } else { 1.0 };

    if rest.len() >= 3 {
        let head = &rest.as_bytes()[..3];
        if head.eq_ignore_ascii_case(b"inf") {
            return sign * f64::INFINITY;
        }
        if head.eq_ignore_ascii_case(b"nan") {
            return f64::NAN;
        }
    }

    let bytes = rest.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let int_end = digits_from(0);
    let mut end = int_end;
    let mut mantissa_digits = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - end - 1;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return 0.0;
    }

    if bytes.get(end).is_some_and(|b| (b | 0x20) == b'e') {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        // An exponent marker without digits is not part of the number
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    sign * rest[..end].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_prefixes() {
        assert_eq!(parse_signed("42"), 42);
        assert_eq!(parse_signed("  -17"), -17);
        assert_eq!(parse_signed("+8"), 8);
        assert_eq!(parse_signed("0x1F"), 31);
        assert_eq!(parse_signed("0X1f"), 31);
        assert_eq!(parse_signed("010"), 8);
        assert_eq!(parse_signed("-0x10"), -16);
    }

    #[test]
    fn test_signed_partial_and_garbage() {
        assert_eq!(parse_signed("12abc"), 12);
        assert_eq!(parse_signed("abc"), 0);
        assert_eq!(parse_signed(""), 0);
        assert_eq!(parse_signed("-"), 0);
        // "0x" without hex digits parses the leading zero only
        assert_eq!(parse_signed("0xg"), 0);
        // octal stops at the first non-octal digit
        assert_eq!(parse_signed("089"), 0);
        assert_eq!(parse_signed("3.9"), 3);
    }

    #[test]
    fn test_signed_saturates() {
        assert_eq!(parse_signed("9223372036854775807"), i64::MAX);
        assert_eq!(parse_signed("9223372036854775808"), i64::MAX);
        assert_eq!(parse_signed("-9223372036854775808"), i64::MIN);
        assert_eq!(parse_signed("-99999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_unsigned_rules() {
        assert_eq!(parse_unsigned("18446744073709551615"), u64::MAX);
        assert_eq!(parse_unsigned("18446744073709551616"), u64::MAX);
        assert_eq!(parse_unsigned("-1"), u64::MAX);
        assert_eq!(parse_unsigned("-2"), u64::MAX - 1);
        assert_eq!(parse_unsigned("0xff"), 255);
        assert_eq!(parse_unsigned("junk"), 0);
    }

    #[test]
    fn test_float_prefixes() {
        assert_eq!(parse_float("1.5"), 1.5);
        assert_eq!(parse_float("  -2.25"), -2.25);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("5."), 5.0);
        assert_eq!(parse_float("1e3"), 1000.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert_eq!(parse_float("2.5E-1x"), 0.25);
        assert_eq!(parse_float("7 volts"), 7.0);
        assert_eq!(parse_float("volts"), 0.0);
        assert_eq!(parse_float("."), 0.0);
    }

    #[test]
    fn test_float_specials() {
        assert_eq!(parse_float("inf"), f64::INFINITY);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float("NaN").is_nan());
        assert_eq!(parse_float("0x1p3"), 0.0);
    }

    fn written(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
        let mut out = String::new();
        write(&mut out).unwrap();
        out
    }

    #[test]
    fn test_default_writer() {
        assert_eq!(written(|o| DefaultWriter::write_signed(o, -5)), "-5");
        assert_eq!(
            written(|o| DefaultWriter::write_unsigned(o, u64::MAX)),
            "18446744073709551615"
        );
        assert_eq!(written(|o| DefaultWriter::write_f32(o, 1.5)), "1.500000");
        assert_eq!(
            written(|o| DefaultWriter::write_f64(o, 0.25)),
            "0.250000000000000"
        );
        assert_eq!(
            written(|o| DefaultWriter::write_text(o, "hello world")),
            "hello world"
        );
    }

    #[test]
    fn test_writer_appends_to_sink() {
        let mut out = String::from("kp=");
        DefaultWriter::write_f32(&mut out, 0.25).unwrap();
        assert_eq!(out, "kp=0.250000");
    }

    #[test]
    fn test_default_reader_text_replaces() {
        let mut target = String::from("previous");
        DefaultReader::read_text("next", &mut target);
        assert_eq!(target, "next");
    }
}
