//! Hex parsing and formatting helpers for JSON-RPC payloads.
//!
//! Ethereum nodes exchange quantities and binary blobs as `0x`-prefixed
//! hex strings. These helpers centralize the conversions so callers never
//! hand-roll prefix stripping or nibble decoding.

use thiserror::Error;

/// Errors produced when a hex string does not match the expected shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    #[error("missing 0x prefix in {0:?}")]
    MissingPrefix(String),

    #[error("invalid hex digit in {0:?}")]
    InvalidDigit(String),

    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

fn strip_prefix(value: &str) -> Result<&str, HexError> {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| HexError::MissingPrefix(truncate_for_error(value)))
}

/// Keeps error messages bounded when the offending input is a large blob.
///
/// Cuts on a character boundary so arbitrary node-supplied bytes can
/// never panic the formatter.
fn truncate_for_error(value: &str) -> String {
    const MAX_CHARS: usize = 40;
    match value.char_indices().nth(MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

/// Parses a `0x`-prefixed quantity such as `0x1a` into a `u64`.
///
/// Odd-length digit runs are accepted, matching how nodes encode
/// quantities without leading zeroes.
///
/// # Errors
///
/// Returns [`HexError`] when the prefix is missing, a digit is invalid,
/// or the value overflows 64 bits.
pub fn parse_hex_u64(value: &str) -> Result<u64, HexError> {
    let digits = strip_prefix(value)?;
    if digits.is_empty() {
        return Err(HexError::InvalidDigit(truncate_for_error(value)));
    }
    u64::from_str_radix(digits, 16).map_err(|_| HexError::InvalidDigit(truncate_for_error(value)))
}

/// Parses a `0x`-prefixed byte blob such as a log `data` field.
///
/// # Errors
///
/// Returns [`HexError`] on a missing prefix, odd digit count, or an
/// invalid digit.
pub fn parse_hex_bytes(value: &str) -> Result<Vec<u8>, HexError> {
    let digits = strip_prefix(value)?;
    if digits.len() % 2 != 0 {
        return Err(HexError::InvalidDigit(truncate_for_error(value)));
    }
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    let raw = digits.as_bytes();
    for pair in raw.chunks_exact(2) {
        let hi = hex_nibble(pair[0]).ok_or_else(|| HexError::InvalidDigit(truncate_for_error(value)))?;
        let lo = hex_nibble(pair[1]).ok_or_else(|| HexError::InvalidDigit(truncate_for_error(value)))?;
        bytes.push((hi << 4) | lo);
    }
    Ok(bytes)
}

fn hex_nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Formats a `u64` as a minimal `0x` quantity (`0` becomes `"0x0"`).
#[must_use]
pub fn format_hex_u64(value: u64) -> String {
    format!("0x{value:x}")
}

/// Lowercases and validates a 20-byte address string.
///
/// # Errors
///
/// Returns [`HexError`] when the input is not exactly 40 hex digits
/// behind a `0x` prefix.
pub fn normalize_address(value: &str) -> Result<String, HexError> {
    let digits = strip_prefix(value)?;
    if digits.len() != 40 {
        return Err(HexError::Length {
            expected: 20,
            actual: digits.len() / 2,
        });
    }
    if !digits.bytes().all(|b| hex_nibble(b).is_some()) {
        return Err(HexError::InvalidDigit(truncate_for_error(value)));
    }
    Ok(format!("0x{}", digits.to_ascii_lowercase()))
}

/// Extracts the address packed into the low 20 bytes of a 32-byte topic.
///
/// # Errors
///
/// Returns [`HexError::Length`] when the word is not 32 bytes.
pub fn word_to_address(word: &[u8]) -> Result<String, HexError> {
    if word.len() != 32 {
        return Err(HexError::Length {
            expected: 32,
            actual: word.len(),
        });
    }
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for byte in &word[12..] {
        out.push(char::from_digit(u32::from(byte >> 4), 16).unwrap_or('0'));
        out.push(char::from_digit(u32::from(byte & 0x0f), 16).unwrap_or('0'));
    }
    Ok(out)
}

/// Renders a big-endian unsigned integer as a decimal string.
///
/// Token identifiers are 256-bit values, so they are carried as strings
/// rather than a native integer type. Works on any byte width.
#[must_use]
pub fn be_bytes_to_decimal(bytes: &[u8]) -> String {
    let mut scratch: Vec<u8> = bytes.to_vec();
    let mut digits = Vec::new();
    loop {
        let mut remainder: u32 = 0;
        let mut all_zero = true;
        for byte in scratch.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / 10) as u8;
            remainder = acc % 10;
            if *byte != 0 {
                all_zero = false;
            }
        }
        digits.push(b'0' + remainder as u8);
        if all_zero {
            break;
        }
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_else(|_| "0".to_string())
}
