//! Reversible text encodings for ids.
//!
//! Both encodings write the shortest string that decodes back to the same
//! value, most significant digit first, with no padding.

use crate::error::{Error, Result};

/// Width of the encode buffer. 62^16 and 34^16 both exceed `i64::MAX`.
const BUFFER_LEN: usize = 16;

const SHORT_BASE: i64 = 62;

/// Ascending, so a symbol's index can be found by binary search.
/// `0` and `O` are left out as easily confused.
const PRETTY_TABLE: [u8; 34] = *b"123456789ABCDEFGHIJKLMNPQRSTUVWXYZ";
const PRETTY_BASE: i64 = PRETTY_TABLE.len() as i64;

fn encode(value: i64, base: i64, symbol: impl Fn(usize) -> u8) -> String {
    assert!(value >= 0, "invalid id: {value} is negative");

    let mut buf = [0_u8; BUFFER_LEN];
    let mut k = value;
    let mut n = BUFFER_LEN - 1;
    loop {
        buf[n] = symbol((k % base) as usize);
        k /= base;
        if k == 0 {
            break;
        }
        n -= 1;
    }
    buf[n..].iter().map(|&b| char::from(b)).collect()
}

/// Folds digits left to right. Overlong input wraps instead of failing.
fn decode(s: &str, base: i64, digit: impl Fn(u8) -> Option<i64>) -> Result<i64> {
    if s.is_empty() {
        return Err(Error::Parse);
    }
    s.bytes().try_fold(0_i64, |acc, b| {
        let d = digit(b).ok_or(Error::Parse)?;
        Ok(acc.wrapping_mul(base).wrapping_add(d))
    })
}

fn short_symbol(d: usize) -> u8 {
    let d = d as u8;
    match d {
        0..=9 => b'0' + d,
        10..=35 => b'A' + d - 10,
        _ => b'a' + d - 36,
    }
}

fn short_digit(b: u8) -> Option<i64> {
    let d = match b {
        b'0'..=b'9' => b - b'0',
        b'A'..=b'Z' => 10 + b - b'A',
        b'a'..=b'z' => 36 + b - b'a',
        _ => return None,
    };
    Some(i64::from(d))
}

fn pretty_digit(b: u8) -> Option<i64> {
    PRETTY_TABLE
        .binary_search(&b.to_ascii_uppercase())
        .ok()
        .map(|i| i as i64)
}

/// Encodes `value` in base 62 over `0-9A-Za-z`.
///
/// # Panics
///
/// Panics if `value` is negative.
pub fn encode_short(value: i64) -> String {
    encode(value, SHORT_BASE, short_symbol)
}

/// Decodes a base 62 string produced by [`encode_short`].
pub fn decode_short(s: &str) -> Result<i64> {
    decode(s, SHORT_BASE, short_digit)
}

/// Encodes `value` in base 34 over an alphabet without `0` and `O`.
///
/// # Panics
///
/// Panics if `value` is negative.
pub fn encode_pretty(value: i64) -> String {
    encode(value, PRETTY_BASE, |d| PRETTY_TABLE[d])
}

/// Decodes a string produced by [`encode_pretty`], ignoring case.
pub fn decode_pretty(s: &str) -> Result<i64> {
    decode(s, PRETTY_BASE, pretty_digit)
}
