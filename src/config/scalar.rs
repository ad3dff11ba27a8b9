//! Prefix scanners for config scalars
//!
//! Each scanner parses a value from the start of its input (after leading
//! whitespace) and returns it together with the unconsumed remainder, so
//! callers can look for a random range separator in what follows.

use crate::types::Vector;

/// Up to four float components read from `(a, b, ...)` or `{a, b, ...}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Components {
    values: [f32; 4],
    len: usize,
}

impl Components {
    pub fn as_slice(&self) -> &[f32] {
        &self.values[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn digit_run(bytes: &[u8], start: usize, radix: u32) -> usize {
    let mut end = start;
    while end < bytes.len() && (bytes[end] as char).is_digit(radix) {
        end += 1;
    }
    end
}

fn parse_i64(s: &str) -> Option<(i64, &str)> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let hex = bytes.len() > i + 2
        && bytes[i] == b'0'
        && (bytes[i + 1] == b'x' || bytes[i + 1] == b'X')
        && (bytes[i + 2] as char).is_ascii_hexdigit();
    let (radix, start) = if hex { (16, i + 2) } else { (10, i) };

    let end = digit_run(bytes, start, radix);
    if end == start {
        return None;
    }

    let magnitude = i64::from_str_radix(&s[start..end], radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    Some((value, &s[end..]))
}

/// Signed 32-bit integer, decimal or `0x` hexadecimal
pub fn parse_s32(s: &str) -> Option<(i32, &str)> {
    let (value, rest) = parse_i64(s)?;
    Some((i32::try_from(value).ok()?, rest))
}

/// Unsigned 32-bit integer, decimal or `0x` hexadecimal
pub fn parse_u32(s: &str) -> Option<(u32, &str)> {
    let (value, rest) = parse_i64(s)?;
    Some((u32::try_from(value).ok()?, rest))
}

/// Decimal float with optional fraction and exponent, rejected when it does
/// not fit a finite `f32`
pub fn parse_float(s: &str) -> Option<(f32, &str)> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end += 1;
    }

    let integer_end = digit_run(bytes, end, 10);
    let mut digits = integer_end - end;
    end = integer_end;

    if bytes.get(end) == Some(&b'.') {
        let fraction_end = digit_run(bytes, end + 1, 10);
        digits += fraction_end - (end + 1);
        end = fraction_end;
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when digits follow it
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'-') | Some(b'+')) {
            exp += 1;
        }
        let exp_end = digit_run(bytes, exp, 10);
        if exp_end > exp {
            end = exp_end;
        }
    }

    let value = s[..end].parse::<f32>().ok().filter(|value| value.is_finite())?;
    Some((value, &s[end..]))
}

/// `true`/`false` (any case) or an integer, non-zero meaning true
pub fn parse_bool(s: &str) -> Option<(bool, &str)> {
    let trimmed = s.trim_start();
    for (word, value) in [("true", true), ("false", false)] {
        if trimmed.len() >= word.len()
            && trimmed.is_char_boundary(word.len())
            && trimmed[..word.len()].eq_ignore_ascii_case(word)
        {
            return Some((value, &trimmed[word.len()..]));
        }
    }
    let (value, rest) = parse_i64(trimmed)?;
    Some((value != 0, rest))
}

/// Parenthesized or braced list of one to four float components
pub fn parse_components(s: &str) -> Option<(Components, &str)> {
    let s = s.trim_start();
    let close = match s.as_bytes().first()? {
        b'(' => ')',
        b'{' => '}',
        _ => return None,
    };

    let mut components = Components { values: [0.0; 4], len: 0 };
    let mut rest = &s[1..];
    loop {
        let (value, after) = parse_float(rest)?;
        if components.len == components.values.len() {
            return None;
        }
        components.values[components.len] = value;
        components.len += 1;

        let after = after.trim_start();
        if let Some(next) = after.strip_prefix(',') {
            rest = next;
        } else if let Some(next) = after.strip_prefix(close) {
            return Some((components, next));
        } else {
            return None;
        }
    }
}

/// Vector with two or three components, z defaulting to zero
pub fn parse_vector(s: &str) -> Option<(Vector, &str)> {
    let (components, rest) = parse_components(s)?;
    match components.as_slice() {
        [x, y] => Some((Vector::new(*x, *y, 0.0), rest)),
        [x, y, z] => Some((Vector::new(*x, *y, *z), rest)),
        _ => None,
    }
}
