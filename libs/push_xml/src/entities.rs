//! Entity and character reference resolution.
//!
//! Only the five predefined entities exist, as no DTD is ever read.
//! Results are borrowed when nothing had to be rewritten.

use alloc::borrow::Cow;
use alloc::string::String;

use memchr::{memchr, memchr2};

use crate::chars::{check_name, is_xml_char};
use crate::error::LexicalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Character data: references resolved, line ends normalized to `\n`.
    Text,
    /// Attribute values: additionally every literal tab and line end becomes a space.
    Attribute,
}

pub(crate) fn builtin(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => None,
    }
}

/// Resolves the reference at the start of `input`, which begins with `&`.
/// Returns the character and the length of the reference including `;`.
pub(crate) fn reference(input: &[u8]) -> Result<(char, usize), LexicalError> {
    let end = memchr(b';', input).ok_or(LexicalError::BadReference)?;
    let body = &input[1..end];
    let c = match body.strip_prefix(b"#") {
        Some(number) => char_ref(number)?,
        None => {
            let name = core::str::from_utf8(body).map_err(|_| LexicalError::BadReference)?;
            check_name(name).map_err(|_| LexicalError::BadReference)?;
            builtin(name).ok_or(LexicalError::UndefinedEntity)?
        }
    };
    Ok((c, end + 1))
}

fn char_ref(number: &[u8]) -> Result<char, LexicalError> {
    let (digits, radix) = match number.strip_prefix(b"x") {
        Some(hex) => (hex, 16),
        None => (number, 10),
    };
    if digits.is_empty() {
        return Err(LexicalError::BadReference);
    }
    let mut value: u32 = 0;
    for &d in digits {
        let digit = (d as char)
            .to_digit(radix)
            .ok_or(LexicalError::BadReference)?;
        value = value
            .checked_mul(radix)
            .and_then(|v| v.checked_add(digit))
            .ok_or(LexicalError::BadCharRef)?;
    }
    char::from_u32(value)
        .filter(|&c| is_xml_char(c))
        .ok_or(LexicalError::BadCharRef)
}

/// Resolves references and normalizes whitespace in `raw`.
/// Errors carry the byte index of the offending `&`.
pub(crate) fn unescape(raw: &str, mode: Mode) -> Result<Cow<'_, str>, (LexicalError, usize)> {
    let bytes = raw.as_bytes();
    let dirty = match mode {
        Mode::Text => memchr2(b'&', b'\r', bytes).is_some(),
        Mode::Attribute => bytes
            .iter()
            .any(|b| matches!(b, b'&' | b'\r' | b'\n' | b'\t')),
    };
    if !dirty {
        return Ok(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'&' => {
                out.push_str(&raw[start..i]);
                let (c, len) = reference(&bytes[i..]).map_err(|kind| (kind, i))?;
                out.push(c);
                i += len;
                start = i;
            }
            b'\r' => {
                out.push_str(&raw[start..i]);
                out.push(if mode == Mode::Attribute { ' ' } else { '\n' });
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            b'\n' | b'\t' if mode == Mode::Attribute => {
                out.push_str(&raw[start..i]);
                out.push(' ');
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&raw[start..]);
    Ok(Cow::Owned(out))
}

/// Line end normalization for content that knows no references.
pub(crate) fn normalize_newlines(raw: &str) -> Cow<'_, str> {
    if memchr(b'\r', raw.as_bytes()).is_none() {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
}
