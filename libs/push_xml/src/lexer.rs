//! Incremental tokenizer.
//!
//! [`next_token`] looks at the unconsumed bytes and either recognizes one
//! complete token or reports that more input is needed. Nothing survives
//! between calls: after [`Scan::NeedMore`] the same bytes, plus whatever was
//! fed since, are scanned again from the same start.

use core::str;

use memchr::{memchr, memchr2, memmem};

use crate::attributes::Attributes;
use crate::chars::{
    check_name, find_invalid_char, is_name_start_char, is_whitespace, trim_end, trim_start,
};
use crate::entities::{self, Mode};
use crate::error::LexicalError;
use crate::token::{Token, XmlDecl};

const COMMENT_OPEN: &[u8] = b"<!--";
const CDATA_OPEN: &[u8] = b"<![CDATA[";
const DOCTYPE_OPEN: &[u8] = b"<!DOCTYPE";

const SUPPORTED_ENCODINGS: [&str; 4] = ["UTF-8", "UTF8", "US-ASCII", "ASCII"];

pub(crate) enum Scan<'a> {
    /// A token and the number of bytes it spans.
    Token(Token<'a>, usize),
    NeedMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LexError {
    pub kind: LexicalError,
    /// Offset of the first offending byte from the start of the scan.
    pub at: usize,
}

impl LexError {
    fn new(kind: LexicalError, at: usize) -> Self {
        LexError { kind, at }
    }
}

type Result<T> = core::result::Result<T, LexError>;

/// Recognizes the token at the start of `buf`.
///
/// With `eof` set, no more bytes will come: character data runs to the end
/// of `buf` and an unfinished construct is an error instead of [`Scan::NeedMore`].
pub(crate) fn next_token(buf: &[u8], eof: bool) -> Result<Scan<'_>> {
    debug_assert!(!buf.is_empty());
    if buf[0] != b'<' {
        return text(buf, eof);
    }
    match buf.get(1) {
        None => incomplete(eof),
        Some(b'/') => end_tag(buf, eof),
        Some(b'?') => processing_instruction(buf, eof),
        Some(b'!') => match buf.get(2) {
            None => incomplete(eof),
            Some(b'-') => comment(buf, eof),
            Some(b'[') => cdata(buf, eof),
            Some(_) => doctype(buf, eof),
        },
        Some(&b) if b.is_ascii() && !is_name_start_char(b as char) => {
            Err(LexError::new(LexicalError::MalformedMarkup, 1))
        }
        Some(_) => start_tag(buf, eof),
    }
}

fn incomplete<'a>(eof: bool) -> Result<Scan<'a>> {
    if eof {
        Err(LexError::new(LexicalError::UnexpectedEof, 0))
    } else {
        Ok(Scan::NeedMore)
    }
}

fn utf8(bytes: &[u8], base: usize) -> Result<&str> {
    str::from_utf8(bytes)
        .map_err(|e| LexError::new(LexicalError::InvalidUtf8, base + e.valid_up_to()))
}

fn valid_chars(s: &str, base: usize) -> Result<()> {
    match find_invalid_char(s) {
        Some(at) => Err(LexError::new(LexicalError::InvalidChar, base + at)),
        None => Ok(()),
    }
}

fn valid_name(s: &str, base: usize) -> Result<()> {
    check_name(s).map_err(|at| LexError::new(LexicalError::InvalidName, base + at))
}

/// `Ok(false)` while `buf` is still too short to tell.
fn starts_with(buf: &[u8], prefix: &[u8], kind: LexicalError) -> Result<bool> {
    match buf.iter().zip(prefix).position(|(a, b)| a != b) {
        Some(at) => Err(LexError::new(kind, at)),
        None => Ok(buf.len() >= prefix.len()),
    }
}

fn text(buf: &[u8], eof: bool) -> Result<Scan<'_>> {
    let end = match memchr(b'<', buf) {
        Some(end) => end,
        None if eof => buf.len(),
        None => return Ok(Scan::NeedMore),
    };
    let raw = utf8(&buf[..end], 0)?;
    valid_chars(raw, 0)?;
    if let Some(at) = memmem::find(raw.as_bytes(), b"]]>") {
        return Err(LexError::new(LexicalError::CdataEndInText, at));
    }
    let significant = raw.bytes().position(|b| !is_whitespace(b));
    let content =
        entities::unescape(raw, Mode::Text).map_err(|(kind, at)| LexError::new(kind, at))?;
    Ok(Scan::Token(Token::Text { content, significant }, end))
}

/// Index of the `>` closing the tag at the start of `buf`. A quote opens
/// an attribute value only right after `=`; anywhere else it is left for
/// the attribute scan to reject.
fn tag_end(buf: &[u8]) -> Result<Option<usize>> {
    let mut in_name = true;
    let mut after_eq = false;
    let mut quote = None;
    for (i, &b) in buf.iter().enumerate().skip(1) {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            } else if b == b'<' {
                return Err(LexError::new(LexicalError::LtInAttributeValue, i));
            }
            continue;
        }
        match b {
            b'>' => return Ok(Some(i)),
            b'<' => return Err(LexError::new(LexicalError::MalformedTag, i)),
            b'"' | b'\'' if after_eq => quote = Some(b),
            b'=' if !in_name => {
                after_eq = true;
                continue;
            }
            _ if is_whitespace(b) => {
                in_name = false;
                continue;
            }
            _ => {}
        }
        after_eq = false;
    }
    Ok(None)
}

fn start_tag(buf: &[u8], eof: bool) -> Result<Scan<'_>> {
    let Some(end) = tag_end(buf)? else {
        return incomplete(eof);
    };
    let mut body = &buf[1..end];
    let empty = body.last() == Some(&b'/');
    if empty {
        body = &body[..body.len() - 1];
    }
    let body = utf8(body, 1)?;
    valid_chars(body, 1)?;

    let name_len = body.bytes().position(is_whitespace).unwrap_or(body.len());
    let name = &body[..name_len];
    valid_name(name, 1)?;

    let mut attrs = Attributes::new();
    let mut raw = RawAttrs::new(&body[name_len..], 1 + name_len);
    while let Some(attr) = raw.next()? {
        let value = entities::unescape(attr.value, Mode::Attribute)
            .map_err(|(kind, at)| LexError::new(kind, attr.value_at + at))?;
        attrs.push(attr.name, value, attr.name_at);
    }
    Ok(Scan::Token(Token::StartTag { name, attrs, empty }, end + 1))
}

fn end_tag(buf: &[u8], eof: bool) -> Result<Scan<'_>> {
    let Some(end) = memchr2(b'>', b'<', &buf[2..]).map(|i| i + 2) else {
        return incomplete(eof);
    };
    if buf[end] == b'<' {
        return Err(LexError::new(LexicalError::MalformedTag, end));
    }
    let body = utf8(&buf[2..end], 2)?;
    let name = trim_end(body);
    valid_name(name, 2)?;
    Ok(Scan::Token(Token::EndTag { name }, end + 1))
}

fn comment(buf: &[u8], eof: bool) -> Result<Scan<'_>> {
    if !starts_with(buf, COMMENT_OPEN, LexicalError::MalformedMarkup)? {
        return incomplete(eof);
    }
    let open = COMMENT_OPEN.len();
    let Some(dashes) = memmem::find(&buf[open..], b"--").map(|i| i + open) else {
        return incomplete(eof);
    };
    match buf.get(dashes + 2) {
        None => return incomplete(eof),
        Some(b'>') => {}
        Some(_) => return Err(LexError::new(LexicalError::InvalidComment, dashes)),
    }
    let content = utf8(&buf[open..dashes], open)?;
    valid_chars(content, open)?;
    let content = entities::normalize_newlines(content);
    Ok(Scan::Token(Token::Comment { content }, dashes + 3))
}

fn cdata(buf: &[u8], eof: bool) -> Result<Scan<'_>> {
    if !starts_with(buf, CDATA_OPEN, LexicalError::MalformedMarkup)? {
        return incomplete(eof);
    }
    let open = CDATA_OPEN.len();
    let Some(close) = memmem::find(&buf[open..], b"]]>").map(|i| i + open) else {
        return incomplete(eof);
    };
    let content = utf8(&buf[open..close], open)?;
    valid_chars(content, open)?;
    let content = entities::normalize_newlines(content);
    Ok(Scan::Token(Token::CData { content }, close + 3))
}

fn processing_instruction(buf: &[u8], eof: bool) -> Result<Scan<'_>> {
    let Some(close) = memmem::find(&buf[2..], b"?>").map(|i| i + 2) else {
        return incomplete(eof);
    };
    let body = utf8(&buf[2..close], 2)?;
    valid_chars(body, 2)?;
    let target_len = body.bytes().position(is_whitespace).unwrap_or(body.len());
    let (target, rest) = body.split_at(target_len);
    valid_name(target, 2)?;

    if target == "xml" {
        let decl = declaration(rest, 2 + target_len)?;
        return Ok(Scan::Token(Token::Declaration(decl), close + 2));
    }
    // every other spelling of "xml" is reserved
    if target.eq_ignore_ascii_case("xml") {
        return Err(LexError::new(LexicalError::InvalidName, 2));
    }
    let data = entities::normalize_newlines(trim_start(rest));
    Ok(Scan::Token(Token::ProcessingInstruction { target, data }, close + 2))
}

fn declaration(rest: &str, base: usize) -> Result<XmlDecl<'_>> {
    let malformed = |at| LexError::new(LexicalError::MalformedDeclaration, at);
    let mut attrs = RawAttrs::new(rest, base);
    let mut pull = || attrs.next().map_err(|e| malformed(e.at));

    let version = match pull()? {
        Some(attr) if attr.name == "version" => attr,
        _ => return Err(malformed(base)),
    };
    let numbered = version
        .value
        .strip_prefix("1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()));
    if !numbered {
        return Err(malformed(version.value_at));
    }

    let mut next = pull()?;
    let mut encoding = None;
    if let Some(attr) = next.filter(|a| a.name == "encoding") {
        if !SUPPORTED_ENCODINGS
            .iter()
            .any(|e| attr.value.eq_ignore_ascii_case(e))
        {
            return Err(LexError::new(LexicalError::UnsupportedEncoding, attr.value_at));
        }
        encoding = Some(attr.value);
        next = pull()?;
    }

    let mut standalone = None;
    if let Some(attr) = next.filter(|a| a.name == "standalone") {
        standalone = Some(match attr.value {
            "yes" => true,
            "no" => false,
            _ => return Err(malformed(attr.value_at)),
        });
        next = pull()?;
    }

    if let Some(attr) = next {
        return Err(malformed(attr.name_at));
    }
    Ok(XmlDecl {
        version: version.value,
        encoding,
        standalone,
    })
}

fn doctype(buf: &[u8], eof: bool) -> Result<Scan<'_>> {
    if !starts_with(buf, DOCTYPE_OPEN, LexicalError::MalformedMarkup)? {
        return incomplete(eof);
    }
    let Some(end) = doctype_end(buf) else {
        return incomplete(eof);
    };
    let open = DOCTYPE_OPEN.len();
    let body = utf8(&buf[open..end], open)?;
    valid_chars(body, open)?;
    let trimmed = trim_start(body);
    if trimmed.len() == body.len() {
        return Err(LexError::new(LexicalError::MalformedMarkup, open));
    }
    let name_at = open + body.len() - trimmed.len();
    let name_len = trimmed
        .bytes()
        .position(|b| is_whitespace(b) || b == b'[')
        .unwrap_or(trimmed.len());
    let name = &trimmed[..name_len];
    valid_name(name, name_at)?;
    Ok(Scan::Token(Token::Doctype { name }, end + 1))
}

/// Index of the `>` closing a document type declaration. The internal
/// subset is skipped over without being interpreted; quotes only count
/// outside of comments and processing instructions.
fn doctype_end(buf: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut i = DOCTYPE_OPEN.len();
    while i < buf.len() {
        let b = buf[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b'>' if depth == 0 => return Some(i),
            b'<' if depth > 0 && buf[i..].starts_with(COMMENT_OPEN) => {
                let close = memmem::find(&buf[i + COMMENT_OPEN.len()..], b"-->")?;
                i += COMMENT_OPEN.len() + close + 3;
                continue;
            }
            b'<' if depth > 0 && buf[i..].starts_with(b"<?") => {
                let close = memmem::find(&buf[i + 2..], b"?>")?;
                i += 2 + close + 2;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[derive(Debug, Clone, Copy)]
struct RawAttr<'a> {
    name: &'a str,
    name_at: usize,
    /// Between the quotes, nothing resolved yet.
    value: &'a str,
    value_at: usize,
}

/// Walks `name="value"` pairs. Offsets are reported relative to the tag start.
struct RawAttrs<'a> {
    s: &'a str,
    i: usize,
    base: usize,
}

impl<'a> RawAttrs<'a> {
    fn new(s: &'a str, base: usize) -> Self {
        RawAttrs { s, i: 0, base }
    }

    fn error(&self, kind: LexicalError) -> LexError {
        LexError::new(kind, self.base + self.i)
    }

    /// Returns whether any whitespace was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.i;
        let bytes = self.s.as_bytes();
        while self.i < bytes.len() && is_whitespace(bytes[self.i]) {
            self.i += 1;
        }
        self.i > start
    }

    fn next(&mut self) -> Result<Option<RawAttr<'a>>> {
        let bytes = self.s.as_bytes();
        let separated = self.skip_whitespace();
        if self.i == bytes.len() {
            return Ok(None);
        }
        if !separated {
            return Err(self.error(LexicalError::MalformedTag));
        }

        let name_at = self.i;
        while self.i < bytes.len() && !is_whitespace(bytes[self.i]) && bytes[self.i] != b'=' {
            self.i += 1;
        }
        let name = &self.s[name_at..self.i];
        valid_name(name, self.base + name_at)?;

        self.skip_whitespace();
        if bytes.get(self.i) != Some(&b'=') {
            return Err(self.error(LexicalError::MalformedTag));
        }
        self.i += 1;
        self.skip_whitespace();
        let quote = match bytes.get(self.i) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err(self.error(LexicalError::MalformedTag)),
        };
        let value_at = self.i + 1;
        let Some(len) = memchr(quote, &bytes[value_at..]) else {
            return Err(self.error(LexicalError::MalformedTag));
        };
        self.i = value_at + len + 1;
        Ok(Some(RawAttr {
            name,
            name_at: self.base + name_at,
            value: &self.s[value_at..value_at + len],
            value_at: self.base + value_at,
        }))
    }
}
