//! Character classes of XML 1.0 (fifth edition).

pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// `s` without leading XML whitespace.
pub(crate) fn trim_start(s: &str) -> &str {
    let start = s.bytes().position(|b| !is_whitespace(b)).unwrap_or(s.len());
    &s[start..]
}

/// `s` without trailing XML whitespace.
pub(crate) fn trim_end(s: &str) -> &str {
    let end = s.bytes().rposition(|b| !is_whitespace(b)).map_or(0, |i| i + 1);
    &s[..end]
}

pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Checks `name` against the `Name` production.
/// On failure returns the byte index of the first offending character.
pub(crate) fn check_name(name: &str) -> Result<(), usize> {
    let mut chars = name.char_indices();
    match chars.next() {
        Some((_, c)) if is_name_start_char(c) => {}
        _ => return Err(0),
    }
    match chars.find(|&(_, c)| !is_name_char(c)) {
        Some((at, _)) => Err(at),
        None => Ok(()),
    }
}

/// Byte index of the first character that may not appear in a document.
pub(crate) fn find_invalid_char(s: &str) -> Option<usize> {
    // ascii fast path, everything above 0x7f is checked per char
    let bytes = s.as_bytes();
    let first_suspect = bytes
        .iter()
        .position(|&b| b >= 0x80 || (b < 0x20 && !is_whitespace(b)))?;
    s[first_suspect..]
        .char_indices()
        .find(|&(_, c)| !is_xml_char(c))
        .map(|(at, _)| first_suspect + at)
}
