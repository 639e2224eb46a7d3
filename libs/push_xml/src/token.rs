use alloc::borrow::Cow;

use crate::attributes::Attributes;

/// The contents of `<?xml ...?>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlDecl<'a> {
    pub version: &'a str,
    pub encoding: Option<&'a str>,
    pub standalone: Option<bool>,
}

/// One lexical unit, borrowed from the input buffer until it is dispatched.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'a> {
    Declaration(XmlDecl<'a>),
    Doctype {
        name: &'a str,
    },
    ProcessingInstruction {
        target: &'a str,
        data: Cow<'a, str>,
    },
    Comment {
        content: Cow<'a, str>,
    },
    CData {
        content: Cow<'a, str>,
    },
    StartTag {
        name: &'a str,
        attrs: Attributes<'a>,
        /// `<name/>`, an end tag is implied.
        empty: bool,
    },
    EndTag {
        name: &'a str,
    },
    Text {
        content: Cow<'a, str>,
        /// Offset of the first non-whitespace byte, `None` for blank runs.
        significant: Option<usize>,
    },
}
