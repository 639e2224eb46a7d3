/*!
A no_std streaming XML parser that pushes events to callbacks as bytes arrive.

## Features
- no_std, only needs `alloc`
- incremental: input may be split anywhere, even inside a UTF-8 sequence
- non-blocking: the caller owns the input loop and `feed` never waits
- well-formedness checking with line/column positions on errors
- optional `log` feature for trace output

## Usage
```
# use push_xml::{Parser, Status};
# fn main() -> Result<(), push_xml::ParseError> {
let mut parser = Parser::new();
parser.set_handlers(
    |name, attrs| println!("START: {name} {attrs:?}"),
    |name| println!("END: {name}"),
);
parser.set_character_data_handler(|text| println!("TEXT: {text:?}"));

for chunk in ["<?xml version=\"1.0\"?><doc a=\"1\">te", "xt<empty/></d", "oc>"] {
    parser.feed(chunk.as_bytes())?;
}
assert_eq!(parser.finish()?, Status::Done);
# Ok(())
# }
```

Structured handlers implement [`Handler`] instead:
```
# use push_xml::{Attributes, Flow, Handler, Parser};
#[derive(Default)]
struct Depth { max: usize, current: usize }

impl Handler for Depth {
    fn start_element(&mut self, _: &str, _: &Attributes<'_>) -> Flow {
        self.current += 1;
        self.max = self.max.max(self.current);
        Flow::Continue
    }
    fn end_element(&mut self, _: &str) -> Flow {
        self.current -= 1;
        Flow::Continue
    }
}

let mut parser = Parser::with_handler(Depth::default());
parser.parse(b"<a><b><c/></b></a>", true).unwrap();
assert_eq!(parser.handler().max, 3);
```

## Limitations & non-goals
- UTF-8 (and ASCII) input only
- no namespaces, no DTD validation, no custom entities
- no output or serialization
*/

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::trace!($($arg)*);
        #[cfg(test)]
        std::eprintln!($($arg)*);
    };
}

mod attributes;
mod buffer;
mod chars;
mod entities;
mod error;
mod handler;
mod lexer;
mod machine;
mod parser;
mod position;
mod source;
mod token;

#[cfg(test)]
mod tests;

pub use attributes::{Attribute, Attributes};
pub use error::{ErrorKind, LexicalError, ParseError};
pub use handler::{Callbacks, Flow, Handler};
pub use machine::State;
pub use parser::{Options, Parser, Status};
pub use position::Position;
pub use source::parse_reader;
pub use token::XmlDecl;

/// Failure of [`parse_reader`]: either the input could not be read or it is
/// not well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    IoError(embedded_io::ErrorKind),
    Parse(ParseError),
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::IoError(kind) => write!(f, "read failed: {kind:?}"),
            Error::Parse(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::IoError(_) => None,
            Error::Parse(err) => Some(err),
        }
    }
}
