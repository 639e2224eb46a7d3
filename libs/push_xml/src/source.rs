use embedded_io::Error as _;

use crate::handler::Handler;
use crate::parser::{Parser, Status};
use crate::{Error, Result};

/// Drives `parser` from `reader`, one `buf`-sized chunk at a time, until the
/// reader runs dry or the parse ends early.
///
/// The end of input is signalled once `read` returns 0, so short reads in
/// the middle of a stream are harmless.
///
/// ```
/// # use push_xml::{Parser, Status, parse_reader};
/// # fn main() -> Result<(), push_xml::Error> {
/// let mut input = "<list><item/><item/></list>".as_bytes();
/// let mut parser = Parser::new();
/// let mut chunk = [0u8; 8];
/// assert_eq!(parse_reader(&mut parser, &mut input, &mut chunk)?, Status::Done);
/// # Ok(())
/// # }
/// ```
pub fn parse_reader<H, R>(parser: &mut Parser<H>, mut reader: R, buf: &mut [u8]) -> Result<Status>
where
    H: Handler,
    R: embedded_io::Read,
{
    if buf.is_empty() {
        return Err(Error::IoError(embedded_io::ErrorKind::InvalidInput));
    }
    loop {
        let read = reader
            .read(buf)
            .map_err(|e| Error::IoError(e.kind()))?;
        if read == 0 {
            trace!("Reader exhausted at {:?}", parser.position());
            return Ok(parser.finish()?);
        }
        match parser.feed(&buf[..read])? {
            Status::Ok => {}
            status => return Ok(status),
        }
    }
}
