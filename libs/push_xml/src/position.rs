/// A location in the input stream.
///
/// `offset` counts bytes from the start of the stream, `line` and `column`
/// are 1-based, columns count characters rather than bytes. `\r\n`, `\r` and
/// `\n` each end a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const START: Position = Position {
        offset: 0,
        line: 1,
        column: 1,
    };
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

/// Follows the position of the first unconsumed byte.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tracker {
    position: Position,
    after_cr: bool,
}

impl Tracker {
    pub(crate) fn new() -> Self {
        Tracker {
            position: Position::START,
            after_cr: false,
        }
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn advance(&mut self, bytes: &[u8]) {
        let pos = &mut self.position;
        pos.offset += bytes.len();
        for &b in bytes {
            match b {
                b'\n' if self.after_cr => self.after_cr = false,
                b'\n' | b'\r' => {
                    pos.line += 1;
                    pos.column = 1;
                    self.after_cr = b == b'\r';
                }
                _ => {
                    self.after_cr = false;
                    // utf-8 continuation bytes belong to the previous column
                    if b & 0xC0 != 0x80 {
                        pos.column += 1;
                    }
                }
            }
        }
    }

    /// Moves past `len` bytes that take up no column, such as a byte order mark.
    pub(crate) fn skip(&mut self, len: usize) {
        self.position.offset += len;
    }

    /// Where the stream would be after `bytes`, without moving.
    pub(crate) fn locate(&self, bytes: &[u8]) -> Position {
        let mut ahead = *self;
        ahead.advance(bytes);
        ahead.position
    }
}
