use crate::attributes::Attributes;
use crate::buffer::Buffer;
use crate::error::{ErrorKind, ParseError};
use crate::handler::{self, Callbacks, Flow, Handler};
use crate::lexer::{self, Scan};
use crate::machine::{Machine, State};
use crate::position::{Position, Tracker};
use crate::token::XmlDecl;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// What a session looks like after a call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Everything fed so far is fine, more input is welcome.
    Ok,
    /// End of input reached, the document is well-formed.
    Done,
    /// A handler stopped the parse.
    Aborted,
}

/// Session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub(crate) capacity: usize,
    pub(crate) max_buffered: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            capacity: 4096,
            max_buffered: None,
        }
    }
}

impl Options {
    /// Initial size of the input buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Fails the session with [`ErrorKind::BufferLimit`] once a single
    /// unfinished token holds more than `limit` bytes.
    pub fn max_buffered(mut self, limit: usize) -> Self {
        self.max_buffered = Some(limit);
        self
    }
}

/// A streaming XML parser session.
///
/// Bytes go in through [`feed`](Parser::feed) in chunks of any size, events
/// come out through the [`Handler`] before `feed` returns. Every token is
/// reported exactly once, whatever the chunking.
///
/// ```
/// # use push_xml::{Parser, Status};
/// # fn main() -> Result<(), push_xml::ParseError> {
/// let mut parser = Parser::new();
/// parser.set_handlers(
///     |name, _attrs| println!("START: {name}"),
///     |name| println!("END: {name}"),
/// );
/// parser.feed(b"<greeting><who>wor")?;
/// parser.feed(b"ld</who></greeting>")?;
/// assert_eq!(parser.finish()?, Status::Done);
/// # Ok(())
/// # }
/// ```
pub struct Parser<H = Callbacks> {
    buffer: Buffer,
    tracker: Tracker,
    machine: Machine,
    handler: H,
    options: Options,
    error: Option<ParseError>,
    /// The leading byte order mark has been dealt with.
    bom_checked: bool,
}

impl Parser<Callbacks> {
    /// A session without any handlers. It checks well-formedness only until
    /// handlers are set.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Parser::with_handler_and_options(Callbacks::default(), options)
    }

    /// Sets the element handlers, replacing both previous ones.
    ///
    /// Closures may return `()` or a [`Flow`].
    pub fn set_handlers<S, SR, E, ER>(&mut self, on_start: S, on_end: E)
    where
        S: FnMut(&str, &Attributes<'_>) -> SR + 'static,
        SR: Into<Flow>,
        E: FnMut(&str) -> ER + 'static,
        ER: Into<Flow>,
    {
        self.handler.start = Some(handler::start_fn(on_start));
        self.handler.end = Some(handler::text_fn(on_end));
    }

    pub fn set_start_handler<F, R>(&mut self, on_start: F)
    where
        F: FnMut(&str, &Attributes<'_>) -> R + 'static,
        R: Into<Flow>,
    {
        self.handler.start = Some(handler::start_fn(on_start));
    }

    pub fn set_end_handler<F, R>(&mut self, on_end: F)
    where
        F: FnMut(&str) -> R + 'static,
        R: Into<Flow>,
    {
        self.handler.end = Some(handler::text_fn(on_end));
    }

    pub fn set_character_data_handler<F, R>(&mut self, on_text: F)
    where
        F: FnMut(&str) -> R + 'static,
        R: Into<Flow>,
    {
        self.handler.characters = Some(handler::text_fn(on_text));
    }

    pub fn set_cdata_handler<F, R>(&mut self, on_cdata: F)
    where
        F: FnMut(&str) -> R + 'static,
        R: Into<Flow>,
    {
        self.handler.cdata = Some(handler::text_fn(on_cdata));
    }

    pub fn set_comment_handler<F, R>(&mut self, on_comment: F)
    where
        F: FnMut(&str) -> R + 'static,
        R: Into<Flow>,
    {
        self.handler.comment = Some(handler::text_fn(on_comment));
    }

    pub fn set_processing_instruction_handler<F, R>(&mut self, on_pi: F)
    where
        F: FnMut(&str, &str) -> R + 'static,
        R: Into<Flow>,
    {
        self.handler.processing_instruction = Some(handler::pi_fn(on_pi));
    }

    pub fn set_declaration_handler<F, R>(&mut self, on_decl: F)
    where
        F: FnMut(&XmlDecl<'_>) -> R + 'static,
        R: Into<Flow>,
    {
        self.handler.declaration = Some(handler::decl_fn(on_decl));
    }

    pub fn set_doctype_handler<F, R>(&mut self, on_doctype: F)
    where
        F: FnMut(&str) -> R + 'static,
        R: Into<Flow>,
    {
        self.handler.doctype = Some(handler::text_fn(on_doctype));
    }
}

impl Default for Parser<Callbacks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handler> Parser<H> {
    pub fn with_handler(handler: H) -> Self {
        Self::with_handler_and_options(handler, Options::default())
    }

    pub fn with_handler_and_options(handler: H, options: Options) -> Self {
        Parser {
            buffer: Buffer::with_capacity(options.capacity),
            tracker: Tracker::new(),
            machine: Machine::new(),
            handler,
            options,
            error: None,
            bom_checked: false,
        }
    }

    /// Appends `bytes` and reports every token they complete.
    ///
    /// Once the session failed, the same error is returned again and
    /// nothing is looked at. After an abort the bytes are ignored. After the
    /// end of input they are refused with [`ErrorKind::Finished`], which
    /// leaves the session `Done`.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Status, ParseError> {
        if self.machine.state() == State::Done && !bytes.is_empty() {
            trace!("Refusing {} bytes after the end of the document", bytes.len());
            return Err(ParseError::new(ErrorKind::Finished, self.tracker.position()));
        }
        if let Some(settled) = self.settled() {
            return settled;
        }
        self.buffer.feed(bytes);
        self.pump(false)
    }

    /// Signals the end of input. Whatever is still buffered must form
    /// complete tokens and every element must be closed.
    pub fn finish(&mut self) -> Result<Status, ParseError> {
        if let Some(settled) = self.settled() {
            return settled;
        }
        if self.pump(true)? == Status::Aborted {
            return Ok(Status::Aborted);
        }
        match self.machine.finish() {
            Ok(()) => {
                trace!("Document done at {:?}", self.tracker.position());
                Ok(Status::Done)
            }
            Err(kind) => Err(self.fail(kind, self.buffer.len())),
        }
    }

    /// [`feed`](Parser::feed), followed by [`finish`](Parser::finish) when
    /// `is_final` is set.
    pub fn parse(&mut self, bytes: &[u8], is_final: bool) -> Result<Status, ParseError> {
        let status = self.feed(bytes)?;
        if is_final && status == Status::Ok {
            return self.finish();
        }
        Ok(status)
    }

    pub fn state(&self) -> State {
        self.machine.state()
    }

    /// The error that failed the session, if any.
    pub fn error(&self) -> Option<ParseError> {
        self.error
    }

    /// Position of the first byte not yet part of a reported token.
    pub fn position(&self) -> Position {
        self.tracker.position()
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.machine.depth()
    }

    /// Bytes held back waiting for the rest of their token.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Starts over with a fresh document, keeping handler and options.
    pub fn reset(&mut self) {
        trace!("Resetting session");
        self.buffer.clear();
        self.tracker = Tracker::new();
        self.machine = Machine::new();
        self.error = None;
        self.bom_checked = false;
    }

    fn settled(&self) -> Option<Result<Status, ParseError>> {
        match self.machine.state() {
            State::Failed => self.error.map(Err),
            State::Aborted => Some(Ok(Status::Aborted)),
            State::Done => Some(Ok(Status::Done)),
            _ => None,
        }
    }

    /// Reports tokens until the buffer runs out of complete ones.
    fn pump(&mut self, eof: bool) -> Result<Status, ParseError> {
        if !self.bom_checked && !self.skip_bom(eof) {
            return Ok(Status::Ok);
        }

        while !self.buffer.is_empty() {
            let scan = match lexer::next_token(self.buffer.unconsumed(), eof) {
                Ok(scan) => scan,
                Err(e) => return Err(self.fail(e.kind.into(), e.at)),
            };
            let (token, len) = match scan {
                Scan::Token(token, len) => (token, len),
                Scan::NeedMore => {
                    if let Some(limit) = self.options.max_buffered
                        && self.buffer.len() > limit
                    {
                        return Err(self.fail(ErrorKind::BufferLimit, 0));
                    }
                    break;
                }
            };

            let wanted = match self.machine.accept(&token) {
                Ok(wanted) => wanted,
                Err(rejection) => return Err(self.fail(rejection.kind, rejection.at)),
            };
            let flow = if wanted {
                handler::dispatch(&mut self.handler, &token)
            } else {
                Flow::Continue
            };
            drop(token);

            self.tracker.advance(&self.buffer.unconsumed()[..len]);
            self.buffer.consume(len);

            if flow == Flow::Stop {
                trace!("Stopped by handler at {:?}", self.tracker.position());
                self.machine.abort();
                return Ok(Status::Aborted);
            }
        }
        Ok(Status::Ok)
    }

    /// Drops a leading byte order mark. Returns false while too few bytes
    /// have arrived to tell.
    fn skip_bom(&mut self, eof: bool) -> bool {
        let bytes = self.buffer.unconsumed();
        if bytes.len() < BOM.len() && BOM.starts_with(bytes) && !eof {
            return false;
        }
        if bytes.starts_with(BOM) {
            self.tracker.skip(BOM.len());
            self.buffer.consume(BOM.len());
        }
        self.bom_checked = true;
        true
    }

    /// Moves the session to `Failed`. `at` is an offset into the unconsumed bytes.
    fn fail(&mut self, kind: ErrorKind, at: usize) -> ParseError {
        let unconsumed = self.buffer.unconsumed();
        let position = self.tracker.locate(&unconsumed[..at.min(unconsumed.len())]);
        let error = ParseError::new(kind, position);
        trace!("Parse failed: {error}");
        self.error = Some(error);
        self.machine.fail();
        error
    }
}
