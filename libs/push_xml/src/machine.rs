//! Document-level well-formedness: nesting, attribute uniqueness and what
//! may appear before and after the root element.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::ErrorKind;
use crate::token::Token;

/// Where a session stands in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Before the root element.
    Prolog,
    InElement,
    /// After the root element closed.
    Epilog,
    /// End of input reached with a well-formed document.
    Done,
    /// A [`ParseError`](crate::ParseError) was raised.
    Failed,
    /// A handler asked to stop.
    Aborted,
}

impl State {
    /// No further input is looked at in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Done | State::Failed | State::Aborted)
    }
}

/// Open element names, innermost last, packed into a single string.
#[derive(Debug, Default)]
pub(crate) struct ElementStack {
    names: String,
    ends: Vec<usize>,
}

impl ElementStack {
    pub(crate) fn push(&mut self, name: &str) {
        self.names.push_str(name);
        self.ends.push(self.names.len());
    }

    pub(crate) fn top(&self) -> Option<&str> {
        let end = *self.ends.last()?;
        Some(&self.names[self.start_of(self.ends.len() - 1)..end])
    }

    pub(crate) fn pop(&mut self) {
        if self.ends.pop().is_some() {
            self.names.truncate(self.start_of(self.ends.len()));
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.ends.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    fn start_of(&self, index: usize) -> usize {
        match index {
            0 => 0,
            i => self.ends[i - 1],
        }
    }
}

/// Why a token was refused: the kind and the offset of the offending byte
/// from the token start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rejection {
    pub kind: ErrorKind,
    pub at: usize,
}

impl Rejection {
    fn new(kind: ErrorKind, at: usize) -> Self {
        Rejection { kind, at }
    }
}

#[derive(Debug)]
pub(crate) struct Machine {
    state: State,
    stack: ElementStack,
    /// Any token seen yet, the XML declaration has to come first.
    started: bool,
    seen_doctype: bool,
}

impl Machine {
    pub(crate) fn new() -> Self {
        Machine {
            state: State::Prolog,
            stack: ElementStack::default(),
            started: false,
            seen_doctype: false,
        }
    }

    pub(crate) fn state(&self) -> State {
        self.state
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub(crate) fn fail(&mut self) {
        self.state = State::Failed;
    }

    pub(crate) fn abort(&mut self) {
        self.state = State::Aborted;
    }

    /// Applies `token` to the document state.
    /// Returns whether the token is worth dispatching.
    pub(crate) fn accept(&mut self, token: &Token<'_>) -> Result<bool, Rejection> {
        debug_assert!(!self.state.is_terminal());
        let first = !self.started;
        self.started = true;
        match token {
            Token::Declaration(_) => {
                if !first {
                    return Err(Rejection::new(ErrorKind::MisplacedDeclaration, 0));
                }
                Ok(true)
            }
            Token::Doctype { .. } => {
                if self.state != State::Prolog || self.seen_doctype {
                    return Err(Rejection::new(ErrorKind::MisplacedDeclaration, 0));
                }
                self.seen_doctype = true;
                Ok(true)
            }
            Token::Comment { .. } | Token::ProcessingInstruction { .. } => Ok(true),
            Token::StartTag { name, attrs, empty } => {
                if let Some(dup) = attrs.find_duplicate() {
                    return Err(Rejection::new(ErrorKind::DuplicateAttribute, dup.offset));
                }
                if self.state == State::Epilog {
                    return Err(Rejection::new(ErrorKind::JunkAfterRoot, 0));
                }
                if !empty {
                    self.stack.push(name);
                }
                self.state = if self.stack.is_empty() {
                    State::Epilog
                } else {
                    State::InElement
                };
                Ok(true)
            }
            Token::EndTag { name } => {
                if self.stack.top() != Some(*name) {
                    return Err(Rejection::new(ErrorKind::TagMismatch, 0));
                }
                self.stack.pop();
                if self.stack.is_empty() {
                    self.state = State::Epilog;
                }
                Ok(true)
            }
            Token::Text { significant, .. } => {
                if !self.stack.is_empty() {
                    return Ok(true);
                }
                match significant {
                    Some(at) => Err(Rejection::new(ErrorKind::UnexpectedCharacterData, *at)),
                    None => Ok(false),
                }
            }
            Token::CData { .. } => {
                if self.stack.is_empty() {
                    return Err(Rejection::new(ErrorKind::UnexpectedCharacterData, 0));
                }
                Ok(true)
            }
        }
    }

    /// End of input.
    pub(crate) fn finish(&mut self) -> Result<(), ErrorKind> {
        match self.state {
            State::InElement => Err(ErrorKind::UnclosedElements),
            State::Prolog => Err(ErrorKind::NoElements),
            _ => {
                self.state = State::Done;
                Ok(())
            }
        }
    }
}
