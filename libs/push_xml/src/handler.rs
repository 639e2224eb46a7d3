use alloc::boxed::Box;
use core::fmt;

use crate::attributes::Attributes;
use crate::token::{Token, XmlDecl};

/// A handler's answer after each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    /// Stop parsing. The session ends up [`Aborted`](crate::State::Aborted),
    /// which is not an error.
    Stop,
}

impl From<()> for Flow {
    fn from(_: ()) -> Self {
        Flow::Continue
    }
}

/// Receives the events of a document, in document order, on the thread that
/// feeds the parser.
///
/// Every method defaults to ignoring its event.
#[allow(unused_variables)]
pub trait Handler {
    fn start_element(&mut self, name: &str, attrs: &Attributes<'_>) -> Flow {
        Flow::Continue
    }

    fn end_element(&mut self, name: &str) -> Flow {
        Flow::Continue
    }

    /// A run of character data between two pieces of markup, references resolved.
    fn characters(&mut self, text: &str) -> Flow {
        Flow::Continue
    }

    fn cdata(&mut self, text: &str) -> Flow {
        Flow::Continue
    }

    fn comment(&mut self, text: &str) -> Flow {
        Flow::Continue
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Flow {
        Flow::Continue
    }

    fn declaration(&mut self, decl: &XmlDecl<'_>) -> Flow {
        Flow::Continue
    }

    fn doctype(&mut self, name: &str) -> Flow {
        Flow::Continue
    }
}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn start_element(&mut self, name: &str, attrs: &Attributes<'_>) -> Flow {
        (**self).start_element(name, attrs)
    }

    fn end_element(&mut self, name: &str) -> Flow {
        (**self).end_element(name)
    }

    fn characters(&mut self, text: &str) -> Flow {
        (**self).characters(text)
    }

    fn cdata(&mut self, text: &str) -> Flow {
        (**self).cdata(text)
    }

    fn comment(&mut self, text: &str) -> Flow {
        (**self).comment(text)
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Flow {
        (**self).processing_instruction(target, data)
    }

    fn declaration(&mut self, decl: &XmlDecl<'_>) -> Flow {
        (**self).declaration(decl)
    }

    fn doctype(&mut self, name: &str) -> Flow {
        (**self).doctype(name)
    }
}

type StartFn = Box<dyn FnMut(&str, &Attributes<'_>) -> Flow>;
type TextFn = Box<dyn FnMut(&str) -> Flow>;
type PiFn = Box<dyn FnMut(&str, &str) -> Flow>;
type DeclFn = Box<dyn FnMut(&XmlDecl<'_>) -> Flow>;

/// A [`Handler`] made of optional closures. Events without a closure are skipped.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) start: Option<StartFn>,
    pub(crate) end: Option<TextFn>,
    pub(crate) characters: Option<TextFn>,
    pub(crate) cdata: Option<TextFn>,
    pub(crate) comment: Option<TextFn>,
    pub(crate) processing_instruction: Option<PiFn>,
    pub(crate) declaration: Option<DeclFn>,
    pub(crate) doctype: Option<TextFn>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("start", &self.start.is_some())
            .field("end", &self.end.is_some())
            .field("characters", &self.characters.is_some())
            .field("cdata", &self.cdata.is_some())
            .field("comment", &self.comment.is_some())
            .field("processing_instruction", &self.processing_instruction.is_some())
            .field("declaration", &self.declaration.is_some())
            .field("doctype", &self.doctype.is_some())
            .finish()
    }
}

pub(crate) fn text_fn<F, R>(mut f: F) -> TextFn
where
    F: FnMut(&str) -> R + 'static,
    R: Into<Flow>,
{
    Box::new(move |text: &str| -> Flow { f(text).into() })
}

pub(crate) fn start_fn<F, R>(mut f: F) -> StartFn
where
    F: FnMut(&str, &Attributes<'_>) -> R + 'static,
    R: Into<Flow>,
{
    Box::new(move |name: &str, attrs: &Attributes<'_>| -> Flow { f(name, attrs).into() })
}

pub(crate) fn pi_fn<F, R>(mut f: F) -> PiFn
where
    F: FnMut(&str, &str) -> R + 'static,
    R: Into<Flow>,
{
    Box::new(move |target: &str, data: &str| -> Flow { f(target, data).into() })
}

pub(crate) fn decl_fn<F, R>(mut f: F) -> DeclFn
where
    F: FnMut(&XmlDecl<'_>) -> R + 'static,
    R: Into<Flow>,
{
    Box::new(move |decl: &XmlDecl<'_>| -> Flow { f(decl).into() })
}

fn call_text(slot: &mut Option<TextFn>, text: &str) -> Flow {
    match slot {
        Some(f) => f(text),
        None => Flow::Continue,
    }
}

impl Handler for Callbacks {
    fn start_element(&mut self, name: &str, attrs: &Attributes<'_>) -> Flow {
        match &mut self.start {
            Some(f) => f(name, attrs),
            None => Flow::Continue,
        }
    }

    fn end_element(&mut self, name: &str) -> Flow {
        call_text(&mut self.end, name)
    }

    fn characters(&mut self, text: &str) -> Flow {
        call_text(&mut self.characters, text)
    }

    fn cdata(&mut self, text: &str) -> Flow {
        call_text(&mut self.cdata, text)
    }

    fn comment(&mut self, text: &str) -> Flow {
        call_text(&mut self.comment, text)
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Flow {
        match &mut self.processing_instruction {
            Some(f) => f(target, data),
            None => Flow::Continue,
        }
    }

    fn declaration(&mut self, decl: &XmlDecl<'_>) -> Flow {
        match &mut self.declaration {
            Some(f) => f(decl),
            None => Flow::Continue,
        }
    }

    fn doctype(&mut self, name: &str) -> Flow {
        call_text(&mut self.doctype, name)
    }
}

/// Hands `token` to `handler`. An empty element tag reports its end right
/// after its start unless the start asked to stop.
pub(crate) fn dispatch<H: Handler>(handler: &mut H, token: &Token<'_>) -> Flow {
    match token {
        Token::Declaration(decl) => handler.declaration(decl),
        Token::Doctype { name } => handler.doctype(name),
        Token::ProcessingInstruction { target, data } => {
            handler.processing_instruction(target, data)
        }
        Token::Comment { content } => handler.comment(content),
        Token::CData { content } => handler.cdata(content),
        Token::Text { content, .. } => handler.characters(content),
        Token::EndTag { name } => handler.end_element(name),
        Token::StartTag { name, attrs, empty } => match handler.start_element(name, attrs) {
            Flow::Continue if *empty => handler.end_element(name),
            flow => flow,
        },
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::borrow::Cow;
    use std::rc::Rc;
    use std::cell::RefCell;
    use std::string::String;
    use std::vec::Vec;

    use super::*;

    #[test]
    fn unset_callbacks_are_skipped() {
        let mut callbacks = Callbacks::default();
        let token = Token::Text { content: Cow::Borrowed("x"), significant: Some(0) };
        assert_eq!(dispatch(&mut callbacks, &token), Flow::Continue);
    }

    #[test]
    fn empty_tag_reports_both_ends() {
        let seen = Rc::new(RefCell::new(Vec::<String>::new()));
        let mut callbacks = Callbacks::default();
        let log = seen.clone();
        callbacks.start = Some(start_fn(move |name, _| log.borrow_mut().push(String::from(name))));
        let log = seen.clone();
        callbacks.end = Some(text_fn(move |name| log.borrow_mut().push(std::format!("/{name}"))));

        let token = Token::StartTag { name: "br", attrs: Attributes::new(), empty: true };
        assert_eq!(dispatch(&mut callbacks, &token), Flow::Continue);
        assert_eq!(*seen.borrow(), ["br", "/br"]);
    }

    #[test]
    fn stop_on_start_skips_implied_end() {
        let mut callbacks = Callbacks::default();
        callbacks.start = Some(start_fn(|_, _| Flow::Stop));
        callbacks.end = Some(text_fn(|_| -> Flow { panic!("end must not be reported") }));
        let token = Token::StartTag { name: "br", attrs: Attributes::new(), empty: true };
        assert_eq!(dispatch(&mut callbacks, &token), Flow::Stop);
    }
}
