#![cfg_attr(rustfmt, rustfmt_skip)]
extern crate std;

use super::*;
use std::cell::RefCell;
use std::format;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

/// Writes every event down as one line, the way a test would want to compare them.
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    stop_at: Option<&'static str>,
}

impl Handler for Recorder {
    fn start_element(&mut self, name: &str, attrs: &Attributes<'_>) -> Flow {
        let mut line = format!("start {name}");
        for (key, value) in attrs.iter() {
            line.push_str(&format!(" {key}={value:?}"));
        }
        self.events.push(line);
        if self.stop_at == Some(name) {
            return Flow::Stop;
        }
        Flow::Continue
    }

    fn end_element(&mut self, name: &str) -> Flow {
        self.events.push(format!("end {name}"));
        Flow::Continue
    }

    fn characters(&mut self, text: &str) -> Flow {
        self.events.push(format!("text {text:?}"));
        Flow::Continue
    }

    fn cdata(&mut self, text: &str) -> Flow {
        self.events.push(format!("cdata {text:?}"));
        Flow::Continue
    }

    fn comment(&mut self, text: &str) -> Flow {
        self.events.push(format!("comment {text:?}"));
        Flow::Continue
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Flow {
        self.events.push(format!("pi {target} {data:?}"));
        Flow::Continue
    }

    fn declaration(&mut self, decl: &XmlDecl<'_>) -> Flow {
        self.events.push(format!("decl {} {:?} {:?}", decl.version, decl.encoding, decl.standalone));
        Flow::Continue
    }

    fn doctype(&mut self, name: &str) -> Flow {
        self.events.push(format!("doctype {name}"));
        Flow::Continue
    }
}

fn record(chunks: &[&[u8]]) -> (core::result::Result<Status, ParseError>, Vec<String>) {
    let mut parser = Parser::with_handler(Recorder::default());
    for chunk in chunks {
        if let Err(e) = parser.feed(chunk) {
            return (Err(e), parser.into_handler().events);
        }
    }
    let status = parser.finish();
    (status, parser.into_handler().events)
}

fn whole(xml: &[u8]) -> Vec<String> {
    let (status, events) = record(&[xml]);
    assert_eq!(status, Ok(Status::Done));
    events
}

fn byte_by_byte(xml: &[u8]) -> Vec<String> {
    let chunks: Vec<&[u8]> = xml.chunks(1).collect();
    let (status, events) = record(&chunks);
    assert_eq!(status, Ok(Status::Done));
    events
}

fn error_of(xml: &[u8]) -> ParseError {
    match record(&[xml]) {
        (Err(e), _) => e,
        (status, events) => panic!("expected an error, got {status:?} after {events:?}"),
    }
}

const FULL: &[u8] = b"\xEF\xBB\xBF<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
<!DOCTYPE book [ <!ENTITY chapter \"<ch>\"> ]>\n\
<!-- front matter -->\n\
<book lang='en' title=\"Caf\xC3\xA9 &amp; Co\">\r\n  \
<?render fast?>\r\n  \
<chapter n=\"1\">Tom &lt;3 &#x1F600; &#65;</chapter>\n  \
<![CDATA[<raw> & ]]]]>\n  \
<empty/>\n\
</book>\n\
<!-- trailing -->\n";

#[test]
fn full_document() {
    let events = whole(FULL);
    let expected = [
        "decl 1.0 Some(\"UTF-8\") Some(true)",
        "doctype book",
        "comment \" front matter \"",
        "start book lang=\"en\" title=\"Café & Co\"",
        "text \"\\n  \"",
        "pi render \"fast\"",
        "text \"\\n  \"",
        "start chapter n=\"1\"",
        "text \"Tom <3 😀 A\"",
        "end chapter",
        "text \"\\n  \"",
        "cdata \"<raw> & ]]\"",
        "text \"\\n  \"",
        "start empty",
        "end empty",
        "text \"\\n\"",
        "end book",
        "comment \" trailing \"",
    ];
    assert_eq!(events, expected);
}

#[test]
fn chunking_is_invisible() {
    let expected = whole(FULL);
    assert_eq!(byte_by_byte(FULL), expected);
    for chunk_size in [2, 3, 5, 7, 16, 64] {
        let chunks: Vec<&[u8]> = FULL.chunks(chunk_size).collect();
        let (status, events) = record(&chunks);
        assert_eq!(status, Ok(Status::Done), "chunk size {chunk_size}");
        assert_eq!(events, expected, "chunk size {chunk_size}");
    }
}

#[test]
fn every_split_point() {
    let xml = b"<root>hello</root>";
    for split in 0..=xml.len() {
        let (status, events) = record(&[&xml[..split], &xml[split..]]);
        assert_eq!(status, Ok(Status::Done), "split at {split}");
        assert_eq!(events, ["start root", "text \"hello\"", "end root"], "split at {split}");
    }
}

#[test]
fn multibyte_split() {
    let xml = "<p a=\"ü\">日本</p>".as_bytes();
    for split in 0..=xml.len() {
        let (status, events) = record(&[&xml[..split], &xml[split..]]);
        assert_eq!(status, Ok(Status::Done), "split at {split}");
        assert_eq!(events, ["start p a=\"ü\"", "text \"日本\"", "end p"]);
    }
}

#[test]
fn nested_elements() {
    let events = whole(b"<a><b><c/></b><b></b></a>");
    assert_eq!(events, ["start a", "start b", "start c", "end c", "end b", "start b", "end b", "end a"]);
}

#[test]
fn mismatched_end_tag() {
    let e = error_of(b"<a>\n  <b></c></a>");
    assert_eq!(e.kind(), ErrorKind::TagMismatch);
    assert_eq!(e.offset(), 9);
    assert_eq!(e.line(), 2);
    assert_eq!(e.column(), 6);
}

#[test]
fn crossed_tags() {
    let (status, events) = record(&[b"<a><b></a></b>"]);
    assert_eq!(status.unwrap_err().kind(), ErrorKind::TagMismatch);
    assert_eq!(events, ["start a", "start b"]);
}

#[test]
fn duplicate_reported_before_start() {
    let (status, events) = record(&[b"<a x=\"1\" x=\"2\"/>"]);
    assert_eq!(status.unwrap_err().kind(), ErrorKind::DuplicateAttribute);
    assert!(events.is_empty());
}

#[test]
fn stop_on_first_start() {
    let mut parser = Parser::with_handler(Recorder { stop_at: Some("a"), ..Default::default() });
    assert_eq!(parser.parse(b"<a><b/></a>", true), Ok(Status::Aborted));
    assert_eq!(parser.state(), State::Aborted);
    assert_eq!(parser.handler().events.len(), 1);
}

#[test]
fn stray_end_tag() {
    assert_eq!(error_of(b"</a>").kind(), ErrorKind::TagMismatch);
}

#[test]
fn duplicate_attribute() {
    let e = error_of(b"<a x=\"1\" y=\"2\" x=\"3\"/>");
    assert_eq!(e.kind(), ErrorKind::DuplicateAttribute);
    assert_eq!(e.offset(), 15);
    assert_eq!(e.column(), 16);
}

#[test]
fn unclosed_elements() {
    let (status, events) = record(&[b"<a><b></b>"]);
    let e = status.unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UnclosedElements);
    assert_eq!(e.offset(), 10);
    assert_eq!(events, ["start a", "start b", "end b"]);
}

#[test]
fn unfinished_token_at_end() {
    let (status, _) = record(&[b"<a></a"]);
    assert_eq!(status.unwrap_err().kind(), ErrorKind::Lexical(LexicalError::UnexpectedEof));
}

#[test]
fn no_elements() {
    assert_eq!(record(&[b""]).0.unwrap_err().kind(), ErrorKind::NoElements);
    assert_eq!(record(&[b"<!-- only -->\n"]).0.unwrap_err().kind(), ErrorKind::NoElements);
}

#[test]
fn text_outside_root() {
    let e = error_of(b"  hi<a/>");
    assert_eq!(e.kind(), ErrorKind::UnexpectedCharacterData);
    assert_eq!(e.offset(), 2);

    let (status, events) = record(&[b"<a/>", b"\ntail"]);
    let e = status.unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UnexpectedCharacterData);
    assert_eq!((e.line(), e.column()), (2, 1));
    assert_eq!(events, ["start a", "end a"]);

    assert_eq!(error_of(b"<![CDATA[x]]><a/>").kind(), ErrorKind::UnexpectedCharacterData);
}

#[test]
fn whitespace_around_root_is_silent() {
    let events = whole(b"\n \t<a> </a>\r\n ");
    assert_eq!(events, ["start a", "text \" \"", "end a"]);
}

#[test]
fn junk_after_root() {
    let e = error_of(b"<a/>\n<b/>");
    assert_eq!(e.kind(), ErrorKind::JunkAfterRoot);
    assert_eq!(e.offset(), 5);
}

#[test]
fn entities() {
    let events = whole(b"<a t=\"x &amp; &#x41;&#66;\">&lt;&gt;&quot;&apos;</a>");
    assert_eq!(events, ["start a t=\"x & AB\"", "text \"<>\\\"'\"", "end a"]);

    let e = error_of(b"<a>&nbsp;</a>");
    assert_eq!(e.kind(), ErrorKind::Lexical(LexicalError::UndefinedEntity));
    assert_eq!(e.offset(), 3);
    assert_eq!(error_of(b"<a>&#0;</a>").kind(), ErrorKind::Lexical(LexicalError::BadCharRef));
}

#[test]
fn lt_in_attribute_value() {
    let e = error_of(b"<a x=\"1<2\"/>");
    assert_eq!(e.kind(), ErrorKind::Lexical(LexicalError::LtInAttributeValue));
}

#[test]
fn quote_outside_attribute_value() {
    let xml = b"<a b=x'></a>";
    let e = error_of(xml);
    assert_eq!(e.kind(), ErrorKind::Lexical(LexicalError::MalformedTag));
    assert_eq!(e.offset(), 5);

    let chunks: Vec<&[u8]> = xml.chunks(1).collect();
    let (status, events) = record(&chunks);
    assert_eq!(status, Err(e));
    assert!(events.is_empty());
}

#[test]
fn invalid_utf8() {
    let e = error_of(b"<a>ok\xFF</a>");
    assert_eq!(e.kind(), ErrorKind::Lexical(LexicalError::InvalidUtf8));
}

#[test]
fn declaration_must_come_first() {
    let events = whole(b"<?xml version=\"1.0\"?><a/>");
    assert_eq!(events[0], "decl 1.0 None None");
    assert_eq!(error_of(b"\n<?xml version=\"1.0\"?><a/>").kind(), ErrorKind::MisplacedDeclaration);
    assert_eq!(error_of(b"<a/><?xml version=\"1.0\"?>").kind(), ErrorKind::MisplacedDeclaration);
    assert_eq!(
        error_of(b"<?xml version=\"1.0\" encoding=\"UTF-16\"?><a/>").kind(),
        ErrorKind::Lexical(LexicalError::UnsupportedEncoding)
    );
}

#[test]
fn doctype_only_in_prolog() {
    assert_eq!(whole(b"<!DOCTYPE a><a/>"), ["doctype a", "start a", "end a"]);
    assert_eq!(error_of(b"<a/><!DOCTYPE a>").kind(), ErrorKind::MisplacedDeclaration);
    assert_eq!(error_of(b"<!DOCTYPE a><!DOCTYPE a><a/>").kind(), ErrorKind::MisplacedDeclaration);
}

#[test]
fn doctype_subset_with_processing_instruction() {
    let xml = b"<!DOCTYPE a [<?pi don't?>]><a/>";
    assert_eq!(whole(xml), ["doctype a", "start a", "end a"]);
    assert_eq!(byte_by_byte(xml), ["doctype a", "start a", "end a"]);
}

#[test]
fn line_endings() {
    let events = byte_by_byte(b"<a>one\r\ntwo\rthree\n</a>");
    assert_eq!(events, ["start a", "text \"one\\ntwo\\nthree\\n\"", "end a"]);

    let e = error_of(b"<a>\r\n\r\n</b>");
    assert_eq!((e.line(), e.column(), e.offset()), (3, 1, 7));

    let (status, _) = record(&[b"<a>\r", b"\n</b>"]);
    let e = status.unwrap_err();
    assert_eq!((e.line(), e.column()), (2, 1));
}

#[test]
fn byte_order_mark() {
    let (status, events) = record(&[b"\xEF", b"\xBB", b"\xBF<a/>"]);
    assert_eq!(status, Ok(Status::Done));
    assert_eq!(events, ["start a", "end a"]);

    let e = error_of(b"\xEF\xBB\xBF<a></b>");
    assert_eq!((e.offset(), e.line(), e.column()), (6, 1, 4));
}

#[test]
fn handler_stop_aborts() {
    let mut parser = Parser::with_handler(Recorder { stop_at: Some("b"), ..Default::default() });
    assert_eq!(parser.feed(b"<a><b>text</b>"), Ok(Status::Aborted));
    assert_eq!(parser.state(), State::Aborted);
    assert_eq!(parser.feed(b"</a>"), Ok(Status::Aborted));
    assert_eq!(parser.finish(), Ok(Status::Aborted));
    assert_eq!(parser.error(), None);
    assert_eq!(parser.handler().events, ["start a", "start b"]);
}

#[test]
fn stop_on_empty_tag_skips_its_end() {
    let mut parser = Parser::with_handler(Recorder { stop_at: Some("b"), ..Default::default() });
    assert_eq!(parser.feed(b"<a><b/></a>"), Ok(Status::Aborted));
    assert_eq!(parser.handler().events, ["start a", "start b"]);
}

#[test]
fn failure_is_sticky() {
    let mut parser = Parser::with_handler(Recorder::default());
    let e = parser.feed(b"<a></b>").unwrap_err();
    assert_eq!(parser.state(), State::Failed);
    assert_eq!(parser.error(), Some(e));
    assert_eq!(parser.handler().events, ["start a"]);
    let held = parser.buffered();

    assert_eq!(parser.feed(b"<c/><d>text</d>"), Err(e));
    assert_eq!(parser.finish(), Err(e));
    assert_eq!(parser.handler().events, ["start a"]);
    assert_eq!(parser.buffered(), held);
}

#[test]
fn input_after_done_is_refused() {
    let mut parser = Parser::with_handler(Recorder::default());
    assert_eq!(parser.parse(b"<a/>", true), Ok(Status::Done));
    let end = parser.position();

    let e = parser.feed(b"<b/>").unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Finished);
    assert_eq!(e.position(), end);
    assert_eq!(parser.state(), State::Done);
    assert_eq!(parser.error(), None);
    assert_eq!(parser.parse(b"x", true).map_err(|e| e.kind()), Err(ErrorKind::Finished));

    assert_eq!(parser.feed(b""), Ok(Status::Done));
    assert_eq!(parser.finish(), Ok(Status::Done));
    assert_eq!(parser.handler().events, ["start a", "end a"]);
}

#[test]
fn parse_with_final_flag() {
    let mut parser = Parser::new();
    assert_eq!(parser.parse(b"<a>", false), Ok(Status::Ok));
    assert_eq!(parser.depth(), 1);
    assert_eq!(parser.state(), State::InElement);
    assert_eq!(parser.parse(b"</a>", true), Ok(Status::Done));
    assert_eq!(parser.depth(), 0);
}

#[test]
fn reset_starts_over() {
    let mut parser = Parser::with_handler(Recorder::default());
    parser.feed(b"<a></b>").unwrap_err();
    parser.reset();
    assert_eq!(parser.state(), State::Prolog);
    assert_eq!(parser.error(), None);
    assert_eq!(parser.position(), Position::START);
    assert_eq!(parser.parse(b"<c/>", true), Ok(Status::Done));
    assert_eq!(parser.handler().events, ["start c", "end c"]);
}

#[test]
fn incomplete_token_stays_buffered() {
    let mut parser = Parser::new();
    parser.feed(b"<root><chi").unwrap();
    assert_eq!(parser.buffered(), 4);
    assert_eq!(parser.position().offset, 6);
    parser.feed(b"ld/></root>").unwrap();
    assert_eq!(parser.buffered(), 0);
}

#[test]
fn closures_replace_each_other() {
    let first = Rc::new(RefCell::new(Vec::<String>::new()));
    let second = Rc::new(RefCell::new(Vec::<String>::new()));
    let mut parser = Parser::new();

    let (s, e) = (first.clone(), first.clone());
    parser.set_handlers(
        move |name, _| s.borrow_mut().push(format!("start {name}")),
        move |name| e.borrow_mut().push(format!("end {name}")),
    );
    parser.feed(b"<a>").unwrap();

    let (s, e) = (second.clone(), second.clone());
    parser.set_handlers(
        move |name, attrs| s.borrow_mut().push(format!("start {name} {}", attrs.len())),
        move |name| e.borrow_mut().push(format!("end {name}")),
    );
    parser.parse(b"<b x='1'/></a>", true).unwrap();

    assert_eq!(*first.borrow(), ["start a"]);
    assert_eq!(*second.borrow(), ["start b 1", "end b", "end a"]);
}

#[test]
fn closure_can_stop() {
    let mut parser = Parser::new();
    parser.set_start_handler(|name, _| if name == "stop" { Flow::Stop } else { Flow::Continue });
    parser.set_character_data_handler(|_| -> Flow { panic!("text after stop") });
    assert_eq!(parser.feed(b"<a><stop/>text</a>"), Ok(Status::Aborted));
}

#[test]
fn other_closures() {
    let seen = Rc::new(RefCell::new(Vec::<String>::new()));
    let mut parser = Parser::new();
    let log = seen.clone();
    parser.set_declaration_handler(move |decl| log.borrow_mut().push(format!("decl {}", decl.version)));
    let log = seen.clone();
    parser.set_doctype_handler(move |name| log.borrow_mut().push(format!("doctype {name}")));
    let log = seen.clone();
    parser.set_comment_handler(move |text| log.borrow_mut().push(format!("comment {text}")));
    let log = seen.clone();
    parser.set_processing_instruction_handler(move |target, data| log.borrow_mut().push(format!("pi {target} {data}")));
    let log = seen.clone();
    parser.set_cdata_handler(move |text| log.borrow_mut().push(format!("cdata {text}")));
    let log = seen.clone();
    parser.set_end_handler(move |name| log.borrow_mut().push(format!("end {name}")));

    let xml = b"<?xml version=\"1.1\"?><!DOCTYPE d><!--c--><d><?p q?><![CDATA[x]]></d>";
    assert_eq!(parser.parse(xml, true), Ok(Status::Done));
    assert_eq!(*seen.borrow(), ["decl 1.1", "doctype d", "comment c", "pi p q", "cdata x", "end d"]);
}

#[test]
fn buffer_limit() {
    let mut parser = Parser::with_options(Options::default().capacity(16).max_buffered(8));
    assert_eq!(parser.feed(b"<a>"), Ok(Status::Ok));
    let e = parser.feed(b"<!-- far too long").unwrap_err();
    assert_eq!(e.kind(), ErrorKind::BufferLimit);
    assert_eq!(e.offset(), 3);

    let mut parser = Parser::with_options(Options::default().max_buffered(8));
    for chunk in b"<a>short</a>".chunks(2) {
        parser.feed(chunk).unwrap();
    }
    assert_eq!(parser.finish(), Ok(Status::Done));
}

#[test]
fn reader_with_tiny_chunks() {
    let mut input = FULL;
    let mut parser = Parser::with_handler(Recorder::default());
    let mut chunk = [0u8; 3];
    assert_eq!(parse_reader(&mut parser, &mut input, &mut chunk), Ok(Status::Done));
    assert_eq!(parser.into_handler().events, whole(FULL));
}

#[test]
fn reader_errors() {
    struct Broken;

    impl embedded_io::ErrorType for Broken {
        type Error = embedded_io::ErrorKind;
    }

    impl embedded_io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> core::result::Result<usize, Self::Error> {
            Err(embedded_io::ErrorKind::BrokenPipe)
        }
    }

    let mut parser = Parser::new();
    assert_eq!(parse_reader(&mut parser, Broken, &mut [0u8; 8]), Err(Error::IoError(embedded_io::ErrorKind::BrokenPipe)));
    assert_eq!(parse_reader(&mut parser, &b"<a/>"[..], &mut []), Err(Error::IoError(embedded_io::ErrorKind::InvalidInput)));

    let mut input = &b"<a><b></a>"[..];
    let Err(Error::Parse(e)) = parse_reader(&mut Parser::new(), &mut input, &mut [0u8; 4]) else {
        panic!("expected a parse error");
    };
    assert_eq!(e.kind(), ErrorKind::TagMismatch);
}
