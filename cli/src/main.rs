use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use argh::FromArgs;
use log::{debug, error, info};
use push_xml::{Attributes, Flow, Handler, Parser, Status, XmlDecl, parse_reader};

use crate::std_io::StdReader;

mod std_io;

#[derive(FromArgs)]
/// Stream XML documents through the parser and print their elements
struct Args {
    /// bytes handed to the parser per call
    #[argh(option, short = 'c', default = "4096")]
    chunk_size: usize,

    /// also print text, CDATA, comments and processing instructions
    #[argh(switch, short = 'a')]
    all: bool,

    /// print nothing but errors
    #[argh(switch, short = 'q')]
    quiet: bool,

    /// files to parse, standard input when none are given
    #[argh(positional)]
    files: Vec<String>,
}

/// Prints one line per event. Stops the parse once the output is gone.
struct Printer<W> {
    out: W,
    all: bool,
    quiet: bool,
    elements: usize,
    failed: Option<io::Error>,
}

impl<W: Write> Printer<W> {
    fn new(out: W, args: &Args) -> Self {
        Printer {
            out,
            all: args.all,
            quiet: args.quiet,
            elements: 0,
            failed: None,
        }
    }

    fn emit(&mut self, line: fmt::Arguments<'_>) -> Flow {
        if self.quiet {
            return Flow::Continue;
        }
        match writeln!(self.out, "{line}") {
            Ok(()) => Flow::Continue,
            Err(e) => {
                self.failed = Some(e);
                Flow::Stop
            }
        }
    }

    fn emit_extra(&mut self, line: fmt::Arguments<'_>) -> Flow {
        if !self.all {
            return Flow::Continue;
        }
        self.emit(line)
    }
}

impl<W: Write> Handler for Printer<W> {
    fn start_element(&mut self, name: &str, _attrs: &Attributes<'_>) -> Flow {
        self.elements += 1;
        self.emit(format_args!("START: {name}"))
    }

    fn end_element(&mut self, name: &str) -> Flow {
        self.emit(format_args!("END: {name}"))
    }

    fn characters(&mut self, text: &str) -> Flow {
        self.emit_extra(format_args!("TEXT: {text:?}"))
    }

    fn cdata(&mut self, text: &str) -> Flow {
        self.emit_extra(format_args!("CDATA: {text:?}"))
    }

    fn comment(&mut self, text: &str) -> Flow {
        self.emit_extra(format_args!("COMMENT: {text:?}"))
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Flow {
        self.emit_extra(format_args!("PI: {target} {data:?}"))
    }

    fn declaration(&mut self, decl: &XmlDecl<'_>) -> Flow {
        self.emit_extra(format_args!("XML: version {}", decl.version))
    }

    fn doctype(&mut self, name: &str) -> Flow {
        self.emit_extra(format_args!("DOCTYPE: {name}"))
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    if args.chunk_size == 0 {
        error!("--chunk-size must be at least 1");
        return ExitCode::FAILURE;
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut ok = true;

    if args.files.is_empty() {
        ok &= run("<stdin>", StdReader::stdin(), &args, &mut out);
    }
    for path in &args.files {
        match StdReader::open(Path::new(path)) {
            Ok(reader) => ok &= run(path, reader, &args, &mut out),
            Err(e) => {
                eprintln!("{path}: {e}");
                ok = false;
            }
        }
    }

    if let Err(e) = out.flush() {
        eprintln!("writing output failed: {e}");
        ok = false;
    }
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Parses one document, returns whether it was well-formed and fully printed.
fn run(name: &str, reader: StdReader, args: &Args, out: &mut impl Write) -> bool {
    debug!("{name}: chunks of {} bytes", args.chunk_size);
    let started = Instant::now();
    let mut parser = Parser::with_handler(Printer::new(out, args));
    let mut chunk = vec![0u8; args.chunk_size];
    let result = parse_reader(&mut parser, reader, &mut chunk);
    let printer = parser.into_handler();

    match result {
        Ok(Status::Aborted) => {
            if let Some(e) = printer.failed {
                eprintln!("{name}: writing output failed: {e}");
            }
            false
        }
        Ok(_) => {
            info!(
                "{name}: well-formed, {} elements in {:?}",
                printer.elements,
                started.elapsed()
            );
            true
        }
        Err(e) => {
            eprintln!("{name}: {e}");
            false
        }
    }
}
