use std::fs;
use std::io::{self, BufReader};
use std::path::Path;

use embedded_io::ErrorType;
use log::info;

/// Standard input or a file, readable through `embedded_io`.
pub struct StdReader {
    inner: Box<dyn io::Read>,
}

impl StdReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        info!("Opening {}", path.display());
        let file = fs::File::open(path)?;
        Ok(StdReader {
            inner: Box::new(BufReader::new(file)),
        })
    }

    pub fn stdin() -> Self {
        info!("Reading standard input");
        StdReader {
            inner: Box::new(io::stdin().lock()),
        }
    }
}

impl ErrorType for StdReader {
    type Error = io::Error;
}

impl embedded_io::Read for StdReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                result => return result,
            }
        }
    }
}
