//! Destinations of streamed log chunks

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, error};

use crate::errors::CasperError;
use crate::joblog::frame::strip_ansi;

/// Receives log text as it arrives
pub trait LogSink {
    /// Called once per decoded chunk, in arrival order
    fn on_chunk(&mut self, chunk: &str) -> Result<(), CasperError>;

    /// Called with the message of a server-side error frame
    fn on_error(&mut self, message: &str);
}

/// Writes chunks to an output stream and, optionally, a capture file.
///
/// Both are flushed after every chunk so an interrupted stream leaves a
/// usable partial capture.
pub struct TeeSink<W: Write> {
    out: W,
    capture: Option<File>,
    strip_ansi: bool,
}

impl TeeSink<io::Stdout> {
    /// Terminal output, with an optional capture file created (or
    /// truncated) at `capture_path`
    pub fn stdout(capture_path: Option<&Path>, strip_ansi: bool) -> Result<Self, CasperError> {
        let capture = match capture_path {
            Some(path) => {
                debug!("Capturing job log to {}", path.display());
                Some(File::create(path)?)
            }
            None => None,
        };
        Ok(Self::new(io::stdout(), capture, strip_ansi))
    }
}

impl<W: Write> TeeSink<W> {
    pub fn new(out: W, capture: Option<File>, strip_ansi: bool) -> Self {
        Self {
            out,
            capture,
            strip_ansi,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LogSink for TeeSink<W> {
    fn on_chunk(&mut self, chunk: &str) -> Result<(), CasperError> {
        let text = if self.strip_ansi {
            strip_ansi(chunk)
        } else {
            Cow::Borrowed(chunk)
        };

        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        if let Some(capture) = self.capture.as_mut() {
            capture.write_all(text.as_bytes())?;
            capture.flush()?;
        }
        Ok(())
    }

    fn on_error(&mut self, message: &str) {
        error!("Job log error: {}", message);
    }
}
