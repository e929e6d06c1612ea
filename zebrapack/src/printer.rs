//! Output for emitted source.
//!
//! [`CodeWriter`] is an indentation-aware scratch buffer a generator renders
//! one identity into. [`Printer`] is the output sink the finished text goes
//! to; it latches the first write failure and refuses all later writes.

use std::io::Write;

use crate::config::IndentStyle;
use crate::error::{GenError, GenResult};

// =============================================================================
// CodeWriter
// =============================================================================

/// Indentation-aware line buffer.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    buf: String,
    depth: usize,
    indent: IndentStyle,
}

impl CodeWriter {
    /// Create an empty writer.
    pub fn new(indent: IndentStyle) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            indent,
        }
    }

    /// Write one line at the current depth.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            self.buf.push_str(&self.indent.indent(self.depth));
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Write an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Write a `//` comment line.
    pub fn comment(&mut self, text: impl AsRef<str>) {
        self.line(format!("// {}", text.as_ref()));
    }

    /// Write a `///` doc comment line.
    pub fn doc(&mut self, text: impl AsRef<str>) {
        self.line(format!("/// {}", text.as_ref()));
    }

    /// Write `header {` and indent.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.line(format!("{} {{", header.as_ref()));
        self.depth += 1;
    }

    /// Dedent and write `}`.
    pub fn close(&mut self) {
        self.close_with("}");
    }

    /// Dedent, write `text` (for example `} else {`) and indent again.
    pub fn reopen(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
        self.depth += 1;
    }

    /// Dedent and write `text`.
    pub fn close_with(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    /// Text written so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consume the writer, returning its text.
    pub fn finish(self) -> String {
        self.buf
    }
}

// =============================================================================
// Printer
// =============================================================================

/// Output sink with a sticky failure state.
///
/// After the first failed write every operation is a no-op that returns the
/// original error.
#[derive(Debug)]
pub struct Printer<W: Write> {
    sink: W,
    err: Option<GenError>,
    written: usize,
}

impl<W: Write> Printer<W> {
    /// Wrap a writer.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            err: None,
            written: 0,
        }
    }

    /// The latched error, if any.
    pub fn ok(&self) -> GenResult<()> {
        match &self.err {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Write text to the sink.
    pub fn print(&mut self, text: &str) -> GenResult<()> {
        self.ok()?;
        if let Err(err) = self.sink.write_all(text.as_bytes()) {
            let err = GenError::sink(&err);
            self.err = Some(err.clone());
            return Err(err);
        }
        self.written += text.len();
        Ok(())
    }

    /// Flush the sink.
    pub fn flush(&mut self) -> GenResult<()> {
        self.ok()?;
        if let Err(err) = self.sink.flush() {
            let err = GenError::sink(&err);
            self.err = Some(err.clone());
            return Err(err);
        }
        Ok(())
    }

    /// Bytes successfully written.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Unwrap the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}
