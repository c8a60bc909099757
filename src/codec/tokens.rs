use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::error::{Result, SenderoError};

/// Whitespace-separated token reader over a buffered stream.
///
/// Line boundaries carry no meaning for parsing; they are tracked only so
/// parse errors can point at the offending line.
pub struct TokenReader<'a> {
    input: &'a mut dyn BufRead,
    line: String,
    cursor: usize,
    line_no: usize,
    eof: bool,
}

impl<'a> TokenReader<'a> {
    /// Wraps `input`.
    pub fn new(input: &'a mut dyn BufRead) -> Self {
        Self {
            input,
            line: String::new(),
            cursor: 0,
            line_no: 0,
            eof: false,
        }
    }

    /// 1-based number of the line currently being read (0 before any read).
    pub fn line(&self) -> usize {
        self.line_no
    }

    fn advance(&mut self) -> Result<Option<(usize, usize)>> {
        loop {
            let rest = &self.line[self.cursor..];
            let start = self.cursor + (rest.len() - rest.trim_start().len());
            if start < self.line.len() {
                let tail = &self.line[start..];
                let len = tail.find(char::is_whitespace).unwrap_or(tail.len());
                self.cursor = start + len;
                return Ok(Some((start, start + len)));
            }
            if self.eof {
                return Ok(None);
            }
            self.line.clear();
            self.cursor = 0;
            if self.input.read_line(&mut self.line)? == 0 {
                self.eof = true;
                return Ok(None);
            }
            self.line_no += 1;
        }
    }

    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<&str>> {
        Ok(self.advance()?.map(|(start, end)| &self.line[start..end]))
    }

    /// Parses the next token as `T`. `what` names the field in errors.
    pub fn read<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let Some((start, end)) = self.advance()? else {
            return Err(self.error(format!("unexpected end of input, expected {what}")));
        };
        let token = &self.line[start..end];
        token.parse::<T>().map_err(|_| SenderoError::Parse {
            line: self.line_no,
            message: format!("expected {what}, found `{token}`"),
        })
    }

    /// Parses the next token as a finite or infinite `f64`.
    pub fn read_f64(&mut self, what: &str) -> Result<f64> {
        let value: f64 = self.read(what)?;
        if value.is_nan() {
            return Err(self.error(format!("expected {what}, found NaN")));
        }
        Ok(value)
    }

    /// Builds a parse error positioned at the current line.
    pub fn error(&self, message: impl Into<String>) -> SenderoError {
        SenderoError::Parse {
            line: self.line_no,
            message: message.into(),
        }
    }
}

/// Writes space-separated tokens, one record per line.
pub struct TokenWriter<'a> {
    out: &'a mut dyn Write,
    line_start: bool,
}

impl<'a> TokenWriter<'a> {
    /// Wraps `out`.
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self {
            out,
            line_start: true,
        }
    }

    /// Writes one token, separated from the previous one by a space.
    pub fn write<T: Display>(&mut self, token: T) -> Result<()> {
        if !self.line_start {
            self.out.write_all(b" ")?;
        }
        write!(self.out, "{token}")?;
        self.line_start = false;
        Ok(())
    }

    /// Terminates the current record.
    pub fn end_line(&mut self) -> Result<()> {
        self.out.write_all(b"\n")?;
        self.line_start = true;
        Ok(())
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
