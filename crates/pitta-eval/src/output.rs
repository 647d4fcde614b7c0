//! Print and input sinks.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Where `print` writes, where `input()` reads, and where diagnostics go.
pub trait Output {
    /// Write one line of program output.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Read one line of input without its line terminator. `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Write one diagnostic line.
    fn write_error(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stderr(), "{line}")
    }
}

/// Process stdout, stdin and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdOutput;

impl Output for StdOutput {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{line}")
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if io::stdin().lock().read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_newline(buf)))
    }
}

/// In-memory sink. Clones share the same buffers, so a caller can keep one
/// handle while the interpreter owns another.
#[derive(Debug, Default, Clone)]
pub struct CaptureOutput {
    lines: Rc<RefCell<Vec<String>>>,
    errors: Rc<RefCell<Vec<String>>>,
    input: Rc<RefCell<VecDeque<String>>>,
}

impl CaptureOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose `read_line` serves `input` in order.
    pub fn with_input<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let capture = Self::new();
        capture
            .input
            .borrow_mut()
            .extend(input.into_iter().map(Into::into));
        capture
    }

    pub fn push_input(&self, line: impl Into<String>) {
        self.input.borrow_mut().push_back(line.into());
    }

    /// Printed lines so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Printed text, one `\n` after each line.
    pub fn text(&self) -> String {
        self.lines.borrow().iter().map(|l| format!("{l}\n")).collect()
    }

    /// Diagnostic lines so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
        self.errors.borrow_mut().clear();
    }
}

impl Output for CaptureOutput {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.borrow_mut().push(line.to_string());
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.input.borrow_mut().pop_front().map(strip_newline))
    }

    fn write_error(&mut self, line: &str) -> io::Result<()> {
        self.errors.borrow_mut().push(line.to_string());
        Ok(())
    }
}

fn strip_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
