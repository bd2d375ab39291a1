//! Indented text output shared by the SQL and C# generators.

use crate::util::trimmed_lines;

/// Line-oriented writer that tracks an indentation level.
///
/// ```
/// use store_schema_compiler::codegen::CodeWriter;
///
/// let mut w = CodeWriter::new();
/// w.line("BEGIN").indent().line("RETURN 1").dedent().line("END");
/// assert_eq!(w.finish(), "BEGIN\n    RETURN 1\nEND\n");
/// ```
#[derive(Debug, Clone)]
pub struct CodeWriter {
    indent_level: usize,
    indent: &'static str,
    buffer: String,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    /// Writer indenting with four spaces
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent: "    ",
            buffer: String::new(),
        }
    }

    /// Write one line at the current indentation. Empty lines get no
    /// indentation.
    pub fn line(&mut self, s: &str) -> &mut Self {
        if !s.is_empty() {
            for _ in 0..self.indent_level {
                self.buffer.push_str(self.indent);
            }
            self.buffer.push_str(s);
        }
        self.buffer.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self
    }

    /// Write free-form text from a schema file, re-indented: every line
    /// trimmed, blank lines at either end dropped
    pub fn statements(&mut self, text: &str) -> &mut Self {
        for line in trimmed_lines(text) {
            self.line(line);
        }
        self
    }

    /// Write each line of `text` behind `prefix`, trimmed the same way as
    /// [`CodeWriter::statements`]. Used for `///` doc comments.
    pub fn prefixed(&mut self, prefix: &str, text: &str) -> &mut Self {
        for line in trimmed_lines(text) {
            if line.is_empty() {
                self.line(prefix.trim_end());
            } else {
                self.line(&format!("{}{}", prefix, line));
            }
        }
        self
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}
