//! Indentation-aware source buffer.

const INDENT: &str = "    ";

/// Accumulates generated Rust source line by line.
///
/// [`SourceWriter::finish`] normalises blank lines so callers can emit
/// separators freely.
#[derive(Debug, Default)]
pub struct SourceWriter {
    buf: String,
    depth: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Write `text` as `///` doc lines, one per source line.
    pub fn doc(&mut self, text: &str) {
        for l in text.lines() {
            let l = l.trim_end();
            if l.is_empty() {
                self.line("///");
            } else {
                self.line(format!("/// {}", l));
            }
        }
    }

    /// Write `open`, run `body` one level deeper, then write `close`.
    pub fn block(&mut self, open: impl AsRef<str>, close: &str, body: impl FnOnce(&mut Self)) {
        self.line(open);
        self.depth += 1;
        body(self);
        self.depth -= 1;
        self.line(close);
    }

    /// Collapse blank runs, drop blanks after `{` and before `}`, end with one newline.
    pub fn finish(self) -> String {
        let mut out: Vec<&str> = Vec::new();
        for l in self.buf.lines() {
            let blank = l.trim().is_empty();
            let prev_blank = out.last().is_none_or(|p| p.trim().is_empty());
            let prev_opens = out.last().is_some_and(|p| p.ends_with('{'));
            if blank && (prev_blank || prev_opens) {
                continue;
            }
            if l.trim_start().starts_with('}') && out.last().is_some_and(|p| p.trim().is_empty()) {
                out.pop();
            }
            out.push(if blank { "" } else { l });
        }
        while out.last().is_some_and(|p| p.is_empty()) {
            out.pop();
        }

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_indents() {
        let mut w = SourceWriter::new();
        w.block("impl Foo {", "}", |w| {
            w.line("pub const A: u8 = 1;");
        });
        assert_eq!(w.finish(), "impl Foo {\n    pub const A: u8 = 1;\n}\n");
    }

    #[test]
    fn test_finish_normalises_blanks() {
        let mut w = SourceWriter::new();
        w.blank();
        w.line("use a::B;");
        w.blank();
        w.blank();
        w.block("struct S {", "}", |w| {
            w.blank();
            w.line("x: u8,");
            w.blank();
        });
        w.blank();
        assert_eq!(w.finish(), "use a::B;\n\nstruct S {\n    x: u8,\n}\n");
    }

    #[test]
    fn test_doc_lines() {
        let mut w = SourceWriter::new();
        w.doc("first\n\nsecond  ");
        assert_eq!(w.finish(), "/// first\n///\n/// second\n");
    }
}
