//! Indented XML writer for the golden test artifacts.
use crate::lex::Token;

const DEFAULT_INDENT: usize = 2;

/// Builds an XML document line by line, tracking open tags on a
/// stack. Indentation is two spaces per open tag, or none for the
/// flat token-stream artifact.
pub struct XmlBuilder {
    buf: String,
    stack: Vec<&'static str>,
    indent: usize,
}

impl XmlBuilder {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            stack: Vec::new(),
            indent: DEFAULT_INDENT,
        }
    }

    /// Builder without indentation, used for the token stream dump.
    pub fn flat() -> Self {
        Self {
            indent: 0,
            ..Self::new()
        }
    }

    /// Transfer ownership of the built document.
    pub fn into_string(self) -> String {
        debug_assert!(self.stack.is_empty(), "unclosed tag");
        self.buf
    }

    /// Write `<name>` on its own line and push it onto the tag stack.
    pub fn open(&mut self, name: &'static str) {
        self.write_indent();
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push_str(">\n");
        self.stack.push(name);
    }

    /// Pop the innermost tag and write its `</name>` line.
    pub fn close(&mut self) {
        let name = self.stack.pop().unwrap_or_default();
        self.write_indent();
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push_str(">\n");
    }

    /// Write a single-line `<tag> value </tag>` node. The value text
    /// has its XML entities escaped.
    pub fn write_node(&mut self, tag: &str, value: &str) {
        self.write_indent();
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push_str("> ");
        escape_into(value, &mut self.buf);
        self.buf.push_str(" </");
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
    }

    pub fn write_token(&mut self, token: &Token) {
        self.write_node(token.xml_tag(), &token.value);
    }

    pub fn write_keyword(&mut self, value: &str) {
        self.write_node("keyword", value);
    }

    pub fn write_symbol(&mut self, value: &str) {
        self.write_node("symbol", value);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.stack.len() * self.indent {
            self.buf.push(' ');
        }
    }
}

impl Default for XmlBuilder {
    fn default() -> Self {
        XmlBuilder::new()
    }
}

/// Escape the four entities `< > " &` in a single pass.
fn escape_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
}
