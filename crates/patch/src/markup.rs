//! Append-only markup writer shared by commands, head elements and components.
//!
//! The buffer only knows about element syntax; it never validates nesting.
//! Attribute values are escaped, text passed to [`MarkupBuffer::append`] is
//! written verbatim.

use memchr::memmem;
use std::borrow::Cow;
use std::fmt;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
/// Replacement for a literal `]]>` inside a CDATA section: end the section
/// after `]]` and reopen it before `>`.
const CDATA_SPLIT: &str = "]]]]><![CDATA[>";

#[derive(Clone, Debug, Default)]
pub struct MarkupBuffer {
    out: String,
}

impl MarkupBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
        }
    }

    /// Writes `<tag` and leaves the start tag open for attributes.
    pub fn element_start(&mut self, tag: &str) {
        self.out.push('<');
        self.out.push_str(tag);
    }

    /// Writes ` name="value"`; `None` values are skipped entirely.
    pub fn append_attribute(&mut self, name: &str, value: Option<&str>) {
        let Some(value) = value else {
            return;
        };
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(&escape_attribute(value));
        self.out.push('"');
    }

    pub fn close_tag(&mut self) {
        self.out.push('>');
    }

    /// Closes an open start tag as an empty element (`/>`).
    pub fn element_end_empty(&mut self) {
        self.out.push_str("/>");
    }

    pub fn element_end(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    pub fn append(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn append_char(&mut self, ch: char) {
        self.out.push(ch);
    }

    pub fn append_escaped(&mut self, text: &str) {
        self.out.push_str(&escape_text(text));
    }

    pub fn begin_cdata(&mut self) {
        self.out.push_str(CDATA_OPEN);
    }

    pub fn end_cdata(&mut self) {
        self.out.push_str(CDATA_CLOSE);
    }

    /// Appends text that sits inside an open CDATA section.
    pub fn append_cdata_text(&mut self, text: &str) {
        self.out.push_str(&escape_cdata(text));
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl fmt::Display for MarkupBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.out)
    }
}

#[inline]
fn needs_attribute_escape(byte: u8) -> bool {
    matches!(byte, b'&' | b'<' | b'>' | b'"' | b'\'')
}

pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.bytes().any(needs_attribute_escape) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

pub fn escape_text(text: &str) -> Cow<'_, str> {
    if memchr::memchr3(b'&', b'<', b'>', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Splits every `]]>` so `text` cannot terminate the enclosing CDATA section.
pub fn escape_cdata(text: &str) -> Cow<'_, str> {
    let finder = memmem::Finder::new(CDATA_CLOSE);
    let mut hits = finder.find_iter(text.as_bytes()).peekable();
    if hits.peek().is_none() {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for pos in hits {
        out.push_str(&text[last..pos]);
        out.push_str(CDATA_SPLIT);
        last = pos + CDATA_CLOSE.len();
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_are_escaped_and_none_is_skipped() {
        let mut buf = MarkupBuffer::new();
        buf.element_start("replace");
        buf.append_attribute("select", Some("a[name=\"x\"] > b"));
        buf.append_attribute("name", None);
        buf.element_end_empty();
        assert_eq!(
            buf.as_str(),
            "<replace select=\"a[name=&quot;x&quot;] &gt; b\"/>"
        );
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape_text("hello"), Cow::Borrowed(_)));
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn cdata_terminator_is_split() {
        assert_eq!(escape_cdata("x]]>y"), "x]]]]><![CDATA[>y");
        assert_eq!(escape_cdata("a]]>b]]>"), "a]]]]><![CDATA[>b]]]]><![CDATA[>");
        assert!(matches!(escape_cdata("if (a[b[0]]) {}"), Cow::Borrowed(_)));
    }
}
