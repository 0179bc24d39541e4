//! Append-only XML buffer with minimal allocations

/// XML builder that appends to a reusable byte buffer
///
/// The owner drains the buffer into the ZIP entry whenever it grows past its
/// flush threshold, so a worksheet never sits fully in memory.
pub struct XmlWriter {
    buffer: Vec<u8>,
    flush_threshold: usize,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::with_capacity(8192)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        XmlWriter {
            buffer: Vec::with_capacity(capacity),
            flush_threshold: capacity / 2,
        }
    }

    /// True once the buffer should be drained
    #[inline]
    pub fn should_flush(&self) -> bool {
        self.buffer.len() >= self.flush_threshold
    }

    /// Write raw bytes directly
    #[inline]
    pub fn write_raw(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Write string data without escaping
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.write_raw(s.as_bytes());
    }

    /// Write the standard XML declaration
    pub fn declaration(&mut self) {
        self.write_raw(b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    }

    /// Write XML element start tag (left open for attributes)
    #[inline]
    pub fn start_element(&mut self, name: &str) {
        self.write_raw(b"<");
        self.write_str(name);
    }

    /// Write XML element end tag
    #[inline]
    pub fn end_element(&mut self, name: &str) {
        self.write_raw(b"</");
        self.write_str(name);
        self.write_raw(b">");
    }

    /// Write self-closing element without attributes
    #[inline]
    pub fn empty_element(&mut self, name: &str) {
        self.write_raw(b"<");
        self.write_str(name);
        self.write_raw(b"/>");
    }

    /// Write attribute
    #[inline]
    pub fn attribute(&mut self, name: &str, value: &str) {
        self.write_raw(b" ");
        self.write_str(name);
        self.write_raw(b"=\"");
        self.write_escaped_attribute(value);
        self.write_raw(b"\"");
    }

    /// Write attribute with integer value
    #[inline]
    pub fn attribute_int(&mut self, name: &str, value: u64) {
        self.write_raw(b" ");
        self.write_str(name);
        self.write_raw(b"=\"");
        self.write_str(itoa::Buffer::new().format(value));
        self.write_raw(b"\"");
    }

    /// Write attribute with floating point value
    #[inline]
    pub fn attribute_f64(&mut self, name: &str, value: f64) {
        self.write_raw(b" ");
        self.write_str(name);
        self.write_raw(b"=\"");
        self.write_str(&value.to_string());
        self.write_raw(b"\"");
    }

    /// Close start tag
    #[inline]
    pub fn close_start_tag(&mut self) {
        self.write_raw(b">");
    }

    /// Close start tag as a self-closing element
    #[inline]
    pub fn close_empty(&mut self) {
        self.write_raw(b"/>");
    }

    /// `<name>escaped text</name>`
    pub fn text_element(&mut self, name: &str, text: &str) {
        self.start_element(name);
        self.close_start_tag();
        self.write_escaped(text);
        self.end_element(name);
    }

    /// Write text content with XML escaping
    ///
    /// Characters XML 1.0 cannot carry (controls other than tab, LF and CR)
    /// become `_xHHHH_`. A literal `_` that would read as such an escape is
    /// itself written as `_x005F_`.
    pub fn write_escaped(&mut self, text: &str) {
        for (idx, ch) in text.char_indices() {
            match ch {
                '&' => self.write_raw(b"&amp;"),
                '<' => self.write_raw(b"&lt;"),
                '>' => self.write_raw(b"&gt;"),
                '"' => self.write_raw(b"&quot;"),
                '\'' => self.write_raw(b"&apos;"),
                '_' if is_ooxml_escape(&text[idx..]) => self.write_raw(b"_x005F_"),
                c if is_restricted_control(c) => {
                    self.write_str(&format!("_x{:04X}_", c as u32));
                }
                c => self.write_char(c),
            }
        }
    }

    /// Escape an attribute value; restricted control characters are dropped
    fn write_escaped_attribute(&mut self, value: &str) {
        for ch in value.chars() {
            match ch {
                '&' => self.write_raw(b"&amp;"),
                '<' => self.write_raw(b"&lt;"),
                '"' => self.write_raw(b"&quot;"),
                c if is_restricted_control(c) => continue,
                c => self.write_char(c),
            }
        }
    }

    #[inline]
    fn write_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.buffer
            .extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop buffered content, keeping the allocation
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

fn is_restricted_control(ch: char) -> bool {
    (ch as u32) < 0x20 && ch != '\t' && ch != '\n' && ch != '\r'
}

/// True when `text` starts with `_xHHHH_`
fn is_ooxml_escape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 7
        && bytes[0] == b'_'
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}
