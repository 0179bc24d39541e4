//! Shared strings table (xl/sharedStrings.xml)

use super::xml_writer::XmlWriter;
use indexmap::IndexSet;

/// Deduplicating string table; cells refer to entries by index
#[derive(Debug, Default)]
pub struct SharedStrings {
    strings: IndexSet<String>,
    references: u64,
}

impl SharedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `s`, adding it on first use
    pub fn add_string(&mut self, s: &str) -> u32 {
        self.references += 1;
        if let Some(idx) = self.strings.get_index_of(s) {
            return idx as u32;
        }
        self.strings.insert_full(s.to_string()).0 as u32
    }

    /// Number of distinct strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn write_xml(&self, xml: &mut XmlWriter) {
        xml.declaration();
        xml.start_element("sst");
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        );
        xml.attribute_int("count", self.references);
        xml.attribute_int("uniqueCount", self.strings.len() as u64);
        xml.close_start_tag();

        for s in &self.strings {
            xml.write_raw(b"<si><t");
            if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
                xml.attribute("xml:space", "preserve");
            }
            xml.close_start_tag();
            xml.write_escaped(s);
            xml.write_raw(b"</t></si>");
        }

        xml.end_element("sst");
    }
}
