//! Style registry producing xl/styles.xml
//!
//! Fonts, fills, borders, number formats and the cell formats combining them
//! are deduplicated as they are registered; the stylesheet is written once
//! when the workbook closes.

use super::xml_writer::XmlWriter;
use crate::style::{Borders, Fill, FontStyle, HorizontalAlignment, NumberFormat, StyleSpec};
use indexmap::{IndexMap, IndexSet};

/// First numFmtId available for custom format codes
const FIRST_CUSTOM_FORMAT_ID: u32 = 164;
/// Fills 0 and 1 are reserved (none, gray125)
const RESERVED_FILLS: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
struct CellFormat {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Option<HorizontalAlignment>,
}

/// Registry of every cell format used by a workbook
#[derive(Debug)]
pub struct StyleRegistry {
    custom_formats: IndexMap<String, u32>,
    fonts: IndexSet<FontStyle>,
    fills: IndexSet<Fill>,
    borders: IndexSet<Borders>,
    cell_formats: IndexSet<CellFormat>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry {
    pub fn new() -> Self {
        let mut fonts = IndexSet::new();
        fonts.insert(FontStyle::default());
        let mut borders = IndexSet::new();
        borders.insert(Borders::default());
        let mut cell_formats = IndexSet::new();
        cell_formats.insert(CellFormat::default());

        StyleRegistry {
            custom_formats: IndexMap::new(),
            fonts,
            fills: IndexSet::new(),
            borders,
            cell_formats,
        }
    }

    /// Cell format index for a style and optional number format
    ///
    /// Returns 0, the default format, when neither sets anything.
    pub fn register(&mut self, style: &StyleSpec, format: Option<&NumberFormat>) -> u32 {
        let num_fmt_id = format.map(|f| self.number_format_id(f)).unwrap_or(0);

        let font_id = match &style.font {
            Some(font) => self.fonts.insert_full(font.clone()).0 as u32,
            None => 0,
        };
        let fill_id = match &style.fill {
            Some(fill) => self.fills.insert_full(fill.clone()).0 as u32 + RESERVED_FILLS,
            None => 0,
        };
        let border_id = match &style.borders {
            Some(borders) => self.borders.insert_full(borders.clone()).0 as u32,
            None => 0,
        };

        let cell_format = CellFormat {
            num_fmt_id,
            font_id,
            fill_id,
            border_id,
            alignment: style.alignment,
        };
        self.cell_formats.insert_full(cell_format).0 as u32
    }

    fn number_format_id(&mut self, format: &NumberFormat) -> u32 {
        if let Some(id) = format.builtin_id() {
            return id;
        }
        let next_id = FIRST_CUSTOM_FORMAT_ID + self.custom_formats.len() as u32;
        *self
            .custom_formats
            .entry(format.code().to_string())
            .or_insert(next_id)
    }

    /// Number of registered cell formats, default included
    pub fn len(&self) -> usize {
        self.cell_formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_formats.is_empty()
    }

    pub fn write_xml(&self, xml: &mut XmlWriter) {
        xml.declaration();
        xml.start_element("styleSheet");
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        );
        xml.close_start_tag();

        if !self.custom_formats.is_empty() {
            xml.start_element("numFmts");
            xml.attribute_int("count", self.custom_formats.len() as u64);
            xml.close_start_tag();
            for (code, id) in &self.custom_formats {
                xml.start_element("numFmt");
                xml.attribute_int("numFmtId", *id as u64);
                xml.attribute("formatCode", code);
                xml.close_empty();
            }
            xml.end_element("numFmts");
        }

        self.write_fonts(xml);
        self.write_fills(xml);
        self.write_borders(xml);

        xml.write_raw(b"<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>");

        xml.start_element("cellXfs");
        xml.attribute_int("count", self.cell_formats.len() as u64);
        xml.close_start_tag();
        for format in &self.cell_formats {
            xml.start_element("xf");
            xml.attribute_int("numFmtId", format.num_fmt_id as u64);
            xml.attribute_int("fontId", format.font_id as u64);
            xml.attribute_int("fillId", format.fill_id as u64);
            xml.attribute_int("borderId", format.border_id as u64);
            xml.attribute_int("xfId", 0);
            if format.num_fmt_id != 0 {
                xml.attribute("applyNumberFormat", "1");
            }
            if format.font_id != 0 {
                xml.attribute("applyFont", "1");
            }
            if format.fill_id != 0 {
                xml.attribute("applyFill", "1");
            }
            if format.border_id != 0 {
                xml.attribute("applyBorder", "1");
            }
            match format.alignment {
                Some(alignment) => {
                    xml.attribute("applyAlignment", "1");
                    xml.close_start_tag();
                    xml.start_element("alignment");
                    xml.attribute("horizontal", alignment.as_str());
                    xml.close_empty();
                    xml.end_element("xf");
                }
                None => xml.close_empty(),
            }
        }
        xml.end_element("cellXfs");

        xml.write_raw(b"<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>");
        xml.end_element("styleSheet");
    }

    fn write_fonts(&self, xml: &mut XmlWriter) {
        xml.start_element("fonts");
        xml.attribute_int("count", self.fonts.len() as u64);
        xml.close_start_tag();
        for font in &self.fonts {
            xml.write_raw(b"<font>");
            if font.bold {
                xml.empty_element("b");
            }
            if font.italic {
                xml.empty_element("i");
            }
            xml.write_raw(b"<sz val=\"11\"/>");
            if let Some(color) = &font.color {
                xml.start_element("color");
                xml.attribute("rgb", color.argb());
                xml.close_empty();
            }
            xml.write_raw(b"<name val=\"Calibri\"/><family val=\"2\"/></font>");
        }
        xml.end_element("fonts");
    }

    fn write_fills(&self, xml: &mut XmlWriter) {
        xml.start_element("fills");
        xml.attribute_int("count", self.fills.len() as u64 + RESERVED_FILLS as u64);
        xml.close_start_tag();
        xml.write_raw(b"<fill><patternFill patternType=\"none\"/></fill>");
        xml.write_raw(b"<fill><patternFill patternType=\"gray125\"/></fill>");
        for fill in &self.fills {
            xml.write_raw(b"<fill>");
            match fill {
                Fill::Solid { color } => {
                    xml.write_raw(b"<patternFill patternType=\"solid\"><fgColor");
                    xml.attribute("rgb", color.argb());
                    xml.write_raw(b"/><bgColor indexed=\"64\"/></patternFill>");
                }
                Fill::Gradient {
                    rotation,
                    start,
                    end,
                } => {
                    xml.start_element("gradientFill");
                    xml.attribute_f64("degree", *rotation);
                    xml.close_start_tag();
                    xml.write_raw(b"<stop position=\"0\"><color");
                    xml.attribute("rgb", start.argb());
                    xml.write_raw(b"/></stop><stop position=\"1\"><color");
                    xml.attribute("rgb", end.argb());
                    xml.write_raw(b"/></stop></gradientFill>");
                }
            }
            xml.write_raw(b"</fill>");
        }
        xml.end_element("fills");
    }

    fn write_borders(&self, xml: &mut XmlWriter) {
        xml.start_element("borders");
        xml.attribute_int("count", self.borders.len() as u64);
        xml.close_start_tag();
        for borders in &self.borders {
            xml.write_raw(b"<border>");
            for (side, style) in [
                ("left", borders.left),
                ("right", borders.right),
                ("top", borders.top),
                ("bottom", borders.bottom),
            ] {
                match style {
                    Some(style) => {
                        xml.start_element(side);
                        xml.attribute("style", style.as_str());
                        xml.write_raw(b"><color auto=\"1\"/>");
                        xml.end_element(side);
                    }
                    None => xml.empty_element(side),
                }
            }
            xml.write_raw(b"<diagonal/></border>");
        }
        xml.end_element("borders");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{BorderStyle, Color};

    #[test]
    fn test_default_style_is_zero() {
        let mut registry = StyleRegistry::new();
        assert_eq!(registry.register(&StyleSpec::default(), None), 0);
        assert_eq!(registry.register(&StyleSpec::default(), Some(&NumberFormat::General)), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registration_deduplicates() {
        let mut registry = StyleRegistry::new();
        let bold = StyleSpec::new().bold();

        let a = registry.register(&bold, None);
        let b = registry.register(&bold, None);
        let c = registry.register(&bold, Some(&NumberFormat::Numeric));
        let d = registry.register(&StyleSpec::default(), Some(&NumberFormat::Date));
        let e = registry.register(&StyleSpec::default(), Some(&NumberFormat::Date));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(d, e);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_stylesheet_xml() {
        let mut registry = StyleRegistry::new();
        let style = StyleSpec::new()
            .bold()
            .align(HorizontalAlignment::Right)
            .border_top(BorderStyle::Thin)
            .fill(Fill::Gradient {
                rotation: 90.0,
                start: Color::new("A0A0A0").unwrap(),
                end: Color::new("FFFFFF").unwrap(),
            });
        registry.register(&style, Some(&NumberFormat::Date));

        let mut xml = XmlWriter::new();
        registry.write_xml(&mut xml);
        let out = String::from_utf8(xml.into_bytes()).unwrap();

        assert!(out.contains("<numFmt numFmtId=\"164\" formatCode=\"yyyy-mm-dd\"/>"));
        assert!(out.contains("<fills count=\"3\">"));
        assert!(out.contains("<gradientFill degree=\"90\">"));
        assert!(out.contains("<color rgb=\"FFA0A0A0\"/>"));
        assert!(out.contains("<top style=\"thin\"><color auto=\"1\"/></top>"));
        assert!(out.contains("<alignment horizontal=\"right\"/>"));
        assert!(out.contains("<cellXfs count=\"2\">"));
    }
}
