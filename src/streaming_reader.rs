//! Streaming reader for XLSX files
//!
//! **Memory Usage:**
//! - Shared Strings Table (SST): loaded fully at open
//! - Worksheet XML: loaded from the ZIP when its rows are requested
//! - Total memory ≈ SST + uncompressed XML of one sheet
//!
//! Cells decode to typed values: numbers, shared and inline strings,
//! booleans, and formulas as their literal text. Formulas are never
//! evaluated.

use crate::error::{ExcelError, Result};
use crate::options::DocumentProperties;
use crate::style::{builtin_format_code, HorizontalAlignment};
use crate::types::{parse_cell_reference, CellValue, Row};
use log::debug;
use s_zip::StreamingZipReader;
use std::collections::HashMap;
use std::path::Path;

/// Presentation of one cell, resolved through xl/styles.xml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellStyleInfo {
    /// Format code, `General` when the cell has none
    pub number_format: String,
    pub bold: bool,
    pub italic: bool,
    pub horizontal: Option<HorizontalAlignment>,
    /// RGB hex of a solid fill or of the first gradient stop
    pub fill_color: Option<String>,
}

impl Default for CellStyleInfo {
    fn default() -> Self {
        CellStyleInfo {
            number_format: "General".to_string(),
            bold: false,
            italic: false,
            horizontal: None,
            fill_color: None,
        }
    }
}

/// Streaming reader for XLSX files
///
/// # Example
///
/// ```no_run
/// use sheetstream::streaming_reader::StreamingReader;
///
/// let mut reader = StreamingReader::open("trades.xlsx")?;
/// for row in reader.rows("Trades")? {
///     let row = row?;
///     println!("Row {}: {:?}", row.index, row.to_strings());
/// }
/// # Ok::<(), sheetstream::ExcelError>(())
/// ```
pub struct StreamingReader {
    archive: StreamingZipReader,
    sst: Vec<String>,
    sheet_names: Vec<String>,
    sheet_paths: Vec<String>,
    styles: Option<StyleTable>,
}

impl StreamingReader {
    /// Open an XLSX file, loading its shared strings and sheet list
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut archive = StreamingZipReader::open(path)
            .map_err(|e| ExcelError::ReadError(format!("Failed to open ZIP: {}", e)))?;

        let sst = match read_optional(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings(&xml),
            None => Vec::new(),
        };

        let (sheet_names, sheet_paths) = load_sheet_info(&mut archive)?;

        debug!(
            "Opened {}: {} sheets {:?}, {} shared strings",
            path.display(),
            sheet_names.len(),
            sheet_names,
            sst.len()
        );

        Ok(StreamingReader {
            archive,
            sst,
            sheet_names,
            sheet_paths,
            styles: None,
        })
    }

    /// Names of all worksheets, in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheet_names.clone()
    }

    /// Name of the sheet at 0-based `index`
    pub fn sheet_name(&self, index: usize) -> Result<String> {
        self.sheet_names
            .get(index)
            .cloned()
            .ok_or_else(|| ExcelError::SheetNotFound(format!("#{}", index)))
    }

    /// Metadata stored in docProps/core.xml
    pub fn properties(&mut self) -> Result<DocumentProperties> {
        let xml = match read_optional(&mut self.archive, "docProps/core.xml")? {
            Some(xml) => xml,
            None => return Ok(DocumentProperties::default()),
        };

        let text = |name: &str| next_element(&xml, name, 0).map(|el| decode_text(el.body));
        Ok(DocumentProperties {
            title: text("dc:title"),
            subject: text("dc:subject"),
            creator: text("dc:creator"),
            keywords: text("cp:keywords"),
            description: text("dc:description"),
        })
    }

    /// Stream rows of the sheet called `sheet_name`
    pub fn rows(&mut self, sheet_name: &str) -> Result<RowIterator<'_>> {
        let xml = self.sheet_xml(sheet_name)?;
        Ok(RowIterator {
            xml,
            sst: &self.sst,
            position: 0,
            next_index: 0,
        })
    }

    /// Stream rows of the sheet at 0-based `sheet_index`
    pub fn rows_by_index(&mut self, sheet_index: usize) -> Result<RowIterator<'_>> {
        let sheet_name = self.sheet_name(sheet_index)?;
        self.rows(&sheet_name)
    }

    /// (row count, widest row) of a sheet, counting up to the last row number
    pub fn dimensions(&mut self, sheet_name: &str) -> Result<(usize, usize)> {
        let mut row_count = 0;
        let mut max_cols = 0;

        for row in self.rows(sheet_name)? {
            let row = row?;
            row_count = row_count.max(row.index as usize + 1);
            max_cols = max_cols.max(row.cells.len());
        }

        Ok((row_count, max_cols))
    }

    /// Number of data rows below the header of the sheet at `sheet_index`
    pub fn line_count(&mut self, sheet_index: usize) -> Result<usize> {
        let sheet_name = self.sheet_name(sheet_index)?;
        let (rows, _) = self.dimensions(&sheet_name)?;
        Ok(rows.saturating_sub(1))
    }

    /// Whole sheet as a rectangular grid
    ///
    /// With `None` the workbook must have exactly one sheet. Rows are padded
    /// with `Empty` to the widest row, and missing row numbers become empty
    /// rows.
    pub fn read_as_array(&mut self, sheet_name: Option<&str>) -> Result<Vec<Vec<CellValue>>> {
        let sheet_name = match sheet_name {
            Some(name) => name.to_string(),
            None => match self.sheet_names.as_slice() {
                [only] => only.clone(),
                [] => return Err(ExcelError::ReadError("Workbook has no sheets".to_string())),
                sheets => {
                    return Err(ExcelError::AmbiguousSheetReference {
                        sheets: sheets.to_vec(),
                    })
                }
            },
        };

        let mut grid: Vec<Vec<CellValue>> = Vec::new();
        for row in self.rows(&sheet_name)? {
            let row = row?;
            let index = row.index as usize;
            if index < grid.len() {
                return Err(ExcelError::ReadError(format!(
                    "Row {} appears out of order in sheet '{}'",
                    index + 1,
                    sheet_name
                )));
            }
            grid.resize_with(index, Vec::new);
            grid.push(row.cells);
        }

        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut grid {
            row.resize(width, CellValue::Empty);
        }
        Ok(grid)
    }

    /// Resolved style of the cell at `cell_ref` (e.g. "B2")
    ///
    /// `None` when the sheet has no such cell.
    pub fn cell_style(&mut self, sheet_name: &str, cell_ref: &str) -> Result<Option<CellStyleInfo>> {
        let target = parse_cell_reference(cell_ref)
            .ok_or_else(|| ExcelError::ReadError(format!("Invalid cell reference '{}'", cell_ref)))?;
        let xml = self.sheet_xml(sheet_name)?;

        let mut pos = 0;
        let mut style_index = None;
        while let Some(cell) = next_element(&xml, "c", pos) {
            pos = cell.end;
            let matches = attribute(cell.tag, "r")
                .and_then(parse_cell_reference)
                .is_some_and(|reference| reference == target);
            if matches {
                let index = attribute(cell.tag, "s")
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(0);
                style_index = Some(index);
                break;
            }
        }

        let Some(index) = style_index else {
            return Ok(None);
        };
        if self.styles.is_none() {
            let table = match read_optional(&mut self.archive, "xl/styles.xml")? {
                Some(xml) => StyleTable::parse(&xml),
                None => StyleTable::default(),
            };
            self.styles = Some(table);
        }
        Ok(self.styles.as_ref().map(|styles| styles.resolve(index)))
    }

    fn sheet_xml(&mut self, sheet_name: &str) -> Result<String> {
        let sheet_path = self
            .sheet_names
            .iter()
            .position(|name| name == sheet_name)
            .and_then(|idx| self.sheet_paths.get(idx))
            .ok_or_else(|| ExcelError::SheetNotFound(format!("'{}'", sheet_name)))?
            .clone();

        let data = self
            .archive
            .read_entry_by_name(&sheet_path)
            .map_err(|e| ExcelError::ReadError(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;
        String::from_utf8(data)
            .map_err(|e| ExcelError::ReadError(format!("Sheet '{}' is not UTF-8: {}", sheet_name, e)))
    }
}

fn read_optional(archive: &mut StreamingZipReader, name: &str) -> Result<Option<String>> {
    if !archive.entries().iter().any(|entry| entry.name == name) {
        return Ok(None);
    }
    let data = archive
        .read_entry_by_name(name)
        .map_err(|e| ExcelError::ReadError(format!("Failed to read {}: {}", name, e)))?;
    String::from_utf8(data)
        .map(Some)
        .map_err(|e| ExcelError::ReadError(format!("{} is not UTF-8: {}", name, e)))
}

fn read_required(archive: &mut StreamingZipReader, name: &str) -> Result<String> {
    read_optional(archive, name)?
        .ok_or_else(|| ExcelError::ReadError(format!("Missing {}", name)))
}

/// Sheet names and their worksheet entry paths, via workbook.xml and its rels
fn load_sheet_info(archive: &mut StreamingZipReader) -> Result<(Vec<String>, Vec<String>)> {
    let workbook = read_required(archive, "xl/workbook.xml")?;
    let rels = read_required(archive, "xl/_rels/workbook.xml.rels")?;

    let mut targets = HashMap::new();
    let mut pos = 0;
    while let Some(rel) = next_element(&rels, "Relationship", pos) {
        pos = rel.end;
        if let (Some(id), Some(target)) = (attribute(rel.tag, "Id"), attribute(rel.tag, "Target")) {
            let path = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{}", target),
            };
            targets.insert(id.to_string(), path);
        }
    }

    let mut sheet_names = Vec::new();
    let mut sheet_paths = Vec::new();
    let mut pos = 0;
    while let Some(sheet) = next_element(&workbook, "sheet", pos) {
        pos = sheet.end;
        let name = attribute(sheet.tag, "name")
            .ok_or_else(|| ExcelError::ReadError("Sheet without a name".to_string()))?;
        let rid = attribute(sheet.tag, "r:id")
            .ok_or_else(|| ExcelError::ReadError(format!("Sheet '{}' has no r:id", name)))?;
        let path = targets.get(rid).ok_or_else(|| {
            ExcelError::ReadError(format!("No relationship {} for sheet '{}'", rid, name))
        })?;

        sheet_names.push(decode_xml_entities(name));
        sheet_paths.push(path.clone());
    }

    Ok((sheet_names, sheet_paths))
}

fn parse_shared_strings(xml: &str) -> Vec<String> {
    let mut sst = Vec::new();
    let mut pos = 0;
    while let Some(si) = next_element(xml, "si", pos) {
        pos = si.end;
        sst.push(collect_text(si.body));
    }
    sst
}

/// Concatenated `<t>` runs of a string item, skipping phonetic runs
fn collect_text(block: &str) -> String {
    let mut phonetic = Vec::new();
    if block.contains("<rPh") {
        let mut pos = 0;
        while let Some(run) = next_element(block, "rPh", pos) {
            pos = run.end;
            phonetic.push(run.start..run.end);
        }
    }

    let mut text = String::new();
    let mut pos = 0;
    while let Some(t) = next_element(block, "t", pos) {
        pos = t.end;
        if phonetic.iter().any(|range| range.contains(&t.start)) {
            continue;
        }
        text.push_str(&decode_text(t.body));
    }
    text
}

/// Iterator over rows in a worksheet
pub struct RowIterator<'a> {
    xml: String,
    sst: &'a [String],
    position: usize,
    next_index: u32,
}

impl Iterator for RowIterator<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = next_element(&self.xml, "row", self.position)?;
        self.position = element.end;

        let index = match attribute(element.tag, "r") {
            Some(r) => match r.parse::<u32>() {
                Ok(n) if n > 0 => n - 1,
                _ => {
                    return Some(Err(ExcelError::ReadError(format!(
                        "Invalid row number '{}'",
                        r
                    ))))
                }
            },
            None => self.next_index,
        };
        self.next_index = index + 1;

        Some(parse_row(element.body, self.sst).map(|cells| Row::new(index, cells)))
    }
}

fn parse_row(row_xml: &str, sst: &[String]) -> Result<Vec<CellValue>> {
    let mut cells = Vec::new();
    let mut pos = 0;

    while let Some(cell) = next_element(row_xml, "c", pos) {
        pos = cell.end;

        let col_idx = attribute(cell.tag, "r")
            .and_then(parse_cell_reference)
            .map(|(_, col)| col as usize)
            .unwrap_or(cells.len());
        if col_idx < cells.len() {
            return Err(ExcelError::ReadError(format!(
                "Cell {:?} appears out of order",
                attribute(cell.tag, "r")
            )));
        }
        cells.resize(col_idx, CellValue::Empty);
        cells.push(parse_cell(cell.tag, cell.body, sst)?);
    }

    Ok(cells)
}

fn parse_cell(tag: &str, body: &str, sst: &[String]) -> Result<CellValue> {
    if let Some(formula) = next_element(body, "f", 0) {
        // Shared formula children carry no text; fall back to the cached value
        if !formula.body.is_empty() {
            return Ok(CellValue::Formula(format!(
                "={}",
                decode_text(formula.body)
            )));
        }
    }

    let cell_type = attribute(tag, "t").unwrap_or("n");
    if cell_type == "inlineStr" {
        return Ok(match next_element(body, "is", 0) {
            Some(is) => CellValue::Text(collect_text(is.body)),
            None => CellValue::Empty,
        });
    }

    let Some(value) = next_element(body, "v", 0).map(|v| v.body) else {
        return Ok(CellValue::Empty);
    };

    match cell_type {
        "s" => {
            let idx = value.trim().parse::<usize>().map_err(|_| {
                ExcelError::ReadError(format!("Invalid shared string index '{}'", value))
            })?;
            sst.get(idx)
                .map(|s| CellValue::Text(s.clone()))
                .ok_or_else(|| {
                    ExcelError::ReadError(format!("Shared string index {} out of range", idx))
                })
        }
        "b" => Ok(CellValue::Bool(value.trim() == "1")),
        "n" => value
            .trim()
            .parse::<f64>()
            .map(CellValue::Number)
            .map_err(|_| ExcelError::ReadError(format!("Invalid numeric cell value '{}'", value))),
        // str, e, d
        _ => Ok(CellValue::Text(decode_text(value))),
    }
}

struct Element<'x> {
    start: usize,
    tag: &'x str,
    body: &'x str,
    end: usize,
}

/// Next `<name ...>` element at or after `from`
///
/// Elements of the same name must not nest, which holds for every part
/// this module reads.
fn next_element<'x>(xml: &'x str, name: &str, from: usize) -> Option<Element<'x>> {
    let bytes = xml.as_bytes();
    let mut pos = from;

    let start = loop {
        let lt = pos + xml.get(pos..)?.find('<')?;
        let after = lt + 1 + name.len();
        if xml[lt + 1..].starts_with(name)
            && matches!(bytes.get(after), Some(b' ' | b'>' | b'/' | b'\t' | b'\n' | b'\r'))
        {
            break lt;
        }
        pos = lt + 1;
    };

    let tag_end = start + xml[start..].find('>')?;
    let tag = &xml[start..=tag_end];
    if tag.ends_with("/>") {
        return Some(Element {
            start,
            tag,
            body: "",
            end: tag_end + 1,
        });
    }

    let body_start = tag_end + 1;
    let mut pos = body_start;
    loop {
        let close = pos + xml[pos..].find("</")?;
        let after = close + 2 + name.len();
        if xml[close + 2..].starts_with(name) && bytes.get(after) == Some(&b'>') {
            return Some(Element {
                start,
                tag,
                body: &xml[body_start..close],
                end: after + 1,
            });
        }
        pos = close + 2;
    }
}

/// Raw value of attribute `name` in a start tag
fn attribute<'x>(tag: &'x str, name: &str) -> Option<&'x str> {
    let mut search = 0;
    while let Some(found) = tag[search..].find(name) {
        let start = search + found;
        let after = start + name.len();
        let at_boundary = tag[..start]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        if at_boundary && tag[after..].starts_with("=\"") {
            let value_start = after + 2;
            let len = tag[value_start..].find('"')?;
            return Some(&tag[value_start..value_start + len]);
        }
        search = after;
    }
    None
}

/// Decode predefined and numeric XML entities
/// Decode cell or property text: XML entities, then `_xHHHH_` escapes
fn decode_text(text: &str) -> String {
    decode_ooxml_escapes(&decode_xml_entities(text))
}

fn decode_ooxml_escapes(text: &str) -> String {
    if !text.contains("_x") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| tail.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[7..];
            }
            None => {
                out.push_str("_x");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_xml_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .and_then(|code| code.ok())
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, Default)]
struct XfInfo {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
    horizontal: Option<HorizontalAlignment>,
}

/// Parts of xl/styles.xml needed to describe a cell
#[derive(Debug, Default)]
struct StyleTable {
    custom_formats: HashMap<u32, String>,
    fonts: Vec<(bool, bool)>,
    fills: Vec<Option<String>>,
    xfs: Vec<XfInfo>,
}

impl StyleTable {
    fn parse(xml: &str) -> Self {
        let mut table = StyleTable::default();

        if let Some(section) = next_element(xml, "numFmts", 0) {
            let mut pos = 0;
            while let Some(fmt) = next_element(section.body, "numFmt", pos) {
                pos = fmt.end;
                let id = attribute(fmt.tag, "numFmtId").and_then(|id| id.parse().ok());
                if let (Some(id), Some(code)) = (id, attribute(fmt.tag, "formatCode")) {
                    table.custom_formats.insert(id, decode_xml_entities(code));
                }
            }
        }

        if let Some(section) = next_element(xml, "fonts", 0) {
            let mut pos = 0;
            while let Some(font) = next_element(section.body, "font", pos) {
                pos = font.end;
                table.fonts.push((flag(font.body, "b"), flag(font.body, "i")));
            }
        }

        if let Some(section) = next_element(xml, "fills", 0) {
            let mut pos = 0;
            while let Some(fill) = next_element(section.body, "fill", pos) {
                pos = fill.end;
                table.fills.push(fill_color(fill.body));
            }
        }

        if let Some(section) = next_element(xml, "cellXfs", 0) {
            let mut pos = 0;
            while let Some(xf) = next_element(section.body, "xf", pos) {
                pos = xf.end;
                let number = |name: &str| attribute(xf.tag, name).and_then(|v| v.parse().ok());
                table.xfs.push(XfInfo {
                    num_fmt_id: number("numFmtId").unwrap_or(0),
                    font_id: number("fontId").unwrap_or(0) as usize,
                    fill_id: number("fillId").unwrap_or(0) as usize,
                    horizontal: next_element(xf.body, "alignment", 0)
                        .and_then(|a| attribute(a.tag, "horizontal"))
                        .and_then(HorizontalAlignment::parse),
                });
            }
        }

        table
    }

    fn resolve(&self, index: usize) -> CellStyleInfo {
        let Some(xf) = self.xfs.get(index) else {
            return CellStyleInfo::default();
        };
        let (bold, italic) = self.fonts.get(xf.font_id).copied().unwrap_or_default();

        CellStyleInfo {
            number_format: self
                .custom_formats
                .get(&xf.num_fmt_id)
                .cloned()
                .or_else(|| builtin_format_code(xf.num_fmt_id).map(str::to_string))
                .unwrap_or_else(|| "General".to_string()),
            bold,
            italic,
            horizontal: xf.horizontal,
            fill_color: self.fills.get(xf.fill_id).cloned().flatten(),
        }
    }
}

/// `<b/>`-style toggles, honoring an explicit val="0"
fn flag(body: &str, name: &str) -> bool {
    next_element(body, name, 0)
        .map(|el| !matches!(attribute(el.tag, "val"), Some("0" | "false")))
        .unwrap_or(false)
}

fn fill_color(body: &str) -> Option<String> {
    let color_tag = if let Some(pattern) = next_element(body, "patternFill", 0) {
        if attribute(pattern.tag, "patternType") != Some("solid") {
            return None;
        }
        next_element(pattern.body, "fgColor", 0)?.tag
    } else {
        let gradient = next_element(body, "gradientFill", 0)?;
        let stop = next_element(gradient.body, "stop", 0)?;
        next_element(stop.body, "color", 0)?.tag
    };

    let argb = attribute(color_tag, "rgb")?;
    if !argb.is_ascii() {
        return None;
    }
    let rgb = &argb[argb.len().saturating_sub(6)..];
    Some(rgb.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_xml_entities("a &amp; b"), "a & b");
        assert_eq!(decode_xml_entities("&lt;x&gt; &quot;&apos;"), "<x> \"'");
        assert_eq!(decode_xml_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_xml_entities("AT&T"), "AT&T");
        assert_eq!(decode_xml_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_fill_color_from_foreign_attributes() {
        let solid = "<patternFill patternType=\"solid\"><fgColor rgb=\"ffa0a0a0\"/></patternFill>";
        assert_eq!(fill_color(solid).as_deref(), Some("A0A0A0"));

        let garbled = "<patternFill patternType=\"solid\"><fgColor rgb=\"FF\u{e9}\u{e9}\u{e9}\u{e9}\"/></patternFill>";
        assert_eq!(fill_color(garbled), None);

        let none = "<patternFill patternType=\"none\"/>";
        assert_eq!(fill_color(none), None);
    }

    #[test]
    fn test_decode_ooxml_escapes() {
        assert_eq!(decode_ooxml_escapes("x_x0001_y"), "x\u{1}y");
        assert_eq!(decode_ooxml_escapes("a_x005F_x0041_b"), "a_x0041_b");
        assert_eq!(decode_ooxml_escapes("_x12 _x00zz_ _x"), "_x12 _x00zz_ _x");
        assert_eq!(decode_ooxml_escapes("_xD800_"), "_xD800_");
        assert_eq!(decode_text("&lt;_x000D_&gt;"), "<\r>");
    }

    #[test]
    fn test_next_element_skips_prefixed_names() {
        let xml = "<cols><col min=\"1\"/></cols><c r=\"A1\"><v>1</v></c><c r=\"B1\"/>";
        let first = next_element(xml, "c", 0).unwrap();
        assert_eq!(first.tag, "<c r=\"A1\">");
        assert_eq!(first.body, "<v>1</v>");

        let second = next_element(xml, "c", first.end).unwrap();
        assert_eq!(second.tag, "<c r=\"B1\"/>");
        assert_eq!(second.body, "");
        assert!(next_element(xml, "c", second.end).is_none());
    }

    #[test]
    fn test_attribute() {
        let tag = "<c r=\"B2\" s=\"3\" t=\"s\">";
        assert_eq!(attribute(tag, "r"), Some("B2"));
        assert_eq!(attribute(tag, "s"), Some("3"));
        assert_eq!(attribute(tag, "t"), Some("s"));
        assert_eq!(attribute("<sheet name=\"a\" r:id=\"rId1\"/>", "id"), None);
        assert_eq!(attribute("<sheet name=\"a\" r:id=\"rId1\"/>", "r:id"), Some("rId1"));
    }

    #[test]
    fn test_shared_strings_rich_text() {
        let xml = "<sst><si><t>plain</t></si>\
                   <si><r><rPr><b/></rPr><t>bo</t></r><r><t xml:space=\"preserve\">ld &amp; more</t></r></si>\
                   <si><t>漢字</t><rPh sb=\"0\" eb=\"2\"><t>かんじ</t></rPh></si></sst>";
        assert_eq!(
            parse_shared_strings(xml),
            vec!["plain".to_string(), "bold & more".to_string(), "漢字".to_string()]
        );
    }

    #[test]
    fn test_parse_row_types() {
        let sst = vec!["BUY".to_string()];
        let row = "<c r=\"A1\" t=\"s\"><v>0</v></c>\
                   <c r=\"C1\"><v>123.456</v></c>\
                   <c r=\"D1\" t=\"b\"><v>1</v></c>\
                   <c r=\"E1\"><f>(E2-D2)/D2</f><v>0.5</v></c>\
                   <c r=\"F1\" t=\"inlineStr\"><is><t>inline</t></is></c>\
                   <c r=\"G1\" t=\"str\"><v>x&lt;y</v></c>\
                   <c r=\"H1\" s=\"2\"/>";
        let cells = parse_row(row, &sst).unwrap();
        assert_eq!(
            cells,
            vec![
                CellValue::Text("BUY".into()),
                CellValue::Empty,
                CellValue::Number(123.456),
                CellValue::Bool(true),
                CellValue::Formula("=(E2-D2)/D2".into()),
                CellValue::Text("inline".into()),
                CellValue::Text("x<y".into()),
                CellValue::Empty,
            ]
        );
    }

    #[test]
    fn test_row_iterator_numbers() {
        let xml = "<sheetData><row r=\"1\"><c r=\"A1\"><v>1</v></c></row>\
                   <row r=\"4\"/><row><c><v>2</v></c></row></sheetData>"
            .to_string();
        let rows: Vec<Row> = RowIterator {
            xml,
            sst: &[],
            position: 0,
            next_index: 0,
        }
        .collect::<Result<_>>()
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[1].index, 3);
        assert!(rows[1].cells.is_empty());
        assert_eq!(rows[2].index, 4);
        assert_eq!(rows[2].cells, vec![CellValue::Number(2.0)]);
    }

    #[test]
    fn test_style_table() {
        let xml = "<styleSheet><numFmts count=\"1\"><numFmt numFmtId=\"164\" formatCode=\"yyyy-mm-dd\"/></numFmts>\
                   <fonts count=\"2\"><font><sz val=\"11\"/></font><font><b/><i val=\"0\"/></font></fonts>\
                   <fills count=\"4\"><fill><patternFill patternType=\"none\"/></fill>\
                   <fill><patternFill patternType=\"gray125\"/></fill>\
                   <fill><patternFill patternType=\"solid\"><fgColor rgb=\"FFFFFF00\"/></patternFill></fill>\
                   <fill><gradientFill degree=\"90\"><stop position=\"0\"><color rgb=\"FFA0A0A0\"/></stop>\
                   <stop position=\"1\"><color rgb=\"FFFFFFFF\"/></stop></gradientFill></fill></fills>\
                   <cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\
                   <cellXfs count=\"3\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>\
                   <xf numFmtId=\"164\" fontId=\"1\" fillId=\"3\" borderId=\"0\" xfId=\"0\"><alignment horizontal=\"center\"/></xf>\
                   <xf numFmtId=\"4\" fontId=\"0\" fillId=\"2\" borderId=\"0\" xfId=\"0\"/></cellXfs></styleSheet>";
        let table = StyleTable::parse(xml);

        assert_eq!(table.resolve(0), CellStyleInfo::default());

        let styled = table.resolve(1);
        assert_eq!(styled.number_format, "yyyy-mm-dd");
        assert!(styled.bold);
        assert!(!styled.italic);
        assert_eq!(styled.horizontal, Some(HorizontalAlignment::Center));
        assert_eq!(styled.fill_color.as_deref(), Some("A0A0A0"));

        let numeric = table.resolve(2);
        assert_eq!(numeric.number_format, "#,##0.00");
        assert_eq!(numeric.fill_color.as_deref(), Some("FFFF00"));
    }
}
