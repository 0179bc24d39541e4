//! Streaming workbook writer over s-zip

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;
use s_zip::{CompressionMethod, StreamingZipWriter};

use super::shared_strings::SharedStrings;
use super::styles::StyleRegistry;
use super::xml_writer::XmlWriter;
use crate::error::{ExcelError, Result};
use crate::options::{validate_column_width, DocumentProperties};
use crate::style::{NumberFormat, StyleSpec};
use crate::table::validate_sheet_name;
use crate::types::{col_to_letter, CellValue, StyledCell};

/// Highest row number a worksheet can hold
pub const MAX_ROWS: u32 = 1_048_576;
/// Highest column count a worksheet can hold
pub const MAX_COLS: usize = 16_384;

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Workbook written row by row straight into the ZIP archive
///
/// Worksheets are written in order: `add_worksheet` closes the previous one.
/// Shared strings and styles are collected along the way and written by
/// [`close`](FastWorkbook::close).
///
/// ```no_run
/// use sheetstream::fast_writer::FastWorkbook;
///
/// let mut workbook = FastWorkbook::new("report.xlsx")?;
/// workbook.add_worksheet("Trades")?;
/// workbook.write_values(&["CUSIP".into(), "PRICE".into()])?;
/// workbook.write_values(&["123456789".into(), 101.25.into()])?;
/// workbook.close()?;
/// # Ok::<(), sheetstream::ExcelError>(())
/// ```
pub struct FastWorkbook {
    zip: StreamingZipWriter<File>,
    path: PathBuf,
    shared_strings: SharedStrings,
    styles: StyleRegistry,
    worksheets: Vec<String>,
    current_worksheet: Option<u32>,
    current_row: u32,
    xml: XmlWriter,
    cell_ref_cache: Vec<String>,

    column_widths: BTreeMap<u32, f64>,
    freeze_header: bool,
    sheet_data_started: bool,
}

impl FastWorkbook {
    /// Create a workbook without document properties
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_properties(path, &DocumentProperties::default())
    }

    /// Create a workbook, storing `properties` in docProps/core.xml
    pub fn with_properties<P: AsRef<Path>>(
        path: P,
        properties: &DocumentProperties,
    ) -> Result<Self> {
        let path = path.as_ref();
        let zip = StreamingZipWriter::with_method(path, CompressionMethod::Deflate, 6)
            .map_err(|e| ExcelError::WriteError(format!("Failed to create ZIP writer: {}", e)))?;

        let mut cell_ref_cache = Vec::with_capacity(100);
        for col in 0..100 {
            cell_ref_cache.push(col_to_letter(col));
        }

        let mut workbook = FastWorkbook {
            zip,
            path: path.to_path_buf(),
            shared_strings: SharedStrings::new(),
            styles: StyleRegistry::new(),
            worksheets: Vec::new(),
            current_worksheet: None,
            current_row: 0,
            xml: XmlWriter::with_capacity(64 * 1024),
            cell_ref_cache,
            column_widths: BTreeMap::new(),
            freeze_header: false,
            sheet_data_started: false,
        };

        workbook.write_entry("_rels/.rels", ROOT_RELS.as_bytes())?;
        let core = core_properties_xml(properties);
        workbook.write_entry("docProps/core.xml", &core)?;
        workbook.write_entry("docProps/app.xml", APP_PROPS.as_bytes())?;

        debug!("Created workbook {}", path.display());
        Ok(workbook)
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written to the current worksheet
    pub fn current_row(&self) -> u32 {
        self.current_row
    }

    /// Names of the worksheets added so far
    pub fn worksheet_names(&self) -> &[String] {
        &self.worksheets
    }

    /// Register a cell format and get the index used by [`StyledCell::style`]
    pub fn register_style(&mut self, style: &StyleSpec, format: Option<&NumberFormat>) -> Result<u32> {
        style.validate()?;
        Ok(self.styles.register(style, format))
    }

    /// Start a new worksheet, closing the current one
    pub fn add_worksheet(&mut self, name: &str) -> Result<()> {
        validate_sheet_name(name)?;
        if self
            .worksheets
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(name))
        {
            return Err(ExcelError::InvalidSheetName {
                name: name.to_string(),
                reason: "a sheet with this name already exists".to_string(),
            });
        }

        self.finish_current_worksheet()?;

        self.worksheets.push(name.to_string());
        let sheet_id = self.worksheets.len() as u32;

        let entry_name = format!("xl/worksheets/sheet{}.xml", sheet_id);
        self.zip
            .start_entry(&entry_name)
            .map_err(|e| ExcelError::WriteError(format!("Failed to start ZIP entry: {}", e)))?;

        self.xml.clear();
        self.xml.declaration();
        self.xml.start_element("worksheet");
        self.xml.attribute("xmlns", SPREADSHEET_NS);
        self.xml.attribute("xmlns:r", RELATIONSHIP_NS);
        self.xml.close_start_tag();

        self.current_worksheet = Some(sheet_id);
        self.current_row = 0;
        self.column_widths.clear();
        self.freeze_header = false;
        self.sheet_data_started = false;

        debug!("Started worksheet {} '{}'", sheet_id, name);
        Ok(())
    }

    /// Set the width of a 0-based column of the current worksheet
    ///
    /// Must be called before the first row is written.
    pub fn set_column_width(&mut self, col: u32, width: f64) -> Result<()> {
        self.check_layout_allowed("column width")?;
        validate_column_width(&col_to_letter(col), width)?;
        self.column_widths.insert(col, width);
        Ok(())
    }

    /// Keep the first row visible while scrolling
    ///
    /// Must be called before the first row is written.
    pub fn freeze_header_row(&mut self) -> Result<()> {
        self.check_layout_allowed("frozen header")?;
        self.freeze_header = true;
        Ok(())
    }

    fn check_layout_allowed(&self, what: &str) -> Result<()> {
        if self.current_worksheet.is_none() {
            return Err(ExcelError::InvalidState(
                "No active worksheet. Call add_worksheet() first.".to_string(),
            ));
        }
        if self.sheet_data_started {
            return Err(ExcelError::InvalidState(format!(
                "Cannot set {} after writing rows",
                what
            )));
        }
        Ok(())
    }

    /// Writes sheetViews and cols, then opens sheetData
    fn ensure_sheet_data_started(&mut self) -> Result<()> {
        if self.sheet_data_started {
            return Ok(());
        }

        if self.freeze_header {
            self.xml.write_raw(b"<sheetViews><sheetView workbookViewId=\"0\">");
            self.xml.write_raw(
                b"<pane ySplit=\"1\" topLeftCell=\"A2\" activePane=\"bottomLeft\" state=\"frozen\"/>",
            );
            self.xml
                .write_raw(b"<selection pane=\"bottomLeft\"/></sheetView></sheetViews>");
        }

        if !self.column_widths.is_empty() {
            self.xml.start_element("cols");
            self.xml.close_start_tag();
            for (col, width) in &self.column_widths {
                self.xml.start_element("col");
                self.xml.attribute_int("min", *col as u64 + 1);
                self.xml.attribute_int("max", *col as u64 + 1);
                self.xml.attribute_f64("width", *width);
                self.xml.attribute("customWidth", "1");
                self.xml.close_empty();
            }
            self.xml.end_element("cols");
        }

        self.xml.start_element("sheetData");
        self.xml.close_start_tag();
        self.sheet_data_started = true;
        Ok(())
    }

    /// Write a row of unstyled values
    pub fn write_values(&mut self, values: &[CellValue]) -> Result<()> {
        self.begin_row(values.len())?;
        for (col_idx, value) in values.iter().enumerate() {
            self.write_cell(col_idx, value, 0);
        }
        self.end_row()
    }

    /// Write a row of cells carrying registered style indexes
    pub fn write_row(&mut self, cells: &[StyledCell]) -> Result<()> {
        self.begin_row(cells.len())?;
        for (col_idx, cell) in cells.iter().enumerate() {
            self.write_cell(col_idx, &cell.value, cell.style);
        }
        self.end_row()
    }

    fn begin_row(&mut self, width: usize) -> Result<()> {
        if self.current_worksheet.is_none() {
            return Err(ExcelError::InvalidState("No active worksheet".to_string()));
        }
        if self.current_row >= MAX_ROWS {
            return Err(ExcelError::WriteError(format!(
                "Worksheet row limit of {} reached",
                MAX_ROWS
            )));
        }
        if width > MAX_COLS {
            return Err(ExcelError::WriteError(format!(
                "Row has {} cells, the limit is {}",
                width, MAX_COLS
            )));
        }

        self.ensure_sheet_data_started()?;
        self.current_row += 1;
        self.xml.start_element("row");
        self.xml.attribute_int("r", self.current_row as u64);
        self.xml.close_start_tag();
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        self.xml.end_element("row");
        if self.xml.should_flush() {
            self.flush_xml()?;
        }
        Ok(())
    }

    fn write_cell(&mut self, col_idx: usize, value: &CellValue, style: u32) {
        if value.is_empty() && style == 0 {
            return;
        }

        self.xml.write_raw(b"<c r=\"");
        match self.cell_ref_cache.get(col_idx) {
            Some(letters) => self.xml.write_str(letters),
            None => self.xml.write_str(&col_to_letter(col_idx as u32)),
        }
        self.xml
            .write_str(itoa::Buffer::new().format(self.current_row));
        self.xml.write_raw(b"\"");
        if style > 0 {
            self.xml.attribute_int("s", style as u64);
        }

        match value {
            CellValue::Empty => self.xml.close_empty(),
            CellValue::Text(s) => self.write_shared_string(s),
            CellValue::Number(n) if n.is_finite() => {
                self.xml.write_raw(b"><v>");
                write_number(&mut self.xml, *n);
                self.xml.write_raw(b"</v></c>");
            }
            CellValue::Number(n) => self.write_shared_string(&n.to_string()),
            CellValue::Bool(b) => {
                self.xml.write_raw(b" t=\"b\"><v>");
                self.xml.write_raw(if *b { b"1" } else { b"0" });
                self.xml.write_raw(b"</v></c>");
            }
            CellValue::Formula(formula) => {
                let expression = formula.strip_prefix('=').unwrap_or(formula);
                self.xml.write_raw(b"><f>");
                self.xml.write_escaped(expression);
                self.xml.write_raw(b"</f></c>");
            }
        }
    }

    fn write_shared_string(&mut self, s: &str) {
        let index = self.shared_strings.add_string(s);
        self.xml.write_raw(b" t=\"s\"><v>");
        self.xml.write_str(itoa::Buffer::new().format(index));
        self.xml.write_raw(b"</v></c>");
    }

    fn flush_xml(&mut self) -> Result<()> {
        if self.xml.is_empty() {
            return Ok(());
        }
        self.zip
            .write_data(self.xml.as_bytes())
            .map_err(|e| ExcelError::WriteError(format!("Failed to write to ZIP: {}", e)))?;
        self.xml.clear();
        Ok(())
    }

    fn finish_current_worksheet(&mut self) -> Result<()> {
        if self.current_worksheet.is_none() {
            return Ok(());
        }

        self.ensure_sheet_data_started()?;
        self.xml.end_element("sheetData");
        self.xml.end_element("worksheet");
        self.flush_xml()?;

        debug!(
            "Finished worksheet {} with {} rows",
            self.worksheets.len(),
            self.current_row
        );
        self.current_worksheet = None;
        Ok(())
    }

    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.zip
            .start_entry(name)
            .map_err(|e| ExcelError::WriteError(format!("Failed to start ZIP entry: {}", e)))?;
        self.zip
            .write_data(data)
            .map_err(|e| ExcelError::WriteError(format!("Failed to write to ZIP: {}", e)))?;
        Ok(())
    }

    /// Write the remaining parts and finish the archive
    ///
    /// Fails with `InvalidState` when no worksheet was added.
    pub fn close(mut self) -> Result<()> {
        if self.worksheets.is_empty() {
            return Err(ExcelError::InvalidState(
                "Workbook must contain at least one worksheet".to_string(),
            ));
        }
        self.finish_current_worksheet()?;

        let mut xml = XmlWriter::new();
        self.shared_strings.write_xml(&mut xml);
        self.write_entry("xl/sharedStrings.xml", xml.as_bytes())?;

        xml.clear();
        self.workbook_xml(&mut xml);
        self.write_entry("xl/workbook.xml", xml.as_bytes())?;

        xml.clear();
        self.workbook_rels_xml(&mut xml);
        self.write_entry("xl/_rels/workbook.xml.rels", xml.as_bytes())?;

        xml.clear();
        self.styles.write_xml(&mut xml);
        self.write_entry("xl/styles.xml", xml.as_bytes())?;

        xml.clear();
        self.content_types_xml(&mut xml);
        self.write_entry("[Content_Types].xml", xml.as_bytes())?;

        debug!(
            "Closing workbook {}: {} sheets, {} shared strings, {} cell formats",
            self.path.display(),
            self.worksheets.len(),
            self.shared_strings.len(),
            self.styles.len()
        );

        self.zip
            .finish()
            .map_err(|e| ExcelError::WriteError(format!("Failed to finish ZIP: {}", e)))?;
        Ok(())
    }

    fn workbook_xml(&self, xml: &mut XmlWriter) {
        xml.declaration();
        xml.start_element("workbook");
        xml.attribute("xmlns", SPREADSHEET_NS);
        xml.attribute("xmlns:r", RELATIONSHIP_NS);
        xml.close_start_tag();
        xml.write_raw(b"<bookViews><workbookView/></bookViews><sheets>");
        for (i, name) in self.worksheets.iter().enumerate() {
            let sheet_id = i as u64 + 1;
            xml.start_element("sheet");
            xml.attribute("name", name);
            xml.attribute_int("sheetId", sheet_id);
            xml.attribute("r:id", &format!("rId{}", sheet_id));
            xml.close_empty();
        }
        xml.end_element("sheets");
        xml.end_element("workbook");
    }

    fn workbook_rels_xml(&self, xml: &mut XmlWriter) {
        xml.declaration();
        xml.start_element("Relationships");
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/relationships",
        );
        xml.close_start_tag();

        let count = self.worksheets.len();
        let mut relationship = |id: usize, kind: &str, target: &str| {
            xml.start_element("Relationship");
            xml.attribute("Id", &format!("rId{}", id));
            xml.attribute("Type", &format!("{}/{}", RELATIONSHIP_NS, kind));
            xml.attribute("Target", target);
            xml.close_empty();
        };
        for id in 1..=count {
            relationship(id, "worksheet", &format!("worksheets/sheet{}.xml", id));
        }
        relationship(count + 1, "styles", "styles.xml");
        relationship(count + 2, "sharedStrings", "sharedStrings.xml");

        xml.end_element("Relationships");
    }

    fn content_types_xml(&self, xml: &mut XmlWriter) {
        xml.declaration();
        xml.write_raw(b"<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">");
        xml.write_raw(b"<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>");
        xml.write_raw(b"<Default Extension=\"xml\" ContentType=\"application/xml\"/>");
        xml.write_raw(b"<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>");
        for id in 1..=self.worksheets.len() {
            xml.start_element("Override");
            xml.attribute("PartName", &format!("/xl/worksheets/sheet{}.xml", id));
            xml.attribute(
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
            );
            xml.close_empty();
        }
        xml.write_raw(b"<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>");
        xml.write_raw(b"<Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>");
        xml.write_raw(b"<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>");
        xml.write_raw(b"<Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>");
        xml.write_raw(b"</Types>");
    }
}

/// Integral values in i64 range print without a fraction
fn write_number(xml: &mut XmlWriter, n: f64) {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        xml.write_str(itoa::Buffer::new().format(n as i64));
    } else {
        xml.write_str(&n.to_string());
    }
}

fn core_properties_xml(properties: &DocumentProperties) -> Vec<u8> {
    let now = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string();

    let mut xml = XmlWriter::new();
    xml.declaration();
    xml.write_raw(b"<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" xmlns:dcmitype=\"http://purl.org/dc/dcmitype/\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">");

    let fields = [
        ("dc:title", &properties.title),
        ("dc:subject", &properties.subject),
        ("dc:creator", &properties.creator),
        ("cp:keywords", &properties.keywords),
        ("dc:description", &properties.description),
    ];
    for (tag, value) in fields {
        if let Some(value) = value {
            xml.text_element(tag, value);
        }
    }

    xml.write_raw(b"<dcterms:created xsi:type=\"dcterms:W3CDTF\">");
    xml.write_str(&now);
    xml.write_raw(b"</dcterms:created><dcterms:modified xsi:type=\"dcterms:W3CDTF\">");
    xml.write_str(&now);
    xml.write_raw(b"</dcterms:modified></cp:coreProperties>");
    xml.into_bytes()
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>sheetstream</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
</Properties>"#;
