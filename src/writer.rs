//! Table writer: typed, styled sheets on top of [`FastWorkbook`]

use crate::columns::ColumnTypes;
use crate::error::{ExcelError, Result};
use crate::fast_writer::FastWorkbook;
use crate::options::{BuildOptions, SheetLayout};
use crate::style::{NumberFormat, StyleSpec};
use crate::table::{Record, Table};
use crate::types::{CellValue, StyledCell};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Excel file writer
///
/// Wraps a [`FastWorkbook`] with output path resolution and cleanup: a
/// writer that is dropped or fails before [`save`](ExcelWriter::save) leaves
/// no partial file behind.
///
/// # Examples
///
/// ```no_run
/// use sheetstream::options::{BuildOptions, SheetLayout};
/// use sheetstream::writer::ExcelWriter;
/// use sheetstream::CellValue;
///
/// let mut writer = ExcelWriter::create("output.xlsx", &BuildOptions::new())?;
/// writer.add_sheet("Trades", &SheetLayout::plain())?;
/// writer.write_row_typed(&[CellValue::from("CUSIP"), CellValue::from("PRICE")])?;
/// writer.write_row_typed(&[CellValue::from("123456789"), CellValue::Number(101.5)])?;
/// let path = writer.save()?;
/// # Ok::<(), sheetstream::ExcelError>(())
/// ```
pub struct ExcelWriter {
    workbook: Option<FastWorkbook>,
    path: PathBuf,
}

impl ExcelWriter {
    /// Create the output file, resolving `path` through the write policy
    ///
    /// Missing parent directories are created. Any failure to create the
    /// file is reported as `OutputInitializationFailed`.
    pub fn create<P: AsRef<Path>>(path: P, options: &BuildOptions) -> Result<Self> {
        let path = options.write_policy.resolve(path.as_ref());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ExcelError::OutputInitializationFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        let workbook = FastWorkbook::with_properties(&path, &options.properties).map_err(|e| {
            ExcelError::OutputInitializationFailed {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;

        debug!("Writing workbook to {}", path.display());
        Ok(ExcelWriter {
            workbook: Some(workbook),
            path,
        })
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn workbook(&mut self) -> Result<&mut FastWorkbook> {
        self.workbook
            .as_mut()
            .ok_or_else(|| ExcelError::InvalidState("Writer already closed".to_string()))
    }

    /// Start a sheet with the widths and frozen header of `layout`
    pub fn add_sheet(&mut self, name: &str, layout: &SheetLayout) -> Result<()> {
        let workbook = self.workbook()?;
        workbook.add_worksheet(name)?;
        for (col, width) in &layout.column_widths {
            workbook.set_column_width(*col, *width)?;
        }
        if layout.freeze_header {
            workbook.freeze_header_row()?;
        }
        Ok(())
    }

    /// Cell format index for a style and number format
    pub fn register_style(
        &mut self,
        style: &StyleSpec,
        format: Option<&NumberFormat>,
    ) -> Result<u32> {
        self.workbook()?.register_style(style, format)
    }

    /// Write a row of values with the default style
    pub fn write_row_typed(&mut self, cells: &[CellValue]) -> Result<()> {
        self.workbook()?.write_values(cells)
    }

    /// Write a row of styled cells
    pub fn write_row_styled(&mut self, cells: &[StyledCell]) -> Result<()> {
        self.workbook()?.write_row(cells)
    }

    /// Finish the file and return its path
    pub fn save(mut self) -> Result<PathBuf> {
        let workbook = self
            .workbook
            .take()
            .ok_or_else(|| ExcelError::InvalidState("Writer already closed".to_string()))?;

        if let Err(e) = workbook.close() {
            remove_partial(&self.path);
            return Err(e);
        }
        Ok(std::mem::take(&mut self.path))
    }

    /// Write `table` as a single-sheet workbook
    ///
    /// Header, data rows and footer rows are written contiguously. Values are
    /// converted through `types`; a conversion failure aborts the write and
    /// removes the partial file.
    pub fn write_table<P: AsRef<Path>>(
        table: &Table,
        types: &ColumnTypes,
        path: P,
        sheet_name: &str,
        layout: &SheetLayout,
        options: &BuildOptions,
    ) -> Result<PathBuf> {
        let mut writer = ExcelWriter::create(path, options)?;
        writer.add_sheet(sheet_name, layout)?;
        writer.write_table_rows(table, types, layout)?;

        debug!(
            "Wrote {} rows ({} data, {} footer) to sheet '{}'",
            table.sheet_row_count(),
            table.rows().len(),
            table.footer().len(),
            sheet_name
        );
        writer.save()
    }

    fn write_table_rows(
        &mut self,
        table: &Table,
        types: &ColumnTypes,
        layout: &SheetLayout,
    ) -> Result<()> {
        let header = table.header();
        if header.is_empty() {
            return Ok(());
        }

        let mut cells = Vec::with_capacity(header.len());
        for column in header {
            let style = self.register_style(&layout.style_for(column, 1, true), None)?;
            cells.push(StyledCell::new(CellValue::Text(column.clone()), style));
        }
        self.write_row_styled(&cells)?;

        // Row 0 never matches a single-cell target
        let mut column_styles = Vec::with_capacity(header.len());
        for column in header {
            let style = self.register_style(&layout.style_for(column, 0, false), types.format(column))?;
            column_styles.push(style);
        }

        for (idx, record) in table.rows().iter().chain(table.footer()).enumerate() {
            let sheet_row = idx + 1;
            cells.clear();
            for (col_idx, column) in header.iter().enumerate() {
                let value = types.cell(column, field(record, column), sheet_row)?;
                let row_number = sheet_row as u32 + 1;
                let style = if layout.has_cell_style(column, row_number) {
                    let spec = layout.style_for(column, row_number, false);
                    self.register_style(&spec, types.format(column))?
                } else {
                    column_styles[col_idx]
                };
                cells.push(StyledCell::new(value, style));
            }
            self.write_row_styled(&cells)?;
        }
        Ok(())
    }
}

impl Drop for ExcelWriter {
    fn drop(&mut self) {
        if self.workbook.take().is_some() {
            remove_partial(&self.path);
        }
    }
}

fn field<'a>(record: &'a Record, column: &str) -> &'a str {
    record.get(column).map(String::as_str).unwrap_or("")
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed partial file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", path.display(), e),
    }
}
