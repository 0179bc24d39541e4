//! One-call entry points for building, reading and splitting workbooks

use crate::columns::ColumnTypes;
use crate::error::Result;
use crate::options::{AdvancedColumns, BuildOptions, SheetLayout};
use crate::splitter;
use crate::streaming_reader::StreamingReader;
use crate::style::NumberFormat;
use crate::table::{Record, Table, Totals};
use crate::types::CellValue;
use crate::writer::ExcelWriter;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Write `rows` and `totals` as a one-sheet workbook
///
/// Columns listed in `numeric_columns` are written as numbers; every column
/// in `numeric_column_formats` gets that number format. Both must name header
/// columns. Returns the path actually written.
///
/// # Examples
///
/// ```no_run
/// use indexmap::IndexMap;
/// use sheetstream::{build_simple, BuildOptions, NumberFormat, Record, Totals};
///
/// let mut row = Record::new();
/// row.insert("CUSIP".into(), "123456789".into());
/// row.insert("PRICE".into(), "101.25".into());
///
/// let mut formats = IndexMap::new();
/// formats.insert("PRICE".to_string(), NumberFormat::Numeric);
///
/// let path = build_simple(
///     &[row],
///     &Totals::new(),
///     "Trades",
///     "out/trades.xlsx",
///     &BuildOptions::new().description("Daily trades"),
///     &["PRICE"],
///     &formats,
/// )?;
/// # Ok::<(), sheetstream::ExcelError>(())
/// ```
pub fn build_simple<P, S>(
    rows: &[Record],
    totals: &Totals,
    sheet_name: &str,
    path: P,
    options: &BuildOptions,
    numeric_columns: &[S],
    numeric_column_formats: &IndexMap<String, NumberFormat>,
) -> Result<PathBuf>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let table = Table::build(sheet_name, rows, totals)?;
    let types = ColumnTypes::resolve(
        table.header(),
        &IndexMap::new(),
        numeric_column_formats,
        numeric_columns,
    )?;
    ExcelWriter::write_table(&table, &types, path, sheet_name, &SheetLayout::plain(), options)
}

/// Write `rows` and `totals` with per-column types, formats, widths and styles
pub fn build_advanced<P: AsRef<Path>>(
    rows: &[Record],
    totals: &Totals,
    sheet_name: &str,
    path: P,
    options: &BuildOptions,
    columns: &AdvancedColumns,
) -> Result<PathBuf> {
    let table = Table::build(sheet_name, rows, totals)?;
    let types = ColumnTypes::resolve(
        table.header(),
        &columns.column_types,
        &columns.number_formats,
        &[] as &[&str],
    )?;
    let layout = SheetLayout::resolve(
        table.header(),
        &columns.column_widths,
        &columns.styles,
        columns.freeze_header,
    )?;
    ExcelWriter::write_table(&table, &types, path, sheet_name, &layout, options)
}

/// Sheet contents as a rectangular grid of typed values
///
/// `sheet_name` may be omitted only for single-sheet workbooks.
pub fn read_as_array<P: AsRef<Path>>(
    path: P,
    sheet_name: Option<&str>,
) -> Result<Vec<Vec<CellValue>>> {
    StreamingReader::open(path)?.read_as_array(sheet_name)
}

/// Split a sheet into files of at most `max_rows` data rows
pub fn split_sheet<P: AsRef<Path>>(
    path: P,
    sheet_index: usize,
    max_rows: usize,
) -> Result<Vec<PathBuf>> {
    splitter::split_sheet(path, sheet_index, max_rows)
}

/// Data rows of a sheet, header excluded
pub fn line_count<P: AsRef<Path>>(path: P, sheet_index: usize) -> Result<usize> {
    StreamingReader::open(path)?.line_count(sheet_index)
}

/// Name of the sheet at 0-based `sheet_index`
pub fn sheet_name<P: AsRef<Path>>(path: P, sheet_index: usize) -> Result<String> {
    StreamingReader::open(path)?.sheet_name(sheet_index)
}
