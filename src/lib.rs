//! # sheetstream
//!
//! Build, read and split XLSX workbooks from tabular records, with no
//! spreadsheet engine behind it: worksheets are streamed as XML straight
//! into a ZIP archive.
//!
//! ## Features
//!
//! - **Records in, workbook out**: header from the first record, footer rows
//!   from a totals block
//! - **Typed columns**: numeric coercion, literal formulas, number formats
//! - **Presentation**: column widths, frozen header, fonts, fills, borders
//! - **Reading**: typed cell values, sheet names, row counts, cell styles
//! - **Splitting**: one sheet into many bounded files, header repeated
//!
//! ## Quick Start
//!
//! ### Building a workbook
//!
//! ```rust,no_run
//! use sheetstream::{build_advanced, AdvancedColumns, BuildOptions, DataType, Record, Totals};
//! use sheetstream::style::{Color, Fill, StyleSpec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut row = Record::new();
//! row.insert("CUSIP".into(), "123456789".into());
//! row.insert("PRICE".into(), "101.25".into());
//! row.insert("CHANGE".into(), "=B2/100".into());
//!
//! let columns = AdvancedColumns::new()
//!     .column_type("PRICE", DataType::Numeric)
//!     .column_type("CHANGE", DataType::Formula)
//!     .column_width("CUSIP", 14.0)
//!     .style("CUSIP", StyleSpec::new().bold().fill(Fill::Solid { color: Color::new("A0A0A0")? }))
//!     .freeze_header(true);
//!
//! let path = build_advanced(&[row], &Totals::new(), "Trades", "trades.xlsx", &BuildOptions::new(), &columns)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Reading it back
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let grid = sheetstream::read_as_array("trades.xlsx", None)?;
//! println!("header: {:?}", grid[0]);
//! println!("{} data rows", sheetstream::line_count("trades.xlsx", 0)?);
//! # Ok(())
//! # }
//! ```

pub mod columns;
pub mod error;
pub mod excel;
pub mod fast_writer;
pub mod options;
pub mod splitter;
pub mod streaming_reader;
pub mod style;
pub mod table;
pub mod types;
pub mod writer;

pub use columns::{ColumnTypes, DataType};
pub use error::{ExcelError, Result};
pub use excel::{build_advanced, build_simple, line_count, read_as_array, sheet_name, split_sheet};
pub use options::{AdvancedColumns, BuildOptions, DocumentProperties, SheetLayout, WritePolicy};
pub use streaming_reader::{CellStyleInfo, StreamingReader};
pub use style::{NumberFormat, StyleSpec, StyleTarget};
pub use table::{Record, Table, TotalValue, Totals};
pub use types::{CellValue, Row, StyledCell};
pub use writer::ExcelWriter;
