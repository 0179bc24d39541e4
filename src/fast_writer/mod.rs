//! Native XLSX writer
//!
//! Worksheets are generated as XML straight into a streaming ZIP archive:
//! - rows are buffered briefly and flushed into the current entry
//! - strings are deduplicated into the shared strings table
//! - cell formats are deduplicated into a single stylesheet

pub mod shared_strings;
pub mod styles;
pub mod workbook;
pub mod xml_writer;

use crate::error::Result;
use std::path::Path;

pub use s_zip::{CompressionMethod, StreamingZipReader, StreamingZipWriter};
pub use shared_strings::SharedStrings;
pub use styles::StyleRegistry;
pub use workbook::{FastWorkbook, MAX_COLS, MAX_ROWS};
pub use xml_writer::XmlWriter;

/// Create a workbook writer at `path`
///
/// # Examples
///
/// ```no_run
/// use sheetstream::fast_writer::create_fast_writer;
///
/// let mut workbook = create_fast_writer("output.xlsx")?;
/// workbook.add_worksheet("Sheet1")?;
/// workbook.write_values(&["Name".into(), "Age".into()])?;
/// workbook.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn create_fast_writer<P: AsRef<Path>>(path: P) -> Result<FastWorkbook> {
    FastWorkbook::new(path)
}
