//! Split one sheet into several workbooks of bounded size

use crate::error::{ExcelError, Result};
use crate::options::{BuildOptions, SheetLayout, WritePolicy};
use crate::streaming_reader::StreamingReader;
use crate::types::CellValue;
use crate::writer::ExcelWriter;
use log::debug;
use std::path::{Path, PathBuf};

/// Split the sheet at `sheet_index` into files of at most `max_rows_per_file`
/// data rows each
///
/// Every output repeats the header row and is named `<stem>_001.xlsx`,
/// `<stem>_002.xlsx`, ... next to the source. Existing outputs are replaced.
/// Numbered files beyond this run's count, left by an earlier split into
/// more parts, are not removed; only the returned paths belong to this run.
///
/// # Examples
///
/// ```no_run
/// use sheetstream::splitter::split_sheet;
///
/// let parts = split_sheet("trades.xlsx", 0, 50_000)?;
/// println!("wrote {} files", parts.len());
/// # Ok::<(), sheetstream::ExcelError>(())
/// ```
pub fn split_sheet<P: AsRef<Path>>(
    source: P,
    sheet_index: usize,
    max_rows_per_file: usize,
) -> Result<Vec<PathBuf>> {
    split_sheet_with(source, sheet_index, max_rows_per_file, WritePolicy::Overwrite)
}

/// [`split_sheet`] with an explicit policy for existing output files
pub fn split_sheet_with<P: AsRef<Path>>(
    source: P,
    sheet_index: usize,
    max_rows_per_file: usize,
    policy: WritePolicy,
) -> Result<Vec<PathBuf>> {
    if max_rows_per_file == 0 {
        return Err(ExcelError::InvalidChunkSize(max_rows_per_file));
    }

    let source = source.as_ref();
    let mut reader = StreamingReader::open(source)?;
    let sheet_name = reader.sheet_name(sheet_index)?;
    let options = BuildOptions {
        properties: reader.properties()?,
        write_policy: policy,
    };

    let mut chunks = ChunkSink {
        source,
        sheet_name: &sheet_name,
        options: &options,
        max_rows: max_rows_per_file,
        header: Vec::new(),
        current: None,
        rows_in_current: 0,
        outputs: Vec::new(),
    };

    let mut rows = reader.rows(&sheet_name)?;
    let mut expected_index = 0u32;
    if let Some(first) = rows.next() {
        let first = first?;
        expected_index = first.index + 1;
        chunks.header = first.cells;
    }

    // Missing row numbers below the header are written as empty rows so
    // row positions survive the split
    for row in rows {
        let row = row?;
        while expected_index < row.index {
            chunks.push(&[])?;
            expected_index += 1;
        }
        chunks.push(&row.cells)?;
        expected_index = row.index + 1;
    }

    let outputs = chunks.finish()?;
    debug!(
        "Split sheet '{}' of {} into {} files",
        sheet_name,
        source.display(),
        outputs.len()
    );
    Ok(outputs)
}

/// Path of the `number`-th (1-based) output for `source`
pub fn chunk_path(source: &Path, number: usize) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "sheet".to_string());
    source.with_file_name(format!("{}_{:03}.xlsx", stem, number))
}

struct ChunkSink<'a> {
    source: &'a Path,
    sheet_name: &'a str,
    options: &'a BuildOptions,
    max_rows: usize,
    header: Vec<CellValue>,
    current: Option<ExcelWriter>,
    rows_in_current: usize,
    outputs: Vec<PathBuf>,
}

impl ChunkSink<'_> {
    fn push(&mut self, cells: &[CellValue]) -> Result<()> {
        if self.current.is_none() || self.rows_in_current == self.max_rows {
            self.rotate()?;
        }
        self.rows_in_current += 1;
        match self.current.as_mut() {
            Some(writer) => writer.write_row_typed(cells),
            None => Err(ExcelError::InvalidState("No open chunk".to_string())),
        }
    }

    fn rotate(&mut self) -> Result<()> {
        self.close_current()?;

        let number = self.outputs.len() + 1;
        let mut writer = ExcelWriter::create(chunk_path(self.source, number), self.options)?;
        writer.add_sheet(self.sheet_name, &SheetLayout::plain())?;
        if !self.header.is_empty() {
            writer.write_row_typed(&self.header)?;
        }
        debug!("Opened chunk {} at {}", number, writer.path().display());

        self.current = Some(writer);
        self.rows_in_current = 0;
        Ok(())
    }

    fn close_current(&mut self) -> Result<()> {
        if let Some(writer) = self.current.take() {
            let path = writer.save()?;
            debug!("Closed chunk {} with {} rows", path.display(), self.rows_in_current);
            self.outputs.push(path);
        }
        Ok(())
    }

    /// A sheet without data rows still yields one header-only file
    fn finish(mut self) -> Result<Vec<PathBuf>> {
        if self.current.is_none() && self.outputs.is_empty() {
            self.rotate()?;
        }
        self.close_current()?;
        Ok(self.outputs)
    }
}
