//! In-memory table: header, data rows and totals footer

use crate::error::{ExcelError, Result};
use indexmap::IndexMap;

/// One input row, keyed by column name in insertion order
pub type Record = IndexMap<String, String>;

/// Totals block: column name to a single value or a list spread over footer rows
pub type Totals = IndexMap<String, TotalValue>;

/// Value of one totals column
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum TotalValue {
    /// Written on the first footer row only
    Scalar(String),
    /// Written one value per footer row, in order
    List(Vec<String>),
}

impl From<&str> for TotalValue {
    fn from(value: &str) -> Self {
        TotalValue::Scalar(value.to_string())
    }
}

impl From<String> for TotalValue {
    fn from(value: String) -> Self {
        TotalValue::Scalar(value)
    }
}

impl From<Vec<&str>> for TotalValue {
    fn from(values: Vec<&str>) -> Self {
        TotalValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for TotalValue {
    fn from(values: Vec<String>) -> Self {
        TotalValue::List(values)
    }
}

/// Maximum sheet name length accepted by spreadsheet applications
const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Check a sheet name against the XLSX rules
pub fn validate_sheet_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ExcelError::EmptySheetName);
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(ExcelError::InvalidSheetName {
            name: name.to_string(),
            reason: format!("longer than {} characters", MAX_SHEET_NAME_LEN),
        });
    }
    if name.chars().any(char::is_control) {
        return Err(ExcelError::InvalidSheetName {
            name: name.to_string(),
            reason: "contains control characters".to_string(),
        });
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
        return Err(ExcelError::InvalidSheetName {
            name: name.to_string(),
            reason: format!("contains forbidden character '{}'", ch),
        });
    }
    Ok(())
}

/// Header, data rows and footer rows ready to be written as one sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Record>,
    footer: Vec<Record>,
}

impl Table {
    /// Assemble a table from records and totals
    ///
    /// The header is taken from the keys of the first record. Every later
    /// record and the totals may only use header columns.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheetstream::table::{Record, Table, Totals, TotalValue};
    ///
    /// let mut row = Record::new();
    /// row.insert("CUSIP".into(), "123456789".into());
    /// row.insert("ACTION".into(), "BUY".into());
    ///
    /// let mut totals = Totals::new();
    /// totals.insert("ACTION".into(), TotalValue::from(vec!["A", "B"]));
    ///
    /// let table = Table::build("Trades", &[row], &totals)?;
    /// assert_eq!(table.header(), ["CUSIP", "ACTION"]);
    /// assert_eq!(table.footer().len(), 2);
    /// # Ok::<(), sheetstream::ExcelError>(())
    /// ```
    pub fn build(sheet_name: &str, rows: &[Record], totals: &Totals) -> Result<Self> {
        validate_sheet_name(sheet_name)?;

        let header: Vec<String> = rows
            .first()
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        for row in rows.iter().skip(1) {
            if let Some(key) = row.keys().find(|key| !header.contains(*key)) {
                return Err(ExcelError::unknown_column(key, "rows"));
            }
        }

        let footer = Self::expand_totals(&header, totals)?;

        Ok(Table {
            header,
            rows: rows.to_vec(),
            footer,
        })
    }

    /// Spread the totals block over as many footer rows as its longest list
    fn expand_totals(header: &[String], totals: &Totals) -> Result<Vec<Record>> {
        if let Some(key) = totals.keys().find(|key| !header.contains(*key)) {
            return Err(ExcelError::unknown_column(key, "totals"));
        }

        let footer_len = totals
            .values()
            .map(|value| match value {
                TotalValue::Scalar(_) => 1,
                TotalValue::List(values) => values.len(),
            })
            .max()
            .unwrap_or(0);

        // Walk the header so footer rows keep column order
        let mut footer = vec![Record::new(); footer_len];
        for column in header {
            match totals.get(column) {
                Some(TotalValue::Scalar(value)) => {
                    footer[0].insert(column.clone(), value.clone());
                }
                Some(TotalValue::List(values)) => {
                    for (row, value) in footer.iter_mut().zip(values) {
                        row.insert(column.clone(), value.clone());
                    }
                }
                None => {}
            }
        }

        Ok(footer)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn footer(&self) -> &[Record] {
        &self.footer
    }

    /// True when there is nothing to write
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty() && self.footer.is_empty()
    }

    /// Number of sheet rows the table occupies, header included
    pub fn sheet_row_count(&self) -> usize {
        let header = usize::from(!self.header.is_empty());
        header + self.rows.len() + self.footer.len()
    }
}
