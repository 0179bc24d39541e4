//! Per-column typing and number formats

use crate::error::{ExcelError, Result};
use crate::style::NumberFormat;
use crate::types::CellValue;
use indexmap::IndexMap;

/// How values of a column are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// Literal text, never coerced
    String,
    /// Parsed to a number at write time
    Numeric,
    /// Written as a formula expression
    Formula,
}

/// Resolved settings of one column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSpec {
    pub data_type: Option<DataType>,
    pub format: Option<NumberFormat>,
}

/// Column settings for a whole table, validated against its header
#[derive(Debug, Clone, Default)]
pub struct ColumnTypes {
    columns: IndexMap<String, ColumnSpec>,
}

impl ColumnTypes {
    /// Validate the three column maps against `header` and merge them
    ///
    /// Names listed in `numeric_columns` become `DataType::Numeric` unless
    /// `column_data_types` says otherwise.
    pub fn resolve<S: AsRef<str>>(
        header: &[String],
        column_data_types: &IndexMap<String, DataType>,
        number_formats: &IndexMap<String, NumberFormat>,
        numeric_columns: &[S],
    ) -> Result<Self> {
        Self::validate_names(header, column_data_types.keys(), "column data types")?;
        Self::validate_names(header, number_formats.keys(), "number formats")?;
        Self::validate_names(header, numeric_columns, "numeric columns")?;

        let mut columns: IndexMap<String, ColumnSpec> = header
            .iter()
            .map(|name| (name.clone(), ColumnSpec::default()))
            .collect();

        for name in numeric_columns {
            if let Some(spec) = columns.get_mut(name.as_ref()) {
                spec.data_type = Some(DataType::Numeric);
            }
        }
        for (name, data_type) in column_data_types {
            if let Some(spec) = columns.get_mut(name) {
                spec.data_type = Some(*data_type);
            }
        }
        for (name, format) in number_formats {
            if let Some(spec) = columns.get_mut(name) {
                spec.format = Some(format.clone());
            }
        }

        Ok(ColumnTypes { columns })
    }

    /// Fail with `UnknownColumn` on the first name missing from `header`
    pub fn validate_names<I, S>(header: &[String], names: I, context: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            if !header.iter().any(|column| column == name) {
                return Err(ExcelError::unknown_column(name, context));
            }
        }
        Ok(())
    }

    /// Settings of a column, if it is part of the header
    pub fn get(&self, column: &str) -> Option<&ColumnSpec> {
        self.columns.get(column)
    }

    /// Number format of a column, if one was given
    pub fn format(&self, column: &str) -> Option<&NumberFormat> {
        self.columns.get(column).and_then(|spec| spec.format.as_ref())
    }

    /// Convert a raw record value into the cell written for `column`
    ///
    /// `row` is the 0-based sheet row, used in error messages.
    pub fn cell(&self, column: &str, value: &str, row: usize) -> Result<CellValue> {
        let data_type = self.columns.get(column).and_then(|spec| spec.data_type);

        match data_type {
            Some(DataType::Numeric) => {
                if value.trim().is_empty() {
                    return Ok(CellValue::Empty);
                }
                parse_numeric(value)
                    .map(CellValue::Number)
                    .ok_or_else(|| ExcelError::InvalidNumericValue {
                        row,
                        column: column.to_string(),
                        value: value.to_string(),
                    })
            }
            Some(DataType::Formula) => {
                let expression = value.trim();
                if expression.is_empty() {
                    Ok(CellValue::Empty)
                } else if expression.starts_with('=') {
                    Ok(CellValue::Formula(expression.to_string()))
                } else {
                    Ok(CellValue::Formula(format!("={}", expression)))
                }
            }
            Some(DataType::String) | None => {
                if value.is_empty() {
                    Ok(CellValue::Empty)
                } else {
                    Ok(CellValue::Text(value.to_string()))
                }
            }
        }
    }
}

/// Parse text made of an optional sign, digits and at most one decimal point
///
/// Surrounding whitespace is ignored; exponents, thousand separators and
/// special values like "inf" are rejected.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);

    let mut digits = 0usize;
    let mut points = 0usize;
    for ch in unsigned.chars() {
        match ch {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return None,
        }
    }
    if digits == 0 || points > 1 {
        return None;
    }

    trimmed.parse::<f64>().ok()
}
