//! Build options, document metadata and sheet layout

use crate::columns::{ColumnTypes, DataType};
use crate::error::{ExcelError, Result};
use crate::style::{NumberFormat, StyleSpec, StyleTarget};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// What to do when the output path already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WritePolicy {
    /// Replace the existing file
    Overwrite,
    /// Write next to it as `stem-1.ext`, `stem-2.ext`, ...
    #[default]
    Unique,
}

impl WritePolicy {
    /// Path the writer should create for the requested `path`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match self {
            WritePolicy::Overwrite => path.to_path_buf(),
            WritePolicy::Unique => {
                if !path.exists() {
                    return path.to_path_buf();
                }
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let extension = path.extension().map(|e| e.to_string_lossy().to_string());

                let mut counter = 1u32;
                loop {
                    let file_name = match &extension {
                        Some(ext) => format!("{}-{}.{}", stem, counter, ext),
                        None => format!("{}-{}", stem, counter),
                    };
                    let candidate = path.with_file_name(file_name);
                    if !candidate.exists() {
                        return candidate;
                    }
                    counter += 1;
                }
            }
        }
    }
}

/// Metadata stored in docProps/core.xml
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

/// Options shared by every build
///
/// # Examples
///
/// ```
/// use sheetstream::options::{BuildOptions, WritePolicy};
///
/// let options = BuildOptions::new()
///     .description("Daily trades")
///     .write_policy(WritePolicy::Overwrite);
/// assert_eq!(options.properties.description.as_deref(), Some("Daily trades"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildOptions {
    pub properties: DocumentProperties,
    pub write_policy: WritePolicy,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document description
    pub fn description(mut self, description: &str) -> Self {
        self.properties.description = Some(description.to_string());
        self
    }

    /// Document title
    pub fn title(mut self, title: &str) -> Self {
        self.properties.title = Some(title.to_string());
        self
    }

    /// Document subject
    pub fn subject(mut self, subject: &str) -> Self {
        self.properties.subject = Some(subject.to_string());
        self
    }

    /// Document author
    pub fn creator(mut self, creator: &str) -> Self {
        self.properties.creator = Some(creator.to_string());
        self
    }

    /// Document keywords
    pub fn keywords(mut self, keywords: &str) -> Self {
        self.properties.keywords = Some(keywords.to_string());
        self
    }

    /// Behavior when the output path exists
    pub fn write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }
}

/// Column settings accepted by the advanced build
///
/// Style keys use the `COL`, `COL:*` and `COL:<row>` syntax, see
/// [`StyleTarget`].
#[derive(Debug, Clone, Default)]
pub struct AdvancedColumns {
    pub column_types: IndexMap<String, DataType>,
    pub number_formats: IndexMap<String, NumberFormat>,
    pub column_widths: IndexMap<String, f64>,
    pub styles: IndexMap<String, StyleSpec>,
    pub freeze_header: bool,
}

impl AdvancedColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_type(mut self, column: &str, data_type: DataType) -> Self {
        self.column_types.insert(column.to_string(), data_type);
        self
    }

    pub fn number_format(mut self, column: &str, format: NumberFormat) -> Self {
        self.number_formats.insert(column.to_string(), format);
        self
    }

    pub fn column_width(mut self, column: &str, width: f64) -> Self {
        self.column_widths.insert(column.to_string(), width);
        self
    }

    pub fn style(mut self, target: &str, style: StyleSpec) -> Self {
        self.styles.insert(target.to_string(), style);
        self
    }

    pub fn freeze_header(mut self, freeze: bool) -> Self {
        self.freeze_header = freeze;
        self
    }
}

/// Widest column spreadsheet applications accept, in characters
pub const MAX_COLUMN_WIDTH: f64 = 255.0;

/// Check a column width against `0..=MAX_COLUMN_WIDTH`
pub fn validate_column_width(column: &str, width: f64) -> Result<()> {
    if width.is_finite() && (0.0..=MAX_COLUMN_WIDTH).contains(&width) {
        Ok(())
    } else {
        Err(ExcelError::InvalidColumnWidth {
            column: column.to_string(),
            width,
        })
    }
}

/// Presentation of one sheet, validated against its header
#[derive(Debug, Clone, Default)]
pub struct SheetLayout {
    pub(crate) column_widths: Vec<(u32, f64)>,
    pub(crate) styles: Vec<(StyleTarget, StyleSpec)>,
    pub(crate) freeze_header: bool,
}

impl SheetLayout {
    /// Layout without widths, styles or frozen panes
    pub fn plain() -> Self {
        Self::default()
    }

    /// Check widths and style targets against `header`
    pub fn resolve(
        header: &[String],
        column_widths: &IndexMap<String, f64>,
        styles: &IndexMap<String, StyleSpec>,
        freeze_header: bool,
    ) -> Result<Self> {
        ColumnTypes::validate_names(header, column_widths.keys(), "column widths")?;
        for (name, width) in column_widths {
            validate_column_width(name, *width)?;
        }

        let column_widths = column_widths
            .iter()
            .filter_map(|(name, width)| {
                header
                    .iter()
                    .position(|column| column == name)
                    .map(|idx| (idx as u32, *width))
            })
            .collect();

        let mut resolved = Vec::with_capacity(styles.len());
        for (key, style) in styles {
            let target = StyleTarget::for_header(key, header)?;
            ColumnTypes::validate_names(header, [target.column()], "styles")?;
            style.validate()?;
            resolved.push((target, style.clone()));
        }

        Ok(SheetLayout {
            column_widths,
            styles: resolved,
            freeze_header,
        })
    }

    /// True when a `COL:<row>` style targets this cell
    pub fn has_cell_style(&self, column: &str, row: u32) -> bool {
        self.styles.iter().any(|(target, _)| {
            matches!(target, StyleTarget::Cell { column: name, row: target_row }
                if name == column && *target_row == row)
        })
    }

    /// Style for the cell of `column` on 1-based sheet `row`
    ///
    /// Column-wide styles apply first, then header and single-cell styles.
    pub fn style_for(&self, column: &str, row: u32, is_header: bool) -> StyleSpec {
        let mut style = StyleSpec::default();
        for (target, spec) in &self.styles {
            if let StyleTarget::Column(name) = target {
                if name == column && !is_header {
                    style = style.merge(spec);
                }
            }
        }
        for (target, spec) in &self.styles {
            let hit = match target {
                StyleTarget::Header(name) => is_header && name == column,
                StyleTarget::Cell { column: name, row: target_row } => {
                    name == column && *target_row == row
                }
                StyleTarget::Column(_) => false,
            };
            if hit {
                style = style.merge(spec);
            }
        }
        style
    }
}
