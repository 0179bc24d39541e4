//! Presentation settings: number formats, cell styles and style targets

use crate::error::{ExcelError, Result};
use std::fmt;
use std::str::FromStr;

/// Display format attached to a cell
///
/// Named kinds map to the format codes Excel ships with; `Custom` carries any
/// other format code verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberFormat {
    /// General
    #[default]
    General,
    /// Text (@)
    Text,
    /// Whole number (0)
    Integer,
    /// Two decimals (0.00)
    Decimal2,
    /// Thousand separator (#,##0)
    Thousands,
    /// Thousand separator with two decimals (#,##0.00)
    Numeric,
    /// Percentage (0%)
    Percent,
    /// Percentage with two decimals (0.00%)
    Percent2,
    /// ISO date (yyyy-mm-dd)
    Date,
    /// ISO date and time (yyyy-mm-dd hh:mm:ss)
    DateTime,
    /// Raw format code
    Custom(String),
}

/// Format codes predefined by SpreadsheetML, by numFmtId
const BUILTIN_FORMATS: &[(u32, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

/// Look up the code of a predefined numFmtId
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    BUILTIN_FORMATS
        .iter()
        .find(|(builtin, _)| *builtin == id)
        .map(|(_, code)| *code)
}

impl NumberFormat {
    /// The format code written to styles.xml
    pub fn code(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::Text => "@",
            NumberFormat::Integer => "0",
            NumberFormat::Decimal2 => "0.00",
            NumberFormat::Thousands => "#,##0",
            NumberFormat::Numeric => "#,##0.00",
            NumberFormat::Percent => "0%",
            NumberFormat::Percent2 => "0.00%",
            NumberFormat::Date => "yyyy-mm-dd",
            NumberFormat::DateTime => "yyyy-mm-dd hh:mm:ss",
            NumberFormat::Custom(code) => code,
        }
    }

    /// numFmtId when the code is one of the predefined formats
    pub fn builtin_id(&self) -> Option<u32> {
        let code = self.code();
        BUILTIN_FORMATS
            .iter()
            .find(|(_, builtin)| *builtin == code)
            .map(|(id, _)| *id)
    }
}

impl From<&str> for NumberFormat {
    fn from(code: &str) -> Self {
        NumberFormat::Custom(code.to_string())
    }
}

/// ARGB color, stored as 8 uppercase hex digits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(String);

impl Color {
    /// Parse "RRGGBB" (opaque) or "AARRGGBB", with or without a leading '#'
    pub fn new(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ExcelError::InvalidColor(hex.to_string()));
        }
        match digits.len() {
            6 => Ok(Color(format!("FF{}", digits.to_ascii_uppercase()))),
            8 => Ok(Color(digits.to_ascii_uppercase())),
            _ => Err(ExcelError::InvalidColor(hex.to_string())),
        }
    }

    /// Full ARGB value
    pub fn argb(&self) -> &str {
        &self.0
    }

    /// RGB part without alpha
    pub fn rgb(&self) -> &str {
        &self.0[2..]
    }
}

impl FromStr for Color {
    type Err = ExcelError;

    fn from_str(s: &str) -> Result<Self> {
        Color::new(s)
    }
}

/// Font attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Color>,
}

/// Horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HorizontalAlignment {
    General,
    Left,
    Center,
    Right,
    Justify,
}

impl HorizontalAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            HorizontalAlignment::General => "general",
            HorizontalAlignment::Left => "left",
            HorizontalAlignment::Center => "center",
            HorizontalAlignment::Right => "right",
            HorizontalAlignment::Justify => "justify",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "general" => Some(HorizontalAlignment::General),
            "left" => Some(HorizontalAlignment::Left),
            "center" => Some(HorizontalAlignment::Center),
            "right" => Some(HorizontalAlignment::Right),
            "justify" => Some(HorizontalAlignment::Justify),
            _ => None,
        }
    }
}

/// Border line style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    DashDot,
    Hair,
}

impl BorderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::Thin => "thin",
            BorderStyle::Medium => "medium",
            BorderStyle::Thick => "thick",
            BorderStyle::Dashed => "dashed",
            BorderStyle::Dotted => "dotted",
            BorderStyle::Double => "double",
            BorderStyle::DashDot => "dashDot",
            BorderStyle::Hair => "hair",
        }
    }
}

/// Border per side; `None` leaves the side undrawn
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Borders {
    pub left: Option<BorderStyle>,
    pub right: Option<BorderStyle>,
    pub top: Option<BorderStyle>,
    pub bottom: Option<BorderStyle>,
}

impl Borders {
    /// Same style on all four sides
    pub fn all(style: BorderStyle) -> Self {
        Borders {
            left: Some(style),
            right: Some(style),
            top: Some(style),
            bottom: Some(style),
        }
    }

    fn merge(&self, other: &Borders) -> Borders {
        Borders {
            left: other.left.or(self.left),
            right: other.right.or(self.right),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
        }
    }
}

/// Cell background
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fill {
    /// Solid color
    Solid { color: Color },
    /// Linear gradient between two colors, rotated by `rotation` degrees
    Gradient {
        rotation: f64,
        start: Color,
        end: Color,
    },
}

impl Fill {
    /// Color shown first: the solid color or the gradient start
    pub fn start_color(&self) -> &Color {
        match self {
            Fill::Solid { color } => color,
            Fill::Gradient { start, .. } => start,
        }
    }
}

// Rotation is compared and hashed by its bit pattern
impl Eq for Fill {}

impl std::hash::Hash for Fill {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Fill::Solid { color } => {
                0u8.hash(state);
                color.hash(state);
            }
            Fill::Gradient {
                rotation,
                start,
                end,
            } => {
                1u8.hash(state);
                rotation.to_bits().hash(state);
                start.hash(state);
                end.hash(state);
            }
        }
    }
}

/// Structured cell style
///
/// Every part is optional; unset parts fall back to the workbook default.
///
/// # Examples
///
/// ```
/// use sheetstream::style::{BorderStyle, Color, Fill, HorizontalAlignment, StyleSpec};
///
/// let style = StyleSpec::new()
///     .bold()
///     .align(HorizontalAlignment::Right)
///     .border_top(BorderStyle::Thin)
///     .fill(Fill::Solid { color: Color::new("FFFF00").unwrap() });
/// assert!(style.font.unwrap().bold);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleSpec {
    pub font: Option<FontStyle>,
    pub alignment: Option<HorizontalAlignment>,
    pub borders: Option<Borders>,
    pub fill: Option<Fill>,
}

impl StyleSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bold font
    pub fn bold(mut self) -> Self {
        self.font.get_or_insert_with(FontStyle::default).bold = true;
        self
    }

    /// Italic font
    pub fn italic(mut self) -> Self {
        self.font.get_or_insert_with(FontStyle::default).italic = true;
        self
    }

    /// Font color
    pub fn font_color(mut self, color: Color) -> Self {
        self.font.get_or_insert_with(FontStyle::default).color = Some(color);
        self
    }

    /// Horizontal alignment
    pub fn align(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Top border
    pub fn border_top(mut self, style: BorderStyle) -> Self {
        self.borders.get_or_insert_with(Borders::default).top = Some(style);
        self
    }

    /// Bottom border
    pub fn border_bottom(mut self, style: BorderStyle) -> Self {
        self.borders.get_or_insert_with(Borders::default).bottom = Some(style);
        self
    }

    /// All four borders
    pub fn borders(mut self, borders: Borders) -> Self {
        self.borders = Some(borders);
        self
    }

    /// Background fill
    pub fn fill(mut self, fill: Fill) -> Self {
        self.fill = Some(fill);
        self
    }

    /// Overlay `other` on top of `self`; set parts of `other` win
    pub fn merge(&self, other: &StyleSpec) -> StyleSpec {
        StyleSpec {
            font: other.font.clone().or_else(|| self.font.clone()),
            alignment: other.alignment.or(self.alignment),
            borders: match (&self.borders, &other.borders) {
                (Some(base), Some(over)) => Some(base.merge(over)),
                (base, over) => over.clone().or_else(|| base.clone()),
            },
            fill: other.fill.clone().or_else(|| self.fill.clone()),
        }
    }

    /// True when nothing is set
    pub fn is_empty(&self) -> bool {
        self.font.is_none() && self.alignment.is_none() && self.borders.is_none() && self.fill.is_none()
    }

    /// Reject values that cannot be written to a stylesheet
    pub fn validate(&self) -> Result<()> {
        match &self.fill {
            Some(Fill::Gradient { rotation, .. }) if !rotation.is_finite() => {
                Err(ExcelError::InvalidGradientRotation(*rotation))
            }
            _ => Ok(()),
        }
    }
}

/// Which cells a style applies to
///
/// Parsed from the keys `COL` (header cell), `COL:*` (all cells below the
/// header) and `COL:N` (the cell of COL on 1-based sheet row N).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleTarget {
    Header(String),
    Column(String),
    Cell { column: String, row: u32 },
}

impl StyleTarget {
    /// Parse `key`, treating an exact header name as a header target
    ///
    /// Lets header columns whose names contain `:` be styled by name.
    pub fn for_header(key: &str, header: &[String]) -> Result<Self> {
        if header.iter().any(|column| column == key) {
            return Ok(StyleTarget::Header(key.to_string()));
        }
        key.parse()
    }

    /// Column the target refers to
    pub fn column(&self) -> &str {
        match self {
            StyleTarget::Header(column) | StyleTarget::Column(column) => column,
            StyleTarget::Cell { column, .. } => column,
        }
    }
}

impl FromStr for StyleTarget {
    type Err = ExcelError;

    fn from_str(key: &str) -> Result<Self> {
        let target = match key.rsplit_once(':') {
            None => StyleTarget::Header(key.to_string()),
            Some((column, "*")) => StyleTarget::Column(column.to_string()),
            Some((column, row)) => match row.parse::<u32>() {
                Ok(row) if row > 0 => StyleTarget::Cell {
                    column: column.to_string(),
                    row,
                },
                _ => return Err(ExcelError::InvalidStyleTarget(key.to_string())),
            },
        };

        if target.column().is_empty() {
            return Err(ExcelError::InvalidStyleTarget(key.to_string()));
        }
        Ok(target)
    }
}

impl fmt::Display for StyleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleTarget::Header(column) => write!(f, "{}", column),
            StyleTarget::Column(column) => write!(f, "{}:*", column),
            StyleTarget::Cell { column, row } => write!(f, "{}:{}", column, row),
        }
    }
}
