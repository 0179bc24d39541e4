//! Integration tests for sheetstream

use indexmap::IndexMap;
use sheetstream::fast_writer::{FastWorkbook, StreamingZipReader};
use sheetstream::style::{Color, Fill, HorizontalAlignment, StyleSpec};
use sheetstream::{
    build_advanced, build_simple, line_count, read_as_array, sheet_name, split_sheet,
    AdvancedColumns, BuildOptions, CellValue, DataType, ExcelError, NumberFormat, Record,
    StreamingReader, TotalValue, Totals, WritePolicy,
};
use std::path::Path;
use tempfile::tempdir;

const HEADER: [&str; 5] = ["CUSIP", "DATE", "ACTION", "PRICE", "NEW PRICE"];

fn trade(i: usize) -> Record {
    let values = [
        format!("{:09}", 123456789 + i),
        "2024-01-15".to_string(),
        if i % 2 == 0 { "BUY" } else { "SELL" }.to_string(),
        format!("{}.5", 100 + i),
        format!("{}", 110 + i),
    ];
    HEADER
        .iter()
        .zip(values)
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn trades(n: usize) -> Vec<Record> {
    (0..n).map(trade).collect()
}

fn no_formats() -> IndexMap<String, NumberFormat> {
    IndexMap::new()
}

fn simple(rows: &[Record], totals: &Totals, path: &Path) -> sheetstream::Result<std::path::PathBuf> {
    build_simple(rows, totals, "test", path, &BuildOptions::new(), &[] as &[&str], &no_formats())
}

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

#[test]
fn test_header_round_trip() {
    let dir = tempdir().unwrap();
    let path = simple(&trades(2), &Totals::new(), &dir.path().join("trades.xlsx")).unwrap();

    let grid = read_as_array(&path, None).unwrap();
    assert_eq!(grid.len(), 3);
    assert_eq!(grid[0], HEADER.iter().map(|h| text(h)).collect::<Vec<_>>());
    assert_eq!(grid[1][2], text("BUY"));
    assert_eq!(grid[2][2], text("SELL"));
    // Untyped columns keep their literal text
    assert_eq!(grid[1][3], text("100.5"));
}

#[test]
fn test_second_build_writes_sibling_file() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("trades.xlsx");

    let first = simple(&trades(1), &Totals::new(), &target).unwrap();
    let second = simple(&trades(1), &Totals::new(), &target).unwrap();

    assert_eq!(first, target);
    assert_eq!(second, dir.path().join("trades-1.xlsx"));
    assert!(first.exists() && second.exists());

    let overwrite = BuildOptions::new().write_policy(WritePolicy::Overwrite);
    let third = build_simple(&trades(3), &Totals::new(), "test", &target, &overwrite, &[] as &[&str], &no_formats())
        .unwrap();
    assert_eq!(third, target);
    assert_eq!(line_count(&target, 0).unwrap(), 3);
}

#[test]
fn test_list_totals_become_footer_rows() {
    let dir = tempdir().unwrap();
    let mut totals = Totals::new();
    totals.insert("ACTION".to_string(), TotalValue::from(vec!["A", "B"]));
    totals.insert("CUSIP".to_string(), TotalValue::from("Total"));

    let path = simple(&trades(1), &totals, &dir.path().join("totals.xlsx")).unwrap();
    let grid = read_as_array(&path, Some("test")).unwrap();

    assert_eq!(grid.len(), 4);
    assert_eq!(grid[2][0], text("Total"));
    assert_eq!(grid[2][2], text("A"));
    assert_eq!(grid[3][0], CellValue::Empty);
    assert_eq!(grid[3][2], text("B"));
    assert_eq!(grid[3].len(), HEADER.len());
}

#[test]
fn test_unknown_totals_key_fails_before_writing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.xlsx");
    let mut totals = Totals::new();
    totals.insert("NotAColumn".to_string(), TotalValue::from("x"));

    let err = simple(&trades(1), &totals, &path).unwrap_err();
    assert!(matches!(err, ExcelError::UnknownColumn { ref column, ref context }
        if column == "NotAColumn" && context == "totals"));
    assert!(!path.exists());
}

#[test]
fn test_split_ten_rows_by_six() {
    let dir = tempdir().unwrap();
    let source = simple(&trades(10), &Totals::new(), &dir.path().join("split.xlsx")).unwrap();

    let parts = split_sheet(&source, 0, 6).unwrap();
    assert_eq!(
        parts,
        vec![dir.path().join("split_001.xlsx"), dir.path().join("split_002.xlsx")]
    );

    let first = read_as_array(&parts[0], None).unwrap();
    let second = read_as_array(&parts[1], None).unwrap();
    assert_eq!(first.len(), 7);
    assert_eq!(second.len(), 5);
    assert_eq!(first[0], second[0]);
    assert_eq!(first[0][0], text("CUSIP"));
    assert_eq!(second[1][0], text("123456795"));

    assert_eq!(line_count(&parts[0], 0).unwrap(), 6);
    assert_eq!(line_count(&parts[1], 0).unwrap(), 4);
    assert_eq!(sheet_name(&parts[1], 0).unwrap(), "test");

    // Repeated runs replace the same outputs
    assert_eq!(split_sheet(&source, 0, 6).unwrap(), parts);

    // A coarser split returns fewer parts and leaves older numbered files alone
    assert_eq!(split_sheet(&source, 0, 3).unwrap().len(), 4);
    let coarse = split_sheet(&source, 0, 10).unwrap();
    assert_eq!(coarse, vec![dir.path().join("split_001.xlsx")]);
    assert_eq!(line_count(&coarse[0], 0).unwrap(), 10);
    assert!(dir.path().join("split_004.xlsx").exists());
}

#[test]
fn test_split_keeps_types_and_handles_empty_sheets() {
    let dir = tempdir().unwrap();
    let source = build_simple(
        &trades(3),
        &Totals::new(),
        "test",
        dir.path().join("typed.xlsx"),
        &BuildOptions::new(),
        &["PRICE"],
        &no_formats(),
    )
    .unwrap();

    let parts = split_sheet(&source, 0, 100).unwrap();
    assert_eq!(parts.len(), 1);
    let grid = read_as_array(&parts[0], None).unwrap();
    assert_eq!(grid[1][3], CellValue::Number(100.5));

    let header_only = dir.path().join("header_only.xlsx");
    let mut workbook = FastWorkbook::new(&header_only).unwrap();
    workbook.add_worksheet("test").unwrap();
    workbook.write_values(&[text("CUSIP"), text("PRICE")]).unwrap();
    workbook.close().unwrap();

    let parts = split_sheet(&header_only, 0, 5).unwrap();
    assert_eq!(parts, vec![dir.path().join("header_only_001.xlsx")]);
    assert_eq!(read_as_array(&parts[0], None).unwrap(), vec![vec![text("CUSIP"), text("PRICE")]]);

    assert!(matches!(split_sheet(&source, 0, 0), Err(ExcelError::InvalidChunkSize(0))));
    assert!(matches!(split_sheet(&source, 3, 5), Err(ExcelError::SheetNotFound(_))));
}

#[test]
fn test_line_count_and_sheet_name() {
    let dir = tempdir().unwrap();
    let path = simple(&trades(10), &Totals::new(), &dir.path().join("count.xlsx")).unwrap();
    assert_eq!(line_count(&path, 0).unwrap(), 10);
    assert_eq!(sheet_name(&path, 0).unwrap(), "test");

    let empty = simple(&[], &Totals::new(), &dir.path().join("empty.xlsx")).unwrap();
    assert_eq!(line_count(&empty, 0).unwrap(), 0);
    assert!(read_as_array(&empty, None).unwrap().is_empty());

    assert!(matches!(sheet_name(&path, 1), Err(ExcelError::SheetNotFound(_))));
}

#[test]
fn test_document_description() {
    let dir = tempdir().unwrap();
    let options = BuildOptions::new()
        .description("Trades & totals")
        .creator("reports");
    let path = build_simple(
        &trades(1),
        &Totals::new(),
        "test",
        dir.path().join("meta.xlsx"),
        &options,
        &[] as &[&str],
        &no_formats(),
    )
    .unwrap();

    let properties = StreamingReader::open(&path).unwrap().properties().unwrap();
    assert_eq!(properties.description.as_deref(), Some("Trades & totals"));
    assert_eq!(properties.creator.as_deref(), Some("reports"));
    assert_eq!(properties.title, None);
}

#[test]
fn test_numeric_and_formula_columns() {
    let dir = tempdir().unwrap();
    let mut row = Record::new();
    row.insert("CUSIP".to_string(), "123456789".to_string());
    row.insert("PRICE".to_string(), "123.456".to_string());
    row.insert("NEW PRICE".to_string(), "150".to_string());
    row.insert("CHANGE".to_string(), "=(C2-B2)/B2".to_string());

    let columns = AdvancedColumns::new()
        .column_type("CUSIP", DataType::String)
        .column_type("PRICE", DataType::Numeric)
        .column_type("NEW PRICE", DataType::Numeric)
        .column_type("CHANGE", DataType::Formula)
        .number_format("CUSIP", NumberFormat::General)
        .number_format("PRICE", NumberFormat::Numeric)
        .number_format("CHANGE", NumberFormat::Percent2);

    let path = build_advanced(&[row], &Totals::new(), "test", dir.path().join("typed.xlsx"), &BuildOptions::new(), &columns)
        .unwrap();

    let grid = read_as_array(&path, None).unwrap();
    assert_eq!(grid[1][0], text("123456789"));
    assert_eq!(grid[1][1], CellValue::Number(123.456));
    assert_eq!(grid[1][2], CellValue::Number(150.0));
    assert_eq!(grid[1][3], CellValue::Formula("=(C2-B2)/B2".to_string()));

    let mut reader = StreamingReader::open(&path).unwrap();
    let cusip = reader.cell_style("test", "A2").unwrap().unwrap();
    assert_eq!(cusip.number_format, "General");
    let price = reader.cell_style("test", "B2").unwrap().unwrap();
    assert_eq!(price.number_format, "#,##0.00");
    let change = reader.cell_style("test", "D2").unwrap().unwrap();
    assert_eq!(change.number_format, "0.00%");
}

#[test]
fn test_invalid_numeric_value_removes_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_number.xlsx");

    let err = build_simple(&trades(2), &Totals::new(), "test", &path, &BuildOptions::new(), &["ACTION"], &no_formats())
        .unwrap_err();
    assert!(matches!(err, ExcelError::InvalidNumericValue { row: 1, ref value, .. } if value == "BUY"));
    assert!(!path.exists());
}

#[test]
fn test_numeric_columns_apply_to_totals() {
    let dir = tempdir().unwrap();
    let mut totals = Totals::new();
    totals.insert("PRICE".to_string(), TotalValue::from("987.654"));
    totals.insert("NEW PRICE".to_string(), TotalValue::from(vec!["1.5", "2"]));
    totals.insert("CUSIP".to_string(), TotalValue::from("Total"));

    let path = build_simple(&trades(1), &totals, "test", dir.path().join("numeric_totals.xlsx"), &BuildOptions::new(), &["PRICE", "NEW PRICE"], &no_formats())
        .unwrap();
    let grid = read_as_array(&path, None).unwrap();

    assert_eq!(grid.len(), 4);
    assert_eq!(grid[1][3], CellValue::Number(100.5));
    assert_eq!(grid[2][0], text("Total"));
    assert_eq!(grid[2][3], CellValue::Number(987.654));
    assert_eq!(grid[2][4], CellValue::Number(1.5));
    assert_eq!(grid[3][3], CellValue::Empty);
    assert_eq!(grid[3][4], CellValue::Number(2.0));
}

#[test]
fn test_non_numeric_totals_in_numeric_column_fail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_totals.xlsx");
    let mut totals = Totals::new();
    totals.insert("PRICE".to_string(), TotalValue::from(vec!["A", "B"]));

    let err = build_simple(&trades(1), &totals, "test", &path, &BuildOptions::new(), &["PRICE"], &no_formats())
        .unwrap_err();
    assert!(matches!(err, ExcelError::InvalidNumericValue { row: 2, ref column, ref value }
        if column == "PRICE" && value == "A"));
    assert!(!path.exists());
}

#[test]
fn test_advanced_styles() {
    let dir = tempdir().unwrap();
    let gradient = Fill::Gradient {
        rotation: 90.0,
        start: Color::new("A0A0A0").unwrap(),
        end: Color::new("FFFFFF").unwrap(),
    };
    let columns = AdvancedColumns::new()
        .style("CUSIP", StyleSpec::new().bold().fill(gradient))
        .style(
            "PRICE:*",
            StyleSpec::new().align(HorizontalAlignment::Right),
        )
        .style(
            "ACTION:3",
            StyleSpec::new().fill(Fill::Solid {
                color: Color::new("#ffff00").unwrap(),
            }),
        );

    let path = build_advanced(&trades(3), &Totals::new(), "test", dir.path().join("styled.xlsx"), &BuildOptions::new(), &columns)
        .unwrap();
    let mut reader = StreamingReader::open(&path).unwrap();

    let header = reader.cell_style("test", "A1").unwrap().unwrap();
    assert!(header.bold);
    assert_eq!(header.fill_color.as_deref(), Some("A0A0A0"));

    let data = reader.cell_style("test", "A2").unwrap().unwrap();
    assert!(!data.bold);
    assert_eq!(data.fill_color, None);

    let price = reader.cell_style("test", "D4").unwrap().unwrap();
    assert_eq!(price.horizontal, Some(HorizontalAlignment::Right));
    let price_header = reader.cell_style("test", "D1").unwrap().unwrap();
    assert_eq!(price_header.horizontal, None);

    let action = reader.cell_style("test", "C3").unwrap().unwrap();
    assert_eq!(action.fill_color.as_deref(), Some("FFFF00"));
    let other_action = reader.cell_style("test", "C2").unwrap().unwrap();
    assert_eq!(other_action.fill_color, None);

    assert_eq!(reader.cell_style("test", "Z99").unwrap(), None);

    let oversized = format!("{}Z1", "ZZZZZZ");
    let err = reader.cell_style("test", &oversized).unwrap_err();
    assert!(matches!(err, ExcelError::ReadError(_)));
}

#[test]
fn test_unknown_column_names_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unknown.xlsx");
    let build = |columns: &AdvancedColumns| {
        build_advanced(&trades(1), &Totals::new(), "test", &path, &BuildOptions::new(), columns)
    };

    let cases = [
        (AdvancedColumns::new().column_type("InvalidName", DataType::Formula), "column data types"),
        (AdvancedColumns::new().number_format("InvalidName", NumberFormat::General), "number formats"),
        (AdvancedColumns::new().column_width("InvalidName", 20.0), "column widths"),
        (AdvancedColumns::new().style("InvalidName:*", StyleSpec::new().bold()), "styles"),
    ];
    for (columns, expected) in &cases {
        let err = build(columns).unwrap_err();
        assert!(
            matches!(err, ExcelError::UnknownColumn { ref context, .. } if context == *expected),
            "unexpected error {err:?} for {expected}"
        );
    }

    let err = build_simple(&trades(1), &Totals::new(), "test", &path, &BuildOptions::new(), &["InvalidNumberColumnName"], &no_formats())
        .unwrap_err();
    assert!(matches!(err, ExcelError::UnknownColumn { ref context, .. } if context == "numeric columns"));

    let err = build(&AdvancedColumns::new().style("CUSIP:0", StyleSpec::new().bold())).unwrap_err();
    assert!(matches!(err, ExcelError::InvalidStyleTarget(_)));

    assert!(!path.exists());
}

#[test]
fn test_sheet_name_validation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("names.xlsx");
    let build = |name: &str| {
        build_simple(&trades(1), &Totals::new(), name, &path, &BuildOptions::new(), &[] as &[&str], &no_formats())
    };

    assert!(matches!(build(""), Err(ExcelError::EmptySheetName)));
    assert!(matches!(build("   "), Err(ExcelError::EmptySheetName)));
    assert!(matches!(build("a/b"), Err(ExcelError::InvalidSheetName { .. })));
    assert!(matches!(build(&"x".repeat(32)), Err(ExcelError::InvalidSheetName { .. })));
    assert!(!path.exists());
}

#[test]
fn test_ambiguous_sheet_reference() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("two_sheets.xlsx");

    let mut workbook = FastWorkbook::new(&path).unwrap();
    workbook.add_worksheet("First").unwrap();
    workbook.write_values(&[text("a")]).unwrap();
    workbook.add_worksheet("Second").unwrap();
    workbook.write_values(&[text("b"), CellValue::Bool(true)]).unwrap();
    workbook.close().unwrap();

    match read_as_array(&path, None) {
        Err(ExcelError::AmbiguousSheetReference { sheets }) => {
            assert_eq!(sheets, vec!["First".to_string(), "Second".to_string()]);
        }
        other => panic!("expected ambiguous sheet reference, got {other:?}"),
    }
    assert_eq!(
        read_as_array(&path, Some("Second")).unwrap(),
        vec![vec![text("b"), CellValue::Bool(true)]]
    );
    assert_eq!(sheet_name(&path, 1).unwrap(), "Second");
    assert!(matches!(read_as_array(&path, Some("Third")), Err(ExcelError::SheetNotFound(_))));
}

#[test]
fn test_layout_written_to_sheet_xml() {
    let dir = tempdir().unwrap();
    let columns = AdvancedColumns::new()
        .column_width("CUSIP", 25.0)
        .column_width("PRICE", 12.5)
        .freeze_header(true);
    let path = build_advanced(&trades(2), &Totals::new(), "test", dir.path().join("layout.xlsx"), &BuildOptions::new(), &columns)
        .unwrap();

    let mut zip = StreamingZipReader::open(&path).unwrap();
    let sheet = String::from_utf8(zip.read_entry_by_name("xl/worksheets/sheet1.xml").unwrap()).unwrap();
    assert!(sheet.contains("<pane ySplit=\"1\" topLeftCell=\"A2\" activePane=\"bottomLeft\" state=\"frozen\"/>"));
    assert!(sheet.contains("<col min=\"1\" max=\"1\" width=\"25\" customWidth=\"1\"/>"));
    assert!(sheet.contains("<col min=\"4\" max=\"4\" width=\"12.5\" customWidth=\"1\"/>"));

    // Layout never changes content
    assert_eq!(read_as_array(&path, None).unwrap().len(), 3);
}

#[test]
fn test_unwritable_layout_values_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_layout.xlsx");
    let build = |columns: &AdvancedColumns| {
        build_advanced(&trades(1), &Totals::new(), "test", &path, &BuildOptions::new(), columns)
    };

    let err = build(&AdvancedColumns::new().column_width("CUSIP", f64::NAN)).unwrap_err();
    assert!(matches!(err, ExcelError::InvalidColumnWidth { ref column, .. } if column == "CUSIP"));
    let err = build(&AdvancedColumns::new().column_width("DATE", -5.0)).unwrap_err();
    assert!(matches!(err, ExcelError::InvalidColumnWidth { width, .. } if width == -5.0));

    let gradient = Fill::Gradient {
        rotation: f64::INFINITY,
        start: Color::new("A0A0A0").unwrap(),
        end: Color::new("FFFFFF").unwrap(),
    };
    let err = build(&AdvancedColumns::new().style("CUSIP", StyleSpec::new().fill(gradient))).unwrap_err();
    assert!(matches!(err, ExcelError::InvalidGradientRotation(_)));

    assert!(!path.exists());
}

#[test]
fn test_unwritable_output_path() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"x").unwrap();

    let err = simple(&trades(1), &Totals::new(), &blocker.join("out.xlsx")).unwrap_err();
    assert!(matches!(err, ExcelError::OutputInitializationFailed { .. }));
}

#[test]
fn test_special_characters_round_trip() {
    let dir = tempdir().unwrap();
    let mut row = Record::new();
    row.insert("NOTE".to_string(), "<a & \"b\"> 'c'".to_string());
    row.insert("PADDED".to_string(), "  spaced  ".to_string());
    row.insert("UNICODE".to_string(), "Zürich 東京".to_string());

    let path = simple(&[row], &Totals::new(), &dir.path().join("chars.xlsx")).unwrap();
    let grid = read_as_array(&path, None).unwrap();
    assert_eq!(grid[1], vec![text("<a & \"b\"> 'c'"), text("  spaced  "), text("Zürich 東京")]);
}

#[test]
fn test_control_characters_round_trip() {
    let dir = tempdir().unwrap();
    let mut row = Record::new();
    row.insert("A\u{2}".to_string(), "x\u{1}y".to_string());
    row.insert("LITERAL".to_string(), "_x0041_ and _x005F_".to_string());
    row.insert("FORMULA".to_string(), "=\"a\u{7}\"&A2".to_string());

    let columns = AdvancedColumns::new().column_type("FORMULA", DataType::Formula);
    let options = BuildOptions::new().description("line\u{b}break");

    let path = build_advanced(&[row], &Totals::new(), "test", dir.path().join("controls.xlsx"), &options, &columns)
        .unwrap();

    let grid = read_as_array(&path, None).unwrap();
    assert_eq!(grid[0], vec![text("A\u{2}"), text("LITERAL"), text("FORMULA")]);
    assert_eq!(grid[1][0], text("x\u{1}y"));
    assert_eq!(grid[1][1], text("_x0041_ and _x005F_"));
    assert_eq!(grid[1][2], CellValue::Formula("=\"a\u{7}\"&A2".to_string()));

    let properties = StreamingReader::open(&path).unwrap().properties().unwrap();
    assert_eq!(properties.description.as_deref(), Some("line\u{b}break"));
}
