use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use indexmap::IndexMap;
use sheetstream::fast_writer::FastWorkbook;
use sheetstream::{
    build_advanced, build_simple, split_sheet, AdvancedColumns, BuildOptions, CellValue, DataType,
    NumberFormat, Record, StreamingReader, Totals, WritePolicy,
};
use std::path::Path;
use tempfile::tempdir;

fn records(size: usize) -> Vec<Record> {
    (0..size)
        .map(|i| {
            let mut row = Record::new();
            row.insert("ID".to_string(), i.to_string());
            row.insert("CUSIP".to_string(), format!("{:09}", i));
            row.insert("ACTION".to_string(), if i % 2 == 0 { "BUY" } else { "SELL" }.to_string());
            row.insert("PRICE".to_string(), format!("{}.25", i % 1000));
            row
        })
        .collect()
}

fn overwrite() -> BuildOptions {
    BuildOptions::new().write_policy(WritePolicy::Overwrite)
}

fn write_fixture(path: &Path, size: usize) {
    build_simple(&records(size), &Totals::new(), "Trades", path, &overwrite(), &["ID", "PRICE"], &IndexMap::new())
        .unwrap();
}

fn benchmark_build_simple(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_simple");
    let dir = tempdir().unwrap();
    let path = dir.path().join("simple.xlsx");

    for size in [100, 1000, 10000, 100000].iter() {
        let rows = records(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                build_simple(&rows, &Totals::new(), "Trades", &path, &overwrite(), &["ID", "PRICE"], &IndexMap::new())
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_build_advanced(c: &mut Criterion) {
    let rows = records(10000);
    let columns = AdvancedColumns::new()
        .column_type("PRICE", DataType::Numeric)
        .number_format("PRICE", NumberFormat::Numeric)
        .column_width("CUSIP", 14.0)
        .freeze_header(true);
    let dir = tempdir().unwrap();
    let path = dir.path().join("advanced.xlsx");

    c.bench_function("build_advanced_10000_rows", |b| {
        b.iter(|| {
            build_advanced(&rows, &Totals::new(), "Trades", &path, &overwrite(), &columns).unwrap();
        });
    });
}

fn benchmark_fast_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("fast_write");
    let dir = tempdir().unwrap();
    let path = dir.path().join("fast.xlsx");

    for size in [1000, 10000, 100000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut workbook = FastWorkbook::new(&path).unwrap();
                workbook.add_worksheet("Sheet1").unwrap();
                workbook
                    .write_values(&["ID".into(), "Name".into(), "Value".into()])
                    .unwrap();
                for i in 0..size {
                    workbook
                        .write_values(&[
                            CellValue::Number(i as f64),
                            CellValue::Text(format!("Name_{}", i)),
                            CellValue::Number(i as f64 * 1.5),
                        ])
                        .unwrap();
                }
                workbook.close().unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    let dir = tempdir().unwrap();

    for size in [1000, 10000, 100000].iter() {
        let path = dir.path().join(format!("read_{}.xlsx", size));
        write_fixture(&path, *size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut reader = StreamingReader::open(&path).unwrap();
                for row in reader.rows_by_index(0).unwrap() {
                    black_box(row.unwrap());
                }
            });
        });
    }

    group.finish();
}

fn benchmark_split(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("split.xlsx");
    write_fixture(&path, 50000);

    c.bench_function("split_50000_rows_by_10000", |b| {
        b.iter(|| black_box(split_sheet(&path, 0, 10000).unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_build_simple,
    benchmark_build_advanced,
    benchmark_fast_write,
    benchmark_read,
    benchmark_split
);
criterion_main!(benches);
