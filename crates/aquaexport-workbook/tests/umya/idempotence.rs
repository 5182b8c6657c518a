use crate::common::{Fixture, cell, day, number, record};
use aquaexport_workbook::{
    CellValue, DateRange, ExportOptions, Exporter, Measurements, MetricValue, Mode, UmyaDocument,
};

fn march(data: &mut Measurements) {
    for d in 1..=31 {
        let base = f64::from(d);
        record(
            data,
            "PK Barbat",
            day(2024, 3, d),
            &[
                ("temp", MetricValue::triple(base, base + 2.0, base + 1.0)),
                ("redox", MetricValue::triple(300.0, 320.0, 310.0)),
            ],
        );
    }
}

fn snapshot(path: &std::path::Path) -> Vec<Option<CellValue>> {
    let doc = UmyaDocument::open_path(path).unwrap();
    let mut out = Vec::new();
    for row in 11..=45 {
        for col in 1..=17 {
            out.push(doc.read_cell("P-03", aquaexport_workbook::CellRef { row, col }));
        }
    }
    out
}

#[test]
fn rerunning_the_same_export_converges() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);
    let mut data = Measurements::new();
    march(&mut data);
    let range = DateRange::new(day(2024, 3, 1), day(2024, 3, 31)).unwrap();

    let first = exporter
        .run(Mode::Quality, &range, &data, ExportOptions::default())
        .unwrap();
    let path = fixture.document(Mode::Quality, 2024);
    let after_first = snapshot(&path);

    let second = exporter
        .run(Mode::Quality, &range, &data, ExportOptions::default())
        .unwrap();
    let after_second = snapshot(&path);

    assert!(first.years[0].created);
    assert!(!second.years[0].created);
    assert_eq!(first.cells_written, second.cells_written);
    assert_eq!(after_first, after_second);
    assert_eq!(cell(&path, "P-03", "A43"), number(31.0));
    assert_eq!(cell(&path, "P-03", "I43"), number(33.0));
}

#[test]
fn existing_documents_are_not_restamped() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);
    let mut data = Measurements::new();
    march(&mut data);
    let range = DateRange::single(day(2024, 3, 10));

    exporter
        .run(Mode::Quality, &range, &data, ExportOptions::default())
        .unwrap();
    let path = fixture.document(Mode::Quality, 2024);

    // Someone edits the marker by hand between runs.
    let mut book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    book.get_sheet_by_name_mut("P-03")
        .unwrap()
        .get_cell_mut((2, 9))
        .set_value("godina");
    umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

    exporter
        .run(Mode::Quality, &range, &data, ExportOptions::default())
        .unwrap();
    assert_eq!(
        cell(&path, "P-03", "B9"),
        Some(CellValue::Text("godina".into()))
    );
}

#[test]
fn later_runs_only_touch_their_own_cells() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let mut first = Measurements::new();
    record(
        &mut first,
        "VS Lopar",
        day(2024, 6, 1),
        &[("temp", MetricValue::triple(18.0, 21.0, 19.5))],
    );
    exporter
        .run(
            Mode::Quality,
            &DateRange::single(day(2024, 6, 1)),
            &first,
            ExportOptions::default(),
        )
        .unwrap();

    let mut second = Measurements::new();
    record(
        &mut second,
        "VS Lopar",
        day(2024, 6, 2),
        &[("temp", MetricValue::triple(17.0, 22.0, 19.0))],
    );
    exporter
        .run(
            Mode::Quality,
            &DateRange::single(day(2024, 6, 2)),
            &second,
            ExportOptions::default(),
        )
        .unwrap();

    let path = fixture.document(Mode::Quality, 2024);
    assert_eq!(cell(&path, "P-06", "F61"), number(21.0));
    assert_eq!(cell(&path, "P-06", "F62"), number(22.0));
    assert_eq!(
        cell(&path, "P-06", "B61"),
        Some(CellValue::Text("VS Lopar".into()))
    );
}
