use crate::common::{Fixture, cell, day, formula, number, record};
use aquaexport_workbook::{
    CellValue, DateRange, ExportOptions, ExportStatus, ExportWarning, Exporter, Measurements,
    MetricValue, Mode,
};

#[test]
fn pk_barbat_temperature_lands_in_march_row_17() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let mut data = Measurements::new();
    record(
        &mut data,
        "PK Barbat",
        day(2024, 3, 5),
        &[("temp", MetricValue::triple(11.2, 14.5, 12.9))],
    );
    let range = DateRange::new(day(2024, 3, 1), day(2024, 3, 31)).unwrap();
    let report = exporter
        .run(Mode::Quality, &range, &data, ExportOptions::default())
        .unwrap();

    let path = fixture.document(Mode::Quality, 2024);
    assert!(path.ends_with("kvaliteta_vode/kvaliteta_vode_2024.xlsx"));
    assert_eq!(report.status, ExportStatus::Success);
    assert_eq!(report.years.len(), 1);
    assert!(report.years[0].created);

    assert_eq!(cell(&path, "P-03", "A17"), number(5.0));
    assert_eq!(cell(&path, "P-03", "I17"), number(14.5));
    assert_eq!(cell(&path, "P-03", "J17"), number(11.2));
    assert_eq!(cell(&path, "P-03", "K17"), number(12.9));
    // Label only on day 1.
    assert_eq!(cell(&path, "P-03", "B13"), None);
    assert_eq!(cell(&path, "P-03", "B17"), None);
    // Nothing leaks into neighbouring rows or sheets.
    assert_eq!(cell(&path, "P-03", "I16"), None);
    assert_eq!(cell(&path, "P-03", "I18"), None);
    assert_eq!(cell(&path, "P-04", "I17"), None);
}

#[test]
fn new_documents_carry_the_year_on_every_month_sheet() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let mut data = Measurements::new();
    record(
        &mut data,
        "VS Perici",
        day(2025, 7, 1),
        &[("klor", MetricValue::triple(0.25, 0.5, 0.375))],
    );
    exporter
        .run(
            Mode::Quality,
            &DateRange::single(day(2025, 7, 1)),
            &data,
            ExportOptions::default(),
        )
        .unwrap();

    let path = fixture.document(Mode::Quality, 2025);
    for sheet in ["P-01", "P-07", "P-12"] {
        for marker in ["B9", "B57", "B105"] {
            assert_eq!(cell(&path, sheet, marker), number(2025.0), "{sheet}!{marker}");
        }
    }
    assert_eq!(
        cell(&path, "P-07", "B109"),
        Some(CellValue::Text("VS Perici".into()))
    );
    assert_eq!(cell(&path, "P-07", "C109"), number(0.5));
    assert_eq!(cell(&path, "P-07", "D109"), number(0.25));
    assert_eq!(cell(&path, "P-07", "E109"), number(0.375));
}

#[test]
fn quantity_leaves_formula_column_and_undeclared_metrics_alone() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let main = "Hrvatsko primorje južni ogranak";
    let mut data = Measurements::new();
    record(
        &mut data,
        main,
        day(2024, 3, 1),
        &[
            ("volume_in", MetricValue::scalar(812.5)),
            ("max_flow_in", MetricValue::scalar(14.25)),
            ("volume_out", MetricValue::scalar(700.0)),
            ("max_flow_out", MetricValue::scalar(3.0)),
        ],
    );
    record(
        &mut data,
        "Mlinica",
        day(2024, 3, 1),
        &[
            ("volume_in", MetricValue::scalar(96.0)),
            ("volume_out", MetricValue::scalar(12.0)),
        ],
    );
    record(
        &mut data,
        "Gvačići I",
        day(2024, 3, 2),
        &[("max_flow_in", MetricValue::scalar(0.0))],
    );
    let report = exporter
        .run(
            Mode::Quantity,
            &DateRange::new(day(2024, 3, 1), day(2024, 3, 2)).unwrap(),
            &data,
            ExportOptions::default(),
        )
        .unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let path = fixture.document(Mode::Quantity, 2024);
    assert!(path.ends_with("zahvacene_kolicine_vode/zahvacene_kolicine_2024.xlsx"));
    assert_eq!(cell(&path, "P2-03", "A13"), number(1.0));
    assert_eq!(
        cell(&path, "P2-03", "B13"),
        Some(CellValue::Text(main.into()))
    );
    assert_eq!(cell(&path, "P2-03", "C13"), number(812.5));
    assert_eq!(cell(&path, "P2-03", "E13"), number(14.25));
    assert_eq!(cell(&path, "P2-03", "F13"), number(700.0));
    assert_eq!(
        formula(&path, "P2-03", "D13").as_deref(),
        Some("C13*1000/86400")
    );
    // No column for max_flow_out anywhere in the block.
    assert_eq!(cell(&path, "P2-03", "G13"), None);

    // Secondary locations have no volume_out column.
    assert_eq!(cell(&path, "P2-03", "C158"), number(96.0));
    assert_eq!(cell(&path, "P2-03", "F158"), None);
    assert_eq!(
        formula(&path, "P2-03", "D158").as_deref(),
        Some("C158*1000/86400")
    );

    // A zero reading is still written.
    assert_eq!(cell(&path, "P2-03", "E111"), number(0.0));
    // No year markers in quantity documents.
    assert_eq!(cell(&path, "P2-03", "B9"), None);
}

#[test]
fn null_components_are_not_written() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let mut data = Measurements::new();
    record(
        &mut data,
        "VS Lopar",
        day(2024, 2, 29),
        &[("redox", MetricValue::Triple(None, Some(412.0), None))],
    );
    exporter
        .run(
            Mode::Quality,
            &DateRange::single(day(2024, 2, 29)),
            &data,
            ExportOptions::default(),
        )
        .unwrap();

    let path = fixture.document(Mode::Quality, 2024);
    assert_eq!(cell(&path, "P-02", "A89"), number(29.0));
    assert_eq!(cell(&path, "P-02", "I89"), number(412.0));
    assert_eq!(cell(&path, "P-02", "J89"), None);
    assert_eq!(cell(&path, "P-02", "K89"), None);
}

#[test]
fn unknown_locations_are_reported_once_and_skipped() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let mut data = Measurements::new();
    for d in 1..=3 {
        record(
            &mut data,
            "VS Supetarska Draga",
            day(2024, 5, d),
            &[("klor", MetricValue::triple(0.1, 0.2, 0.15))],
        );
    }
    record(
        &mut data,
        "VS Lopar",
        day(2024, 5, 2),
        &[("klor", MetricValue::triple(0.1, 0.2, 0.15))],
    );

    let report = exporter
        .run(
            Mode::Quality,
            &DateRange::new(day(2024, 5, 1), day(2024, 5, 3)).unwrap(),
            &data,
            ExportOptions::default(),
        )
        .unwrap();

    assert_eq!(report.status, ExportStatus::CompletedWithWarnings);
    assert_eq!(
        report.warnings,
        vec![ExportWarning::UnknownLocation {
            mode: Mode::Quality,
            location: "VS Supetarska Draga".into()
        }]
    );
    assert_eq!(report.records, 1);
    let path = fixture.document(Mode::Quality, 2024);
    assert_eq!(cell(&path, "P-05", "C62"), number(0.2));
}

#[test]
fn missing_month_sheet_skips_the_record_with_a_warning() {
    let fixture = Fixture::with_missing_sheets(&["P-03"]);
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let mut data = Measurements::new();
    record(
        &mut data,
        "PK Barbat",
        day(2024, 3, 5),
        &[("pH", MetricValue::triple(7.1, 7.6, 7.3))],
    );
    record(
        &mut data,
        "PK Barbat",
        day(2024, 4, 5),
        &[("pH", MetricValue::triple(7.1, 7.6, 7.3))],
    );

    let report = exporter
        .run(
            Mode::Quality,
            &DateRange::new(day(2024, 3, 1), day(2024, 4, 30)).unwrap(),
            &data,
            ExportOptions::default(),
        )
        .unwrap();

    let path = fixture.document(Mode::Quality, 2024);
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ExportWarning::MissingYearMarkerSheet { sheet, .. } if sheet == "P-03"
    )));
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ExportWarning::MissingSheet { sheet, date, .. } if sheet == "P-03" && *date == day(2024, 3, 5)
    )));
    assert_eq!(cell(&path, "P-04", "L17"), number(7.6));
}

#[test]
fn missing_template_fails_before_anything_is_written() {
    let fixture = Fixture::new();
    let layout = fixture.layouts.get(Mode::Quantity);
    std::fs::remove_file(fixture.template_dir().join(&layout.document.template)).unwrap();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let mut data = Measurements::new();
    record(
        &mut data,
        "Perići",
        day(2024, 1, 1),
        &[("volume_in", MetricValue::scalar(1.0))],
    );
    let err = exporter
        .run(
            Mode::Quantity,
            &DateRange::single(day(2024, 1, 1)),
            &data,
            ExportOptions::default(),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        aquaexport_workbook::ExportError::TemplateMissing {
            mode: Mode::Quantity,
            ..
        }
    ));
    assert!(!fixture.export_root().join(&layout.document.directory).exists());
}

#[test]
fn existing_documents_do_not_need_the_template() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let mut data = Measurements::new();
    record(
        &mut data,
        "VS Lopar",
        day(2024, 5, 2),
        &[("klor", MetricValue::triple(0.1, 0.2, 0.15))],
    );
    let range = DateRange::single(day(2024, 5, 2));
    exporter
        .run(Mode::Quality, &range, &data, ExportOptions::default())
        .unwrap();

    let layout = fixture.layouts.get(Mode::Quality);
    std::fs::remove_file(fixture.template_dir().join(&layout.document.template)).unwrap();

    record(
        &mut data,
        "VS Lopar",
        day(2024, 5, 2),
        &[("klor", MetricValue::triple(0.1, 0.4, 0.25))],
    );
    let report = exporter
        .run(Mode::Quality, &range, &data, ExportOptions::default())
        .unwrap();

    assert!(!report.years[0].created);
    let path = fixture.document(Mode::Quality, 2024);
    assert_eq!(cell(&path, "P-05", "C62"), number(0.4));

    // A year without a document still needs it.
    let mut next = Measurements::new();
    record(
        &mut next,
        "VS Lopar",
        day(2025, 1, 1),
        &[("klor", MetricValue::triple(0.1, 0.2, 0.15))],
    );
    let err = exporter
        .run(
            Mode::Quality,
            &DateRange::single(day(2025, 1, 1)),
            &next,
            ExportOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        aquaexport_workbook::ExportError::TemplateMissing {
            mode: Mode::Quality,
            ..
        }
    ));
}
