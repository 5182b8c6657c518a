use std::sync::{Arc, Mutex};

use crate::common::{Fixture, day, record};
use aquaexport_workbook::{
    DateRange, ExportOptions, ExportProgress, Exporter, Measurements, MetricValue, Mode,
};

#[test]
fn progress_is_monotonic_and_ends_at_total() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let mut data = Measurements::new();
    for date in [day(2023, 12, 30), day(2023, 12, 31), day(2024, 1, 1)] {
        for location in ["Perići", "Mlinica"] {
            record(
                &mut data,
                location,
                date,
                &[("volume_in", MetricValue::scalar(100.0))],
            );
        }
    }
    // Unknown locations never count toward the total.
    record(
        &mut data,
        "Crpna stanica X",
        day(2024, 1, 1),
        &[("volume_in", MetricValue::scalar(1.0))],
    );

    let log: Arc<Mutex<Vec<ExportProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let mut options = ExportOptions::default();
    options.progress = Some(Box::new(move |progress: ExportProgress| {
        sink.lock().unwrap().push(progress);
    }));

    let report = exporter
        .run(
            Mode::Quantity,
            &DateRange::new(day(2023, 12, 30), day(2024, 1, 1)).unwrap(),
            &data,
            options,
        )
        .unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 6);
    assert!(log.iter().all(|p| p.total == 6));
    assert!(log.windows(2).all(|w| w[0].completed < w[1].completed));
    assert_eq!(log.last().map(|p| p.completed), Some(6));
    assert_eq!(log.iter().filter(|p| p.completed == p.total).count(), 1);
    // Years are processed in ascending order.
    assert!(log.windows(2).all(|w| w[0].year <= w[1].year));
    assert_eq!(log.last().unwrap().fraction(), 1.0);

    assert_eq!(report.records, 6);
    assert_eq!(
        report.years.iter().map(|y| y.year).collect::<Vec<_>>(),
        vec![2023, 2024]
    );
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn empty_runs_report_nothing_and_create_nothing() {
    let fixture = Fixture::new();
    let store = fixture.store();
    let exporter = Exporter::new(&fixture.layouts, &store);

    let calls = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&calls);
    let mut options = ExportOptions::default();
    options.progress = Some(Box::new(move |_: ExportProgress| {
        *sink.lock().unwrap() += 1;
    }));

    let report = exporter
        .run(
            Mode::Quality,
            &DateRange::single(day(2024, 1, 1)),
            &Measurements::new(),
            options,
        )
        .unwrap();
    assert!(report.years.is_empty());
    assert_eq!(*calls.lock().unwrap(), 0);
    assert!(!fixture.export_root().exists());
}
