use crate::common::{Fixture, LockedStorage, cell, day, number, record};
use aquaexport_workbook::{
    DateRange, ExportError, ExportOptions, Exporter, Measurements, MetricValue, Mode,
};

fn around_new_year(avg: f64) -> Measurements {
    let mut data = Measurements::new();
    for date in [day(2023, 12, 31), day(2024, 1, 1)] {
        record(
            &mut data,
            "VS Perici",
            date,
            &[("temp", MetricValue::triple(avg - 1.0, avg + 1.0, avg))],
        );
    }
    data
}

fn range() -> DateRange {
    DateRange::new(day(2023, 12, 31), day(2024, 1, 1)).unwrap()
}

#[test]
fn locked_later_year_keeps_earlier_years_and_its_own_contents() {
    let fixture = Fixture::new();
    {
        let store = fixture.store();
        Exporter::new(&fixture.layouts, &store)
            .run(Mode::Quality, &range(), &around_new_year(8.0), ExportOptions::default())
            .unwrap();
    }
    let locked = fixture.document(Mode::Quality, 2024);
    let before = std::fs::read(&locked).unwrap();

    let store = fixture.store_with(LockedStorage {
        locked: locked.clone(),
    });
    let err = Exporter::new(&fixture.layouts, &store)
        .run(Mode::Quality, &range(), &around_new_year(12.0), ExportOptions::default())
        .unwrap_err();

    match err {
        ExportError::DocumentLocked { path, year, mode } => {
            assert_eq!(path, locked);
            assert_eq!(year, 2024);
            assert_eq!(mode, Mode::Quality);
        }
        other => panic!("expected DocumentLocked, got {other:?}"),
    }
    let earlier = fixture.document(Mode::Quality, 2023);
    assert_eq!(cell(&earlier, "P-12", "H139"), number(12.0));
    assert_eq!(std::fs::read(&locked).unwrap(), before);
    assert_eq!(cell(&locked, "P-01", "H109"), number(8.0));
}

#[test]
fn locked_first_year_stops_the_run() {
    let fixture = Fixture::new();
    let blocked = fixture.document(Mode::Quality, 2023);
    let store = fixture.store_with(LockedStorage {
        locked: blocked.clone(),
    });

    let err = Exporter::new(&fixture.layouts, &store)
        .run(Mode::Quality, &range(), &around_new_year(10.0), ExportOptions::default())
        .unwrap_err();

    assert!(err.is_locked(), "{err:?}");
    // The new 2023 document was never persisted and 2024 was never attempted.
    assert!(!blocked.exists());
    assert!(!fixture.document(Mode::Quality, 2024).exists());
}

#[test]
fn failed_save_leaves_no_partial_file_or_temp_residue() {
    let fixture = Fixture::new();
    let target = fixture.document(Mode::Quality, 2024);
    let store = fixture.store_with(LockedStorage {
        locked: target.clone(),
    });
    let mut data = Measurements::new();
    record(
        &mut data,
        "PK Barbat",
        day(2024, 8, 15),
        &[("mutnoca", MetricValue::triple(0.1, 0.4, 0.2))],
    );

    let err = Exporter::new(&fixture.layouts, &store)
        .run(
            Mode::Quality,
            &DateRange::single(day(2024, 8, 15)),
            &data,
            ExportOptions::default(),
        )
        .unwrap_err();
    assert!(err.is_locked());
    assert!(!target.exists());
    if let Some(dir) = target.parent().filter(|dir| dir.exists()) {
        assert_eq!(std::fs::read_dir(dir).unwrap().count(), 0);
    }
}
