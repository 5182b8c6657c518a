use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use aquaexport_layout::Mode;

use crate::error::ExportError;
use crate::partition::{DateRange, LocationSeries, Measurements};

/// Supplier of per-location, per-day metric values for a mode and range.
pub trait MeasurementSource {
    fn fetch(&mut self, mode: Mode, range: &DateRange) -> Result<Measurements, ExportError>;
}

/// Reads a JSON export of the historian:
///
/// ```json
/// { "PK Barbat": { "2024-03-05": { "temp": [11.2, 14.5, 12.9], "pH": 7.4 } } }
/// ```
///
/// Triples are `[min, max, avg]`; any component may be `null`.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MeasurementSource for JsonFileSource {
    fn fetch(&mut self, mode: Mode, range: &DateRange) -> Result<Measurements, ExportError> {
        let file = File::open(&self.path).map_err(|err| ExportError::SourceUnavailable {
            reason: match err.kind() {
                ErrorKind::NotFound => format!("{} does not exist", self.path.display()),
                _ => format!("{}: {err}", self.path.display()),
            },
        })?;
        let mut measurements: Measurements = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| ExportError::MalformedSource {
                reason: format!("{}: {err}", self.path.display()),
            })?;
        for series in measurements.values_mut() {
            series.retain(|day, _| range.contains(*day));
        }
        measurements.retain(|_, series| !series.is_empty());
        tracing::debug!(
            %mode,
            path = %self.path.display(),
            locations = measurements.len(),
            "loaded measurements"
        );
        Ok(measurements)
    }
}

/// Serves a fixed set of measurements; used by embedders that already hold the data.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    measurements: Measurements,
}

impl InMemorySource {
    pub fn new(measurements: Measurements) -> Self {
        Self { measurements }
    }
}

impl MeasurementSource for InMemorySource {
    fn fetch(&mut self, _mode: Mode, range: &DateRange) -> Result<Measurements, ExportError> {
        let mut out = Measurements::new();
        for (location, series) in &self.measurements {
            let clipped: LocationSeries = series
                .range(range.start()..=range.end())
                .map(|(day, values)| (*day, values.clone()))
                .collect();
            if !clipped.is_empty() {
                out.insert(location.clone(), clipped);
            }
        }
        Ok(out)
    }
}
