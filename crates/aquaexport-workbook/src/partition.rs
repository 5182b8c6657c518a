use std::collections::{BTreeMap, BTreeSet};

use aquaexport_common::MetricValue;
use chrono::{Datelike, Days, NaiveDate};

use crate::error::ExportError;

/// Metric name to value for one location and day.
pub type MetricValues = BTreeMap<String, MetricValue>;
/// Day to metrics for one location.
pub type LocationSeries = BTreeMap<NaiveDate, MetricValues>;
/// Location to series; the shape produced by a measurement source.
pub type Measurements = BTreeMap<String, LocationSeries>;

/// Inclusive calendar-date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ExportError> {
        if start > end {
            return Err(ExportError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// `[today - days, today]`.
    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        let start = today.checked_sub_days(Days::new(days)).unwrap_or(today);
        Self { start, end: today }
    }

    /// January 1st of `today`'s year through `today`.
    pub fn year_to_date(today: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Calendar years touched by the range, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start.year()..=self.end.year()
    }
}

/// Measurements grouped by calendar year, then location, then day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearPartitions {
    years: BTreeMap<i32, Measurements>,
}

impl YearPartitions {
    pub fn insert(&mut self, location: &str, day: NaiveDate, values: MetricValues) {
        self.years
            .entry(day.year())
            .or_default()
            .entry(location.to_string())
            .or_default()
            .insert(day, values);
    }

    pub fn get(&self, year: i32) -> Option<&Measurements> {
        self.years.get(&year)
    }

    /// Years in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &Measurements)> {
        self.years.iter().map(|(year, m)| (*year, m))
    }

    pub fn year_list(&self) -> Vec<i32> {
        self.years.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Number of `(location, day)` records across every year.
    pub fn record_count(&self) -> usize {
        self.years
            .values()
            .flat_map(|locations| locations.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn locations(&self) -> BTreeSet<&str> {
        self.years
            .values()
            .flat_map(|locations| locations.keys())
            .map(String::as_str)
            .collect()
    }

    /// Keep locations for which `keep` returns true; years left empty are dropped.
    pub fn retain_locations<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        for locations in self.years.values_mut() {
            locations.retain(|name, _| keep(name));
        }
        self.years.retain(|_, locations| !locations.is_empty());
    }
}

impl IntoIterator for YearPartitions {
    type Item = (i32, Measurements);
    type IntoIter = std::collections::btree_map::IntoIter<i32, Measurements>;

    fn into_iter(self) -> Self::IntoIter {
        self.years.into_iter()
    }
}

/// Split `measurements` by calendar year, keeping only days inside `range`.
///
/// Every day is read from the source and appears in exactly one partition.
pub fn partition(measurements: &Measurements, range: &DateRange) -> YearPartitions {
    let mut out = YearPartitions::default();
    for (location, series) in measurements {
        for (day, values) in series.range(range.start()..=range.end()) {
            out.insert(location, *day, values.clone());
        }
    }
    out
}
