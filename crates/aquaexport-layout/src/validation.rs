use std::collections::BTreeSet;
use std::fmt;

use aquaexport_common::letters_to_column;
use regex::Regex;

use crate::layout::{LocationSchema, ModeLayout};

/// Maximum worksheet name length accepted by Excel.
const SHEET_NAME_MAX: usize = 31;
const SHEET_NAME_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// One problem found while validating a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutIssue {
    pub path: String,
    pub message: String,
}

impl LayoutIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every issue found in a layout, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<LayoutIssue>,
}

impl ValidationError {
    pub fn issues(&self) -> &[LayoutIssue] {
        &self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layout failed validation ({} issue(s))", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ModeLayout {
    /// Validate the layout and return granular issues when invariants fail.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        check_sheet_prefix(&self.sheet_prefix, &mut issues);

        for (field, value) in [
            ("document.directory", &self.document.directory),
            ("document.file_stem", &self.document.file_stem),
            ("document.template", &self.document.template),
        ] {
            if value.trim().is_empty() {
                issues.push(LayoutIssue::new(field, "must not be empty"));
            }
        }

        let day_col = check_column("block.day_column", &self.block.day_column, &mut issues);
        let label_col = check_column("block.label_column", &self.block.label_column, &mut issues);
        if day_col.is_some() && day_col == label_col {
            issues.push(LayoutIssue::new(
                "block.label_column",
                "label column must differ from the day column",
            ));
        }
        if let Some(marker) = &self.block.year_marker {
            check_column("block.year_marker.column", &marker.column, &mut issues);
        }

        let mut protected = BTreeSet::new();
        for (idx, letters) in self.protected_columns.iter().enumerate() {
            let path = format!("protected_columns[{idx}]");
            if let Some(col) = check_column(&path, letters, &mut issues) {
                if Some(col) == day_col || Some(col) == label_col {
                    issues.push(LayoutIssue::new(
                        path,
                        "protected column overlaps the day/label column",
                    ));
                }
                protected.insert(col);
            }
        }

        if self.locations.is_empty() {
            issues.push(LayoutIssue::new(
                "locations",
                "layout must declare at least one location",
            ));
        }

        let metric_pattern =
            Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("metric regex must compile");
        let mut seen_names = BTreeSet::new();

        for (idx, location) in self.locations.iter().enumerate() {
            let base = format!("locations[{idx}]");
            if location.name.trim().is_empty() {
                issues.push(LayoutIssue::new(
                    format!("{base}.name"),
                    "location name must not be empty",
                ));
            }
            if !seen_names.insert(location.name.as_str()) {
                issues.push(LayoutIssue::new(
                    format!("{base}.name"),
                    format!("duplicate location `{}`", location.name),
                ));
            }
            if location.anchor == 0 {
                issues.push(LayoutIssue::new(
                    format!("{base}.anchor"),
                    "anchor rows are 1-based",
                ));
            }
            if location.columns.is_empty() {
                issues.push(LayoutIssue::new(
                    format!("{base}.columns"),
                    "location must map at least one metric",
                ));
            }

            let mut used = BTreeSet::new();
            for (metric, stats) in &location.columns {
                let metric_path = format!("{base}.columns.{metric}");
                if !metric_pattern.is_match(metric) {
                    issues.push(LayoutIssue::new(
                        &metric_path,
                        "metric names must be alphanumeric identifiers",
                    ));
                }
                if stats.is_empty() {
                    issues.push(LayoutIssue::new(
                        &metric_path,
                        "metric must map at least one statistic",
                    ));
                }
                for (stat, letters) in stats {
                    let path = format!("{metric_path}.{stat}");
                    let Some(col) = check_column(&path, letters, &mut issues) else {
                        continue;
                    };
                    if protected.contains(&col) {
                        issues.push(LayoutIssue::new(
                            &path,
                            format!("column {letters} is protected (formula column)"),
                        ));
                    }
                    if Some(col) == day_col || Some(col) == label_col {
                        issues.push(LayoutIssue::new(
                            &path,
                            format!("column {letters} is reserved for the day/label cells"),
                        ));
                    }
                    if !used.insert(col) {
                        issues.push(LayoutIssue::new(
                            &path,
                            format!("column {letters} is mapped twice for this location"),
                        ));
                    }
                }
            }
        }

        check_block_overlap(self, &mut issues);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn check_sheet_prefix(prefix: &str, issues: &mut Vec<LayoutIssue>) {
    if prefix.trim().is_empty() {
        issues.push(LayoutIssue::new("sheet_prefix", "must not be empty"));
        return;
    }
    if prefix.chars().any(|c| SHEET_NAME_ILLEGAL.contains(&c)) {
        issues.push(LayoutIssue::new(
            "sheet_prefix",
            "contains a character Excel forbids in sheet names",
        ));
    }
    if prefix.chars().count() + 2 > SHEET_NAME_MAX {
        issues.push(LayoutIssue::new(
            "sheet_prefix",
            format!("sheet names would exceed {SHEET_NAME_MAX} characters"),
        ));
    }
}

fn check_column(path: &str, letters: &str, issues: &mut Vec<LayoutIssue>) -> Option<u32> {
    let col = letters_to_column(letters);
    if col.is_none() {
        issues.push(LayoutIssue::new(
            path,
            format!("`{letters}` is not an uppercase column reference"),
        ));
    }
    col
}

/// Blocks span `[anchor, anchor + 32]`; spans and year-marker rows must not collide.
fn check_block_overlap(layout: &ModeLayout, issues: &mut Vec<LayoutIssue>) {
    let spans: Vec<(usize, &LocationSchema)> = layout.locations.iter().enumerate().collect();
    for (i, (idx_a, a)) in spans.iter().enumerate() {
        for (idx_b, b) in spans.iter().skip(i + 1) {
            if a.anchor <= b.last_row() && b.anchor <= a.last_row() {
                issues.push(LayoutIssue::new(
                    format!("locations[{idx_b}].anchor"),
                    format!(
                        "block rows {}..={} of `{}` overlap rows {}..={} of `{}` (locations[{idx_a}])",
                        b.anchor,
                        b.last_row(),
                        b.name,
                        a.anchor,
                        a.last_row(),
                        a.name
                    ),
                ));
            }
        }
    }

    let Some(marker) = &layout.block.year_marker else {
        return;
    };
    for (idx, location) in &spans {
        let row = match location.anchor.checked_sub(marker.rows_above_anchor) {
            Some(row) if row >= 1 => row,
            _ => {
                issues.push(LayoutIssue::new(
                    format!("locations[{idx}].anchor"),
                    "year marker would land above row 1",
                ));
                continue;
            }
        };
        if let Some(other) = layout
            .locations
            .iter()
            .find(|other| other.anchor <= row && row <= other.last_row())
        {
            issues.push(LayoutIssue::new(
                format!("locations[{idx}].anchor"),
                format!(
                    "year marker row {row} falls inside the block of `{}`",
                    other.name
                ),
            ));
        }
    }
}
