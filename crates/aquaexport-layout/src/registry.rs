use std::path::Path;

use aquaexport_common::Statistic;

use crate::error::{LayoutError, LookupError};
use crate::layout::ModeLayout;
use crate::{Mode, QUALITY_LAYOUT_YAML, QUANTITY_LAYOUT_YAML};

/// One validated layout per mode.
#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    quality: ModeLayout,
    quantity: ModeLayout,
}

impl LayoutRegistry {
    /// Registry built from the embedded manifests.
    pub fn builtin() -> Result<Self, LayoutError> {
        Ok(Self {
            quality: parse_layout(Mode::Quality, QUALITY_LAYOUT_YAML)?,
            quantity: parse_layout(Mode::Quantity, QUANTITY_LAYOUT_YAML)?,
        })
    }

    /// Replace one mode's layout after validating it.
    pub fn with_layout(mut self, layout: ModeLayout) -> Result<Self, LayoutError> {
        layout.validate()?;
        match layout.mode {
            Mode::Quality => self.quality = layout,
            Mode::Quantity => self.quantity = layout,
        }
        Ok(self)
    }

    /// Replace `mode`'s layout with the manifest stored at `path`.
    pub fn with_layout_file(self, mode: Mode, path: &Path) -> Result<Self, LayoutError> {
        let text = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout = parse_layout(mode, &text)?;
        self.with_layout(layout)
    }

    pub fn get(&self, mode: Mode) -> &ModeLayout {
        match mode {
            Mode::Quality => &self.quality,
            Mode::Quantity => &self.quantity,
        }
    }

    pub fn anchor(&self, mode: Mode, location: &str) -> Result<u32, LookupError> {
        self.get(mode).anchor(location)
    }

    pub fn column(
        &self,
        mode: Mode,
        location: &str,
        metric: &str,
        statistic: Statistic,
    ) -> Result<u32, LookupError> {
        self.get(mode).column(location, metric, statistic)
    }

    pub fn contains_location(&self, mode: Mode, location: &str) -> bool {
        self.get(mode).location(location).is_some()
    }
}

fn parse_layout(expected: Mode, yaml: &str) -> Result<ModeLayout, LayoutError> {
    let layout = ModeLayout::from_yaml_str(yaml)?;
    if layout.mode != expected {
        return Err(LayoutError::ModeMismatch {
            expected,
            found: layout.mode,
        });
    }
    layout.validate()?;
    Ok(layout)
}
