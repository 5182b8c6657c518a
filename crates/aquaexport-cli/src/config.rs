use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aquaexport_layout::{LayoutRegistry, Mode};
use aquaexport_workbook::WorkbookStore;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "aquaexport.log";

/// Location -> metric -> historian tag index.
pub type LocationSignals = BTreeMap<String, BTreeMap<String, u32>>;

/// Runtime configuration, loaded once at startup.
///
/// Unknown sections (for example a legacy `[database]` table) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub export: ExportSection,
    pub layouts: LayoutOverrides,
    pub signals: SignalMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Export root; each mode writes into its own subdirectory.
    pub directory: PathBuf,
    pub template_dir: PathBuf,
    /// Also append log output to `<directory>/aquaexport.log`.
    pub log_file: bool,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./exports"),
            template_dir: PathBuf::from("./templates"),
            log_file: true,
        }
    }
}

/// Optional YAML manifests replacing the built-in layout of a mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<PathBuf>,
}

impl LayoutOverrides {
    pub fn get(&self, mode: Mode) -> Option<&Path> {
        match mode {
            Mode::Quality => self.quality.as_deref(),
            Mode::Quantity => self.quantity.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalMap {
    pub quality: LocationSignals,
    pub quantity: LocationSignals,
}

impl SignalMap {
    pub fn get(&self, mode: Mode) -> &LocationSignals {
        match mode {
            Mode::Quality => &self.quality,
            Mode::Quantity => &self.quantity,
        }
    }
}

impl Default for SignalMap {
    fn default() -> Self {
        let mut quality = LocationSignals::new();
        insert_signals(
            &mut quality,
            "PK Barbat",
            &[
                ("mutnoca", 3),
                ("klor", 21),
                ("temp", 134),
                ("pH", 132),
                ("redox", 133),
            ],
        );
        insert_signals(
            &mut quality,
            "VS Lopar",
            &[("klor", 151), ("temp", 155), ("redox", 156)],
        );
        insert_signals(
            &mut quality,
            "VS Perici",
            &[("klor", 72), ("temp", 82), ("redox", 81)],
        );

        let mut quantity = LocationSignals::new();
        insert_signals(
            &mut quantity,
            "Hrvatsko primorje južni ogranak",
            &[
                ("volume_in", 14),
                ("volume_out", 13),
                ("max_flow_in", 18),
                ("max_flow_out", 16),
            ],
        );
        insert_signals(&mut quantity, "Perići", &[("volume_in", 67), ("max_flow_in", 68)]);
        insert_signals(&mut quantity, "Gvačići I", &[("volume_in", 103), ("max_flow_in", 0)]);
        insert_signals(&mut quantity, "Mlinica", &[("volume_in", 51), ("max_flow_in", 52)]);
        Self { quality, quantity }
    }
}

fn insert_signals(map: &mut LocationSignals, location: &str, metrics: &[(&str, u32)]) {
    map.insert(
        location.to_string(),
        metrics
            .iter()
            .map(|(metric, tag)| (metric.to_string(), *tag))
            .collect(),
    );
}

impl Config {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found; using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.export
            .log_file
            .then(|| self.export.directory.join(LOG_FILE_NAME))
    }

    /// Built-in layouts with any configured overrides applied.
    pub fn layout_registry(&self) -> Result<LayoutRegistry> {
        let mut registry = LayoutRegistry::builtin().context("built-in layouts are invalid")?;
        for mode in Mode::ALL {
            if let Some(path) = self.layouts.get(mode) {
                registry = registry
                    .with_layout_file(mode, path)
                    .with_context(|| format!("failed to load {mode} layout {}", path.display()))?;
                tracing::info!(%mode, path = %path.display(), "using layout override");
            }
        }
        Ok(registry)
    }

    pub fn store(&self) -> WorkbookStore {
        WorkbookStore::new(&self.export.directory, &self.export.template_dir)
    }

    /// Signal-map entries the layouts cannot place.
    ///
    /// Unknown locations are errors; metrics without a column are only noted,
    /// since a source may deliver values that are never written.
    pub fn signal_issues(&self, registry: &LayoutRegistry) -> Vec<SignalIssue> {
        let mut out = Vec::new();
        for mode in Mode::ALL {
            let layout = registry.get(mode);
            for (location, metrics) in self.signals.get(mode) {
                let Some(schema) = layout.location(location) else {
                    out.push(SignalIssue {
                        mode,
                        location: location.clone(),
                        metric: None,
                        fatal: true,
                    });
                    continue;
                };
                for metric in metrics.keys() {
                    if !schema.columns.contains_key(metric) {
                        out.push(SignalIssue {
                            mode,
                            location: location.clone(),
                            metric: Some(metric.clone()),
                            fatal: false,
                        });
                    }
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalIssue {
    pub mode: Mode,
    pub location: String,
    pub metric: Option<String>,
    pub fatal: bool,
}

impl std::fmt::Display for SignalIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.metric {
            None => write!(
                f,
                "[{}] location `{}` has signals but no block in the layout",
                self.mode, self.location
            ),
            Some(metric) => write!(
                f,
                "[{}] `{}`.{metric} has a signal but no column; values are not written",
                self.mode, self.location
            ),
        }
    }
}
