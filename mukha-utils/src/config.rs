//! Settings shared by the analysis core and the CLI.
//!
//! Settings are stored as JSON. Every section except `quality_gate` falls back to
//! defaults field by field; the quality gate thresholds must be given in full
//! whenever the section is present, and a missing one is reported by name.

use std::{
    collections::BTreeMap,
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems with user-supplied configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    MissingField(&'static str),
    #[error("setting `{field}` = {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },
}

/// Thresholds for the pre-analysis usability check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityGateSettings {
    /// Minimum face box area as a fraction of the frame area (0-1).
    pub min_face_ratio: f64,
    /// Minimum Laplacian variance.
    pub blur_min_laplacian: f64,
    /// Minimum mean CIELAB lightness on the 0-255 scale.
    #[serde(rename = "min_light_L_mean")]
    pub min_light_l_mean: f64,
}

impl Default for QualityGateSettings {
    fn default() -> Self {
        Self {
            min_face_ratio: 0.10,
            blur_min_laplacian: 40.0,
            min_light_l_mean: 60.0,
        }
    }
}

impl QualityGateSettings {
    pub const FIELD_MIN_FACE_RATIO: &'static str = "min_face_ratio";
    pub const FIELD_BLUR_MIN: &'static str = "blur_min_laplacian";
    pub const FIELD_MIN_LIGHT: &'static str = "min_light_L_mean";

    /// Build settings from a flat key/value map, naming the first missing key.
    pub fn from_map(values: &BTreeMap<String, f64>) -> Result<Self, ConfigError> {
        let get = |field: &'static str| {
            values
                .get(field)
                .copied()
                .ok_or(ConfigError::MissingField(field))
        };
        let settings = Self {
            min_face_ratio: get(Self::FIELD_MIN_FACE_RATIO)?,
            blur_min_laplacian: get(Self::FIELD_BLUR_MIN)?,
            min_light_l_mean: get(Self::FIELD_MIN_LIGHT)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check every threshold against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            Self::FIELD_MIN_FACE_RATIO,
            self.min_face_ratio,
            0.0,
            1.0,
            "[0, 1]",
        )?;
        check_range(
            Self::FIELD_BLUR_MIN,
            self.blur_min_laplacian,
            0.0,
            f64::MAX,
            "[0, inf)",
        )?;
        check_range(
            Self::FIELD_MIN_LIGHT,
            self.min_light_l_mean,
            0.0,
            255.0,
            "[0, 255]",
        )
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
    range: &'static str,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            range,
        })
    }
}

/// Which region extraction strategy a deployment uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegionStrategy {
    /// Fixed proportional boxes of the full frame; needs no face detection.
    #[default]
    Fractional,
    /// Polygon crops driven by facial landmark indices.
    Landmarks,
}

impl fmt::Display for RegionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegionStrategy::Fractional => "fractional",
            RegionStrategy::Landmarks => "landmarks",
        })
    }
}

impl FromStr for RegionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fractional" | "fixed" => Ok(RegionStrategy::Fractional),
            "landmarks" | "landmark" => Ok(RegionStrategy::Landmarks),
            other => Err(format!(
                "invalid region strategy '{other}'; expected 'fractional' or 'landmarks'"
            )),
        }
    }
}

/// Feature extraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisSettings {
    pub region_strategy: RegionStrategy,
    /// Extra pixels added around landmark polygon bounding boxes.
    pub polygon_padding: u32,
    /// Height in pixels of the band scanned directly below each eye box.
    pub under_eye_band: u32,
    /// EMA factor used by capture sessions, in (0, 1).
    pub smoothing_alpha: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            region_strategy: RegionStrategy::Fractional,
            polygon_padding: 0,
            under_eye_band: 20,
            smoothing_alpha: 0.35,
        }
    }
}

/// Settings controlling optional runtime telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether telemetry timing logs are enabled.
    pub enabled: bool,
    /// Logging level for telemetry output (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the configured level string into a `LevelFilter`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Debug,
        }
    }
}

/// Persistent settings consumed by the CLI and library callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub quality_gate: QualityGateSettings,
    pub analysis: AnalysisSettings,
    pub telemetry: TelemetrySettings,
}

impl AppSettings {
    /// Load and validate settings from a JSON file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?;
        settings
            .quality_gate
            .validate()
            .with_context(|| format!("invalid quality gate settings in {}", path.display()))?;
        Ok(settings)
    }

    /// Serialize settings to disk in pretty-printed JSON.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize settings JSON")?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

/// Returns the default settings location (`config/mukha_settings.json`).
pub fn default_settings_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("config/mukha_settings.json"))
        .unwrap_or_else(|_| PathBuf::from("config/mukha_settings.json"))
}
