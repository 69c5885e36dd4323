//! Configuration loading and CLI override logic.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use mukha_utils::{AppSettings, config::default_settings_path, normalize_path};

use crate::args::AnalyzeArgs;

/// Load application settings from a file or use defaults.
pub fn load_settings(config_path: Option<&PathBuf>) -> Result<AppSettings> {
    if let Some(path) = config_path {
        let resolved = normalize_path(path)?;
        let settings = AppSettings::load_from_path(&resolved)?;
        info!("Loaded settings from {}", resolved.display());
        Ok(settings)
    } else {
        let default_path = default_settings_path();
        if default_path.exists() {
            let settings = AppSettings::load_from_path(&default_path).with_context(|| {
                format!(
                    "failed to load default settings from {}",
                    default_path.display()
                )
            })?;
            info!("Loaded settings from {}", default_path.display());
            Ok(settings)
        } else {
            Ok(AppSettings::default())
        }
    }
}

/// Apply command-line arguments to override loaded or default settings.
pub fn apply_cli_overrides(settings: &mut AppSettings, args: &AnalyzeArgs) {
    if args.telemetry {
        settings.telemetry.enabled = true;
    }
    if let Some(level) = args.telemetry_level.as_ref() {
        let normalized = level.trim();
        if !normalized.is_empty() {
            let lower = normalized.to_ascii_lowercase();
            if lower == "off" {
                settings.telemetry.enabled = false;
            }
            settings.telemetry.level = lower;
        }
    }

    if let Some(strategy) = args.region_strategy {
        settings.analysis.region_strategy = strategy;
    }
    if let Some(alpha) = args.smoothing_alpha {
        settings.analysis.smoothing_alpha = alpha;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use mukha_utils::RegionStrategy;

    #[test]
    fn overrides_replace_settings() {
        let args = AnalyzeArgs::parse_from([
            "mukha",
            "--input",
            "x.png",
            "--region-strategy",
            "landmarks",
            "--smoothing-alpha",
            "0.6",
            "--telemetry",
            "--telemetry-level",
            "TRACE",
        ]);
        let mut settings = AppSettings::default();
        apply_cli_overrides(&mut settings, &args);
        assert_eq!(settings.analysis.region_strategy, RegionStrategy::Landmarks);
        assert_eq!(settings.analysis.smoothing_alpha, 0.6);
        assert!(settings.telemetry.enabled);
        assert_eq!(settings.telemetry.level, "trace");
    }

    #[test]
    fn telemetry_off_disables() {
        let args = AnalyzeArgs::parse_from([
            "mukha",
            "--input",
            "x.png",
            "--telemetry",
            "--telemetry-level",
            "off",
        ]);
        let mut settings = AppSettings::default();
        apply_cli_overrides(&mut settings, &args);
        assert!(!settings.telemetry.enabled);
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let mut settings = AppSettings::default();
        settings.quality_gate.min_face_ratio = 0.25;
        settings.save_to_path(&path).expect("save");

        let loaded = load_settings(Some(&path)).expect("load");
        assert_eq!(loaded.quality_gate.min_face_ratio, 0.25);
    }
}
