//! Common helpers shared across mukha crates.

/// Colour conversions (OpenCV-scaled HSV, CIELAB lightness, BT.601 luma).
pub mod color;
/// Application configuration and settings management.
pub mod config;
/// Image loading, grayscale conversion, and masked pixel statistics.
pub mod image_utils;
/// Single 2D point type used for landmarks and polygons.
pub mod point;
/// Focus measures (Laplacian variance blur score).
pub mod quality;
/// Rectangles, polygon bounds and polygon masks.
pub mod shape;
/// Instrumentation helpers for optional performance tracing.
pub mod telemetry;

use std::path::Path;

use anyhow::Result;
use log::LevelFilter;

pub use color::{hsv_u8_to_rgb, lab_lightness, luma_bt601, rgb_to_hsv_u8};
pub use config::{
    AnalysisSettings, AppSettings, ConfigError, QualityGateSettings, RegionStrategy,
    TelemetrySettings,
};
pub use image_utils::{
    HsvStats, MeanStd, channel_means, gray_stats, hsv_stats, load_image, mean_lightness, to_gray,
};
pub use point::Point;
pub use quality::{laplacian, laplacian_variance};
pub use shape::{PixelRect, polygon_area, polygon_bounds, polygon_mask};
pub use telemetry::{
    TimingGuard, configure as configure_telemetry, telemetry_allows, telemetry_enabled,
    timing_guard,
};

/// Initialize logging once for CLI and library test environments.
///
/// This function respects the `RUST_LOG` environment variable if it is set.
/// Otherwise, it falls back to the provided default filter level.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module(telemetry::TELEMETRY_TARGET, LevelFilter::Trace);

    if builder.try_init().is_err() {
        // Logger already initialized; nothing to do.
    }
    Ok(())
}

/// Validate that a path exists and resolve it to an absolute path.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<std::path::PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    Ok(path.canonicalize()?)
}
