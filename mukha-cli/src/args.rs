//! Command-line argument definitions for mukha.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use mukha_utils::{PixelRect, RegionStrategy};

/// Analyse face images and print wellness reports.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct AnalyzeArgs {
    /// Path to an image file or a directory containing images.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Optional settings JSON. Defaults to `config/mukha_settings.json` when present, otherwise built-in parameters.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON file of normalised facial landmarks (`{"points": [{"x": .., "y": ..}, ...]}`).
    #[arg(long, value_name = "FILE")]
    pub landmarks: Option<PathBuf>,

    /// JSON file of face attributes (`{"dominant_emotion": .., "age": .., "dominant_race": ..}`).
    #[arg(long, value_name = "FILE")]
    pub attributes: Option<PathBuf>,

    /// Region extraction strategy: fractional or landmarks.
    #[arg(long, value_name = "STRATEGY")]
    pub region_strategy: Option<RegionStrategy>,

    /// Face box `x,y,w,h` in pixels, used by the quality gate for every image.
    #[arg(long, value_name = "X,Y,W,H", value_parser = parse_face_box)]
    pub face_box: Option<PixelRect>,

    /// Write results to a JSON file instead of stdout.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Directory to write overlay images with tinted regions and eye boxes.
    #[arg(long)]
    pub annotate: Option<PathBuf>,

    /// Treat the sorted inputs as successive frames of one capture session.
    #[arg(long, action = ArgAction::SetTrue)]
    pub session: bool,

    /// Override the session smoothing factor, in (0, 1).
    #[arg(long, value_name = "ALPHA")]
    pub smoothing_alpha: Option<f64>,

    /// Enable telemetry timing logs (defaults to settings file).
    #[arg(long, action = ArgAction::SetTrue)]
    pub telemetry: bool,

    /// Override telemetry logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub telemetry_level: Option<String>,
}

/// Parse `x,y,w,h` into a pixel rectangle.
pub fn parse_face_box(value: &str) -> Result<PixelRect, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("expected x,y,w,h but got '{value}'"));
    };
    let parse = |s: &str| {
        s.parse::<u32>()
            .map_err(|err| format!("invalid face box component '{s}': {err}"))
    };
    let rect = PixelRect::new(parse(x)?, parse(y)?, parse(w)?, parse(h)?);
    if rect.is_empty() {
        return Err(format!("face box '{value}' has zero area"));
    }
    Ok(rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_face_box() {
        assert_eq!(parse_face_box("10, 20,30,40"), Ok(PixelRect::new(10, 20, 30, 40)));
        assert!(parse_face_box("10,20,30").is_err());
        assert!(parse_face_box("a,b,c,d").is_err());
        assert!(parse_face_box("1,1,0,5").is_err());
    }

    #[test]
    fn parses_strategy_and_flags() {
        let args = AnalyzeArgs::try_parse_from([
            "mukha",
            "--input",
            "faces",
            "--region-strategy",
            "landmarks",
            "--session",
            "--smoothing-alpha",
            "0.5",
        ])
        .expect("valid args");
        assert_eq!(args.region_strategy, Some(RegionStrategy::Landmarks));
        assert!(args.session);
        assert_eq!(args.smoothing_alpha, Some(0.5));
    }
}
