mod annotate;
mod args;
mod config;
mod input;
mod types;

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use image::RgbImage;
use log::{info, warn};
use mukha_core::{
    AnalysisError, CaptureSession, FaceAnalyzer, JsonAttributeService, JsonLandmarkService,
    QualityGate,
};
use mukha_utils::{
    AppSettings, PixelRect, configure_telemetry, init_logging, load_image, normalize_path,
};
use rayon::prelude::*;

use crate::{
    annotate::annotate_image,
    args::AnalyzeArgs,
    config::{apply_cli_overrides, load_settings},
    input::collect_images,
    types::ImageReport,
};

fn main() -> Result<()> {
    init_logging(log::LevelFilter::Info)?;
    let args = AnalyzeArgs::parse();

    let input_path = normalize_path(&args.input)?;
    let annotate_dir = if let Some(dir) = args.annotate.as_ref() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create annotation directory {}", dir.display()))?;
        Some(normalize_path(dir)?)
    } else {
        None
    };

    let mut settings = load_settings(args.config.as_ref())?;
    apply_cli_overrides(&mut settings, &args);
    configure_telemetry(
        settings.telemetry.enabled,
        settings.telemetry.level_filter(),
    );

    let analyzer = build_analyzer(&settings, &args)?;
    let gate = QualityGate::new(settings.quality_gate)
        .context("invalid quality gate settings")?;

    let images = collect_images(&input_path)?;
    if images.is_empty() {
        anyhow::bail!(
            "no images found at {} (supported extensions: jpg, jpeg, png, bmp, webp)",
            input_path.display()
        );
    }

    info!(
        "Analysing {} image(s) with {} regions...",
        images.len(),
        settings.analysis.region_strategy
    );
    let results = if args.session {
        run_session(&analyzer, &settings, &images, args.face_box, annotate_dir.as_deref())?
    } else {
        images
            .par_iter()
            .map(|path| analyze_one(&analyzer, &gate, path, args.face_box, annotate_dir.as_deref()))
            .collect::<Vec<_>>()
    };

    write_results(&results, args.json.as_ref())
}

fn build_analyzer(settings: &AppSettings, args: &AnalyzeArgs) -> Result<FaceAnalyzer> {
    let mut analyzer = FaceAnalyzer::new(settings.analysis.clone());
    if let Some(path) = args.attributes.as_ref() {
        let service = JsonAttributeService::load(normalize_path(path)?)?;
        analyzer = analyzer.with_attribute_service(Box::new(service));
    }
    if let Some(path) = args.landmarks.as_ref() {
        let service = JsonLandmarkService::load(normalize_path(path)?)?;
        analyzer = analyzer.with_landmark_service(Box::new(service));
    }
    Ok(analyzer)
}

/// Decode an input, or `None` when it is not a usable image.
fn decode(path: &Path) -> Option<RgbImage> {
    match load_image(path) {
        Ok(image) => Some(image.to_rgb8()),
        Err(err) => {
            warn!("{err:#}");
            None
        }
    }
}

fn analyze_one(
    analyzer: &FaceAnalyzer,
    gate: &QualityGate,
    path: &Path,
    face_box: Option<PixelRect>,
    annotate_dir: Option<&Path>,
) -> ImageReport {
    let name = path.display().to_string();
    let Some(image) = decode(path) else {
        return ImageReport::invalid(name);
    };
    let analysis = match analyzer.analyze(&image, face_box) {
        Ok(analysis) => analysis,
        Err(err) => {
            warn!("Failed to analyse {name}: {err}");
            return ImageReport::invalid(name);
        }
    };
    let features = &analysis.features;
    let verdict = gate.check(&image, features.face_box.as_ref(), features.blur);
    info!(
        "{name} -> health {} ({}), primary: {}, gate: {}",
        analysis.report.health_score,
        analysis.report.constitution.summary(),
        analysis.report.primary().map_or("none", |d| d.name.as_str()),
        verdict.reason()
    );

    let annotated = annotate_dir.and_then(|dir| save_overlay(path, &image, &analysis, dir));
    let mut record = ImageReport::analysed(name, verdict, Some(analysis));
    record.annotated = annotated;
    record
}

fn run_session(
    analyzer: &FaceAnalyzer,
    settings: &AppSettings,
    images: &[PathBuf],
    face_box: Option<PixelRect>,
    annotate_dir: Option<&Path>,
) -> Result<Vec<ImageReport>> {
    let mut session = CaptureSession::from_settings(analyzer, settings)
        .context("failed to start capture session")?;
    let mut results = Vec::with_capacity(images.len());
    for path in images {
        let name = path.display().to_string();
        let Some(image) = decode(path) else {
            results.push(ImageReport::invalid(name));
            continue;
        };
        let outcome = match session.process(&image, face_box) {
            Ok(outcome) => outcome,
            Err(AnalysisError::InvalidImage { .. }) => {
                results.push(ImageReport::invalid(name));
                continue;
            }
            Err(err) => return Err(err).context("capture session failed"),
        };

        let annotated = match (annotate_dir, outcome.analysis.as_ref()) {
            (Some(dir), Some(analysis)) => save_overlay(path, &image, analysis, dir),
            _ => None,
        };
        let mut record = ImageReport::analysed(name, outcome.verdict, outcome.analysis);
        record.annotated = annotated;
        record.smoothed = Some(outcome.smoothed);
        results.push(record);
    }
    info!(
        "Session accepted {}/{} frame(s)",
        session.frames_accepted(),
        session.frames_seen()
    );
    Ok(results)
}

fn save_overlay(
    path: &Path,
    image: &RgbImage,
    analysis: &mukha_core::FaceAnalysis,
    dir: &Path,
) -> Option<String> {
    match annotate_image(path, image, analysis, dir) {
        Ok(saved) => {
            info!("Annotated image saved to {}", saved.display());
            Some(saved.display().to_string())
        }
        Err(err) => {
            warn!("Failed to annotate {}: {err:#}", path.display());
            None
        }
    }
}

fn write_results(results: &[ImageReport], json_path: Option<&PathBuf>) -> Result<()> {
    if let Some(json_path) = json_path {
        if let Some(dir) = json_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        let file = File::create(json_path)
            .with_context(|| format!("failed to create {}", json_path.display()))?;
        serde_json::to_writer_pretty(file, results)
            .with_context(|| format!("failed to write report JSON to {}", json_path.display()))?;
        info!("Wrote reports to {}", json_path.display());
    } else {
        let json = serde_json::to_string_pretty(results).context("failed to serialize reports")?;
        println!("{json}");
    }
    Ok(())
}
