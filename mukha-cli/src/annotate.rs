//! Overlay image output.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use image::RgbImage;
use mukha_core::{FaceAnalysis, render_overlay};

/// Render the analysis overlay for an image and save it to a directory.
///
/// The output keeps the source file name; formats `image` cannot encode fall
/// back to PNG.
pub fn annotate_image(
    image_path: &Path,
    image: &RgbImage,
    analysis: &FaceAnalysis,
    output_dir: &Path,
) -> Result<PathBuf> {
    let (img_w, img_h) = image.dimensions();
    if img_w == 0 || img_h == 0 {
        anyhow::bail!(
            "cannot annotate image with zero dimensions: {}",
            image_path.display()
        );
    }

    let overlay = render_overlay(image, analysis);

    let file_name = image_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("frame.png"));
    let mut output_path = output_dir.join(file_name);
    if image::ImageFormat::from_path(&output_path).is_err() {
        output_path.set_extension("png");
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    overlay
        .save(&output_path)
        .with_context(|| format!("failed to save annotated image {}", output_path.display()))?;

    Ok(output_path)
}
