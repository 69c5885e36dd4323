//! Single-frame analysis pipeline.
//!
//! [`FaceAnalyzer`] ties the pieces together: it validates the frame, queries the
//! external services, crops regions with the configured strategy, extracts
//! [`FrameFeatures`] and runs the rule engine. It holds no mutable state, so one
//! analyzer may be shared across threads and fed independent images in parallel.

use std::collections::BTreeMap;

use image::{DynamicImage, RgbImage};
use log::{Level, debug, warn};
use mukha_utils::{AnalysisSettings, ConfigError, PixelRect, RegionStrategy, timing_guard};
use serde::Serialize;
use thiserror::Error;

use crate::attributes::{FaceAttributeService, NoAttributeService, query_attributes};
use crate::extractor::ColorTextureExtractor;
use crate::eyes::EyeFeatureDetector;
use crate::features::{FrameFeatures, RegionName};
use crate::landmarks::{FaceLandmarks, LandmarkService};
use crate::regions::{FractionalRegions, LandmarkRegions, RegionCrop, RegionExtractor};
use crate::rules::{DiagnosticRuleEngine, HealthReport};
use crate::smoother::SmootherError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid image: {width}x{height} frame has no pixels")]
    InvalidImage { width: u32, height: u32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Smoother(#[from] SmootherError),
}

/// Features, report, and the geometry they were measured on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceAnalysis {
    pub features: FrameFeatures,
    pub report: HealthReport,
    /// Frame rectangles of the non-empty regions.
    pub region_boxes: BTreeMap<RegionName, PixelRect>,
    pub eye_boxes: Vec<PixelRect>,
}

/// Regions and eye boxes cropped from one frame.
struct Layout {
    regions: BTreeMap<RegionName, RegionCrop>,
    eyes: Vec<PixelRect>,
}

impl Layout {
    fn from_extractor(extractor: &dyn RegionExtractor, image: &RgbImage) -> Self {
        Self {
            regions: extractor.crop_named_regions(image),
            eyes: extractor.eye_boxes(image),
        }
    }

    fn empty() -> Self {
        Self {
            regions: BTreeMap::new(),
            eyes: Vec::new(),
        }
    }
}

/// Stateless single-frame analyzer.
pub struct FaceAnalyzer {
    settings: AnalysisSettings,
    attributes: Box<dyn FaceAttributeService>,
    landmarks: Option<Box<dyn LandmarkService>>,
    extractor: ColorTextureExtractor,
    eyes: EyeFeatureDetector,
    engine: DiagnosticRuleEngine,
}

impl Default for FaceAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisSettings::default())
    }
}

impl FaceAnalyzer {
    /// Analyzer with no external services configured.
    pub fn new(settings: AnalysisSettings) -> Self {
        let eyes = EyeFeatureDetector::new(settings.under_eye_band);
        Self {
            settings,
            attributes: Box::new(NoAttributeService),
            landmarks: None,
            extractor: ColorTextureExtractor,
            eyes,
            engine: DiagnosticRuleEngine::new(),
        }
    }

    pub fn with_attribute_service(mut self, service: Box<dyn FaceAttributeService>) -> Self {
        self.attributes = service;
        self
    }

    pub fn with_landmark_service(mut self, service: Box<dyn LandmarkService>) -> Self {
        self.landmarks = Some(service);
        self
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Analyse a decoded image of any pixel format.
    pub fn analyze_dynamic(
        &self,
        image: &DynamicImage,
        face_box: Option<PixelRect>,
    ) -> Result<FaceAnalysis, AnalysisError> {
        self.analyze(&image.to_rgb8(), face_box)
    }

    /// Extract features and build the report for one frame.
    ///
    /// `face_box` overrides whatever face location the analyzer would derive.
    pub fn analyze(
        &self,
        image: &RgbImage,
        face_box: Option<PixelRect>,
    ) -> Result<FaceAnalysis, AnalysisError> {
        let _guard = timing_guard("mukha_core::analyze", Level::Debug);
        let (features, layout) = self.extract(image, face_box)?;
        let report = {
            let _guard = timing_guard("mukha_core::rules", Level::Trace);
            self.engine.evaluate(&features)
        };
        debug!(
            "analysis complete: score {} with {} finding(s), {}",
            report.health_score,
            report.diagnoses.len(),
            report.constitution.summary()
        );
        let region_boxes = layout
            .regions
            .iter()
            .filter(|(_, crop)| !crop.is_empty())
            .map(|(&name, crop)| (name, crop.rect))
            .collect();
        Ok(FaceAnalysis {
            features,
            report,
            region_boxes,
            eye_boxes: layout.eyes,
        })
    }

    /// Only the feature record, without running the rules.
    pub fn extract_features(
        &self,
        image: &RgbImage,
        face_box: Option<PixelRect>,
    ) -> Result<FrameFeatures, AnalysisError> {
        self.extract(image, face_box).map(|(features, _)| features)
    }

    fn extract(
        &self,
        image: &RgbImage,
        face_box: Option<PixelRect>,
    ) -> Result<(FrameFeatures, Layout), AnalysisError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidImage { width, height });
        }

        let attributes = {
            let _guard = timing_guard("mukha_core::attributes", Level::Trace);
            query_attributes(self.attributes.as_ref(), image)
        };
        let landmarks = self.query_landmarks(image);

        let layout = {
            let _guard = timing_guard("mukha_core::regions", Level::Trace);
            let polygons = landmarks
                .as_ref()
                .map(|points| LandmarkRegions::new(points.clone(), self.settings.polygon_padding));
            match (self.settings.region_strategy, polygons) {
                // Eyes still need a detector; without landmarks none are scanned.
                (RegionStrategy::Fractional, polygons) => Layout {
                    regions: FractionalRegions.crop_named_regions(image),
                    eyes: polygons.map(|p| p.eye_boxes(image)).unwrap_or_default(),
                },
                (RegionStrategy::Landmarks, Some(polygons)) => {
                    Layout::from_extractor(&polygons, image)
                }
                (RegionStrategy::Landmarks, None) => {
                    debug!("no landmarks for this frame; regions and eyes left empty");
                    Layout::empty()
                }
            }
        };

        // No face box unless the caller or the landmark service located the face.
        let face_box = face_box
            .map(|rect| rect.clip(width, height))
            .or_else(|| landmarks.as_ref().and_then(|lm| lm.face_box(width, height)));

        let color = {
            let _guard = timing_guard("mukha_core::color_texture", Level::Trace);
            self.extractor.extract(image)
        };
        let jaundice = self.eyes.scan_jaundice(image, &layout.eyes);
        let eyes = self.eyes.under_eye_flags(image, &layout.eyes);

        let features = FrameFeatures {
            hsv: color.hsv,
            blur: color.blur,
            regions: self.extractor.region_stats(&layout.regions),
            eyes,
            jaundice,
            eye_count: layout.eyes.len(),
            texture: color.texture,
            bright_fraction: color.bright_fraction,
            symmetry: color.symmetry,
            face_box,
            attributes,
        };
        Ok((features, layout))
    }

    fn query_landmarks(&self, image: &RgbImage) -> Option<FaceLandmarks> {
        let service = self.landmarks.as_ref()?;
        match service.landmarks(image) {
            Ok(found) => found,
            Err(err) => {
                warn!("landmark service unavailable: {err:#}");
                None
            }
        }
    }
}
