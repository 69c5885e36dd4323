//! Continuous capture: gate, analyse and smooth successive frames.

use std::collections::BTreeMap;

use image::RgbImage;
use log::{debug, info};
use mukha_utils::{AppSettings, PixelRect};
use serde::Serialize;

use crate::analyzer::{AnalysisError, FaceAnalysis, FaceAnalyzer};
use crate::gate::{GateVerdict, QualityGate};
use crate::smoother::{SmootherError, TemporalSmoother};

pub const SCORE_HEALTH: &str = "health_score";
pub const SCORE_JAUNDICE: &str = "jaundice_score";
pub const SCORE_SYMMETRY: &str = "symmetry";
pub const SCORE_EDGE_DENSITY: &str = "edge_density";
pub const SCORE_TEXTURE_VARIANCE: &str = "texture_variance";

/// Raw named scores of one analysed frame.
pub fn score_map(analysis: &FaceAnalysis) -> BTreeMap<String, f64> {
    let features = &analysis.features;
    [
        (SCORE_HEALTH, analysis.report.health_score as f64),
        (SCORE_JAUNDICE, features.jaundice.score as f64),
        (SCORE_SYMMETRY, features.symmetry),
        (SCORE_EDGE_DENSITY, features.texture.edge_density),
        (SCORE_TEXTURE_VARIANCE, features.texture.variance),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_owned(), value))
    .collect()
}

/// What a session produced for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub index: usize,
    pub verdict: GateVerdict,
    /// Present only for accepted frames.
    pub analysis: Option<FaceAnalysis>,
    /// Smoothed scores after this frame; empty until a frame is accepted.
    pub smoothed: BTreeMap<String, f64>,
}

/// One live-capture session. Dropping it discards the smoothing state.
pub struct CaptureSession<'a> {
    analyzer: &'a FaceAnalyzer,
    gate: QualityGate,
    smoother: TemporalSmoother,
    frames: usize,
    accepted: usize,
}

impl<'a> CaptureSession<'a> {
    pub fn new(
        analyzer: &'a FaceAnalyzer,
        gate: QualityGate,
        alpha: f64,
    ) -> Result<Self, SmootherError> {
        Ok(Self {
            analyzer,
            gate,
            smoother: TemporalSmoother::new(alpha)?,
            frames: 0,
            accepted: 0,
        })
    }

    /// Session using the gate thresholds and smoothing factor from `settings`.
    pub fn from_settings(
        analyzer: &'a FaceAnalyzer,
        settings: &AppSettings,
    ) -> Result<Self, AnalysisError> {
        let gate = QualityGate::new(settings.quality_gate)?;
        Self::new(analyzer, gate, settings.analysis.smoothing_alpha).map_err(AnalysisError::from)
    }

    /// Analyse the frame, gate it on the measured face box and blur, and fold
    /// the scores of accepted frames into the running averages.
    ///
    /// Rejected frames leave the smoothing state untouched.
    pub fn process(
        &mut self,
        image: &RgbImage,
        face_box: Option<PixelRect>,
    ) -> Result<FrameOutcome, AnalysisError> {
        let index = self.frames;
        self.frames += 1;

        let analysis = self.analyzer.analyze(image, face_box)?;
        let features = &analysis.features;
        let verdict = self.gate.check(image, features.face_box.as_ref(), features.blur);
        if !verdict.is_accepted() {
            debug!("frame {index} rejected: {}", verdict.reason());
            return Ok(FrameOutcome {
                index,
                verdict,
                analysis: None,
                smoothed: self.smoother.snapshot().clone(),
            });
        }

        let smoothed_now = self.smoother.update(&score_map(&analysis));
        self.accepted += 1;
        debug!(
            "frame {index} accepted, smoothed health {:.1}",
            smoothed_now.get(SCORE_HEALTH).copied().unwrap_or_default()
        );
        Ok(FrameOutcome {
            index,
            verdict,
            analysis: Some(analysis),
            smoothed: self.smoother.snapshot().clone(),
        })
    }

    pub fn smoothed(&self, key: &str) -> Option<f64> {
        self.smoother.get(key)
    }

    pub fn frames_seen(&self) -> usize {
        self.frames
    }

    pub fn frames_accepted(&self) -> usize {
        self.accepted
    }
}

impl Drop for CaptureSession<'_> {
    fn drop(&mut self) {
        if self.frames > 0 {
            info!(
                "capture session closed: {}/{} frame(s) accepted",
                self.accepted, self.frames
            );
        }
    }
}
