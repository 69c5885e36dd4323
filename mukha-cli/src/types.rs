//! Serializable output records for mukha.

use std::collections::BTreeMap;

use mukha_core::{FaceAnalysis, FaceAttributes, FrameFeatures, GateVerdict, HealthReport};
use serde::Serialize;

/// Message reported for inputs that cannot be decoded or have no pixels.
pub const INVALID_IMAGE: &str = "invalid image";

/// Result for one input image.
#[derive(Debug, Serialize)]
pub struct ImageReport {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<HealthReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<FaceAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FrameFeatures>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated: Option<String>,
    /// Smoothed scores after this frame (session mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed: Option<BTreeMap<String, f64>>,
}

impl ImageReport {
    pub fn invalid(image: String) -> Self {
        Self {
            image,
            error: Some(INVALID_IMAGE.to_owned()),
            gate: None,
            report: None,
            summary: None,
            attributes: None,
            features: None,
            annotated: None,
            smoothed: None,
        }
    }

    /// Record for an analysed image. `analysis` is `None` for frames a capture
    /// session rejected.
    pub fn analysed(image: String, gate: GateVerdict, analysis: Option<FaceAnalysis>) -> Self {
        let (report, summary, attributes, features) = match analysis {
            Some(analysis) => {
                let summary = analysis.report.constitution.summary();
                let attributes = analysis.features.attributes.clone();
                (
                    Some(analysis.report),
                    Some(summary),
                    Some(attributes),
                    Some(analysis.features),
                )
            }
            None => (None, None, None, None),
        };
        Self {
            image,
            error: None,
            gate: Some(gate),
            report,
            summary,
            attributes,
            features,
            annotated: None,
            smoothed: None,
        }
    }
}
