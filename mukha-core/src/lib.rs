//! Face wellness analysis pipeline.
//!
//! A frame goes through region extraction, colour/texture and eye feature
//! extraction into a [`FrameFeatures`] record. The rule engine turns that record
//! into a [`HealthReport`]; capture sessions smooth report scores across frames.

/// Single-frame pipeline orchestration.
pub mod analyzer;
/// External face attribute service seam.
pub mod attributes;
/// Constitution classification.
pub mod dosha;
/// Global colour and texture statistics.
pub mod extractor;
/// Sclera and under-eye checks.
pub mod eyes;
/// Per-frame feature record.
pub mod features;
/// Pre-analysis quality gate.
pub mod gate;
/// External landmark service seam and index groups.
pub mod landmarks;
/// Tinted region overlays.
pub mod overlay;
/// Fractional and landmark-driven region crops.
pub mod regions;
/// Ordered diagnostic rules and the health report.
pub mod rules;
/// Live-capture sessions.
pub mod session;
/// Exponential smoothing of named scores.
pub mod smoother;

pub use analyzer::{AnalysisError, FaceAnalysis, FaceAnalyzer};
pub use attributes::{
    AttributeReading, FaceAttributeService, FaceAttributes, JsonAttributeService,
    NoAttributeService, query_attributes,
};
pub use dosha::{Constitution, DoshaClassifier};
pub use extractor::{ColorTexture, ColorTextureExtractor};
pub use eyes::EyeFeatureDetector;
pub use features::{EyeFlags, FrameFeatures, HsvMeans, JaundiceScan, RegionName, TextureMetrics};
pub use gate::{GateVerdict, QualityGate, RejectReason};
pub use landmarks::{FaceLandmarks, JsonLandmarkService, LandmarkService};
pub use overlay::{render_overlay, tint_region};
pub use regions::{FractionalRegions, LandmarkRegions, RegionCrop, RegionExtractor, polygon_crop};
pub use rules::{Condition, Confidence, DiagnosisRecord, DiagnosticRuleEngine, HealthReport};
pub use session::{CaptureSession, FrameOutcome, score_map};
pub use smoother::{SmootherError, TemporalSmoother};

/// Returns the crate version for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use mukha_utils::Point;

    use crate::attributes::FaceAttributes;
    use crate::features::{EyeFlags, FrameFeatures, HsvMeans, JaundiceScan, TextureMetrics};
    use crate::landmarks::{FOREHEAD, FaceLandmarks, LEFT_EYE, RIGHT_EYE};

    /// Eye rims and forehead laid out as small convex rings; every other
    /// point sits at the frame centre.
    pub fn ring_landmarks() -> FaceLandmarks {
        let mut points = vec![Point::new(0.5, 0.5); 468];
        let rings: [(&[usize], (f32, f32), (f32, f32)); 3] = [
            (&LEFT_EYE, (0.32, 0.38), (0.08, 0.05)),
            (&RIGHT_EYE, (0.68, 0.38), (0.08, 0.05)),
            (&FOREHEAD, (0.5, 0.15), (0.2, 0.06)),
        ];
        for (group, (cx, cy), (rx, ry)) in rings {
            for (k, &idx) in group.iter().enumerate() {
                let t = k as f32 / group.len() as f32 * std::f32::consts::TAU;
                points[idx] = Point::new(cx + rx * t.cos(), cy + ry * t.sin());
            }
        }
        FaceLandmarks::new(points)
    }

    /// Features for which no rule fires and the constitution is balanced.
    pub fn neutral_features() -> FrameFeatures {
        FrameFeatures {
            hsv: HsvMeans {
                h: 30.0,
                s: 100.0,
                v: 120.0,
            },
            blur: 200.0,
            regions: BTreeMap::new(),
            eyes: EyeFlags::default(),
            jaundice: JaundiceScan::default(),
            eye_count: 0,
            texture: TextureMetrics {
                variance: 100.0,
                edge_density: 0.01,
                brightness_std: 10.0,
            },
            bright_fraction: 0.0,
            symmetry: 0.0,
            face_box: None,
            attributes: FaceAttributes::Unavailable,
        }
    }
}
