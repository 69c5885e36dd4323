//! Pre-analysis frame acceptability check.
//!
//! The gate is advisory. Batch analysis reports its verdict next to the report,
//! while [`crate::session::CaptureSession`] drops rejected frames before they
//! reach the rule engine.

use std::fmt;

use image::RgbImage;
use mukha_utils::{ConfigError, PixelRect, QualityGateSettings, mean_lightness};
use serde::{Serialize, Serializer};

/// Why a frame was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoFace,
    FaceTooSmall,
    TooBlurry,
    TooDark,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::NoFace => "No face",
            RejectReason::FaceTooSmall => "Face too small",
            RejectReason::TooBlurry => "Too blurry",
            RejectReason::TooDark => "Too dark",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`QualityGate::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Accepted,
    Rejected(RejectReason),
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateVerdict::Accepted)
    }

    /// `"OK"` for accepted frames, otherwise the rejection reason.
    pub fn reason(&self) -> &'static str {
        match self {
            GateVerdict::Accepted => "OK",
            GateVerdict::Rejected(reason) => reason.as_str(),
        }
    }
}

impl Serialize for GateVerdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("GateVerdict", 2)?;
        state.serialize_field("accepted", &self.is_accepted())?;
        state.serialize_field("reason", self.reason())?;
        state.end()
    }
}

/// Face size, focus and lighting thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityGate {
    settings: QualityGateSettings,
}

impl QualityGate {
    /// Build a gate, failing on out-of-range thresholds.
    pub fn new(settings: QualityGateSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &QualityGateSettings {
        &self.settings
    }

    /// Check a frame. Criteria are tried in order: face present, face size,
    /// blur, lightness. A face ratio equal to `min_face_ratio` is accepted.
    pub fn check(&self, image: &RgbImage, face_box: Option<&PixelRect>, blur: f64) -> GateVerdict {
        let Some(face) = face_box else {
            return GateVerdict::Rejected(RejectReason::NoFace);
        };
        let frame_area = image.width() as u64 * image.height() as u64;
        if frame_area == 0 {
            return GateVerdict::Rejected(RejectReason::NoFace);
        }
        let ratio = face.area() as f64 / frame_area as f64;
        if ratio < self.settings.min_face_ratio {
            return GateVerdict::Rejected(RejectReason::FaceTooSmall);
        }
        if blur < self.settings.blur_min_laplacian {
            return GateVerdict::Rejected(RejectReason::TooBlurry);
        }
        if mean_lightness(image) < self.settings.min_light_l_mean {
            return GateVerdict::Rejected(RejectReason::TooDark);
        }
        GateVerdict::Accepted
    }
}
