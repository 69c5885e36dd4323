//! Per-frame feature record consumed by the rule engine and dosha classifier.

use std::collections::BTreeMap;
use std::fmt;

use mukha_utils::{HsvStats, PixelRect};
use serde::{Deserialize, Serialize};

use crate::attributes::FaceAttributes;
use crate::rules::Confidence;

/// Anatomical sub-regions a [`crate::regions::RegionExtractor`] may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionName {
    Forehead,
    Cheeks,
    Chin,
    LeftEye,
    RightEye,
    UnderEyeLeft,
    UnderEyeRight,
    LeftCheek,
    RightCheek,
}

impl RegionName {
    pub fn as_str(self) -> &'static str {
        match self {
            RegionName::Forehead => "forehead",
            RegionName::Cheeks => "cheeks",
            RegionName::Chin => "chin",
            RegionName::LeftEye => "left_eye",
            RegionName::RightEye => "right_eye",
            RegionName::UnderEyeLeft => "under_eye_left",
            RegionName::UnderEyeRight => "under_eye_right",
            RegionName::LeftCheek => "left_cheek",
            RegionName::RightCheek => "right_cheek",
        }
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global HSV means in OpenCV units (hue 0-180, saturation/value 0-255).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HsvMeans {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl From<HsvStats> for HsvMeans {
    fn from(stats: HsvStats) -> Self {
        Self {
            h: stats.mean_h,
            s: stats.mean_s,
            v: stats.mean_v,
        }
    }
}

/// Skin texture measures over the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextureMetrics {
    /// Population variance of grayscale intensity.
    pub variance: f64,
    /// Fraction of pixels flagged by the Canny detector, in `[0, 1]`.
    pub edge_density: f64,
    /// Standard deviation of the HSV value channel.
    pub brightness_std: f64,
}

/// Under-eye flags, OR-combined across every inspected eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EyeFlags {
    pub dark_circles: bool,
    pub redness: bool,
    pub puffiness: bool,
}

/// Result of the sclera hue scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JaundiceScan {
    pub detected: bool,
    /// One unit per eye meeting the hue/saturation/value thresholds.
    pub score: u32,
}

impl JaundiceScan {
    pub fn from_score(score: u32) -> Self {
        Self {
            detected: score >= 1,
            score,
        }
    }

    /// `High` when both eyes agree, `Medium` otherwise.
    pub fn confidence(&self) -> Confidence {
        if self.score >= 2 {
            Confidence::High
        } else {
            Confidence::Medium
        }
    }
}

/// Everything measured about one frame. Built once per image and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameFeatures {
    pub hsv: HsvMeans,
    /// Laplacian variance of the grayscale frame.
    pub blur: f64,
    /// Statistics for every region that produced a non-empty crop.
    pub regions: BTreeMap<RegionName, HsvStats>,
    pub eyes: EyeFlags,
    pub jaundice: JaundiceScan,
    /// Number of eye boxes inspected by the eye detector.
    pub eye_count: usize,
    pub texture: TextureMetrics,
    /// Fraction of grayscale pixels at or above 200.
    pub bright_fraction: f64,
    /// Mean absolute difference between the left half and the mirrored right half.
    pub symmetry: f64,
    /// Face location used by the quality gate, when known.
    pub face_box: Option<PixelRect>,
    pub attributes: FaceAttributes,
}
