//! Dominant constitution (dosha) classification.
//!
//! A first-match priority chain: the branches are tried in order and the first
//! one that holds decides the label. Nothing is accumulated or weighed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::FrameFeatures;

pub const VATA_MIN_VARIANCE: f64 = 800.0;
pub const PITTA_MAX_HUE: f64 = 20.0;
pub const KAPHA_MIN_VALUE: f64 = 160.0;
pub const KAPHA_MAX_SATURATION: f64 = 40.0;

/// Constitution label attached to every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Constitution {
    Vata,
    Pitta,
    Kapha,
    #[default]
    Balanced,
}

impl Constitution {
    pub fn as_str(self) -> &'static str {
        match self {
            Constitution::Vata => "Vata",
            Constitution::Pitta => "Pitta",
            Constitution::Kapha => "Kapha",
            Constitution::Balanced => "Balanced",
        }
    }

    /// Human-readable summary line.
    pub fn summary(self) -> &'static str {
        match self {
            Constitution::Vata => "Vata Dominant",
            Constitution::Pitta => "Pitta Dominant",
            Constitution::Kapha => "Kapha Dominant",
            Constitution::Balanced => "Tri-Dosha Balanced",
        }
    }
}

impl fmt::Display for Constitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DoshaClassifier;

impl DoshaClassifier {
    pub fn classify(&self, features: &FrameFeatures) -> Constitution {
        let eyes = &features.eyes;
        let hsv = &features.hsv;
        if eyes.dark_circles || features.texture.variance > VATA_MIN_VARIANCE {
            Constitution::Vata
        } else if eyes.redness || hsv.h < PITTA_MAX_HUE {
            Constitution::Pitta
        } else if eyes.puffiness || (hsv.v > KAPHA_MIN_VALUE && hsv.s < KAPHA_MAX_SATURATION) {
            Constitution::Kapha
        } else {
            Constitution::Balanced
        }
    }
}
