//! Face attribute service seam (emotion, age, ancestry).
//!
//! Attribute models run outside this crate. Whatever they return is folded into
//! [`FaceAttributes`]: a failing or absent service becomes
//! [`FaceAttributes::Unavailable`] and analysis carries on without it.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use image::RgbImage;
use log::warn;
use serde::{Deserialize, Serialize};

/// Dominant attributes reported by an external model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeReading {
    #[serde(default, alias = "dominant_emotion")]
    pub emotion: Option<String>,
    #[serde(default)]
    pub age: Option<f32>,
    #[serde(default, alias = "dominant_race")]
    pub race: Option<String>,
}

/// Attributes attached to a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FaceAttributes {
    Available(AttributeReading),
    /// The service failed or is not configured.
    #[default]
    Unavailable,
}

impl FaceAttributes {
    pub fn emotion(&self) -> Option<&str> {
        match self {
            FaceAttributes::Available(reading) => reading.emotion.as_deref(),
            FaceAttributes::Unavailable => None,
        }
    }

    pub fn age(&self) -> Option<f32> {
        match self {
            FaceAttributes::Available(reading) => reading.age,
            FaceAttributes::Unavailable => None,
        }
    }

    pub fn race(&self) -> Option<&str> {
        match self {
            FaceAttributes::Available(reading) => reading.race.as_deref(),
            FaceAttributes::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, FaceAttributes::Available(_))
    }
}

/// External estimator of dominant emotion, age and ancestry for a face.
pub trait FaceAttributeService: Send + Sync {
    fn analyze(&self, image: &RgbImage) -> Result<AttributeReading>;
}

/// Query a service, turning any failure into [`FaceAttributes::Unavailable`].
pub fn query_attributes(service: &dyn FaceAttributeService, image: &RgbImage) -> FaceAttributes {
    match service.analyze(image) {
        Ok(reading) => FaceAttributes::Available(reading),
        Err(err) => {
            warn!("face attribute service unavailable: {err:#}");
            FaceAttributes::Unavailable
        }
    }
}

/// Service used when no attribute model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttributeService;

impl FaceAttributeService for NoAttributeService {
    fn analyze(&self, _image: &RgbImage) -> Result<AttributeReading> {
        anyhow::bail!("no face attribute service configured")
    }
}

/// Serves a fixed reading loaded from JSON, e.g. the output of an
/// out-of-process attribute model.
#[derive(Debug, Clone)]
pub struct JsonAttributeService {
    reading: AttributeReading,
}

impl JsonAttributeService {
    pub fn new(reading: AttributeReading) -> Self {
        Self { reading }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read attributes {}", path.display()))?;
        let reading = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse attributes JSON at {}", path.display()))?;
        Ok(Self { reading })
    }
}

impl FaceAttributeService for JsonAttributeService {
    fn analyze(&self, _image: &RgbImage) -> Result<AttributeReading> {
        Ok(self.reading.clone())
    }
}
