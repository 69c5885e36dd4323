//! Exponential moving average over named scores.
//!
//! One smoother belongs to one logical session (a camera stream, a client
//! connection). It has no notion of session boundaries: create a new instance
//! for a new session and drop it when the session ends.

use std::collections::BTreeMap;

use thiserror::Error;

/// Default smoothing factor.
pub const DEFAULT_ALPHA: f64 = 0.35;

#[derive(Debug, Error, PartialEq)]
pub enum SmootherError {
    #[error("smoothing factor {0} must lie strictly between 0 and 1")]
    InvalidAlpha(f64),
}

/// Per-key EMA state.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalSmoother {
    alpha: f64,
    state: BTreeMap<String, f64>,
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            state: BTreeMap::new(),
        }
    }
}

impl TemporalSmoother {
    pub fn new(alpha: f64) -> Result<Self, SmootherError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(SmootherError::InvalidAlpha(alpha));
        }
        Ok(Self {
            alpha,
            state: BTreeMap::new(),
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Fold one observation into a key and return its smoothed value.
    ///
    /// The first observation of a key is taken as is.
    pub fn observe(&mut self, key: &str, raw: f64) -> f64 {
        let alpha = self.alpha;
        let smoothed = match self.state.get(key) {
            Some(&prev) => alpha * raw + (1.0 - alpha) * prev,
            None => raw,
        };
        self.state.insert(key.to_owned(), smoothed);
        smoothed
    }

    /// Fold a batch of observations. Keys not present are left untouched.
    ///
    /// Returns the smoothed values of the keys that were observed.
    pub fn update(&mut self, scores: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        scores
            .iter()
            .map(|(key, &raw)| (key.clone(), self.observe(key, raw)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.state.get(key).copied()
    }

    /// Every smoothed value seen so far.
    pub fn snapshot(&self) -> &BTreeMap<String, f64> {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.clear();
    }
}
