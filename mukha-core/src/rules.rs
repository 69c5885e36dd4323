//! Diagnostic rule engine.
//!
//! Every [`Condition`] is an independent predicate over [`FrameFeatures`].
//! They are evaluated in the order of [`Condition::ALL`]; each one that fires
//! appends its record and subtracts its deduction from a baseline of 100.
//! When none fires the report carries a single healthy record.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dosha::{Constitution, DoshaClassifier};
use crate::features::FrameFeatures;

/// Score every report starts from.
pub const BASELINE_SCORE: i32 = 100;

/// Emotion labels that indicate stress, matched exactly.
pub const STRESS_EMOTIONS: [&str; 3] = ["sad", "fear", "angry"];

/// Ordinal confidence tier. Not a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        })
    }
}

/// One candidate condition in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub name: String,
    pub traditional_term: String,
    pub confidence: Confidence,
    pub description: String,
    pub remedy: String,
}

impl DiagnosisRecord {
    fn new(
        name: &str,
        traditional_term: &str,
        confidence: Confidence,
        description: &str,
        remedy: &str,
    ) -> Self {
        Self {
            name: name.to_owned(),
            traditional_term: traditional_term.to_owned(),
            confidence,
            description: description.to_owned(),
            remedy: remedy.to_owned(),
        }
    }

    /// Record used when no condition fires.
    pub fn healthy() -> Self {
        Self::new(
            "Healthy",
            "Swastha",
            Confidence::High,
            "No major imbalances detected.",
            "Continue healthy routine.",
        )
    }

    /// Recommendation line derived from this record alone.
    pub fn recommendation(&self) -> String {
        format!("{}: {}", self.traditional_term, self.remedy)
    }
}

/// The conditions the engine can report, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Jaundice,
    Vitiligo,
    Anemia,
    Acne,
    DrySkin,
    Dehydration,
    Stress,
}

impl Condition {
    pub const ALL: [Condition; 7] = [
        Condition::Jaundice,
        Condition::Vitiligo,
        Condition::Anemia,
        Condition::Acne,
        Condition::DrySkin,
        Condition::Dehydration,
        Condition::Stress,
    ];

    /// Whether the condition's predicate holds.
    pub fn fires(self, f: &FrameFeatures) -> bool {
        match self {
            Condition::Jaundice => f.jaundice.detected,
            Condition::Vitiligo => {
                f.bright_fraction > 0.20 && f.hsv.s < 55.0 && f.texture.brightness_std > 35.0
            }
            Condition::Anemia => f.hsv.s < 40.0 && f.hsv.v > 140.0,
            Condition::Acne => f.texture.edge_density > 0.12 && f.texture.variance > 600.0,
            Condition::DrySkin => f.texture.variance > 800.0 && f.hsv.s < 55.0,
            Condition::Dehydration => f.hsv.v < 90.0 && f.blur < 60.0,
            Condition::Stress => f.attributes.emotion().is_some_and(is_stress_emotion),
        }
    }

    /// Points subtracted from the health score when the condition fires.
    pub fn deduction(self) -> i32 {
        match self {
            Condition::Jaundice => 30,
            Condition::Vitiligo | Condition::Anemia => 15,
            Condition::Acne => 12,
            Condition::DrySkin | Condition::Dehydration | Condition::Stress => 10,
        }
    }

    /// The record appended when the condition fires.
    pub fn record(self, f: &FrameFeatures) -> DiagnosisRecord {
        match self {
            Condition::Jaundice => DiagnosisRecord::new(
                "Jaundice (Liver Issue)",
                "Kamala (Pitta Aggravation)",
                f.jaundice.confidence(),
                "Yellow sclera suggests liver imbalance.",
                "Avoid spicy/oily food. Take sugarcane juice & Kutki herbs.",
            ),
            Condition::Vitiligo => DiagnosisRecord::new(
                "Vitiligo / Hypopigmentation",
                "Shwitra",
                Confidence::Medium,
                "Patchy depigmentation detected.",
                "Apply Bakuchi oil; morning sunlight recommended.",
            ),
            Condition::Anemia => DiagnosisRecord::new(
                "Anemia",
                "Pandu Roga",
                Confidence::Medium,
                "Pale complexion detected.",
                "Eat beetroot, pomegranate, leafy greens.",
            ),
            Condition::Acne => DiagnosisRecord::new(
                "Acne / Blemishes",
                "Mukha Dushika",
                Confidence::Medium,
                "Blemish & pore density elevated.",
                "Neem water facewash; avoid oily foods.",
            ),
            Condition::DrySkin => DiagnosisRecord::new(
                "Dry Skin / Eczema",
                "Vicharchika",
                Confidence::Low,
                "Skin roughness detected.",
                "Sesame oil massage; hydrate well.",
            ),
            Condition::Dehydration => DiagnosisRecord::new(
                "Dehydration",
                "Udakavaha Srotas Dushti",
                Confidence::Medium,
                "Low moisture & skin dullness detected.",
                "Drink more water; eat juicy fruits.",
            ),
            Condition::Stress => DiagnosisRecord::new(
                "Stress / Anxiety",
                "Chittodvega",
                Confidence::Medium,
                "Emotional imbalance visible.",
                "Meditation, Shirodhara, Brahmi tea.",
            ),
        }
    }
}

fn is_stress_emotion(emotion: &str) -> bool {
    STRESS_EMOTIONS.contains(&emotion)
}

/// Wellness report for one frame. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Fired conditions in evaluation order; index 0 is the primary finding.
    pub diagnoses: Vec<DiagnosisRecord>,
    /// `max(0, 100 - sum of deductions)`.
    pub health_score: u8,
    pub constitution: Constitution,
    /// One line per diagnosis, index for index.
    pub recommendations: Vec<String>,
}

impl HealthReport {
    /// The first diagnosis, which downstream consumers treat as the main finding.
    pub fn primary(&self) -> Option<&DiagnosisRecord> {
        self.diagnoses.first()
    }
}

/// Evaluates every condition and classifies the constitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticRuleEngine {
    classifier: DoshaClassifier,
}

impl DiagnosticRuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conditions that fire for these features, in evaluation order.
    pub fn fired(&self, features: &FrameFeatures) -> Vec<Condition> {
        Condition::ALL
            .into_iter()
            .filter(|condition| condition.fires(features))
            .collect()
    }

    pub fn evaluate(&self, features: &FrameFeatures) -> HealthReport {
        let fired = self.fired(features);
        let total: i32 = fired.iter().map(|c| c.deduction()).sum();
        for condition in &fired {
            debug!("rule {condition:?} fired (-{})", condition.deduction());
        }

        let mut diagnoses: Vec<DiagnosisRecord> =
            fired.iter().map(|condition| condition.record(features)).collect();
        if diagnoses.is_empty() {
            diagnoses.push(DiagnosisRecord::healthy());
        }
        let recommendations = diagnoses.iter().map(DiagnosisRecord::recommendation).collect();

        HealthReport {
            diagnoses,
            health_score: (BASELINE_SCORE - total).clamp(0, BASELINE_SCORE) as u8,
            constitution: self.classifier.classify(features),
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeReading, FaceAttributes};
    use crate::features::JaundiceScan;
    use crate::test_support::neutral_features;

    fn with_emotion(emotion: &str) -> FrameFeatures {
        let mut f = neutral_features();
        f.attributes = FaceAttributes::Available(AttributeReading {
            emotion: Some(emotion.to_owned()),
            ..AttributeReading::default()
        });
        f
    }

    #[test]
    fn nothing_fires_on_neutral_frame() {
        let report = DiagnosticRuleEngine::new().evaluate(&neutral_features());
        assert_eq!(report.diagnoses, vec![DiagnosisRecord::healthy()]);
        assert_eq!(report.health_score, 100);
        assert_eq!(report.recommendations, vec!["Swastha: Continue healthy routine."]);
        assert_eq!(report.constitution, Constitution::Balanced);
    }

    #[test]
    fn jaundice_confidence_follows_score() {
        let mut f = neutral_features();
        f.jaundice = JaundiceScan::from_score(1);
        let report = DiagnosticRuleEngine::new().evaluate(&f);
        assert_eq!(report.diagnoses[0].name, "Jaundice (Liver Issue)");
        assert_eq!(report.diagnoses[0].confidence, Confidence::Medium);
        assert_eq!(report.health_score, 70);

        f.jaundice = JaundiceScan::from_score(2);
        let report = DiagnosticRuleEngine::new().evaluate(&f);
        assert_eq!(report.diagnoses[0].confidence, Confidence::High);
    }

    #[test]
    fn each_condition_fires_alone() {
        let engine = DiagnosticRuleEngine::new();
        let cases: [(Condition, fn(&mut FrameFeatures)); 6] = [
            (Condition::Vitiligo, |f| {
                f.bright_fraction = 0.25;
                f.hsv.s = 50.0;
                f.texture.brightness_std = 40.0;
            }),
            (Condition::Anemia, |f| {
                f.hsv.s = 39.0;
                f.hsv.v = 150.0;
            }),
            (Condition::Acne, |f| {
                f.texture.edge_density = 0.13;
                f.texture.variance = 650.0;
            }),
            (Condition::DrySkin, |f| {
                f.texture.variance = 900.0;
                f.hsv.s = 54.0;
                f.bright_fraction = 0.0;
            }),
            (Condition::Dehydration, |f| {
                f.hsv.v = 80.0;
                f.blur = 30.0;
            }),
            (Condition::Jaundice, |f| f.jaundice = JaundiceScan::from_score(1)),
        ];
        for (expected, tweak) in cases {
            let mut f = neutral_features();
            tweak(&mut f);
            let fired = engine.fired(&f);
            assert!(fired.contains(&expected), "{expected:?} did not fire: {fired:?}");
        }
    }

    #[test]
    fn stress_matches_exact_labels() {
        let engine = DiagnosticRuleEngine::new();
        for emotion in ["sad", "fear", "angry"] {
            assert_eq!(engine.fired(&with_emotion(emotion)), vec![Condition::Stress]);
        }
        for emotion in ["happy", "Sad", " angry", "fearful"] {
            assert!(engine.fired(&with_emotion(emotion)).is_empty(), "{emotion:?} fired");
        }
        assert!(engine.fired(&neutral_features()).is_empty());
    }

    #[test]
    fn diagnoses_follow_rule_order() {
        let mut f = with_emotion("sad");
        f.jaundice = JaundiceScan::from_score(2);
        f.hsv.s = 30.0;
        f.hsv.v = 150.0;
        f.texture.variance = 900.0;
        f.texture.edge_density = 0.2;

        let report = DiagnosticRuleEngine::new().evaluate(&f);
        let names: Vec<&str> = report.diagnoses.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Jaundice (Liver Issue)",
                "Anemia",
                "Acne / Blemishes",
                "Dry Skin / Eczema",
                "Stress / Anxiety",
            ]
        );
        assert_eq!(report.health_score, 100 - 30 - 15 - 12 - 10 - 10);
        assert_eq!(report.primary(), report.diagnoses.first());
        assert_eq!(report.primary().map(|d| d.confidence), Some(Confidence::High));
        assert_eq!(report.recommendations.len(), report.diagnoses.len());
        assert_eq!(
            report.recommendations[0],
            "Kamala (Pitta Aggravation): Avoid spicy/oily food. Take sugarcane juice & Kutki herbs."
        );
        assert_eq!(report.constitution, Constitution::Vata);
    }

    #[test]
    fn heaviest_reachable_combination() {
        let total: i32 = Condition::ALL.iter().map(|c| c.deduction()).sum();
        assert_eq!(total, 102);

        // Anemia and dehydration need opposite brightness, so at most six fire.
        let mut f = with_emotion("angry");
        f.jaundice = JaundiceScan::from_score(2);
        f.bright_fraction = 0.5;
        f.hsv.s = 30.0;
        f.hsv.v = 150.0;
        f.texture.brightness_std = 50.0;
        f.texture.variance = 900.0;
        f.texture.edge_density = 0.3;
        f.blur = 10.0;
        let report = DiagnosticRuleEngine::new().evaluate(&f);
        assert_eq!(report.diagnoses.len(), 6);
        assert!(!DiagnosticRuleEngine::new().fired(&f).contains(&Condition::Dehydration));
        assert_eq!(report.health_score, 8);
    }
}
