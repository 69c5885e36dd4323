use std::collections::BTreeMap;

use image::{Rgb, RgbImage};
use mukha_core::landmarks::{LEFT_EYE, RIGHT_EYE};
use mukha_core::{
    AttributeReading, Condition, Constitution, DiagnosisRecord, DiagnosticRuleEngine,
    DoshaClassifier, EyeFeatureDetector, EyeFlags, FaceAnalyzer, FaceAttributes, FaceLandmarks,
    FrameFeatures, GateVerdict, HsvMeans, JaundiceScan, JsonLandmarkService, LandmarkRegions,
    QualityGate, RegionExtractor, RejectReason, TemporalSmoother, TextureMetrics,
};
use mukha_utils::{AnalysisSettings, Point, QualityGateSettings, RegionStrategy, hsv_u8_to_rgb};
use rayon::prelude::*;

fn baseline() -> FrameFeatures {
    FrameFeatures {
        hsv: HsvMeans {
            h: 25.0,
            s: 90.0,
            v: 130.0,
        },
        blur: 150.0,
        regions: BTreeMap::new(),
        eyes: EyeFlags::default(),
        jaundice: JaundiceScan::default(),
        eye_count: 2,
        texture: TextureMetrics {
            variance: 300.0,
            edge_density: 0.05,
            brightness_std: 20.0,
        },
        bright_fraction: 0.05,
        symmetry: 4.0,
        face_box: None,
        attributes: FaceAttributes::Unavailable,
    }
}

/// Eye rims drawn as small ellipses; every other landmark at the frame centre.
fn eye_landmarks() -> FaceLandmarks {
    let mut points = vec![Point::new(0.5, 0.5); 468];
    for (group, cx) in [(&LEFT_EYE, 0.32f32), (&RIGHT_EYE, 0.68)] {
        for (k, &idx) in group.iter().enumerate() {
            let t = k as f32 / group.len() as f32 * std::f32::consts::TAU;
            points[idx] = Point::new(cx + 0.08 * t.cos(), 0.38 + 0.05 * t.sin());
        }
    }
    FaceLandmarks::new(points)
}

/// Each tweak makes exactly one more condition fire on top of `baseline`.
fn tweaks() -> Vec<(Condition, fn(&mut FrameFeatures))> {
    vec![
        (Condition::Jaundice, |f| f.jaundice = JaundiceScan::from_score(1)),
        (Condition::Acne, |f| {
            f.texture.edge_density = 0.2;
            f.texture.variance = 700.0;
        }),
        (Condition::Stress, |f| {
            f.attributes = FaceAttributes::Available(AttributeReading {
                emotion: Some("angry".to_owned()),
                ..AttributeReading::default()
            })
        }),
    ]
}

#[test]
fn healthy_fallback_scores_full_marks() {
    let report = DiagnosticRuleEngine::new().evaluate(&baseline());
    assert_eq!(report.diagnoses, vec![DiagnosisRecord::healthy()]);
    assert_eq!(report.health_score, 100);
    assert_eq!(report.recommendations.len(), 1);
}

#[test]
fn additional_rule_never_raises_score() {
    let engine = DiagnosticRuleEngine::new();
    let mut features = baseline();
    let mut previous = engine.evaluate(&features).health_score;
    for (condition, tweak) in tweaks() {
        tweak(&mut features);
        assert!(engine.fired(&features).contains(&condition));
        let score = engine.evaluate(&features).health_score;
        assert!(score <= previous, "{condition:?} raised the score");
        assert_eq!(previous - score, condition.deduction() as u8);
        previous = score;
    }
}

#[test]
fn rules_and_classifier_are_deterministic() {
    let mut features = baseline();
    for (_, tweak) in tweaks() {
        tweak(&mut features);
    }
    let engine = DiagnosticRuleEngine::new();
    let first = engine.evaluate(&features);
    for _ in 0..5 {
        assert_eq!(engine.evaluate(&features.clone()), first);
        assert_eq!(DoshaClassifier.classify(&features), first.constitution);
    }
}

#[test]
fn score_bounds_hold_on_real_frames() {
    let analyzer = FaceAnalyzer::default();
    let frames = [
        RgbImage::from_pixel(1, 1, Rgb([0, 0, 0])),
        RgbImage::from_pixel(50, 30, Rgb([255, 255, 255])),
        RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128])),
        RgbImage::from_fn(80, 60, |x, y| {
            if (x + y) % 3 == 0 {
                Rgb([250, 250, 250])
            } else {
                Rgb([30, 20, 10])
            }
        }),
    ];
    for frame in &frames {
        let analysis = analyzer.analyze(frame, None).expect("valid frame");
        assert!(analysis.report.health_score <= 100);
        assert!(!analysis.report.diagnoses.is_empty());
        assert_eq!(
            analysis.report.diagnoses.len(),
            analysis.report.recommendations.len()
        );
    }
}

#[test]
fn smoother_blends_second_observation() {
    let mut smoother = TemporalSmoother::new(0.35).expect("alpha");
    assert_eq!(smoother.observe("health_score", 80.0), 80.0);
    let smoothed = smoother.observe("health_score", 60.0);
    assert!((smoothed - 73.0).abs() < 1e-9);
}

#[test]
fn jaundiced_sclera_patch_flows_into_report() {
    let mut image = RgbImage::from_pixel(100, 100, Rgb([150, 120, 100]));
    let landmarks = eye_landmarks();
    let eyes = LandmarkRegions::new(landmarks.clone(), 0).eye_boxes(&image);
    assert_eq!(eyes.len(), 2);
    let yellow = Rgb(hsv_u8_to_rgb(30, 90, 150));
    for eye in &eyes {
        for y in eye.y..eye.bottom() {
            for x in eye.x..eye.right() {
                image.put_pixel(x, y, yellow);
            }
        }
    }

    let scan = EyeFeatureDetector::default().scan_jaundice(&image, &eyes);
    assert!(scan.detected);
    assert!(scan.score >= 1);

    let analysis = FaceAnalyzer::default()
        .with_landmark_service(Box::new(JsonLandmarkService::new(Some(landmarks))))
        .analyze(&image, None)
        .expect("analysis");
    assert_eq!(analysis.eye_boxes, eyes);
    assert_eq!(analysis.report.diagnoses[0].name, "Jaundice (Liver Issue)");
    assert_eq!(analysis.report.diagnoses[0].traditional_term, "Kamala (Pitta Aggravation)");
}

#[test]
fn faceless_yellowish_frame_is_not_jaundiced() {
    let image = RgbImage::from_pixel(120, 120, Rgb([230, 190, 120]));
    let analysis = FaceAnalyzer::default().analyze(&image, None).expect("analysis");
    assert_eq!(analysis.features.eye_count, 0);
    assert_eq!(analysis.features.jaundice, JaundiceScan::default());
    assert!(
        analysis
            .report
            .diagnoses
            .iter()
            .all(|d| d.name != "Jaundice (Liver Issue)")
    );
}

#[test]
fn frame_without_face_box_fails_gate() {
    let image = RgbImage::from_fn(120, 120, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgb([90, 110, 140])
        } else {
            Rgb([200, 210, 220])
        }
    });
    let analysis = FaceAnalyzer::default().analyze(&image, None).expect("analysis");
    assert_eq!(analysis.features.face_box, None);

    let gate = QualityGate::new(QualityGateSettings::default()).expect("gate");
    let verdict = gate.check(&image, analysis.features.face_box.as_ref(), analysis.features.blur);
    assert_eq!(verdict, GateVerdict::Rejected(RejectReason::NoFace));
    assert_eq!(verdict.reason(), "No face");
}

#[test]
fn collapsed_landmarks_yield_neutral_features() {
    let image = RgbImage::from_pixel(64, 64, Rgb([180, 140, 110]));
    let landmarks = FaceLandmarks::new(vec![Point::new(0.4, 0.4); 468]);

    let regions = LandmarkRegions::new(landmarks.clone(), 3);
    assert!(regions.crop_named_regions(&image).values().all(|r| r.is_empty()));
    assert!(regions.eye_boxes(&image).is_empty());

    let settings = AnalysisSettings {
        region_strategy: RegionStrategy::Landmarks,
        polygon_padding: 3,
        ..AnalysisSettings::default()
    };
    let analyzer = FaceAnalyzer::new(settings)
        .with_landmark_service(Box::new(JsonLandmarkService::new(Some(landmarks))));
    let features = analyzer.extract_features(&image, None).expect("features");
    assert!(features.regions.is_empty());
    assert_eq!(features.eyes, EyeFlags::default());
    assert_eq!(features.jaundice, JaundiceScan::default());
    assert_eq!(features.eye_count, 0);
}

#[test]
fn independent_frames_analyse_in_parallel() {
    let analyzer = FaceAnalyzer::default();
    let frames: Vec<RgbImage> = (0..16u8)
        .map(|i| RgbImage::from_fn(48, 48, move |x, y| Rgb([120 + i, (x * 3) as u8, (y * 3) as u8])))
        .collect();

    let sequential: Vec<_> = frames
        .iter()
        .map(|f| analyzer.analyze(f, None).expect("analysis").report)
        .collect();
    let parallel: Vec<_> = frames
        .par_iter()
        .map(|f| analyzer.analyze(f, None).expect("analysis").report)
        .collect();
    assert_eq!(sequential, parallel);
}

#[test]
fn constitution_reflects_under_eye_flags() {
    let mut features = baseline();
    features.eyes.puffiness = true;
    assert_eq!(DoshaClassifier.classify(&features), Constitution::Kapha);
    features.eyes.redness = true;
    assert_eq!(DoshaClassifier.classify(&features), Constitution::Pitta);
}
