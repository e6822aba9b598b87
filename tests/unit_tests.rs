// Unit tests for the potability pipeline

use potability::core::{
    check_value, Classifier, InferenceError, InputValidator, LoadError, PotabilityModel,
    PotabilityPredictor, ValidationError,
};
use potability::models::{Field, Verdict, FIELD_SPECS};
use std::io::Write;

const MODEL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models/potability_forest.json");

fn sample_with(field: Field, value: f64) -> Vec<(&'static str, f64)> {
    Field::ALL
        .iter()
        .map(|f| (f.key(), if *f == field { value } else { f.spec().default }))
        .collect()
}

fn unsafe_sample() -> Vec<(&'static str, f64)> {
    vec![
        ("ph", 3.0),
        ("hardness", 120.0),
        ("solids", 250.0),
        ("chloramines", 8.0),
        ("sulfate", 400.0),
        ("conductivity", 900.0),
        ("organic_carbon", 18.0),
        ("trihalomethanes", 150.0),
        ("turbidity", 2.0),
    ]
}

#[test]
fn test_below_min_rejected_for_every_field() {
    let validator = InputValidator::new();
    for spec in FIELD_SPECS.iter() {
        let err = validator
            .validate(sample_with(spec.field, spec.range.min - 0.5))
            .unwrap_err();
        assert_eq!(err.field(), Some(spec.field));
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }
}

#[test]
fn test_above_max_rejected_for_every_field() {
    let validator = InputValidator::new();
    for spec in FIELD_SPECS.iter() {
        let err = validator
            .validate(sample_with(spec.field, spec.range.max + 0.5))
            .unwrap_err();
        assert_eq!(err.field(), Some(spec.field));
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }
}

#[test]
fn test_exact_bounds_accepted_for_every_field() {
    let validator = InputValidator::new();
    for spec in FIELD_SPECS.iter() {
        let min = validator.validate(sample_with(spec.field, spec.range.min)).unwrap();
        let max = validator.validate(sample_with(spec.field, spec.range.max)).unwrap();
        assert_eq!(min.get(spec.field), spec.range.min);
        assert_eq!(max.get(spec.field), spec.range.max);
    }
}

#[test]
fn test_check_value_rejects_nan() {
    assert!(matches!(
        check_value(Field::Turbidity, f64::NAN),
        Err(ValidationError::NonFinite { field: Field::Turbidity, .. })
    ));
    assert_eq!(check_value(Field::Turbidity, 10.0), Ok(10.0));
}

#[test]
fn test_bundled_model_loads() {
    let model = PotabilityModel::load(MODEL_PATH).unwrap();
    assert_eq!(model.n_features(), 9);
    assert_eq!(model.classes(), &[0, 1]);
    assert!(model.n_trees() > 0);
}

#[test]
fn test_bundled_model_verdicts() {
    let predictor = PotabilityPredictor::load(MODEL_PATH).unwrap();
    let validator = InputValidator::new();

    let defaults = validator.validate(sample_with(Field::Ph, 7.5)).unwrap();
    assert_eq!(predictor.predict(&defaults), Ok(Verdict::Safe));

    let polluted = validator.validate(unsafe_sample()).unwrap();
    assert_eq!(predictor.predict(&polluted), Ok(Verdict::Unsafe));
}

#[test]
fn test_predict_is_deterministic() {
    let predictor = PotabilityPredictor::load(MODEL_PATH).unwrap();
    let features = InputValidator::new().validate(unsafe_sample()).unwrap();
    let first = predictor.predict(&features);
    for _ in 0..100 {
        assert_eq!(predictor.predict(&features), first);
    }
}

#[test]
fn test_non_binary_label_is_inference_error() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/label_two_forest.json");
    let predictor = PotabilityPredictor::load(path).unwrap();
    let features = InputValidator::new().validate(sample_with(Field::Ph, 7.0)).unwrap();
    assert_eq!(
        predictor.predict(&features),
        Err(InferenceError::UnexpectedLabel { label: 2 })
    );
}

#[test]
fn test_missing_artifact_is_load_error() {
    let err = PotabilityPredictor::load("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)));
}

#[test]
fn test_truncated_artifact_is_load_error() {
    let contents = std::fs::read_to_string(MODEL_PATH).unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&contents.as_bytes()[..contents.len() / 2]).unwrap();

    let err = PotabilityPredictor::load(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Corrupt(_)));
}

#[test]
fn test_eight_feature_artifact_is_load_error() {
    let contents = std::fs::read_to_string(MODEL_PATH)
        .unwrap()
        .replace("\"n_features\": 9", "\"n_features\": 8");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();

    let err = PotabilityPredictor::load(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Incompatible(_)));
}
