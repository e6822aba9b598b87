// Integration tests for the potability pipeline

use potability::core::{InputValidator, LoadError, PotabilityPredictor, PredictionError, ValidationError};
use potability::models::{AllowedRange, Field, Verdict};
use potability::services::ModelStore;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const MODEL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models/potability_forest.json");

fn default_sample() -> Vec<(&'static str, f64)> {
    vec![
        ("ph", 7.5),
        ("hardness", 120.0),
        ("solids", 250.0),
        ("chloramines", 2.0),
        ("sulfate", 180.0),
        ("conductivity", 400.0),
        ("organic_carbon", 5.0),
        ("trihalomethanes", 40.0),
        ("turbidity", 2.0),
    ]
}

#[test]
fn test_integration_defaults_produce_verdict() {
    let predictor = PotabilityPredictor::load(MODEL_PATH).unwrap();

    let verdict = predictor.assess(default_sample());

    assert!(verdict.is_ok(), "Expected a verdict, got {:?}", verdict);
}

#[test]
fn test_integration_ph_above_max_rejected() {
    let predictor = PotabilityPredictor::load(MODEL_PATH).unwrap();
    let mut sample = default_sample();
    sample[0].1 = 20.0;

    let err = predictor.assess(sample).unwrap_err();

    assert_eq!(
        err,
        PredictionError::Validation(ValidationError::OutOfRange {
            field: Field::Ph,
            value: 20.0,
            allowed_range: AllowedRange { min: 0.0, max: 14.0 },
        })
    );
}

#[test]
fn test_integration_missing_model_prevents_serving() {
    let store = ModelStore::new("/no/such/potability_forest.json");

    let err = store.get_or_load().unwrap_err();

    assert!(matches!(err, LoadError::NotFound(_)));
    assert!(!store.is_loaded());
}

#[test]
fn test_concurrent_predictions_agree() {
    let predictor = PotabilityPredictor::load(MODEL_PATH).unwrap();
    let features = InputValidator::new().validate(default_sample()).unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let predictor = predictor.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|_| predictor.predict(&features).unwrap())
                    .collect::<Vec<Verdict>>()
            })
        })
        .collect();

    let verdicts: Vec<Verdict> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    assert_eq!(verdicts.len(), 16 * 50);
    assert!(verdicts.iter().all(|v| *v == verdicts[0]));
}

#[test]
fn test_predict_many_matches_sequential() {
    let predictor = PotabilityPredictor::load(MODEL_PATH).unwrap();
    let validator = InputValidator::new();

    let samples: Vec<_> = (0..=140)
        .map(|i| {
            let mut sample = default_sample();
            sample[0].1 = i as f64 / 10.0;
            validator.validate(sample).unwrap()
        })
        .collect();

    let parallel = predictor.predict_many(&samples);
    let sequential: Vec<_> = samples.iter().map(|s| predictor.predict(s)).collect();

    assert_eq!(parallel, sequential);
}

#[test]
fn test_model_store_loads_once_under_contention() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let store = Arc::new(ModelStore::with_loader(MODEL_PATH, move |path: &Path| {
        counter.fetch_add(1, Ordering::SeqCst);
        // Keep the cell busy so the other threads arrive mid-load
        thread::sleep(Duration::from_millis(50));
        PotabilityPredictor::load(path)
    }));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.get_or_load().map(|_| ())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(store.is_loaded());
}
