use crate::models::{AllowedRange, FeatureVector, Field, FEATURE_COUNT};
use serde::Serialize;
use thiserror::Error;

/// Errors that reject a submitted sample before it reaches the predictor
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("missing field '{field}'")]
    Missing { field: Field },

    #[error("field '{field}' must be a finite number, got {value}")]
    NonFinite { field: Field, value: f64 },

    #[error("field '{field}' value {value} is outside the allowed range {allowed_range}")]
    OutOfRange {
        field: Field,
        value: f64,
        allowed_range: AllowedRange,
    },

    #[error("field '{name}' must be a number")]
    NotNumeric { name: String },

    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    #[error("field '{field}' was supplied more than once")]
    DuplicateField { field: Field },
}

impl ValidationError {
    /// The measurement this error refers to, when it names a known one
    pub fn field(&self) -> Option<Field> {
        match self {
            ValidationError::Missing { field }
            | ValidationError::NonFinite { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::DuplicateField { field } => Some(*field),
            ValidationError::NotNumeric { name } | ValidationError::UnknownField { name } => {
                Field::from_name(name)
            }
        }
    }
}

/// Check a single measurement against its finite and range constraints
#[inline]
pub fn check_value(field: Field, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field, value });
    }

    let allowed_range = field.spec().range;
    if !allowed_range.contains(value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            allowed_range,
        });
    }

    Ok(value)
}

/// Turns raw named measurements into a [`FeatureVector`]
///
/// Stateless: a single instance can be shared by every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputValidator;

impl InputValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a sample, stopping at the first problem.
    ///
    /// Fields are checked in canonical order, so the reported error is the
    /// earliest failing measurement.
    pub fn validate<I, K>(&self, raw: I) -> Result<FeatureVector, ValidationError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.validate_all(raw).map_err(|mut errors| errors.swap_remove(0))
    }

    /// Validate a sample and report every problem at once
    ///
    /// The returned list is never empty on `Err`. Unknown and duplicate names
    /// come first, followed by per-field errors in canonical order.
    pub fn validate_all<I, K>(&self, raw: I) -> Result<FeatureVector, Vec<ValidationError>>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut slots: [Option<f64>; FEATURE_COUNT] = [None; FEATURE_COUNT];
        let mut errors = Vec::new();

        for (name, value) in raw {
            let name = name.as_ref();
            match Field::from_name(name) {
                Some(field) => {
                    let slot = &mut slots[field.index()];
                    if slot.is_some() {
                        errors.push(ValidationError::DuplicateField { field });
                    } else {
                        *slot = Some(value);
                    }
                }
                None => errors.push(ValidationError::UnknownField {
                    name: name.to_string(),
                }),
            }
        }

        let mut values = [0.0; FEATURE_COUNT];
        for field in Field::ALL {
            match slots[field.index()] {
                Some(value) => match check_value(field, value) {
                    Ok(v) => values[field.index()] = v,
                    Err(e) => errors.push(e),
                },
                None => errors.push(ValidationError::Missing { field }),
            }
        }

        // Order the report so the first entry is stable regardless of input order
        errors.sort_by_key(|e| match e {
            ValidationError::UnknownField { .. } | ValidationError::NotNumeric { .. } => (0, None),
            ValidationError::DuplicateField { field } => (1, Some(*field)),
            other => (2, other.field()),
        });

        if errors.is_empty() {
            Ok(FeatureVector::from_validated(values))
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<(&'static str, f64)> {
        Field::ALL.iter().map(|f| (f.key(), f.spec().default)).collect()
    }

    fn with(field: Field, value: f64) -> Vec<(&'static str, f64)> {
        let mut sample = defaults();
        sample[field.index()].1 = value;
        sample
    }

    #[test]
    fn test_defaults_accepted() {
        let vector = InputValidator::new().validate(defaults()).unwrap();
        assert_eq!(vector.get(Field::Ph), 7.5);
        assert_eq!(vector.get(Field::Turbidity), 2.0);
    }

    #[test]
    fn test_canonical_order_independent_of_input_order() {
        let mut sample = defaults();
        sample.reverse();
        let vector = InputValidator::new().validate(sample).unwrap();
        let expected: Vec<f64> = Field::ALL.iter().map(|f| f.spec().default).collect();
        assert_eq!(vector.as_array().to_vec(), expected);
    }

    #[test]
    fn test_boundaries_inclusive() {
        let validator = InputValidator::new();
        for field in Field::ALL {
            let range = field.spec().range;
            assert!(validator.validate(with(field, range.min)).is_ok(), "{} min", field);
            assert!(validator.validate(with(field, range.max)).is_ok(), "{} max", field);
        }
    }

    #[test]
    fn test_out_of_range_names_field() {
        let validator = InputValidator::new();
        for field in Field::ALL {
            let range = field.spec().range;
            for value in [range.min - 0.001, range.max + 0.001] {
                match validator.validate(with(field, value)) {
                    Err(ValidationError::OutOfRange { field: f, allowed_range, .. }) => {
                        assert_eq!(f, field);
                        assert_eq!(allowed_range, range);
                    }
                    other => panic!("expected out of range for {}, got {:?}", field, other),
                }
            }
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let validator = InputValidator::new();
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = validator.validate(with(Field::Sulfate, value)).unwrap_err();
            assert!(matches!(err, ValidationError::NonFinite { field: Field::Sulfate, .. }));
        }
    }

    #[test]
    fn test_missing_field() {
        let mut sample = defaults();
        sample.retain(|(k, _)| *k != "chloramines");
        let err = InputValidator::new().validate(sample).unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: Field::Chloramines });
    }

    #[test]
    fn test_unknown_and_duplicate_fields() {
        let mut sample = defaults();
        sample.push(("lead", 0.01));
        sample.push(("pH", 7.0));
        let errors = InputValidator::new().validate_all(sample).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], ValidationError::UnknownField { name: "lead".to_string() });
        assert_eq!(errors[1], ValidationError::DuplicateField { field: Field::Ph });
    }

    #[test]
    fn test_validate_all_collects_every_error() {
        let mut sample = with(Field::Ph, 20.0);
        sample[Field::Turbidity.index()].1 = -1.0;
        let errors = InputValidator::new().validate_all(sample).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field(), Some(Field::Ph));
        assert_eq!(errors[1].field(), Some(Field::Turbidity));
    }

    #[test]
    fn test_error_message() {
        let err = check_value(Field::Ph, 20.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'ph' value 20 is outside the allowed range [0.0, 14.0]"
        );
    }
}
