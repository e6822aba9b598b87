use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of measurements the classifier was trained on
pub const FEATURE_COUNT: usize = 9;

/// One of the nine water quality measurements
///
/// Declaration order is the column order of the training schema and must not
/// be changed without retraining the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Ph,
    Hardness,
    Solids,
    Chloramines,
    Sulfate,
    Conductivity,
    OrganicCarbon,
    Trihalomethanes,
    Turbidity,
}

impl Field {
    /// All fields in canonical order
    pub const ALL: [Field; FEATURE_COUNT] = [
        Field::Ph,
        Field::Hardness,
        Field::Solids,
        Field::Chloramines,
        Field::Sulfate,
        Field::Conductivity,
        Field::OrganicCarbon,
        Field::Trihalomethanes,
        Field::Turbidity,
    ];

    /// Position of this field in the feature vector
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Static metadata for this field
    #[inline]
    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_SPECS[self.index()]
    }

    /// Canonical key used in requests and error messages
    pub fn key(self) -> &'static str {
        self.spec().key
    }

    /// Resolve a submitted field name, accepting the canonical key and a few
    /// common aliases
    pub fn from_name(name: &str) -> Option<Field> {
        let field = match name {
            "ph" | "pH" => Field::Ph,
            "hardness" => Field::Hardness,
            "solids" | "tds" => Field::Solids,
            "chloramines" => Field::Chloramines,
            "sulfate" => Field::Sulfate,
            "conductivity" => Field::Conductivity,
            "organic_carbon" | "organicCarbon" => Field::OrganicCarbon,
            "trihalomethanes" | "thm" => Field::Trihalomethanes,
            "turbidity" => Field::Turbidity,
            _ => return None,
        };
        Some(field)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Inclusive interval a measurement must fall in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllowedRange {
    pub min: f64,
    pub max: f64,
}

impl AllowedRange {
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for AllowedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?}]", self.min, self.max)
    }
}

/// Per-field metadata: bounds, form defaults and guidance
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub field: Field,
    pub key: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub range: AllowedRange,
    pub default: f64,
    pub step: f64,
    pub guidance: &'static str,
}

impl FieldSpec {
    /// Pull a value into the allowed range.
    ///
    /// Only meant for pre-filling form values. Submitted measurements are
    /// validated, never clamped.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default;
        }
        value.clamp(self.range.min, self.range.max)
    }
}

pub static FIELD_SPECS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec {
        field: Field::Ph,
        key: "ph",
        label: "pH",
        unit: None,
        range: AllowedRange { min: 0.0, max: 14.0 },
        default: 7.5,
        step: 0.1,
        guidance: "Acidity or alkalinity of the water. The recommended range is 6.5-8.5.",
    },
    FieldSpec {
        field: Field::Hardness,
        key: "hardness",
        label: "Hardness",
        unit: Some("mg/L"),
        range: AllowedRange { min: 0.0, max: 500.0 },
        default: 120.0,
        step: 1.0,
        guidance: "Ability of the water to form lather with soap. High levels lead to scale formation.",
    },
    FieldSpec {
        field: Field::Solids,
        key: "solids",
        label: "Total Dissolved Solids",
        unit: Some("ppm"),
        range: AllowedRange { min: 0.0, max: 5000.0 },
        default: 250.0,
        step: 1.0,
        guidance: "High TDS affects taste and clarity. Ideally below 500 ppm.",
    },
    FieldSpec {
        field: Field::Chloramines,
        key: "chloramines",
        label: "Chloramines",
        unit: Some("ppm"),
        range: AllowedRange { min: 0.0, max: 10.0 },
        default: 2.0,
        step: 0.1,
        guidance: "Disinfectant used in water treatment. Excessive levels can be harmful.",
    },
    FieldSpec {
        field: Field::Sulfate,
        key: "sulfate",
        label: "Sulfate",
        unit: Some("mg/L"),
        range: AllowedRange { min: 0.0, max: 500.0 },
        default: 180.0,
        step: 1.0,
        guidance: "Dissolved sulfate salts give a bitter taste. Ideally under 250 mg/L.",
    },
    FieldSpec {
        field: Field::Conductivity,
        key: "conductivity",
        label: "Conductivity",
        unit: Some("μS/cm"),
        range: AllowedRange { min: 0.0, max: 1000.0 },
        default: 400.0,
        step: 1.0,
        guidance: "Ability to conduct electricity, related to the concentration of dissolved salts.",
    },
    FieldSpec {
        field: Field::OrganicCarbon,
        key: "organic_carbon",
        label: "Organic Carbon",
        unit: Some("ppm"),
        range: AllowedRange { min: 0.0, max: 20.0 },
        default: 5.0,
        step: 0.1,
        guidance: "Organic material in the water. High levels may indicate contamination.",
    },
    FieldSpec {
        field: Field::Trihalomethanes,
        key: "trihalomethanes",
        label: "Trihalomethanes",
        unit: Some("μg/L"),
        range: AllowedRange { min: 0.0, max: 200.0 },
        default: 40.0,
        step: 1.0,
        guidance: "By-products of chlorine disinfection. High THM levels can be harmful.",
    },
    FieldSpec {
        field: Field::Turbidity,
        key: "turbidity",
        label: "Turbidity",
        unit: Some("NTU"),
        range: AllowedRange { min: 0.0, max: 10.0 },
        default: 2.0,
        step: 0.1,
        guidance: "Cloudiness of the water. High turbidity can be a sign of contamination.",
    },
];

/// A fully validated water sample in training column order
///
/// Only the input validator constructs these, so holding one means every
/// value is finite and inside its allowed range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub(crate) fn from_validated(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// Values in canonical order, ready for the classifier
    #[inline]
    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    #[inline]
    pub fn get(&self, field: Field) -> f64 {
        self.values[field.index()]
    }

    /// Iterate `(field, value)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Field, f64)> + '_ {
        Field::ALL.iter().map(move |&f| (f, self.values[f.index()]))
    }
}

/// Final classification of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Safe,
    Unsafe,
}

impl Verdict {
    /// Map a binary class label. Anything other than 0 or 1 is not a verdict.
    pub fn from_label(label: i64) -> Option<Verdict> {
        match label {
            1 => Some(Verdict::Safe),
            0 => Some(Verdict::Unsafe),
            _ => None,
        }
    }

    /// User-facing label
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Safe => "Safe to Drink",
            Verdict::Unsafe => "Not Safe to Drink",
        }
    }

    pub fn is_safe(self) -> bool {
        matches!(self, Verdict::Safe)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
