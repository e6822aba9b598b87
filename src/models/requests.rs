use crate::core::ValidationError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use validator::Validate;

/// Single sample submission
///
/// Body is a flat JSON object of measurement name to number:
/// ```json
/// { "ph": 7.5, "hardness": 120.0, "solids": 250.0, ... }
/// ```
/// Entries are kept in wire order, repeated keys included, so the validator
/// can reject a measurement that was sent twice.
#[derive(Debug, Clone, Default)]
pub struct PredictRequest {
    pub measurements: Vec<(String, Value)>,
}

impl PredictRequest {
    /// Extract numeric measurements, rejecting values that are not JSON numbers
    pub fn numeric_measurements(&self) -> Result<Vec<(&str, f64)>, Vec<ValidationError>> {
        let mut values = Vec::with_capacity(self.measurements.len());
        let mut errors = Vec::new();

        for (name, value) in &self.measurements {
            match value.as_f64() {
                Some(v) => values.push((name.as_str(), v)),
                None => errors.push(ValidationError::NotNumeric { name: name.clone() }),
            }
        }

        if errors.is_empty() {
            Ok(values)
        } else {
            Err(errors)
        }
    }
}

impl Serialize for PredictRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.measurements.len()))?;
        for (name, value) in &self.measurements {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct MeasurementsVisitor;

impl<'de> Visitor<'de> for MeasurementsVisitor {
    type Value = PredictRequest;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of measurement names to numbers")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut measurements = Vec::with_capacity(access.size_hint().unwrap_or(9));
        while let Some(entry) = access.next_entry::<String, Value>()? {
            measurements.push(entry);
        }
        Ok(PredictRequest { measurements })
    }
}

impl<'de> Deserialize<'de> for PredictRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MeasurementsVisitor)
    }
}

/// Several samples classified in one call
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchPredictRequest {
    #[validate(length(min = 1))]
    pub samples: Vec<PredictRequest>,
}
