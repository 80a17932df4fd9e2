//! Sensor feature vector
//!
//! The five readings every prediction endpoint requires, in the column
//! order the models were trained with.

use ndarray::Array2;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Number of model input columns
pub const FEATURE_COUNT: usize = 5;

/// Feature names in model column order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "air_temperature",
    "process_temperature",
    "rotational_speed",
    "torque",
    "tool_wear",
];

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("{0} must be a JSON object")]
    NotAnObject(String),

    #[error("Missing feature: {0}")]
    Missing(String),

    #[error("Invalid feature: {0} must be numeric")]
    NotNumeric(String),
}

/// One machine's sensor readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorFeatures {
    pub air_temperature: f64,
    pub process_temperature: f64,
    pub rotational_speed: f64,
    pub torque: f64,
    pub tool_wear: f64,
}

impl SensorFeatures {
    /// Extract the five features from a JSON body.
    ///
    /// Fields are checked in [`FEATURE_NAMES`] order so the first missing
    /// one is the one reported. Extra fields are ignored.
    pub fn from_json(body: &Value) -> Result<Self, FeatureError> {
        Self::from_json_prefixed(body, "")
    }

    /// Same as [`from_json`](Self::from_json) but error names carry `prefix`
    /// (used for nested objects such as `baseline.torque`).
    pub fn from_json_prefixed(body: &Value, prefix: &str) -> Result<Self, FeatureError> {
        let obj = body.as_object().ok_or_else(|| {
            let owner = prefix.trim_end_matches('.');
            FeatureError::NotAnObject(if owner.is_empty() { "Request body" } else { owner }.to_string())
        })?;

        let mut values = [0.0_f64; FEATURE_COUNT];
        for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
            let label = || format!("{}{}", prefix, name);
            *slot = match obj.get(name) {
                None => return Err(FeatureError::Missing(label())),
                Some(v) => numeric(v).ok_or_else(|| FeatureError::NotNumeric(label()))?,
            };
        }

        Ok(Self::from_array(values))
    }

    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [air_temperature, process_temperature, rotational_speed, torque, tool_wear] = values;
        Self {
            air_temperature,
            process_temperature,
            rotational_speed,
            torque,
            tool_wear,
        }
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.air_temperature,
            self.process_temperature,
            self.rotational_speed,
            self.torque,
            self.tool_wear,
        ]
    }

    /// Single-row model input, shape `(1, FEATURE_COUNT)`
    pub fn to_row(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, FEATURE_COUNT), |(_, j)| self.to_array()[j])
    }
}

/// Numbers pass through; numeric strings are coerced like the training side does.
/// `null` is present but not numeric.
fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}
