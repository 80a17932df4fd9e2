//! Prediction response bodies

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FailurePrediction {
    pub failure_prediction: i64,
    pub failure_probability: f64,
}

#[derive(Debug, Serialize)]
pub struct RulPrediction {
    pub rul_prediction: f64,
}

#[derive(Debug, Serialize)]
pub struct WhatIfPrediction {
    pub adjusted_failure_probability: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_failure_probability: Option<f64>,

    /// adjusted - baseline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_delta: Option<f64>,
}

impl WhatIfPrediction {
    pub fn new(adjusted: f64, baseline: Option<f64>) -> Self {
        Self {
            adjusted_failure_probability: adjusted,
            baseline_failure_probability: baseline,
            probability_delta: baseline.map(|b| adjusted - b),
        }
    }
}
