//! Prediction handlers

use axum::{extract::{State, rejection::JsonRejection}, Json};
use serde_json::Value;

use crate::{AppState, AppResult};
use crate::models::{FailurePrediction, RulPrediction, SensorFeatures, WhatIfPrediction};

/// Binary failure prediction plus failure probability
pub async fn predict_failure(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<FailurePrediction>> {
    let Json(body) = payload?;
    let x = SensorFeatures::from_json(&body)?.to_row();

    let failure_prediction = state.models.failure_model().predict(&x)?[0];
    let failure_probability = state.models.failure_probability(&x)?[0];

    tracing::debug!("Failure prediction: {} (p={:.4})", failure_prediction, failure_probability);

    Ok(Json(FailurePrediction {
        failure_prediction,
        failure_probability,
    }))
}

/// Remaining useful life regression
pub async fn predict_rul(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<RulPrediction>> {
    let Json(body) = payload?;
    let x = SensorFeatures::from_json(&body)?.to_row();

    let rul_prediction = state.models.rul_model().predict(&x)?[0];

    tracing::debug!("RUL prediction: {:.2}", rul_prediction);

    Ok(Json(RulPrediction { rul_prediction }))
}

/// Failure probability for adjusted readings, optionally compared to a baseline
pub async fn what_if(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<WhatIfPrediction>> {
    let Json(body) = payload?;
    let adjusted = SensorFeatures::from_json(&body)?;

    let baseline = match body.get("baseline") {
        None | Some(Value::Null) => None,
        Some(b) => Some(SensorFeatures::from_json_prefixed(b, "baseline.")?),
    };

    let adjusted_prob = state.models.failure_probability(&adjusted.to_row())?[0];
    let baseline_prob = match baseline {
        Some(b) => Some(state.models.failure_probability(&b.to_row())?[0]),
        None => None,
    };

    tracing::debug!("What-if: adjusted p={:.4}, baseline p={:?}", adjusted_prob, baseline_prob);

    Ok(Json(WhatIfPrediction::new(adjusted_prob, baseline_prob)))
}
