//! Time-series handlers

use axum::{extract::{State, Path}, Json};

use crate::{AppState, AppResult, AppError};
use crate::dataset::{self, Record};

/// Historical rows for one machine
pub async fn get(
    State(state): State<AppState>,
    Path(machine_id): Path<String>,
) -> AppResult<Json<Vec<Record>>> {
    let path = state.config.dataset_path.clone();
    let key_column = state.config.dataset_key_column.clone();
    let id = machine_id.clone();

    let rows = tokio::task::spawn_blocking(move || {
        dataset::find_machine_rows(&path, &key_column, &id)
    })
    .await??;

    if rows.is_empty() {
        return Err(AppError::NotFound("Machine data not found".to_string()));
    }

    tracing::debug!("Machine {}: {} rows", machine_id, rows.len());
    Ok(Json(rows))
}
