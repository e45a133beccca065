use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::dataset;
use crate::ranking::TableKey;
use crate::server::error::AppError;
use crate::server::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct DataParams {
    pub province: Option<String>,
    pub subject: Option<String>,
}

/// GET /api/gaokao/data: the raw distribution file plus the resolved key
pub async fn data_handler(
    State(state): State<SharedState>,
    params: Result<Query<DataParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let key = TableKey::new(
        state.province_or_default(params.province),
        state.subject_or_default(params.subject),
    );
    debug!(%key, "serving distribution file");

    let mut body = dataset::load_dataset(&state.config.data_dir, &key).await?;
    body.insert("province".to_string(), Value::String(key.province));
    body.insert("subject".to_string(), Value::String(key.subject));
    Ok(Json(Value::Object(body)))
}

/// GET /api/gaokao/available: data files present plus the supported choices
pub async fn available_handler(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let data_dir = state.config.data_dir.clone();
    let datasets = tokio::task::spawn_blocking(move || dataset::available_datasets(&data_dir))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(json!({
        "datasets": datasets,
        "provinces": state.converter.supported_provinces(),
        "subjects": state.converter.supported_subjects(),
    })))
}
