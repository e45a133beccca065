//! Pass-through routes to the recommendation backend.
//!
//! Each handler reshapes the incoming request, forwards it, and relays the
//! backend's status and JSON body. Transport failures become 500.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, RawQuery, State,
    },
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::backend::BackendReply;
use crate::query::{
    validate_university_query, MajorGroupQuery, MajorPriorityQuery, ReportQuery, UniversityQuery,
};
use crate::server::error::AppError;
use crate::server::state::SharedState;

const PROVINCES_PATH: &str = "/api/options/provinces";
const REPORT_PATH: &str = "/api/report/get";
const MAJOR_GROUP_PATH: &str = "/api/voluntary/majorGroup";
const UNIVERSITY_PRIORITY_PATH: &str = "/api/voluntary/universityPriority";

fn relay(reply: BackendReply) -> Response {
    (reply.status, Json(reply.body)).into_response()
}

/// GET /api/options/provinces
pub async fn provinces_handler(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let reply = state.backend.get_raw(PROVINCES_PATH, query.as_deref()).await?;
    Ok(relay(reply))
}

/// GET /api/report/get
pub async fn report_get_handler(
    State(state): State<SharedState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let reply = state.backend.get(REPORT_PATH, &query.to_params()).await?;
    Ok(relay(reply))
}

/// POST /api/report/get
pub async fn report_post_handler(
    State(state): State<SharedState>,
    body: Result<Json<ReportQuery>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(query) = body?;
    let reply = state.backend.post_json(REPORT_PATH, &query).await?;
    Ok(relay(reply))
}

/// POST /api/voluntary/majorGroup
pub async fn major_group_handler(
    State(state): State<SharedState>,
    body: Result<Json<MajorGroupQuery>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(query) = body?;
    let reply = state.backend.post_json(MAJOR_GROUP_PATH, &query).await?;
    Ok(relay(reply))
}

/// POST /api/voluntary/majorPriority, answered by the report endpoint
pub async fn major_priority_handler(
    State(state): State<SharedState>,
    body: Result<Json<MajorPriorityQuery>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(query) = body?;
    let reply = state.backend.post_json(REPORT_PATH, &query).await?;
    Ok(relay(reply))
}

/// POST /api/voluntary/universityPriority
///
/// The backend wraps results as `{code, msg, data}`; only `code == 200`
/// counts as success and the route answers with `data` alone.
pub async fn university_priority_handler(
    State(state): State<SharedState>,
    body: Result<Json<UniversityQuery>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(query) = body?;
    validate_university_query(&query).map_err(AppError::Validation)?;

    let reply = state
        .backend
        .post_form(UNIVERSITY_PRIORITY_PATH, &query.to_form())
        .await?;

    let mut body = reply.body;
    match body.get("code").and_then(Value::as_i64) {
        Some(200) => Ok(Json(body.get_mut("data").map(Value::take).unwrap_or(Value::Null))),
        code => {
            let msg = body
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("University recommendation failed")
                .to_string();
            warn!(?code, %msg, "backend rejected university query");
            Err(AppError::Upstream(msg))
        }
    }
}

/// GET /api/voluntary/universityPriority
pub async fn university_priority_status_handler() -> Json<Value> {
    Json(json!({
        "message": "University priority API is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
