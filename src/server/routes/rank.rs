use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::query::FirstSubject;
use crate::server::error::AppError;
use crate::server::state::{AppState, SharedState};

#[derive(Debug, Deserialize)]
pub struct RankParams {
    pub province: Option<String>,
    #[serde(alias = "category")]
    pub subject: Option<String>,
    pub year: Option<u32>,
    pub score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreParams {
    pub province: Option<String>,
    #[serde(alias = "category")]
    pub subject: Option<String>,
    pub year: Option<u32>,
    pub rank: Option<u64>,
}

/// Ranking tracks exist only for the two first-choice subjects
fn track(state: &AppState, subject: Option<String>) -> Result<&'static str, AppError> {
    let subject = state.subject_or_default(subject);
    FirstSubject::parse(&subject)
        .map(FirstSubject::code)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid subject '{}', must be physics or history",
                subject
            ))
        })
}

/// Success envelope; the requested year is echoed back when given
fn reply(mut data: Value, year: Option<u32>) -> Json<Value> {
    if let (Some(year), Value::Object(map)) = (year, &mut data) {
        map.insert("year".to_string(), Value::from(year));
    }
    Json(json!({ "code": 0, "msg": "success", "data": data }))
}

/// GET /api/rank/getRank
pub async fn get_rank_handler(
    State(state): State<SharedState>,
    params: Result<Query<RankParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let subject = track(&state, params.subject)?;
    let score = match params.score {
        Some(score) if score.is_finite() && score > 0.0 => score,
        _ => return Err(AppError::BadRequest("Score must be a positive number".to_string())),
    };
    let province = state.province_or_default(params.province);

    let rank = state
        .converter
        .score_to_rank_detailed(score, &province, subject)
        .await;

    Ok(reply(
        json!({ "rank": rank.value, "approximate": rank.approximate }),
        params.year,
    ))
}

/// GET /api/rank/getScore
pub async fn get_score_handler(
    State(state): State<SharedState>,
    params: Result<Query<ScoreParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let subject = track(&state, params.subject)?;
    let rank = match params.rank {
        Some(rank) if rank > 0 => rank,
        _ => return Err(AppError::BadRequest("Rank must be a positive integer".to_string())),
    };
    let province = state.province_or_default(params.province);

    let score = state
        .converter
        .rank_to_score_detailed(rank, &province, subject)
        .await;

    Ok(reply(
        json!({ "score": score.value, "approximate": score.approximate }),
        params.year,
    ))
}
