use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use configuration::{PortfolioSettings, SettingsUpdate};
use core_types::{Holdings, RecommendationSnapshot};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: PortfolioSettings,
    /// One line per field that was clamped or ignored.
    pub adjustments: Vec<String>,
}

async fn latest(state: &AppState) -> Result<RecommendationSnapshot, AppError> {
    state
        .db_repo
        .latest_recommendation()
        .await?
        .ok_or_else(|| AppError::NotFound("No recommendation has been run yet".to_string()))
}

/// # GET /api/recommendations/latest
pub async fn get_latest_recommendation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecommendationSnapshot>, AppError> {
    Ok(Json(latest(&state).await?))
}

/// # GET /export_latest.json
/// Same payload as the latest endpoint, served as a file download.
pub async fn export_latest(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = latest(&state).await?;
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"latest_recommendation.json\"",
        )],
        Json(snapshot),
    ))
}

/// # POST /api/run
/// Runs a recommendation pass now, waiting for any scheduled run to finish first.
pub async fn run_now(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecommendationSnapshot>, AppError> {
    tracing::info!("Manual recommendation run requested.");
    let snapshot = state.runs.run().await?;
    Ok(Json(snapshot))
}

/// # GET /api/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PortfolioSettings>, AppError> {
    Ok(Json(state.db_repo.portfolio_settings().await?))
}

/// # PUT /api/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>, AppError> {
    let (settings, adjustments) = state.db_repo.update_portfolio_settings(&update).await?;
    Ok(Json(SettingsResponse {
        settings,
        adjustments,
    }))
}

/// # GET /api/holdings
pub async fn get_holdings(State(state): State<Arc<AppState>>) -> Result<Json<Holdings>, AppError> {
    Ok(Json(state.db_repo.holdings().await?))
}

/// # PUT /api/holdings
/// Upserts every `{instrument: quantity}` entry in the body as one batch and
/// returns the resulting holdings. `CASH` sets the cash balance.
pub async fn update_holdings(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<BTreeMap<String, f64>>,
) -> Result<Json<Holdings>, AppError> {
    if entries.is_empty() {
        return Err(AppError::BadRequest("No holdings given".to_string()));
    }
    state.db_repo.upsert_holdings(&entries).await?;
    Ok(Json(state.db_repo.holdings().await?))
}
