use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::Router;
use chrono::NaiveDate;
use configuration::{DefaultsConfig, StrategyConfig};
use core_types::PriceSeries;
use database::{DbRepository, connect, run_migrations};
use engine::{PortError, Ports, PriceHistoryProvider, RecommendationEngine, RunGate};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use web_server::{AppState, build_router};

struct NoPrices;

#[async_trait]
impl PriceHistoryProvider for NoPrices {
    async fn fetch(
        &self,
        _instruments: &[String],
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<PriceSeries, PortError> {
        Ok(PriceSeries::new())
    }
}

async fn app() -> Router {
    let pool = connect("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let db_repo = DbRepository::new(pool);
    db_repo.seed_defaults(&DefaultsConfig::default()).await.unwrap();

    let store = Arc::new(db_repo.clone());
    let ports = Ports {
        prices: Arc::new(NoPrices),
        settings: store.clone(),
        holdings: store.clone(),
        snapshots: store,
    };
    let engine = RecommendationEngine::new(&StrategyConfig::default(), ports).unwrap();

    build_router(Arc::new(AppState {
        db_repo,
        runs: Arc::new(RunGate::new(Arc::new(engine))),
    }))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_check() {
    let app = app().await;
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn latest_is_404_until_a_run_happens() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/recommendations/latest", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, run) = send(&app, Method::POST, "/api/run", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["error"]["kind"], "no_price_data");
    assert_eq!(run["universe_size"], 30);

    let (status, latest) = send(&app, Method::GET, "/api/recommendations/latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["run_id"], run["run_id"]);
}

#[tokio::test]
async fn export_is_a_download() {
    let app = app().await;
    send(&app, Method::POST, "/api/run", None).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/export_latest.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment"));
}

#[tokio::test]
async fn settings_round_trip_with_clamping() {
    let app = app().await;

    let (status, current) = send(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["top_n"], 8);

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/api/settings",
        Some(json!({ "top_n": 0, "max_single_weight": 0.1, "universe": "AAPL,MSFT" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["settings"]["top_n"], 1);
    assert_eq!(updated["settings"]["max_single_weight"], 0.1);
    assert_eq!(updated["settings"]["universe"].as_array().unwrap().len(), 30);
    assert_eq!(updated["adjustments"].as_array().unwrap().len(), 2);

    let (_, reread) = send(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(reread, updated["settings"]);
}

#[tokio::test]
async fn holdings_are_upserted() {
    let app = app().await;

    let (status, holdings) = send(
        &app,
        Method::PUT,
        "/api/holdings",
        Some(json!({ "aapl": 10.0, "CASH": 2500.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(holdings, json!({ "AAPL": 10.0, "CASH": 2500.0 }));

    let (status, _) = send(&app, Method::PUT, "/api/holdings", Some(json!({ " ": 1.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PUT, "/api/holdings", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_holdings_edit_writes_nothing() {
    let app = app().await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/holdings",
        Some(json!({ "MSFT": 3.0, " ": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, holdings) = send(&app, Method::GET, "/api/holdings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(holdings, json!({ "CASH": 10000.0 }));
}
