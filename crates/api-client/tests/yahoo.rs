use api_client::YahooClient;
use api_client::error::ApiError;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use configuration::PriceProviderConfig;

fn chart_body(symbol: &str, closes: &str) -> String {
    format!(
        r#"{{"chart": {{"result": [{{
            "meta": {{"symbol": "{symbol}", "gmtoffset": -14400}},
            "timestamp": [1725283800, 1725370200, 1725456600],
            "indicators": {{"quote": [{{"close": {closes}}}], "adjclose": [{{"adjclose": {closes}}}]}}
        }}], "error": null}}}}"#
    )
}

async fn chart(Path(symbol): Path<String>) -> (StatusCode, String) {
    match symbol.as_str() {
        "AAPL" => (StatusCode::OK, chart_body("AAPL", "[228.4, 227.1, 220.3]")),
        "MSFT" => (StatusCode::OK, chart_body("MSFT", "[417.1, null, 408.9]")),
        "GONE" => (
            StatusCode::NOT_FOUND,
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}}"#
                .to_string(),
        ),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded".to_string()),
    }
}

async fn spawn_server() -> YahooClient {
    let app = Router::new().route("/v8/finance/chart/:symbol", get(chart));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    YahooClient::new(&PriceProviderConfig {
        base_url: format!("http://{addr}/"),
        timeout_secs: 5,
        ..PriceProviderConfig::default()
    })
    .unwrap()
}

fn range() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 9, 5).unwrap(),
    )
}

#[tokio::test]
async fn fetches_one_instrument() {
    let client = spawn_server().await;
    let (start, end) = range();

    let points = client.fetch_daily_closes("AAPL", start, end).await.unwrap();

    assert_eq!(points.len(), 3);
    assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
    assert_eq!(points[2].price, 220.3);
}

#[tokio::test]
async fn api_and_server_errors_are_distinguished() {
    let client = spawn_server().await;
    let (start, end) = range();

    let not_found = client.fetch_daily_closes("GONE", start, end).await.unwrap_err();
    assert!(matches!(not_found, ApiError::ApiError(msg) if msg.contains("No data found")));

    let broken = client.fetch_daily_closes("BOOM", start, end).await.unwrap_err();
    assert!(matches!(broken, ApiError::ApiError(msg) if msg.contains("500")));
}

#[tokio::test]
async fn history_skips_failed_instruments() {
    let client = spawn_server().await;
    let (start, end) = range();
    let symbols: Vec<String> = ["AAPL", "MSFT", "GONE", "BOOM"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let series = client.fetch_history(&symbols, start, end).await.unwrap();

    assert_eq!(series.instruments().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
    assert_eq!(series.points("MSFT").unwrap().len(), 2);
    assert_eq!(series.trading_dates().len(), 3);
}

#[tokio::test]
async fn unreachable_provider_yields_empty_history() {
    let client = YahooClient::new(&PriceProviderConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 2,
        ..PriceProviderConfig::default()
    })
    .unwrap();
    let (start, end) = range();

    let series = client
        .fetch_history(&["AAPL".to_string()], start, end)
        .await
        .unwrap();
    assert!(series.is_empty());
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let client = spawn_server().await;
    let (start, end) = range();

    let result = client.fetch_history(&["AAPL".to_string()], end, start).await;
    assert!(matches!(result, Err(ApiError::InvalidData(_))));
}
