//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use mealwise_core::{test_utils::MockAnalyticsServer, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup_test_app() -> Router {
    let analyzer = BudgetAnalyzer::new(Config::default()).unwrap();
    create_router(analyzer, ServerConfig::default())
}

fn setup_app_with_backend(url: &str) -> Router {
    let mut config = Config::default();
    config.backend.url = Some(url.to_string());
    config.backend.timeout = std::time::Duration::from_secs(5);
    create_router(BudgetAnalyzer::new(config).unwrap(), ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: Router, uri: &str, body: Value) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn quinn() -> Value {
    json!({
        "name": "Quinn",
        "budget_total": 3175.0,
        "budget_spent": 4288.62,
        "meal_credits_total": 161,
        "meal_credits_used": 105,
        "flex_total": 800.0,
        "flex_spent": 680.0,
        "weeks_remaining": 8
    })
}

fn daily_transactions() -> Value {
    let rows: Vec<Value> = (1..=9)
        .map(|day| {
            json!({
                "Location": "Campus Cafe",
                "Date": format!("2025-09-{:02} 12:30", day),
                "Total": format!("${}.00", 10 + day),
                "Type": "Flex"
            })
        })
        .collect();
    Value::Array(rows)
}

// ========== Health ==========

#[tokio::test]
async fn test_health_without_backend() {
    let response = get(setup_test_app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["backend"]["configured"], false);
    assert!(json["endpoints"].as_array().unwrap().len() >= 5);
}

#[tokio::test]
async fn test_root_reports_unreachable_backend() {
    let server = MockAnalyticsServer::start_failing().await;
    let response = get(setup_app_with_backend(&server.url()), "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["backend"]["configured"], true);
    assert_eq!(json["backend"]["reachable"], false);
}

// ========== Forecast ==========

#[tokio::test]
async fn test_forecast_daily() {
    let body = json!({
        "UserData": quinn(),
        "Transactions": daily_transactions(),
        "mode": "daily"
    });
    let response = post_json(setup_test_app(), "/api/spending-forecast", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["forecast"].as_array().unwrap().len(), 7);
    assert_eq!(json["summary"]["forecast_periods"], 7);
    assert_eq!(json["summary"]["trend"], "increasing");
    assert_eq!(json["metadata"]["historical_data_points"], 9);
    assert_eq!(json["source"], "local");
    assert_eq!(json["estimated"], false);
    assert_eq!(json["skipped"], 0);

    let first = &json["forecast"][0];
    assert_eq!(first["date"], "2025-09-10");
    let lower = first["lower_bound"].as_f64().unwrap();
    let predicted = first["predicted_amount"].as_f64().unwrap();
    let upper = first["upper_bound"].as_f64().unwrap();
    assert!(lower >= 0.0 && lower <= predicted && predicted <= upper);
}

#[tokio::test]
async fn test_forecast_with_filter() {
    let mut transactions = daily_transactions();
    transactions.as_array_mut().unwrap().push(json!({
        "Location": "Chipotle",
        "Date": "2025-09-05",
        "Total": "14.00",
        "Type": "Card"
    }));
    let body = json!({
        "transactions": transactions,
        "mode": "weekly",
        "filter_type": "location",
        "filter_value": "chipotle"
    });

    let response = post_json(setup_test_app(), "/api/spending-forecast", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["metadata"]["filter"], "location=chipotle");
    assert_eq!(json["metadata"]["historical_data_points"], 1);
    assert_eq!(json["summary"]["degraded"]["reason"], "insufficient_history");
}

#[tokio::test]
async fn test_forecast_empty_history_is_degraded_not_error() {
    let body = json!({"transactions": [], "mode": "monthly"});
    let response = post_json(setup_test_app(), "/api/spending-forecast", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["forecast"].as_array().unwrap().len(), 3);
    assert_eq!(json["summary"]["degraded"]["reason"], "empty_history");
}

#[tokio::test]
async fn test_forecast_rejects_bad_mode_and_half_filter() {
    let response = post_json(
        setup_test_app(),
        "/api/spending-forecast",
        json!({"transactions": [], "mode": "hourly"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("hourly"));

    let response = post_json(
        setup_test_app(),
        "/api/spending-forecast",
        json!({"transactions": [], "filter_type": "category"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forecast_rejects_oversized_horizon() {
    for horizon in [json!(367), json!(u64::MAX)] {
        let body = json!({
            "transactions": daily_transactions(),
            "mode": "daily",
            "horizon": horizon
        });
        let response = post_json(setup_test_app(), "/api/spending-forecast", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = get_body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("at most 366"));
    }

    let body = json!({"transactions": [], "mode": "daily", "horizon": 366});
    let response = post_json(setup_test_app(), "/api/spending-forecast", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["forecast"].as_array().unwrap().len(), 366);
}

#[tokio::test]
async fn test_forecast_reports_skipped_records() {
    let body = json!({
        "transactions": [
            {"merchant": "Cafe", "amount": "abc", "date": "2025-09-01"},
            {"merchant": "Cafe", "amount": "4.50", "date": "2025-09-01"}
        ]
    });
    let response = post_json(setup_test_app(), "/api/spending-forecast", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["skipped"], 1);
}

// ========== Insights ==========

#[tokio::test]
async fn test_analyze_swipe_waste() {
    let body = json!({"user_data": quinn(), "transactions": daily_transactions()});
    let response = post_json(setup_test_app(), "/api/analyze", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["rule"], "swipe_waste");
    assert_eq!(json["headline_amount"], 672.0);
    assert!(json["headline"].as_str().unwrap().contains("56 meal credits"));
    assert!(!json["patterns"].as_array().unwrap().is_empty());
    assert_eq!(json["source"], "local");
}

#[tokio::test]
async fn test_analyze_by_profile() {
    let body = json!({"selected_profile": "flex_abuser"});
    let response = post_json(setup_test_app(), "/api/analyze", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["rule"], "flex_overspend");
    assert_eq!(json["headline_amount"], 800.0);
}

#[tokio::test]
async fn test_analyze_requires_state() {
    let response = post_json(setup_test_app(), "/api/analyze", json!({"transactions": []})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_rejects_invalid_state() {
    let mut state = quinn();
    state["budget_spent"] = json!(-5.0);
    let response = post_json(setup_test_app(), "/api/analyze", json!({"user_data": state})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("budget_spent"));
}

#[tokio::test]
async fn test_analyze_rejects_overused_meal_credits() {
    let state = json!({
        "name": "Quinn",
        "total_budget": 3175.0,
        "total_spent": 1200.0,
        "total_swipes": 10,
        "swipes_used": 20,
        "flex_total": 800.0,
        "flex_spent": 100.0,
        "weeks_remaining": 8
    });
    for uri in ["/api/analyze", "/api/dashboard", "/api/spending-forecast"] {
        let response = post_json(setup_test_app(), uri, json!({"user_data": state})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let json = get_body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("meal_credits_used"));
    }
}

#[tokio::test]
async fn test_analyze_falls_back_when_backend_fails() {
    let server = MockAnalyticsServer::start_failing().await;
    let app = setup_app_with_backend(&server.url());

    let response = post_json(app, "/api/analyze", json!({"user_data": quinn()})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["source"], "local_fallback");
    assert_eq!(json["estimated"], true);
    assert_eq!(json["rule"], "swipe_waste");
}

// ========== Dashboard ==========

#[tokio::test]
async fn test_dashboard_with_backend() {
    let server = MockAnalyticsServer::start().await;
    let app = setup_app_with_backend(&server.url());

    let body = json!({
        "user_data": quinn(),
        "transactions": daily_transactions(),
        "mode": "daily"
    });
    let response = post_json(app, "/api/dashboard", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["forecast"]["source"], "backend");
    assert_eq!(json["forecast"]["forecast"].as_array().unwrap().len(), 7);
    assert_eq!(json["insights"]["source"], "backend");
    assert!(json["insights"]["headline"]
        .as_str()
        .unwrap()
        .starts_with("Quinn"));
}

// ========== Normalize ==========

#[tokio::test]
async fn test_normalize_report() {
    let body = json!([
        {"Location": "Dining Hall", "Date": "2025-09-02", "Total": 0, "Type": "Swipe"},
        {"Location": "Cafe", "Date": "2025-09-01", "Total": "150 cents", "Type": "Flex"},
        {"Location": "Cafe", "Total": "3.00"},
        "not a record"
    ]);
    let response = post_json(setup_test_app(), "/api/normalize", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["merchant"], "Cafe");
    assert_eq!(records[0]["amount"], 1.5);
    assert_eq!(records[1]["funding_source"], "meal_credit");

    let skipped = json["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 2);
    assert_eq!(skipped[0]["index"], 2);
    assert_eq!(skipped[0]["reason"]["kind"], "missing_timestamp");
    assert_eq!(skipped[1]["reason"]["kind"], "not_an_object");
}

#[tokio::test]
async fn test_normalize_rejects_scalar_body() {
    let response = post_json(setup_test_app(), "/api/normalize", json!(42)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Profiles ==========

#[tokio::test]
async fn test_list_profiles() {
    let response = get(setup_test_app(), "/api/profiles").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let profiles = json.as_array().unwrap();
    assert_eq!(profiles.len(), 4);
    assert_eq!(profiles[0]["key"], "swipe_ignorer");
}

#[tokio::test]
async fn test_get_profile() {
    let response = get(setup_test_app(), "/api/profiles/balanced_saver").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["state"]["name"], "Hyacinth");

    let response = get(setup_test_app(), "/api/profiles/nobody").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("nobody"));
}
