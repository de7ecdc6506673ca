mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tower::ServiceExt;

fn d(v: i64) -> Decimal {
    Decimal::from(v)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_health_check() {
    let pool = common::setup_test_db().await;
    let app = common::build_test_app(pool);

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_api_requires_bearer_token() {
    let pool = common::setup_test_db().await;
    let app = common::build_test_app(pool);

    let resp = app
        .oneshot(Request::builder().uri("/api/accounts").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_account_crud_flow() {
    let pool = common::setup_test_db().await;
    common::seed_user(&pool, "api_user", "tok_api").await;
    let app = common::build_test_app(pool);

    // Create
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/accounts",
            "tok_api",
            serde_json::json!({ "name": "Futures", "initial_balance": "2500.00" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["name"], "Futures");
    assert_eq!(json["data"]["current_balance"], "2500.00");
    let account_id = json["data"]["id"].as_i64().unwrap();

    // Detail
    let resp = app
        .clone()
        .oneshot(get(&format!("/api/accounts/{account_id}"), "tok_api"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Update
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/accounts/{account_id}"),
            "tok_api",
            serde_json::json!({ "name": "Futures Main" }),
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["name"], "Futures Main");
    assert_eq!(json["data"]["initial_balance"], "2500.00");

    // Delete
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/accounts/{account_id}"))
                .header("authorization", "Bearer tok_api")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(get(&format!("/api/accounts/{account_id}"), "tok_api"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_negative_initial_balance_rejected() {
    let pool = common::setup_test_db().await;
    common::seed_user(&pool, "api_user2", "tok_api2").await;
    let app = common::build_test_app(pool);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/accounts",
            "tok_api2",
            serde_json::json!({ "name": "Bad", "initial_balance": "-1.00" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_trade_lifecycle_moves_balance() {
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "api_user3", "tok_api3").await;
    let account = common::seed_account(&pool, user.id, "Main", d(1000)).await;
    let app = common::build_test_app(pool.clone());

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/trades",
            "tok_api3",
            serde_json::json!({
                "account_id": account.id,
                "symbol": "EURUSD",
                "entry_date": "2024-03-04T09:30:00Z",
                "entry_price": "1.08450",
                "size": "10000",
                "side": "BUY",
                "returns": "75.00"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["status"], "WIN");
    let trade_id = json["data"]["id"].as_i64().unwrap();

    assert_eq!(common::account_balance(&pool, account.id).await, d(1075));

    // Partial update that says nothing about returns must leave it alone.
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/trades/{trade_id}"),
            "tok_api3",
            serde_json::json!({ "notes": "held through lunch" }),
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["returns"], "75.00");
    assert_eq!(json["data"]["notes"], "held through lunch");
    assert_eq!(common::account_balance(&pool, account.id).await, d(1075));

    // Explicit null re-opens the trade and reverts the balance.
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/trades/{trade_id}"),
            "tok_api3",
            serde_json::json!({ "returns": null }),
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["status"], "OPEN");
    assert_eq!(common::account_balance(&pool, account.id).await, d(1000));
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_dashboard_metrics_values() {
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "api_user4", "tok_api4").await;
    let account = common::seed_account(&pool, user.id, "Main", d(1000)).await;

    let when = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
    for returns in [100, -50, 150, 0, 200] {
        common::seed_closed_trade(&pool, account.id, "SPY", d(returns), when).await;
    }

    let app = common::build_test_app(pool);
    let resp = app
        .oneshot(get(
            &format!("/api/dashboard/metrics?account_id={}", account.id),
            "tok_api4",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["total_trades"], 5);
    assert_eq!(json["total_pnl"], "400.00");
    assert_eq!(json["win_rate"], 60.0);
    assert_eq!(json["profit_factor"], "9.00");
    assert_eq!(json["largest_winning_trade"], "200.00");
    assert_eq!(json["largest_losing_trade"], "-50.00");
    assert_eq!(json["account_name"], "Main");
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_dashboard_metrics_empty_set() {
    let pool = common::setup_test_db().await;
    common::seed_user(&pool, "api_user5", "tok_api5").await;
    let app = common::build_test_app(pool);

    let resp = app
        .oneshot(get("/api/dashboard/metrics", "tok_api5"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["total_trades"], 0);
    assert_eq!(json["win_rate"], 0.0);
    assert!(json["profit_factor"].is_null());
    assert!(json["average_winning_trade"].is_null());
    assert_eq!(json["account_name"], "All Accounts");
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_calendar_requires_year_and_month() {
    let pool = common::setup_test_db().await;
    common::seed_user(&pool, "api_user6", "tok_api6").await;
    let app = common::build_test_app(pool);

    let resp = app
        .clone()
        .oneshot(get("/api/calendar/monthly", "tok_api6"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(get("/api/calendar/monthly?year=2024&month=13", "tok_api6"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_foreign_account_is_not_found() {
    let pool = common::setup_test_db().await;
    let owner = common::seed_user(&pool, "api_owner", "tok_api_owner").await;
    common::seed_user(&pool, "api_intruder", "tok_api_intruder").await;
    let account = common::seed_account(&pool, owner.id, "Private", d(1000)).await;
    let app = common::build_test_app(pool);

    let resp = app
        .oneshot(get(&format!("/api/accounts/{}", account.id), "tok_api_intruder"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_foreign_strategy_write_is_forbidden() {
    let pool = common::setup_test_db().await;
    let owner = common::seed_user(&pool, "api_owner2", "tok_api_owner2").await;
    common::seed_user(&pool, "api_intruder2", "tok_api_intruder2").await;
    let strategy = common::seed_strategy(&pool, Some(owner.id), "Owner Only").await;
    let public = common::seed_strategy(&pool, None, "House Breakout").await;
    let app = common::build_test_app(pool);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/setup-strategies/{}", strategy.id),
            "tok_api_intruder2",
            serde_json::json!({ "description": "mine now" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Public strategies are readable but never writable.
    let resp = app
        .clone()
        .oneshot(get(&format!("/api/setup-strategies/{}", public.id), "tok_api_intruder2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/setup-strategies/{}", public.id),
            "tok_api_intruder2",
            serde_json::json!({ "description": "still mine" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
