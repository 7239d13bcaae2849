mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use fishledger_api::config::AppConfig;
use fishledger_api::settings::{Currency, Language, Theme};
use serde_json::{json, Value};

use common::{TestApp, TestUser};

fn updated_at(body: &Value) -> DateTime<Utc> {
    body["data"]["updated_at"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("updated_at timestamp")
}

#[tokio::test]
async fn first_get_returns_defaults() -> Result<()> {
    let app = TestApp::new();
    let user = TestUser::new();
    let token = app.token_for(&user);

    let res = app.get("/settings", Some(&token)).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    let data = &res.body["data"];
    assert_eq!(data["user_id"], user.user_id.to_string());
    assert_eq!(data["currency"], "USD");
    assert_eq!(data["language"], "en");
    assert_eq!(data["timezone"], "UTC");
    assert_eq!(data["date_format"], "DD/MM/YYYY");
    assert_eq!(data["theme"], "light");
    assert_eq!(data["email_notifications"], true);
    assert_eq!(data["sms_notifications"], false);
    assert_eq!(data["business_hours_start"], "08:00");
    assert_eq!(data["business_hours_end"], "18:00");
    assert_eq!(data["working_days"], json!([1, 2, 3, 4, 5, 6]));
    assert_eq!(app.store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn put_currency_keeps_other_fields() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());

    let res = app.put_json("/settings", Some(&token), &json!({"currency": "RWF"})).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["currency"], "RWF");

    let res = app.get("/settings", Some(&token)).await?;
    assert_eq!(res.body["data"]["currency"], "RWF");
    assert_eq!(res.body["data"]["language"], "en");
    Ok(())
}

#[tokio::test]
async fn both_mounts_share_one_row() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());

    app.put_json("/api/settings", Some(&token), &json!({"theme": "dark"})).await?;
    let res = app.get("/settings", Some(&token)).await?;

    assert_eq!(res.body["data"]["theme"], "dark");
    Ok(())
}

#[tokio::test]
async fn every_enum_value_round_trips() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());

    let mut bodies = Vec::new();
    bodies.extend(Currency::ALL.iter().map(|c| json!({"currency": c.as_str()})));
    bodies.extend(Language::ALL.iter().map(|l| json!({"language": l.as_str()})));
    bodies.extend(Theme::ALL.iter().map(|t| json!({"theme": t.as_str()})));

    for body in bodies {
        let res = app.put_json("/settings", Some(&token), &body).await?;
        assert_eq!(res.status, StatusCode::OK, "{}", body);

        let res = app.get("/settings", Some(&token)).await?;
        let (field, value) = body.as_object().and_then(|o| o.iter().next()).expect("one field");
        assert_eq!(&res.body["data"][field], value);
    }
    Ok(())
}

#[tokio::test]
async fn invalid_enum_is_rejected_and_row_unchanged() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());
    let before = app.get("/settings", Some(&token)).await?;

    let res = app
        .put_json(
            "/settings",
            Some(&token),
            &json!({"currency": "EUR", "theme": "neon", "language": "rw"}),
        )
        .await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["field_errors"]["currency"].is_string());
    assert!(res.body["field_errors"]["theme"].is_string());
    assert!(res.body["field_errors"].get("language").is_none());

    let after = app.get("/settings", Some(&token)).await?;
    assert_eq!(after.body, before.body);
    Ok(())
}

#[tokio::test]
async fn updated_at_strictly_increases() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());

    let mut last = updated_at(&app.get("/settings", Some(&token)).await?.body);
    for theme in ["dark", "dark", "system"] {
        let res = app.put_json("/settings", Some(&token), &json!({"theme": theme})).await?;
        let next = updated_at(&res.body);
        assert!(next > last, "{} should be after {}", next, last);
        last = next;
    }
    Ok(())
}

#[tokio::test]
async fn echoed_get_response_is_accepted() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());
    let current = app.get("/settings", Some(&token)).await?;

    let mut echoed = current.body["data"].clone();
    echoed["timezone"] = json!("Africa/Kigali");
    echoed["created_at"] = json!("2001-01-01T00:00:00Z");

    let res = app.put_json("/settings", Some(&token), &echoed).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["timezone"], "Africa/Kigali");
    assert_eq!(res.body["data"]["created_at"], current.body["data"]["created_at"]);
    Ok(())
}

#[tokio::test]
async fn business_hours_and_working_days_are_validated() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());

    let res = app
        .put_json(
            "/settings",
            Some(&token),
            &json!({"business_hours_start": "07:30", "working_days": [5, 1, 1, 3]}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["business_hours_start"], "07:30");
    assert_eq!(res.body["data"]["working_days"], json!([1, 3, 5]));

    let res = app
        .put_json("/settings", Some(&token), &json!({"business_hours_start": "19:00"}))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .put_json("/settings", Some(&token), &json!({"working_days": [0, 8]}))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["working_days"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());

    let res = app
        .send(Method::PUT, "/settings", Some(&token), &[], Some("{\"currency\":".to_string()))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "INVALID_JSON");

    let res = app
        .put_json("/settings", Some(&token), &json!({"email_notifications": "yes"}))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn business_hours_with_seconds_echo_back_cleanly() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());

    let res = app
        .put_json(
            "/settings",
            Some(&token),
            &json!({"business_hours_start": "07:30:45", "business_hours_end": "17:15:59"}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["business_hours_start"], "07:30");
    assert_eq!(res.body["data"]["business_hours_end"], "17:15");

    let current = app.get("/settings", Some(&token)).await?;
    let res = app.put_json("/settings", Some(&token), &current.body["data"]).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["business_hours_start"], "07:30");

    // Within the same minute both ends collapse to one value
    let res = app
        .put_json(
            "/settings",
            Some(&token),
            &json!({"business_hours_start": "08:00:10", "business_hours_end": "08:00:50"}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn padded_enum_values_are_rejected() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for(&TestUser::new());

    let res = app
        .put_json("/settings", Some(&token), &json!({"currency": "  RWF\n"}))
        .await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["currency"].is_string());
    let after = app.get("/settings", Some(&token)).await?;
    assert_eq!(after.body["data"]["currency"], "USD");
    Ok(())
}

#[tokio::test]
async fn oversized_body_is_json_413() -> Result<()> {
    let mut config = AppConfig::development();
    config.api.enable_rate_limiting = false;
    config.api.max_request_size_bytes = 256;
    let app = TestApp::with_config(config);
    let token = app.token_for(&TestUser::new());

    let body = json!({"date_format": "D".repeat(1024)});
    let res = app.put_json("/settings", Some(&token), &body).await?;

    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(res.body["error"], true);
    Ok(())
}
