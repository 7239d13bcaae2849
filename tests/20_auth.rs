mod common;

use anyhow::Result;
use axum::http::StatusCode;
use fishledger_api::auth::{generate_jwt, Claims};

use common::{TestApp, TestUser};

#[tokio::test]
async fn settings_require_a_token() -> Result<()> {
    let app = TestApp::new();

    for path in ["/settings", "/api/settings"] {
        let res = app.get(path, None).await?;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(res.body["code"], "UNAUTHORIZED");
    }
    assert!(app.store.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/settings", Some("not-a-jwt")).await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Invalid token");
    Ok(())
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let user = TestUser::new();
    let claims = Claims::new(user.user_id, user.tenant_id, None, 1)?;
    let forged = generate_jwt(&claims, "some-other-secret")?;

    let res = app.get("/settings", Some(&forged)).await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let user = TestUser::new();
    let mut claims = Claims::new(user.user_id, user.tenant_id, None, 1)?;
    claims.iat -= 7200;
    claims.exp = claims.iat + 60;
    let token = generate_jwt(&claims, &app.config.security.jwt_secret)?;

    let res = app.get("/settings", Some(&token)).await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Token has expired");
    Ok(())
}

#[tokio::test]
async fn rejected_put_writes_nothing() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .put_json("/settings", None, &serde_json::json!({"currency": "RWF"}))
        .await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(app.store.is_empty().await);
    Ok(())
}
