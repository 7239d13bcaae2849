mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, TestUser};

#[tokio::test]
async fn users_only_see_their_own_settings() -> Result<()> {
    let app = TestApp::new();
    let alice = TestUser::new();
    let bob = TestUser::new();
    let alice_token = app.token_for(&alice);
    let bob_token = app.token_for(&bob);

    app.put_json("/settings", Some(&alice_token), &json!({"currency": "RWF"}))
        .await?;

    let res = app.get("/settings", Some(&bob_token)).await?;
    assert_eq!(res.body["data"]["user_id"], bob.user_id.to_string());
    assert_eq!(res.body["data"]["currency"], "USD");
    Ok(())
}

#[tokio::test]
async fn body_user_id_cannot_redirect_a_write() -> Result<()> {
    let app = TestApp::new();
    let alice = TestUser::new();
    let bob = TestUser::new();
    let alice_token = app.token_for(&alice);
    let bob_token = app.token_for(&bob);

    let res = app
        .put_json(
            "/settings",
            Some(&bob_token),
            &json!({"user_id": alice.user_id, "theme": "dark"}),
        )
        .await?;
    assert_eq!(res.body["data"]["user_id"], bob.user_id.to_string());

    let res = app.get("/settings", Some(&alice_token)).await?;
    assert_eq!(res.body["data"]["theme"], "light");
    Ok(())
}

#[tokio::test]
async fn same_tenant_users_are_still_separate() -> Result<()> {
    let app = TestApp::new();
    let owner = TestUser::new();
    let clerk = TestUser {
        tenant_id: owner.tenant_id,
        ..TestUser::new()
    };

    app.put_json("/settings", Some(&app.token_for(&owner)), &json!({"language": "rw"}))
        .await?;
    let res = app.get("/settings", Some(&app.token_for(&clerk))).await?;

    assert_eq!(res.body["data"]["language"], "en");
    Ok(())
}

#[tokio::test]
async fn tenant_header_must_match_token() -> Result<()> {
    let app = TestApp::new();
    let user = TestUser::new();
    let token = app.token_for(&user);
    let other_tenant = TestUser::new().tenant_id.to_string();
    let own_tenant = user.tenant_id.to_string();

    let res = app
        .send(Method::GET, "/settings", Some(&token), &[("x-tenant-id", other_tenant.as_str())], None)
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["code"], "FORBIDDEN");

    let res = app
        .send(Method::GET, "/settings", Some(&token), &[("x-tenant-id", own_tenant.as_str())], None)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}
