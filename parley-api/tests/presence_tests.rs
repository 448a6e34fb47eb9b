/// Integration tests for the presence surface
///
/// Verifies the strict-versus-tolerant not-found split across the three
/// membership operations and that none of them ever creates a membership
/// row. Skips unless `TEST_DATABASE_URL` is set.
mod common;

use axum::http::{Method, StatusCode};
use common::{json_request, TestContext};
use parley_shared::models::account_user::{AccountUser, Availability};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn availability_on_missing_membership_is_not_found_and_creates_nothing() {
    let Some(ctx) = TestContext::try_new().await.unwrap() else {
        return;
    };
    let (user, token) = ctx.create_user().await.unwrap();
    let unknown_account = Uuid::new_v4();

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/profile/availability",
            Some(&token),
            Some(json!({
                "account_id": unknown_account,
                "availability": "online"
            })),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let row = AccountUser::find(&ctx.db, unknown_account, user.id)
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn availability_overwrites_existing_membership() {
    let Some(ctx) = TestContext::try_new().await.unwrap() else {
        return;
    };
    let (user, token) = ctx.create_user().await.unwrap();
    let account_id = ctx.create_membership(&user).await.unwrap();

    let (status, _) = ctx
        .send(json_request(
            Method::POST,
            "/v1/profile/availability",
            Some(&token),
            Some(json!({ "account_id": account_id, "availability": "busy" })),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);

    let row = AccountUser::find(&ctx.db, account_id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.availability, Availability::Busy);
}

#[tokio::test]
async fn auto_offline_on_missing_membership_is_not_found() {
    let Some(ctx) = TestContext::try_new().await.unwrap() else {
        return;
    };
    let (user, token) = ctx.create_user().await.unwrap();
    let unknown_account = Uuid::new_v4();

    let (status, _) = ctx
        .send(json_request(
            Method::POST,
            "/v1/profile/auto_offline",
            Some(&token),
            Some(json!({ "account_id": unknown_account, "auto_offline": true })),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);

    let row = AccountUser::find(&ctx.db, unknown_account, user.id)
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn auto_offline_omitted_flag_stores_false() {
    let Some(ctx) = TestContext::try_new().await.unwrap() else {
        return;
    };
    let (user, token) = ctx.create_user().await.unwrap();
    let account_id = ctx.create_membership(&user).await.unwrap();

    // Memberships start with auto_offline = TRUE per account policy
    let before = AccountUser::find(&ctx.db, account_id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(before.auto_offline);

    let (status, _) = ctx
        .send(json_request(
            Method::POST,
            "/v1/profile/auto_offline",
            Some(&token),
            Some(json!({ "account_id": account_id })),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);

    let after = AccountUser::find(&ctx.db, account_id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!after.auto_offline);
}

#[tokio::test]
async fn set_active_account_on_missing_membership_is_tolerant_signal() {
    let Some(ctx) = TestContext::try_new().await.unwrap() else {
        return;
    };
    let (user, token) = ctx.create_user().await.unwrap();
    let unknown_account = Uuid::new_v4();

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/profile/set_active_account",
            Some(&token),
            Some(json!({ "account_id": unknown_account })),
        ))
        .await;

    // Structured signal, not the error-path body shape
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Account not found");

    let row = AccountUser::find(&ctx.db, unknown_account, user.id)
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn set_active_account_advances_active_at() {
    let Some(ctx) = TestContext::try_new().await.unwrap() else {
        return;
    };
    let (user, token) = ctx.create_user().await.unwrap();
    let account_id = ctx.create_membership(&user).await.unwrap();

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/profile/set_active_account",
            Some(&token),
            Some(json!({ "account_id": account_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let first = AccountUser::find(&ctx.db, account_id, user.id)
        .await
        .unwrap()
        .unwrap()
        .active_at
        .expect("active_at should be stamped");

    let (status, _) = ctx
        .send(json_request(
            Method::POST,
            "/v1/profile/set_active_account",
            Some(&token),
            Some(json!({ "account_id": account_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let second = AccountUser::find(&ctx.db, account_id, user.id)
        .await
        .unwrap()
        .unwrap()
        .active_at
        .expect("active_at should be stamped");

    assert!(second >= first);
}
