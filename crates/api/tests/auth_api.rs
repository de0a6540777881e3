//! HTTP-level integration tests for provider login, refresh and logout.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, google_id_token, login, post_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// A verified Google token yields a token pair and the resolved user.
#[tokio::test]
async fn test_login_success() {
    let app = common::build_test_app();
    let json = login(app.router.clone(), "google-sub-1").await;

    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert!(json["user"]["id"].is_string());
    assert_eq!(json["user"]["name"], "Test User");
    assert_eq!(json["user"]["avatar_url"], "https://lh3.test/avatar.png");
    assert_eq!(app.store.live_count(), 2);
}

/// The same provider subject always maps to the same user.
#[tokio::test]
async fn test_login_is_stable_per_subject() {
    let app = common::build_test_app();
    let first = login(app.router.clone(), "google-sub-1").await;
    let second = login(app.router.clone(), "google-sub-1").await;

    assert_eq!(first["user"]["id"], second["user"]["id"]);
    assert_ne!(first["access_token"], second["access_token"]);
}

/// `provider_token` is accepted as an alias of `id_token`.
#[tokio::test]
async fn test_login_accepts_provider_token_alias() {
    let app = common::build_test_app();
    let body = json!({ "provider_token": google_id_token("google-sub-2") });
    let response = post_json(app.router, "/api/v1/auth/google/login", body).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_forged_token_is_unauthorized() {
    let app = common::build_test_app();
    let body = json!({ "id_token": "eyJhbGciOiJSUzI1NiJ9.e30.c2lnbmF0dXJl" });
    let response = post_json(app.router, "/api/v1/auth/google/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.live_count(), 0);
}

#[tokio::test]
async fn test_login_without_token_is_bad_request() {
    let app = common::build_test_app();
    let response = post_json(app.router, "/api/v1/auth/google/login", json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

/// Unknown providers and configured-off providers are both input errors.
#[tokio::test]
async fn test_login_with_unsupported_provider_is_bad_request() {
    let app = common::build_test_app();
    let body = json!({ "id_token": google_id_token("google-sub-1") });

    let response = post_json(app.router.clone(), "/api/v1/auth/github/login", body.clone()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(app.router, "/api/v1/auth/apple/login", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_malformed_invite_is_bad_request() {
    let app = common::build_test_app();
    let body = json!({ "id_token": google_id_token("google-sub-1"), "invite": "not-a-uuid" });
    let response = post_json(app.router, "/api/v1/auth/google/login", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.live_count(), 0);
}

/// Joining the invited event is best-effort; the database here is
/// unreachable, and login must still succeed.
#[tokio::test]
async fn test_login_succeeds_when_invite_cannot_be_applied() {
    let app = common::build_test_app();
    let body = json!({
        "id_token": google_id_token("google-sub-1"),
        "invite": uuid::Uuid::new_v4().to_string(),
    });
    let response = post_json(app.router, "/api/v1/auth/google/login", body).await;

    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

/// Refresh rotates the pair; the new access token works for the same user.
#[tokio::test]
async fn test_refresh_issues_working_pair() {
    let app = common::build_test_app();
    let login_json = login(app.router.clone(), "google-sub-1").await;

    let body = json!({ "refresh_token": login_json["refresh_token"] });
    let response = post_json(app.router.clone(), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = body_json(response).await;

    assert_ne!(refreshed["refresh_token"], login_json["refresh_token"]);
    assert_eq!(refreshed["expires_in"], 15 * 60);

    // Old pair: refresh consumed, access still live. New pair: both live.
    assert_eq!(app.store.live_count(), 3);
}

/// A refresh token can only be exchanged once.
#[tokio::test]
async fn test_refresh_token_reuse_is_unauthorized() {
    let app = common::build_test_app();
    let login_json = login(app.router.clone(), "google-sub-1").await;
    let body = json!({ "refresh_token": login_json["refresh_token"] });

    let first = post_json(app.router.clone(), "/api/v1/auth/refresh", body.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = post_json(app.router, "/api/v1/auth/refresh", body).await;
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let app = common::build_test_app();
    let login_json = login(app.router.clone(), "google-sub-1").await;

    let body = json!({ "refresh_token": login_json["access_token"] });
    let response = post_json(app.router, "/api/v1/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_without_token_is_bad_request() {
    let app = common::build_test_app();
    let response = post_json(app.router, "/api/v1/auth/refresh", json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

/// Logout revokes both halves: the access token stops working on protected
/// routes and the refresh token can no longer be exchanged.
#[tokio::test]
async fn test_logout_revokes_session() {
    let app = common::build_test_app();
    let login_json = login(app.router.clone(), "google-sub-1").await;
    let access = login_json["access_token"].as_str().unwrap();

    let response = get_auth(app.router.clone(), "/api/v1/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "success");

    let response = get_auth(app.router.clone(), "/api/v1/events", access).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json!({ "refresh_token": login_json["refresh_token"] });
    let response = post_json(app.router, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(app.store.live_count(), 0);
}

#[tokio::test]
async fn test_second_logout_is_unauthorized() {
    let app = common::build_test_app();
    let login_json = login(app.router.clone(), "google-sub-1").await;
    let access = login_json["access_token"].as_str().unwrap();

    let first = get_auth(app.router.clone(), "/api/v1/auth/logout", access).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = get_auth(app.router, "/api/v1/auth/logout", access).await;
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_header_is_bad_request() {
    let app = common::build_test_app();
    let response = get(app.router, "/api/v1/auth/logout").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
