//! Account routes against a fake user pool, plus role checks.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{TestHarness, GOOD_CODE, GOOD_PASSWORD};

#[tokio::test]
async fn test_health() {
    let harness = TestHarness::new();
    let response = harness.get("/api/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "message": "OK" }));
}

#[tokio::test]
async fn test_sign_up_returns_sub() {
    let harness = TestHarness::new();

    let response = harness
        .post(
            "/api/auth/sign_up",
            None,
            json!({ "email": "new@example.com", "password": GOOD_PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, json!({ "sub": "sub-new@example.com" }));
}

#[tokio::test]
async fn test_provider_rejection_keeps_its_message() {
    let harness = TestHarness::new();

    let response = harness
        .post(
            "/api/auth/sign_up",
            None,
            json!({ "email": "taken@example.com", "password": GOOD_PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["detail"], "User already exists");
}

#[tokio::test]
async fn test_confirm_adds_default_group() {
    let harness = TestHarness::new();

    let response = harness
        .post(
            "/api/auth/sign_up/confirm",
            None,
            json!({ "email": "new@example.com", "confirmation_code": GOOD_CODE }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Account confirmed successfully");
    assert_eq!(
        harness.identity.calls(),
        [
            "confirm_sign_up:new@example.com",
            "add_user_to_group:new@example.com/User"
        ]
    );
}

#[tokio::test]
async fn test_confirm_survives_group_failure() {
    let harness = TestHarness::new();
    harness.identity.fail_group_assignment();

    let response = harness
        .post(
            "/api/auth/sign_up/confirm",
            None,
            json!({ "email": "new@example.com", "confirmation_code": GOOD_CODE }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_confirm_with_wrong_code_skips_group() {
    let harness = TestHarness::new();

    let response = harness
        .post(
            "/api/auth/sign_up/confirm",
            None,
            json!({ "email": "new@example.com", "confirmation_code": "000000" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.identity.calls(), ["confirm_sign_up:new@example.com"]);
}

#[tokio::test]
async fn test_code_delivery_routes() {
    let harness = TestHarness::new();

    let resend = harness
        .post(
            "/api/auth/confirmation_code/resend?email=new%40example.com",
            None,
            json!({}),
        )
        .await;
    assert_eq!(resend.status, StatusCode::OK);
    assert_eq!(resend.body["message"], "Confirmation code resent successfully");

    let forgot = harness
        .post("/api/auth/forgot_password?email=new%40example.com", None, json!({}))
        .await;
    assert_eq!(forgot.status, StatusCode::OK);
    assert_eq!(
        forgot.body["message"],
        "Password reset code sent to your email address"
    );

    let reset = harness
        .post(
            "/api/auth/forgot_password/confirm",
            None,
            json!({
                "email": "new@example.com",
                "confirmation_code": GOOD_CODE,
                "new_password": "Another-Pass-2",
            }),
        )
        .await;
    assert_eq!(reset.status, StatusCode::OK);
    assert_eq!(reset.body["message"], "Password reset successful");

    assert_eq!(
        harness.identity.calls(),
        [
            "resend_confirmation_code:new@example.com",
            "forgot_password:new@example.com",
            "confirm_forgot_password:new@example.com",
        ]
    );
}

#[tokio::test]
async fn test_sign_in_and_refresh() {
    let harness = TestHarness::new();

    let signed_in = harness
        .post(
            "/api/auth/sign_in",
            None,
            json!({ "email": "alice@example.com", "password": GOOD_PASSWORD }),
        )
        .await;
    assert_eq!(signed_in.status, StatusCode::OK);
    assert_eq!(signed_in.body["AccessToken"], "access-token");
    assert_eq!(signed_in.body["RefreshToken"], "refresh-token");
    assert_eq!(signed_in.body["ExpiresIn"], 3600);

    let refreshed = harness
        .post(
            "/api/auth/token/refresh",
            None,
            json!({ "refresh_token": "refresh-token" }),
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    assert_eq!(refreshed.body["IdToken"], "id-token");
    assert!(refreshed.body.get("RefreshToken").is_none());
}

#[tokio::test]
async fn test_sign_in_with_wrong_password() {
    let harness = TestHarness::new();

    let response = harness
        .post(
            "/api/auth/sign_in",
            None,
            json!({ "email": "alice@example.com", "password": "wrong" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["detail"], "Incorrect username or password.");
}

#[tokio::test]
async fn test_change_password_and_sign_out() {
    let harness = TestHarness::new();

    let changed = harness
        .post(
            "/api/auth/change_password",
            None,
            json!({
                "access_token": "access-token",
                "old_password": GOOD_PASSWORD,
                "new_password": "Another-Pass-2",
            }),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);
    assert_eq!(changed.body["message"], "Password changed successfully");

    let signed_out = harness
        .post(
            "/api/auth/sign_out",
            None,
            json!({ "access_token": "access-token" }),
        )
        .await;
    assert_eq!(signed_out.status, StatusCode::NO_CONTENT);
    assert!(signed_out.body.is_null());
}

#[tokio::test]
async fn test_me_reflects_token_claims() {
    let harness = TestHarness::new();
    let token = harness.user_token("alice@example.com");

    let response = harness.get("/api/auth/me", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({
            "sub": "sub-alice@example.com",
            "email": "alice@example.com",
            "email_verified": true,
            "roles": ["User"],
        })
    );

    let anonymous = harness.get("/api/auth/me", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_route_checks_group() {
    let harness = TestHarness::new();

    let user = harness.user_token("alice@example.com");
    let response = harness.get("/api/auth/admin", Some(&user)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["detail"], "Access forbidden");

    let admin = harness.admin_token();
    let response = harness.get("/api/auth/admin", Some(&admin)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Welcome, admin user");

    let response = harness.get("/api/auth/admin", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
