//! End-to-end registration, login, and token scenarios.

mod common;

use chrono::Utc;
use serde_json::json;

use keyhub_auth::TokenCodec;
use keyhub_auth::users::{get_user_by_email, update_user_fields};
use keyhub_core::{AuthEvent, ErrorKind};
use keyhub_service::{ChangePasswordRequest, LoginRequest, RegisterRequest};

use common::TestApp;

#[tokio::test]
async fn test_register_then_duplicate_email() {
    let app = TestApp::new();
    let mut ctx = app.context();

    let outcome = app
        .auth
        .sign_up(&mut ctx, &RegisterRequest::new("bob@x.com", "sup3r-secret"))
        .await
        .unwrap();
    assert!(!outcome.pending_activation);
    assert_eq!(outcome.user.email, "bob@x.com");
    // No activation gate, so registration signs the user in.
    assert_eq!(ctx.session_user_id(), Some(outcome.user.id));

    let err = app
        .auth
        .sign_up(&mut ctx, &RegisterRequest::new("BOB@X.COM", "sup3r-secret"))
        .await
        .unwrap_err();
    assert_eq!(err.message, "email has exists");
    assert!(err.is_kind(ErrorKind::Conflict));
}

#[tokio::test]
async fn test_login_error_messages() {
    let app = TestApp::new();
    let mut ctx = app.context();
    app.auth
        .sign_up(&mut ctx, &RegisterRequest::new("bob@x.com", "sup3r-secret"))
        .await
        .unwrap();
    app.auth.sign_out(&mut ctx).await.unwrap();

    let err = app
        .auth
        .sign_in(&mut ctx, &LoginRequest::with_password("bob@x.com", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.message, "unauthorized");

    let err = app
        .auth
        .sign_in(&mut ctx, &LoginRequest::with_password("nobody@x.com", "x"))
        .await
        .unwrap_err();
    assert_eq!(err.message, "user not exists");
}

#[tokio::test]
async fn test_remember_token_round_trip() {
    let app = TestApp::new();
    let mut ctx = app.context();
    app.auth
        .sign_up(&mut ctx, &RegisterRequest::new("bob@x.com", "sup3r-secret"))
        .await
        .unwrap();
    app.auth.sign_out(&mut ctx).await.unwrap();

    let mut login = LoginRequest::with_password("bob@x.com", "sup3r-secret");
    login.remember = true;
    let user = app.auth.sign_in(&mut ctx, &login).await.unwrap();
    assert!(!user.auth_token.is_empty());
    // The token is ephemeral; the stored row never carries it.
    let stored = get_user_by_email(app.store.as_ref(), "bob@x.com")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.auth_token.is_empty());

    let mut ctx = app.context();
    let back = app
        .auth
        .sign_in(&mut ctx, &LoginRequest::with_token(&user.auth_token))
        .await
        .unwrap();
    assert_eq!(back.id, user.id);

    // A token past its expiry is rejected as expired, not malformed.
    let codec = TokenCodec::new(&app.config.secret);
    let expired = codec.encode(&back, Utc::now().timestamp() - 1, false);
    let err = app
        .auth
        .sign_in(&mut ctx, &LoginRequest::with_token(&expired))
        .await
        .unwrap_err();
    assert_eq!(err.message, "token expired");
}

#[tokio::test]
async fn test_remember_token_survives_later_logins() {
    let app = TestApp::new();
    let mut ctx = app.context();
    app.auth
        .sign_up(&mut ctx, &RegisterRequest::new("bob@x.com", "sup3r-secret"))
        .await
        .unwrap();
    app.auth.sign_out(&mut ctx).await.unwrap();

    let mut login = LoginRequest::with_password("bob@x.com", "sup3r-secret");
    login.remember = true;
    let user = app.auth.sign_in(&mut ctx, &login).await.unwrap();

    // A later password login moves the last-login stamp; the remember
    // token is not bound to it and must keep working.
    let mut ctx = app.context();
    app.auth
        .sign_in(
            &mut ctx,
            &LoginRequest::with_password("bob@x.com", "sup3r-secret"),
        )
        .await
        .unwrap();

    let mut ctx = app.context();
    let back = app
        .auth
        .sign_in(&mut ctx, &LoginRequest::with_token(&user.auth_token))
        .await
        .unwrap();
    assert_eq!(back.id, user.id);

    // A token digested without the login timestamp, as any earlier issuer
    // produced, is accepted too.
    let stored = get_user_by_email(app.store.as_ref(), "bob@x.com")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.last_login.is_some());
    let codec = TokenCodec::new(&app.config.secret);
    let unbound = codec.encode(&stored, Utc::now().timestamp() + 3_600, false);
    let mut ctx = app.context();
    app.auth
        .sign_in(&mut ctx, &LoginRequest::with_token(&unbound))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_password_change_invalidates_tokens() {
    let app = TestApp::new();
    let mut ctx = app.context();
    app.auth
        .sign_up(&mut ctx, &RegisterRequest::new("bob@x.com", "sup3r-secret"))
        .await
        .unwrap();

    let mut login = LoginRequest::with_password("bob@x.com", "sup3r-secret");
    login.remember = true;
    let user = app.auth.sign_in(&mut ctx, &login).await.unwrap();

    app.auth
        .change_password(
            &mut ctx,
            &ChangePasswordRequest {
                password: "n3w-secret".to_string(),
            },
        )
        .await
        .unwrap();

    let mut fresh = app.context();
    let err = app
        .auth
        .sign_in(&mut fresh, &LoginRequest::with_token(&user.auth_token))
        .await
        .unwrap_err();
    assert_eq!(err.message, "bad token");

    app.auth
        .sign_in(&mut fresh, &LoginRequest::with_password("bob@x.com", "n3w-secret"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_activation_gate() {
    let app = TestApp::new();
    app.auth
        .settings()
        .set_bool(&app.config.activation_required_key, true)
        .await
        .unwrap();

    let mut ctx = app.context();
    let outcome = app
        .auth
        .sign_up(&mut ctx, &RegisterRequest::new("bob@x.com", "sup3r-secret"))
        .await
        .unwrap();
    assert!(outcome.pending_activation);
    assert_eq!(ctx.session_user_id(), None);

    let err = app
        .auth
        .sign_in(
            &mut ctx,
            &LoginRequest::with_password("bob@x.com", "sup3r-secret"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.message, "waiting for activation");
}

#[tokio::test]
async fn test_disabled_user_cannot_login() {
    let app = TestApp::new();
    let mut ctx = app.context();
    let outcome = app
        .auth
        .sign_up(&mut ctx, &RegisterRequest::new("bob@x.com", "sup3r-secret"))
        .await
        .unwrap();
    app.auth.sign_out(&mut ctx).await.unwrap();

    let mut changes = keyhub_store::Row::new();
    changes.insert("enabled".to_string(), json!(false));
    update_user_fields(app.store.as_ref(), &outcome.user, changes)
        .await
        .unwrap();

    let err = app
        .auth
        .sign_in(
            &mut ctx,
            &LoginRequest::with_password("bob@x.com", "sup3r-secret"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.message, "user not allow login");
}

#[tokio::test]
async fn test_events_are_dispatched() {
    let app = TestApp::new();
    let mut ctx = app.context();
    app.auth
        .sign_up(&mut ctx, &RegisterRequest::new("bob@x.com", "sup3r-secret"))
        .await
        .unwrap();
    app.auth.sign_out(&mut ctx).await.unwrap();
    app.auth
        .sign_in(
            &mut ctx,
            &LoginRequest::with_password("bob@x.com", "sup3r-secret"),
        )
        .await
        .unwrap();

    let events = app.events.drain();
    assert!(matches!(events[0], AuthEvent::Created { pending_activation: false, .. }));
    assert!(matches!(events[1], AuthEvent::Logout { .. }));
    assert!(matches!(events[2], AuthEvent::Login { .. }));
}

#[tokio::test]
async fn test_timezone_adoption_on_login() {
    let app = TestApp::new();
    let mut ctx = app.context();
    let mut register = RegisterRequest::new("bob@x.com", "sup3r-secret");
    register.timezone = "Asia/Tokyo".to_string();
    app.auth.sign_up(&mut ctx, &register).await.unwrap();
    app.auth.sign_out(&mut ctx).await.unwrap();

    // The stored preference applies when the request carries none.
    let mut ctx = app.context();
    app.auth
        .sign_in(
            &mut ctx,
            &LoginRequest::with_password("bob@x.com", "sup3r-secret"),
        )
        .await
        .unwrap();
    assert_eq!(ctx.current_timezone(), "Asia/Tokyo");

    // An explicit request timezone wins.
    let mut ctx = app.context();
    let mut login = LoginRequest::with_password("bob@x.com", "sup3r-secret");
    login.timezone = "Europe/Berlin".to_string();
    app.auth.sign_in(&mut ctx, &login).await.unwrap();
    assert_eq!(ctx.current_timezone(), "Europe/Berlin");
}
