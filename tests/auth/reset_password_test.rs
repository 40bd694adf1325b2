use chrono::Duration;
use timebook_auth::modules::auth::interface::AuthError;
use timebook_auth::modules::auth::model::CodePurpose;

use crate::common::{session, test_email, test_password, TestAuth};

const NEW_PASSWORD: &str = "BrandNewPassword456!";

#[tokio::test]
async fn forgot_password_sends_a_short_lived_code() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.register_verified(&email, test_password()).await;

    ctx.auth.forgot_password(&email).await.unwrap();

    let user_id = ctx.users.user_id(&email);
    let row = ctx.codes.get(&user_id, CodePurpose::PasswordReset).unwrap();
    assert_eq!(row.expires_at - row.created_at, Duration::minutes(10));
}

#[tokio::test]
async fn forgot_password_for_unknown_email_is_a_silent_ack() {
    let ctx = TestAuth::new();

    ctx.auth.forgot_password("nobody@example.com").await.unwrap();

    assert_eq!(ctx.mailer.sent_count(), 0);
}

#[tokio::test]
async fn forgot_password_respects_the_resend_cooldown() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.register_verified(&email, test_password()).await;
    let sent_before = ctx.mailer.sent_count();

    ctx.auth.forgot_password(&email).await.unwrap();
    ctx.auth.forgot_password(&email).await.unwrap();

    assert_eq!(ctx.mailer.sent_count(), sent_before + 1);
}

#[tokio::test]
async fn reset_password_swaps_credentials_and_revokes_all_sessions() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.register_verified(&email, test_password()).await;
    let old_session = ctx.auth.login(&email, test_password(), &session()).await.unwrap();

    ctx.auth.forgot_password(&email).await.unwrap();
    let code = ctx.mailer.last_code_for(&email);

    let fresh = ctx
        .auth
        .reset_password(&email, &code, NEW_PASSWORD, &session())
        .await
        .unwrap();

    // Every pre-reset session is gone; the pair returned by the reset works.
    let err = ctx.auth.refresh(&old_session.refresh_token, &session()).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
    ctx.auth.refresh(&fresh.refresh_token, &session()).await.unwrap();

    // Old password dead, new one live.
    let err = ctx.auth.login(&email, test_password(), &session()).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
    ctx.auth.login(&email, NEW_PASSWORD, &session()).await.unwrap();
}

#[tokio::test]
async fn reset_with_a_wrong_code_changes_nothing() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.register_verified(&email, test_password()).await;
    ctx.auth.forgot_password(&email).await.unwrap();
    let real = ctx.mailer.last_code_for(&email);
    let wrong = if real == "000000" { "000001" } else { "000000" };

    let err = ctx
        .auth
        .reset_password(&email, wrong, NEW_PASSWORD, &session())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CodeInvalid));

    ctx.auth.login(&email, test_password(), &session()).await.unwrap();
}

#[tokio::test]
async fn reset_code_is_single_use() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.register_verified(&email, test_password()).await;
    ctx.auth.forgot_password(&email).await.unwrap();
    let code = ctx.mailer.last_code_for(&email);

    ctx.auth
        .reset_password(&email, &code, NEW_PASSWORD, &session())
        .await
        .unwrap();

    let err = ctx
        .auth
        .reset_password(&email, &code, "YetAnotherPass789!", &session())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CodeInvalid));
}

#[tokio::test]
async fn reset_code_for_unknown_email_fails_like_a_bad_code() {
    let ctx = TestAuth::new();

    let err = ctx
        .auth
        .reset_password("nobody@example.com", "123456", NEW_PASSWORD, &session())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::CodeInvalid));
}

#[tokio::test]
async fn verification_and_reset_codes_do_not_collide() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.auth.register(&email, test_password()).await.unwrap();
    let verify_code = ctx.mailer.last_code_for(&email);

    // A reset code for the same user lives in its own family.
    let user_id = ctx.users.user_id(&email);
    ctx.auth.verify_email(&email, &verify_code, &session()).await.unwrap();
    ctx.auth.forgot_password(&email).await.unwrap();

    assert!(ctx.codes.get(&user_id, CodePurpose::PasswordReset).is_some());
    assert!(ctx.codes.get(&user_id, CodePurpose::EmailVerification).is_none());
}
