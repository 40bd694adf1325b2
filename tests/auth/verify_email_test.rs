use chrono::{Duration, Utc};
use timebook_auth::modules::auth::interface::AuthError;
use timebook_auth::modules::auth::model::CodePurpose;

use crate::common::{session, test_email, test_password, TestAuth};

#[tokio::test]
async fn verify_with_unknown_email_fails_like_a_bad_code() {
    let ctx = TestAuth::new();

    let err = ctx
        .auth
        .verify_email("nobody@example.com", "123456", &session())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::CodeInvalid));
}

#[tokio::test]
async fn verify_with_wrong_code_fails_and_counts_the_attempt() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.auth.register(&email, test_password()).await.unwrap();
    let real = ctx.mailer.last_code_for(&email);
    let wrong = if real == "000000" { "000001" } else { "000000" };

    let err = ctx.auth.verify_email(&email, wrong, &session()).await.unwrap_err();
    assert!(matches!(err, AuthError::CodeInvalid));

    let user_id = ctx.users.user_id(&email);
    let row = ctx.codes.get(&user_id, CodePurpose::EmailVerification).unwrap();
    assert_eq!(row.attempts, 1);

    // The real code still works after one bad guess.
    ctx.auth.verify_email(&email, &real, &session()).await.unwrap();
}

#[tokio::test]
async fn five_failed_attempts_kill_even_the_correct_code() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.auth.register(&email, test_password()).await.unwrap();
    let real = ctx.mailer.last_code_for(&email);
    let wrong = if real == "000000" { "000001" } else { "000000" };

    for _ in 0..5 {
        let err = ctx.auth.verify_email(&email, wrong, &session()).await.unwrap_err();
        assert!(matches!(err, AuthError::CodeInvalid));
    }

    let err = ctx.auth.verify_email(&email, &real, &session()).await.unwrap_err();
    assert!(matches!(err, AuthError::CodeInvalid));
}

#[tokio::test]
async fn code_is_accepted_just_before_expiry() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.auth.register(&email, test_password()).await.unwrap();
    let code = ctx.mailer.last_code_for(&email);
    let user_id = ctx.users.user_id(&email);

    ctx.codes.set_expires(
        &user_id,
        CodePurpose::EmailVerification,
        Utc::now() + Duration::seconds(1),
    );

    ctx.auth.verify_email(&email, &code, &session()).await.unwrap();
}

#[tokio::test]
async fn code_is_rejected_just_after_expiry() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.auth.register(&email, test_password()).await.unwrap();
    let code = ctx.mailer.last_code_for(&email);
    let user_id = ctx.users.user_id(&email);

    ctx.codes.set_expires(
        &user_id,
        CodePurpose::EmailVerification,
        Utc::now() - Duration::seconds(1),
    );

    let err = ctx.auth.verify_email(&email, &code, &session()).await.unwrap_err();
    assert!(matches!(err, AuthError::CodeInvalid));

    // The failed attempt on a dead code is still counted.
    let row = ctx.codes.get(&user_id, CodePurpose::EmailVerification).unwrap();
    assert_eq!(row.attempts, 1);
}

#[tokio::test]
async fn already_verified_account_cannot_be_verified_again() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.register_verified(&email, test_password()).await;

    let err = ctx
        .auth
        .verify_email(&email, "123456", &session())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CodeInvalid));
}

#[tokio::test]
async fn successful_verification_deletes_the_code_row() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.auth.register(&email, test_password()).await.unwrap();
    let code = ctx.mailer.last_code_for(&email);

    ctx.auth.verify_email(&email, &code, &session()).await.unwrap();

    assert_eq!(ctx.codes.count(), 0);
}
