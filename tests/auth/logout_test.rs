use timebook_auth::modules::auth::interface::AuthError;

use crate::common::{session, test_email, test_password, TestAuth};

#[tokio::test]
async fn logout_revokes_the_session() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.register_verified(&email, test_password()).await;
    let pair = ctx.auth.login(&email, test_password(), &session()).await.unwrap();

    ctx.auth.logout(&pair.refresh_token).await.unwrap();

    let err = ctx.auth.refresh(&pair.refresh_token, &session()).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.register_verified(&email, test_password()).await;
    let pair = ctx.auth.login(&email, test_password(), &session()).await.unwrap();

    ctx.auth.logout(&pair.refresh_token).await.unwrap();
    ctx.auth.logout(&pair.refresh_token).await.unwrap();
    ctx.auth.logout("never-issued").await.unwrap();
}

#[tokio::test]
async fn logout_all_drops_every_session_for_the_user() {
    let ctx = TestAuth::new();
    let email = test_email();
    ctx.register_verified(&email, test_password()).await;
    let user_id = ctx.users.user_id(&email);

    let a = ctx.auth.login(&email, test_password(), &session()).await.unwrap();
    let b = ctx.auth.login(&email, test_password(), &session()).await.unwrap();

    ctx.auth.logout_all(&user_id).await.unwrap();

    assert_eq!(ctx.tokens.count_for_user(&user_id), 0);
    for raw in [a.refresh_token, b.refresh_token] {
        let err = ctx.auth.refresh(&raw, &session()).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }
}

#[tokio::test]
async fn logout_all_leaves_other_users_sessions_alone() {
    let ctx = TestAuth::new();
    let alice = test_email();
    let bob = test_email();
    ctx.register_verified(&alice, test_password()).await;
    ctx.register_verified(&bob, test_password()).await;
    let bob_pair = ctx.auth.login(&bob, test_password(), &session()).await.unwrap();

    ctx.auth.logout_all(&ctx.users.user_id(&alice)).await.unwrap();

    ctx.auth.refresh(&bob_pair.refresh_token, &session()).await.unwrap();
}
