use std::sync::Arc;

use crate::services::hashing;
use crate::services::jwt::JwtService;

use super::codes::CodeEngine;
use super::interface::{
    AuthError, CodeDelivery, OneTimeCodeRepository, RefreshTokenRepository, Result, UserDirectory,
};
use super::model::{CodePurpose, SessionInfo, User};
use super::tokens::RefreshTokenStore;

#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Orchestrates the auth use cases over injected collaborators: the user
/// directory, the one-time code engine, the refresh token store and the
/// access-token signer. Each call is an independent request-scoped unit of
/// work; the only shared state is the read-only secrets.
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    codes: CodeEngine,
    refresh: RefreshTokenStore,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        codes: Arc<dyn OneTimeCodeRepository>,
        tokens: Arc<dyn RefreshTokenRepository>,
        delivery: Arc<dyn CodeDelivery>,
        jwt: Arc<JwtService>,
        token_pepper: String,
    ) -> Self {
        Self {
            users,
            codes: CodeEngine::new(codes, delivery),
            refresh: RefreshTokenStore::new(tokens, token_pepper),
            jwt,
        }
    }

    /// Create an unverified user and send the verification code. Duplicate
    /// email is the one failure registration is allowed to reveal.
    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::Conflict);
        }
        let password_hash = hash_password_blocking(password.to_string()).await?;
        let user = self.users.create(email, Some(&password_hash)).await?;
        self.codes.issue(&user, CodePurpose::EmailVerification).await
    }

    /// Anti-enumeration: an unknown or already-verified address gets the same
    /// silent acknowledgement as a real send.
    pub async fn resend_verification_code(&self, email: &str) -> Result<()> {
        match self.users.find_by_email(email).await? {
            None => Ok(()),
            Some(user) if user.is_verified => Ok(()),
            Some(user) => self.codes.issue(&user, CodePurpose::EmailVerification).await,
        }
    }

    /// Consume the verification code, mark the account verified, then log the
    /// user in. Unknown and already-verified accounts fail exactly like a bad
    /// code.
    pub async fn verify_email(
        &self,
        email: &str,
        code: &str,
        session: &SessionInfo,
    ) -> Result<TokenPair> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) if !user.is_verified => user,
            _ => return Err(AuthError::CodeInvalid),
        };
        self.codes
            .consume(&user.id, CodePurpose::EmailVerification, code)
            .await?;
        self.users.set_verified(&user.id).await?;
        self.issue_pair(&user, session).await
    }

    /// Credential login. Missing user, unset password and mismatch collapse
    /// into one `Unauthorized`; an unverified account gets the explicit
    /// verify-your-email message, which reveals nothing sensitive.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        session: &SessionInfo,
    ) -> Result<TokenPair> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Err(AuthError::Unauthorized);
        };
        let Some(ref stored_hash) = user.password_hash else {
            return Err(AuthError::Unauthorized);
        };
        if !verify_password_blocking(password.to_string(), stored_hash.clone()).await? {
            return Err(AuthError::Unauthorized);
        }
        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }
        self.issue_pair(&user, session).await
    }

    /// Rotate the refresh token and mint a fresh access token for its owner.
    pub async fn refresh(&self, refresh_token: &str, session: &SessionInfo) -> Result<TokenPair> {
        let (fresh_refresh, user_id) = self.refresh.rotate(refresh_token, session).await?;
        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        let access_token = self.sign_access_token(&user)?;
        Ok(TokenPair {
            access_token,
            refresh_token: fresh_refresh,
            expires_in: self.jwt.access_token_duration_secs(),
        })
    }

    /// Idempotent: revoking a token that is already gone is a success.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        self.refresh.revoke(refresh_token).await
    }

    pub async fn logout_all(&self, user_id: &str) -> Result<()> {
        self.refresh.revoke_all(user_id).await
    }

    /// Anti-enumeration twin of `resend_verification_code` for the password
    /// reset family.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        match self.users.find_by_email(email).await? {
            None => Ok(()),
            Some(user) => self.codes.issue(&user, CodePurpose::PasswordReset).await,
        }
    }

    /// Consume the reset code, store the new password hash, revoke every
    /// session, then log in. Forcing re-login everywhere is what makes a
    /// stolen session useless after the owner resets.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
        session: &SessionInfo,
    ) -> Result<TokenPair> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Err(AuthError::CodeInvalid);
        };
        self.codes
            .consume(&user.id, CodePurpose::PasswordReset, code)
            .await?;

        let password_hash = hash_password_blocking(new_password.to_string()).await?;
        self.users.set_password(&user.id, &password_hash).await?;
        self.refresh.revoke_all(&user.id).await?;
        self.issue_pair(&user, session).await
    }

    async fn issue_pair(&self, user: &User, session: &SessionInfo) -> Result<TokenPair> {
        let access_token = self.sign_access_token(user)?;
        let refresh_token = self.refresh.issue(&user.id, session).await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_token_duration_secs(),
        })
    }

    fn sign_access_token(&self, user: &User) -> Result<String> {
        self.jwt
            .create_access_token(&user.id, &user.email)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

// Argon2 is CPU-bound by design; park it on the blocking pool so the runtime
// workers stay responsive.
async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hashing::hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| AuthError::Internal(e.to_string()))
}

async fn verify_password_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || hashing::verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| AuthError::Internal(e.to_string()))
}
