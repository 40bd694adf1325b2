use async_trait::async_trait;

use super::model::{CodePurpose, OneTimeCode, RefreshToken, User};

pub type Result<T> = std::result::Result<T, AuthError>;

// =============================================================================
// COLLABORATOR TRAITS
// =============================================================================

/// User directory owned by the user-management side; auth only reads users
/// and updates the credential fields. Lookups return `Option` rather than
/// erroring so call sites decide whether absence may leak outward.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn create(&self, email: &str, password_hash: Option<&str>) -> Result<User>;
    async fn set_verified(&self, user_id: &str) -> Result<()>;
    async fn set_password(&self, user_id: &str, password_hash: &str) -> Result<()>;
}

#[async_trait]
pub trait OneTimeCodeRepository: Send + Sync {
    async fn find_by_user(&self, user_id: &str, purpose: CodePurpose) -> Result<Option<OneTimeCode>>;
    async fn insert(&self, purpose: CodePurpose, code: &OneTimeCode) -> Result<()>;
    async fn increment_attempts(&self, id: &str) -> Result<()>;
    /// Returns the number of rows removed, so a racing consumer that finds
    /// nothing left to delete can fail closed.
    async fn delete(&self, id: &str) -> Result<u64>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, token: &RefreshToken) -> Result<()>;
    /// Atomically remove the row for this hash and return it. At most one of
    /// several concurrent callers gets `Some`; the rest see `None`.
    async fn delete_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>>;
    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64>;
}

/// Outbound delivery of plaintext one-time codes. Transport and templating
/// live behind this seam.
#[async_trait]
pub trait CodeDelivery: Send + Sync {
    async fn send_code(&self, email: &str, purpose: CodePurpose, code: &str) -> Result<()>;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User with this email already exists")]
    Conflict,

    /// Bad credentials, unknown user, missing password and invalid or reused
    /// refresh tokens all collapse here so nothing about the account leaks.
    #[error("Invalid email or password")]
    Unauthorized,

    #[error("Please verify your email")]
    EmailNotVerified,

    /// Wrong code, expired code, exhausted attempts and no-such-code are
    /// deliberately indistinguishable.
    #[error("Invalid email or code")]
    CodeInvalid,

    #[error("Error sending email")]
    DeliveryFailed,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::EmailNotVerified => StatusCode::UNAUTHORIZED,
            Self::CodeInvalid => StatusCode::BAD_REQUEST,
            Self::DeliveryFailed => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
