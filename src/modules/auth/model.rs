use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Unset until a verified account has a password.
    pub password_hash: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The two one-time-code families. Each has its own uniqueness constraint on
/// the user, so a user can hold at most one active code per purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodePurpose {
    EmailVerification,
    PasswordReset,
}

impl CodePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }

    pub fn ttl(self) -> Duration {
        match self {
            Self::EmailVerification => Duration::minutes(30),
            Self::PasswordReset => Duration::minutes(10),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OneTimeCode {
    pub id: String,
    pub user_id: String,
    pub code: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Row behind an opaque refresh token. Only the peppered hash is stored;
/// the raw value never touches the database or the logs.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Per-request client metadata attached to refresh token rows.
#[derive(Debug, Clone, Default)]
pub struct SessionInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
