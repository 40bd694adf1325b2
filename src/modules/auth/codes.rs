use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::services::hashing::generate_numeric_code;

use super::interface::{AuthError, CodeDelivery, OneTimeCodeRepository, Result};
use super::model::{CodePurpose, OneTimeCode, User};

/// A code is dead after this many failed consume attempts, even if unexpired.
pub const MAX_ATTEMPTS: i32 = 5;

/// Minimum age of an existing code before a resend replaces it.
pub const RESEND_COOLDOWN_SECS: i64 = 60;

/// Lifecycle engine for short-lived numeric codes, shared by the email
/// verification and password reset families. Per code the states are
/// absent -> active -> (consumed | expired | attempts-exhausted | superseded),
/// and every terminal state converges on row deletion.
pub struct CodeEngine {
    codes: Arc<dyn OneTimeCodeRepository>,
    delivery: Arc<dyn CodeDelivery>,
}

impl CodeEngine {
    pub fn new(codes: Arc<dyn OneTimeCodeRepository>, delivery: Arc<dyn CodeDelivery>) -> Self {
        Self { codes, delivery }
    }

    /// Create and deliver a fresh code for (user, purpose). If an active code
    /// is younger than the cooldown this is a silent no-op, so resend abuse
    /// can neither spam the mailbox nor probe for account state. A delivery
    /// failure is surfaced; the stored row stays and resend is the retry path.
    pub async fn issue(&self, user: &User, purpose: CodePurpose) -> Result<()> {
        if let Some(existing) = self.codes.find_by_user(&user.id, purpose).await? {
            let age = Utc::now() - existing.created_at;
            if age < Duration::seconds(RESEND_COOLDOWN_SECS) {
                return Ok(());
            }
            self.codes.delete(&existing.id).await?;
        }

        let code = generate_numeric_code();
        let now = Utc::now();
        let row = OneTimeCode {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            code: code.clone(),
            attempts: 0,
            created_at: now,
            expires_at: now + purpose.ttl(),
        };
        self.codes.insert(purpose, &row).await?;

        self.delivery.send_code(&user.email, purpose, &code).await
    }

    /// Validate and burn the active code for (user, purpose). Absent, expired,
    /// attempt-exhausted and mismatched codes all fail with `CodeInvalid`;
    /// every failure except absence bumps the attempts counter, including on
    /// codes that are already dead (the outward contract is unaffected).
    pub async fn consume(&self, user_id: &str, purpose: CodePurpose, supplied: &str) -> Result<()> {
        let Some(row) = self.codes.find_by_user(user_id, purpose).await? else {
            return Err(AuthError::CodeInvalid);
        };

        let is_expired = Utc::now() > row.expires_at;
        let is_exhausted = row.attempts >= MAX_ATTEMPTS;
        let is_match = supplied == row.code;

        if is_expired || is_exhausted || !is_match {
            self.codes.increment_attempts(&row.id).await?;
            return Err(AuthError::CodeInvalid);
        }

        // One-time use: the delete must win. A concurrent consumer that finds
        // the row already gone treats the code as spent.
        if self.codes.delete(&row.id).await? == 0 {
            return Err(AuthError::CodeInvalid);
        }
        Ok(())
    }
}
