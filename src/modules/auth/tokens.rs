use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::services::hashing::{generate_opaque_token, hash_token};

use super::interface::{AuthError, RefreshTokenRepository, Result};
use super::model::{RefreshToken, SessionInfo};

pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Store for long-lived rotating refresh tokens. Raw tokens exist only in
/// transit to the client; rows hold the peppered hash plus session metadata.
pub struct RefreshTokenStore {
    tokens: Arc<dyn RefreshTokenRepository>,
    pepper: String,
}

impl RefreshTokenStore {
    pub fn new(tokens: Arc<dyn RefreshTokenRepository>, pepper: String) -> Self {
        Self { tokens, pepper }
    }

    /// Mint a raw token for the user and persist its hash.
    pub async fn issue(&self, user_id: &str, session: &SessionInfo) -> Result<String> {
        let raw = generate_opaque_token();
        let now = Utc::now();
        let row = RefreshToken {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token_hash: hash_token(&raw, &self.pepper),
            created_at: now,
            expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
            ip_address: session.ip_address.clone(),
            user_agent: session.user_agent.clone(),
        };
        self.tokens.insert(&row).await?;
        Ok(raw)
    }

    /// Single-use rotation: the old row is deleted before anything else, so a
    /// replayed token can never succeed twice and two racing calls produce at
    /// most one winner. Expiry is checked after the delete; an expired token
    /// is already gone and needs no further action.
    pub async fn rotate(&self, raw: &str, session: &SessionInfo) -> Result<(String, String)> {
        let hash = hash_token(raw, &self.pepper);
        let Some(row) = self.tokens.delete_by_hash(&hash).await? else {
            return Err(AuthError::Unauthorized);
        };
        if Utc::now() > row.expires_at {
            return Err(AuthError::Unauthorized);
        }
        let fresh = self.issue(&row.user_id, session).await?;
        Ok((fresh, row.user_id))
    }

    /// Delete by hash; tolerant of a token that is already gone.
    pub async fn revoke(&self, raw: &str) -> Result<()> {
        let hash = hash_token(raw, &self.pepper);
        self.tokens.delete_by_hash(&hash).await?;
        Ok(())
    }

    /// Drop every session for the user (logout-all, forced after a password
    /// reset).
    pub async fn revoke_all(&self, user_id: &str) -> Result<()> {
        self.tokens.delete_all_for_user(user_id).await?;
        Ok(())
    }
}
