use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::config::DbPool;

use super::interface::{
    AuthError, OneTimeCodeRepository, RefreshTokenRepository, Result, UserDirectory,
};
use super::model::{CodePurpose, OneTimeCode, RefreshToken, User};

// =============================================================================
// USERS
// =============================================================================

pub struct MySqlUserDirectory {
    pool: DbPool,
}

impl MySqlUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, is_verified, created_at, updated_at \
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, is_verified, created_at, updated_at \
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: Option<&str>) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: password_hash.map(str::to_string),
            is_verified: false,
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, is_verified, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            // The unique key on email backs the duplicate-registration check
            // under concurrent registers.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AuthError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_verified(&self, user_id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound("User".to_string()));
        }
        Ok(())
    }

    async fn set_password(&self, user_id: &str, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound("User".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// ONE-TIME CODES
// =============================================================================

pub struct MySqlOneTimeCodes {
    pool: DbPool,
}

impl MySqlOneTimeCodes {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OneTimeCodeRepository for MySqlOneTimeCodes {
    async fn find_by_user(&self, user_id: &str, purpose: CodePurpose) -> Result<Option<OneTimeCode>> {
        let code = sqlx::query_as::<_, OneTimeCode>(
            "SELECT id, user_id, code, attempts, created_at, expires_at \
             FROM one_time_codes WHERE user_id = ? AND purpose = ?",
        )
        .bind(user_id)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(code)
    }

    async fn insert(&self, purpose: CodePurpose, code: &OneTimeCode) -> Result<()> {
        sqlx::query(
            "INSERT INTO one_time_codes (id, user_id, purpose, code, attempts, created_at, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&code.id)
        .bind(&code.user_id)
        .bind(purpose.as_str())
        .bind(&code.code)
        .bind(code.attempts)
        .bind(code.created_at)
        .bind(code.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_attempts(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE one_time_codes SET attempts = attempts + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM one_time_codes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// REFRESH TOKENS
// =============================================================================

pub struct MySqlRefreshTokens {
    pool: DbPool,
}

impl MySqlRefreshTokens {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for MySqlRefreshTokens {
    async fn insert(&self, token: &RefreshToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens \
             (id, user_id, token_hash, created_at, expires_at, ip_address, user_agent) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&token.id)
        .bind(&token.user_id)
        .bind(&token.token_hash)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(&token.ip_address)
        .bind(&token.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        let Some(row) = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token_hash, created_at, expires_at, ip_address, user_agent \
             FROM refresh_tokens WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        // The delete by primary key decides the race: of two callers that both
        // read the row, only the one whose delete touches a row keeps it.
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = ?")
            .bind(&row.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(row))
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
