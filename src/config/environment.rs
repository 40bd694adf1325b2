use std::env;

/// Environment configuration. Missing secrets are a startup failure, never a
/// runtime one.
pub struct Config {
    pub database_url: String,
    /// HMAC secret for signing access tokens.
    pub jwt_secret: String,
    /// Process-wide pepper mixed into refresh token hashes. Distinct from the
    /// per-user password salts.
    pub token_pepper: String,
    pub resend_api_key: String,
    pub mail_from: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let token_pepper = env::var("TOKEN_PEPPER")
            .map_err(|_| "TOKEN_PEPPER must be set".to_string())?;

        let resend_api_key = env::var("RESEND_API_KEY")
            .map_err(|_| "RESEND_API_KEY must be set".to_string())?;

        let mail_from = env::var("MAIL_FROM")
            .unwrap_or_else(|_| "Timebook <no-reply@mail.timebook.app>".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            token_pepper,
            resend_api_key,
            mail_from,
            bind_addr,
        })
    }
}
