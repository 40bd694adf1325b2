use async_trait::async_trait;

use crate::modules::auth::interface::{AuthError, CodeDelivery, Result};
use crate::modules::auth::model::CodePurpose;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Code delivery over the Resend HTTP API. The plaintext code goes into the
/// message body only; it is never logged here.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl CodeDelivery for ResendMailer {
    async fn send_code(&self, email: &str, purpose: CodePurpose, code: &str) -> Result<()> {
        let (subject, body) = match purpose {
            CodePurpose::EmailVerification => (
                "Your verification code",
                format!("Your email verification code is {code}. It expires in 30 minutes."),
            ),
            CodePurpose::PasswordReset => (
                "Your password reset code",
                format!("Your password reset code is {code}. It expires in 10 minutes."),
            ),
        };

        let payload = serde_json::json!({
            "from": self.from,
            "to": [email],
            "subject": subject,
            "text": body,
        });

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "mail provider unreachable");
                AuthError::DeliveryFailed
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "mail provider rejected send");
            return Err(AuthError::DeliveryFailed);
        }
        Ok(())
    }
}
