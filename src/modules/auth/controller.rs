use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::AppState;
use crate::modules::auth::{
    interface::AuthError,
    model::SessionInfo,
    schema::{
        ErrorResponse, ForgotPasswordRequest, LoginRequest, LogoutRequest, MessageResponse,
        RefreshRequest, RegisterRequest, ResendCodeRequest, ResetPasswordRequest,
        TokenPairResponse, VerifyEmailRequest,
    },
    service::TokenPair,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

const CODE_SENT_MSG: &str = "If the user exists, a code has been sent";

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

fn to_api_error(err: AuthError) -> ApiError {
    let status = err.status_code();
    match err {
        // Infrastructure details stay in the logs, never in the response body.
        AuthError::Database(_) | AuthError::Internal(_) => {
            tracing::error!(error = %err, "auth request failed");
            (status, Json(ErrorResponse::new("Internal server error")))
        }
        _ => (status, Json(ErrorResponse::new(err.to_string()))),
    }
}

/// Client metadata recorded against the refresh token row. The IP comes from
/// the proxy-set forwarded header (first hop), matching the deployment behind
/// a reverse proxy.
fn session_info(headers: &HeaderMap) -> SessionInfo {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    SessionInfo { ip_address, user_agent }
}

fn token_pair_response(pair: TokenPair) -> Json<TokenPairResponse> {
    Json(TokenPairResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer",
        expires_in: pair.expires_in,
    })
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }
    if req.password != req.password_confirm {
        return Err(bad_request("Passwords do not match"));
    }

    state
        .auth
        .register(&req.email, &req.password)
        .await
        .map_err(to_api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Check your email for verification code",
        }),
    ))
}

pub async fn resend_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResendCodeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }

    state
        .auth
        .resend_verification_code(&req.email)
        .await
        .map_err(to_api_error)?;

    Ok(Json(MessageResponse { message: CODE_SENT_MSG }))
}

pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }

    let pair = state
        .auth
        .verify_email(&req.email, &req.code, &session_info(&headers))
        .await
        .map_err(to_api_error)?;

    Ok(token_pair_response(pair))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let pair = state
        .auth
        .login(&req.email, &req.password, &session_info(&headers))
        .await
        .map_err(to_api_error)?;

    Ok(token_pair_response(pair))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let pair = state
        .auth
        .refresh(&req.refresh_token, &session_info(&headers))
        .await
        .map_err(to_api_error)?;

    Ok(token_pair_response(pair))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogoutRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .auth
        .logout(&req.refresh_token)
        .await
        .map_err(to_api_error)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user_id = bearer_user_id(&state, &headers)?;

    state
        .auth
        .logout_all(&user_id)
        .await
        .map_err(to_api_error)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }

    state
        .auth
        .forgot_password(&req.email)
        .await
        .map_err(to_api_error)?;

    Ok(Json(MessageResponse { message: CODE_SENT_MSG }))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }
    if req.password != req.password_confirm {
        return Err(bad_request("Passwords do not match"));
    }

    let pair = state
        .auth
        .reset_password(&req.email, &req.code, &req.password, &session_info(&headers))
        .await
        .map_err(to_api_error)?;

    Ok(token_pair_response(pair))
}

/// Authenticated user id from the bearer access token.
fn bearer_user_id(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid or missing access token")),
        )
    };

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    let data = state
        .jwt_service
        .verify_access_token(token)
        .map_err(|_| unauthorized())?;

    Ok(data.claims.sub)
}
