//! Login submission endpoint.

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::error;
use utoipa::ToSchema;

use super::{extract_client_ip, session_cookie};
use crate::auth::{Gate, GateOutcome};
use crate::cli::globals::GlobalArgs;

// Attempts without a resolvable client address still have to be attributable.
const UNKNOWN_SOURCE: &str = "unknown";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub status: String,
    pub username: Option<String>,
    pub session_token: Option<String>,
    pub rate_limit_warning: bool,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Authenticated, or pending second factor", body = LoginResponse),
        (status = 401, description = "Invalid credentials or unauthorized caller"),
        (status = 429, description = "Source must wait out the throttle window", body = LoginResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    gate: Extension<Arc<Gate>>,
    globals: Extension<GlobalArgs>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    // Boundary check only. A refused caller leaves no trace in the ledger.
    if gate.config().enforce_api_key() && !api_key_matches(&globals, request.api_key.as_deref()) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let source = extract_client_ip(&headers).unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    match gate
        .submit(&source, &request.username, &request.password)
        .await
    {
        Ok(GateOutcome::Authenticated {
            username,
            session_token,
            rate_limit_warning,
        }) => session_response(
            "authenticated",
            Some(username),
            session_token,
            None,
            rate_limit_warning,
        ),
        Ok(GateOutcome::PendingSecondFactor {
            session_token,
            rate_limit_warning,
        }) => session_response(
            "pending_second_factor",
            None,
            session_token,
            Some(gate.config().challenge_ttl()),
            rate_limit_warning,
        ),
        Ok(GateOutcome::InvalidCredentials { rate_limit_warning }) => (
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                status: "invalid_credentials".to_string(),
                username: None,
                session_token: None,
                rate_limit_warning,
            }),
        )
            .into_response(),
        Ok(GateOutcome::RateLimited { .. }) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(LoginResponse {
                status: "rate_limited".to_string(),
                username: None,
                session_token: None,
                rate_limit_warning: true,
            }),
        )
            .into_response(),
        Err(error) => {
            error!("Login submission failed: {error}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response()
        }
    }
}

fn api_key_matches(globals: &GlobalArgs, submitted: Option<&str>) -> bool {
    let submitted = submitted.unwrap_or("");
    bool::from(
        submitted
            .as_bytes()
            .ct_eq(globals.api_key.expose_secret().as_bytes()),
    )
}

// Shared by the login and second factor endpoints: session token in the
// body, the cookie, and an Authorization echo for non-browser callers.
pub(super) fn session_response(
    status: &str,
    username: Option<String>,
    session_token: String,
    cookie_max_age: Option<std::time::Duration>,
    rate_limit_warning: bool,
) -> Response {
    let mut response_headers = HeaderMap::new();
    match session_cookie(&session_token, cookie_max_age) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to set session cookie: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
        }
    }
    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {session_token}")) {
        response_headers.insert(AUTHORIZATION, value);
    }

    (
        StatusCode::OK,
        response_headers,
        Json(LoginResponse {
            status: status.to_string(),
            username,
            session_token: Some(session_token),
            rate_limit_warning,
        }),
    )
        .into_response()
}
