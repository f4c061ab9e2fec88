//! Second-factor code verification endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::{extract_session_token, login::session_response};
use crate::auth::{ChallengeOutcome, Gate};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyRequest {
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyResponse {
    pub status: String,
}

#[utoipa::path(
    post,
    path = "/login/verify",
    request_body = VerifyRequest,
    responses (
        (status = 200, description = "Code accepted, session is complete", body = super::login::LoginResponse),
        (status = 401, description = "Missing session, wrong code, or expired challenge", body = VerifyResponse)
    ),
    tag = "auth"
)]
pub async fn verify(
    headers: HeaderMap,
    gate: Extension<Arc<Gate>>,
    payload: Option<Json<VerifyRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    // The pending session rides the cookie or bearer header set at login.
    let Some(token) = extract_session_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    match gate.verify_challenge(&token, &request.code) {
        Ok(ChallengeOutcome::Success {
            username,
            session_token,
        }) => session_response("authenticated", Some(username), session_token, None, false),
        Ok(ChallengeOutcome::Mismatch) => (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                status: "code_mismatch".to_string(),
            }),
        )
            .into_response(),
        Ok(ChallengeOutcome::Expired) => (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                status: "code_expired".to_string(),
            }),
        )
            .into_response(),
        Err(error) => {
            error!("Second factor verification failed: {error}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{verify, VerifyRequest, VerifyResponse};
    use crate::api::handlers::login::{login, LoginRequest, LoginResponse};
    use crate::auth::config::GateConfig;
    use crate::auth::session::{PendingSession, SessionStore};
    use crate::auth::test_support::{gate_with_config, TestGate};
    use crate::cli::globals::GlobalArgs;
    use anyhow::Result;
    use axum::body::to_bytes;
    use axum::extract::Extension;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use axum::Json;
    use chrono::Utc;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    async fn pending_token(fixture: &TestGate) -> Result<String> {
        let response = login(
            HeaderMap::new(),
            Extension(fixture.gate.clone()),
            Extension(GlobalArgs::new(None)),
            Some(Json(LoginRequest {
                api_key: None,
                username: "admin".to_string(),
                password: "hunter2".to_string(),
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        assert_eq!(parsed.status, "pending_second_factor");
        parsed
            .session_token
            .ok_or_else(|| anyhow::anyhow!("missing session token"))
    }

    #[tokio::test]
    async fn missing_payload_is_bad_request() -> Result<()> {
        let config = GateConfig::new().with_require_second_factor(true);
        let TestGate { gate, .. } = gate_with_config(config).await?;

        let response = verify(HeaderMap::new(), Extension(gate), None).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn missing_session_token_is_unauthorized() -> Result<()> {
        let config = GateConfig::new().with_require_second_factor(true);
        let TestGate { gate, .. } = gate_with_config(config).await?;

        let response = verify(
            HeaderMap::new(),
            Extension(gate),
            Some(Json(VerifyRequest {
                code: "123456".to_string(),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn correct_code_completes_the_login() -> Result<()> {
        let config = GateConfig::new().with_require_second_factor(true);
        let fixture = gate_with_config(config).await?;
        let token = pending_token(&fixture).await?;
        let code = fixture.sender.last_code().expect("code was issued");

        let response = verify(
            bearer(&token),
            Extension(fixture.gate.clone()),
            Some(Json(VerifyRequest { code })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        assert_eq!(parsed.status, "authenticated");
        assert_eq!(parsed.username.as_deref(), Some("admin"));
        // A fresh token: the pending one is gone with the challenge.
        assert_ne!(parsed.session_token.as_deref(), Some(token.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_code_is_a_mismatch_and_consumes_the_challenge() -> Result<()> {
        let config = GateConfig::new().with_require_second_factor(true);
        let fixture = gate_with_config(config).await?;
        let token = pending_token(&fixture).await?;
        let code = fixture.sender.last_code().expect("code was issued");
        let wrong = if code == "000000" { "000001" } else { "000000" };

        let response = verify(
            bearer(&token),
            Extension(fixture.gate.clone()),
            Some(Json(VerifyRequest {
                code: wrong.to_string(),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let parsed: VerifyResponse = serde_json::from_slice(&body)?;
        assert_eq!(parsed.status, "code_mismatch");

        // The right code arrives too late.
        let retry = verify(
            bearer(&token),
            Extension(fixture.gate.clone()),
            Some(Json(VerifyRequest { code })),
        )
        .await;
        assert_eq!(retry.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn expired_challenge_is_reported_as_expired() -> Result<()> {
        let config = GateConfig::new().with_require_second_factor(true);
        let fixture = gate_with_config(config).await?;
        fixture.sessions.insert(PendingSession {
            token: "stale-token".to_string(),
            username: "admin".to_string(),
            challenge_code: "123456".to_string(),
            challenge_issued_at: Utc::now() - chrono::Duration::seconds(301),
        });

        let response = verify(
            bearer("stale-token"),
            Extension(fixture.gate.clone()),
            Some(Json(VerifyRequest {
                code: "123456".to_string(),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let parsed: VerifyResponse = serde_json::from_slice(&body)?;
        assert_eq!(parsed.status, "code_expired");
        Ok(())
    }
}
