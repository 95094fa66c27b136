//! JWT authentication middleware.
//!
//! Extracts the token from `Authorization: Bearer <token>`, verifies it
//! through the auth service (signature, expiry, session revocation), and
//! stores the resulting [`Caller`] in request extensions for handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use auth::service::AuthService;

/// Middleware that authenticates every non-public request.
pub async fn auth_middleware(
    State(svc): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if is_public_path(&path) {
        return next.run(request).await;
    }

    let token = match extract_bearer(request.headers()) {
        Some(t) => t.to_string(),
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({
                    "code": "UNAUTHENTICATED",
                    "message": "missing authorization header",
                })),
            )
                .into_response();
        }
    };

    match svc.verify_token(&token) {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({
                "code": "UNAUTHENTICATED",
                "message": e.to_string(),
            })),
        )
            .into_response(),
    }
}

/// Extract the Bearer token from the Authorization header.
fn extract_bearer(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Check if a request path is public (no auth required).
fn is_public_path(path: &str) -> bool {
    matches!(
        path,
        "/health" | "/version" | "/auth/login" | "/auth/register"
    )
}
