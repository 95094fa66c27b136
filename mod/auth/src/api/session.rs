use axum::extract::{Extension, State};
use axum::routing::post;
use axum::{Json, Router};

use taller_core::{Caller, ServiceError};

use crate::api::AppState;
use crate::model::{LoginRequest, RegisterRequest, SessionResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// POST /auth/register — create an account and sign it in.
async fn register(
    State(svc): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let user = svc.register(req)?;
    let grant = svc.issue_token(&user)?;
    Ok(Json(SessionResponse { user, grant }))
}

/// POST /auth/login — exchange email+password for a token.
async fn login(
    State(svc): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let user = svc.authenticate(&req.email, &req.password)?;
    let grant = svc.issue_token(&user)?;
    Ok(Json(SessionResponse { user, grant }))
}

/// POST /auth/logout — revoke the caller's session.
async fn logout(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.revoke_session(&caller.session_id)?;
    Ok(Json(serde_json::json!({"revoked": true})))
}
