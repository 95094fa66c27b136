mod me;
mod session;

use std::sync::Arc;

use axum::Router;

use crate::service::AuthService;

/// Shared application state.
pub type AppState = Arc<AuthService>;

/// Build the auth API router.
///
/// All routes are relative — the binary nests them under `/auth`.
/// Routes:
/// - `POST /register` — create an account (public)
/// - `POST /login`    — exchange credentials for a token (public)
/// - `POST /logout`   — revoke the caller's session
/// - `GET  /me`       — current user profile
pub fn build_router(svc: Arc<AuthService>) -> Router {
    Router::new()
        .merge(session::routes())
        .merge(me::routes())
        .with_state(svc)
}
