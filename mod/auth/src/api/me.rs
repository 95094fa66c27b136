use axum::extract::{Extension, State};
use axum::routing::get;
use axum::{Json, Router};

use taller_core::{Caller, ServiceError};

use crate::api::AppState;
use crate::model::User;

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// GET /auth/me — the caller's stored profile.
async fn me(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<User>, ServiceError> {
    let user = svc.get_user(&caller.user_id)?;
    Ok(Json(user))
}
