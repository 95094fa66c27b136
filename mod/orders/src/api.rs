use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use taller_core::{Caller, ServiceError};

use crate::engine::OrderEngine;
use crate::model::{CreateOrderRequest, EditOrderRequest, OrderListQuery, OrderStatus, RepairOrder};

type EngineState = Arc<OrderEngine>;

/// Build the orders API router.
///
/// All routes are relative — the binary nests them under `/orders`.
/// Routes:
/// - `POST /`             — create order (admin)
/// - `GET  /?status=`     — list orders, role-scoped
/// - `GET  /{id}`         — get order
/// - `PATCH /{id}`        — edit descriptive fields (admin)
/// - `POST /{id}/@claim`  — claim for the caller
/// - `POST /{id}/@finish` — finish (assigned technician or admin)
/// - `POST /{id}/@return` — back to the pending pool (admin)
/// - `POST /{id}/@photo`  — attach a JPEG (admin, raw body)
/// - `GET  /{id}/@photo`  — fetch the stored JPEG
pub fn router(engine: Arc<OrderEngine>) -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/{id}", get(get_order).patch(edit_order))
        .route("/{id}/@claim", post(claim_order))
        .route("/{id}/@finish", post(finish_order))
        .route("/{id}/@return", post(return_order))
        .route("/{id}/@photo", post(attach_photo).get(get_photo))
        .with_state(engine)
}

/// Admins only; everyone else gets a 403.
fn require_admin(caller: &Caller) -> Result<(), ServiceError> {
    if caller.role.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied(
            "admin role required".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// POST /orders
// ---------------------------------------------------------------------------

async fn create_order(
    State(engine): State<EngineState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<RepairOrder>, ServiceError> {
    require_admin(&caller)?;
    let order = engine.create(req, &caller.user_id, Some(caller.name.clone()))?;
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// GET /orders?status=
// ---------------------------------------------------------------------------

async fn list_orders(
    State(engine): State<EngineState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let status = OrderStatus::from_str(&query.status).ok_or_else(|| {
        ServiceError::Validation(format!("unknown status {:?}", query.status))
    })?;
    let items = engine.list(caller.role, &caller.user_id, status)?;
    let total = items.len();
    Ok(Json(serde_json::json!({
        "items": items,
        "total": total,
    })))
}

// ---------------------------------------------------------------------------
// GET /orders/:id
// ---------------------------------------------------------------------------

async fn get_order(
    State(engine): State<EngineState>,
    Path(id): Path<String>,
) -> Result<Json<RepairOrder>, ServiceError> {
    let order = engine.get(&id)?;
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// PATCH /orders/:id
// ---------------------------------------------------------------------------

async fn edit_order(
    State(engine): State<EngineState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(req): Json<EditOrderRequest>,
) -> Result<Json<RepairOrder>, ServiceError> {
    require_admin(&caller)?;
    let order = engine.edit(&id, req)?;
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// POST /orders/:id/@claim
// ---------------------------------------------------------------------------

/// A caller always claims for themselves; the body is empty.
async fn claim_order(
    State(engine): State<EngineState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<RepairOrder>, ServiceError> {
    let order = engine.claim(&id, &caller.user_id)?;
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// POST /orders/:id/@finish
// ---------------------------------------------------------------------------

/// Only the assigned technician (or an admin) may finish an order.
async fn finish_order(
    State(engine): State<EngineState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<RepairOrder>, ServiceError> {
    if !caller.role.is_admin() {
        let order = engine.get(&id)?;
        if order.assigned_technician_id.as_deref() != Some(caller.user_id.as_str()) {
            return Err(ServiceError::PermissionDenied(
                "order is assigned to another technician".into(),
            ));
        }
    }
    let order = engine.finish(&id)?;
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// POST /orders/:id/@return
// ---------------------------------------------------------------------------

async fn return_order(
    State(engine): State<EngineState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<RepairOrder>, ServiceError> {
    require_admin(&caller)?;
    let order = engine.return_to_pending(&id)?;
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// POST /orders/:id/@photo  |  GET /orders/:id/@photo
// ---------------------------------------------------------------------------

async fn attach_photo(
    State(engine): State<EngineState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<RepairOrder>, ServiceError> {
    require_admin(&caller)?;
    let order = engine.attach_photo(&id, &body)?;
    Ok(Json(order))
}

async fn get_photo(
    State(engine): State<EngineState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let bytes = engine.photo_bytes(&id)?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
