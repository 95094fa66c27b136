//! Route registration — module routes plus system endpoints.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;

use auth::service::AuthService;

use crate::auth_middleware;

/// Build the complete router with all routes.
///
/// Module routers are already `Router<()>` (each called `.with_state()`
/// internally); they are nested under `/{module_name}`. The JWT
/// middleware wraps everything; public paths pass through inside it.
pub fn build_router(svc: Arc<AuthService>, module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        app = app.nest(&format!("/{}", name), router);
    }

    app.layer(middleware::from_fn_with_state(
        svc,
        auth_middleware::auth_middleware,
    ))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "tallerd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use taller_core::{Module, UserDirectory};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let dir = tempfile::tempdir().unwrap();
        let sql: Arc<dyn taller_sql::SQLStore> =
            Arc::new(taller_sql::SqliteStore::open_in_memory().unwrap());
        let blobs: Arc<dyn taller_blob::BlobStore> =
            Arc::new(taller_blob::FileStore::open(dir.path()).unwrap());
        let _dir = Box::leak(Box::new(dir));

        let auth_module = auth::AuthModule::new(
            Arc::clone(&sql),
            auth::service::AuthConfig {
                jwt_secret: "test-secret".into(),
                token_ttl: 3600,
            },
        )
        .unwrap();
        auth_module
            .service()
            .seed_access_codes("admin-2024", "tech-2024")
            .unwrap();

        let directory: Arc<dyn UserDirectory> = auth_module.service().clone();
        let orders_module = orders::OrdersModule::new(sql, directory, blobs).unwrap();

        let module_routes = vec![
            (auth_module.name(), auth_module.routes()),
            (orders_module.name(), orders_module.routes()),
        ];
        build_router(Arc::clone(auth_module.service()), module_routes)
    }

    async fn request(
        app: &Router,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Register an account and return its token.
    async fn register(app: &Router, email: &str, name: &str, code: &str) -> String {
        let (status, body) = request(
            app,
            "POST",
            "/auth/register",
            None,
            Some(serde_json::json!({
                "dni": "12345678Z",
                "firstName": name,
                "lastName": "Vega",
                "email": email,
                "password": "secreta1",
                "accessCode": code,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        body["accessToken"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_and_version_are_public() {
        let app = test_app();
        let (status, body) = request(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = request(&app, "GET", "/version", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "tallerd");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = test_app();
        let (status, body) =
            request(&app, "GET", "/orders?status=PENDING", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");

        let (status, _) =
            request(&app, "GET", "/auth/me", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_rejects_a_wrong_access_code() {
        let app = test_app();
        let (status, body) = request(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(serde_json::json!({
                "dni": "1", "firstName": "X", "lastName": "Y",
                "email": "x@y.com", "password": "secreta1",
                "accessCode": "wrong",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn full_order_workflow() {
        let app = test_app();
        let admin = register(&app, "marta@taller.es", "Marta", "admin-2024").await;
        let tech = register(&app, "luis@taller.es", "Luis", "tech-2024").await;
        let rival = register(&app, "carmen@taller.es", "Carmen", "tech-2024").await;

        // Admin opens an order.
        let (status, order) = request(
            &app,
            "POST",
            "/orders",
            Some(&admin),
            Some(serde_json::json!({
                "deviceModel": "Redmi Note 7",
                "issueDescription": "no enciende",
                "shelfLocation": "A-8",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", order);
        assert_eq!(order["status"], "PENDING");
        let id = order["id"].as_str().unwrap().to_string();

        // The technician sees it in the pool and claims it.
        let (status, pool) =
            request(&app, "GET", "/orders?status=PENDING", Some(&tech), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pool["total"], 1);

        let (status, claimed) = request(
            &app,
            "POST",
            &format!("/orders/{}/@claim", id),
            Some(&tech),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(claimed["status"], "WORKING");
        assert_eq!(claimed["assignedTechnicianName"], "Luis Vega");

        // The rival's claim loses.
        let (status, body) = request(
            &app,
            "POST",
            &format!("/orders/{}/@claim", id),
            Some(&rival),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ALREADY_CLAIMED");

        // The rival cannot finish someone else's order.
        let (status, _) = request(
            &app,
            "POST",
            &format!("/orders/{}/@finish", id),
            Some(&rival),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // The assignee finishes it; the admin returns it to the pool.
        let (status, finished) = request(
            &app,
            "POST",
            &format!("/orders/{}/@finish", id),
            Some(&tech),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(finished["status"], "FINISHED");

        let (status, reopened) = request(
            &app,
            "POST",
            &format!("/orders/{}/@return", id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reopened["status"], "PENDING");
        assert!(reopened.get("assignedTechnicianId").is_none());
        assert!(reopened.get("dateFinished").is_none());
    }

    #[tokio::test]
    async fn technicians_cannot_create_or_return_orders() {
        let app = test_app();
        let tech = register(&app, "luis@taller.es", "Luis", "tech-2024").await;

        let (status, body) = request(
            &app,
            "POST",
            "/orders",
            Some(&tech),
            Some(serde_json::json!({
                "deviceModel": "m", "issueDescription": "d",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");

        let (status, _) = request(
            &app,
            "POST",
            "/orders/any/@return",
            Some(&tech),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let app = test_app();
        let tech = register(&app, "luis@taller.es", "Luis", "tech-2024").await;

        let (status, me) = request(&app, "GET", "/auth/me", Some(&tech), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "luis@taller.es");

        let (status, _) = request(&app, "POST", "/auth/logout", Some(&tech), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = request(&app, "GET", "/auth/me", Some(&tech), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
