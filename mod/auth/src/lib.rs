//! Auth module — accounts, access codes, and token sessions.
//!
//! # Resources
//!
//! - **User** — identity record; role fixed at registration by access code
//! - **AccessConfig** — the singleton admin/technician code pair
//! - **Session** — JWT issuance record, revocable
//!
//! The service also implements [`taller_core::UserDirectory`], which the
//! orders module uses to resolve technician display names.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use taller_core::Module;

use crate::service::{AuthConfig, AuthService};

/// Auth module implementing the Module trait.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    /// Create a new AuthModule, initialising its schema.
    pub fn new(
        sql: Arc<dyn taller_sql::SQLStore>,
        config: AuthConfig,
    ) -> Result<Self, taller_core::ServiceError> {
        let service = AuthService::new(sql, config).map_err(taller_core::ServiceError::from)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying AuthService.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
