//! Orders module — the repair-order lifecycle engine and its role-scoped
//! visibility queries.
//!
//! An order moves PENDING → WORKING → FINISHED, and an admin can send it
//! back to PENDING. Claiming is the contended operation: the store's
//! compare-and-swap guarantees at most one technician wins a pending
//! order. See [`engine::OrderEngine`].

pub mod api;
pub mod engine;
pub mod model;
pub mod store;

use std::sync::Arc;

use axum::Router;

use taller_blob::BlobStore;
use taller_core::{Module, UserDirectory};
use taller_sql::SQLStore;

use engine::OrderEngine;
use store::OrderStore;

/// Orders module implementing the Module trait.
pub struct OrdersModule {
    engine: Arc<OrderEngine>,
}

impl OrdersModule {
    /// Create the orders module and initialise its schema.
    ///
    /// The user directory is the auth module's service, injected by the
    /// binary so this crate never depends on auth directly.
    pub fn new(
        db: Arc<dyn SQLStore>,
        directory: Arc<dyn UserDirectory>,
        blobs: Arc<dyn BlobStore>,
    ) -> Result<Self, taller_core::ServiceError> {
        let store = Arc::new(OrderStore::new(db)?);
        let engine = Arc::new(OrderEngine::new(store, directory, blobs));
        Ok(Self { engine })
    }

    /// Get a reference to the OrderEngine.
    pub fn engine(&self) -> &Arc<OrderEngine> {
        &self.engine
    }
}

impl Module for OrdersModule {
    fn name(&self) -> &str {
        "orders"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.engine))
    }
}
