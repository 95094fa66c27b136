use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use taller_blob::BlobStore;
use taller_core::{Role, ServiceError, UserDirectory, new_id, now_millis};

use crate::model::{CreateOrderRequest, EditOrderRequest, OrderPhoto, OrderStatus, RepairOrder};
use crate::store::OrderStore;

/// Placeholder shown when the claimer cannot be resolved to a profile.
const UNKNOWN_TECHNICIAN: &str = "Unknown";

// ---------------------------------------------------------------------------
// OrderEngine — lifecycle state machine + visibility queries
// ---------------------------------------------------------------------------

/// The core order engine.
///
/// Stateless between calls: every operation reads the persisted order,
/// applies one transition and returns a fresh snapshot. Lifecycle moves
/// (claim / finish / return) go through the store's compare-and-swap so
/// concurrent callers cannot double-apply them; descriptive edits are
/// last-write-wins.
pub struct OrderEngine {
    store: Arc<OrderStore>,
    directory: Arc<dyn UserDirectory>,
    blobs: Arc<dyn BlobStore>,
}

impl OrderEngine {
    pub fn new(
        store: Arc<OrderStore>,
        directory: Arc<dyn UserDirectory>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            store,
            directory,
            blobs,
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<OrderStore> {
        &self.store
    }

    // =======================================================================
    // Lifecycle
    // =======================================================================

    /// Open a new repair order. It starts PENDING and unassigned.
    pub fn create(
        &self,
        req: CreateOrderRequest,
        created_by: &str,
        created_by_name: Option<String>,
    ) -> Result<RepairOrder, ServiceError> {
        let device_model = req.device_model.trim().to_string();
        if device_model.is_empty() {
            return Err(ServiceError::Validation("device model is required".into()));
        }
        let issue_description = req.issue_description.trim().to_string();
        if issue_description.is_empty() {
            return Err(ServiceError::Validation(
                "issue description is required".into(),
            ));
        }

        let order = RepairOrder {
            id: new_id(),
            device_model,
            issue_description,
            shelf_location: normalize(req.shelf_location),
            status: OrderStatus::Pending,
            assigned_technician_id: None,
            assigned_technician_name: None,
            created_by: created_by.to_string(),
            created_by_name,
            photo: match normalize(req.photo_base64) {
                Some(b64) => OrderPhoto::Inline(b64),
                None => OrderPhoto::None,
            },
            date_created: now_millis(),
            date_started: None,
            date_finished: None,
        };

        self.store.create(&order)?;
        info!(order_id = %order.id, device = %order.device_model, "order created");
        Ok(order)
    }

    /// Claim a pending order for a technician: PENDING → WORKING (CAS).
    ///
    /// The display name is resolved before the swap; an unresolvable
    /// claimer gets the `"Unknown"` placeholder instead of failing the
    /// claim. Losing the race returns a Conflict and writes nothing.
    pub fn claim(&self, order_id: &str, technician_id: &str) -> Result<RepairOrder, ServiceError> {
        let technician_name = match self.directory.full_name(technician_id) {
            Ok(Some(name)) => name,
            Ok(None) => {
                warn!(technician_id, "claimer has no user profile");
                UNKNOWN_TECHNICIAN.to_string()
            }
            Err(e) => {
                warn!(technician_id, error = %e, "user lookup failed during claim");
                UNKNOWN_TECHNICIAN.to_string()
            }
        };

        let mut order = self.store.get(order_id)?;
        order.status = OrderStatus::Working;
        order.assigned_technician_id = Some(technician_id.to_string());
        order.assigned_technician_name = Some(technician_name);
        order.date_started = Some(now_millis());

        if !self.store.transition(&order, &[OrderStatus::Pending])? {
            return Err(ServiceError::Conflict(format!(
                "order {order_id} already claimed"
            )));
        }
        info!(order_id, technician_id, "order claimed");
        self.store.get(order_id)
    }

    /// Finish a claimed order: WORKING → FINISHED (CAS).
    ///
    /// The assignment stays on the order so finished lists still show who
    /// did the work.
    pub fn finish(&self, order_id: &str) -> Result<RepairOrder, ServiceError> {
        let mut order = self.store.get(order_id)?;
        order.status = OrderStatus::Finished;
        order.date_finished = Some(now_millis());

        if !self.store.transition(&order, &[OrderStatus::Working])? {
            return Err(ServiceError::Conflict(format!(
                "order {order_id} is not in progress"
            )));
        }
        info!(order_id, "order finished");
        self.store.get(order_id)
    }

    /// Put an order back into the claimable pool: WORKING/FINISHED → PENDING.
    ///
    /// Clears the assignment and both work timestamps; a later claim must
    /// produce a WORKING order indistinguishable from a first claim.
    pub fn return_to_pending(&self, order_id: &str) -> Result<RepairOrder, ServiceError> {
        let mut order = self.store.get(order_id)?;
        order.status = OrderStatus::Pending;
        order.assigned_technician_id = None;
        order.assigned_technician_name = None;
        order.date_started = None;
        order.date_finished = None;

        if !self
            .store
            .transition(&order, &[OrderStatus::Working, OrderStatus::Finished])?
        {
            return Err(ServiceError::Conflict(format!(
                "order {order_id} is already pending"
            )));
        }
        info!(order_id, "order returned to pending");
        self.store.get(order_id)
    }

    /// Replace the descriptive fields (device, issue, shelf).
    ///
    /// Does not touch status, assignment or timestamps. Last write wins.
    pub fn edit(&self, order_id: &str, req: EditOrderRequest) -> Result<RepairOrder, ServiceError> {
        let device_model = req.device_model.trim().to_string();
        if device_model.is_empty() {
            return Err(ServiceError::Validation("device model is required".into()));
        }
        let issue_description = req.issue_description.trim().to_string();
        if issue_description.is_empty() {
            return Err(ServiceError::Validation(
                "issue description is required".into(),
            ));
        }

        let mut order = self.store.get(order_id)?;
        order.device_model = device_model;
        order.issue_description = issue_description;
        order.shelf_location = normalize(req.shelf_location);

        self.store.update(&order)?;
        info!(order_id, "order edited");
        Ok(order)
    }

    // =======================================================================
    // Reads
    // =======================================================================

    /// Get a single order by ID.
    pub fn get(&self, order_id: &str) -> Result<RepairOrder, ServiceError> {
        self.store.get(order_id)
    }

    /// List orders in a status, scoped by the caller's role.
    ///
    /// - Admins see every order in the status.
    /// - Technicians see the full PENDING pool (anything is claimable),
    ///   but only their own WORKING and FINISHED orders.
    ///
    /// Results are newest-first. Non-pending results get technician names
    /// refreshed from the user directory.
    pub fn list(
        &self,
        role: Role,
        caller_id: &str,
        status: OrderStatus,
    ) -> Result<Vec<RepairOrder>, ServiceError> {
        let mut orders = match (role, status) {
            (Role::Admin, status) => self.store.list_by_status(status)?,
            (Role::Technician, OrderStatus::Pending) => {
                self.store.list_by_status(OrderStatus::Pending)?
            }
            (Role::Technician, status) => self.store.list_by_technician(caller_id, status)?,
        };

        if status != OrderStatus::Pending {
            self.attach_technician_names(&mut orders);
        }
        Ok(orders)
    }

    /// Refresh `assigned_technician_name` from the directory.
    ///
    /// One lookup per distinct technician. A failed or empty lookup leaves
    /// the stored name alone — display degrades, the query never fails.
    fn attach_technician_names(&self, orders: &mut [RepairOrder]) {
        let mut resolved: HashMap<String, Option<String>> = HashMap::new();

        for order in orders.iter_mut() {
            let Some(technician_id) = order.assigned_technician_id.clone() else {
                continue;
            };
            let name = resolved
                .entry(technician_id.clone())
                .or_insert_with(|| match self.directory.full_name(&technician_id) {
                    Ok(name) => name,
                    Err(e) => {
                        warn!(technician_id = %technician_id, error = %e, "name enrichment failed");
                        None
                    }
                });
            if let Some(name) = name {
                order.assigned_technician_name = Some(name.clone());
            }
        }
    }

    // =======================================================================
    // Photos
    // =======================================================================

    /// Store a JPEG for the order and point the order at it.
    ///
    /// Earlier stored photos for the same order are removed first; the
    /// order then carries a single `Reference`. Replaces an inline photo
    /// as well.
    pub fn attach_photo(&self, order_id: &str, bytes: &[u8]) -> Result<RepairOrder, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::Validation("photo payload is empty".into()));
        }
        let mut order = self.store.get(order_id)?;

        let prefix = format!("orders/{order_id}/");
        match self.blobs.list(&prefix) {
            Ok(existing) => {
                for meta in existing {
                    if let Err(e) = self.blobs.delete(&meta.key) {
                        warn!(key = %meta.key, error = %e, "could not remove replaced photo");
                    }
                }
            }
            Err(e) => warn!(order_id, error = %e, "could not list replaced photos"),
        }

        let key = format!("orders/{order_id}/{}.jpg", new_id());
        self.blobs
            .put(&key, bytes)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        order.photo = OrderPhoto::Reference(key);
        self.store.update(&order)?;
        info!(order_id, "photo attached");
        Ok(order)
    }

    /// Fetch the stored photo bytes for an order.
    ///
    /// Only `Reference` photos live in the blob store; inline photos travel
    /// inside the order document and are never fetched separately.
    pub fn photo_bytes(&self, order_id: &str) -> Result<Vec<u8>, ServiceError> {
        let order = self.store.get(order_id)?;
        let Some(key) = order.photo.reference() else {
            return Err(ServiceError::NotFound(format!(
                "order {order_id} has no stored photo"
            )));
        };
        let bytes = self
            .blobs
            .get(key)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        bytes.ok_or_else(|| ServiceError::NotFound(format!("photo for order {order_id} not found")))
    }
}

/// Trim and drop empty optional inputs.
fn normalize(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
