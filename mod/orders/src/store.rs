use std::sync::Arc;

use taller_core::ServiceError;
use taller_sql::{Row, SQLStore, Value};

use crate::model::{OrderStatus, RepairOrder};

/// SQL schema for the work_orders table.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS work_orders (
    id            TEXT PRIMARY KEY,
    data          TEXT NOT NULL,
    status        TEXT NOT NULL,
    technician_id TEXT,
    created_by    TEXT NOT NULL,
    date_created  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_order_status ON work_orders(status);
CREATE INDEX IF NOT EXISTS idx_order_technician ON work_orders(technician_id);
CREATE INDEX IF NOT EXISTS idx_order_date_created ON work_orders(date_created);
";

/// Persistent storage for repair orders, backed by SQLStore (SQLite).
///
/// The full order document lives in the `data` JSON column; `status`,
/// `technician_id` and `date_created` are mirrored into indexed columns
/// so the visibility queries never parse JSON.
pub struct OrderStore {
    db: Arc<dyn SQLStore>,
}

impl OrderStore {
    /// Create a new OrderStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        db.exec_batch(SCHEMA)
            .map_err(|e| ServiceError::Storage(format!("order schema init: {e}")))?;
        Ok(Self { db })
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Insert a new order.
    pub fn create(&self, order: &RepairOrder) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(order).map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.db
            .exec(
                "INSERT INTO work_orders (id, data, status, technician_id, created_by, date_created) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                &[
                    Value::Text(order.id.clone()),
                    Value::Text(data),
                    Value::Text(order.status.as_str().to_string()),
                    Value::opt_text(order.assigned_technician_id.clone()),
                    Value::Text(order.created_by.clone()),
                    Value::Integer(order.date_created),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Get an order by ID.
    pub fn get(&self, id: &str) -> Result<RepairOrder, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM work_orders WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("order {id} not found")))?;

        row_to_order(row)
    }

    /// Update an order unconditionally (last-write-wins).
    ///
    /// Used for descriptive edits and photo attachment; lifecycle changes
    /// go through [`OrderStore::transition`].
    pub fn update(&self, order: &RepairOrder) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(order).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE work_orders SET data = ?1, status = ?2, technician_id = ?3 WHERE id = ?4",
                &[
                    Value::Text(data),
                    Value::Text(order.status.as_str().to_string()),
                    Value::opt_text(order.assigned_technician_id.clone()),
                    Value::Text(order.id.clone()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("order {} not found", order.id)));
        }
        Ok(())
    }

    /// Atomically move an order to `order.status`, provided its persisted
    /// status is still one of `from`.
    ///
    /// Returns `true` if the row was updated. Returns `false` when the
    /// status changed underneath us (e.g. someone else claimed first) —
    /// nothing is written in that case. This single UPDATE with a status
    /// predicate is the compare-and-swap that makes claiming safe.
    pub fn transition(
        &self,
        order: &RepairOrder,
        from: &[OrderStatus],
    ) -> Result<bool, ServiceError> {
        let data =
            serde_json::to_string(order).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut params = vec![
            Value::Text(data),
            Value::Text(order.status.as_str().to_string()),
            Value::opt_text(order.assigned_technician_id.clone()),
            Value::Text(order.id.clone()),
        ];
        let mut sql = String::from(
            "UPDATE work_orders SET data = ?1, status = ?2, technician_id = ?3 \
             WHERE id = ?4 AND status IN (",
        );
        for (i, status) in from.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&format!("?{}", params.len() + 1));
            params.push(Value::Text(status.as_str().to_string()));
        }
        sql.push(')');

        let affected = self
            .db
            .exec(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // Visibility queries
    // -----------------------------------------------------------------------

    /// All orders in a status, newest first.
    pub fn list_by_status(&self, status: OrderStatus) -> Result<Vec<RepairOrder>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM work_orders WHERE status = ?1 ORDER BY date_created DESC",
                &[Value::Text(status.as_str().to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.iter().map(row_to_order).collect()
    }

    /// A technician's own orders in a status, newest first.
    pub fn list_by_technician(
        &self,
        technician_id: &str,
        status: OrderStatus,
    ) -> Result<Vec<RepairOrder>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM work_orders WHERE technician_id = ?1 AND status = ?2 \
                 ORDER BY date_created DESC",
                &[
                    Value::Text(technician_id.to_string()),
                    Value::Text(status.as_str().to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.iter().map(row_to_order).collect()
    }
}

/// Deserialize a RepairOrder from a row's `data` JSON column.
fn row_to_order(row: &Row) -> Result<RepairOrder, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json).map_err(|e| ServiceError::Storage(format!("bad order json: {e}")))
}
