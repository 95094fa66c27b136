use serde::Serialize;

/// Result wrapper for list operations.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T: Serialize> ListResult<T> {
    pub fn new(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Current time as milliseconds since the Unix epoch.
///
/// All persisted timestamps (`dateCreated`, `dateStarted`, `dateFinished`,
/// session issue times) use this representation.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
