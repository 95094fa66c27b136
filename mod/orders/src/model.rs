use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a repair order.
///
/// ```text
/// PENDING → WORKING → FINISHED
///    ↑________|__________|
///       (return to pending)
/// ```
///
/// PENDING orders form the claimable pool. Claiming is a compare-and-swap:
/// at most one technician wins a given order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Working,
    Finished,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Working => "WORKING",
            Self::Finished => "FINISHED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "WORKING" => Some(Self::Working),
            "FINISHED" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrderPhoto — one photo, two legacy encodings
// ---------------------------------------------------------------------------

/// The order photo, if any.
///
/// Stored documents carry two optional fields, `photoUrl` (a blob store
/// key) and `photoBase64` (the JPEG inline). Only one is meaningful; when
/// both appear in old data the inline form wins. Empty strings count as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PhotoFields", into = "PhotoFields")]
pub enum OrderPhoto {
    #[default]
    None,
    /// Blob store key (`orders/{orderId}/{randomId}.jpg`).
    Reference(String),
    /// Base64-encoded JPEG carried inside the document.
    Inline(String),
}

impl OrderPhoto {
    pub fn is_none(&self) -> bool {
        matches!(self, OrderPhoto::None)
    }

    /// The blob store key, when the photo is a reference.
    pub fn reference(&self) -> Option<&str> {
        match self {
            OrderPhoto::Reference(key) => Some(key.as_str()),
            _ => None,
        }
    }
}

/// Wire/persistence shape of [`OrderPhoto`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhotoFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo_base64: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

impl From<PhotoFields> for OrderPhoto {
    fn from(f: PhotoFields) -> Self {
        match (non_empty(f.photo_base64), non_empty(f.photo_url)) {
            (Some(b64), _) => OrderPhoto::Inline(b64),
            (None, Some(url)) => OrderPhoto::Reference(url),
            (None, None) => OrderPhoto::None,
        }
    }
}

impl From<OrderPhoto> for PhotoFields {
    fn from(p: OrderPhoto) -> Self {
        match p {
            OrderPhoto::None => PhotoFields::default(),
            OrderPhoto::Reference(url) => PhotoFields {
                photo_url: Some(url),
                photo_base64: None,
            },
            OrderPhoto::Inline(b64) => PhotoFields {
                photo_url: None,
                photo_base64: Some(b64),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// RepairOrder — the core data model
// ---------------------------------------------------------------------------

/// A single device-repair order.
///
/// The full document is stored as a JSON `data` column; status, assignee
/// and creation date are mirrored into indexed columns for queries.
///
/// Invariants:
/// - PENDING ⇔ no assignee ⇔ no `date_started`
/// - WORKING ⇒ assignee and `date_started` set, `date_finished` unset
/// - FINISHED ⇒ `date_finished` set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairOrder {
    pub id: String,

    // --- device ---
    pub device_model: String,
    pub issue_description: String,
    /// Physical shelf where the device waits, e.g. "A-8".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_location: Option<String>,

    // --- lifecycle ---
    pub status: OrderStatus,
    /// Set together with `assigned_technician_name` on claim, cleared
    /// together on return to pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_technician_id: Option<String>,
    /// Display name captured at claim time; refreshed by list enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_technician_name: Option<String>,

    // --- provenance ---
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_name: Option<String>,

    // --- photo (flattens to `photoUrl` / `photoBase64`) ---
    #[serde(flatten)]
    pub photo: OrderPhoto,

    // --- timestamps (epoch ms) ---
    pub date_created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_started: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_finished: Option<i64>,
}

// ---------------------------------------------------------------------------
// API request types
// ---------------------------------------------------------------------------

/// Body for `POST /orders` — open a new repair order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub device_model: String,
    pub issue_description: String,
    #[serde(default)]
    pub shelf_location: Option<String>,
    /// Optional JPEG carried inline, base64-encoded.
    #[serde(default)]
    pub photo_base64: Option<String>,
}

/// Body for `PATCH /orders/{id}` — replace the descriptive fields.
///
/// The edit form always submits the full set, so the fields are required
/// rather than optional patches.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOrderRequest {
    pub device_model: String,
    pub issue_description: String,
    #[serde(default)]
    pub shelf_location: Option<String>,
}

/// Query parameters for `GET /orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    /// Status bucket to list (`PENDING`, `WORKING`, `FINISHED`).
    pub status: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
