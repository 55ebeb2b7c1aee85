//! Farm API request and response types.
//!
//! Records are pass-through copies of the server's JSON. Every field has a
//! default and unknown fields are kept in `extra`, so a change on the server
//! never makes a page fail to load.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::{ApiError, Result};

/// Server-side primary key of a record.
pub type RecordId = i64;

/// A record with a server-assigned id.
pub trait Record {
    /// The record's primary key.
    fn id(&self) -> RecordId;
}

/// Deserialize a decimal that may arrive as a JSON number or a string.
///
/// Django REST Framework renders `DecimalField` values as strings.
fn decimal<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Raw::Null => Ok(0.0),
    }
}

/// Null-tolerant string field.
fn text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Request plumbing
// ---------------------------------------------------------------------------

/// Per-call request options.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method; defaults to GET.
    pub method: Method,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Extra headers, applied after (and overriding) the defaults.
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    /// A GET request.
    pub fn get() -> Self {
        Self::default()
    }

    /// A POST request with no body.
    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    /// A PATCH request with no body.
    pub fn patch() -> Self {
        Self {
            method: Method::PATCH,
            ..Self::default()
        }
    }

    /// Attach a JSON body, serializing `body` eagerly.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::Serialize)?);
        Ok(self)
    }

    /// Attach an extra header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Query string parameters, percent-encoded in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    /// An empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add a parameter only when `value` is present and non-empty.
    ///
    /// Pages build their filter queries this way: an empty select means
    /// "no filter".
    pub fn param_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.param(key, v),
            _ => self,
        }
    }

    /// Whether no parameters were added.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render as a suffix: empty, or `?k=v&...`.
    pub fn to_suffix(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!("?{}", self)
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        f.write_str(&encoded)
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Query::new(), |q, (k, v)| q.param(k, v))
    }
}

/// A normalized collection response.
///
/// The backend returns collections either as a bare array or as a paginated
/// object `{results, count, next, previous}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    /// The records.
    pub items: Vec<T>,
    /// Total number of records on the server, when paginated.
    pub count: Option<u64>,
    /// URL of the next page, when paginated.
    pub next: Option<String>,
    /// URL of the previous page, when paginated.
    pub previous: Option<String>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: None,
            next: None,
            previous: None,
        }
    }
}

impl<T: serde::de::DeserializeOwned> Listing<T> {
    /// Normalize a raw collection response.
    ///
    /// Prefers `results` when the value is an object carrying it; otherwise
    /// the value itself must be the array. `null` is an empty listing.
    pub fn from_value(value: Value) -> Result<Self> {
        let parse_items = |v: Value| {
            serde_json::from_value::<Vec<T>>(v)
                .map_err(|e| ApiError::InvalidResponse(format!("invalid list item: {}", e)))
        };

        match value {
            Value::Null => Ok(Self::default()),
            Value::Array(_) => Ok(Self {
                items: parse_items(value)?,
                ..Self::default()
            }),
            Value::Object(mut obj) if obj.contains_key("results") => {
                let results = obj.remove("results").unwrap_or(Value::Null);
                let items = match results {
                    Value::Null => Vec::new(),
                    other => parse_items(other)?,
                };
                Ok(Self {
                    items,
                    count: obj.get("count").and_then(Value::as_u64),
                    next: obj.get("next").and_then(Value::as_str).map(str::to_string),
                    previous: obj
                        .get("previous")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            }
            other => Err(ApiError::InvalidResponse(format!(
                "expected a list or paginated object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl<T> Listing<T> {
    /// Consume the listing, keeping only the records.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Whether the server reported more pages.
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

/// Normalize a collection response into a plain sequence.
pub fn unwrap_list<T: serde::de::DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    Listing::from_value(value).map(Listing::into_items)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Login payload. The backend's `username` is the phone number.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Returned by `POST /auth/login/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// The opaque bearer token.
    pub token: String,
}

/// The authenticated user, returned by `GET /auth/me/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct User {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub phone: String,
    #[serde(deserialize_with = "text")]
    pub full_name: String,
    #[serde(deserialize_with = "text")]
    pub email: String,
    pub is_active: bool,
    /// Id of the farm the user is currently working on.
    pub active_farm: Option<RecordId>,
    pub date_joined: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Name to show in the UI, falling back to the phone number.
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.phone
        } else {
            &self.full_name
        }
    }
}

/// Payload for `POST /auth/register/`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub phone: String,
    pub full_name: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Dairy
// ---------------------------------------------------------------------------

/// A cow as listed on the herd page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Cow {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub tag_number: String,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub breed: String,
    #[serde(deserialize_with = "text")]
    pub status: String,
    #[serde(deserialize_with = "text")]
    pub status_display: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single milking record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MilkLog {
    pub id: RecordId,
    pub cow: Option<RecordId>,
    #[serde(deserialize_with = "text")]
    pub cow_tag: String,
    #[serde(deserialize_with = "text")]
    pub cow_name: String,
    #[serde(deserialize_with = "text")]
    pub date: String,
    #[serde(deserialize_with = "text")]
    pub session: String,
    #[serde(deserialize_with = "decimal")]
    pub liters: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

/// Current stock level of a feed item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StockLevel {
    #[serde(deserialize_with = "decimal")]
    pub quantity: f64,
    #[serde(deserialize_with = "text")]
    pub unit: String,
    pub is_low: bool,
    pub days_remaining: Option<f64>,
}

/// A feed item in the inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedItem {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub category: String,
    #[serde(deserialize_with = "text")]
    pub category_display: String,
    #[serde(deserialize_with = "text")]
    pub unit: String,
    #[serde(deserialize_with = "decimal")]
    pub minimum_stock: f64,
    pub current_stock: Option<StockLevel>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedItem {
    /// Whether the server flagged this item as low on stock.
    pub fn is_low(&self) -> bool {
        self.current_stock.as_ref().is_some_and(|s| s.is_low)
    }
}

/// A feed purchase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedPurchase {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub feed_item_name: String,
    #[serde(deserialize_with = "decimal")]
    pub quantity: f64,
    #[serde(deserialize_with = "decimal")]
    pub unit_price: f64,
    #[serde(deserialize_with = "decimal")]
    pub total_cost: f64,
    #[serde(deserialize_with = "text")]
    pub supplier: String,
    #[serde(deserialize_with = "text")]
    pub date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// A recorded health event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthEvent {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub cow_tag: String,
    #[serde(deserialize_with = "text")]
    pub cow_name: String,
    #[serde(deserialize_with = "text")]
    pub date: String,
    #[serde(deserialize_with = "text")]
    pub symptoms: String,
    #[serde(deserialize_with = "text")]
    pub diagnosis: String,
    #[serde(deserialize_with = "text")]
    pub severity: String,
    pub is_resolved: bool,
    pub resolution_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// A recurring task definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaskTemplate {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub description: String,
    #[serde(deserialize_with = "text")]
    pub frequency: String,
    #[serde(deserialize_with = "text")]
    pub priority: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A scheduled task as shown to workers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaskInstance {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub template_name: String,
    #[serde(deserialize_with = "text")]
    pub assigned_to_name: String,
    #[serde(deserialize_with = "text")]
    pub status: String,
    #[serde(deserialize_with = "text")]
    pub status_display: String,
    #[serde(deserialize_with = "text")]
    pub priority: String,
    pub due_time: Option<String>,
    pub completed_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskInstance {
    /// Whether the task still needs doing.
    pub fn is_pending(&self) -> bool {
        self.status == "pending"
    }
}

/// A farm worker that tasks can be assigned to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Worker {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub full_name: String,
    #[serde(deserialize_with = "text")]
    pub phone: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// A milk buyer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Buyer {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub phone: String,
    #[serde(deserialize_with = "text")]
    pub buyer_type: String,
    #[serde(deserialize_with = "decimal")]
    pub credit_limit: f64,
    #[serde(deserialize_with = "decimal")]
    pub current_balance: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A milk sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Sale {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub buyer_name: String,
    #[serde(deserialize_with = "text")]
    pub date: String,
    #[serde(deserialize_with = "decimal")]
    pub liters: f64,
    #[serde(deserialize_with = "decimal")]
    pub price_per_liter: f64,
    /// Computed by the server.
    #[serde(deserialize_with = "decimal")]
    pub total_amount: f64,
    #[serde(deserialize_with = "text")]
    pub payment_status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A payment against a sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Payment {
    pub id: RecordId,
    pub sale_id: Option<RecordId>,
    #[serde(deserialize_with = "text")]
    pub buyer_name: String,
    #[serde(deserialize_with = "decimal")]
    pub amount: f64,
    #[serde(deserialize_with = "text")]
    pub payment_method: String,
    #[serde(deserialize_with = "text")]
    pub date: String,
    #[serde(deserialize_with = "text")]
    pub reference: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// A farm alert.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Alert {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub title: String,
    #[serde(deserialize_with = "text")]
    pub message: String,
    #[serde(deserialize_with = "text")]
    pub alert_type: String,
    #[serde(deserialize_with = "text")]
    pub severity: String,
    #[serde(deserialize_with = "text")]
    pub status: String,
    pub is_read: bool,
    pub is_resolved: bool,
    #[serde(deserialize_with = "text")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A configurable alert rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertRule {
    pub id: RecordId,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub alert_type: String,
    #[serde(alias = "is_enabled")]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(impl Record for $ty {
            fn id(&self) -> RecordId {
                self.id
            }
        })*
    };
}

impl_record!(
    User,
    Cow,
    MilkLog,
    FeedItem,
    FeedPurchase,
    HealthEvent,
    TaskTemplate,
    TaskInstance,
    Worker,
    Buyer,
    Sale,
    Payment,
    Alert,
    AlertRule,
);
