//! Vendor webhook payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Body of a vendor webhook call.
///
/// `status` is kept as the raw vendor string so an unknown value can be reported
/// distinctly from a malformed body.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct WebhookPayload {
    pub session_id: String,
    pub status: String,
    /// e.g. `status.updated` or `data.updated`.
    #[serde(default)]
    pub webhook_type: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub decision: Option<JsonValue>,
    /// Opaque value we handed the vendor at session creation: our user id.
    #[serde(default)]
    pub vendor_data: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl WebhookPayload {
    pub fn webhook_type(&self) -> &str {
        self.webhook_type.as_deref().unwrap_or("status.updated")
    }

    /// The user this session belongs to, when the vendor echoed it back.
    pub fn user_id(&self) -> Option<&str> {
        self.vendor_data
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
