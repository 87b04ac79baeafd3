use {super::error::BookingError, serde::{Deserialize, Serialize}, uuid::Uuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Pending,
    Processed,
    Failed,
}

impl WebhookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }
}

impl TryFrom<&str> for WebhookStatus {
    type Error = BookingError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSED" => Ok(Self::Processed),
            "FAILED" => Ok(Self::Failed),
            other => Err(BookingError::Validation(format!("unknown webhook status: {other}"))),
        }
    }
}

/// The three ways `process_event` can conclude, surfaced to the caller so
/// the HTTP handler can answer with the event's true outcome rather than a
/// blind 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// First time this `(provider, event_id)` pair was seen; applied.
    Applied,
    /// Already recorded as `Processed` — re-delivery, no-op.
    Duplicate,
    /// Recorded as `Pending` by a concurrent worker; caller should retry.
    InFlight,
}

/// A row in the idempotency ledger, keyed by `(provider, event_id)`.
pub struct NewWebhookEvent {
    pub id: Uuid,
    pub provider: String,
    pub event_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl NewWebhookEvent {
    pub fn new(
        provider: impl Into<String>,
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            provider: provider.into(),
            event_id: event_id.into(),
            event_type: event_type.into(),
            payload,
        }
    }
}
