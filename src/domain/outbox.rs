use uuid::Uuid;

/// One row per transition that requires a downstream alert. Delivery is an
/// external concern; the core only guarantees the row exists atomically
/// with the logical event that produced it.
pub struct NewOutboxEntry {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub recipient_id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
}

impl NewOutboxEntry {
    pub fn new(
        booking_id: Uuid,
        recipient_id: Uuid,
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            booking_id,
            recipient_id,
            kind: kind.into(),
            payload,
        }
    }
}
