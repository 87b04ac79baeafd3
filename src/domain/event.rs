use uuid::Uuid;

/// Append-only audit record of a transition or significant action, written
/// in the same transaction as the mutation it describes.
pub struct NewBookingEvent {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub action: String,
    pub actor_role: String,
    pub actor_id: Option<Uuid>,
    pub detail: serde_json::Value,
}

impl NewBookingEvent {
    pub fn new(
        booking_id: Uuid,
        action: impl Into<String>,
        actor_role: impl Into<String>,
        actor_id: Option<Uuid>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            booking_id,
            action: action.into(),
            actor_role: actor_role.into(),
            actor_id,
            detail,
        }
    }
}
