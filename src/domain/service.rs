use uuid::Uuid;

/// A bookable offering. Snapshotted onto the booking at creation time so
/// later catalogue edits never retroactively change a price already quoted.
#[derive(Debug, Clone)]
pub struct Service {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub price_cents: i64,
    pub active: bool,
}
