use {
    super::{error::BookingError, id::Otp, state_machine::BookingStatus},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Ordered, capped set of provider uids eligible to accept a booking.
/// Fixed at creation time; never grows beyond 5 entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateList(Vec<Uuid>);

pub const MAX_CANDIDATES: usize = 5;

impl CandidateList {
    pub fn new(candidates: Vec<Uuid>) -> Self {
        let mut candidates = candidates;
        candidates.truncate(MAX_CANDIDATES);
        Self(candidates)
    }

    pub fn contains(&self, uid: Uuid) -> bool {
        self.0.contains(&uid)
    }

    pub fn as_slice(&self) -> &[Uuid] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The root aggregate: a single customer/provider engagement moving through
/// the booking state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub status: BookingStatus,
    pub customer_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub slot_id: Uuid,
    pub candidate_list: CandidateList,
    /// Only ever populated for the owning customer / admin — see
    /// `Booking::redact_otp_for`.
    pub otp: Option<Otp>,
    pub expires_at: DateTime<Utc>,
    pub complete_pending_until: Option<DateTime<Utc>>,
    pub service_name_snapshot: Option<String>,
    pub price_snapshot_cents: Option<i64>,
    pub stripe_payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// The OTP is the only customer-shared secret guarding
    /// `ARRIVED -> IN_PROGRESS`; providers and other viewers never see it.
    pub fn redact_otp_for(mut self, viewer: Uuid, viewer_is_admin: bool) -> Self {
        if viewer != self.customer_id && !viewer_is_admin {
            self.otp = None;
        }
        self
    }

    pub fn is_owned_by(&self, customer_id: Uuid) -> bool {
        self.customer_id == customer_id
    }

    pub fn is_claimed_by(&self, provider_id: Uuid) -> bool {
        self.provider_id == Some(provider_id)
    }

    /// Amount to charge at intent creation: the price snapshot if present,
    /// otherwise a documented fallback.
    pub fn intent_amount_cents(&self) -> i64 {
        const FALLBACK_CENTS: i64 = 10_000;
        self.price_snapshot_cents.unwrap_or(FALLBACK_CENTS)
    }
}

/// Inputs for creating a booking — the service/slot the customer picked.
pub struct NewBookingRequest {
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,
}

impl NewBookingRequest {
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.customer_id.is_nil() {
            return Err(BookingError::Validation("customer_id must be set".into()));
        }
        Ok(())
    }
}
