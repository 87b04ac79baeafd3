use {
    super::error::BookingError,
    derive_more::Display,
    rand::Rng,
    serde::{Deserialize, Serialize},
};

/// Stripe PaymentIntent or Refund identifier (`pi_xxx`, `re_xxx`).
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Result<Self, BookingError> {
        let id = id.into();
        if !(id.starts_with("pi_") || id.starts_with("re_") || id.starts_with("pi_mock_")) {
            return Err(BookingError::Validation(format!(
                "external id must start with pi_ or re_, got: {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_mock(&self) -> bool {
        self.0.starts_with("pi_mock_")
    }
}

/// Stripe event identifier (`evt_xxx`).
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Result<Self, BookingError> {
        let id = id.into();
        if id.is_empty() {
            return Err(BookingError::Validation("event id must not be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// The 4-digit customer-visible passcode gating `ARRIVED -> IN_PROGRESS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Otp(u16);

impl Otp {
    /// Uniformly sampled from `[1000, 9999]`, never leading-zero.
    pub fn generate() -> Self {
        Self(rand::thread_rng().gen_range(1000..=9999))
    }

    pub fn new(value: u16) -> Result<Self, BookingError> {
        if !(1000..=9999).contains(&value) {
            return Err(BookingError::Validation(format!(
                "otp must be a 4-digit value, got: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// Fixed-time comparison over the 4 decimal digits. Not performance
    /// sensitive; the point is to avoid a short-circuiting `==` on a
    /// customer-supplied guess.
    pub fn matches(&self, supplied: u16) -> bool {
        let a = self.0.to_be_bytes();
        let b = supplied.to_be_bytes();
        let mut diff = 0u8;
        for i in 0..a.len() {
            diff |= a[i] ^ b[i];
        }
        diff == 0
    }
}
