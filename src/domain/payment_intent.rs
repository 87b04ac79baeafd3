use {
    super::{error::BookingError, money::Money},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Created,
    Authorized,
    Succeeded,
    Cancelled,
    Failed,
}

impl PaymentIntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Authorized => "AUTHORIZED",
            Self::Succeeded => "SUCCEEDED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        }
    }

    /// Exhaustive transition table for the main authorization's lifecycle.
    /// Fee intents skip this entirely — they are inserted directly as
    /// `Succeeded` and never transition.
    pub fn can_transition_to(&self, new: &Self) -> bool {
        matches!(
            (self, new),
            (Self::Created, Self::Authorized)
                | (Self::Created, Self::Failed)
                | (Self::Authorized, Self::Succeeded)
                | (Self::Authorized, Self::Cancelled)
                | (Self::Authorized, Self::Failed)
        )
    }
}

impl fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PaymentIntentStatus {
    type Error = BookingError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "CREATED" => Ok(Self::Created),
            "AUTHORIZED" => Ok(Self::Authorized),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "CANCELLED" => Ok(Self::Cancelled),
            "FAILED" => Ok(Self::Failed),
            other => Err(BookingError::Validation(format!(
                "unknown payment intent status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// The booking's primary authorization/capture.
    Main,
    /// A fixed cancellation fee, charged directly as `Succeeded`.
    Fee,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Fee => "fee",
        }
    }
}

impl TryFrom<&str> for IntentKind {
    type Error = BookingError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "main" => Ok(Self::Main),
            "fee" => Ok(Self::Fee),
            other => Err(BookingError::Validation(format!("unknown intent kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider: String,
    pub provider_ref: String,
    pub kind: IntentKind,
    pub status: PaymentIntentStatus,
    pub money: Money,
}

pub const CANCELLATION_FEE_CENTS: i64 = 1_000;
