use thiserror::Error;

/// Sub-kind of [`BookingError::State`] — illegal transitions and the
/// semantic gates the state machine table alone cannot express.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("transition not permitted")]
    InvalidTransition,
    #[error("booking status changed before this request committed")]
    StatusDrift,
    #[error("otp does not match")]
    InvalidOtp,
    #[error("booking is claimed by another provider")]
    OwnedByOtherProvider,
    #[error("provider is not a candidate for this booking")]
    NotCandidate,
    #[error("grace window has closed")]
    GraceWindowExpired,
    #[error("no authorized payment intent to act on")]
    NoAuthorizedIntent,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("authorization: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("state: {0}")]
    State(#[from] StateError),

    #[error("payment gateway: {0}")]
    Gateway(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("webhook signature: {0}")]
    WebhookSignature(String),

    #[error("configuration: {0}")]
    Configuration(String),
}

impl BookingError {
    pub fn state(kind: StateError) -> Self {
        Self::State(kind)
    }
}
