use {
    super::{error::BookingError, id::ExternalId, money::Money},
    std::{future::Future, pin::Pin},
};

/// What comes back from the gateway after opening an authorization.
pub struct GatewayIntent {
    pub external_id: ExternalId,
    pub client_secret: String,
}

/// Abstraction over the external card processor. A booking never talks to
/// Stripe directly — only through this trait, so tests can swap in a mock
/// that never leaves the process.
pub trait PaymentGateway: Send + Sync {
    /// Opens a manual-capture authorization for `amount`. Returns the
    /// provider's reference id and the client secret the frontend needs to
    /// confirm the card.
    fn create_intent(
        &self,
        amount: Money,
        idempotency_key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<GatewayIntent, BookingError>> + Send + '_>>;

    /// Captures a previously authorized intent in full.
    fn capture(
        &self,
        external_id: &ExternalId,
    ) -> Pin<Box<dyn Future<Output = Result<(), BookingError>> + Send + '_>>;

    /// Voids an authorization without capturing it.
    fn release(
        &self,
        external_id: &ExternalId,
    ) -> Pin<Box<dyn Future<Output = Result<(), BookingError>> + Send + '_>>;

    /// Charges a new, immediately-captured intent — used for the flat
    /// cancellation fee.
    fn charge_fee(
        &self,
        amount: Money,
        idempotency_key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ExternalId, BookingError>> + Send + '_>>;
}
