use {
    crate::domain::{
        error::BookingError,
        id::ExternalId,
        money::Money,
        provider::{GatewayIntent, PaymentGateway},
    },
    rand::Rng,
    std::{future::Future, pin::Pin},
};

/// In-process stand-in for `StripeGateway`, used whenever `STRIPE_SECRET_KEY`
/// is absent (local dev, CI). References are `pi_mock_<hex>` and never touch
/// a real payment network; capture/release are no-ops that always succeed.
#[derive(Default)]
pub struct MockGateway;

impl MockGateway {
    pub fn new() -> Self {
        Self
    }

    fn mock_id() -> String {
        let suffix: u64 = rand::thread_rng().gen();
        format!("pi_mock_{suffix:016x}")
    }
}

impl PaymentGateway for MockGateway {
    fn create_intent(
        &self,
        _amount: Money,
        _idempotency_key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<GatewayIntent, BookingError>> + Send + '_>> {
        Box::pin(async move {
            let external_id = ExternalId::new(Self::mock_id())?;
            Ok(GatewayIntent {
                client_secret: format!("{}_secret_mock", external_id.as_str()),
                external_id,
            })
        })
    }

    fn capture(
        &self,
        _external_id: &ExternalId,
    ) -> Pin<Box<dyn Future<Output = Result<(), BookingError>> + Send + '_>> {
        Box::pin(async move { Ok(()) })
    }

    fn release(
        &self,
        _external_id: &ExternalId,
    ) -> Pin<Box<dyn Future<Output = Result<(), BookingError>> + Send + '_>> {
        Box::pin(async move { Ok(()) })
    }

    fn charge_fee(
        &self,
        _amount: Money,
        _idempotency_key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ExternalId, BookingError>> + Send + '_>> {
        Box::pin(async move { ExternalId::new(Self::mock_id()) })
    }
}
