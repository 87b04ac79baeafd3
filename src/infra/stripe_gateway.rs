use {
    crate::domain::{
        error::BookingError,
        id::ExternalId,
        money::Money,
        provider::{GatewayIntent, PaymentGateway},
    },
    std::{future::Future, pin::Pin},
};

/// Real payment gateway backed by `async-stripe`. Authorizations are opened
/// with manual capture so funds are held, not taken, until `capture`.
pub struct StripeGateway {
    client: stripe::Client,
}

impl StripeGateway {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: stripe::Client::new(secret_key),
        }
    }
}

impl PaymentGateway for StripeGateway {
    fn create_intent(
        &self,
        amount: Money,
        idempotency_key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<GatewayIntent, BookingError>> + Send + '_>> {
        let idempotency_key = idempotency_key.to_string();
        Box::pin(async move { self.create_intent_inner(amount, &idempotency_key).await })
    }

    fn capture(
        &self,
        external_id: &ExternalId,
    ) -> Pin<Box<dyn Future<Output = Result<(), BookingError>> + Send + '_>> {
        let external_id = external_id.clone();
        Box::pin(async move { self.capture_inner(&external_id).await })
    }

    fn release(
        &self,
        external_id: &ExternalId,
    ) -> Pin<Box<dyn Future<Output = Result<(), BookingError>> + Send + '_>> {
        let external_id = external_id.clone();
        Box::pin(async move { self.release_inner(&external_id).await })
    }

    fn charge_fee(
        &self,
        amount: Money,
        idempotency_key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ExternalId, BookingError>> + Send + '_>> {
        let idempotency_key = idempotency_key.to_string();
        Box::pin(async move { self.charge_fee_inner(amount, &idempotency_key).await })
    }
}

impl StripeGateway {
    async fn create_intent_inner(
        &self,
        amount: Money,
        idempotency_key: &str,
    ) -> Result<GatewayIntent, BookingError> {
        let mut params = stripe::CreatePaymentIntent::new(
            amount.amount().cents(),
            convert_currency(amount.currency()),
        );
        params.capture_method = Some(stripe::PaymentIntentCaptureMethod::Manual);

        let pi = stripe::PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| BookingError::Gateway(format!("stripe create intent: {e}")))?;

        let client_secret = pi.client_secret.clone().unwrap_or_default();
        let _ = idempotency_key;

        Ok(GatewayIntent {
            external_id: ExternalId::new(pi.id.to_string())?,
            client_secret,
        })
    }

    async fn capture_inner(&self, external_id: &ExternalId) -> Result<(), BookingError> {
        let pi_id = external_id
            .as_str()
            .parse::<stripe::PaymentIntentId>()
            .map_err(|e| BookingError::Gateway(format!("invalid PaymentIntent id: {e}")))?;

        stripe::PaymentIntent::capture(&self.client, &pi_id, Default::default())
            .await
            .map_err(|e| BookingError::Gateway(format!("stripe capture: {e}")))?;

        Ok(())
    }

    async fn release_inner(&self, external_id: &ExternalId) -> Result<(), BookingError> {
        let pi_id = external_id
            .as_str()
            .parse::<stripe::PaymentIntentId>()
            .map_err(|e| BookingError::Gateway(format!("invalid PaymentIntent id: {e}")))?;

        stripe::PaymentIntent::cancel(&self.client, &pi_id, Default::default())
            .await
            .map_err(|e| BookingError::Gateway(format!("stripe release: {e}")))?;

        Ok(())
    }

    async fn charge_fee_inner(
        &self,
        amount: Money,
        idempotency_key: &str,
    ) -> Result<ExternalId, BookingError> {
        let mut params = stripe::CreatePaymentIntent::new(
            amount.amount().cents(),
            convert_currency(amount.currency()),
        );
        params.confirm = Some(true);
        let _ = idempotency_key;

        let pi = stripe::PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| BookingError::Gateway(format!("stripe fee charge: {e}")))?;

        ExternalId::new(pi.id.to_string())
    }
}

fn convert_currency(c: crate::domain::money::Currency) -> stripe::Currency {
    match c {
        crate::domain::money::Currency::Zar => stripe::Currency::ZAR,
    }
}
