use {
    crate::{
        domain::{
            error::BookingError,
            id::ExternalId,
            money::Money,
            payment_intent::{IntentKind, PaymentIntent, PaymentIntentStatus, CANCELLATION_FEE_CENTS},
            provider::PaymentGateway,
        },
        infra::postgres::payment_intent_repo,
    },
    uuid::Uuid,
};

/// Opens a manual-capture authorization with the gateway and records it as
/// `CREATED`. The booking transitions to `PAID_SEARCHING` only later, when
/// the webhook confirms authorization (`on_authorization_success`).
pub async fn create_intent(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    gateway: &dyn PaymentGateway,
    booking_id: Uuid,
    amount: Money,
) -> Result<PaymentIntent, BookingError> {
    let idempotency_key = format!("booking:{booking_id}:main");
    let opened = gateway.create_intent(amount, &idempotency_key).await?;

    payment_intent_repo::insert(
        tx,
        booking_id,
        opened.external_id.as_str(),
        IntentKind::Main,
        PaymentIntentStatus::Created,
        amount,
    )
    .await
}

/// Invoked by the webhook pipeline once Stripe reports the intent as
/// authorized. Advances `CREATED -> AUTHORIZED`; a missing or already
/// transitioned row is not an error — the webhook may race ahead of (or
/// replay behind) our own write.
pub async fn on_authorization_success(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    provider_ref: &str,
) -> Result<Option<Uuid>, BookingError> {
    let Some(intent) = payment_intent_repo::find_created_main_by_ref(tx, provider_ref).await?
    else {
        return Ok(None);
    };

    if intent.status != PaymentIntentStatus::Created {
        return Ok(Some(intent.booking_id));
    }

    payment_intent_repo::update_status(
        tx,
        intent.id,
        PaymentIntentStatus::Created,
        PaymentIntentStatus::Authorized,
    )
    .await?;

    Ok(Some(intent.booking_id))
}

/// Captures the booking's sole `AUTHORIZED` main intent in full. The mock
/// gateway never needs a real capture call, but we still drive it through
/// the trait uniformly — the mock's `capture` is a no-op.
pub async fn capture(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    gateway: &dyn PaymentGateway,
    booking_id: Uuid,
) -> Result<(), BookingError> {
    let intent = payment_intent_repo::find_authorized(tx, booking_id)
        .await?
        .ok_or_else(|| {
            BookingError::state(crate::domain::error::StateError::NoAuthorizedIntent)
        })?;

    let external_id = ExternalId::new(intent.provider_ref.clone())?;
    gateway.capture(&external_id).await?;

    payment_intent_repo::update_status(
        tx,
        intent.id,
        PaymentIntentStatus::Authorized,
        PaymentIntentStatus::Succeeded,
    )
    .await?;

    Ok(())
}

/// Voids the booking's `AUTHORIZED` intent, if one exists. A booking that
/// never reached authorization (still `CREATED`, or none at all) has
/// nothing to release — that is not an error.
pub async fn release(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    gateway: &dyn PaymentGateway,
    booking_id: Uuid,
) -> Result<(), BookingError> {
    let Some(intent) = payment_intent_repo::find_authorized(tx, booking_id).await? else {
        return Ok(());
    };

    let external_id = ExternalId::new(intent.provider_ref.clone())?;
    gateway.release(&external_id).await?;

    payment_intent_repo::update_status(
        tx,
        intent.id,
        PaymentIntentStatus::Authorized,
        PaymentIntentStatus::Cancelled,
    )
    .await?;

    Ok(())
}

/// Charges the flat cancellation fee directly, recorded as `SUCCEEDED` —
/// fee intents never pass through `CREATED`/`AUTHORIZED`.
pub async fn fee(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    gateway: &dyn PaymentGateway,
    booking_id: Uuid,
) -> Result<PaymentIntent, BookingError> {
    let amount = Money::zar(CANCELLATION_FEE_CENTS)?;
    let idempotency_key = format!("booking:{booking_id}:fee");
    let external_id = gateway.charge_fee(amount, &idempotency_key).await?;

    payment_intent_repo::insert(
        tx,
        booking_id,
        external_id.as_str(),
        IntentKind::Fee,
        PaymentIntentStatus::Succeeded,
        amount,
    )
    .await
}
