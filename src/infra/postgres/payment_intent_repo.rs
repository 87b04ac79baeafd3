use {
    crate::domain::{
        error::BookingError,
        money::Money,
        payment_intent::{IntentKind, PaymentIntent, PaymentIntentStatus},
    },
    uuid::Uuid,
};

struct IntentRow {
    id: Uuid,
    booking_id: Uuid,
    provider: String,
    provider_ref: String,
    kind: String,
    status: String,
    amount_cents: i64,
    currency: String,
}

impl IntentRow {
    fn into_domain(self) -> Result<PaymentIntent, BookingError> {
        Ok(PaymentIntent {
            id: self.id,
            booking_id: self.booking_id,
            provider: self.provider,
            provider_ref: self.provider_ref,
            kind: IntentKind::try_from(self.kind.as_str())?,
            status: PaymentIntentStatus::try_from(self.status.as_str())?,
            money: Money::zar(self.amount_cents)?,
        })
    }
}

pub async fn insert(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
    provider_ref: &str,
    kind: IntentKind,
    status: PaymentIntentStatus,
    money: Money,
) -> Result<PaymentIntent, BookingError> {
    let id = Uuid::now_v7();
    let row = sqlx::query_as!(
        IntentRow,
        r#"
        INSERT INTO payment_intents
            (id, booking_id, provider, provider_ref, kind, status, amount_cents, currency)
        VALUES ($1, $2, 'STRIPE', $3, $4, $5, $6, $7)
        RETURNING id, booking_id, provider, provider_ref, kind, status, amount_cents, currency
        "#,
        id,
        booking_id,
        provider_ref,
        kind.as_str(),
        status.as_str(),
        money.amount().cents(),
        money.currency().as_str(),
    )
    .fetch_one(&mut **tx)
    .await?;

    row.into_domain()
}

/// Find the booking's current `AUTHORIZED` main intent, if any. Invariant
/// (§3): at most one such row exists per booking.
pub async fn find_authorized(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
) -> Result<Option<PaymentIntent>, BookingError> {
    let row = sqlx::query_as!(
        IntentRow,
        r#"
        SELECT id, booking_id, provider, provider_ref, kind, status, amount_cents, currency
        FROM payment_intents
        WHERE booking_id = $1 AND status = 'AUTHORIZED' AND kind = 'main'
        FOR UPDATE
        "#,
        booking_id,
    )
    .fetch_optional(&mut **tx)
    .await?;

    row.map(IntentRow::into_domain).transpose()
}

/// Find the most recent `CREATED` main intent awaiting webhook confirmation.
pub async fn find_created_main_by_ref(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    provider_ref: &str,
) -> Result<Option<PaymentIntent>, BookingError> {
    let row = sqlx::query_as!(
        IntentRow,
        r#"
        SELECT id, booking_id, provider, provider_ref, kind, status, amount_cents, currency
        FROM payment_intents
        WHERE provider_ref = $1 AND kind = 'main'
        FOR UPDATE
        "#,
        provider_ref,
    )
    .fetch_optional(&mut **tx)
    .await?;

    row.map(IntentRow::into_domain).transpose()
}

pub async fn update_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    from: PaymentIntentStatus,
    to: PaymentIntentStatus,
) -> Result<u64, BookingError> {
    let result = sqlx::query!(
        r#"
        UPDATE payment_intents
        SET status = $3, updated_at = now()
        WHERE id = $1 AND status = $2
        "#,
        id,
        from.as_str(),
        to.as_str(),
    )
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
