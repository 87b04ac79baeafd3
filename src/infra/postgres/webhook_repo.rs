use crate::domain::{error::BookingError, webhook::{NewWebhookEvent, WebhookStatus}};

pub struct WebhookEventRow {
    pub status: String,
}

/// Lock the ledger row for `(provider, event_id)`, if it exists.
pub async fn find_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    provider: &str,
    event_id: &str,
) -> Result<Option<WebhookEventRow>, BookingError> {
    let row = sqlx::query_as!(
        WebhookEventRow,
        r#"
        SELECT status FROM webhook_events
        WHERE provider = $1 AND event_id = $2
        FOR UPDATE
        "#,
        provider,
        event_id,
    )
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row)
}

/// Upsert the ledger row to `PENDING`, stashing the raw payload. Used both
/// for first-seen events and for retrying a previously `FAILED` one.
pub async fn upsert_pending(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &NewWebhookEvent,
) -> Result<(), BookingError> {
    sqlx::query!(
        r#"
        INSERT INTO webhook_events (id, provider, event_id, event_type, status, payload)
        VALUES ($1, $2, $3, $4, 'PENDING', $5)
        ON CONFLICT (provider, event_id)
        DO UPDATE SET status = 'PENDING', payload = $5, updated_at = now()
        "#,
        event.id,
        event.provider,
        event.event_id,
        event.event_type,
        event.payload,
    )
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn mark_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    provider: &str,
    event_id: &str,
    status: WebhookStatus,
) -> Result<(), BookingError> {
    sqlx::query!(
        r#"
        UPDATE webhook_events
        SET status = $3, updated_at = now()
        WHERE provider = $1 AND event_id = $2
        "#,
        provider,
        event_id,
        status.as_str(),
    )
    .execute(&mut **tx)
    .await?;

    Ok(())
}
