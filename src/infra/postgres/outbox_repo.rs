use crate::domain::{error::BookingError, outbox::NewOutboxEntry};

pub async fn insert(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entry: &NewOutboxEntry,
) -> Result<(), BookingError> {
    sqlx::query!(
        r#"
        INSERT INTO notification_outbox (id, booking_id, recipient_id, kind, payload)
        VALUES ($1, $2, $3, $4, $5)
        "#,
        entry.id,
        entry.booking_id,
        entry.recipient_id,
        entry.kind,
        entry.payload,
    )
    .execute(&mut **tx)
    .await?;

    Ok(())
}
