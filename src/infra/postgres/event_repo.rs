use crate::domain::{error::BookingError, event::NewBookingEvent};

pub async fn insert(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &NewBookingEvent,
) -> Result<(), BookingError> {
    sqlx::query!(
        r#"
        INSERT INTO booking_events (id, booking_id, action, actor_role, actor_id, detail)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
        event.id,
        event.booking_id,
        event.action,
        event.actor_role,
        event.actor_id,
        event.detail,
    )
    .execute(&mut **tx)
    .await?;

    Ok(())
}
