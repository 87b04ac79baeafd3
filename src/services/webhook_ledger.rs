use {
    crate::{
        domain::{error::BookingError, webhook::{NewWebhookEvent, WebhookOutcome}},
        infra::postgres::webhook_repo,
    },
    sqlx::PgPool,
    std::future::Future,
};

/// Runs `handler` for `(provider, event_id)` at most once. The advisory lock
/// is held for the whole call — across the pending write, the handler, and
/// the final status write — so truly concurrent identical deliveries are
/// serialized rather than racing each other to the `PROCESSED` check; the
/// second and later callers only ever observe a row already `PROCESSED`.
pub async fn process_event<F, Fut>(
    pool: &PgPool,
    provider: &str,
    event_id: &str,
    event_type: &str,
    payload: serde_json::Value,
    handler: F,
) -> Result<WebhookOutcome, BookingError>
where
    F: FnOnce(serde_json::Value) -> Fut,
    Fut: Future<Output = Result<(), BookingError>>,
{
    let lock_key = format!("{provider}:{event_id}");

    let mut tx = pool.begin().await?;
    sqlx::query!("SELECT pg_advisory_xact_lock(hashtext($1))", lock_key)
        .execute(&mut *tx)
        .await?;

    let existing = webhook_repo::find_for_update(&mut tx, provider, event_id).await?;
    if let Some(row) = &existing {
        if row.status == "PROCESSED" {
            tx.commit().await?;
            return Ok(WebhookOutcome::Duplicate);
        }
    }

    let event = NewWebhookEvent::new(provider, event_id, event_type, payload.clone());
    webhook_repo::upsert_pending(&mut tx, &event).await?;

    match handler(payload).await {
        Ok(()) => {
            webhook_repo::mark_status(
                &mut tx,
                provider,
                event_id,
                crate::domain::webhook::WebhookStatus::Processed,
            )
            .await?;
            tx.commit().await?;
            Ok(WebhookOutcome::Applied)
        }
        Err(e) => {
            webhook_repo::mark_status(
                &mut tx,
                provider,
                event_id,
                crate::domain::webhook::WebhookStatus::Failed,
            )
            .await?;
            tx.commit().await?;
            Err(e)
        }
    }
}
