use {crate::domain::error::BookingError, uuid::Uuid};

/// First 5 online providers offering `service_id`, ordered by provider
/// creation time — deterministic and stable within the enclosing
/// transaction so two concurrent creates never race on candidate order.
pub async fn candidate_providers_for_service(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    service_id: Uuid,
) -> Result<Vec<Uuid>, BookingError> {
    let rows = sqlx::query_scalar!(
        r#"
        SELECT p.user_uid
        FROM providers p
        JOIN provider_services ps ON ps.provider_id = p.id
        WHERE ps.service_id = $1 AND p.is_online
        ORDER BY p.created_at
        LIMIT 5
        "#,
        service_id,
    )
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}
