use {crate::domain::{error::BookingError, service::Service}, uuid::Uuid};

struct ServiceRow {
    id: Uuid,
    category: String,
    name: String,
    price_cents: i64,
    active: bool,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            category: row.category,
            name: row.name,
            price_cents: row.price_cents,
            active: row.active,
        }
    }
}

/// Null-tolerant lookup: a missing or inactive service is reported as
/// `None` rather than an error, so booking creation can proceed with no
/// snapshot (§4.3.1).
pub async fn find_active(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<Option<Service>, BookingError> {
    let row = sqlx::query_as!(
        ServiceRow,
        "SELECT id, category, name, price_cents, active FROM services WHERE id = $1 AND active",
        id,
    )
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(Service::from))
}

pub async fn list_active(pool: &sqlx::PgPool) -> Result<Vec<Service>, BookingError> {
    let rows = sqlx::query_as!(
        ServiceRow,
        "SELECT id, category, name, price_cents, active FROM services WHERE active ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Service::from).collect())
}
