use {
    crate::domain::{
        booking::{Booking, CandidateList, NewBookingRequest},
        error::BookingError,
        id::Otp,
        state_machine::BookingStatus,
    },
    chrono::{DateTime, Utc},
    uuid::Uuid,
};

struct BookingRow {
    id: Uuid,
    status: String,
    customer_id: Uuid,
    provider_id: Option<Uuid>,
    service_id: Option<Uuid>,
    slot_id: Uuid,
    candidate_list: Vec<Uuid>,
    otp: Option<i32>,
    expires_at: DateTime<Utc>,
    complete_pending_until: Option<DateTime<Utc>>,
    service_name_snapshot: Option<String>,
    price_snapshot_cents: Option<i64>,
    stripe_payment_intent_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_domain(self) -> Result<Booking, BookingError> {
        Ok(Booking {
            id: self.id,
            status: BookingStatus::try_from(self.status.as_str())?,
            customer_id: self.customer_id,
            provider_id: self.provider_id,
            service_id: self.service_id,
            slot_id: self.slot_id,
            candidate_list: CandidateList::new(self.candidate_list),
            otp: self.otp.map(|v| Otp::new(v as u16)).transpose()?,
            expires_at: self.expires_at,
            complete_pending_until: self.complete_pending_until,
            service_name_snapshot: self.service_name_snapshot,
            price_snapshot_cents: self.price_snapshot_cents,
            stripe_payment_intent_id: self.stripe_payment_intent_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insert a new booking in `PENDING_PAYMENT`. Caller has already resolved the
/// service snapshot, candidate list and OTP; this is a pure write.
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    req: &NewBookingRequest,
    candidate_list: &CandidateList,
    otp: Otp,
    service_name_snapshot: Option<&str>,
    price_snapshot_cents: Option<i64>,
    expires_at: DateTime<Utc>,
) -> Result<Booking, BookingError> {
    let id = Uuid::now_v7();
    let candidates: Vec<Uuid> = candidate_list.as_slice().to_vec();

    let row = sqlx::query_as!(
        BookingRow,
        r#"
        INSERT INTO bookings
            (id, status, customer_id, service_id, slot_id, candidate_list,
             otp, expires_at, service_name_snapshot, price_snapshot_cents)
        VALUES ($1, 'PENDING_PAYMENT', $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING
            id, status, customer_id, provider_id, service_id, slot_id,
            candidate_list, otp, expires_at, complete_pending_until,
            service_name_snapshot, price_snapshot_cents, stripe_payment_intent_id,
            created_at, updated_at
        "#,
        id,
        req.customer_id,
        req.service_id,
        req.slot_id,
        &candidates,
        otp.value() as i32,
        expires_at,
        service_name_snapshot,
        price_snapshot_cents,
    )
    .fetch_one(&mut **tx)
    .await?;

    row.into_domain()
}

/// Lock and fetch a booking row for mutation. Must be called inside a
/// transaction that will either commit the resulting change or roll back.
pub async fn find_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<Option<Booking>, BookingError> {
    let row = sqlx::query_as!(
        BookingRow,
        r#"
        SELECT
            id, status, customer_id, provider_id, service_id, slot_id,
            candidate_list, otp, expires_at, complete_pending_until,
            service_name_snapshot, price_snapshot_cents, stripe_payment_intent_id,
            created_at, updated_at
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
        id,
    )
    .fetch_optional(&mut **tx)
    .await?;

    row.map(BookingRow::into_domain).transpose()
}

pub async fn find(pool: &sqlx::PgPool, id: Uuid) -> Result<Option<Booking>, BookingError> {
    let row = sqlx::query_as!(
        BookingRow,
        r#"
        SELECT
            id, status, customer_id, provider_id, service_id, slot_id,
            candidate_list, otp, expires_at, complete_pending_until,
            service_name_snapshot, price_snapshot_cents, stripe_payment_intent_id,
            created_at, updated_at
        FROM bookings
        WHERE id = $1
        "#,
        id,
    )
    .fetch_optional(pool)
    .await?;

    row.map(BookingRow::into_domain).transpose()
}

pub async fn list_for_customer(
    pool: &sqlx::PgPool,
    customer_id: Uuid,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Booking>, BookingError> {
    let rows = sqlx::query_as!(
        BookingRow,
        r#"
        SELECT
            id, status, customer_id, provider_id, service_id, slot_id,
            candidate_list, otp, expires_at, complete_pending_until,
            service_name_snapshot, price_snapshot_cents, stripe_payment_intent_id,
            created_at, updated_at
        FROM bookings
        WHERE customer_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
        customer_id,
        status,
        limit,
        offset,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(BookingRow::into_domain).collect()
}

pub async fn list_claimed_by_provider(
    pool: &sqlx::PgPool,
    provider_id: Uuid,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Booking>, BookingError> {
    let rows = sqlx::query_as!(
        BookingRow,
        r#"
        SELECT
            id, status, customer_id, provider_id, service_id, slot_id,
            candidate_list, otp, expires_at, complete_pending_until,
            service_name_snapshot, price_snapshot_cents, stripe_payment_intent_id,
            created_at, updated_at
        FROM bookings
        WHERE provider_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
        provider_id,
        status,
        limit,
        offset,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(BookingRow::into_domain).collect()
}

/// Conditional accept: only succeeds if the row is still `PAID_SEARCHING`.
/// Returns the number of rows affected (0 or 1) — the caller's defense in
/// depth on top of the row lock already held.
pub async fn accept(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    provider_id: Uuid,
) -> Result<u64, BookingError> {
    let result = sqlx::query!(
        r#"
        UPDATE bookings
        SET status = 'ACCEPTED', provider_id = $2, updated_at = now()
        WHERE id = $1 AND status = 'PAID_SEARCHING'
        "#,
        id,
        provider_id,
    )
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// General conditional status transition, optionally also clearing or
/// setting `provider_id` and `complete_pending_until`.
pub async fn transition(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    from: BookingStatus,
    to: BookingStatus,
    set_provider_id: Option<Option<Uuid>>,
    set_complete_pending_until: Option<Option<DateTime<Utc>>>,
) -> Result<u64, BookingError> {
    let provider_clause_value = set_provider_id.unwrap_or(None);
    let keep_provider = set_provider_id.is_none();
    let cpu_clause_value = set_complete_pending_until.unwrap_or(None);
    let keep_cpu = set_complete_pending_until.is_none();

    let result = sqlx::query!(
        r#"
        UPDATE bookings
        SET status = $3,
            provider_id = CASE WHEN $5 THEN provider_id ELSE $4 END,
            complete_pending_until = CASE WHEN $7 THEN complete_pending_until ELSE $6 END,
            updated_at = now()
        WHERE id = $1 AND status = $2
        "#,
        id,
        from.as_str(),
        to.as_str(),
        provider_clause_value,
        keep_provider,
        cpu_clause_value,
        keep_cpu,
    )
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn set_stripe_payment_intent_id(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    stripe_payment_intent_id: &str,
) -> Result<(), BookingError> {
    sqlx::query!(
        "UPDATE bookings SET stripe_payment_intent_id = $2, updated_at = now() WHERE id = $1",
        id,
        stripe_payment_intent_id,
    )
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Expire stale `PENDING_PAYMENT` bookings older than 24 hours. Safe to run
/// concurrently with mutators: the status predicate makes it a no-op on any
/// row already moved on.
pub async fn sweep_expired_pending_payment(pool: &sqlx::PgPool) -> Result<u64, BookingError> {
    let result = sqlx::query!(
        r#"
        UPDATE bookings
        SET status = 'EXPIRED', updated_at = now()
        WHERE status = 'PENDING_PAYMENT' AND created_at < now() - interval '24 hours'
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
