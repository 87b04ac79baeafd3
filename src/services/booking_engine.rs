use {
    crate::{
        domain::{
            booking::{Booking, CandidateList, NewBookingRequest},
            error::{BookingError, StateError},
            event::NewBookingEvent,
            id::Otp,
            money::Money,
            outbox::NewOutboxEntry,
            provider::PaymentGateway,
            role::Role,
            state_machine::{can_transition, BookingStatus},
        },
        infra::postgres::{booking_repo, event_repo, outbox_repo, provider_repo, service_repo},
        services::payment_ledger,
    },
    chrono::{Duration, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

const PAYMENT_WINDOW_MINUTES: i64 = 15;
const COMPLETE_GRACE_MINUTES: i64 = 30;

fn verify_provider_ownership(booking: &Booking, provider_id: Uuid) -> Result<(), BookingError> {
    match booking.provider_id {
        Some(pid) if pid != provider_id => Err(BookingError::state(StateError::OwnedByOtherProvider)),
        _ => Ok(()),
    }
}

fn verify_customer_ownership(booking: &Booking, customer_id: Uuid) -> Result<(), BookingError> {
    if !booking.is_owned_by(customer_id) {
        return Err(BookingError::Authorization(
            "booking is not owned by this customer".into(),
        ));
    }
    Ok(())
}

/// §4.3.1 — create a booking in `PENDING_PAYMENT`.
pub async fn create(pool: &PgPool, req: NewBookingRequest) -> Result<Booking, BookingError> {
    req.validate()?;

    let mut tx = pool.begin().await?;

    let service = service_repo::find_active(&mut tx, req.service_id).await?;
    let candidates = provider_repo::candidate_providers_for_service(&mut tx, req.service_id).await?;
    let candidate_list = CandidateList::new(candidates);
    let otp = Otp::generate();
    let expires_at = Utc::now() + Duration::minutes(PAYMENT_WINDOW_MINUTES);

    let booking = booking_repo::insert(
        &mut tx,
        &req,
        &candidate_list,
        otp,
        service.as_ref().map(|s| s.name.as_str()),
        service.as_ref().map(|s| s.price_cents),
        expires_at,
    )
    .await?;

    let event = NewBookingEvent::new(
        booking.id,
        "create_booking",
        Role::User.as_str(),
        Some(req.customer_id),
        serde_json::json!({ "service_id": req.service_id, "slot_id": req.slot_id }),
    );
    event_repo::insert(&mut tx, &event).await?;

    tx.commit().await?;
    Ok(booking)
}

/// `POST /bookings/:id/pay` — opens the gateway authorization for a booking
/// still in `PENDING_PAYMENT`. The booking itself does not move state here;
/// it advances to `PAID_SEARCHING` only once the webhook confirms
/// authorization (`handle_payment_authorized`).
pub async fn pay(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    booking_id: Uuid,
    role: Role,
    customer_id: Uuid,
) -> Result<crate::domain::payment_intent::PaymentIntent, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    if role != Role::Admin {
        verify_customer_ownership(&booking, customer_id)?;
    }

    if booking.status != BookingStatus::PendingPayment {
        return Err(BookingError::state(StateError::InvalidTransition));
    }

    let amount = Money::zar(booking.intent_amount_cents())?;
    let intent = payment_ledger::create_intent(&mut tx, gateway, booking.id, amount).await?;
    booking_repo::set_stripe_payment_intent_id(&mut tx, booking.id, &intent.provider_ref).await?;

    tx.commit().await?;
    Ok(intent)
}

/// Invoked from the webhook pipeline once the gateway reports the intent as
/// authorized. Drives `PENDING_PAYMENT -> PAID_SEARCHING` (System role).
pub async fn handle_payment_authorized(
    pool: &PgPool,
    provider_ref: &str,
) -> Result<(), BookingError> {
    let mut tx = pool.begin().await?;

    let Some(booking_id) = payment_ledger::on_authorization_success(&mut tx, provider_ref).await?
    else {
        tx.commit().await?;
        return Ok(());
    };

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    if booking.status == BookingStatus::PendingPayment
        && can_transition(BookingStatus::PendingPayment, BookingStatus::PaidSearching, Role::System)
    {
        let rows = booking_repo::transition(
            &mut tx,
            booking.id,
            BookingStatus::PendingPayment,
            BookingStatus::PaidSearching,
            None,
            None,
        )
        .await?;

        if rows > 0 {
            let event = NewBookingEvent::new(
                booking.id,
                "payment_authorized",
                Role::System.as_str(),
                None,
                serde_json::json!({ "provider_ref": provider_ref }),
            );
            event_repo::insert(&mut tx, &event).await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// §4.3.2 — atomic accept. Exactly one concurrent caller wins.
pub async fn accept(pool: &PgPool, booking_id: Uuid, provider_id: Uuid) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    if booking.status != BookingStatus::PaidSearching {
        return Err(BookingError::state(StateError::InvalidTransition));
    }
    verify_provider_ownership(&booking, provider_id)?;
    if !booking.candidate_list.contains(provider_id) {
        return Err(BookingError::state(StateError::NotCandidate));
    }
    if !can_transition(BookingStatus::PaidSearching, BookingStatus::Accepted, Role::Provider) {
        return Err(BookingError::state(StateError::InvalidTransition));
    }

    let rows = booking_repo::accept(&mut tx, booking_id, provider_id).await?;
    if rows == 0 {
        return Err(BookingError::state(StateError::StatusDrift));
    }

    let event = NewBookingEvent::new(
        booking_id,
        "accept",
        Role::Provider.as_str(),
        Some(provider_id),
        serde_json::Value::Null,
    );
    event_repo::insert(&mut tx, &event).await?;

    tx.commit().await?;

    booking_repo::find(pool, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))
}

/// §4.3.3 — the general guarded mover shared by `travel`/`arrived`/`start`.
async fn guarded_transition(
    pool: &PgPool,
    booking_id: Uuid,
    provider_id: Uuid,
    from: BookingStatus,
    to: BookingStatus,
    action: &str,
    otp_guess: Option<u16>,
) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    if booking.status != from {
        return Err(BookingError::state(StateError::InvalidTransition));
    }
    verify_provider_ownership(&booking, provider_id)?;
    if !booking.is_claimed_by(provider_id) {
        return Err(BookingError::state(StateError::OwnedByOtherProvider));
    }
    if !can_transition(from, to, Role::Provider) {
        return Err(BookingError::state(StateError::InvalidTransition));
    }

    if let Some(guess) = otp_guess {
        let otp = booking
            .otp
            .ok_or_else(|| BookingError::state(StateError::InvalidOtp))?;
        if !otp.matches(guess) {
            return Err(BookingError::state(StateError::InvalidOtp));
        }
    }

    let set_cpu = if to == BookingStatus::CompletePending {
        Some(Some(Utc::now() + Duration::minutes(COMPLETE_GRACE_MINUTES)))
    } else {
        None
    };

    let rows = booking_repo::transition(&mut tx, booking_id, from, to, None, set_cpu).await?;
    if rows == 0 {
        return Err(BookingError::state(StateError::StatusDrift));
    }

    let event = NewBookingEvent::new(
        booking_id,
        action,
        Role::Provider.as_str(),
        Some(provider_id),
        serde_json::Value::Null,
    );
    event_repo::insert(&mut tx, &event).await?;

    tx.commit().await?;

    booking_repo::find(pool, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))
}

pub async fn travel(pool: &PgPool, booking_id: Uuid, provider_id: Uuid) -> Result<Booking, BookingError> {
    guarded_transition(
        pool,
        booking_id,
        provider_id,
        BookingStatus::Accepted,
        BookingStatus::EnRoute,
        "travel",
        None,
    )
    .await
}

pub async fn arrived(pool: &PgPool, booking_id: Uuid, provider_id: Uuid) -> Result<Booking, BookingError> {
    guarded_transition(
        pool,
        booking_id,
        provider_id,
        BookingStatus::EnRoute,
        BookingStatus::Arrived,
        "arrived",
        None,
    )
    .await
}

pub async fn start(
    pool: &PgPool,
    booking_id: Uuid,
    provider_id: Uuid,
    otp: u16,
) -> Result<Booking, BookingError> {
    guarded_transition(
        pool,
        booking_id,
        provider_id,
        BookingStatus::Arrived,
        BookingStatus::InProgress,
        "start",
        Some(otp),
    )
    .await
}

/// §4.3.6 — provider cancels from `ACCEPTED`/`EN_ROUTE`, returning the
/// booking to `PAID_SEARCHING` for re-dispatch among the remaining
/// candidates. `provider_id` is cleared; the candidate list is untouched.
pub async fn provider_cancel(
    pool: &PgPool,
    booking_id: Uuid,
    provider_id: Uuid,
) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    if !matches!(booking.status, BookingStatus::Accepted | BookingStatus::EnRoute) {
        return Err(BookingError::state(StateError::InvalidTransition));
    }
    if !booking.is_claimed_by(provider_id) {
        return Err(BookingError::state(StateError::OwnedByOtherProvider));
    }
    if !can_transition(booking.status, BookingStatus::PaidSearching, Role::Provider) {
        return Err(BookingError::state(StateError::InvalidTransition));
    }

    let rows = booking_repo::transition(
        &mut tx,
        booking_id,
        booking.status,
        BookingStatus::PaidSearching,
        Some(None),
        None,
    )
    .await?;
    if rows == 0 {
        return Err(BookingError::state(StateError::StatusDrift));
    }

    let event = NewBookingEvent::new(
        booking_id,
        "provider_cancel",
        Role::Provider.as_str(),
        Some(provider_id),
        serde_json::Value::Null,
    );
    event_repo::insert(&mut tx, &event).await?;

    let outbox = NewOutboxEntry::new(
        booking_id,
        booking.customer_id,
        "PROVIDER_CANCELLED",
        serde_json::json!({ "booking_id": booking_id }),
    );
    outbox_repo::insert(&mut tx, &outbox).await?;

    tx.commit().await?;

    booking_repo::find(pool, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))
}

/// §4.3.5 — user or provider cancel. A fee is charged only when the actor
/// is the customer and the booking had already progressed past dispatch
/// (`EN_ROUTE` or `ARRIVED`).
pub async fn cancel(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    booking_id: Uuid,
    role: Role,
    actor_id: Uuid,
) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    match role {
        Role::User => verify_customer_ownership(&booking, actor_id)?,
        Role::Provider => verify_provider_ownership(&booking, actor_id)?,
        _ => return Err(BookingError::Authorization("role cannot cancel".into())),
    }

    if !can_transition(booking.status, BookingStatus::Cancelled, role) {
        return Err(BookingError::state(StateError::InvalidTransition));
    }

    let fee_required = role == Role::User
        && matches!(booking.status, BookingStatus::EnRoute | BookingStatus::Arrived);

    payment_ledger::release(&mut tx, gateway, booking_id).await?;

    if fee_required {
        payment_ledger::fee(&mut tx, gateway, booking_id).await?;
    }

    let rows = booking_repo::transition(
        &mut tx,
        booking_id,
        booking.status,
        BookingStatus::Cancelled,
        None,
        None,
    )
    .await?;
    if rows == 0 {
        return Err(BookingError::state(StateError::StatusDrift));
    }

    let event = NewBookingEvent::new(
        booking_id,
        "cancel",
        role.as_str(),
        Some(actor_id),
        serde_json::json!({ "fee_charged": fee_required }),
    );
    event_repo::insert(&mut tx, &event).await?;

    tx.commit().await?;

    booking_repo::find(pool, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))
}

/// §4.3.4 — single-step complete: capture then `COMPLETE_PENDING`. If
/// capture fails, the audit trail is still committed and the booking stays
/// `IN_PROGRESS` so a retry of this same call is safe.
pub async fn complete(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    booking_id: Uuid,
    provider_id: Uuid,
) -> Result<CompleteOutcome, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    if booking.status != BookingStatus::InProgress {
        return Err(BookingError::state(StateError::InvalidTransition));
    }
    if !booking.is_claimed_by(provider_id) {
        return Err(BookingError::state(StateError::OwnedByOtherProvider));
    }

    if let Err(capture_err) = payment_ledger::capture(&mut tx, gateway, booking_id).await {
        let event = NewBookingEvent::new(
            booking_id,
            "capture_failed",
            Role::Provider.as_str(),
            Some(provider_id),
            serde_json::json!({ "error": capture_err.to_string() }),
        );
        event_repo::insert(&mut tx, &event).await?;

        let outbox = NewOutboxEntry::new(
            booking_id,
            booking.customer_id,
            "CAPTURE_FAILED",
            serde_json::json!({ "booking_id": booking_id }),
        );
        outbox_repo::insert(&mut tx, &outbox).await?;

        tx.commit().await?;
        return Ok(CompleteOutcome::CaptureFailed);
    }

    finish_complete_pending(&mut tx, &booking, provider_id, "complete").await?;
    tx.commit().await?;

    let booking = booking_repo::find(pool, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;
    Ok(CompleteOutcome::Completed(booking))
}

/// Two-step variant: moves to `COMPLETE_PENDING` without capturing.
pub async fn provider_complete(
    pool: &PgPool,
    booking_id: Uuid,
    provider_id: Uuid,
) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    if booking.status != BookingStatus::InProgress {
        return Err(BookingError::state(StateError::InvalidTransition));
    }
    if !booking.is_claimed_by(provider_id) {
        return Err(BookingError::state(StateError::OwnedByOtherProvider));
    }

    finish_complete_pending(&mut tx, &booking, provider_id, "provider_complete").await?;
    tx.commit().await?;

    booking_repo::find(pool, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))
}

async fn finish_complete_pending(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking: &Booking,
    provider_id: Uuid,
    action: &str,
) -> Result<(), BookingError> {
    if !can_transition(BookingStatus::InProgress, BookingStatus::CompletePending, Role::Provider) {
        return Err(BookingError::state(StateError::InvalidTransition));
    }

    let cpu = Some(Some(Utc::now() + Duration::minutes(COMPLETE_GRACE_MINUTES)));
    let rows = booking_repo::transition(
        tx,
        booking.id,
        BookingStatus::InProgress,
        BookingStatus::CompletePending,
        None,
        cpu,
    )
    .await?;
    if rows == 0 {
        return Err(BookingError::state(StateError::StatusDrift));
    }

    let event = NewBookingEvent::new(
        booking.id,
        action,
        Role::Provider.as_str(),
        Some(provider_id),
        serde_json::Value::Null,
    );
    event_repo::insert(tx, &event).await?;
    Ok(())
}

/// Customer confirmation of the two-step flow: captures and closes.
/// Idempotent — calling it again once `CLOSED` returns success untouched.
pub async fn confirm_complete(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    booking_id: Uuid,
    customer_id: Uuid,
) -> Result<CompleteOutcome, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    verify_customer_ownership(&booking, customer_id)?;

    if booking.status == BookingStatus::Closed {
        tx.commit().await?;
        return Ok(CompleteOutcome::Completed(booking));
    }

    if booking.status != BookingStatus::CompletePending {
        return Err(BookingError::state(StateError::InvalidTransition));
    }
    if !can_transition(BookingStatus::CompletePending, BookingStatus::Closed, Role::System) {
        return Err(BookingError::state(StateError::InvalidTransition));
    }

    if let Err(capture_err) = payment_ledger::capture(&mut tx, gateway, booking_id).await {
        let event = NewBookingEvent::new(
            booking_id,
            "capture_failed",
            Role::User.as_str(),
            Some(customer_id),
            serde_json::json!({ "error": capture_err.to_string() }),
        );
        event_repo::insert(&mut tx, &event).await?;
        tx.commit().await?;
        return Ok(CompleteOutcome::CaptureFailed);
    }

    let rows = booking_repo::transition(
        &mut tx,
        booking_id,
        BookingStatus::CompletePending,
        BookingStatus::Closed,
        None,
        None,
    )
    .await?;
    if rows == 0 {
        return Err(BookingError::state(StateError::StatusDrift));
    }

    let event = NewBookingEvent::new(
        booking_id,
        "confirm_complete",
        Role::User.as_str(),
        Some(customer_id),
        serde_json::Value::Null,
    );
    event_repo::insert(&mut tx, &event).await?;

    tx.commit().await?;

    let booking = booking_repo::find(pool, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;
    Ok(CompleteOutcome::Completed(booking))
}

/// §4.3.7 — customer flags an issue while `COMPLETE_PENDING`, provided the
/// 30-minute grace window has not yet closed.
pub async fn issue_flag(
    pool: &PgPool,
    booking_id: Uuid,
    customer_id: Uuid,
    reason: &str,
) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    verify_customer_ownership(&booking, customer_id)?;

    if booking.status != BookingStatus::CompletePending {
        return Err(BookingError::state(StateError::InvalidTransition));
    }
    match booking.complete_pending_until {
        Some(deadline) if Utc::now() <= deadline => {}
        _ => return Err(BookingError::state(StateError::GraceWindowExpired)),
    }
    if !can_transition(BookingStatus::CompletePending, BookingStatus::NeedsReview, Role::User) {
        return Err(BookingError::state(StateError::InvalidTransition));
    }

    let rows = booking_repo::transition(
        &mut tx,
        booking_id,
        BookingStatus::CompletePending,
        BookingStatus::NeedsReview,
        None,
        None,
    )
    .await?;
    if rows == 0 {
        return Err(BookingError::state(StateError::StatusDrift));
    }

    let event = NewBookingEvent::new(
        booking_id,
        "issue_flag",
        Role::User.as_str(),
        Some(customer_id),
        serde_json::json!({ "reason": reason }),
    );
    event_repo::insert(&mut tx, &event).await?;

    let outbox = NewOutboxEntry::new(
        booking_id,
        booking.customer_id,
        "NEEDS_REVIEW",
        serde_json::json!({ "booking_id": booking_id, "reason": reason }),
    );
    outbox_repo::insert(&mut tx, &outbox).await?;

    tx.commit().await?;

    booking_repo::find(pool, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))
}

/// Admin resolution of a flagged booking, to `CLOSED` or `CANCELLED`.
pub async fn admin_resolve(
    pool: &PgPool,
    booking_id: Uuid,
    admin_id: Uuid,
    to: BookingStatus,
) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = booking_repo::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    if booking.status != BookingStatus::NeedsReview {
        return Err(BookingError::state(StateError::InvalidTransition));
    }
    if !can_transition(BookingStatus::NeedsReview, to, Role::Admin) {
        return Err(BookingError::state(StateError::InvalidTransition));
    }

    let rows =
        booking_repo::transition(&mut tx, booking_id, BookingStatus::NeedsReview, to, None, None)
            .await?;
    if rows == 0 {
        return Err(BookingError::state(StateError::StatusDrift));
    }

    let event = NewBookingEvent::new(
        booking_id,
        "admin_resolve",
        Role::Admin.as_str(),
        Some(admin_id),
        serde_json::json!({ "to": to.as_str() }),
    );
    event_repo::insert(&mut tx, &event).await?;

    tx.commit().await?;

    booking_repo::find(pool, booking_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))
}

pub enum CompleteOutcome {
    Completed(Booking),
    CaptureFailed,
}
