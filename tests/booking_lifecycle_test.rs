mod common;

use common::*;
use dispatch_core::{
    domain::{
        error::BookingError,
        provider::PaymentGateway,
        role::Role,
        state_machine::BookingStatus,
    },
    infra::mock_gateway::MockGateway,
    services::booking_engine::{self, CompleteOutcome},
};
use uuid::Uuid;

fn gateway() -> MockGateway {
    MockGateway::new()
}

async fn authorize(pool: &sqlx::PgPool, gw: &dyn PaymentGateway, booking_id: Uuid, customer_id: Uuid) {
    let intent = booking_engine::pay(pool, gw, booking_id, Role::User, customer_id)
        .await
        .expect("pay failed");
    booking_engine::handle_payment_authorized(pool, &intent.provider_ref)
        .await
        .expect("authorize failed");
}

// ── single-step flow: create -> pay -> accept -> travel -> arrived -> start
// -> complete -> confirm_complete ───────────────────────────────────────────

#[tokio::test]
async fn full_happy_path_reaches_closed() {
    let pool = setup_pool("dispatch_test_lifecycle").await;
    let gw = gateway();

    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let provider_uid = make_online_provider(&pool, service_id).await;
    let customer_id = Uuid::now_v7();

    let booking = booking_engine::create(&pool, new_booking_request(customer_id, service_id))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::PendingPayment);
    assert!(booking.candidate_list.contains(provider_uid));

    authorize(&pool, &gw, booking.id, customer_id).await;
    assert_eq!(booking_status(&pool, booking.id).await, "PAID_SEARCHING");

    let booking = booking_engine::accept(&pool, booking.id, provider_uid)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Accepted);
    assert_eq!(booking.provider_id, Some(provider_uid));

    let booking = booking_engine::travel(&pool, booking.id, provider_uid).await.unwrap();
    assert_eq!(booking.status, BookingStatus::EnRoute);

    let booking = booking_engine::arrived(&pool, booking.id, provider_uid).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Arrived);

    let otp = booking.otp.unwrap().value();
    let booking = booking_engine::start(&pool, booking.id, provider_uid, otp)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::InProgress);

    let outcome = booking_engine::complete(&pool, &gw, booking.id, provider_uid)
        .await
        .unwrap();
    let booking = match outcome {
        CompleteOutcome::Completed(b) => b,
        CompleteOutcome::CaptureFailed => panic!("mock gateway should never fail capture"),
    };
    assert_eq!(booking.status, BookingStatus::CompletePending);
    assert!(booking.complete_pending_until.is_some());

    let outcome = booking_engine::confirm_complete(&pool, &gw, booking.id, customer_id)
        .await
        .unwrap();
    let booking = match outcome {
        CompleteOutcome::Completed(b) => b,
        CompleteOutcome::CaptureFailed => panic!("mock gateway should never fail capture"),
    };
    assert_eq!(booking.status, BookingStatus::Closed);

    let intents = payment_intent_statuses(&pool, booking.id).await;
    assert_eq!(intents, vec![("main".to_string(), "SUCCEEDED".to_string())]);

    let actions = event_actions(&pool, booking.id).await;
    assert_eq!(
        actions,
        vec![
            "create_booking",
            "payment_authorized",
            "accept",
            "travel",
            "arrived",
            "start",
            "complete",
            "confirm_complete",
        ]
    );

    // idempotent: calling confirm_complete again on an already-Closed booking
    // returns success untouched rather than erroring.
    let outcome = booking_engine::confirm_complete(&pool, &gw, booking.id, customer_id)
        .await
        .unwrap();
    assert!(matches!(outcome, CompleteOutcome::Completed(b) if b.status == BookingStatus::Closed));
}

// ── admin can pay on a customer's behalf ────────────────────────────────────

#[tokio::test]
async fn admin_can_pay_on_customers_behalf() {
    let pool = setup_pool("dispatch_test_lifecycle").await;
    let gw = gateway();

    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let _provider_uid = make_online_provider(&pool, service_id).await;
    let customer_id = Uuid::now_v7();
    let admin_id = Uuid::now_v7();

    let booking = booking_engine::create(&pool, new_booking_request(customer_id, service_id))
        .await
        .unwrap();

    let intent = booking_engine::pay(&pool, &gw, booking.id, Role::Admin, admin_id)
        .await
        .expect("admin should be able to pay on the customer's behalf");
    booking_engine::handle_payment_authorized(&pool, &intent.provider_ref)
        .await
        .unwrap();

    assert_eq!(booking_status(&pool, booking.id).await, "PAID_SEARCHING");
}

// ── wrong otp is rejected, right-sized error ────────────────────────────────

#[tokio::test]
async fn start_rejects_wrong_otp() {
    let pool = setup_pool("dispatch_test_lifecycle").await;
    let gw = gateway();

    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let provider_uid = make_online_provider(&pool, service_id).await;
    let customer_id = Uuid::now_v7();

    let booking = booking_engine::create(&pool, new_booking_request(customer_id, service_id))
        .await
        .unwrap();
    authorize(&pool, &gw, booking.id, customer_id).await;
    let booking = booking_engine::accept(&pool, booking.id, provider_uid).await.unwrap();
    let booking = booking_engine::travel(&pool, booking.id, provider_uid).await.unwrap();
    let booking = booking_engine::arrived(&pool, booking.id, provider_uid).await.unwrap();

    let real_otp = booking.otp.unwrap().value();
    let wrong_otp = if real_otp == 9999 { 1000 } else { real_otp + 1 };

    let err = booking_engine::start(&pool, booking.id, provider_uid, wrong_otp)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::State(dispatch_core::domain::error::StateError::InvalidOtp)
    ));

    // status untouched
    assert_eq!(booking_status(&pool, booking.id).await, "ARRIVED");
}

// ── cancel after dispatch charges the fee; early cancel does not ───────────

#[tokio::test]
async fn cancel_after_en_route_charges_fee() {
    let pool = setup_pool("dispatch_test_lifecycle").await;
    let gw = gateway();

    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let provider_uid = make_online_provider(&pool, service_id).await;
    let customer_id = Uuid::now_v7();

    let booking = booking_engine::create(&pool, new_booking_request(customer_id, service_id))
        .await
        .unwrap();
    authorize(&pool, &gw, booking.id, customer_id).await;
    let booking = booking_engine::accept(&pool, booking.id, provider_uid).await.unwrap();
    let booking = booking_engine::travel(&pool, booking.id, provider_uid).await.unwrap();

    let booking = booking_engine::cancel(&pool, &gw, booking.id, Role::User, customer_id)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    let intents = payment_intent_statuses(&pool, booking.id).await;
    assert_eq!(
        intents,
        vec![
            ("main".to_string(), "CANCELLED".to_string()),
            ("fee".to_string(), "SUCCEEDED".to_string()),
        ]
    );
}

#[tokio::test]
async fn cancel_before_dispatch_charges_no_fee() {
    let pool = setup_pool("dispatch_test_lifecycle").await;
    let gw = gateway();

    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let _provider_uid = make_online_provider(&pool, service_id).await;
    let customer_id = Uuid::now_v7();

    let booking = booking_engine::create(&pool, new_booking_request(customer_id, service_id))
        .await
        .unwrap();
    authorize(&pool, &gw, booking.id, customer_id).await;

    let booking = booking_engine::cancel(&pool, &gw, booking.id, Role::User, customer_id)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    let intents = payment_intent_statuses(&pool, booking.id).await;
    assert_eq!(intents, vec![("main".to_string(), "CANCELLED".to_string())]);
}

// ── provider cancel re-dispatches, clears provider_id, keeps candidate list ─

#[tokio::test]
async fn provider_cancel_returns_to_paid_searching() {
    let pool = setup_pool("dispatch_test_lifecycle").await;
    let gw = gateway();

    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let provider_uid = make_online_provider(&pool, service_id).await;
    let customer_id = Uuid::now_v7();

    let booking = booking_engine::create(&pool, new_booking_request(customer_id, service_id))
        .await
        .unwrap();
    authorize(&pool, &gw, booking.id, customer_id).await;
    let booking = booking_engine::accept(&pool, booking.id, provider_uid).await.unwrap();

    let booking = booking_engine::provider_cancel(&pool, booking.id, provider_uid)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::PaidSearching);
    assert_eq!(booking.provider_id, None);
    assert!(booking.candidate_list.contains(provider_uid));
}

// ── two-step complete: provider_complete -> issue_flag -> admin_resolve ────

#[tokio::test]
async fn issue_flag_inside_grace_window_routes_to_admin() {
    let pool = setup_pool("dispatch_test_lifecycle").await;
    let gw = gateway();

    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let provider_uid = make_online_provider(&pool, service_id).await;
    let customer_id = Uuid::now_v7();

    let booking = booking_engine::create(&pool, new_booking_request(customer_id, service_id))
        .await
        .unwrap();
    authorize(&pool, &gw, booking.id, customer_id).await;
    let booking = booking_engine::accept(&pool, booking.id, provider_uid).await.unwrap();
    let booking = booking_engine::travel(&pool, booking.id, provider_uid).await.unwrap();
    let booking = booking_engine::arrived(&pool, booking.id, provider_uid).await.unwrap();
    let otp = booking.otp.unwrap().value();
    let booking = booking_engine::start(&pool, booking.id, provider_uid, otp).await.unwrap();

    let booking = booking_engine::provider_complete(&pool, booking.id, provider_uid)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::CompletePending);

    let booking = booking_engine::issue_flag(&pool, booking.id, customer_id, "wrong item delivered")
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::NeedsReview);

    let booking = booking_engine::admin_resolve(
        &pool,
        booking.id,
        Uuid::now_v7(),
        BookingStatus::Cancelled,
    )
    .await
    .unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
}

// ── ttl sweeper expires stale PENDING_PAYMENT bookings ──────────────────────

#[tokio::test]
async fn sweep_expires_stale_pending_payment_bookings() {
    use dispatch_core::services::ttl_sweeper;

    let pool = setup_pool("dispatch_test_lifecycle").await;

    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let customer_id = Uuid::now_v7();
    let booking = booking_engine::create(&pool, new_booking_request(customer_id, service_id))
        .await
        .unwrap();

    sqlx::query!(
        "UPDATE bookings SET created_at = now() - interval '25 hours' WHERE id = $1",
        booking.id,
    )
    .execute(&pool)
    .await
    .unwrap();

    let swept = ttl_sweeper::sweep_once(&pool).await.unwrap();
    assert!(swept >= 1);
    assert_eq!(booking_status(&pool, booking.id).await, "EXPIRED");
}
