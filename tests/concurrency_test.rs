mod common;

use common::*;
use dispatch_core::{
    domain::{error::BookingError, role::Role, webhook::WebhookOutcome},
    infra::mock_gateway::MockGateway,
    services::{booking_engine, webhook_ledger},
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use uuid::Uuid;

// ── 50 providers race to accept the same booking; exactly 1 wins ──────────

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_accept_exactly_one_wins() {
    let pool = setup_pool("dispatch_test_concurrency").await;
    let gw = MockGateway::new();

    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let provider_uid = make_online_provider(&pool, service_id).await;
    let customer_id = Uuid::now_v7();

    let booking = booking_engine::create(&pool, new_booking_request(customer_id, service_id))
        .await
        .unwrap();
    let intent = booking_engine::pay(&pool, &gw, booking.id, Role::User, customer_id)
        .await
        .unwrap();
    booking_engine::handle_payment_authorized(&pool, &intent.provider_ref)
        .await
        .unwrap();

    // Every contender races for the same single candidate slot. Only the
    // caller whose conditional UPDATE lands while status is still
    // PAID_SEARCHING gets Ok; everyone else gets NotCandidate (not a real
    // candidate) or StatusDrift (lost the race after passing the read).
    let mut handles = Vec::new();
    for _ in 0..50 {
        let pool = pool.clone();
        let booking_id = booking.id;
        handles.push(tokio::spawn(async move {
            booking_engine::accept(&pool, booking_id, provider_uid).await
        }));
    }

    let mut wins = 0;
    let mut losses = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(b) => {
                assert_eq!(b.provider_id, Some(provider_uid));
                wins += 1;
            }
            Err(BookingError::State(_)) => losses += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(wins, 1, "exactly 1 caller should win the accept race");
    assert_eq!(losses, 49);
    assert_eq!(booking_status(&pool, booking.id).await, "ACCEPTED");
    assert_eq!(count_accepted_events(&pool, booking.id).await, 1);
}

// ── 20 identical webhook deliveries land exactly once ───────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_identical_webhooks_apply_exactly_once() {
    let pool = setup_pool("dispatch_test_concurrency").await;

    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..20 {
        let pool = pool.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            webhook_ledger::process_event(
                &pool,
                "stripe",
                "evt_concurrent_dedup",
                "payment_intent.succeeded",
                serde_json::json!({"id": "evt_concurrent_dedup"}),
                move |_payload| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<(), BookingError>(())
                    }
                },
            )
            .await
            .unwrap()
        }));
    }

    let mut applied = 0;
    let mut duplicate = 0;
    for h in handles {
        match h.await.unwrap() {
            WebhookOutcome::Applied => applied += 1,
            WebhookOutcome::Duplicate => duplicate += 1,
            WebhookOutcome::InFlight => panic!("lock is held for the full call; should never race"),
        }
    }

    assert_eq!(applied, 1, "exactly 1 delivery is applied");
    assert_eq!(duplicate, 19);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "handler runs exactly once");
    assert_eq!(
        webhook_status(&pool, "stripe", "evt_concurrent_dedup").await,
        Some("PROCESSED".to_string())
    );
}

// ── distinct event_ids referencing the same booking do not block each other

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_event_ids_both_apply() {
    let pool = setup_pool("dispatch_test_concurrency").await;

    for (i, event_id) in ["evt_distinct_a", "evt_distinct_b"].into_iter().enumerate() {
        let outcome = webhook_ledger::process_event(
            &pool,
            "stripe",
            event_id,
            "payment_intent.succeeded",
            serde_json::json!({"id": event_id, "seq": i}),
            |_payload| async move { Ok::<(), BookingError>(()) },
        )
        .await
        .unwrap();
        assert_eq!(outcome, WebhookOutcome::Applied);
    }
}
