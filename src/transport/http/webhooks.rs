use {
    super::errors::ApiError,
    crate::{
        domain::{error::BookingError, webhook::WebhookOutcome},
        services::{booking_engine, webhook_ledger},
        state::AppState,
    },
    axum::{
        extract::{Path, State},
        http::HeaderMap,
        Json,
    },
};

/// `POST /webhooks/:provider` — only `stripe` is wired up; other provider
/// path segments are rejected before signature verification is attempted.
#[tracing::instrument(name = "webhook", skip_all, fields(provider = %provider))]
pub async fn handle(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    if provider != "stripe" {
        return Err(BookingError::Validation(format!("unknown webhook provider: {provider}")).into());
    }

    let sig = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| BookingError::WebhookSignature("missing Stripe-Signature header".into()))?;

    let event = stripe::Webhook::construct_event(&body, sig, state.config.webhook_secret())
        .map_err(|e| BookingError::WebhookSignature(e.to_string()))?;

    let event_id = event.id.to_string();
    let raw_event: serde_json::Value = serde_json::from_str(&body)?;
    let event_type = raw_event
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    let provider_ref = match &event.data.object {
        stripe::EventObject::PaymentIntent(pi) => Some(pi.id.to_string()),
        _ => None,
    };

    let handler_pool = state.pool.clone();
    let outcome = webhook_ledger::process_event(
        &state.pool,
        "stripe",
        &event_id,
        &event_type,
        raw_event,
        move |_payload| async move {
            if event_type.starts_with("payment_intent.") {
                if let Some(provider_ref) = provider_ref {
                    booking_engine::handle_payment_authorized(&handler_pool, &provider_ref).await?;
                }
            }
            Ok(())
        },
    )
    .await?;

    let status = match outcome {
        WebhookOutcome::Applied => "accepted",
        WebhookOutcome::Duplicate => "duplicate",
        WebhookOutcome::InFlight => "in_flight",
    };

    Ok(Json(serde_json::json!({ "status": status })))
}
