use {
    super::{auth::AuthContext, errors::ApiError},
    crate::{
        domain::{booking::NewBookingRequest, error::BookingError, role::Role},
        services::booking_engine::{self, CompleteOutcome},
        state::AppState,
    },
    axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    },
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create).get(list_mine))
        .route("/bookings/claimed", get(list_claimed))
        .route("/bookings/{id}", get(get_one))
        .route("/bookings/{id}/pay", post(pay))
        .route("/bookings/{id}/accept", post(accept))
        .route("/bookings/{id}/travel", post(travel))
        .route("/bookings/{id}/arrived", post(arrived))
        .route("/bookings/{id}/start", post(start))
        .route("/bookings/{id}/complete", post(complete))
        .route("/bookings/{id}/provider-complete", post(provider_complete))
        .route("/bookings/{id}/confirm-complete", post(confirm_complete))
        .route("/bookings/{id}/cancel", post(cancel))
        .route("/bookings/{id}/provider_cancel", post(provider_cancel))
        .route("/bookings/{id}/issue", post(issue))
}

#[derive(Deserialize)]
struct CreateBody {
    service_id: Uuid,
    slot_id: Uuid,
    user_id: Uuid,
}

async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if auth.role != Role::User || auth.uid != body.user_id {
        return Err(BookingError::Authorization("user_id must equal caller".into()).into());
    }

    let booking = booking_engine::create(
        &state.pool,
        NewBookingRequest {
            customer_id: body.user_id,
            service_id: body.service_id,
            slot_id: body.slot_id,
        },
    )
    .await?;

    let booking = booking.redact_otp_for(auth.uid, auth.role == Role::Admin);
    Ok((StatusCode::CREATED, Json(serde_json::to_value(booking)?)))
}

async fn get_one(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let booking = crate::infra::postgres::booking_repo::find(&state.pool, id)
        .await?
        .ok_or_else(|| BookingError::NotFound("booking not found".into()))?;

    let visible = match auth.role {
        Role::Admin => true,
        Role::User => booking.is_owned_by(auth.uid),
        Role::Provider => booking.is_claimed_by(auth.uid) || booking.candidate_list.contains(auth.uid),
        Role::System => false,
    };
    if !visible {
        return Err(BookingError::Authorization("not visible to this caller".into()).into());
    }

    let booking = booking.redact_otp_for(auth.uid, auth.role == Role::Admin);
    Ok(Json(serde_json::to_value(booking)?))
}

#[derive(Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_mine(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bookings = crate::infra::postgres::booking_repo::list_for_customer(
        &state.pool,
        auth.uid,
        q.status.as_deref(),
        q.limit.unwrap_or(50),
        q.offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(serde_json::to_value(bookings)?))
}

async fn list_claimed(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bookings = crate::infra::postgres::booking_repo::list_claimed_by_provider(
        &state.pool,
        auth.uid,
        q.status.as_deref(),
        q.limit.unwrap_or(50),
        q.offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(serde_json::to_value(bookings)?))
}

#[derive(Serialize)]
struct PayResponse {
    payment_intent_id: String,
    status: &'static str,
    amount: i64,
    currency: &'static str,
}

async fn pay(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<PayResponse>, ApiError> {
    let intent =
        booking_engine::pay(&state.pool, state.gateway.as_ref(), id, auth.role, auth.uid).await?;
    Ok(Json(PayResponse {
        payment_intent_id: intent.provider_ref,
        status: intent.status.as_str(),
        amount: intent.money.amount().cents(),
        currency: intent.money.currency().as_str(),
    }))
}

async fn accept(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(auth, Role::Provider)?;
    let booking = booking_engine::accept(&state.pool, id, auth.uid).await?;
    Ok(Json(serde_json::json!({ "status": booking.status.as_str() })))
}

async fn travel(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(auth, Role::Provider)?;
    let booking = booking_engine::travel(&state.pool, id, auth.uid).await?;
    Ok(Json(serde_json::json!({ "status": booking.status.as_str() })))
}

async fn arrived(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(auth, Role::Provider)?;
    let booking = booking_engine::arrived(&state.pool, id, auth.uid).await?;
    Ok(Json(serde_json::json!({ "status": booking.status.as_str() })))
}

#[derive(Deserialize)]
struct StartBody {
    otp: u16,
}

async fn start(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<StartBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(auth, Role::Provider)?;
    let booking = booking_engine::start(&state.pool, id, auth.uid, body.otp).await?;
    Ok(Json(serde_json::json!({ "status": booking.status.as_str() })))
}

async fn complete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    require_role(auth, Role::Provider)?;
    match booking_engine::complete(&state.pool, state.gateway.as_ref(), id, auth.uid).await? {
        CompleteOutcome::Completed(booking) => {
            Ok((StatusCode::OK, Json(serde_json::json!({ "status": booking.status.as_str() }))))
        }
        CompleteOutcome::CaptureFailed => Ok((
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "status": "CAPTURE_FAILED" })),
        )),
    }
}

async fn provider_complete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(auth, Role::Provider)?;
    let booking = booking_engine::provider_complete(&state.pool, id, auth.uid).await?;
    Ok(Json(serde_json::json!({ "status": booking.status.as_str() })))
}

async fn confirm_complete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    require_role(auth, Role::User)?;
    match booking_engine::confirm_complete(&state.pool, state.gateway.as_ref(), id, auth.uid).await? {
        CompleteOutcome::Completed(booking) => {
            Ok((StatusCode::OK, Json(serde_json::json!({ "status": booking.status.as_str() }))))
        }
        CompleteOutcome::CaptureFailed => Ok((
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "status": "CAPTURE_FAILED" })),
        )),
    }
}

async fn cancel(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let booking =
        booking_engine::cancel(&state.pool, state.gateway.as_ref(), id, auth.role, auth.uid).await?;
    Ok(Json(serde_json::json!({ "status": booking.status.as_str() })))
}

async fn provider_cancel(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(auth, Role::Provider)?;
    let booking = booking_engine::provider_cancel(&state.pool, id, auth.uid).await?;
    Ok(Json(serde_json::json!({ "status": booking.status.as_str() })))
}

#[derive(Deserialize)]
struct IssueBody {
    reason: String,
}

async fn issue(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<IssueBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(auth, Role::User)?;
    if body.reason.trim().len() < 5 {
        return Err(BookingError::Validation("reason must be at least 5 characters".into()).into());
    }
    let booking = booking_engine::issue_flag(&state.pool, id, auth.uid, &body.reason).await?;
    Ok(Json(serde_json::json!({ "status": booking.status.as_str() })))
}

fn require_role(auth: AuthContext, expected: Role) -> Result<(), ApiError> {
    if auth.role != expected {
        return Err(BookingError::Authorization(format!("requires {} role", expected.as_str())).into());
    }
    Ok(())
}
