use {
    super::{auth::AuthContext, errors::ApiError},
    crate::{domain::{error::BookingError, role::Role}, services::ttl_sweeper, state::AppState},
    axum::{extract::State, routing::post, Json, Router},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/sweep", post(sweep))
}

async fn sweep(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<serde_json::Value>, ApiError> {
    if auth.role != Role::Admin {
        return Err(BookingError::Authorization("requires admin role".into()).into());
    }

    let swept = ttl_sweeper::sweep_once(&state.pool).await?;
    Ok(Json(serde_json::json!({ "swept": swept })))
}
