use {
    super::errors::ApiError,
    crate::{infra::postgres::service_repo, state::AppState},
    axum::{extract::State, routing::get, Json, Router},
    serde::Serialize,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/services", get(list))
}

#[derive(Serialize)]
struct ServiceView {
    id: uuid::Uuid,
    category: String,
    name: String,
    price_cents: i64,
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<ServiceView>>, ApiError> {
    let services = service_repo::list_active(&state.pool).await?;
    Ok(Json(
        services
            .into_iter()
            .map(|s| ServiceView {
                id: s.id,
                category: s.category,
                name: s.name,
                price_cents: s.price_cents,
            })
            .collect(),
    ))
}
