use {crate::config::Config, crate::domain::provider::PaymentGateway, std::sync::Arc};

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub config: Config,
}
