use crate::domain::error::BookingError;

/// Loaded once at startup via `dotenvy` + `std::env::var`, matching the
/// teacher's configuration discipline.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub app_env: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub sweep_interval_secs: u64,
}

const DEV_WEBHOOK_SECRET_FALLBACK: &str = "whsec_dev_fallback";

impl Config {
    pub fn load() -> Result<Self, BookingError> {
        dotenvy::dotenv().ok();

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let database_url = database_url_from_env()?;
        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY").ok().filter(|s| !s.is_empty());
        let stripe_webhook_secret =
            std::env::var("STRIPE_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());
        let sweep_interval_secs = std::env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let config = Self {
            database_url,
            app_env,
            stripe_secret_key,
            stripe_webhook_secret,
            sweep_interval_secs,
        };

        if config.is_production() && config.stripe_webhook_secret.is_none() {
            return Err(BookingError::Configuration(
                "STRIPE_WEBHOOK_SECRET is required when APP_ENV=production".into(),
            ));
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// The webhook secret to verify signatures against: the real one if
    /// configured, or — outside production only — a literal dev fallback.
    pub fn webhook_secret(&self) -> &str {
        self.stripe_webhook_secret
            .as_deref()
            .unwrap_or(DEV_WEBHOOK_SECRET_FALLBACK)
    }
}

fn database_url_from_env() -> Result<String, BookingError> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Ok(url);
    }

    let host = std::env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("PGPORT").unwrap_or_else(|_| "5432".to_string());
    let user = std::env::var("PGUSER").map_err(|_| {
        BookingError::Configuration("DATABASE_URL or PGUSER must be set".into())
    })?;
    let password = std::env::var("PGPASSWORD").unwrap_or_default();
    let database = std::env::var("PGDATABASE").map_err(|_| {
        BookingError::Configuration("DATABASE_URL or PGDATABASE must be set".into())
    })?;

    Ok(format!("postgres://{user}:{password}@{host}:{port}/{database}"))
}
