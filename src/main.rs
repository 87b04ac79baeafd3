use {
    dispatch_core::{config::Config, infra::{mock_gateway::MockGateway, stripe_gateway::StripeGateway}, services::ttl_sweeper, state::AppState, transport::http},
    std::sync::Arc,
    tokio::sync::watch,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "fatal configuration error");
            std::process::exit(1);
        }
    };

    let pool = match sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!(error = %e, "failed to run migrations");
        std::process::exit(1);
    }

    let gateway: Arc<dyn dispatch_core::domain::provider::PaymentGateway> =
        match &config.stripe_secret_key {
            Some(key) => Arc::new(StripeGateway::new(key)),
            None => Arc::new(MockGateway::new()),
        };

    let sweep_interval_secs = config.sweep_interval_secs;
    let state = AppState { pool: pool.clone(), gateway, config };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper_handle = tokio::spawn(ttl_sweeper::run(pool, sweep_interval_secs, shutdown_rx));

    let app = http::router().with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("listening on 0.0.0.0:3000");

    let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = serve.await {
        tracing::error!(error = %e, "server error");
    }

    let _ = shutdown_tx.send(true);
    let _ = sweeper_handle.await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
