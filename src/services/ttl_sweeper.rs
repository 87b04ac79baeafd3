use {crate::infra::postgres::booking_repo, sqlx::PgPool, tokio::sync::watch};

/// Background task: periodically expires `PENDING_PAYMENT` bookings past
/// their 24-hour window. Shut down cooperatively via `shutdown`, in the
/// same shape as the teacher's `run_reaper`.
pub async fn run(pool: PgPool, interval_secs: u64, mut shutdown: watch::Receiver<bool>) {
    tracing::info!("ttl sweeper started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("ttl sweeper shutting down");
                return;
            }
            _ = tokio::time::sleep(std::time::Duration::from_secs(interval_secs)) => {}
        }

        match booking_repo::sweep_expired_pending_payment(&pool).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "swept expired bookings"),
            Err(e) => tracing::error!(error = %e, "sweep error"),
        }
    }
}

/// One-shot sweep for the admin-triggered endpoint. Returns the count of
/// bookings expired.
pub async fn sweep_once(pool: &PgPool) -> Result<u64, crate::domain::error::BookingError> {
    booking_repo::sweep_expired_pending_payment(pool).await
}
