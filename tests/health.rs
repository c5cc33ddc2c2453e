use std::time::Duration;

use axum::extract::State;
use sea_orm::SqlxPostgresConnector;
use sgd_studio_api::{config::AppConfig, routes::health::health_check, state::AppState};
use sqlx::postgres::PgPoolOptions;

fn unreachable_state() -> anyhow::Result<AppState> {
    // nothing listens on port 1, so every query fails fast
    let database_url = "postgres://u:p@127.0.0.1:1/none";
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy(database_url)?;
    let orm = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        frontend_url: "http://localhost:5173".into(),
        upload_dir: "uploads".into(),
        max_upload_bytes: 1024,
        sensitive_max_attempts: 5,
        sensitive_window_secs: 60,
    };
    Ok(AppState::new(pool, orm, config))
}

#[tokio::test]
async fn health_check_reports_degraded_without_database() -> anyhow::Result<()> {
    let state = unreachable_state()?;
    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "degraded");
    assert_eq!(data.database, "down");
    Ok(())
}
