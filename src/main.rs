use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use tower_cookies::CookieManagerLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use visionhub::auth::configure_auth_routes;
use visionhub::config::AppConfig;
use visionhub::customers::configure_customer_routes;
use visionhub::dashboard::configure_dashboard_routes;
use visionhub::shared::state::AppState;
use visionhub::shared::utils::{create_conn, run_migrations};
use visionhub::tickets::configure_ticket_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::load()?;
    let pool = create_conn(&config.database)?;
    run_migrations(&pool)?;

    let media_root = config.media.storage_path.clone();
    std::fs::create_dir_all(&media_root)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(pool, config));

    let app = Router::new()
        .merge(configure_dashboard_routes())
        .merge(configure_auth_routes())
        .merge(configure_customer_routes())
        .merge(configure_ticket_routes(&state.config.media))
        .nest_service("/media", ServeDir::new(media_root))
        .nest_service("/static", ServeDir::new("static"))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
