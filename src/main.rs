use tracing_subscriber::{fmt, EnvFilter};
use tweeter::{app, config::Config, db, AppState};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();
    let db_pool = db::connect(&config.database_url, 16).await.unwrap();

    let router = app(AppState { db_pool });

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap();
    axum::serve(listener, router).await.unwrap();
}
