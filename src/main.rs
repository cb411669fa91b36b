use std::sync::Arc;

use beeno_api_rust::config;
use beeno_api_rust::database::PgStore;
use beeno_api_rust::handlers::{router, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("starting Beeno API in {:?} mode", config.environment);

    // The pool is lazy: the server comes up without a database and /health
    // reports degraded until it is reachable.
    let store = match PgStore::connect(&config.database) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    let app = router(AppState::new(store));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Beeno API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
