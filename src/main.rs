use std::sync::Arc;

use todo_oracle::config::AppConfig;
use todo_oracle::llm::create_provider;
use todo_oracle::server::{AppState, app};
use todo_oracle::store::{LibSqlBackend, TodoStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading any configuration.
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let store: Arc<dyn TodoStore> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {e}",
                    config.db_path.display()
                );
                std::process::exit(1);
            }),
    );

    // Credential is read exactly once, here. When absent the AI routes
    // answer 500 without ever touching the network.
    let llm = create_provider(&config);
    if llm.is_none() {
        tracing::warn!("DEEPSEEK_API_KEY not set; AI endpoints will return 500");
    }

    eprintln!("📝 todo-oracle v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening on: http://{}", config.bind_addr);
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!(
        "   AI proxy: {}",
        if llm.is_some() { "enabled" } else { "disabled (no key)" }
    );

    let state = AppState::new(store, llm);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
