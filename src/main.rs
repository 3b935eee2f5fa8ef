#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up VITRINE_UPSTREAM_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = vitrine_gateway::config::config();
    tracing::info!("Starting Vitrine gateway in {:?} mode", config.environment);

    // Allow tests or deployments to override port via env
    let port = std::env::var("VITRINE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok());

    vitrine_gateway::handlers::serve(port).await
}
