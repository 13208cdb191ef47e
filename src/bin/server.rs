use revenue_insights::config::load_service_config;
use revenue_insights::server::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_service_config()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "revenue_insights={level},tower_http={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .init();

    let state = AppState::from_config(config.analysis.clone())?;
    tracing::info!(
        "Loaded {} dishes, density target {}",
        state.foods.len(),
        state.analyzer.config().density_target
    );

    let app = router(state);
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        "revenue-insights v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        address
    );

    axum::serve(listener, app).await?;
    Ok(())
}
