use a2ui_agent::configuration::get_configuration;
use a2ui_agent::server::config::configure_app;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = get_configuration()?;
    let app = configure_app(&settings);

    let address = format!(
        "{}:{}",
        settings.application.host, settings.application.port
    );
    tracing::info!(%address, "starting agent server");
    let listener = TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
