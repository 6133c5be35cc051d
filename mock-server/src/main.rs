use mock_odoo::{ServerConfig, ServerState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mock_odoo=info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    mock_odoo::serve(listener, ServerState::new(&config.admin_password)).await
}
