use anyhow::Context;

use backoffice_api::{AuthConfig, build_app, config::bind_addr_from_env};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    backoffice_observability::init();

    let config = AuthConfig::from_env()?;
    let addr = bind_addr_from_env()?;
    let app = build_app(&config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
