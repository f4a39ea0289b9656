use anyhow::{Context, Result};
use clap::Parser;
use device_vitals::{cli, config, db, openapi, routes, state};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

/// Binds the HTTP listener, pointing at `--port` when the address is taken.
async fn listen(host: &str, port: u16) -> Result<TcpListener> {
    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr).await.map_err(|err| {
        let hint = match err.kind() {
            std::io::ErrorKind::AddrInUse => {
                " (address in use; stop the other listener or pass a free --port)"
            }
            _ => "",
        };
        anyhow::anyhow!("cannot listen on {addr}: {err}{hint}")
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!("{}", serde_json::to_string_pretty(&openapi::openapi_json())?);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::VitalsConfig::from_env()?;
    let pool = db::connect_lazy(&config.database_url)?;
    db::ensure_schema(&pool).await?;
    tracing::info!(
        analytics_window = config.analytics_window,
        history_max_limit = config.history_max_limit,
        "vitals store ready"
    );

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .methods(vec![
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
            ])
            .use_headers()
            .finish()
            .context("failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();
    std::thread::spawn(move || loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
        governor_limiter.retain_recent();
    });

    let state = state::AppState {
        config,
        db: pool.clone(),
    };
    let app = routes::router(state).layer(GovernorLayer::new(governor_conf));

    let listener = listen(&args.host, args.port).await?;
    tracing::info!(addr = %listener.local_addr()?, "device-vitals listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::listen;
    use anyhow::Result;

    #[tokio::test]
    async fn taken_port_suggests_another() -> Result<()> {
        let Ok(held) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            // Binding may be forbidden in sandboxed runners.
            return Ok(());
        };
        let port = held.local_addr()?.port();

        let message = match listen("127.0.0.1", port).await {
            Ok(_) => anyhow::bail!("second bind on {port} succeeded"),
            Err(err) => err.to_string(),
        };
        assert!(message.contains(&format!("127.0.0.1:{port}")));
        assert!(message.contains("--port"));
        drop(held);
        Ok(())
    }

    #[tokio::test]
    async fn free_port_binds() -> Result<()> {
        if let Ok(listener) = listen("127.0.0.1", 0).await {
            assert_ne!(listener.local_addr()?.port(), 0);
        }
        Ok(())
    }
}
