use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use http::{HeaderValue, Method, header};
use tokio::net::TcpListener;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use phonebridge::{ServerConfig, routes, state::AppState};

/// Rates at or above this disable the limiter (load testing).
const RATE_LIMIT_DISABLED_AT: u32 = 100_000;

/// Phone Bridge - voice assistant for incoming Twilio calls
#[derive(Parser, Debug)]
#[command(name = "phonebridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// YAML config file; values in it override the environment
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before the filter and config read the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();
    let config = match cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ServerConfig::from_file(&path)?
        }
        None => ServerConfig::from_env()?,
    };

    let socket_addr: SocketAddr = config
        .address()
        .parse()
        .with_context(|| format!("Invalid server address '{}'", config.address()))?;
    let tls = config.tls.clone();
    info!(backend = %config.model_name, stt = %config.stt_provider, "Starting phone bridge");

    let app = build_app(config).await?;

    match tls {
        Some(tls) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to load TLS certificates from {} and {}",
                        tls.cert_path.display(),
                        tls.key_path.display()
                    )
                })?;

            info!("Server listening on https://{} (TLS enabled)", socket_addr);
            axum_server::bind_rustls(socket_addr, rustls_config)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .context("TLS server error")?;
        }
        None => {
            info!("Server listening on http://{}", socket_addr);
            let listener = TcpListener::bind(&socket_addr).await?;
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await?;
        }
    }

    Ok(())
}

/// Build the routers and wrap them in CORS, rate limiting and security headers.
async fn build_app(config: ServerConfig) -> anyhow::Result<Router> {
    let cors = cors_layer(config.cors_allowed_origins.as_deref());
    let rps = config.rate_limit_requests_per_second;
    let burst = config.rate_limit_burst_size;

    let governor_layer = if rps < RATE_LIMIT_DISABLED_AT {
        let governor_config = GovernorConfigBuilder::default()
            .per_second(u64::from(rps))
            .burst_size(burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow!("Failed to build rate limiter config"))?;
        Some(GovernorLayer::new(governor_config))
    } else {
        info!(rps, "Rate limiting disabled");
        None
    };

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    let state = AppState::new(config).await?;

    Ok(routes::api::create_api_router()
        .merge(routes::telephony::create_telephony_router())
        .with_state(state)
        .layer(cors)
        .layer(tower::util::option_layer(governor_layer))
        .layer(security_headers))
}

/// Twilio calls the webhook server-to-server; CORS only matters for browser tooling.
fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let base = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE]);

    match origins {
        Some("*") => base.allow_origin(Any),
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            base.allow_origin(allowed)
        }
        None => base,
    }
}
