use std::{collections::HashMap, path::PathBuf, sync::Arc};

use anyhow::{bail, Context};
use axum::{http::HeaderValue, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use config::Config;
use log::{debug, info, warn};
use reqwest::header;
use session::{spawn_sweeper, Sessions};
use source::{MemorySource, RemoteSource, Source};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod api;
mod config;
mod session;
mod source;

#[derive(Clone)]
pub struct AppState {
    sessions: Sessions,
    /// Where bounty pages are fetched from
    source: Arc<Source>,
    page_size: usize,
}

impl AppState {
    pub fn new(source: Source, page_size: usize) -> AppState {
        AppState {
            sessions: Arc::new(RwLock::new(HashMap::default())),
            source: Arc::new(source),
            page_size,
        }
    }

    pub async fn init(config: &Config) -> anyhow::Result<AppState> {
        let source = if let Some(path) = &config.fixture_path {
            Source::Memory(MemorySource::from_file(path).await?)
        } else if let Some(url) = &config.feed_url {
            info!("Fetching bounties from {url}");
            Source::Remote(RemoteSource::new(reqwest::Client::new(), url))
        } else {
            bail!("Either FIXTURE_PATH (or --fixture) or FEED_URL has to be set");
        };

        Ok(AppState::new(source, config.page_size))
    }
}

#[derive(Parser, Debug)]
#[command(name = "gitbounties-explorer")]
#[command(bin_name = "gitbounties-explorer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Flag to disable HTTPS
    #[arg(long)]
    no_https: bool,
    /// Serve bounties from this json file instead of the feed
    #[arg(long)]
    fixture: Option<PathBuf>,
    /// Number of bounties fetched per page
    #[arg(long)]
    page_size: Option<usize>,
    /// Directory containing cert.pem and key.pem
    #[arg(long)]
    cert_dir: Option<PathBuf>,
}

pub fn app(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid origin {origin}");
                None
            },
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .allow_origin(origins)
        .allow_credentials(true);

    Router::new()
        .merge(api::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp(None).init();

    let cli = Cli::parse();

    if dotenvy::dotenv().is_err() {
        warn!("Error reading .env file");
    } else if let Ok(vars) = dotenvy::dotenv_iter() {
        debug!("Loaded env vars =-=-=-=");
        for (key, val) in vars.flatten() {
            debug!("{}={}", key, val);
        }
    }

    let config = Config::from_env()?.with_cli(&cli);
    debug!("config {config:?}");

    let app_state = AppState::init(&config).await?;
    spawn_sweeper(app_state.sessions.clone(), config.session_ttl);
    let app = app(app_state, &config.allowed_origins);

    if config.no_https {
        info!("Starting server on {} with HTTPS disabled...", config.bind_addr);

        axum_server::bind(config.bind_addr)
            .serve(app.into_make_service())
            .await?;
    } else {
        info!("Starting server on {} with HTTPS...", config.bind_addr);

        let rustls_config = RustlsConfig::from_pem_file(
            config.cert_dir.join("cert.pem"),
            config.cert_dir.join("key.pem"),
        )
        .await
        .with_context(|| format!("Couldn't load certs from {}", config.cert_dir.display()))?;

        axum_server::bind_rustls(config.bind_addr, rustls_config)
            .serve(app.into_make_service())
            .await?;
    }

    Ok(())
}
