use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;
use gitbounties_listing::DEFAULT_PAGE_SIZE;

use crate::Cli;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Http feed the bounty pages are fetched from
    pub feed_url: Option<String>,
    /// Json file of bounties to serve instead of a feed
    pub fixture_path: Option<PathBuf>,
    pub page_size: usize,
    /// Sessions untouched for this long are closed
    pub session_ttl: Duration,
    pub bind_addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    /// Directory holding cert.pem and key.pem
    pub cert_dir: PathBuf,
    pub no_https: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            feed_url: None,
            fixture_path: None,
            page_size: DEFAULT_PAGE_SIZE,
            session_ttl: Duration::from_secs(30 * 60),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            allowed_origins: vec![
                "http://gitbounties.io:3000".into(),
                "https://gitbounties.io:3000".into(),
                "http://localhost:3000".into(),
            ],
            cert_dir: PathBuf::from("certs"),
            no_https: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Config::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let mut config = Config::default();

        config.feed_url = var("FEED_URL");
        config.fixture_path = var("FIXTURE_PATH").map(PathBuf::from);
        if let Some(page_size) = var("PAGE_SIZE") {
            config.page_size = page_size
                .parse()
                .with_context(|| format!("PAGE_SIZE must be a number, got {page_size}"))?;
        }
        if let Some(ttl) = var("SESSION_TTL_SECS") {
            let secs: u64 = ttl
                .parse()
                .with_context(|| format!("SESSION_TTL_SECS must be a number, got {ttl}"))?;
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(addr) = var("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("Invalid BIND_ADDR {addr}"))?;
        }
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(dir) = var("CERT_DIR") {
            config.cert_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Command line flags take precedence over the environment
    pub fn with_cli(mut self, cli: &Cli) -> Config {
        if cli.no_https {
            self.no_https = true;
        }
        if let Some(fixture) = &cli.fixture {
            self.fixture_path = Some(fixture.clone());
        }
        if let Some(page_size) = cli.page_size {
            self.page_size = page_size;
        }
        if let Some(dir) = &cli.cert_dir {
            self.cert_dir = dir.clone();
        }
        self
    }
}
