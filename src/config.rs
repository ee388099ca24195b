use anyhow::{Context, Result};
use reqwest::Client;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_OMDB_BASE: &str = "https://www.omdbapi.com";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Runtime configuration, read once at startup and handed to the service.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub tmdb_api_key: Option<String>,
    pub omdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub omdb_base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tmdb_api_key: None,
            omdb_api_key: None,
            tmdb_base_url: DEFAULT_TMDB_BASE.to_string(),
            omdb_base_url: DEFAULT_OMDB_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", raw))?,
            None => defaults.port,
        };
        let request_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_secs("UPSTREAM_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };
        let connect_timeout = match get("UPSTREAM_CONNECT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_secs("UPSTREAM_CONNECT_TIMEOUT_SECS", &raw)?),
            None => defaults.connect_timeout,
        };

        Ok(Self {
            port,
            tmdb_api_key: get("TMDB_API_KEY"),
            omdb_api_key: get("OMDB_API_KEY"),
            tmdb_base_url: get("TMDB_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.tmdb_base_url),
            omdb_base_url: get("OMDB_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.omdb_base_url),
            request_timeout,
            connect_timeout,
        })
    }

    /// Shared HTTP client for both upstreams; every call is bounded by the configured timeouts.
    pub fn http_client(&self) -> Result<Client> {
        let user_agent = format!("moviehub/{}", env!("CARGO_PKG_VERSION"));
        Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build upstream HTTP client")
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// Missing keys are not fatal at startup: the affected endpoints answer 500 instead.
    pub fn log_summary(&self) {
        match (&self.tmdb_api_key, &self.omdb_api_key) {
            (Some(_), Some(_)) => info!("All upstream API keys are set"),
            (tmdb, omdb) => {
                if tmdb.is_none() {
                    warn!("TMDB_API_KEY is not set; catalog endpoints will return 500");
                }
                if omdb.is_none() {
                    warn!("OMDB_API_KEY is not set; movie details will return 500");
                }
            }
        }
        info!(
            tmdb = %self.tmdb_base_url,
            omdb = %self.omdb_base_url,
            timeout_secs = self.request_timeout.as_secs(),
            "Upstream configuration"
        );
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    let secs = raw
        .parse::<u64>()
        .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, raw))?;
    if secs == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(secs)
}
