//! Fetch combined TMDB + OMDb details for one movie and print the API response body.
//! Usage:
//!   cargo run --bin movie_details -- <tmdb_id>
//! Requires TMDB_API_KEY and OMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use moviehub::config::Config;
use moviehub::service::MovieService;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let movie_id = env::args()
        .nth(1)
        .context("usage: movie_details <tmdb_id>")?;

    let config = Config::from_env()?;
    let service = MovieService::from_config(&config)?;
    let details = service
        .movie_details(&movie_id)
        .await
        .with_context(|| format!("Failed to assemble details for movie {}", movie_id))?;

    println!("{}", serde_json::to_string_pretty(&details)?);
    if details.omdb.is_empty() {
        eprintln!("note: no OMDb ratings were merged (see warnings above)");
    }
    Ok(())
}
