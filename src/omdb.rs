use crate::models::RatingsRecord;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

/// Secondary provider: ratings, awards and plot keyed by IMDb id.
#[async_trait]
pub trait OmdbApi: Send + Sync {
    async fn fetch_ratings(&self, imdb_id: &str) -> Result<RatingsRecord>;
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// OMDb answers lookup failures with HTTP 200 and `"Response": "False"`.
#[derive(Debug, Deserialize)]
struct OmdbEnvelope {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(flatten)]
    record: RatingsRecord,
}

impl OmdbClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl OmdbApi for OmdbClient {
    async fn fetch_ratings(&self, imdb_id: &str) -> Result<RatingsRecord> {
        debug!(imdb_id = %imdb_id, "OMDb request");
        let url = format!("{}/", self.base_url);
        let res = self
            .client
            .get(&url)
            .query(&[("i", imdb_id), ("apikey", self.api_key.as_str())])
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("OMDb lookup for {} -> {}", imdb_id, status));
        }
        parse_envelope(&text)
    }
}

fn parse_envelope(text: &str) -> Result<RatingsRecord> {
    let envelope: OmdbEnvelope = serde_json::from_str(text).context("JSON parse failed")?;
    if envelope
        .response
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case("false"))
    {
        return Err(anyhow!(
            "OMDb lookup rejected: {}",
            envelope.error.unwrap_or_else(|| "no reason given".to_string())
        ));
    }
    Ok(envelope.record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_lookup() {
        let body = r#"{
            "Title": "Fight Club",
            "Rated": "R",
            "Awards": "Nominated for 1 Oscar.",
            "Ratings": [{ "Source": "Metacritic", "Value": "67/100" }],
            "Plot": "An insomniac office worker...",
            "Response": "True"
        }"#;
        let record = parse_envelope(body).expect("record");
        assert_eq!(record.rated, "R");
        assert_eq!(record.ratings[0].value, "67/100");
    }

    #[test]
    fn rejects_false_response() {
        let body = r#"{ "Response": "False", "Error": "Incorrect IMDb ID." }"#;
        let err = parse_envelope(body).expect_err("should fail");
        assert!(err.to_string().contains("Incorrect IMDb ID."));
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_envelope("<html>oops</html>").is_err());
    }
}
