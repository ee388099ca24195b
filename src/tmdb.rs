use crate::models::{CastEntry, CatalogRecord, MovieCategory, RawResponse, SearchPage};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

const ERROR_BODY_PREVIEW: usize = 200;

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Primary catalog provider.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn fetch_movie(&self, id: &str) -> Result<CatalogRecord>;
    async fn fetch_credits(&self, id: &str) -> Result<Vec<CastEntry>>;
    async fn search_movies(&self, query: &str, page: u32) -> Result<SearchPage>;
    async fn trending(&self) -> Result<RawResponse>;
    async fn movie_list(&self, category: MovieCategory, page: u32) -> Result<RawResponse>;
    async fn genre_list(&self) -> Result<RawResponse>;
    async fn discover_by_genre(&self, genre_id: u32, page: u32) -> Result<RawResponse>;
}

impl TmdbClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "TMDB request");
        let res = self.request(url).send().await.context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}: {}", url, status, preview(&text)));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }

    async fn get_raw(&self, url: &str) -> Result<RawResponse> {
        debug!(url = %url, "TMDB proxy request");
        let res = self.request(url).send().await.context("request failed")?;
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = res.bytes().await.context("reading body failed")?;
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn fetch_movie(&self, id: &str) -> Result<CatalogRecord> {
        self.get_json(&movie_url(&self.base_url, id)).await
    }

    async fn fetch_credits(&self, id: &str) -> Result<Vec<CastEntry>> {
        #[derive(Deserialize)]
        struct Credits {
            #[serde(default)]
            cast: Option<Vec<CastEntry>>,
        }

        let url = format!("{}/credits", movie_url(&self.base_url, id));
        let credits: Credits = self.get_json(&url).await?;
        Ok(credits.cast.unwrap_or_default())
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<SearchPage> {
        self.get_json(&search_url(&self.base_url, query, page)).await
    }

    async fn trending(&self) -> Result<RawResponse> {
        let url = format!(
            "{}/discover/movie?include_adult=false&include_video=false&language=en-US&page=1&sort_by=popularity.desc",
            self.base_url
        );
        self.get_raw(&url).await
    }

    async fn movie_list(&self, category: MovieCategory, page: u32) -> Result<RawResponse> {
        let url = format!(
            "{}/movie/{}?language=en-US&page={}",
            self.base_url,
            category.as_path(),
            page
        );
        self.get_raw(&url).await
    }

    async fn genre_list(&self) -> Result<RawResponse> {
        let url = format!("{}/genre/movie/list?language=en-US", self.base_url);
        self.get_raw(&url).await
    }

    async fn discover_by_genre(&self, genre_id: u32, page: u32) -> Result<RawResponse> {
        let url = format!(
            "{}/discover/movie?include_adult=false&language=en-US&page={}&sort_by=popularity.desc&with_genres={}",
            self.base_url, page, genre_id
        );
        self.get_raw(&url).await
    }
}

/// Movie ids are opaque; encode them so they stay a single path segment.
pub fn movie_url(base_url: &str, id: &str) -> String {
    format!("{}/movie/{}", base_url, urlencoding::encode(id))
}

pub fn search_url(base_url: &str, query: &str, page: u32) -> String {
    format!(
        "{}/search/movie?query={}&include_adult=false&language=en-US&page={}",
        base_url,
        urlencoding::encode(query),
        page
    )
}

fn preview(text: &str) -> String {
    text.chars().take(ERROR_BODY_PREVIEW).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://api.themoviedb.org/3";

    fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
        let (_, query) = url.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    #[test]
    fn search_url_percent_encodes_query() {
        for original in [
            "the matrix",
            "amélie & nino",
            "what?=#hash/slash+plus",
            "100% 'quoted' \"title\"",
        ] {
            let url = search_url(BASE, original, 1);
            let encoded = query_param(&url, "query").expect("query param");
            assert!(!encoded.contains(' '));
            assert!(!encoded.contains('&'));
            assert!(!encoded.contains('#'));
            let decoded = urlencoding::decode(encoded).expect("valid utf-8");
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn search_url_keeps_fixed_parameters() {
        let url = search_url(BASE, "alien", 3);
        assert!(url.starts_with("https://api.themoviedb.org/3/search/movie?"));
        assert_eq!(query_param(&url, "include_adult"), Some("false"));
        assert_eq!(query_param(&url, "page"), Some("3"));
    }

    #[test]
    fn movie_url_keeps_id_in_one_segment() {
        assert_eq!(movie_url(BASE, "550"), format!("{BASE}/movie/550"));
        assert_eq!(
            movie_url(BASE, "../account"),
            format!("{BASE}/movie/..%2Faccount")
        );
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let long = "é".repeat(500);
        assert_eq!(preview(&long).chars().count(), ERROR_BODY_PREVIEW);
    }
}
