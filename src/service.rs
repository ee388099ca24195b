//! Movie aggregation: combines TMDB catalog and cast data with OMDb ratings, and
//! fronts the TMDB list endpoints that are relayed verbatim.
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{CastEntry, CombinedResult, MovieCategory, RatingsRecord, RawResponse, SearchPage};
use crate::omdb::{OmdbApi, OmdbClient};
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

const TMDB: &str = "TMDB";
const TMDB_KEY: &str = "TMDB_API_KEY";
const OMDB_KEY: &str = "OMDB_API_KEY";

/// An upstream is `None` when its credential is missing; operations needing it fail with
/// [`ApiError::Config`] before any outbound call.
#[derive(Clone)]
pub struct MovieService {
    tmdb: Option<Arc<dyn TmdbApi>>,
    omdb: Option<Arc<dyn OmdbApi>>,
}

impl MovieService {
    pub fn new(tmdb: Option<Arc<dyn TmdbApi>>, omdb: Option<Arc<dyn OmdbApi>>) -> Self {
        Self { tmdb, omdb }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = config.http_client()?;
        let tmdb = config.tmdb_api_key.as_ref().map(|key| {
            Arc::new(TmdbClient::new(http.clone(), &config.tmdb_base_url, key)) as Arc<dyn TmdbApi>
        });
        let omdb = config.omdb_api_key.as_ref().map(|key| {
            Arc::new(OmdbClient::new(http.clone(), &config.omdb_base_url, key)) as Arc<dyn OmdbApi>
        });
        Ok(Self::new(tmdb, omdb))
    }

    fn tmdb(&self) -> Result<&Arc<dyn TmdbApi>, ApiError> {
        self.tmdb.as_ref().ok_or(ApiError::Config(TMDB_KEY))
    }

    fn omdb(&self) -> Result<&Arc<dyn OmdbApi>, ApiError> {
        self.omdb.as_ref().ok_or(ApiError::Config(OMDB_KEY))
    }

    /// Catalog record is mandatory; cast and ratings degrade to empty on any failure.
    pub async fn movie_details(&self, movie_id: &str) -> Result<CombinedResult, ApiError> {
        let tmdb = self.tmdb()?;
        let omdb = self.omdb()?;

        let (movie, credits) = tokio::join!(tmdb.fetch_movie(movie_id), tmdb.fetch_credits(movie_id));
        let movie = movie.map_err(|e| ApiError::upstream(TMDB, e))?;

        let cast = match credits {
            Ok(cast) => cast,
            Err(e) => {
                warn!(movie_id = %movie_id, "Could not fetch TMDB credits: {:#}", e);
                Vec::<CastEntry>::new()
            }
        };

        let omdb_details = match movie.cross_reference_id() {
            None => {
                debug!(movie_id = %movie_id, "No IMDb id on TMDB record, skipping OMDb");
                RatingsRecord::default()
            }
            Some(imdb_id) => match omdb.fetch_ratings(imdb_id).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        movie_id = %movie_id,
                        imdb_id = %imdb_id,
                        "Could not fetch from OMDb: {:#}",
                        e
                    );
                    RatingsRecord::default()
                }
            },
        };

        info!(
            movie_id = %movie_id,
            title = %movie.title,
            cast = cast.len(),
            has_ratings = !omdb_details.is_empty(),
            "Assembled movie details"
        );
        Ok(CombinedResult {
            tmdb: movie,
            omdb: omdb_details,
            cast,
        })
    }

    /// Blank queries are rejected; anything else is forwarded verbatim. A zero-hit search
    /// yields the canonical no-results page.
    pub async fn search(&self, query: &str, page: u32) -> Result<SearchPage, ApiError> {
        let tmdb = self.tmdb()?;
        if query.trim().is_empty() {
            return Err(ApiError::EmptyQuery);
        }

        let results = tmdb
            .search_movies(query, page)
            .await
            .map_err(|e| ApiError::upstream(TMDB, e))?;
        if results.total_results == 0 {
            debug!(query = %query, "Search returned no results");
            return Ok(SearchPage::no_results());
        }
        Ok(results)
    }

    pub async fn trending(&self) -> Result<RawResponse, ApiError> {
        let tmdb = self.tmdb()?;
        tmdb.trending().await.map_err(|e| ApiError::upstream(TMDB, e))
    }

    pub async fn movie_list(&self, category: &str, page: u32) -> Result<RawResponse, ApiError> {
        let tmdb = self.tmdb()?;
        let category: MovieCategory = category
            .parse()
            .map_err(|_| ApiError::validation("Invalid movie category specified."))?;
        tmdb.movie_list(category, page)
            .await
            .map_err(|e| ApiError::upstream(TMDB, e))
    }

    pub async fn genres(&self) -> Result<RawResponse, ApiError> {
        let tmdb = self.tmdb()?;
        tmdb.genre_list().await.map_err(|e| ApiError::upstream(TMDB, e))
    }

    pub async fn discover_by_genre(&self, genre_id: &str, page: u32) -> Result<RawResponse, ApiError> {
        let tmdb = self.tmdb()?;
        let genre_id = parse_genre_id(genre_id)
            .ok_or_else(|| ApiError::validation("Invalid genre id specified."))?;
        tmdb.discover_by_genre(genre_id, page)
            .await
            .map_err(|e| ApiError::upstream(TMDB, e))
    }
}

/// Page numbers from the query string: absent means 1, anything but a positive integer is rejected.
pub fn parse_page(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(value) => value
            .parse::<u32>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| ApiError::validation("Page must be a positive integer.")),
    }
}

fn parse_genre_id(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_with_default() {
        assert_eq!(parse_page(None).ok(), Some(1));
        assert_eq!(parse_page(Some("")).ok(), Some(1));
        assert_eq!(parse_page(Some("7")).ok(), Some(7));
        assert!(parse_page(Some("0")).is_err());
        assert!(parse_page(Some("-2")).is_err());
        assert!(parse_page(Some("two")).is_err());
    }

    #[test]
    fn parses_genre_id_only_for_digits() {
        assert_eq!(parse_genre_id("28"), Some(28));
        assert_eq!(parse_genre_id(" 878 "), Some(878));
        assert_eq!(parse_genre_id("0"), None);
        assert_eq!(parse_genre_id("+28"), None);
        assert_eq!(parse_genre_id("28&with_people=1"), None);
        assert_eq!(parse_genre_id(""), None);
    }

    #[tokio::test]
    async fn missing_credentials_are_config_errors() {
        let service = MovieService::new(None, None);
        assert!(matches!(service.trending().await, Err(ApiError::Config("TMDB_API_KEY"))));
        assert!(matches!(
            service.movie_details("550").await,
            Err(ApiError::Config("TMDB_API_KEY"))
        ));
    }
}
