use axum::body::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const NO_RESULTS_MESSAGE: &str = "No movies found matching your search.";

/// Upstream providers send `null` for absent strings and numbers; treat it like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

/// Canonical movie record from TMDB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub imdb_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub overview: String,
    #[serde(default, deserialize_with = "nullable")]
    pub poster_path: String,
    #[serde(default, deserialize_with = "nullable")]
    pub release_date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "nullable")]
    pub tagline: String,
    #[serde(default, deserialize_with = "nullable")]
    pub runtime: i64,
}

impl CatalogRecord {
    /// The IMDb id used to look the movie up on OMDb, if TMDB knows it.
    pub fn cross_reference_id(&self) -> Option<&str> {
        let id = self.imdb_id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// One billed cast member, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CastEntry {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub character: String,
    #[serde(default, deserialize_with = "nullable")]
    pub profile_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RatingSource {
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    #[serde(default, deserialize_with = "nullable")]
    pub value: String,
}

/// Ratings and awards from OMDb. The default value is the "no ratings" record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RatingsRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub rated: String,
    #[serde(default, deserialize_with = "nullable")]
    pub awards: String,
    #[serde(default, deserialize_with = "nullable")]
    pub ratings: Vec<RatingSource>,
    #[serde(default, deserialize_with = "nullable")]
    pub plot: String,
}

impl RatingsRecord {
    pub fn is_empty(&self) -> bool {
        self.rated.is_empty()
            && self.awards.is_empty()
            && self.ratings.is_empty()
            && self.plot.is_empty()
    }
}

/// Response body of the movie details endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub tmdb: CatalogRecord,
    pub omdb: RatingsRecord,
    pub cast: Vec<CastEntry>,
}

/// Paged search envelope. Result items are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default, deserialize_with = "nullable")]
    pub page: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub results: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub total_pages: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub total_results: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SearchPage {
    pub fn no_results() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
            message: Some(NO_RESULTS_MESSAGE.to_string()),
        }
    }
}

/// An upstream response relayed to the caller as-is.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// TMDB movie lists that may be proxied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieCategory {
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
}

impl MovieCategory {
    pub fn as_path(&self) -> &'static str {
        match self {
            MovieCategory::Popular => "popular",
            MovieCategory::TopRated => "top_rated",
            MovieCategory::Upcoming => "upcoming",
            MovieCategory::NowPlaying => "now_playing",
        }
    }
}

impl FromStr for MovieCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular" => Ok(MovieCategory::Popular),
            "top_rated" => Ok(MovieCategory::TopRated),
            "upcoming" => Ok(MovieCategory::Upcoming),
            "now_playing" => Ok(MovieCategory::NowPlaying),
            _ => Err(anyhow::anyhow!("unknown movie category '{}'", s)),
        }
    }
}

impl fmt::Display for MovieCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_record_tolerates_nulls_and_missing_fields() {
        let value = json!({
            "id": 550,
            "imdb_id": null,
            "title": "Fight Club",
            "poster_path": null,
            "genres": [{ "id": 18, "name": "Drama" }],
            "runtime": null
        });
        let record: CatalogRecord = serde_json::from_value(value).expect("catalog deserialize");
        assert_eq!(record.id, 550);
        assert_eq!(record.imdb_id, "");
        assert_eq!(record.poster_path, "");
        assert_eq!(record.tagline, "");
        assert_eq!(record.runtime, 0);
        assert_eq!(record.genres[0].name, "Drama");
        assert_eq!(record.cross_reference_id(), None);
    }

    #[test]
    fn catalog_record_rejects_wrong_types() {
        let value = json!({ "id": "not-a-number", "title": 5 });
        assert!(serde_json::from_value::<CatalogRecord>(value).is_err());
    }

    #[test]
    fn ratings_record_uses_omdb_field_names() {
        let value = json!({
            "Rated": "R",
            "Awards": "Nominated for 1 Oscar.",
            "Ratings": [
                { "Source": "Internet Movie Database", "Value": "8.8/10" },
                { "Source": "Rotten Tomatoes", "Value": "79%" }
            ],
            "Plot": "An insomniac office worker...",
            "Response": "True"
        });
        let record: RatingsRecord = serde_json::from_value(value).expect("ratings deserialize");
        assert_eq!(record.ratings.len(), 2);
        assert_eq!(record.ratings[1].source, "Rotten Tomatoes");

        let out = serde_json::to_value(&record).expect("serialize");
        assert_eq!(out["Rated"], "R");
        assert_eq!(out["Ratings"][0]["Value"], "8.8/10");
    }

    #[test]
    fn empty_ratings_serialize_with_empty_array() {
        let out = serde_json::to_value(RatingsRecord::default()).expect("serialize");
        assert_eq!(
            out,
            json!({ "Rated": "", "Awards": "", "Ratings": [], "Plot": "" })
        );
    }

    #[test]
    fn parses_only_allowed_categories() {
        assert_eq!("popular".parse::<MovieCategory>().ok(), Some(MovieCategory::Popular));
        assert_eq!(
            "now_playing".parse::<MovieCategory>().ok(),
            Some(MovieCategory::NowPlaying)
        );
        assert!("Popular".parse::<MovieCategory>().is_err());
        assert!("../account".parse::<MovieCategory>().is_err());
        assert!("".parse::<MovieCategory>().is_err());
    }

    #[test]
    fn no_results_envelope_carries_message() {
        let out = serde_json::to_value(SearchPage::no_results()).expect("serialize");
        assert_eq!(out["message"], NO_RESULTS_MESSAGE);
        assert_eq!(out["page"], 1);
        assert_eq!(out["total_pages"], 0);
        assert_eq!(out["results"], json!([]));
    }
}
