use crate::config::Config;
use crate::error::ApiError;
use crate::models::{CombinedResult, RawResponse, SearchPage};
use crate::service::{parse_page, MovieService};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MovieService>,
}

impl AppState {
    pub fn new(service: MovieService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    page: Option<String>,
}

pub async fn run_server(config: Config) -> Result<()> {
    let service = MovieService::from_config(&config)?;
    let app = build_router(AppState::new(service));

    let addr = config.bind_addr();
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::<AppState>::new()
        .route("/trending", get(trending))
        .route("/search", get(search))
        .route("/movie/:id", get(movie_details))
        .route("/movies/:category", get(movie_list))
        .route("/genres", get(genres))
        .route("/discover/genre/:id", get(discover_by_genre));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn trending(State(state): State<AppState>) -> Result<Response, ApiError> {
    let raw = state.service.trending().await?;
    Ok(relay(raw))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>, ApiError> {
    let page = parse_page(params.page.as_deref())?;
    let query = params.q.unwrap_or_default();
    let results = state.service.search(&query, page).await?;
    Ok(Json(results))
}

async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CombinedResult>, ApiError> {
    let details = state.service.movie_details(&id).await?;
    Ok(Json(details))
}

async fn movie_list(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let page = parse_page(params.page.as_deref())?;
    let raw = state.service.movie_list(&category, page).await?;
    Ok(relay(raw))
}

async fn genres(State(state): State<AppState>) -> Result<Response, ApiError> {
    let raw = state.service.genres().await?;
    Ok(relay(raw))
}

async fn discover_by_genre(
    State(state): State<AppState>,
    Path(genre_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let page = parse_page(params.page.as_deref())?;
    let raw = state.service.discover_by_genre(&genre_id, page).await?;
    Ok(relay(raw))
}

/// Upstream status, content type and body, unchanged.
fn relay(raw: RawResponse) -> Response {
    let status = StatusCode::from_u16(raw.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut res = (status, raw.body).into_response();
    let content_type = raw
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok());
    match content_type {
        Some(ct) => {
            res.headers_mut().insert(header::CONTENT_TYPE, ct);
        }
        None => {
            res.headers_mut().remove(header::CONTENT_TYPE);
        }
    }
    res
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
