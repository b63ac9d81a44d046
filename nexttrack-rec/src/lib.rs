//! nexttrack-rec - Music Recommendation Aggregator
//!
//! Queries the MusicBrainz registry, the Wikidata knowledge graph, the
//! Spotify catalog and the Cover Art Archive, merges and filters their
//! results, and serves ranked recommendations plus the browser UI.

pub mod api;
pub mod error;
pub mod ranking;
pub mod services;
pub mod taxonomy;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use nexttrack_common::config::ServiceConfig;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{CoverArtClient, MusicBrainzClient, SpotifyClient, WikidataClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Recording/artist registry client
    pub musicbrainz: Arc<MusicBrainzClient>,
    /// Knowledge-graph genre taxonomy client
    pub wikidata: Arc<WikidataClient>,
    /// Cover-art service client
    pub coverart: Arc<CoverArtClient>,
    /// Streaming catalog client; None when credentials are not configured
    pub spotify: Option<Arc<SpotifyClient>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> anyhow::Result<Self> {
        let spotify = match config.spotify_credentials() {
            Some((id, secret)) => Some(Arc::new(SpotifyClient::new(id, secret)?)),
            None => {
                tracing::warn!(
                    "Spotify credentials not configured; recommendations will have \
                     no streaming links and no fallback artwork"
                );
                None
            }
        };

        Ok(Self {
            musicbrainz: Arc::new(MusicBrainzClient::new(config.contact.as_deref())?),
            wikidata: Arc::new(WikidataClient::new()?),
            coverart: Arc::new(CoverArtClient::new()?),
            spotify,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        })
    }

    /// Record an error for the health endpoint diagnostics
    pub async fn note_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // UI routes (HTML page + embedded assets)
        .merge(api::ui_routes())
        // API routes
        .merge(api::search_routes())
        .merge(api::genre_routes())
        .merge(api::recommendation_routes())
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
