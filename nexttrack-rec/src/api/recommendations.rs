//! Recommendation handler
//!
//! GET /recommendations?song=...&artist=...&genre=...
//!
//! Repeated query parameters accumulate into the filter set. The handler
//! assembles one registry query from all filters, cleans the result set
//! through the heuristic filter chain, then enriches every candidate
//! with artwork and a streaming link, fanning the enrichment out
//! concurrently since each candidate's lookups are independent.

use axum::{
    extract::{RawQuery, State},
    routing::get,
    Json, Router,
};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::{ApiError, ApiResult};
use crate::ranking;
use crate::services::musicbrainz_client::{recommendation_query, MbRecording};
use crate::AppState;

/// Candidate pool size requested from the registry
const CANDIDATE_LIMIT: u32 = 25;

/// Accumulated filter set from the query string
#[derive(Debug, Default, PartialEq)]
pub struct FilterSet {
    pub songs: Vec<String>,
    pub artists: Vec<String>,
    pub genres: Vec<String>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty() && self.artists.is_empty() && self.genres.is_empty()
    }
}

/// Parse repeated song/artist/genre parameters, deduplicated in
/// insertion order; genre "Unknown" placeholders are dropped
pub fn parse_filter_params(query: &str) -> FilterSet {
    let mut filters = FilterSet::default();
    let mut seen = HashSet::new();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = value.trim();
        if value.is_empty() || !seen.insert((key.to_string(), value.to_string())) {
            continue;
        }
        match key.as_ref() {
            "song" => filters.songs.push(value.to_string()),
            "artist" => filters.artists.push(value.to_string()),
            "genre" => {
                if value != "Unknown" {
                    filters.genres.push(value.to_string());
                }
            }
            _ => {}
        }
    }

    filters
}

/// One recommendation card
#[derive(Debug, Serialize)]
pub struct Recommendation {
    #[serde(rename = "songID")]
    pub song_id: String,
    pub title: String,
    /// Credited artist names
    pub artist: Vec<String>,
    /// Folksonomy tags
    pub genre: Vec<String>,
    /// Artwork URL (cover art archive, or catalog album art)
    pub image: Option<String>,
    /// Streaming page URL
    #[serde(rename = "spotifyURL")]
    pub spotify_url: Option<String>,
}

/// GET /recommendations
pub async fn recommendations(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Vec<Recommendation>>> {
    let filters = parse_filter_params(query.as_deref().unwrap_or(""));

    // All filter groups OR-join into a single registry query
    let Some(query) = recommendation_query(&filters.songs, &filters.artists, &filters.genres)
    else {
        return Err(ApiError::BadRequest(
            "At least one song, artist or genre filter is required".to_string(),
        ));
    };

    tracing::info!(
        songs = filters.songs.len(),
        artists = filters.artists.len(),
        genres = filters.genres.len(),
        "Building recommendations"
    );

    let recordings = match state.musicbrainz.search_recordings(&query, CANDIDATE_LIMIT).await {
        Ok(recordings) => recordings,
        Err(e) => {
            state.note_error(e.to_string()).await;
            return Err(e.into());
        }
    };

    let mut candidates = ranking::filter_candidates(recordings);
    ranking::rank_by_score_and_date(&mut candidates);

    tracing::debug!(candidates = candidates.len(), "Filter chain applied");

    // Candidates are independent; enrich them concurrently
    let cards = join_all(
        candidates
            .into_iter()
            .map(|rec| enrich_candidate(&state, rec)),
    )
    .await;

    Ok(Json(cards))
}

/// Resolve artwork and streaming link for one candidate
///
/// Artwork prefers the cover art archive (keyed by the official
/// release's release group); catalog album art is the fallback. A failed
/// catalog lookup degrades the card rather than failing the request.
async fn enrich_candidate(state: &AppState, recording: MbRecording) -> Recommendation {
    let primary_artist = recording
        .artist_credit
        .first()
        .map(|c| c.name.clone())
        .unwrap_or_default();

    let (image, spotify_url) = tokio::join!(
        resolve_artwork(state, &recording, &primary_artist),
        resolve_track_url(state, &recording.title, &primary_artist),
    );

    Recommendation {
        song_id: recording.id,
        title: recording.title,
        artist: recording
            .artist_credit
            .iter()
            .map(|c| c.name.clone())
            .collect(),
        genre: recording.tags.iter().map(|t| t.name.clone()).collect(),
        image,
        spotify_url,
    }
}

async fn resolve_artwork(
    state: &AppState,
    recording: &MbRecording,
    primary_artist: &str,
) -> Option<String> {
    if let Some(release_group_id) = ranking::official_release_group_id(recording) {
        if let Some(url) = state.coverart.release_group_front_url(release_group_id).await {
            return Some(url);
        }
    }

    let spotify = state.spotify.as_ref()?;
    match spotify.find_album_art(&recording.title, primary_artist).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(title = %recording.title, error = %e, "Catalog art lookup failed");
            None
        }
    }
}

async fn resolve_track_url(state: &AppState, title: &str, artist: &str) -> Option<String> {
    let spotify = state.spotify.as_ref()?;
    match spotify.find_track_url(title, artist).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(title = %title, error = %e, "Catalog track lookup failed");
            state.note_error(e.to_string()).await;
            None
        }
    }
}

/// Build recommendation routes
pub fn recommendation_routes() -> Router<AppState> {
    Router::new().route("/recommendations", get(recommendations))
}
