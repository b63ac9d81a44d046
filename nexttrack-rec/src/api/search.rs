//! Song and artist search handlers
//!
//! GET /song/{name}, GET /artist/{name}
//!
//! Both back the suggestion dropdown in the filter builder: the user
//! types a partial name and picks one of the returned entries.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::ApiResult;
use crate::ranking;
use crate::AppState;

/// Search result limit (MusicBrainz default page size)
const SEARCH_LIMIT: u32 = 25;

/// One entry of the GET /song/{name} response
#[derive(Debug, Serialize)]
pub struct SongResult {
    #[serde(rename = "songID")]
    pub song_id: String,
    pub title: String,
    /// Credited artist names
    pub artist: Vec<String>,
    /// MBID of the first credited artist
    #[serde(rename = "artistID")]
    pub artist_id: Option<String>,
    /// Folksonomy tags
    pub genre: Vec<String>,
    /// Search relevance score
    pub score: Option<u32>,
}

/// One entry of the GET /artist/{name} response
#[derive(Debug, Serialize)]
pub struct ArtistResult {
    #[serde(rename = "artistID")]
    pub artist_id: String,
    pub name: String,
    /// "Person" or "Group"
    #[serde(rename = "type")]
    pub artist_type: Option<String>,
    /// Top tags by vote count
    pub genre: Vec<String>,
}

/// GET /song/{name}
///
/// Searches recordings by title, keeps officially released ones, and
/// ranks by relevance score with release date breaking ties.
pub async fn song_search(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<SongResult>>> {
    let recordings = state
        .musicbrainz
        .search_recordings_by_title(&name, SEARCH_LIMIT)
        .await?;

    let mut official = ranking::filter_official(recordings);
    ranking::rank_by_score_and_date(&mut official);

    let songs = official
        .into_iter()
        .map(|rec| SongResult {
            song_id: rec.id,
            title: rec.title,
            artist: rec.artist_credit.iter().map(|c| c.name.clone()).collect(),
            artist_id: rec
                .artist_credit
                .first()
                .and_then(|c| c.artist.as_ref())
                .map(|a| a.id.clone()),
            genre: rec.tags.iter().map(|t| t.name.clone()).collect(),
            score: rec.score,
        })
        .collect();

    Ok(Json(songs))
}

/// GET /artist/{name}
///
/// Searches artists by name, ordered by relevance score, each with its
/// top three tags.
pub async fn artist_search(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<ArtistResult>>> {
    let mut artists = state.musicbrainz.search_artists(&name, SEARCH_LIMIT).await?;

    artists.sort_by(|a, b| b.score.unwrap_or(0).cmp(&a.score.unwrap_or(0)));

    let results = artists
        .into_iter()
        .map(|artist| ArtistResult {
            genre: ranking::top_tags(&artist.tags),
            artist_id: artist.id,
            name: artist.name,
            artist_type: artist.artist_type,
        })
        .collect();

    Ok(Json(results))
}

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/song/:name", get(song_search))
        .route("/artist/:name", get(artist_search))
}
