//! Genre taxonomy lookup handler
//!
//! GET /genre/{name}

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::ApiResult;
use crate::taxonomy::{self, Genre};
use crate::AppState;

/// GET /genre/{name}
///
/// Queries the knowledge graph for the music-genre taxonomy, folds it
/// into a deduplicated genre tree, and returns the genres whose name
/// contains the requested text, broadest first.
pub async fn genre_search(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<Genre>>> {
    let bindings = state.wikidata.genre_taxonomy_bindings().await?;

    let genres = taxonomy::lookup(taxonomy::build_taxonomy(&bindings), &name);

    tracing::debug!(name = %name, matches = genres.len(), "Genre lookup complete");

    Ok(Json(genres))
}

/// Build genre routes
pub fn genre_routes() -> Router<AppState> {
    Router::new().route("/genre/:name", get(genre_search))
}
