//! Genre taxonomy assembly
//!
//! Folds raw SPARQL bindings into a deduplicated genre tree: one entry
//! per main genre, each carrying its subgenres. Wikidata labels music
//! genres as "<name> music"; the suffix is stripped for display.

use crate::services::wikidata_client::GenreBinding;
use serde::Serialize;
use std::collections::BTreeMap;

/// A genre with its subgenres
#[derive(Debug, Clone, Serialize)]
pub struct Genre {
    #[serde(rename = "genreID")]
    pub genre_id: String,
    pub name: String,
    #[serde(rename = "subGenres")]
    pub sub_genres: Vec<SubGenre>,
}

/// A subgenre reference
#[derive(Debug, Clone, Serialize)]
pub struct SubGenre {
    #[serde(rename = "genreID")]
    pub genre_id: String,
    pub name: String,
}

/// Strip the first " music" suffix from a genre label
pub fn clean_genre_label(label: &str) -> String {
    label.replacen(" music", "", 1)
}

/// Entity QID from a Wikidata entity URI (last path segment)
pub fn qid_from_uri(uri: &str) -> String {
    uri.rsplit('/').next().unwrap_or(uri).to_string()
}

/// Fold query bindings into a deduplicated genre list
///
/// Rows repeat the main genre once per subgenre; rows without a label
/// are dropped, and subgenres are deduplicated by QID.
pub fn build_taxonomy(bindings: &[GenreBinding]) -> Vec<Genre> {
    // Keyed by cleaned main-genre label; BTreeMap keeps the output stable
    let mut genres: BTreeMap<String, Genre> = BTreeMap::new();

    for row in bindings {
        let (main_uri, main_label) = match (&row.main_genre, &row.main_genre_label) {
            (Some(uri), Some(label)) => (&uri.value, clean_genre_label(&label.value)),
            _ => continue,
        };

        let entry = genres.entry(main_label.clone()).or_insert_with(|| Genre {
            genre_id: qid_from_uri(main_uri),
            name: main_label,
            sub_genres: Vec::new(),
        });

        if let (Some(sub_uri), Some(sub_label)) = (&row.sub_genre, &row.sub_genre_label) {
            let sub_id = qid_from_uri(&sub_uri.value);
            if !entry.sub_genres.iter().any(|s| s.genre_id == sub_id) {
                entry.sub_genres.push(SubGenre {
                    genre_id: sub_id,
                    name: clean_genre_label(&sub_label.value),
                });
            }
        }
    }

    genres.into_values().collect()
}

/// Case-insensitive substring lookup, broadest genres first
pub fn lookup(taxonomy: Vec<Genre>, name: &str) -> Vec<Genre> {
    let needle = name.to_lowercase();
    let mut matches: Vec<Genre> = taxonomy
        .into_iter()
        .filter(|genre| genre.name.to_lowercase().contains(&needle))
        .collect();
    matches.sort_by(|a, b| b.sub_genres.len().cmp(&a.sub_genres.len()));
    matches
}
