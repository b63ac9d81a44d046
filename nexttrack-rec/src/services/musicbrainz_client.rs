//! MusicBrainz API client
//!
//! Search-oriented client for the recording/artist registry, with the
//! 1 request/second rate limit MusicBrainz requires of anonymous callers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const RATE_LIMIT_MS: u64 = 1000; // 1 request per second

/// MusicBrainz client errors
#[derive(Debug, Error)]
pub enum MbError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Recording search response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbRecordingSearch {
    #[serde(default)]
    pub recordings: Vec<MbRecording>,
}

/// A recording from a search result
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbRecording {
    /// Recording MBID (MusicBrainz ID)
    pub id: String,
    /// Recording title
    pub title: String,
    /// Search relevance score (0-100)
    pub score: Option<u32>,
    /// Earliest release date, YYYY[-MM[-DD]]
    #[serde(rename = "first-release-date")]
    pub first_release_date: Option<String>,
    /// Free-text qualifier ("live", "demo", ...)
    pub disambiguation: Option<String>,
    /// Artist credits for this recording
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<MbArtistCredit>,
    /// Folksonomy tags
    #[serde(default)]
    pub tags: Vec<MbTag>,
    /// Releases containing this recording
    pub releases: Option<Vec<MbRelease>>,
}

/// MusicBrainz artist credit
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbArtistCredit {
    /// Display name (may differ from artist.name for collaborations)
    pub name: String,
    /// Artist information
    pub artist: Option<MbArtist>,
}

/// MusicBrainz artist reference
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbArtist {
    /// Artist MBID (MusicBrainz ID)
    pub id: String,
    /// Artist name
    pub name: String,
}

/// Folksonomy tag with vote count
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbTag {
    pub name: String,
    pub count: Option<i64>,
}

/// MusicBrainz release
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbRelease {
    /// Release MBID (MusicBrainz ID)
    pub id: String,
    /// Release status ("Official", "Promotion", "Bootleg", ...)
    pub status: Option<String>,
    /// Release date in YYYY[-MM[-DD]] format
    pub date: Option<String>,
    /// Release group this release belongs to
    #[serde(rename = "release-group")]
    pub release_group: Option<MbReleaseGroup>,
}

/// MusicBrainz release group
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbReleaseGroup {
    /// Release group MBID
    pub id: String,
    /// Secondary types ("Live", "Interview", "Compilation", ...)
    #[serde(rename = "secondary-types", default)]
    pub secondary_types: Vec<String>,
}

/// Artist search response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbArtistSearch {
    #[serde(default)]
    pub artists: Vec<MbArtistResult>,
}

/// An artist from a search result
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbArtistResult {
    /// Artist MBID
    pub id: String,
    /// Artist name
    pub name: String,
    /// "Person" or "Group"
    #[serde(rename = "type")]
    pub artist_type: Option<String>,
    /// Search relevance score (0-100)
    pub score: Option<u32>,
    /// Folksonomy tags with vote counts
    #[serde(default)]
    pub tags: Vec<MbTag>,
}

/// Rate limiter enforcing 1 request/second
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Quote a value as a Lucene field term, stripping embedded quotes
pub fn lucene_term(field: &str, value: &str) -> String {
    format!("{}:\"{}\"", field, value.replace('"', ""))
}

/// Assemble the recommendation query from accumulated filter terms
///
/// Each filter group is OR-joined internally, and the groups are
/// OR-joined with each other. Returns None when every group is empty.
pub fn recommendation_query(songs: &[String], artists: &[String], genres: &[String]) -> Option<String> {
    let mut groups = Vec::new();

    for (field, values) in [("recording", songs), ("arid", artists), ("tag", genres)] {
        if values.is_empty() {
            continue;
        }
        let terms: Vec<String> = values.iter().map(|v| lucene_term(field, v)).collect();
        groups.push(format!("({})", terms.join(" OR ")));
    }

    if groups.is_empty() {
        None
    } else {
        Some(groups.join(" OR "))
    }
}

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl MusicBrainzClient {
    pub fn new(contact: Option<&str>) -> Result<Self, MbError> {
        Self::with_base_url(MUSICBRAINZ_BASE_URL, contact)
    }

    pub fn with_base_url(base_url: &str, contact: Option<&str>) -> Result<Self, MbError> {
        let user_agent = match contact {
            Some(contact) => format!(
                "NextTrack/{} ({})",
                env!("CARGO_PKG_VERSION"),
                contact
            ),
            None => format!("NextTrack/{}", env!("CARGO_PKG_VERSION")),
        };

        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MbError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    /// Search recordings with a raw Lucene query
    pub async fn search_recordings(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<MbRecording>, MbError> {
        let url = format!("{}/recording/", self.base_url);
        let search: MbRecordingSearch = self.get_json(&url, query, limit).await?;

        tracing::info!(
            query = %query,
            results = search.recordings.len(),
            "Recording search complete"
        );

        Ok(search.recordings)
    }

    /// Search recordings by title
    pub async fn search_recordings_by_title(
        &self,
        title: &str,
        limit: u32,
    ) -> Result<Vec<MbRecording>, MbError> {
        self.search_recordings(&lucene_term("recording", title), limit)
            .await
    }

    /// Search artists by name
    pub async fn search_artists(
        &self,
        name: &str,
        limit: u32,
    ) -> Result<Vec<MbArtistResult>, MbError> {
        let url = format!("{}/artist/", self.base_url);
        let search: MbArtistSearch = self
            .get_json(&url, &lucene_term("artist", name), limit)
            .await?;

        tracing::info!(
            name = %name,
            results = search.artists.len(),
            "Artist search complete"
        );

        Ok(search.artists)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &str,
        limit: u32,
    ) -> Result<T, MbError> {
        // Rate limit
        self.rate_limiter.wait().await;

        tracing::debug!(url = %url, query = %query, "Querying MusicBrainz API");

        let limit = limit.to_string();
        let response = self
            .http_client
            .get(url)
            .query(&[
                ("query", query),
                ("fmt", "json"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MbError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), query, error_text));
        }

        response
            .json()
            .await
            .map_err(|e| MbError::Parse(e.to_string()))
    }
}

/// Map a non-success registry status to a client error
fn error_for_status(status: u16, query: &str, body: String) -> MbError {
    match status {
        404 => MbError::NotFound(query.to_string()),
        503 => MbError::RateLimitExceeded,
        _ => MbError::Api(status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(1000);
        assert_eq!(limiter.min_interval, Duration::from_millis(1000));
    }

    #[test]
    fn test_client_creation() {
        let client = MusicBrainzClient::new(Some("admin@example.com"));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(500); // 500ms for faster test

        let start = Instant::now();

        // First request - no wait
        limiter.wait().await;
        let first_elapsed = start.elapsed();

        // Second request - should wait ~500ms
        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(450));
    }

    #[test]
    fn test_error_for_status_mapping() {
        assert!(matches!(
            error_for_status(404, "recording:\"Hey Jude\"", String::new()),
            MbError::NotFound(query) if query == "recording:\"Hey Jude\""
        ));
        assert!(matches!(
            error_for_status(503, "q", String::new()),
            MbError::RateLimitExceeded
        ));
        assert!(matches!(
            error_for_status(500, "q", "boom".to_string()),
            MbError::Api(500, body) if body == "boom"
        ));
    }

    #[test]
    fn test_lucene_term_strips_quotes() {
        assert_eq!(lucene_term("recording", "Hey Jude"), "recording:\"Hey Jude\"");
        assert_eq!(
            lucene_term("recording", "Say \"Hello\""),
            "recording:\"Say Hello\""
        );
    }

    #[test]
    fn test_recommendation_query_groups() {
        let songs = vec!["Hey Jude".to_string()];
        let artists = vec!["b10bbbfc-cf9e-42e0-be17-e2c3e1d2600d".to_string()];
        let genres = vec!["rock".to_string(), "pop".to_string()];

        let query = recommendation_query(&songs, &artists, &genres).unwrap();
        assert_eq!(
            query,
            "(recording:\"Hey Jude\") OR \
             (arid:\"b10bbbfc-cf9e-42e0-be17-e2c3e1d2600d\") OR \
             (tag:\"rock\" OR tag:\"pop\")"
        );
    }

    #[test]
    fn test_recommendation_query_empty() {
        assert!(recommendation_query(&[], &[], &[]).is_none());
    }

    #[test]
    fn test_recording_search_parsing() {
        let json = r#"{
            "recordings": [{
                "id": "abc",
                "title": "Hey Jude",
                "score": 100,
                "first-release-date": "1968-08-26",
                "artist-credit": [{"name": "The Beatles", "artist": {"id": "b10b", "name": "The Beatles"}}],
                "tags": [{"name": "rock", "count": 5}],
                "releases": [{"id": "r1", "status": "Official", "release-group": {"id": "rg1", "secondary-types": []}}]
            }]
        }"#;

        let search: MbRecordingSearch = serde_json::from_str(json).unwrap();
        assert_eq!(search.recordings.len(), 1);
        let rec = &search.recordings[0];
        assert_eq!(rec.title, "Hey Jude");
        assert_eq!(rec.score, Some(100));
        assert_eq!(rec.artist_credit[0].artist.as_ref().unwrap().id, "b10b");
        assert_eq!(
            rec.releases.as_ref().unwrap()[0]
                .release_group
                .as_ref()
                .unwrap()
                .id,
            "rg1"
        );
    }
}
