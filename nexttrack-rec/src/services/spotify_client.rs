//! Spotify Web API client
//!
//! Uses the Client Credentials flow for server-to-server authentication,
//! caching the bearer token until shortly before it expires. Track lookups
//! try a fielded search first and fall back to a plain-text query when the
//! catalog returns nothing.

use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

/// Album image width preferred for recommendation cards
const PREFERRED_IMAGE_WIDTH: u32 = 300;

/// Trailing "(... version ...)" qualifier; Spotify names these " - ..."
static VERSION_QUALIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\(([^()]*\bversion\b[^()]*)\)\s*$").unwrap());

/// Parenthesized or bracketed segments, for loose title comparison
static PAREN_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(.*?\)|\s*\[.*?\]").unwrap());

/// Spotify client errors
#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Token request failed {0}: {1}")]
    Token(u16, String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Spotify API client with token caching
#[derive(Clone)]
pub struct SpotifyClient {
    http_client: reqwest::Client,
    token_url: String,
    api_base: String,
    client_id: String,
    client_secret: String,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl SpotifyClient {
    pub fn new(client_id: String, client_secret: String) -> Result<Self, SpotifyError> {
        Self::with_urls(TOKEN_URL, API_BASE, client_id, client_secret)
    }

    pub fn with_urls(
        token_url: &str,
        api_base: &str,
        client_id: String,
        client_secret: String,
    ) -> Result<Self, SpotifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SpotifyError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            token_url: token_url.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Ensure a valid access token, refreshing if needed
    async fn ensure_token(&self) -> Result<String, SpotifyError> {
        {
            let guard = self.token.read().await;
            if let Some(ref t) = *guard {
                if t.expires_at > Instant::now() {
                    return Ok(t.access_token.clone());
                }
            }
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *self.token.write().await = Some(token);
        Ok(access_token)
    }

    /// Exchange client credentials for a bearer token
    async fn fetch_token(&self) -> Result<CachedToken, SpotifyError> {
        let auth = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.client_id, self.client_secret).as_bytes());

        let response = self
            .http_client
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", auth))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SpotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Token(status.as_u16(), body));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        tracing::debug!(expires_in = body.expires_in, "Obtained Spotify access token");

        // Refresh one minute early to avoid racing the expiry
        let expires_at =
            Instant::now() + Duration::from_secs(body.expires_in.saturating_sub(60));

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at,
        })
    }

    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>, SpotifyError> {
        let token = self.ensure_token().await?;

        let limit = limit.to_string();
        let response = self
            .http_client
            .get(format!("{}/search", self.api_base))
            .query(&[
                ("q", query),
                ("type", "track"),
                ("limit", limit.as_str()),
            ])
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| SpotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Api(status.as_u16(), body));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        Ok(body.tracks.items)
    }

    /// Search the catalog for a track, fielded query first, plain-text
    /// fallback when the fielded query yields nothing
    async fn search_best_track(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<Track>, SpotifyError> {
        let clean_title = clean_track_title(title);

        let fielded = format!(
            "track:\"{}\" artist:\"{}\"",
            clean_title.replace('"', ""),
            artist.replace('"', "")
        );
        let mut tracks = self.search_tracks(&fielded, 5).await?;

        if tracks.is_empty() {
            let fallback = format!("{} {}", clean_title, artist);
            tracing::debug!(query = %fallback, "Fielded search empty, trying plain query");
            tracks = self.search_tracks(&fallback, 5).await?;
        }

        Ok(pick_best_match(tracks, &clean_title, artist))
    }

    /// Catalog page URL for the best-matching track, if any
    pub async fn find_track_url(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<String>, SpotifyError> {
        let track = self.search_best_track(title, artist).await?;
        Ok(track.and_then(|t| t.external_urls.spotify))
    }

    /// Album art URL from the first hit of a plain "title artist"
    /// query, preferring the 300px-wide rendition
    pub async fn find_album_art(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<String>, SpotifyError> {
        let tracks = self
            .search_tracks(&format!("{} {}", title, artist), 1)
            .await?;
        Ok(tracks.into_iter().next().and_then(preferred_image))
    }
}

/// The album image at the preferred width, if the track carries one
fn preferred_image(track: Track) -> Option<String> {
    track.album.images.into_iter().find_map(|image| {
        if image.width == Some(PREFERRED_IMAGE_WIDTH) {
            image.url
        } else {
            None
        }
    })
}

/// Rewrite a trailing "(... version ...)" qualifier as a " - " suffix
pub fn clean_track_title(title: &str) -> String {
    VERSION_QUALIFIER_RE
        .replace(title, " - $1")
        .trim()
        .to_string()
}

/// Pick the result whose stripped title contains the wanted title and
/// whose artists include the wanted artist; fall back to the first hit
fn pick_best_match(tracks: Vec<Track>, clean_title: &str, artist: &str) -> Option<Track> {
    let wanted_title = clean_title.to_lowercase();
    let wanted_artist = artist.to_lowercase();

    let best = tracks.iter().position(|track| {
        let track_title = PAREN_SEGMENT_RE
            .replace_all(&track.name, "")
            .trim()
            .to_lowercase();
        let artist_match = track
            .artists
            .iter()
            .any(|a| a.name.to_lowercase().contains(&wanted_artist));
        track_title.contains(&wanted_title) && artist_match
    });

    match best {
        Some(index) => tracks.into_iter().nth(index),
        None => tracks.into_iter().next(),
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: TracksPage,
}

#[derive(Deserialize)]
struct TracksPage {
    #[serde(default)]
    items: Vec<Track>,
}

/// A Spotify track (simplified)
#[derive(Clone, Debug, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<TrackArtist>,
    #[serde(default)]
    pub album: Album,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TrackArtist {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Album {
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Image {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str, artist: &str, url: &str) -> Track {
        Track {
            name: name.to_string(),
            artists: vec![TrackArtist {
                name: artist.to_string(),
            }],
            album: Album::default(),
            external_urls: ExternalUrls {
                spotify: Some(url.to_string()),
            },
        }
    }

    #[test]
    fn test_clean_track_title_version_qualifier() {
        assert_eq!(
            clean_track_title("Let It Be (Single Version)"),
            "Let It Be - Single Version"
        );
        assert_eq!(clean_track_title("Hey Jude"), "Hey Jude");
        // Qualifiers without "version" are left alone
        assert_eq!(clean_track_title("One (Live)"), "One (Live)");
    }

    #[test]
    fn test_pick_best_match_prefers_title_and_artist() {
        let tracks = vec![
            track("Yesterday (Karaoke)", "Karaoke Band", "url-a"),
            track("Yesterday (Remastered 2009)", "The Beatles", "url-b"),
        ];
        let best = pick_best_match(tracks, "Yesterday", "The Beatles").unwrap();
        assert_eq!(best.external_urls.spotify.as_deref(), Some("url-b"));
    }

    #[test]
    fn test_pick_best_match_falls_back_to_first() {
        let tracks = vec![
            track("Something Else", "Someone", "url-a"),
            track("Another Thing", "Somebody", "url-b"),
        ];
        let best = pick_best_match(tracks, "Yesterday", "The Beatles").unwrap();
        assert_eq!(best.external_urls.spotify.as_deref(), Some("url-a"));
    }

    #[test]
    fn test_pick_best_match_empty() {
        assert!(pick_best_match(vec![], "Yesterday", "The Beatles").is_none());
    }

    #[test]
    fn test_preferred_image_picks_300px() {
        let mut t = track("Hey Jude", "The Beatles", "url");
        t.album.images = vec![
            Image {
                url: Some("http://img/640".to_string()),
                width: Some(640),
                height: Some(640),
            },
            Image {
                url: Some("http://img/300".to_string()),
                width: Some(300),
                height: Some(300),
            },
        ];
        assert_eq!(preferred_image(t).as_deref(), Some("http://img/300"));
    }

    #[test]
    fn test_preferred_image_none_without_300px() {
        let mut t = track("Hey Jude", "The Beatles", "url");
        t.album.images = vec![Image {
            url: Some("http://img/640".to_string()),
            width: Some(640),
            height: Some(640),
        }];
        assert!(preferred_image(t).is_none());
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "tracks": {
                "items": [{
                    "name": "Hey Jude",
                    "artists": [{"name": "The Beatles"}],
                    "album": {"images": [{"url": "http://img/300", "width": 300, "height": 300}]},
                    "external_urls": {"spotify": "https://open.spotify.com/track/x"}
                }]
            }
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.tracks.items.len(), 1);
        assert_eq!(
            parsed.tracks.items[0].album.images[0].width,
            Some(300)
        );
    }
}
