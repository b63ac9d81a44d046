//! Cover Art Archive client
//!
//! Probes `coverartarchive.org` for release-group front covers. The
//! archive serves the image at a stable URL, so a successful probe means
//! the probe URL itself is the artwork URL.

use std::time::Duration;
use thiserror::Error;

const COVERART_BASE_URL: &str = "https://coverartarchive.org";

/// Cover Art Archive client errors
#[derive(Debug, Error)]
pub enum CoverArtError {
    #[error("Network error: {0}")]
    Network(String),
}

/// Cover Art Archive client
pub struct CoverArtClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl CoverArtClient {
    pub fn new() -> Result<Self, CoverArtError> {
        Self::with_base_url(COVERART_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, CoverArtError> {
        let http_client = reqwest::Client::builder()
            .user_agent(format!("NextTrack/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| CoverArtError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Front cover thumbnail URL for a release group, or None when the
    /// archive has no artwork (or the probe fails)
    pub async fn release_group_front_url(&self, release_group_id: &str) -> Option<String> {
        let url = format!(
            "{}/release-group/{}/front-small",
            self.base_url, release_group_id
        );

        let response = match self.http_client.head(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(release_group_id, error = %e, "Cover art probe failed");
                return None;
            }
        };

        if response.status().is_success() || response.status().is_redirection() {
            Some(url)
        } else {
            tracing::debug!(
                release_group_id,
                status = %response.status(),
                "No cover art for release group"
            );
            None
        }
    }
}
