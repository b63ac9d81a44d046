//! Wikidata SPARQL client
//!
//! Fetches the music-genre taxonomy (every entity that is an instance of
//! music genre Q188451, with its subclass entities) from the knowledge
//! graph query endpoint.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const WIKIDATA_QUERY_URL: &str = "https://query.wikidata.org/sparql";

/// All music genres with optional subgenres and English labels
const GENRE_TAXONOMY_QUERY: &str = r#"
SELECT ?mainGenre ?mainGenreLabel ?subGenre ?subGenreLabel WHERE {
  ?mainGenre wdt:P31 wd:Q188451 .
  OPTIONAL {
    ?subGenre wdt:P279 ?mainGenre.
    ?subGenre wdt:P31 wd:Q188451.
  }
  SERVICE wikibase:label { bd:serviceParam wikibase:language "[AUTO_LANGUAGE],en". }
}
"#;

/// Wikidata client errors
#[derive(Debug, Error)]
pub enum WikidataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// SPARQL results envelope
#[derive(Debug, Deserialize)]
pub struct SparqlResponse {
    pub results: SparqlResults,
}

#[derive(Debug, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub bindings: Vec<GenreBinding>,
}

/// One row of the genre taxonomy query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreBinding {
    #[serde(rename = "mainGenre")]
    pub main_genre: Option<SparqlValue>,
    #[serde(rename = "mainGenreLabel")]
    pub main_genre_label: Option<SparqlValue>,
    #[serde(rename = "subGenre")]
    pub sub_genre: Option<SparqlValue>,
    #[serde(rename = "subGenreLabel")]
    pub sub_genre_label: Option<SparqlValue>,
}

/// A typed SPARQL binding value (only the lexical form is used)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SparqlValue {
    pub value: String,
}

/// Wikidata SPARQL endpoint client
pub struct WikidataClient {
    http_client: reqwest::Client,
    query_url: String,
}

impl WikidataClient {
    pub fn new() -> Result<Self, WikidataError> {
        Self::with_query_url(WIKIDATA_QUERY_URL)
    }

    pub fn with_query_url(query_url: &str) -> Result<Self, WikidataError> {
        let http_client = reqwest::Client::builder()
            .user_agent(format!("NextTrack/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| WikidataError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            query_url: query_url.to_string(),
        })
    }

    /// Run the genre taxonomy query and return the raw bindings
    pub async fn genre_taxonomy_bindings(&self) -> Result<Vec<GenreBinding>, WikidataError> {
        tracing::debug!(url = %self.query_url, "Querying Wikidata SPARQL endpoint");

        let response = self
            .http_client
            .get(&self.query_url)
            .query(&[("query", GENRE_TAXONOMY_QUERY)])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await
            .map_err(|e| WikidataError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(WikidataError::Api(status.as_u16(), error_text));
        }

        let parsed: SparqlResponse = response
            .json()
            .await
            .map_err(|e| WikidataError::Parse(e.to_string()))?;

        tracing::info!(
            bindings = parsed.results.bindings.len(),
            "Genre taxonomy query complete"
        );

        Ok(parsed.results.bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(WikidataClient::new().is_ok());
    }

    #[test]
    fn test_sparql_response_parsing() {
        let json = r#"{
            "results": {
                "bindings": [{
                    "mainGenre": {"type": "uri", "value": "http://www.wikidata.org/entity/Q11399"},
                    "mainGenreLabel": {"type": "literal", "value": "rock music"},
                    "subGenre": {"type": "uri", "value": "http://www.wikidata.org/entity/Q7749"},
                    "subGenreLabel": {"type": "literal", "value": "punk rock"}
                }, {
                    "mainGenre": {"type": "uri", "value": "http://www.wikidata.org/entity/Q9778"},
                    "mainGenreLabel": {"type": "literal", "value": "ambient music"}
                }]
            }
        }"#;

        let parsed: SparqlResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.bindings.len(), 2);
        assert_eq!(
            parsed.results.bindings[0]
                .main_genre_label
                .as_ref()
                .unwrap()
                .value,
            "rock music"
        );
        assert!(parsed.results.bindings[1].sub_genre.is_none());
    }
}
