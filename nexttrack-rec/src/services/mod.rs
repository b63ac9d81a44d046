//! External API clients
//!
//! One client per upstream service: the MusicBrainz registry, the
//! Wikidata SPARQL endpoint, the Spotify catalog, and the Cover Art
//! Archive.

pub mod coverart_client;
pub mod musicbrainz_client;
pub mod spotify_client;
pub mod wikidata_client;

pub use coverart_client::CoverArtClient;
pub use musicbrainz_client::MusicBrainzClient;
pub use spotify_client::SpotifyClient;
pub use wikidata_client::WikidataClient;
