//! HTTP API handlers for nexttrack-rec

pub mod genre;
pub mod health;
pub mod recommendations;
pub mod search;
pub mod ui;

pub use genre::genre_routes;
pub use health::health_routes;
pub use recommendations::recommendation_routes;
pub use search::search_routes;
pub use ui::ui_routes;
