pub mod config;
pub mod detection;
pub mod geolocation;
pub mod ingest;
pub mod models;
pub mod output;
pub mod persistence;
pub mod server;

// Re-export commonly used types
pub use models::{LoginEvent, Location, TravelDirection, TravelReport};
pub use detection::{select_adjacent, Adjacency, TravelAnomalyEngine, TravelVerdict};
pub use geolocation::{GeoIpService, GeoResolver};
pub use persistence::{LoginStore, SqliteLoginStore};
pub use ingest::{IngestError, IngestService, LoginRecord};
