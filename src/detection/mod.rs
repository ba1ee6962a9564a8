pub mod adjacency;
pub mod rule_geo_velocity;

pub use adjacency::{select_adjacent, Adjacency};
pub use rule_geo_velocity::{haversine_distance, TravelAnomalyEngine, TravelVerdict, DEFAULT_MAX_VELOCITY_KMH};
