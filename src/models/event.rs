use std::net::Ipv4Addr;
use serde::{Deserialize, Serialize};

/// Approximate position of an IP address as reported by a geo resolver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Uncertainty radius in kilometers. Informational only.
    pub accuracy_radius: u16,
}

/// One recorded authentication event.
///
/// The location is resolved once at ingestion and frozen on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub username: String,
    pub timestamp: i64,
    pub event_id: String,
    pub source_ip: Ipv4Addr,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_radius: u16,
}

impl LoginEvent {
    pub fn new(
        username: impl Into<String>,
        timestamp: i64,
        event_id: impl Into<String>,
        source_ip: Ipv4Addr,
        location: Location,
    ) -> Self {
        LoginEvent {
            username: username.into(),
            timestamp,
            event_id: event_id.into(),
            source_ip,
            latitude: location.latitude,
            longitude: location.longitude,
            accuracy_radius: location.accuracy_radius,
        }
    }

    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_radius: self.accuracy_radius,
        }
    }
}
