#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use wayfarer::detection::TravelAnomalyEngine;
use wayfarer::geolocation::{GeoError, GeoResolver};
use wayfarer::ingest::{IngestService, LoginRecord};
use wayfarer::models::Location;
use wayfarer::persistence::SqliteLoginStore;

pub const NEW_YORK_IP: &str = "1.1.1.1";
pub const LONDON_IP: &str = "2.2.2.2";
pub const LOS_ANGELES_IP: &str = "3.3.3.3";
pub const TOKYO_IP: &str = "4.4.4.4";
pub const UNKNOWN_IP: &str = "10.0.0.1";

/// Resolves a handful of fixed addresses to well-known cities
pub struct FixedResolver {
    locations: HashMap<IpAddr, Location>,
}

impl FixedResolver {
    pub fn cities() -> Self {
        let mut locations = HashMap::new();
        let mut add = |ip: &str, latitude: f64, longitude: f64, accuracy_radius: u16| {
            locations.insert(
                ip.parse().unwrap(),
                Location { latitude, longitude, accuracy_radius },
            );
        };
        add(NEW_YORK_IP, 40.7128, -74.0060, 5);
        add(LONDON_IP, 51.5074, -0.1278, 10);
        add(LOS_ANGELES_IP, 34.0522, -118.2437, 20);
        add(TOKYO_IP, 35.6762, 139.6503, 50);
        FixedResolver { locations }
    }
}

impl GeoResolver for FixedResolver {
    fn resolve(&self, ip: &IpAddr) -> Result<Location, GeoError> {
        self.locations.get(ip).copied().ok_or(GeoError::NotFound(*ip))
    }
}

pub fn service() -> IngestService {
    IngestService::new(
        Arc::new(SqliteLoginStore::in_memory().unwrap()),
        Arc::new(FixedResolver::cities()),
        TravelAnomalyEngine::new(),
    )
}

pub fn record(username: &str, event_uuid: &str, unix_timestamp: i64, ip_address: &str) -> LoginRecord {
    LoginRecord {
        username: username.to_string(),
        unix_timestamp,
        event_uuid: event_uuid.to_string(),
        ip_address: ip_address.to_string(),
    }
}
