//! IP Geolocation module using MaxMind GeoLite2 database
//!
//! Logins are placed on the map through the [`GeoResolver`] trait. The
//! production resolver reads a MaxMind GeoLite2-City database, which must be
//! downloaded separately from MaxMind (free with registration).

use maxminddb::{geoip2, Reader};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::models::Location;

/// Errors that can occur during geolocation lookups
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Failed to read database: {0}")]
    Database(#[from] maxminddb::MaxMindDBError),

    #[error("IP address {0} not found in database")]
    NotFound(IpAddr),

    #[error("Location data missing for IP address {0}")]
    NoLocation(IpAddr),

    #[error("Database file not found: {0}")]
    FileNotFound(String),
}

/// Maps an IP address to an approximate location
pub trait GeoResolver: Send + Sync {
    fn resolve(&self, ip: &IpAddr) -> Result<Location, GeoError>;
}

/// GeoIP lookup service using MaxMind GeoLite2-City database
///
/// # Example
///
/// ```ignore
/// use wayfarer::geolocation::{GeoIpService, GeoResolver};
///
/// let service = GeoIpService::new("GeoLite2-City.mmdb")?;
/// let location = service.resolve(&"8.8.8.8".parse()?)?;
/// println!("{}, {} (±{} km)", location.latitude, location.longitude, location.accuracy_radius);
/// ```
pub struct GeoIpService {
    reader: Arc<Reader<Vec<u8>>>,
}

impl GeoIpService {
    /// Create a new GeoIP service from a MaxMind database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database file cannot be opened or is invalid.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, GeoError> {
        let path = db_path.as_ref();
        if !path.exists() {
            return Err(GeoError::FileNotFound(path.display().to_string()));
        }

        let reader = Reader::open_readfile(path)?;
        log::info!(
            "Loaded GeoIP database {} ({})",
            path.display(),
            reader.metadata.database_type
        );
        Ok(GeoIpService {
            reader: Arc::new(reader),
        })
    }
}

impl GeoResolver for GeoIpService {
    fn resolve(&self, ip: &IpAddr) -> Result<Location, GeoError> {
        let city: geoip2::City = self.reader.lookup(*ip).map_err(|e| match e {
            maxminddb::MaxMindDBError::AddressNotFoundError(_) => GeoError::NotFound(*ip),
            other => GeoError::Database(other),
        })?;

        let location = city.location.ok_or(GeoError::NoLocation(*ip))?;
        let latitude = location.latitude.ok_or(GeoError::NoLocation(*ip))?;
        let longitude = location.longitude.ok_or(GeoError::NoLocation(*ip))?;

        Ok(Location {
            latitude,
            longitude,
            accuracy_radius: location.accuracy_radius.unwrap_or(0),
        })
    }
}

impl Clone for GeoIpService {
    fn clone(&self) -> Self {
        GeoIpService {
            reader: Arc::clone(&self.reader),
        }
    }
}
