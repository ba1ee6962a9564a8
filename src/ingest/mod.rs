//! Login ingestion
//!
//! Validates an incoming login, places it on the map, records it, and
//! compares it against the user's logins immediately before and after it.

pub mod validation;

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::{select_adjacent, TravelAnomalyEngine, TravelVerdict};
use crate::geolocation::{GeoError, GeoResolver};
use crate::models::{LoginEvent, TravelDirection, TravelReport};
use crate::output::OutputHandler;
use crate::persistence::{LoginStore, PersistenceError};

/// Errors surfaced to the caller of [`IngestService::ingest`]
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not geolocate login: {0}")]
    Resolution(#[from] GeoError),

    #[error("Event id {event_id} is already recorded for another user")]
    EventIdConflict { event_id: String },

    #[error("Storage unavailable: {0}")]
    Storage(#[from] PersistenceError),
}

/// A login as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRecord {
    pub username: String,
    pub unix_timestamp: i64,
    pub event_uuid: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentGeo {
    pub lat: f64,
    pub lon: f64,
    pub radius: u16,
}

/// The neighbouring login a verdict was computed against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpAccess {
    pub ip: String,
    /// Whole km/h. Unbounded speeds saturate to `i64::MAX`.
    pub speed: i64,
    pub lat: f64,
    pub lon: f64,
    pub radius: u16,
    pub unix_timestamp: i64,
}

/// Response body for an ingested login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub current_geo: CurrentGeo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_to_current_geo_suspicious: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preceding_ip_access: Option<IpAccess>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_from_current_geo_suspicious: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsequent_ip_access: Option<IpAccess>,
}

/// One neighbouring login together with its verdict
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub other: LoginEvent,
    pub verdict: TravelVerdict,
    pub report: TravelReport,
}

impl Comparison {
    fn ip_access(&self) -> IpAccess {
        IpAccess {
            ip: self.other.source_ip.to_string(),
            speed: self.verdict.speed_kmh.round() as i64,
            lat: self.other.latitude,
            lon: self.other.longitude,
            radius: self.other.accuracy_radius,
            unix_timestamp: self.other.timestamp,
        }
    }
}

/// Result of ingesting a single login
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub event: LoginEvent,
    /// False when the event id had already been recorded
    pub newly_recorded: bool,
    /// Travel from the preceding login into this one
    pub preceding: Option<Comparison>,
    /// Travel from this login out to the subsequent one
    pub subsequent: Option<Comparison>,
}

impl IngestOutcome {
    pub fn reports(&self) -> impl Iterator<Item = &TravelReport> {
        self.preceding
            .iter()
            .chain(self.subsequent.iter())
            .map(|comparison| &comparison.report)
    }

    pub fn is_suspicious(&self) -> bool {
        self.reports().any(|report| report.suspicious)
    }

    pub fn to_response(&self) -> IngestResponse {
        IngestResponse {
            current_geo: CurrentGeo {
                lat: self.event.latitude,
                lon: self.event.longitude,
                radius: self.event.accuracy_radius,
            },
            travel_to_current_geo_suspicious: self.preceding.as_ref().map(|c| c.verdict.suspicious),
            preceding_ip_access: self.preceding.as_ref().map(Comparison::ip_access),
            travel_from_current_geo_suspicious: self.subsequent.as_ref().map(|c| c.verdict.suspicious),
            subsequent_ip_access: self.subsequent.as_ref().map(Comparison::ip_access),
        }
    }
}

/// Runs the ingestion sequence against injected storage and geolocation.
///
/// Recording a login and reading the user's history back happen under a
/// per-username lock, so two logins for the same user are never compared
/// against a half-updated history. Different users proceed in parallel.
pub struct IngestService {
    store: Arc<dyn LoginStore>,
    resolver: Arc<dyn GeoResolver>,
    engine: TravelAnomalyEngine,
    audit: Option<Mutex<OutputHandler>>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IngestService {
    pub fn new(
        store: Arc<dyn LoginStore>,
        resolver: Arc<dyn GeoResolver>,
        engine: TravelAnomalyEngine,
    ) -> Self {
        IngestService {
            store,
            resolver,
            engine,
            audit: None,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Write suspicious verdicts of newly recorded logins to `output`
    pub fn with_audit(mut self, output: OutputHandler) -> Self {
        self.audit = Some(Mutex::new(output));
        self
    }

    pub fn engine(&self) -> &TravelAnomalyEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn LoginStore> {
        &self.store
    }

    /// Validate, geolocate, record and assess a login
    pub fn ingest(&self, record: &LoginRecord) -> Result<IngestOutcome, IngestError> {
        let ip = validation::validate_record(record)?;

        let lock = self.acquire_user_lock(&record.username);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.record_login(record, ip).and_then(|(event, newly_recorded)| {
                let history = self.store.history_excluding(&event.username, &event.event_id)?;
                Ok(self.assess(event, &history, newly_recorded))
            })
        };
        self.release_user_lock(&record.username, lock);

        let outcome = result?;
        if outcome.newly_recorded {
            self.audit(&outcome);
        }
        Ok(outcome)
    }

    /// Compare `event` against its neighbours in `history`
    pub fn assess(&self, event: LoginEvent, history: &[LoginEvent], newly_recorded: bool) -> IngestOutcome {
        let adjacency = select_adjacent(history, &event);

        let preceding = adjacency.previous.map(|previous| {
            let (verdict, report) = self.engine.report(TravelDirection::IntoCurrent, previous, &event);
            Comparison { other: previous.clone(), verdict, report }
        });
        let subsequent = adjacency.next.map(|next| {
            let (verdict, report) = self.engine.report(TravelDirection::OutOfCurrent, &event, next);
            Comparison { other: next.clone(), verdict, report }
        });

        for report in preceding.iter().chain(subsequent.iter()).map(|c| &c.report) {
            if report.suspicious {
                log::info!(
                    "Impossible travel for '{}' ({} {}): {:.1} km in {:.2} h ({:.0} km/h, max {:.0} km/h)",
                    report.username,
                    report.direction,
                    event.event_id,
                    report.distance_km,
                    report.elapsed_hours,
                    report.speed_kmh,
                    self.engine.max_velocity_kmh()
                );
            } else {
                log::debug!(
                    "Plausible travel for '{}' ({} {}): {:.0} km/h",
                    report.username,
                    report.direction,
                    event.event_id,
                    report.speed_kmh
                );
            }
        }

        IngestOutcome {
            event,
            newly_recorded,
            preceding,
            subsequent,
        }
    }

    /// Store the login, or fetch it back when the event id is already known
    fn record_login(
        &self,
        record: &LoginRecord,
        ip: Ipv4Addr,
    ) -> Result<(LoginEvent, bool), IngestError> {
        if let Some(existing) = self.store.find_by_event_id(&record.event_uuid)? {
            if existing.username != record.username {
                return Err(IngestError::EventIdConflict {
                    event_id: record.event_uuid.clone(),
                });
            }
            log::warn!(
                "Event {} for '{}' already recorded, reusing stored location",
                record.event_uuid,
                record.username
            );
            return Ok((existing, false));
        }

        let location = self.resolver.resolve(&IpAddr::V4(ip)).map_err(|e| {
            log::warn!("Failed to geolocate {} for '{}': {}", ip, record.username, e);
            e
        })?;

        let event = LoginEvent::new(
            record.username.clone(),
            record.unix_timestamp,
            record.event_uuid.clone(),
            ip,
            location,
        );

        match self.store.insert_login(&event) {
            Ok(()) => Ok((event, true)),
            // Another user claimed the id between the lookup and the insert
            Err(PersistenceError::DuplicateEventId(event_id)) => {
                Err(IngestError::EventIdConflict { event_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn acquire_user_lock(&self, username: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(username.to_string()).or_default())
    }

    /// Drop the map entry once nobody else holds or waits on it
    fn release_user_lock(&self, username: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.user_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(username);
        }
    }

    fn audit(&self, outcome: &IngestOutcome) {
        let Some(audit) = &self.audit else {
            return;
        };
        let mut output = audit.lock().unwrap_or_else(PoisonError::into_inner);
        for report in outcome.reports().filter(|report| report.suspicious) {
            if let Err(e) = output.write_report(report) {
                log::error!("Failed to write travel report: {}", e);
            }
        }
    }

    #[cfg(test)]
    fn tracked_user_locks(&self) -> usize {
        self.user_locks.lock().unwrap().len()
    }
}
