use crate::detection::adjacency::select_adjacent;
use crate::models::{LoginEvent, Location, TravelDirection, TravelReport};

/// Default maximum plausible travel speed in km/h (roughly a commercial jet)
pub const DEFAULT_MAX_VELOCITY_KMH: f64 = 500.0;

const EARTH_RADIUS_KM: f64 = 6371.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Outcome of comparing two logins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelVerdict {
    pub distance_km: f64,
    /// Always non-negative
    pub elapsed_hours: f64,
    /// `f64::INFINITY` when the logins are simultaneous but apart
    pub speed_kmh: f64,
    pub suspicious: bool,
}

impl TravelVerdict {
    pub fn is_unbounded(&self) -> bool {
        self.speed_kmh.is_infinite()
    }
}

/// Classifies the implied travel speed between pairs of logins.
///
/// Holds no per-user state, so one engine can be shared across threads and
/// called for `(previous, new)` and `(new, next)` independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelAnomalyEngine {
    /// Speeds strictly above this are suspicious
    max_velocity_kmh: f64,
}

impl TravelAnomalyEngine {
    pub fn new() -> Self {
        Self::with_max_velocity(DEFAULT_MAX_VELOCITY_KMH)
    }

    pub fn with_max_velocity(max_velocity_kmh: f64) -> Self {
        TravelAnomalyEngine { max_velocity_kmh }
    }

    pub fn max_velocity_kmh(&self) -> f64 {
        self.max_velocity_kmh
    }

    /// Compare two logins. Distance is symmetric and elapsed time is the
    /// absolute difference of the timestamps.
    pub fn evaluate(&self, a: &LoginEvent, b: &LoginEvent) -> TravelVerdict {
        let distance_km = haversine_distance(a.location(), b.location());
        let elapsed_seconds = a.timestamp.abs_diff(b.timestamp);
        let elapsed_hours = elapsed_seconds as f64 / SECONDS_PER_HOUR;

        let speed_kmh = if elapsed_seconds > 0 {
            distance_km / elapsed_hours
        } else if distance_km > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        TravelVerdict {
            distance_km,
            elapsed_hours,
            speed_kmh,
            suspicious: self.is_suspicious(speed_kmh),
        }
    }

    /// Strict comparison: a speed equal to the threshold passes.
    pub fn is_suspicious(&self, speed_kmh: f64) -> bool {
        speed_kmh > self.max_velocity_kmh
    }

    /// Evaluate `from -> to` and attach the identifying details of both logins
    pub fn report(
        &self,
        direction: TravelDirection,
        from: &LoginEvent,
        to: &LoginEvent,
    ) -> (TravelVerdict, TravelReport) {
        let verdict = self.evaluate(from, to);
        let report = TravelReport {
            username: to.username.clone(),
            direction,
            from_event_id: from.event_id.clone(),
            to_event_id: to.event_id.clone(),
            from_timestamp: from.timestamp,
            to_timestamp: to.timestamp,
            distance_km: verdict.distance_km,
            elapsed_hours: verdict.elapsed_hours,
            speed_kmh: verdict.speed_kmh,
            suspicious: verdict.suspicious,
        };
        (verdict, report)
    }

    /// Re-run detection over a stored history: each login is compared with
    /// the login ingestion would pick as its predecessor. Logins sharing a
    /// timestamp are never paired.
    pub fn replay(&self, history: &[LoginEvent]) -> Vec<TravelReport> {
        let mut reports: Vec<TravelReport> = history
            .iter()
            .filter_map(|login| {
                let previous = select_adjacent(history, login).previous?;
                Some(self.report(TravelDirection::IntoCurrent, previous, login).1)
            })
            .collect();
        reports.sort_by(|a, b| {
            a.to_timestamp
                .cmp(&b.to_timestamp)
                .then_with(|| a.to_event_id.cmp(&b.to_event_id))
        });
        reports
    }
}

impl Default for TravelAnomalyEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate the great-circle distance between two points using the Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(loc1: Location, loc2: Location) -> f64 {
    let lat1_rad = loc1.latitude.to_radians();
    let lat2_rad = loc2.latitude.to_radians();
    let delta_lat = (loc2.latitude - loc1.latitude).to_radians();
    let delta_lon = (loc2.longitude - loc1.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` marginally past 1 for antipodal points
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}
