use serde::{Deserialize, Serialize};

/// Which side of the newly recorded login a verdict describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelDirection {
    /// From the preceding login into the current one
    IntoCurrent,
    /// From the current login out to the subsequent one
    OutOfCurrent,
}

impl std::fmt::Display for TravelDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TravelDirection::IntoCurrent => write!(f, "into"),
            TravelDirection::OutOfCurrent => write!(f, "out-of"),
        }
    }
}

/// A single travel verdict tied to the two events it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelReport {
    pub username: String,
    pub direction: TravelDirection,
    pub from_event_id: String,
    pub to_event_id: String,
    pub from_timestamp: i64,
    pub to_timestamp: i64,
    pub distance_km: f64,
    pub elapsed_hours: f64,
    /// Serialized as `null` when the speed is unbounded.
    #[serde(with = "unbounded_speed")]
    pub speed_kmh: f64,
    pub suspicious: bool,
}

/// JSON has no infinity, so an unbounded speed travels as `null`
mod unbounded_speed {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(speed: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        let finite = if speed.is_infinite() { None } else { Some(*speed) };
        finite.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
