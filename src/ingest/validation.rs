use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use super::{IngestError, LoginRecord};

/// Four dotted 0-255 octets, nothing else
const IPV4_PATTERN: &str = r"^(?:(?:^|\.)(?:2(?:5[0-5]|[0-4]\d)|1?\d?\d)){4}$";

fn ipv4_regex() -> &'static Regex {
    static IPV4: OnceLock<Regex> = OnceLock::new();
    IPV4.get_or_init(|| Regex::new(IPV4_PATTERN).expect("IPv4 pattern is valid"))
}

/// Parse an address in canonical dotted-quad form.
///
/// Octets with leading zeros are rejected, as they are ambiguous between
/// decimal and octal readings.
pub fn parse_ipv4(address: &str) -> Option<Ipv4Addr> {
    if !ipv4_regex().is_match(address) {
        return None;
    }
    Ipv4Addr::from_str(address).ok()
}

pub fn is_valid_ipv4(address: &str) -> bool {
    parse_ipv4(address).is_some()
}

/// Check a decoded record and return its parsed source address
pub fn validate_record(record: &LoginRecord) -> Result<Ipv4Addr, IngestError> {
    if record.username.is_empty() {
        return Err(IngestError::InvalidInput("username must not be empty".to_string()));
    }
    if record.event_uuid.is_empty() {
        return Err(IngestError::InvalidInput("event_uuid must not be empty".to_string()));
    }
    parse_ipv4(&record.ip_address).ok_or_else(|| {
        IngestError::InvalidInput(format!(
            "ip_address '{}' is not a dotted-quad IPv4 address",
            record.ip_address
        ))
    })
}
