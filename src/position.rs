//! Position reports
//!
//!  Turns the string-typed fields of a stream report into a typed `Position`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::LatLong;

/// Report exactly as it arrives on the wire. Every field is a string and
/// missing keys read as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPosition {
    pub id: String,
    pub lat: String,
    pub lon: String,
    pub alt: String,
    pub ident: String,
    pub reg: String,
    pub orig: String,
    pub dest: String,
    pub aircraft_type: String,
    pub gs: String,
    pub heading: String,
    pub heading_true: String,
    pub clock: String,
}

/// Field that failed to parse, with the offending input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("flight id: empty")]
    FlightId,
    #[error("lat: invalid value {0:?}")]
    Latitude(String),
    #[error("lon: invalid value {0:?}")]
    Longitude(String),
    #[error("alt: invalid value {0:?}")]
    Altitude(String),
    #[error("gs: invalid value {0:?}")]
    GroundSpeed(String),
    #[error("heading: invalid value {0:?}")]
    Heading(String),
    #[error("clock: invalid value {0:?}")]
    Clock(String),
}

/// One aircraft observation. Serialises to the webhook snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Position {
    #[serde(rename = "FlightID")]
    pub flight_id: String,
    pub point: LatLong,
    /// Altitude in feet
    pub altitude: Option<f64>,
    pub ident: String,
    #[serde(rename = "Reg")]
    pub registration: String,
    pub origin: String,
    pub destination: String,
    pub aircraft_type: String,
    /// Ground speed in knots
    #[serde(rename = "Speed")]
    pub ground_speed: Option<f64>,
    /// Heading in degrees, true if reported, otherwise magnetic
    pub heading: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn from_raw(raw: &RawPosition) -> Result<Self, ParseError> {
        if raw.id.is_empty() {
            return Err(ParseError::FlightId);
        }

        let lat = parse_finite(&raw.lat).ok_or_else(|| ParseError::Latitude(raw.lat.clone()))?;
        let lon = parse_finite(&raw.lon).ok_or_else(|| ParseError::Longitude(raw.lon.clone()))?;
        let altitude = parse_optional(&raw.alt).map_err(ParseError::Altitude)?;
        let ground_speed = parse_optional(&raw.gs).map_err(ParseError::GroundSpeed)?;

        // True heading wins over magnetic when both are reported
        let heading_field = if raw.heading_true.is_empty() {
            &raw.heading
        } else {
            &raw.heading_true
        };
        let heading = parse_optional(heading_field).map_err(ParseError::Heading)?;

        let timestamp = raw
            .clock
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| ParseError::Clock(raw.clock.clone()))?;

        Ok(Self {
            flight_id: raw.id.clone(),
            point: LatLong::new(lat, lon),
            altitude,
            ident: raw.ident.clone(),
            registration: raw.reg.clone(),
            origin: raw.orig.clone(),
            destination: raw.dest.clone(),
            aircraft_type: raw.aircraft_type.clone(),
            ground_speed,
            heading,
            timestamp,
        })
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Empty means absent; anything else must be a finite number
fn parse_optional(s: &str) -> Result<Option<f64>, String> {
    if s.is_empty() {
        return Ok(None);
    }
    parse_finite(s).map(Some).ok_or_else(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawPosition {
        RawPosition {
            id: "UAL641-1700000000-airline-0123".to_string(),
            lat: "42.36".to_string(),
            lon: "-71.01".to_string(),
            alt: "3500".to_string(),
            ident: "UAL641".to_string(),
            reg: "N12345".to_string(),
            orig: "KORD".to_string(),
            dest: "KBOS".to_string(),
            aircraft_type: "B739".to_string(),
            gs: "180".to_string(),
            heading: "270".to_string(),
            heading_true: String::new(),
            clock: "1700000000".to_string(),
        }
    }

    #[test]
    fn test_full_report() {
        let pos = Position::from_raw(&raw()).unwrap();
        assert_eq!(pos.flight_id, "UAL641-1700000000-airline-0123");
        assert_eq!(pos.point, LatLong::new(42.36, -71.01));
        assert_eq!(pos.altitude, Some(3500.0));
        assert_eq!(pos.ground_speed, Some(180.0));
        assert_eq!(pos.heading, Some(270.0));
        assert_eq!(pos.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(pos.registration, "N12345");
    }

    #[test]
    fn test_empty_optionals_are_absent() {
        let mut r = raw();
        r.alt.clear();
        r.gs.clear();
        r.heading.clear();
        let pos = Position::from_raw(&r).unwrap();
        assert!(pos.altitude.is_none());
        assert!(pos.ground_speed.is_none());
        assert!(pos.heading.is_none());
    }

    #[test]
    fn test_zero_is_not_absent() {
        let mut r = raw();
        r.alt = "0".to_string();
        r.gs = "0".to_string();
        r.heading = "0".to_string();
        let pos = Position::from_raw(&r).unwrap();
        assert_eq!(pos.altitude, Some(0.0));
        assert_eq!(pos.ground_speed, Some(0.0));
        assert_eq!(pos.heading, Some(0.0));
    }

    #[test]
    fn test_true_heading_wins() {
        let mut r = raw();
        r.heading = "270".to_string();
        r.heading_true = "265".to_string();
        assert_eq!(Position::from_raw(&r).unwrap().heading, Some(265.0));

        // Magnetic heading is not consulted once true heading is present
        r.heading = "garbage".to_string();
        assert_eq!(Position::from_raw(&r).unwrap().heading, Some(265.0));
    }

    fn assert_fails(mutate: impl Fn(&mut RawPosition), expected: ParseError) {
        let mut r = raw();
        mutate(&mut r);
        assert_eq!(Position::from_raw(&r), Err(expected));
    }

    #[test]
    fn test_errors_name_the_field() {
        assert_fails(|r| r.id.clear(), ParseError::FlightId);
        assert_fails(|r| r.lat = "north".into(), ParseError::Latitude("north".into()));
        assert_fails(|r| r.lon.clear(), ParseError::Longitude(String::new()));
        assert_fails(|r| r.alt = "high".into(), ParseError::Altitude("high".into()));
        assert_fails(|r| r.gs = "fast".into(), ParseError::GroundSpeed("fast".into()));
        assert_fails(|r| r.heading = "west".into(), ParseError::Heading("west".into()));
        assert_fails(|r| r.heading_true = "NaN".into(), ParseError::Heading("NaN".into()));
        assert_fails(|r| r.clock = "1700000000.5".into(), ParseError::Clock("1700000000.5".into()));
        assert_fails(|r| r.clock.clear(), ParseError::Clock(String::new()));
    }

    #[test]
    fn test_webhook_snapshot_shape() {
        let mut r = raw();
        r.gs.clear();
        let pos = Position::from_raw(&r).unwrap();
        let json = serde_json::to_value(&pos).unwrap();

        assert_eq!(json["FlightID"], "UAL641-1700000000-airline-0123");
        assert_eq!(json["Point"]["Lat"], 42.36);
        assert_eq!(json["Point"]["Long"], -71.01);
        assert_eq!(json["Ident"], "UAL641");
        assert_eq!(json["Reg"], "N12345");
        assert_eq!(json["AircraftType"], "B739");
        assert_eq!(json["Origin"], "KORD");
        assert_eq!(json["Destination"], "KBOS");
        assert!(json["Speed"].is_null());
        assert_eq!(json["Timestamp"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_missing_json_keys_read_as_empty() {
        let r: RawPosition =
            serde_json::from_str(r#"{"id":"abc","lat":"1","lon":"2","clock":"10"}"#).unwrap();
        let pos = Position::from_raw(&r).unwrap();
        assert!(pos.altitude.is_none());
        assert_eq!(pos.ident, "");
    }
}
