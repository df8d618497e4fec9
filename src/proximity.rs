//! Observation point and the rules for which reports matter
//!
//!  A report is *interesting* when it is inside the outer radius and under the
//!  ceiling. An interesting report *alerts* when it is inside the alert radius
//!  and strictly closer than the flight's previous interesting report.

use crate::geo::{self, LatLong};
use crate::position::Position;

#[derive(Debug, Clone, Copy)]
pub struct Observer {
    pub center: LatLong,
    /// Outer radius in nautical miles
    pub interesting_radius: f64,
    /// Altitude ceiling in feet
    pub interesting_ceiling: f64,
    /// Alert radius in nautical miles
    pub alert_radius: f64,
}

impl Observer {
    pub fn distance_to(&self, position: &Position) -> f64 {
        geo::distance_nm(position.point, self.center)
    }

    pub fn bearing_to(&self, position: &Position) -> f64 {
        geo::bearing_degrees(self.center, position.point)
    }

    /// An unknown altitude never disqualifies a report
    pub fn is_interesting(&self, position: &Position) -> bool {
        if self.distance_to(position) > self.interesting_radius {
            return false;
        }
        match position.altitude {
            Some(alt) => alt <= self.interesting_ceiling,
            None => true,
        }
    }

    /// First sightings never alert.
    pub fn should_alert(&self, previous: Option<&Position>, current: &Position) -> bool {
        let Some(previous) = previous else {
            return false;
        };
        let dist_to_prev = self.distance_to(previous);
        let dist_to_curr = self.distance_to(current);
        dist_to_curr < dist_to_prev && dist_to_curr < self.alert_radius
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::DateTime;

    pub(crate) fn observer() -> Observer {
        Observer {
            center: LatLong::new(42.3656, -71.0096),
            interesting_radius: 10.0,
            interesting_ceiling: 15000.0,
            alert_radius: 3.0,
        }
    }

    /// Position `distance` nm due north of the test observer
    pub(crate) fn position_at(flight_id: &str, distance: f64, clock: i64) -> Position {
        Position {
            flight_id: flight_id.to_string(),
            point: geo::project(observer().center, 0.0, distance),
            altitude: Some(2500.0),
            ident: flight_id.to_string(),
            registration: String::new(),
            origin: "KORD".to_string(),
            destination: "KBOS".to_string(),
            aircraft_type: "B739".to_string(),
            ground_speed: Some(160.0),
            heading: Some(180.0),
            timestamp: DateTime::from_timestamp(clock, 0).unwrap(),
        }
    }

    #[test]
    fn test_interesting_radius() {
        let obs = observer();
        assert!(obs.is_interesting(&position_at("a", 0.0, 0)));
        assert!(obs.is_interesting(&position_at("a", 9.9, 0)));
        assert!(!obs.is_interesting(&position_at("a", 10.1, 0)));
    }

    #[test]
    fn test_interesting_ceiling() {
        let obs = observer();
        let mut p = position_at("a", 2.0, 0);
        p.altitude = Some(15000.0);
        assert!(obs.is_interesting(&p));
        p.altitude = Some(15001.0);
        assert!(!obs.is_interesting(&p));
        p.altitude = None;
        assert!(obs.is_interesting(&p));
    }

    #[test]
    fn test_first_sighting_never_alerts() {
        let obs = observer();
        for d in [0.0, 0.5, 2.9, 5.0] {
            assert!(!obs.should_alert(None, &position_at("a", d, 0)));
        }
    }

    #[test]
    fn test_alert_requires_closer_and_inside() {
        let obs = observer();
        let cases = [
            // (previous, current, expected)
            (1.4, 0.8, true),
            (0.8, 1.2, false),
            (5.0, 2.9, true),
            (5.0, 3.1, false),
            (4.0, 3.5, false),
            (1.0, 1.0, false),
        ];
        for (prev, curr, expected) in cases {
            let p = position_at("a", prev, 0);
            let c = position_at("a", curr, 10);
            assert_eq!(
                obs.should_alert(Some(&p), &c),
                expected,
                "prev {prev}nm curr {curr}nm"
            );
        }
    }
}
