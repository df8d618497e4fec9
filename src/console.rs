//! Console sink: one human readable line per approach

use async_trait::async_trait;

use crate::dispatch::{Alert, AlertSink, SinkError};
use crate::verbalize::{Compass, cardinal_direction};

const TRACKING_URL: &str = "https://www.flightaware.com/live/flight/id/";

pub struct ConsoleSink;

#[async_trait]
impl AlertSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn deliver(&self, alert: Alert) -> Result<(), SinkError> {
        println!("{}", render(&alert));
        Ok(())
    }
}

/// e.g. `[14:02:11] UAL641 (B739) from KORD to KBOS is 0.8nm to the north at 2500ft southbound at 160kts`
pub fn render(alert: &Alert) -> String {
    let pos = &alert.position;
    let mut line = format!("[{}] {}", pos.timestamp.format("%H:%M:%S"), pos.ident);

    if !pos.aircraft_type.is_empty() {
        line.push_str(&format!(" ({})", pos.aircraft_type));
    }
    line.push_str(&format!(" from {}", pos.origin));
    if !pos.destination.is_empty() {
        line.push_str(&format!(" to {}", pos.destination));
    }
    line.push_str(&format!(
        " is {:.1}nm to the {}",
        alert.distance,
        cardinal_direction(alert.bearing, Compass::Words)
    ));
    if let Some(altitude) = pos.altitude {
        line.push_str(&format!(" at {:.0}ft", altitude));
    }

    let direction = match pos.heading {
        Some(heading) => format!("{}bound", cardinal_direction(heading, Compass::Words)),
        None => "travelling".to_string(),
    };
    if let Some(speed) = pos.ground_speed {
        line.push_str(&format!(" {} at {:.0}kts", direction, speed));
    }

    line.push_str(&format!("\n           {}{}", TRACKING_URL, pos.flight_id));
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proximity::tests::{observer, position_at};

    #[test]
    fn test_render_full() {
        let mut pos = position_at("UAL641-1-airline-0", 0.8, 1_700_000_000);
        pos.ident = "UAL641".to_string();
        let alert = Alert::new(pos, &observer());

        assert_eq!(
            render(&alert),
            "[22:13:20] UAL641 (B739) from KORD to KBOS is 0.8nm to the north at 2500ft southbound at 160kts\n           https://www.flightaware.com/live/flight/id/UAL641-1-airline-0"
        );
    }

    #[test]
    fn test_render_sparse() {
        let mut pos = position_at("x", 1.5, 1_700_000_000);
        pos.ident = "N123AB".to_string();
        pos.aircraft_type.clear();
        pos.destination.clear();
        pos.altitude = None;
        pos.heading = None;
        let alert = Alert::new(pos, &observer());

        let first = render(&alert).lines().next().unwrap().to_string();
        assert_eq!(
            first,
            "[22:13:20] N123AB from KORD is 1.5nm to the north travelling at 160kts"
        );
    }
}
