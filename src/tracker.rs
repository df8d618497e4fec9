//! Flight tracking
//!
//!  Keeps the most recent interesting position for each flight and evicts
//!  flights that have stopped reporting.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::position::Position;

/// Default age after which a silent flight is forgotten
pub const DEFAULT_CLEANUP_AFTER_SECS: u64 = 10 * 60;

/// Latest accepted position per flight identifier
#[derive(Debug, Default)]
pub struct FlightTracker {
    flights: HashMap<String, Position>,
}

impl FlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `position` as the flight's latest entry, returning the one it replaces
    pub fn upsert(&mut self, position: Position) -> Option<Position> {
        self.flights.insert(position.flight_id.clone(), position)
    }

    pub fn get(&self, flight_id: &str) -> Option<&Position> {
        self.flights.get(flight_id)
    }

    #[allow(dead_code)]
    pub fn remove(&mut self, flight_id: &str) -> Option<Position> {
        self.flights.remove(flight_id)
    }

    #[allow(dead_code)]
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.flights.values()
    }

    /// Remove flights last heard more than `max_age` before `clock`.
    /// Returns how many were removed.
    pub fn sweep(&mut self, clock: DateTime<Utc>, max_age: Duration) -> usize {
        let before = self.flights.len();
        self.flights
            .retain(|_, p| p.timestamp + max_age >= clock);
        before - self.flights.len()
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}
