//! Ingestion loop
//!
//!  Reports are handled strictly one at a time: parse, filter, compare with
//!  the flight's previous position, dispatch on approach, store, then evict
//!  stale flights against the logical clock.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dispatch::{Alert, Dispatcher};
use crate::position::{Position, RawPosition};
use crate::proximity::Observer;
use crate::tracker::FlightTracker;
use crate::transport::{MessageSource, StreamMessage, TransportError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("stream error: {0}")]
    Stream(String),
}

pub struct Ingestor {
    observer: Observer,
    cleanup_after: chrono::Duration,
    tracker: FlightTracker,
    /// Latest report timestamp seen; never moves backwards
    clock: Option<DateTime<Utc>>,
    dispatcher: Dispatcher,
}

impl Ingestor {
    pub fn new(observer: Observer, cleanup_after: Duration, dispatcher: Dispatcher) -> Self {
        Self {
            observer,
            cleanup_after: chrono::Duration::from_std(cleanup_after)
                .unwrap_or(chrono::Duration::MAX),
            tracker: FlightTracker::new(),
            clock: None,
            dispatcher,
        }
    }

    /// Consume messages until the stream ends, upstream reports an error, or
    /// `shutdown` resolves. Shutdown and end of stream are not errors.
    pub async fn run<F>(&mut self, source: &mut dyn MessageSource, shutdown: F) -> Result<(), RunError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let msg = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Interrupted, stopping ingestion");
                    return Ok(());
                }
                msg = source.next_message() => msg?,
            };

            match msg {
                Some(StreamMessage::Position(raw)) => {
                    self.handle_position(&raw);
                }
                Some(StreamMessage::Error { error_msg }) => {
                    return Err(RunError::Stream(error_msg));
                }
                Some(StreamMessage::Other) => {}
                None => {
                    info!("Stream ended");
                    return Ok(());
                }
            }

            self.sweep();
        }
    }

    /// Process one report. Returns whether it triggered an alert.
    pub fn handle_position(&mut self, raw: &RawPosition) -> bool {
        let current = match Position::from_raw(raw) {
            Ok(p) => p,
            Err(e) => {
                warn!("could not translate position message: {}", e);
                return false;
            }
        };

        self.advance_clock(current.timestamp);
        if !self.observer.is_interesting(&current) {
            return false;
        }

        // The latest report always replaces the stored one, alert or not
        let previous = self.tracker.upsert(current.clone());
        if !self.observer.should_alert(previous.as_ref(), &current) {
            return false;
        }

        let alert = Alert::new(current, &self.observer);
        info!(
            "{} ({}) approaching: {:.1}nm",
            alert.position.ident, alert.position.flight_id, alert.distance
        );
        self.dispatcher.dispatch(&alert);
        true
    }

    fn advance_clock(&mut self, timestamp: DateTime<Utc>) {
        if self.clock.is_none_or(|clock| timestamp > clock) {
            self.clock = Some(timestamp);
        }
    }

    fn sweep(&mut self) {
        let Some(clock) = self.clock else {
            return;
        };
        let removed = self.tracker.sweep(clock, self.cleanup_after);
        if removed > 0 {
            debug!(
                "Evicted {} stale flights, {} still tracked",
                removed,
                self.tracker.len()
            );
        }
    }

    #[allow(dead_code)]
    pub fn tracker(&self) -> &FlightTracker {
        &self.tracker
    }

    /// Wait up to `grace` for outstanding alert deliveries
    pub async fn shutdown(&mut self, grace: Duration) {
        self.dispatcher.shutdown(grace).await;
    }
}
