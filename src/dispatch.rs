//! Alert fan-out
//!
//!  Every approach event is handed to each enabled sink in its own task. A
//!  sink that fails or stalls only affects itself; the ingestion loop never
//!  waits on any of them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::position::Position;
use crate::proximity::Observer;

/// An approach event as handed to sinks
#[derive(Debug, Clone)]
pub struct Alert {
    pub position: Position,
    /// Distance from the observer in nautical miles
    pub distance: f64,
    /// Bearing from the observer towards the aircraft in degrees
    pub bearing: f64,
}

impl Alert {
    pub fn new(position: Position, observer: &Observer) -> Self {
        let distance = observer.distance_to(&position);
        let bearing = observer.bearing_to(&position);
        Self {
            position,
            distance,
            bearing,
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("speech command exited with {0}")]
    Speech(std::process::ExitStatus),
    #[error("{0}")]
    Closed(&'static str),
}

/// An output channel for approach events
#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, alert: Alert) -> Result<(), SinkError>;
}

/// Fans alerts out to sinks without waiting for them
pub struct Dispatcher {
    sinks: Vec<Arc<dyn AlertSink>>,
    tasks: JoinSet<()>,
}

impl Dispatcher {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self {
            sinks,
            tasks: JoinSet::new(),
        }
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Spawn one delivery task per sink. Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, alert: &Alert) {
        // Reap whatever finished since the last dispatch
        while self.tasks.try_join_next().is_some() {}

        for sink in &self.sinks {
            let sink = Arc::clone(sink);
            let alert = alert.clone();
            self.tasks.spawn(async move {
                let name = sink.name();
                let flight = alert.position.flight_id.clone();
                match sink.deliver(alert).await {
                    Ok(()) => debug!("{} delivered alert for {}", name, flight),
                    Err(e) => warn!("{} sink failed for {}: {}", name, flight, e),
                }
            });
        }
    }

    /// Number of deliveries still running
    #[allow(dead_code)]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Give outstanding deliveries up to `grace` to finish, then abort the rest
    pub async fn shutdown(&mut self, grace: Duration) {
        let drain = async { while self.tasks.join_next().await.is_some() {} };
        if tokio::time::timeout(grace, drain).await.is_err() {
            warn!(
                "abandoning {} unfinished alert deliveries",
                self.tasks.len()
            );
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::proximity::tests::{observer, position_at};
    use parking_lot::Mutex;

    /// Sink that records every alert it receives
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) alerts: Mutex<Vec<Alert>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn deliver(&self, alert: Alert) -> Result<(), SinkError> {
            self.alerts.lock().push(alert);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AlertSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn deliver(&self, _alert: Alert) -> Result<(), SinkError> {
            Err(SinkError::Closed("always fails"))
        }
    }

    struct StalledSink;

    #[async_trait]
    impl AlertSink for StalledSink {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn deliver(&self, _alert: Alert) -> Result<(), SinkError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[test]
    fn test_alert_carries_distance_and_bearing() {
        let alert = Alert::new(position_at("a", 2.0, 0), &observer());
        assert!((alert.distance - 2.0).abs() < 1e-6);
        assert!(alert.bearing < 1e-3 || alert.bearing > 359.999);
    }

    #[tokio::test]
    async fn test_failing_and_stalled_sinks_are_isolated() {
        let recorder = Arc::new(RecordingSink::default());
        let mut dispatcher = Dispatcher::new(vec![
            Arc::new(FailingSink),
            Arc::new(StalledSink),
            recorder.clone(),
        ]);
        assert_eq!(dispatcher.sink_names(), vec!["failing", "stalled", "recording"]);

        let alert = Alert::new(position_at("a", 1.0, 0), &observer());
        dispatcher.dispatch(&alert);
        dispatcher.dispatch(&alert);

        dispatcher.shutdown(Duration::from_millis(200)).await;
        assert_eq!(recorder.alerts.lock().len(), 2);
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_each_sink_gets_its_own_copy() {
        let first = Arc::new(RecordingSink::default());
        let second = Arc::new(RecordingSink::default());
        let mut dispatcher = Dispatcher::new(vec![first.clone(), second.clone()]);

        dispatcher.dispatch(&Alert::new(position_at("a", 1.0, 0), &observer()));
        dispatcher.shutdown(Duration::from_secs(1)).await;

        assert_eq!(first.alerts.lock()[0].position.flight_id, "a");
        assert_eq!(second.alerts.lock()[0].position.flight_id, "a");
    }
}
