//! Two-line display panel
//!
//!  Shows the nearest recent approach on a 16x2 character panel, alternating
//!  every refresh between the distance/bearing/altitude frame and the route
//!  frame. The panel goes dark once the shown alert is older than the
//!  persist threshold.

use std::io::{self, Write};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::warn;

use crate::dispatch::{Alert, AlertSink, SinkError};
use crate::verbalize::{Compass, cardinal_direction};

/// Panel width in characters
pub const WIDTH: usize = 16;

/// Feet per nautical mile, for slant range
const FT_PER_NM: f64 = 6080.0;

/// Altitude assumed when a report has none
const ASSUMED_ALTITUDE_FT: f64 = 5000.0;

const QUEUE_CAPACITY: usize = 64;

/// A character display with a backlight
pub trait DisplayDevice: Send {
    fn show(&mut self, line1: &str, line2: &str) -> io::Result<()>;
    fn backlight(&mut self, on: bool) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
}

/// What the panel should do on a refresh tick
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Nothing shown, nothing to change
    Idle,
    /// The shown alert expired: clear and switch the backlight off
    Off,
    Lines(String, String),
}

/// Straight-line distance in feet from the observer, folding in altitude
fn slant_range_ft(alert: &Alert) -> f64 {
    let ground = alert.distance * FT_PER_NM;
    let altitude = alert.position.altitude.unwrap_or(ASSUMED_ALTITUDE_FT);
    (ground * ground + altitude * altitude).sqrt()
}

/// Whether `incoming` should take the panel from `shown`
pub fn should_replace(
    shown: Option<&Alert>,
    incoming: &Alert,
    now: DateTime<Utc>,
    persist: chrono::Duration,
) -> bool {
    let Some(shown) = shown else {
        return true;
    };
    if slant_range_ft(incoming) < slant_range_ft(shown) {
        return true;
    }
    // A stale alert gives way even to a farther one
    now - shown.position.timestamp > persist
}

/// Non-blank and no longer than an ICAO aerodrome code
fn is_airport(code: &str) -> bool {
    !code.is_empty() && code.len() <= 4
}

/// Truncate or pad to the panel width
fn fit(line: &str) -> String {
    let line: String = line.chars().take(WIDTH).collect();
    format!("{:<width$}", line, width = WIDTH)
}

fn title_line(alert: &Alert) -> String {
    fit(&format!(
        "{} {}",
        alert.position.ident, alert.position.aircraft_type
    ))
}

fn flip_lines(alert: &Alert) -> (String, String) {
    let altitude = alert
        .position
        .altitude
        .map(|alt| format!("{:03.0}", alt / 100.0))
        .unwrap_or_default();
    let line2 = format!(
        "{:.1}nm {} {}",
        alert.distance,
        cardinal_direction(alert.bearing, Compass::Abbrev),
        altitude
    );
    (title_line(alert), fit(&line2))
}

fn flop_lines(alert: &Alert) -> (String, String) {
    let pos = &alert.position;
    if !is_airport(&pos.origin) && !is_airport(&pos.destination) {
        return flip_lines(alert);
    }
    let orig = if is_airport(&pos.origin) { pos.origin.as_str() } else { "????" };
    let dest = if is_airport(&pos.destination) { pos.destination.as_str() } else { "????" };
    (title_line(alert), fit(&format!("{}-{}", orig, dest)))
}

/// Panel state: the alert being shown and which frame is next
pub struct Panel {
    shown: Option<Alert>,
    flip: bool,
    persist: chrono::Duration,
    /// Newest alert timestamp and the wall time it arrived. Ages are
    /// measured on the alerts' own timeline, so replayed traffic with
    /// historical timestamps still persists for the full threshold.
    anchor: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl Panel {
    pub fn new(persist: Duration) -> Self {
        Self {
            shown: None,
            flip: false,
            persist: chrono::Duration::from_std(persist).unwrap_or(chrono::Duration::MAX),
            anchor: None,
        }
    }

    /// Current time on the alert timeline
    fn clock(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.anchor {
            Some((stamp, arrived)) => stamp + (now - arrived),
            None => now,
        }
    }

    pub fn offer(&mut self, alert: Alert, now: DateTime<Utc>) {
        let stamp = alert.position.timestamp;
        if self.anchor.is_none_or(|(newest, _)| stamp > newest) {
            self.anchor = Some((stamp, now));
        }
        if should_replace(self.shown.as_ref(), &alert, self.clock(now), self.persist) {
            self.shown = Some(alert);
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Frame {
        self.flip = !self.flip;
        let now = self.clock(now);

        let Some(shown) = &self.shown else {
            return Frame::Idle;
        };
        if now - shown.position.timestamp > self.persist {
            self.shown = None;
            return Frame::Off;
        }

        let (line1, line2) = if self.flip {
            flip_lines(shown)
        } else {
            flop_lines(shown)
        };
        Frame::Lines(line1, line2)
    }
}

/// Sink half: hands alerts to the renderer task
pub struct DisplaySink {
    tx: Sender<Alert>,
}

/// Create the sink and the receiving end for [`run_panel`]
pub fn channel() -> (DisplaySink, Receiver<Alert>) {
    let (tx, rx) = bounded(QUEUE_CAPACITY);
    (DisplaySink { tx }, rx)
}

#[async_trait]
impl AlertSink for DisplaySink {
    fn name(&self) -> &'static str {
        "display"
    }

    async fn deliver(&self, alert: Alert) -> Result<(), SinkError> {
        self.tx.try_send(alert).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Closed("display queue full"),
            TrySendError::Disconnected(_) => SinkError::Closed("display renderer stopped"),
        })
    }
}

/// Renderer loop: drains new alerts and redraws every `refresh`
pub async fn run_panel(
    rx: Receiver<Alert>,
    mut device: Box<dyn DisplayDevice>,
    refresh: Duration,
    persist: Duration,
) {
    let mut panel = Panel::new(persist);
    let mut interval = tokio::time::interval(refresh);

    loop {
        interval.tick().await;
        let now = Utc::now();
        for alert in rx.try_iter() {
            panel.offer(alert, now);
        }

        let result = match panel.tick(now) {
            Frame::Idle => Ok(()),
            Frame::Off => device.clear().and_then(|_| device.backlight(false)),
            Frame::Lines(line1, line2) => {
                device.backlight(true).and_then(|_| device.show(&line1, &line2))
            }
        };
        if let Err(e) = result {
            warn!("display error: {}", e);
        }
    }
}

/// Draws the panel in the terminal
pub struct TerminalDisplay<W: Write + Send> {
    out: W,
    lit: bool,
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, lit: false }
    }
}

impl<W: Write + Send> DisplayDevice for TerminalDisplay<W> {
    fn show(&mut self, line1: &str, line2: &str) -> io::Result<()> {
        const BOLD: &str = "\x1B[1m";
        const DIM: &str = "\x1B[2m";
        const RESET: &str = "\x1B[0m";

        let style = if self.lit { BOLD } else { DIM };
        let border = "-".repeat(WIDTH);
        writeln!(self.out, "+{border}+")?;
        writeln!(self.out, "|{style}{}{RESET}|", fit(line1))?;
        writeln!(self.out, "|{style}{}{RESET}|", fit(line2))?;
        writeln!(self.out, "+{border}+")?;
        self.out.flush()
    }

    fn backlight(&mut self, on: bool) -> io::Result<()> {
        self.lit = on;
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        let blank = " ".repeat(WIDTH);
        self.show(&blank, &blank)
    }
}
