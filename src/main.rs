//!   overhead:   announce aircraft approaching a fixed observation point
//!
//!  Watches a live position stream, tracks every flight inside the outer
//!  radius, and alerts whenever one gets strictly closer inside the alert
//!  radius.

mod config;
mod console;
mod dispatch;
mod display;
mod geo;
mod ingest;
mod position;
mod proximity;
mod speech;
mod tracker;
mod transport;
mod verbalize;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use tracing::{Level, debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{Config, Source};
use crate::console::ConsoleSink;
use crate::dispatch::{AlertSink, Dispatcher};
use crate::display::TerminalDisplay;
use crate::ingest::Ingestor;
use crate::speech::SpeechSink;
use crate::transport::InitCommand;
use crate::webhook::WebhookSink;

/// How often the display panel redraws
const DISPLAY_REFRESH: Duration = Duration::from_secs(5);

/// How long shutdown waits for in-flight alert deliveries
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_args()?;

    // Logs go to stderr so stdout carries only alerts
    let default_level = if config.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("overhead starting...");
    info!(
        "Watching {:.4},{:.4}: {}nm below {}ft, alerting inside {}nm",
        config.latitude,
        config.longitude,
        config.interesting_radius,
        config.interesting_ceiling,
        config.alert_radius
    );
    debug!("Source: {:?}", config.source);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let observer = config.observer();

    let mut sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(ConsoleSink)];
    if let Some(url) = &config.webhook_url {
        sinks.push(Arc::new(WebhookSink::new(url.clone(), config.webhook_timeout)?));
    }
    if config.announce {
        let sink = SpeechSink::new(&config.speech_command).ok_or("empty speech command")?;
        sinks.push(Arc::new(sink));
    }

    // Display renderer runs on its own until shutdown
    let display_handle = if config.display {
        let (sink, rx) = display::channel();
        sinks.push(Arc::new(sink));
        let device = Box::new(TerminalDisplay::new(std::io::stdout()));
        Some(tokio::spawn(display::run_panel(
            rx,
            device,
            DISPLAY_REFRESH,
            config.persist,
        )))
    } else {
        None
    };

    let dispatcher = Dispatcher::new(sinks);
    info!("Alert sinks: {}", dispatcher.sink_names().join(", "));
    let mut ingestor = Ingestor::new(observer, config.cleanup_after, dispatcher);

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
    };

    let result = match &config.source {
        Source::Stream(addr) => {
            let init = InitCommand {
                username: config.username.clone(),
                password: config.password.clone(),
                bbox: geo::observation_box(observer.center, config.interesting_radius),
            };
            let mut stream = transport::connect(addr, &init).await?;
            ingestor.run(&mut stream, shutdown).await
        }
        Source::Replay(path) => {
            let mut stream = transport::open_replay(path).await?;
            ingestor.run(&mut stream, shutdown).await
        }
    };

    // Cleanup
    ingestor.shutdown(SHUTDOWN_GRACE).await;
    if let Some(h) = display_handle {
        h.abort();
    }

    result.map_err(Into::into)
}
