//! Configuration: defaults, overridden by a TOML file, overridden by flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::geo::LatLong;
use crate::proximity::Observer;
use crate::speech;
use crate::tracker::DEFAULT_CLEANUP_AFTER_SECS;
use crate::webhook;

const DEFAULT_STREAM_ADDR: &str = "127.0.0.1:1501";
const CONFIG_FILE_NAME: &str = "overhead.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Command-line flags. Every setting is optional here so that an absent
/// flag falls through to the config file.
#[derive(Parser, Debug, Default)]
#[command(
    name = "overhead",
    about = "Announce aircraft approaching a fixed observation point"
)]
pub struct Args {
    /// Config file (default: ~/.config/overhead/overhead.toml, then ./overhead.toml)
    #[arg(short = 'c', long = "config-file")]
    pub config_file: Option<PathBuf>,
    /// Username for stream authentication
    #[arg(long)]
    pub username: Option<String>,
    /// Password for stream authentication
    #[arg(long)]
    pub password: Option<String>,
    /// Observation point latitude
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,
    /// Observation point longitude
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,
    /// Radius in nautical miles around location to watch for flights [default: 10]
    #[arg(long)]
    pub interesting_radius: Option<f64>,
    /// Maximum altitude in feet to watch for flights [default: 15000]
    #[arg(long)]
    pub interesting_ceiling: Option<f64>,
    /// Radius in nautical miles around location to alert on approaching flights [default: 3]
    #[arg(long)]
    pub alert_radius: Option<f64>,
    /// Forget flights silent for this many seconds [default: 600]
    #[arg(long)]
    pub cleanup_after: Option<u64>,
    /// Aurally announce approaching aircraft
    #[arg(long, overrides_with = "no_announce")]
    pub announce: bool,
    /// Stay quiet even if the config file enables announcements
    #[arg(long, overrides_with = "announce")]
    pub no_announce: bool,
    /// Text-to-speech command, split on whitespace; the utterance is appended.
    /// Use the config file's list form for arguments containing spaces [default: "say -r 200"]
    #[arg(long)]
    pub speech_command: Option<String>,
    /// URL to optionally send position updates to
    #[arg(long)]
    pub webhook_url: Option<String>,
    /// Webhook request timeout in seconds [default: 10]
    #[arg(long)]
    pub webhook_timeout: Option<u64>,
    /// Show the nearest approach on the two-line panel
    #[arg(long, overrides_with = "no_display")]
    pub display: bool,
    /// Keep the panel off even if the config file enables it
    #[arg(long, overrides_with = "display")]
    pub no_display: bool,
    /// Keep a flight on the panel for at most this many seconds [default: 60]
    #[arg(long)]
    pub persist: Option<u64>,
    /// Stream address as host:port [default: 127.0.0.1:1501]
    #[arg(long)]
    pub stream: Option<String>,
    /// Replay recorded JSON lines from a file ('-' for stdin) instead of connecting
    #[arg(long)]
    pub replay: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings read from the TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub interesting_radius: Option<f64>,
    pub interesting_ceiling: Option<f64>,
    pub alert_radius: Option<f64>,
    pub cleanup_after: Option<u64>,
    pub announce: Option<bool>,
    pub speech_command: Option<SpeechCommand>,
    pub webhook_url: Option<String>,
    pub webhook_timeout: Option<u64>,
    pub display: Option<bool>,
    pub persist: Option<u64>,
    pub stream: Option<String>,
}

/// `speech-command` as one whitespace-separated string or as a list of words
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SpeechCommand {
    Line(String),
    Words(Vec<String>),
}

impl SpeechCommand {
    pub fn into_words(self) -> Vec<String> {
        match self {
            SpeechCommand::Line(line) => line.split_whitespace().map(String::from).collect(),
            SpeechCommand::Words(words) => words,
        }
    }
}

/// `--flag` or `--no-flag`, whichever came last; `None` when neither was given
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Where position messages come from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Stream(String),
    Replay(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    // Stream
    pub username: String,
    pub password: String,
    pub source: Source,

    // Observation point
    pub latitude: f64,
    pub longitude: f64,
    pub interesting_radius: f64,
    pub interesting_ceiling: f64,
    pub alert_radius: f64,
    pub cleanup_after: Duration,

    // Sinks
    pub announce: bool,
    pub speech_command: Vec<String>,
    pub webhook_url: Option<String>,
    pub webhook_timeout: Duration,
    pub display: bool,
    pub persist: Duration,

    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            source: Source::Stream(DEFAULT_STREAM_ADDR.to_string()),
            latitude: 0.0,
            longitude: 0.0,
            interesting_radius: 10.0,
            interesting_ceiling: 15000.0,
            alert_radius: 3.0,
            cleanup_after: Duration::from_secs(DEFAULT_CLEANUP_AFTER_SECS),
            announce: false,
            speech_command: speech::default_command(),
            webhook_url: None,
            webhook_timeout: Duration::from_secs(webhook::DEFAULT_TIMEOUT_SECS),
            display: false,
            persist: Duration::from_secs(60),
            verbose: false,
        }
    }
}

impl Config {
    /// Parse flags, locate and read the config file, and merge
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let file = match &args.config_file {
            Some(path) => Some(FileConfig::load(path)?),
            None => match default_config_path() {
                Some(path) => Some(FileConfig::load(&path)?),
                None => None,
            },
        };
        Self::merge(args, file.unwrap_or_default())
    }

    /// Flags win over the file, the file wins over defaults
    pub fn merge(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let latitude = args
            .latitude
            .or(file.latitude)
            .ok_or(ConfigError::Missing("latitude"))?;
        let longitude = args
            .longitude
            .or(file.longitude)
            .ok_or(ConfigError::Missing("longitude"))?;

        let source = match (args.replay, args.stream.or(file.stream)) {
            (Some(path), _) => Source::Replay(path),
            (None, Some(addr)) => Source::Stream(addr),
            (None, None) => defaults.source,
        };

        let speech_command = match args.speech_command.map(SpeechCommand::Line).or(file.speech_command) {
            Some(cmd) => cmd.into_words(),
            None => defaults.speech_command,
        };

        let config = Self {
            username: args.username.or(file.username).unwrap_or_default(),
            password: args.password.or(file.password).unwrap_or_default(),
            source,
            latitude,
            longitude,
            interesting_radius: args
                .interesting_radius
                .or(file.interesting_radius)
                .unwrap_or(defaults.interesting_radius),
            interesting_ceiling: args
                .interesting_ceiling
                .or(file.interesting_ceiling)
                .unwrap_or(defaults.interesting_ceiling),
            alert_radius: args
                .alert_radius
                .or(file.alert_radius)
                .unwrap_or(defaults.alert_radius),
            cleanup_after: args
                .cleanup_after
                .or(file.cleanup_after)
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_after),
            announce: switch(args.announce, args.no_announce)
                .or(file.announce)
                .unwrap_or(defaults.announce),
            speech_command,
            webhook_url: args
                .webhook_url
                .or(file.webhook_url)
                .filter(|url| !url.is_empty()),
            webhook_timeout: args
                .webhook_timeout
                .or(file.webhook_timeout)
                .map(Duration::from_secs)
                .unwrap_or(defaults.webhook_timeout),
            display: switch(args.display, args.no_display)
                .or(file.display)
                .unwrap_or(defaults.display),
            persist: args
                .persist
                .or(file.persist)
                .map(Duration::from_secs)
                .unwrap_or(defaults.persist),
            verbose: args.verbose,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::Invalid(format!("latitude {}", self.latitude)));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::Invalid(format!("longitude {}", self.longitude)));
        }
        for (name, value) in [
            ("interesting-radius", self.interesting_radius),
            ("alert-radius", self.alert_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{} {}", name, value)));
            }
        }
        if self.announce && self.speech_command.is_empty() {
            return Err(ConfigError::Invalid("empty speech-command".to_string()));
        }
        Ok(())
    }

    pub fn observer(&self) -> Observer {
        Observer {
            center: LatLong::new(self.latitude, self.longitude),
            interesting_radius: self.interesting_radius,
            interesting_ceiling: self.interesting_ceiling,
            alert_radius: self.alert_radius,
        }
    }
}

/// First existing of `$HOME/.config/overhead/overhead.toml` and `./overhead.toml`
fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config/overhead").join(CONFIG_FILE_NAME));
    home.into_iter()
        .chain(std::iter::once(PathBuf::from(CONFIG_FILE_NAME)))
        .find(|path| path.is_file())
}
