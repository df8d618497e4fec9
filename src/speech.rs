//! Speech sink: speaks the verbalized approach through an external TTS program

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::dispatch::{Alert, AlertSink, SinkError};
use crate::verbalize::announcement;

/// `say -r 200 <utterance>`
pub fn default_command() -> Vec<String> {
    vec!["say".to_string(), "-r".to_string(), "200".to_string()]
}

pub struct SpeechSink {
    program: String,
    args: Vec<String>,
    /// Held while speaking so utterances never overlap
    speaking: Mutex<()>,
}

impl SpeechSink {
    /// `command` is the program followed by its leading arguments; the
    /// utterance is appended as the final argument.
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            speaking: Mutex::new(()),
        })
    }
}

#[async_trait]
impl AlertSink for SpeechSink {
    fn name(&self) -> &'static str {
        "speech"
    }

    async fn deliver(&self, alert: Alert) -> Result<(), SinkError> {
        let utterance = announcement(&alert);
        let _turn = self.speaking.lock().await;
        debug!("speaking: {}", utterance);

        // An aborted delivery drops the child, which kills it
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&utterance)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(SinkError::Speech(status))
        }
    }
}
