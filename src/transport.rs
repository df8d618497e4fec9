//! Position stream client
//!
//!  Newline-delimited JSON messages, either from a live TCP feed (subscribed
//!  with an init command scoped to the observation box) or replayed from a
//!  file or stdin.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::geo::BoundingBox;
use crate::position::RawPosition;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },
    #[error("stream i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message {line:?}: {source}")]
    Malformed {
        line: String,
        source: serde_json::Error,
    },
}

/// One decoded stream message
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum StreamMessage {
    #[serde(rename = "position")]
    Position(RawPosition),
    /// Upstream refused or aborted the subscription
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error_msg: String,
    },
    /// Any other message type, ignored
    #[serde(other)]
    Other,
}

/// A source of stream messages. `Ok(None)` is a clean end of stream.
#[async_trait]
pub trait MessageSource: Send {
    async fn next_message(&mut self) -> Result<Option<StreamMessage>, TransportError>;
}

/// Subscription request sent on connect
#[derive(Debug, Clone)]
pub struct InitCommand {
    pub username: String,
    pub password: String,
    pub bbox: BoundingBox,
}

impl fmt::Display for InitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "live username {} password {} events \"position\" latlong \"{} {} {} {}\"",
            self.username,
            self.password,
            self.bbox.low_lat,
            self.bbox.low_lon,
            self.bbox.hi_lat,
            self.bbox.hi_lon
        )
    }
}

/// Decodes one JSON message per line
pub struct LineStream<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> MessageSource for LineStream<R> {
    async fn next_message(&mut self) -> Result<Option<StreamMessage>, TransportError> {
        while let Some(line) = self.lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return serde_json::from_str(line)
                .map(Some)
                .map_err(|source| TransportError::Malformed {
                    line: line.to_string(),
                    source,
                });
        }
        Ok(None)
    }
}

/// Connect to a live feed and send the subscription
pub async fn connect(
    addr: &str,
    init: &InitCommand,
) -> Result<LineStream<BufReader<TcpStream>>, TransportError> {
    let mut socket = TcpStream::connect(addr)
        .await
        .map_err(|source| TransportError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    info!("Connected to stream at {}", addr);
    debug!(
        "Subscribing to box {:.4},{:.4} .. {:.4},{:.4}",
        init.bbox.low_lat, init.bbox.low_lon, init.bbox.hi_lat, init.bbox.hi_lon
    );

    socket.write_all(init.to_string().as_bytes()).await?;
    Ok(LineStream::new(BufReader::new(socket)))
}

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// Replay recorded messages from a file, or from stdin when `path` is `-`
pub async fn open_replay(path: &Path) -> Result<LineStream<BufReader<BoxedReader>>, TransportError> {
    let reader: BoxedReader = if path == Path::new("-") {
        info!("Replaying messages from stdin");
        Box::new(tokio::io::stdin())
    } else {
        info!("Replaying messages from {}", path.display());
        Box::new(tokio::fs::File::open(path).await?)
    };
    Ok(LineStream::new(BufReader::new(reader)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const POSITION_LINE: &str = r#"{"type":"position","id":"UAL641-1-airline-0","lat":"42.38","lon":"-71.00","alt":"2500","ident":"UAL641","clock":"1700000000","air_ground":"A","facility_hash":"abc"}"#;

    #[test]
    fn test_decode_position() {
        match serde_json::from_str::<StreamMessage>(POSITION_LINE).unwrap() {
            StreamMessage::Position(raw) => {
                assert_eq!(raw.id, "UAL641-1-airline-0");
                assert_eq!(raw.alt, "2500");
                assert_eq!(raw.gs, "");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_error_and_other() {
        let msg: StreamMessage =
            serde_json::from_str(r#"{"type":"error","error_msg":"Invalid credentials"}"#).unwrap();
        assert!(matches!(msg, StreamMessage::Error { error_msg } if error_msg == "Invalid credentials"));

        let msg: StreamMessage =
            serde_json::from_str(r#"{"type":"keepalive","serverTime":"1700000000"}"#).unwrap();
        assert!(matches!(msg, StreamMessage::Other));
    }

    #[test]
    fn test_init_command() {
        let init = InitCommand {
            username: "alice".to_string(),
            password: "secret".to_string(),
            bbox: BoundingBox {
                low_lat: 42.0,
                low_lon: -71.5,
                hi_lat: 42.5,
                hi_lon: -70.5,
            },
        };
        assert_eq!(
            init.to_string(),
            "live username alice password secret events \"position\" latlong \"42 -71.5 42.5 -70.5\"\n"
        );
    }

    #[tokio::test]
    async fn test_line_stream_skips_blank_lines() {
        let data = format!("\n{}\n\n{{\"type\":\"error\",\"error_msg\":\"bye\"}}\n", POSITION_LINE);
        let mut stream = LineStream::new(data.as_bytes());

        assert!(matches!(stream.next_message().await.unwrap(), Some(StreamMessage::Position(_))));
        assert!(matches!(stream.next_message().await.unwrap(), Some(StreamMessage::Error { .. })));
        assert!(stream.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_line_is_an_error() {
        let mut stream = LineStream::new("not json\n".as_bytes());
        let err = stream.next_message().await.unwrap_err();
        assert!(matches!(err, TransportError::Malformed { ref line, .. } if line == "not json"));
    }

    #[tokio::test]
    async fn test_connect_sends_init_command() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();
            let init = lines.next_line().await.unwrap().unwrap();
            write.write_all(format!("{}\n", POSITION_LINE).as_bytes()).await.unwrap();
            init
        });

        let init = InitCommand {
            username: "u".to_string(),
            password: "p".to_string(),
            bbox: BoundingBox {
                low_lat: 1.0,
                low_lon: 2.0,
                hi_lat: 3.0,
                hi_lon: 4.0,
            },
        };
        let mut stream = connect(&addr, &init).await.unwrap();
        assert!(matches!(stream.next_message().await.unwrap(), Some(StreamMessage::Position(_))));
        assert!(stream.next_message().await.unwrap().is_none());

        assert_eq!(
            server.await.unwrap(),
            "live username u password p events \"position\" latlong \"1 2 3 4\""
        );
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let init = InitCommand {
            username: String::new(),
            password: String::new(),
            bbox: BoundingBox {
                low_lat: 0.0,
                low_lon: 0.0,
                hi_lat: 0.0,
                hi_lon: 0.0,
            },
        };
        assert!(matches!(
            connect(&addr, &init).await,
            Err(TransportError::Connect { .. })
        ));
    }

    #[tokio::test]
    async fn test_replay_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording.jsonl");
        std::fs::write(&path, format!("{}\n", POSITION_LINE)).unwrap();

        let mut stream = open_replay(&path).await.unwrap();
        assert!(matches!(stream.next_message().await.unwrap(), Some(StreamMessage::Position(_))));
        assert!(stream.next_message().await.unwrap().is_none());
    }
}
