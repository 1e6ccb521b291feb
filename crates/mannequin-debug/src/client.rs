//! Blocking client for the tooling server

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::protocol::{DebugCommand, DebugResponse};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server closed the connection")]
    Closed,
}

/// One TCP connection to a running tooling server
pub struct DebugClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl DebugClient {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(Duration::from_secs(30)))?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    pub fn send(&mut self, cmd: &DebugCommand) -> Result<DebugResponse, ClientError> {
        let line = serde_json::to_string(cmd)?;
        self.send_raw(&line)
    }

    /// Send a line of JSON as-is and parse the reply
    pub fn send_raw(&mut self, line: &str) -> Result<DebugResponse, ClientError> {
        self.writer.write_all(line.trim().as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        let mut response_line = String::new();
        if self.reader.read_line(&mut response_line)? == 0 {
            return Err(ClientError::Closed);
        }
        Ok(serde_json::from_str(&response_line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{DebugHandler, DebugServer};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct PingOnly;

    impl DebugHandler for PingOnly {
        fn handle_command(&mut self, cmd: DebugCommand) -> DebugResponse {
            match cmd {
                DebugCommand::Ping => DebugResponse::pong(),
                _ => DebugResponse::error("ping only"),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_client_against_server() {
        let handler: Arc<Mutex<dyn DebugHandler>> = Arc::new(Mutex::new(PingOnly));
        let server = DebugServer::start(handler, "127.0.0.1:0").await.unwrap();
        let addr = server.local_addr();

        let (pong, other) = tokio::task::spawn_blocking(move || {
            let mut client = DebugClient::connect(addr).unwrap();
            let pong = client.send(&DebugCommand::Ping).unwrap();
            let other = client.send(&DebugCommand::ListPoses).unwrap();
            (pong, other)
        })
        .await
        .unwrap();

        assert_eq!(pong, DebugResponse::pong());
        assert!(!other.is_ok());
    }
}
