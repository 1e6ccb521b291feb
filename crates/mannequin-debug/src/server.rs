//! TCP tooling server

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::protocol::{DebugCommand, DebugResponse};

/// Trait that the application implements to handle tooling commands
pub trait DebugHandler: Send + Sync + 'static {
    fn handle_command(&mut self, cmd: DebugCommand) -> DebugResponse;
}

/// Server handle - keep this alive to keep the server running
pub struct DebugServer {
    local_addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl DebugServer {
    /// Bind `addr` and serve commands in the background.
    /// The handler is called for each incoming command, one at a time.
    pub async fn start(handler: Arc<Mutex<dyn DebugHandler>>, addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        log::info!("Tooling server listening on {}", local_addr);

        let handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        log::info!("Tooling client connected from {}", peer);
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, handler).await;
                            log::info!("Tooling client disconnected: {}", peer);
                        });
                    }
                    Err(e) => {
                        log::error!("Tooling server accept error: {}", e);
                    }
                }
            }
        });

        Ok(Self { local_addr, handle })
    }

    /// Address actually bound, useful when binding port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting new connections
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

/// Longest command line a client may send, newline included
pub const MAX_LINE_BYTES: u64 = 64 * 1024;

async fn handle_connection(
    stream: tokio::net::TcpStream,
    handler: Arc<Mutex<dyn DebugHandler>>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        let response = match (&mut reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) if !line.ends_with(b"\n") && line.len() as u64 >= MAX_LINE_BYTES => {
                log::warn!("Tooling client sent a command over {} bytes", MAX_LINE_BYTES);
                if let Err(e) = skip_line(&mut reader).await {
                    log::error!("Tooling server read error: {}", e);
                    break;
                }
                DebugResponse::error(format!("Command longer than {} bytes", MAX_LINE_BYTES))
            }
            Ok(_) => match std::str::from_utf8(&line) {
                Ok(text) => match dispatch(text.trim(), &handler).await {
                    Some(response) => response,
                    None => continue,
                },
                Err(e) => DebugResponse::error(format!("Command is not UTF-8: {}", e)),
            },
            Err(e) => {
                log::error!("Tooling server read error: {}", e);
                break;
            }
        };

        if let Err(e) = send_response(&mut writer, &response).await {
            log::error!("Tooling server write error: {}", e);
            break;
        }
    }
}

/// Discard input up to and including the next newline
async fn skip_line(reader: &mut BufReader<OwnedReadHalf>) -> io::Result<()> {
    let mut scratch = Vec::new();
    loop {
        scratch.clear();
        let read = (&mut *reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut scratch).await?;
        if read == 0 || scratch.ends_with(b"\n") {
            return Ok(());
        }
    }
}

/// Parse one command line and run it; blank lines get no response
async fn dispatch(line: &str, handler: &Arc<Mutex<dyn DebugHandler>>) -> Option<DebugResponse> {
    if line.is_empty() {
        return None;
    }
    let response = match serde_json::from_str::<DebugCommand>(line) {
        Ok(cmd) => {
            log::debug!("Tooling command: {:?}", cmd);
            handler.lock().await.handle_command(cmd)
        }
        Err(e) => DebugResponse::error(format!("Invalid command JSON: {}", e)),
    };
    Some(response)
}

async fn send_response(writer: &mut OwnedWriteHalf, response: &DebugResponse) -> io::Result<()> {
    let mut json = serde_json::to_string(response).unwrap_or_else(|e| {
        format!("{{\"status\":\"error\",\"message\":\"Serialize error: {}\"}}", e)
    });
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ResponseData;
    use tokio::net::TcpStream;

    /// Remembers the last selection per actor
    #[derive(Default)]
    struct EchoHandler {
        selected: Option<(String, Option<String>)>,
    }

    impl DebugHandler for EchoHandler {
        fn handle_command(&mut self, cmd: DebugCommand) -> DebugResponse {
            match cmd {
                DebugCommand::Ping => DebugResponse::pong(),
                DebugCommand::Select { actor, name } => {
                    self.selected = Some((actor, name));
                    DebugResponse::none()
                }
                DebugCommand::GetSelection { actor } => match &self.selected {
                    Some((a, name)) if *a == actor => DebugResponse::ok(ResponseData::Selection {
                        actor,
                        selection: name.clone(),
                    }),
                    _ => DebugResponse::ok(ResponseData::Selection {
                        actor,
                        selection: None,
                    }),
                },
                other => DebugResponse::error(format!("unsupported: {:?}", other)),
            }
        }
    }

    async fn roundtrip(
        reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
        writer: &mut tokio::net::tcp::OwnedWriteHalf,
        request: &str,
    ) -> DebugResponse {
        writer.write_all(request.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_commands_over_tcp() {
        let handler: Arc<Mutex<dyn DebugHandler>> = Arc::new(Mutex::new(EchoHandler::default()));
        let server = DebugServer::start(handler, "127.0.0.1:0").await.unwrap();

        let stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let pong = roundtrip(&mut reader, &mut writer, r#"{"cmd":"Ping"}"#).await;
        assert_eq!(pong, DebugResponse::pong());

        let set = roundtrip(
            &mut reader,
            &mut writer,
            r#"{"cmd":"Select","params":{"actor":"a1","name":"wave"}}"#,
        )
        .await;
        assert!(set.is_ok());

        let got = roundtrip(
            &mut reader,
            &mut writer,
            r#"{"cmd":"GetSelection","params":{"actor":"a1"}}"#,
        )
        .await;
        assert_eq!(
            got,
            DebugResponse::ok(ResponseData::Selection {
                actor: "a1".into(),
                selection: Some("wave".into()),
            })
        );

        server.shutdown();
    }

    #[tokio::test]
    async fn test_malformed_line_gets_error_and_connection_survives() {
        let handler: Arc<Mutex<dyn DebugHandler>> = Arc::new(Mutex::new(EchoHandler::default()));
        let server = DebugServer::start(handler, "127.0.0.1:0").await.unwrap();

        let stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let bad = roundtrip(&mut reader, &mut writer, "{not json").await;
        assert!(matches!(bad, DebugResponse::Error { .. }));

        let pong = roundtrip(&mut reader, &mut writer, r#"{"cmd":"Ping"}"#).await;
        assert_eq!(pong, DebugResponse::pong());
    }

    #[tokio::test]
    async fn test_oversized_line_is_refused_and_skipped() {
        let handler: Arc<Mutex<dyn DebugHandler>> = Arc::new(Mutex::new(EchoHandler::default()));
        let server = DebugServer::start(handler, "127.0.0.1:0").await.unwrap();

        let stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let huge = "x".repeat(MAX_LINE_BYTES as usize * 2 + 16);
        let refused = roundtrip(&mut reader, &mut writer, &huge).await;
        match refused {
            DebugResponse::Error { message } => assert!(message.contains("longer than")),
            other => panic!("unexpected {:?}", other),
        }

        // The rest of the long line was discarded, so the next command lines up
        let pong = roundtrip(&mut reader, &mut writer, r#"{"cmd":"Ping"}"#).await;
        assert_eq!(pong, DebugResponse::pong());

        server.shutdown();
    }
}
