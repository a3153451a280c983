//! Unix-socket command server for the daemon.
//!
//! One-shot line protocol: each connection carries a single JSON command
//! and receives a single JSON response. Shutdown follows the daemon's
//! `Notify` discipline — `stop` wakes the accept loop, no polling.

use crate::error::{ClipglotError, Result};
use crate::ipc::protocol::{Command, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;

/// Handler trait for processing IPC commands.
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle a command and return a response.
    async fn handle(&self, command: Command) -> Response;
}

/// IPC server for daemon control over a Unix socket.
pub struct IpcServer {
    socket_path: PathBuf,
    shutdown: Notify,
}

impl IpcServer {
    /// Create a server bound to the given socket path once started.
    pub fn new(socket_path: PathBuf) -> Result<Self> {
        Ok(Self {
            socket_path,
            shutdown: Notify::new(),
        })
    }

    /// The socket path this server uses.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Default socket path: `$XDG_RUNTIME_DIR/clipglot.sock`, with a
    /// per-uid `/tmp` fallback outside a session.
    pub fn default_socket_path() -> PathBuf {
        if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg_runtime).join("clipglot.sock")
        } else {
            let uid = unsafe { libc::getuid() };
            PathBuf::from(format!("/tmp/clipglot-{}.sock", uid))
        }
    }

    /// Serve connections until `stop` is called.
    ///
    /// A stale socket file from a previous run is replaced. Individual
    /// connection failures are logged and never end the loop.
    pub async fn start<H>(&self, handler: H) -> Result<()>
    where
        H: CommandHandler + 'static,
    {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| ClipglotError::IpcSocket {
                message: format!(
                    "cannot replace stale socket {}: {e}",
                    self.socket_path.display()
                ),
            })?;
        }

        let listener =
            UnixListener::bind(&self.socket_path).map_err(|e| ClipglotError::IpcSocket {
                message: format!("cannot bind {}: {e}", self.socket_path.display()),
            })?;

        let handler = Arc::new(handler);

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let handler = Arc::clone(&handler);
                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(stream, handler).await {
                                eprintln!("clipglot: [ipc] client connection failed: {e}");
                            }
                        });
                    }
                    Err(e) => {
                        // Transient accept failures must not take the daemon down.
                        eprintln!("clipglot: [ipc] accept failed: {e}");
                    }
                },
            }
        }

        Ok(())
    }

    /// Wake the accept loop and remove the socket file.
    ///
    /// The stored notify permit makes this safe to call before `start`
    /// reaches its first wait.
    pub fn stop(&self) -> Result<()> {
        self.shutdown.notify_one();

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| ClipglotError::IpcSocket {
                message: format!("cannot remove socket {}: {e}", self.socket_path.display()),
            })?;
        }

        Ok(())
    }
}

/// Answer one command on one connection.
async fn serve_connection<H>(stream: UnixStream, handler: Arc<H>) -> Result<()>
where
    H: CommandHandler,
{
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let request = lines
        .next_line()
        .await
        .map_err(|e| ClipglotError::IpcConnection {
            message: format!("read failed: {e}"),
        })?;
    let Some(request) = request else {
        // Client connected and went away without sending anything.
        return Ok(());
    };

    // A malformed command is the client's problem: report it back over
    // the wire instead of failing the connection.
    let response = match Command::from_json(request.trim()) {
        Ok(command) => handler.handle(command).await,
        Err(e) => Response::Error {
            message: format!("unrecognized command: {e}"),
        },
    };

    let mut payload = response.to_json().map_err(|e| ClipglotError::IpcProtocol {
        message: format!("response serialization failed: {e}"),
    })?;
    payload.push('\n');

    write_half
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| ClipglotError::IpcConnection {
            message: format!("write failed: {e}"),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::CurrentTranslation;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StubHandler;

    #[async_trait::async_trait]
    impl CommandHandler for StubHandler {
        async fn handle(&self, command: Command) -> Response {
            match command {
                Command::Translation => Response::Translation {
                    current: CurrentTranslation {
                        text: "stub translation".to_string(),
                        id: 7,
                        busy: false,
                        context_active: false,
                    },
                },
                Command::Reset | Command::Shutdown => Response::Ok,
                Command::CacheStats => Response::Error {
                    message: "not wired".to_string(),
                },
                Command::History { .. } => Response::History { entries: vec![] },
            }
        }
    }

    fn spawn_server(socket_path: PathBuf) -> (Arc<IpcServer>, tokio::task::JoinHandle<Result<()>>) {
        let server = Arc::new(IpcServer::new(socket_path).expect("server"));
        let running = Arc::clone(&server);
        let task = tokio::spawn(async move { running.start(StubHandler).await });
        (server, task)
    }

    #[test]
    fn default_socket_path_honors_runtime_dir() {
        let path = IpcServer::default_socket_path();
        let path_str = path.to_string_lossy();
        if std::env::var("XDG_RUNTIME_DIR").is_ok() {
            assert!(
                path_str.ends_with("clipglot.sock"),
                "expected path ending with clipglot.sock, got: {:?}",
                path
            );
        } else {
            let uid = unsafe { libc::getuid() };
            assert_eq!(path_str, format!("/tmp/clipglot-{}.sock", uid));
        }
    }

    #[tokio::test]
    async fn server_answers_a_client() {
        let temp_dir = TempDir::new().expect("tempdir");
        let socket_path = temp_dir.path().join("test.sock");
        let (server, task) = spawn_server(socket_path.clone());

        // Give the server time to bind
        tokio::time::sleep(Duration::from_millis(50)).await;

        let response = crate::ipc::client::send_command(&socket_path, Command::Translation)
            .await
            .expect("send command");

        match response {
            Response::Translation { current } => {
                assert_eq!(current.text, "stub translation");
                assert_eq!(current.id, 7);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        server.stop().expect("stop");
        let _ = task.await;
    }

    #[tokio::test]
    async fn stop_unblocks_start() {
        let temp_dir = TempDir::new().expect("tempdir");
        let socket_path = temp_dir.path().join("test.sock");
        let (server, task) = spawn_server(socket_path.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        server.stop().expect("stop");

        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("start should return after stop")
            .expect("server task");
        assert!(result.is_ok());
        assert!(!socket_path.exists(), "socket file should be cleaned up");
    }

    #[tokio::test]
    async fn stop_before_start_is_not_lost() {
        let temp_dir = TempDir::new().expect("tempdir");
        let socket_path = temp_dir.path().join("test.sock");

        let server = Arc::new(IpcServer::new(socket_path).expect("server"));
        server.stop().expect("stop");

        // The stored permit means a later start returns immediately
        let running = Arc::clone(&server);
        let task = tokio::spawn(async move { running.start(StubHandler).await });
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("start should see the stored stop")
            .expect("server task")
            .expect("clean exit");
    }

    #[tokio::test]
    async fn malformed_command_is_answered_with_an_error() {
        let temp_dir = TempDir::new().expect("tempdir");
        let socket_path = temp_dir.path().join("test.sock");
        let (server, task) = spawn_server(socket_path.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut stream = UnixStream::connect(&socket_path).await.expect("connect");
        stream.write_all(b"this is not json\n").await.expect("write");

        let mut reply = String::new();
        BufReader::new(stream)
            .read_line(&mut reply)
            .await
            .expect("read");
        let response = Response::from_json(reply.trim()).expect("parse");
        assert!(matches!(response, Response::Error { .. }));

        server.stop().expect("stop");
        let _ = task.await;
    }
}
