//! One-shot IPC client used by the CLI subcommands.

use crate::error::{ClipglotError, Result};
use crate::ipc::protocol::{Command, Response};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Connect, send one command, wait for the single-line reply.
pub async fn send_command(socket_path: &Path, command: Command) -> Result<Response> {
    let mut stream =
        UnixStream::connect(socket_path)
            .await
            .map_err(|e| ClipglotError::IpcConnection {
                message: format!("cannot reach daemon at {}: {e}", socket_path.display()),
            })?;

    let mut payload = command.to_json().map_err(|e| ClipglotError::IpcProtocol {
        message: format!("command serialization failed: {e}"),
    })?;
    payload.push('\n');

    stream
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| ClipglotError::IpcConnection {
            message: format!("send failed: {e}"),
        })?;

    let mut reply = String::new();
    BufReader::new(stream)
        .read_line(&mut reply)
        .await
        .map_err(|e| ClipglotError::IpcConnection {
            message: format!("no reply from daemon: {e}"),
        })?;

    if reply.trim().is_empty() {
        return Err(ClipglotError::IpcConnection {
            message: "daemon closed the connection without replying".to_string(),
        });
    }

    Response::from_json(reply.trim()).map_err(|e| ClipglotError::IpcProtocol {
        message: format!("unrecognized reply: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_socket_is_a_connection_error() {
        let result = send_command(Path::new("/nonexistent/clipglot.sock"), Command::Reset).await;
        assert!(matches!(result, Err(ClipglotError::IpcConnection { .. })));
    }

    #[tokio::test]
    async fn silent_peer_is_a_connection_error() {
        let temp_dir = tempfile::TempDir::new().expect("tempdir");
        let socket_path = temp_dir.path().join("mute.sock");
        let listener = tokio::net::UnixListener::bind(&socket_path).expect("bind");

        // Accept and immediately drop the connection, replying with nothing
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let result = send_command(&socket_path, Command::Reset).await;
        assert!(matches!(result, Err(ClipglotError::IpcConnection { .. })));
    }
}
