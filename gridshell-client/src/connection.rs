//! Connection to the gridshell host

use std::path::PathBuf;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use gridshell_protocol::{ClientCodec, ClientRequest, HostEvent};
use gridshell_utils::{socket_path, GridshellError, Result};

/// How long disconnect waits for the I/O task to drain its queue
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Client connection to the host over a Unix socket
///
/// Socket I/O runs in a background task; the app talks to it through
/// channels, keeping the UI loop free of blocking sends.
pub struct Connection {
    socket: PathBuf,
    state: ConnectionState,
    tx: mpsc::UnboundedSender<ClientRequest>,
    rx: mpsc::UnboundedReceiver<HostEvent>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Connection {
    /// Create a new connection (not yet connected)
    pub fn new() -> Self {
        Self::with_socket_path(socket_path())
    }

    /// Create with custom socket path
    pub fn with_socket_path(socket: PathBuf) -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        let (_, rx) = mpsc::unbounded_channel();

        Self {
            socket,
            state: ConnectionState::Disconnected,
            tx,
            rx,
            task_handle: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connect to the host
    pub async fn connect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }

        if !self.socket.exists() {
            return Err(GridshellError::HostNotRunning {
                path: self.socket.clone(),
            });
        }

        let stream = UnixStream::connect(&self.socket).await.map_err(|e| {
            GridshellError::Connection(format!(
                "Failed to connect to {}: {}",
                self.socket.display(),
                e
            ))
        })?;

        let framed = Framed::new(stream, ClientCodec::new());

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        self.tx = outgoing_tx;
        self.rx = incoming_rx;

        let handle = tokio::spawn(Self::connection_task(framed, outgoing_rx, incoming_tx));
        self.task_handle = Some(handle);

        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Disconnect from the host
    ///
    /// Queued requests are flushed to the socket before the I/O task
    /// exits, so a request sent just before disconnecting still
    /// reaches the host.
    pub async fn disconnect(&mut self) {
        // Dropping the sender lets the task drain the queue and stop
        let (tx, _) = mpsc::unbounded_channel();
        self.tx = tx;

        if let Some(mut handle) = self.task_handle.take() {
            if tokio::time::timeout(DISCONNECT_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                tracing::warn!("Connection task did not drain in time, aborting");
                handle.abort();
            }
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Send a request to the host
    pub fn send(&self, request: ClientRequest) -> Result<()> {
        if self.state != ConnectionState::Connected {
            return Err(GridshellError::connection("Not connected"));
        }

        self.tx
            .send(request)
            .map_err(|_| GridshellError::ConnectionClosed)
    }

    /// Receive the next event from the host
    ///
    /// Returns `None` when the connection has closed.
    pub async fn recv(&mut self) -> Option<HostEvent> {
        self.rx.recv().await
    }

    /// Try to receive without blocking
    pub fn try_recv(&mut self) -> Option<HostEvent> {
        self.rx.try_recv().ok()
    }

    /// Background task that handles the actual socket I/O
    async fn connection_task(
        mut framed: Framed<UnixStream, ClientCodec>,
        mut outgoing: mpsc::UnboundedReceiver<ClientRequest>,
        incoming: mpsc::UnboundedSender<HostEvent>,
    ) {
        loop {
            tokio::select! {
                request = outgoing.recv() => {
                    match request {
                        Some(request) => {
                            if let Err(e) = framed.send(request).await {
                                tracing::error!("Failed to send request: {}", e);
                                break;
                            }
                        }
                        // Sender dropped; every queued request has been
                        // received and flushed by now
                        None => {
                            tracing::debug!("Request channel closed, connection task exiting");
                            break;
                        }
                    }
                }

                result = framed.next() => {
                    match result {
                        Some(Ok(event)) => {
                            if incoming.send(event).is_err() {
                                tracing::debug!("Incoming channel closed, receiver dropped");
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::error!("Failed to receive event: {}", e);
                            break;
                        }
                        None => {
                            tracing::info!("Host closed connection");
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn test_connection_state_initial() {
        let conn = Connection::new();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_no_host() {
        let mut conn = Connection::with_socket_path("/nonexistent/path.sock".into());
        let result = conn.connect().await;
        assert!(matches!(result, Err(GridshellError::HostNotRunning { .. })));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_to_host() {
        let dir = tempdir().unwrap();
        let socket = dir.path().join("test.sock");

        let listener = UnixListener::bind(&socket).unwrap();
        let accept_handle = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn = Connection::with_socket_path(socket);
        conn.connect().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Connected);

        // Connecting again is a no-op
        conn.connect().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Connected);

        conn.disconnect().await;
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        accept_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_not_connected() {
        let conn = Connection::new();
        let result = conn.send(ClientRequest::Shutdown);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let mut conn = Connection::new();
        assert!(conn.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let mut conn = Connection::new();
        conn.disconnect().await;
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_roundtrip_through_mock_host() {
        use gridshell_protocol::{HostCodec, SessionId};

        let dir = tempdir().unwrap();
        let socket = dir.path().join("test.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        // Mock host: echo every Write back as Output
        let host = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, HostCodec::new());
            while let Some(Ok(request)) = framed.next().await {
                if let ClientRequest::Write { id, data } = request {
                    framed.send(HostEvent::Output { id, data }).await.unwrap();
                }
            }
        });

        let mut conn = Connection::with_socket_path(socket);
        conn.connect().await.unwrap();

        let id = SessionId::generate();
        conn.send(ClientRequest::Write {
            id,
            data: b"ls\r".to_vec(),
        })
        .unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), conn.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            HostEvent::Output {
                id,
                data: b"ls\r".to_vec()
            }
        );

        conn.disconnect().await;
        host.abort();
    }

    #[tokio::test]
    async fn test_disconnect_flushes_queued_requests() {
        use gridshell_protocol::HostCodec;

        let dir = tempdir().unwrap();
        let socket = dir.path().join("test.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        // Mock host: report whether a Shutdown frame ever arrives
        let host = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, HostCodec::new());
            while let Some(Ok(request)) = framed.next().await {
                if request == ClientRequest::Shutdown {
                    return true;
                }
            }
            false
        });

        let mut conn = Connection::with_socket_path(socket);
        conn.connect().await.unwrap();

        // Queue and tear down immediately, as the quit path does
        conn.send(ClientRequest::Shutdown).unwrap();
        conn.disconnect().await;

        let got_shutdown = tokio::time::timeout(Duration::from_secs(5), host)
            .await
            .unwrap()
            .unwrap();
        assert!(got_shutdown, "queued Shutdown never reached the host");
    }
}
