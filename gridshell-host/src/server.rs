//! Unix socket server loop
//!
//! One client at a time owns the host. The connection task owns the
//! registry and is the only writer to the framed stream, so output
//! chunks, lifecycle events, and create replies stay in order.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use gridshell_protocol::{ClientRequest, HostCodec, HostEvent};
use gridshell_utils::{GridshellError, Result};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{info, warn};

use crate::registry::SessionRegistry;

/// How often to check sessions for exited processes
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Accept clients until one requests shutdown
pub async fn serve(listener: UnixListener, capacity: usize) -> Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        info!("client connected");

        match handle_client(stream, capacity).await {
            Ok(true) => {
                info!("shutdown requested");
                return Ok(());
            }
            Ok(false) => info!("client disconnected"),
            Err(e) => warn!(error = %e, "client connection failed"),
        }
    }
}

/// Serve one client connection to completion
///
/// Returns `true` if the client asked the host to shut down. All
/// sessions are torn down when the connection ends either way.
async fn handle_client(stream: UnixStream, capacity: usize) -> Result<bool> {
    let mut framed = Framed::new(stream, HostCodec::new());
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut registry = SessionRegistry::new(capacity, event_tx);

    let result = connection_loop(&mut framed, &mut event_rx, &mut registry).await;

    registry.destroy_all();
    result
}

async fn connection_loop(
    framed: &mut Framed<UnixStream, HostCodec>,
    event_rx: &mut mpsc::UnboundedReceiver<HostEvent>,
    registry: &mut SessionRegistry,
) -> Result<bool> {
    let mut exit_poll = tokio::time::interval(EXIT_POLL_INTERVAL);

    loop {
        tokio::select! {
            msg = framed.next() => {
                match msg {
                    Some(Ok(request)) => {
                        if handle_request(framed, registry, request).await? {
                            return Ok(true);
                        }
                    }
                    Some(Err(e)) => {
                        return Err(GridshellError::protocol(e.to_string()));
                    }
                    None => return Ok(false),
                }
            }
            Some(event) = event_rx.recv() => {
                framed
                    .send(event)
                    .await
                    .map_err(|e| GridshellError::connection(e.to_string()))?;
            }
            _ = exit_poll.tick() => {
                registry.poll_exits();
            }
        }
    }
}

/// Apply one client request; returns `true` on shutdown
async fn handle_request(
    framed: &mut Framed<UnixStream, HostCodec>,
    registry: &mut SessionRegistry,
    request: ClientRequest,
) -> Result<bool> {
    match request {
        ClientRequest::Create { cwd } => {
            let reply = match registry.create(cwd) {
                Ok(session) => HostEvent::Created { session },
                Err(error) => HostEvent::CreateFailed { error },
            };
            framed
                .send(reply)
                .await
                .map_err(|e| GridshellError::connection(e.to_string()))?;
        }
        ClientRequest::Write { id, data } => {
            registry.write(id, &data);
        }
        ClientRequest::Resize { id, cols, rows } => {
            registry.resize(id, cols, rows);
        }
        ClientRequest::Destroy { id } => {
            registry.destroy(id);
        }
        ClientRequest::Shutdown => {
            return Ok(true);
        }
    }
    Ok(false)
}
