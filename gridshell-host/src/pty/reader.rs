//! PTY output reader task

use std::io::Read;

use gridshell_protocol::{HostEvent, SessionId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::handle::PtyReader;

/// Read buffer size for PTY output
const READ_BUFFER_SIZE: usize = 4096;

/// Handle to a running output reader task
#[derive(Debug)]
pub struct ReaderHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl ReaderHandle {
    /// Stop the reader task
    ///
    /// The blocking read returns once the PTY closes (child killed or
    /// exited), at which point the task observes the cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the reader task to finish
    pub async fn join(self) {
        let _ = self.join.await;
    }
}

/// Spawn a blocking task that forwards PTY output as events
///
/// One reader per session. All output flows through a single event
/// channel, which preserves the order of chunks within a session.
pub fn spawn_output_reader(
    id: SessionId,
    reader: PtyReader,
    events: mpsc::UnboundedSender<HostEvent>,
) -> ReaderHandle {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();

    let join = tokio::task::spawn_blocking(move || {
        let mut buf = [0u8; READ_BUFFER_SIZE];

        loop {
            if task_cancel.is_cancelled() {
                break;
            }

            let n = match reader.lock().read(&mut buf) {
                Ok(0) => {
                    trace!(session = %id, "PTY output stream closed");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    // EIO is the normal end-of-stream on Linux PTYs
                    debug!(session = %id, error = %e, "PTY read ended");
                    break;
                }
            };

            let event = HostEvent::Output {
                id,
                data: buf[..n].to_vec(),
            };
            if events.send(event).is_err() {
                break;
            }
        }

        debug!(session = %id, "output reader finished");
    });

    ReaderHandle { cancel, join }
}
