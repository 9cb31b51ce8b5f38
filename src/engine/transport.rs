use std::{io, path::Path};

use tokio::net::UnixStream;
use tracing::debug;

use crate::error::PulseError;

/// Owns the raw byte stream to the sound server.
///
/// All I/O is non-blocking: `try_read`/`try_write` return immediately
/// with a would-block indicator and the reactor decides when to retry
/// based on the readiness futures. The socket is released when the
/// transport is dropped; dropping twice is structurally impossible, which
/// is as idempotent as close gets.
pub(crate) struct Transport {
    stream: UnixStream,
}

impl Transport {
    /// Connect to the server's local socket.
    ///
    /// # Errors
    /// Returns [`PulseError::Connect`] when the socket is refused,
    /// missing or unreachable.
    pub(crate) async fn open(path: &Path) -> Result<Self, PulseError> {
        let stream = UnixStream::connect(path).await.map_err(|err| {
            PulseError::connect(format!(
                "cannot reach server at {}: {err}",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), "transport open");
        Ok(Self { stream })
    }

    /// Resolves once the socket may have bytes to read.
    pub(crate) async fn readable(&self) -> io::Result<()> {
        self.stream.readable().await
    }

    /// Resolves once the socket may accept bytes.
    pub(crate) async fn writable(&self) -> io::Result<()> {
        self.stream.writable().await
    }

    /// Non-blocking read; `WouldBlock` clears readiness.
    pub(crate) fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.try_read(buf)
    }

    /// Non-blocking write; `WouldBlock` clears readiness.
    pub(crate) fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        self.stream.try_write(buf)
    }
}
