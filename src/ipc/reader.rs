//! Hub event socket reader.
//!
//! There is no framing on the hub socket: every successful `read` is taken as
//! exactly one notification. A notification split across reads, or several
//! packed into one read, is not reassembled.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::UnixStream;

use crate::types::{Error, Result};

/// Default size of the per-read buffer.
pub const DEFAULT_READ_BUFFER_BYTES: usize = 512;

/// Connect to the hub's Unix event socket.
pub async fn connect_socket(path: impl AsRef<Path>) -> Result<UnixStream> {
    let path = path.as_ref();
    UnixStream::connect(path).await.map_err(|e| {
        Error::connection(format!("cannot connect to {}: {}", path.display(), e))
    })
}

/// Reads one notification per `read` call into a fixed buffer.
#[derive(Debug)]
pub struct EventReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> EventReader<R> {
    pub fn new(reader: R, buffer_bytes: usize) -> Self {
        Self {
            reader,
            buf: vec![0u8; buffer_bytes],
        }
    }

    /// Read the next notification.
    ///
    /// Returns `None` on clean EOF. Invalid UTF-8 is replaced, not rejected.
    pub async fn next_event(&mut self) -> std::io::Result<Option<String>> {
        let n = self.reader.read(&mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&self.buf[..n]).into_owned()))
    }
}
