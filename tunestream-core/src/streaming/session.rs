//! Request-scoped read cursor streaming one byte range.
//!
//! A session is a lazy, finite, non-restartable sequence of chunks. Each
//! poll reads at most `chunk_size` bytes, so the response sink's backpressure
//! governs how fast the store is read. Dropping the session (normal
//! completion, I/O error, or the client hanging up) closes the store handle.

use std::io;

use bytes::Bytes;
use futures::{Stream, stream};
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, trace};

use super::range::ByteRange;
use crate::media::ResourceId;
use crate::storage::RangeReader;

/// Read cursor over `[start, end]` of a single resource.
pub struct StreamSession {
    resource_id: ResourceId,
    range: ByteRange,
    reader: RangeReader,
    chunk_size: usize,
    bytes_sent: u64,
    failed: bool,
}

impl StreamSession {
    /// Wraps an opened reader; `chunk_size` of zero is treated as one byte.
    pub fn new(
        resource_id: ResourceId,
        range: ByteRange,
        reader: RangeReader,
        chunk_size: usize,
    ) -> Self {
        Self {
            resource_id,
            range,
            reader,
            chunk_size: chunk_size.max(1),
            bytes_sent: 0,
            failed: false,
        }
    }

    /// The byte range this session serves.
    pub fn range(&self) -> ByteRange {
        self.range
    }

    /// Bytes yielded so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    fn remaining(&self) -> u64 {
        self.range.length() - self.bytes_sent
    }

    /// Reads the next chunk, returning `None` once the range is exhausted.
    ///
    /// After an error the session is finished and yields `None`.
    ///
    /// # Errors
    ///
    /// - `io::ErrorKind::UnexpectedEof` - The store ended before the declared length
    /// - Any error raised by the underlying reader
    pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if self.failed || self.remaining() == 0 {
            return Ok(None);
        }

        let to_read = self.remaining().min(self.chunk_size as u64) as usize;
        let mut buffer = vec![0u8; to_read];

        let read = match self.reader.read(&mut buffer).await {
            Ok(0) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "backing store ended after {} of {} bytes",
                    self.bytes_sent,
                    self.range.length()
                ),
            )),
            other => other,
        };

        match read {
            Ok(read) => {
                buffer.truncate(read);
                self.bytes_sent += read as u64;
                trace!(
                    "Stream {} sent {} bytes ({}/{})",
                    self.resource_id,
                    read,
                    self.bytes_sent,
                    self.range.length()
                );
                Ok(Some(Bytes::from(buffer)))
            }
            Err(e) => {
                self.failed = true;
                error!(
                    "Stream {} failed at byte {} of range {}: {}",
                    self.resource_id,
                    self.range.start() + self.bytes_sent,
                    self.range,
                    e
                );
                Err(e)
            }
        }
    }

    /// Converts the session into a body stream for the HTTP response.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        stream::unfold(self, |mut session| async move {
            match session.next_chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk), session)),
                Ok(None) => None,
                Err(e) => Some((Err(e), session)),
            }
        })
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if self.failed {
            debug!(
                "Stream session for {} released after error",
                self.resource_id
            );
        } else if self.remaining() > 0 {
            info!(
                "Stream session for {} released early: {}/{} bytes sent (client disconnected)",
                self.resource_id,
                self.bytes_sent,
                self.range.length()
            );
        } else {
            debug!(
                "Stream session for {} released: range {} complete",
                self.resource_id, self.range
            );
        }
    }
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("resource_id", &self.resource_id)
            .field("range", &self.range)
            .field("chunk_size", &self.chunk_size)
            .field("bytes_sent", &self.bytes_sent)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
