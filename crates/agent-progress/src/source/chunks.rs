use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_CAPACITY: usize = 8 * 1024;

/// Reads a byte stream in chunks of arbitrary size.
pub struct Chunks<R> {
    reader: R,
}

impl<R: AsyncRead + Unpin> Chunks<R> {
    #[inline]
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Returns the next chunk, or `None` at the end of the stream.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        let mut buf = BytesMut::with_capacity(CHUNK_CAPACITY);
        if self.reader.read_buf(&mut buf).await? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.freeze()))
    }
}
