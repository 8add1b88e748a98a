use bytes::BytesMut;
use tokio::io::AsyncRead;

use super::Error;
use super::chunks::Chunks;

/// A type for reading server-sent events from a byte stream.
///
/// Only the `data` field is kept. Multiple `data` lines of one event are
/// joined by line feeds; other fields and comments are skipped.
pub struct Sse<R> {
    buf: BytesMut,
    chunks: Chunks<R>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> Sse<R> {
    #[inline]
    pub fn new(chunks: Chunks<R>) -> Self {
        Self {
            buf: BytesMut::new(),
            chunks,
            eof: false,
        }
    }

    /// Returns the `data` of the next event as raw bytes.
    ///
    /// The payload is not checked for UTF-8, so a single bad event never
    /// poisons the rest of the stream.
    pub async fn next_event(&mut self) -> Result<Option<Vec<u8>>, Error> {
        loop {
            // Drain complete events in the buffer before reading more.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }
            if self.eof {
                if !self.buf.iter().all(u8::is_ascii_whitespace) {
                    debug!("dropping {} bytes of a truncated event", self.buf.len());
                }
                return Ok(None);
            }

            match self.chunks.next_chunk().await? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.eof = true,
            }
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<Vec<u8>>, Error> {
        // For `end-of-line`, we only handle line feed.
        //
        // event         = *( comment / field ) end-of-line
        // comment       = colon *any-char end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        loop {
            let Some(eol_idx) = self.buf.windows(2).position(|w| w == b"\n\n")
            else {
                return Ok(None);
            };
            let block = self.buf.split_to(eol_idx + 2);

            let mut data: Option<Vec<u8>> = None;
            for line in block[..].split(|&b| b == b'\n') {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                if line.is_empty() || line.starts_with(b":") {
                    continue;
                }
                let Some(colon) = line.iter().position(|&b| b == b':') else {
                    return Err(Error::invalid_payload(format!(
                        "malformed field: {}",
                        String::from_utf8_lossy(line)
                    )));
                };
                let (name, value) = (&line[..colon], &line[colon + 1..]);
                if name != b"data" {
                    trace!("skipping sse field `{}`", String::from_utf8_lossy(name));
                    continue;
                }
                let value = value.strip_prefix(b" ").unwrap_or(value);
                match &mut data {
                    Some(data) => {
                        data.push(b'\n');
                        data.extend_from_slice(value);
                    }
                    None => data = Some(value.to_vec()),
                }
            }

            // Blocks made of comments only carry no event.
            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ErrorKind;

    fn sse(input: &'static [u8]) -> Sse<&'static [u8]> {
        Sse::new(Chunks::new(input))
    }

    #[tokio::test]
    async fn test_normal_events() {
        let mut events = sse(b"data: hello\n\ndata: bye\n\n");
        assert_eq!(events.next_event().await.unwrap().unwrap(), b"hello");
        assert_eq!(events.next_event().await.unwrap().unwrap(), b"bye");
        assert_eq!(events.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fields_and_comments() {
        let mut events = sse(
            b": keep-alive\n\n\
              event: update\nid: 7\ndata:{\"a\":\ndata: 1}\n\n",
        );
        assert_eq!(
            events.next_event().await.unwrap().unwrap(),
            b"{\"a\":\n1}"
        );
        assert_eq!(events.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_across_chunks() {
        let (client, mut server) = tokio::io::duplex(4);
        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            server.write_all("data: 🛠️ hi\n\n".as_bytes()).await.unwrap();
        });
        let mut events = Sse::new(Chunks::new(client));
        assert_eq!(
            events.next_event().await.unwrap().unwrap(),
            "🛠️ hi".as_bytes()
        );
        writer.await.unwrap();
        assert_eq!(events.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let mut events = sse(b"xxxxxx\n\n");
        assert_eq!(
            events.next_event().await.unwrap_err().kind(),
            ErrorKind::InvalidPayload
        );

        let mut events = sse(b"data: truncated\n");
        assert_eq!(events.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_non_utf8_data_is_passed_through() {
        let mut events = sse(b"data: \xff\xfe\n\ndata: ok\n\n");
        assert_eq!(events.next_event().await.unwrap().unwrap(), b"\xff\xfe");
        assert_eq!(events.next_event().await.unwrap().unwrap(), b"ok");
    }
}
