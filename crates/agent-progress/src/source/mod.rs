//! Sources of recorded runtime events.

mod chunks;
mod sse;

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;
use std::str::FromStr;

use agent_progress_core::event::RawEvent;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};

use chunks::Chunks;
use sse::Sse;

/// The framing of a recorded event stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// One JSON object per line.
    #[default]
    JsonLines,
    /// Server-sent events whose `data` field holds a JSON object.
    Sse,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jsonl" => Ok(Format::JsonLines),
            "sse" => Ok(Format::Sse),
            _ => Err(Error::invalid_payload(format!("unknown format `{s}`"))),
        }
    }
}

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Reading the underlying stream failed.
    Io,
    /// The stream is not framed as expected.
    InvalidPayload,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Io => write!(f, "I/O error"),
            ErrorKind::InvalidPayload => write!(f, "Invalid payload"),
        }
    }
}

/// Describes a failure to read events.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    #[inline]
    pub(crate) fn invalid_payload<S: Into<String>>(reason: S) -> Self {
        Self {
            kind: ErrorKind::InvalidPayload,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason())
    }
}

impl StdError for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self {
            kind: ErrorKind::Io,
            reason: Some(err.to_string()),
        }
    }
}

enum Framing<R> {
    Lines(Split<BufReader<R>>),
    Sse(Sse<R>),
}

/// Reads [`RawEvent`]s from a recorded stream.
///
/// Payloads that are not UTF-8 JSON are logged and skipped, and an SSE
/// `[DONE]` marker ends the stream.
pub struct EventSource<R> {
    framing: Framing<R>,
    skipped: usize,
}

impl<R: AsyncRead + Unpin> EventSource<R> {
    /// Creates a source reading `reader` in the given format.
    pub fn new(reader: R, format: Format) -> Self {
        let framing = match format {
            Format::JsonLines => Framing::Lines(BufReader::new(reader).split(b'\n')),
            Format::Sse => Framing::Sse(Sse::new(Chunks::new(reader))),
        };
        Self {
            framing,
            skipped: 0,
        }
    }

    /// Returns the number of payloads skipped because they were not
    /// UTF-8 JSON.
    #[inline]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns the next event, or `None` at the end of the stream.
    pub async fn next_event(&mut self) -> Result<Option<RawEvent>, Error> {
        loop {
            let payload = match &mut self.framing {
                Framing::Lines(lines) => lines.next_segment().await?,
                Framing::Sse(sse) => sse.next_event().await?,
            };
            let Some(payload) = payload else {
                return Ok(None);
            };
            let Ok(payload) = std::str::from_utf8(&payload) else {
                warn!("skipping event that is not UTF-8");
                self.skipped += 1;
                continue;
            };

            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            if payload == "[DONE]" {
                return Ok(None);
            }
            match RawEvent::from_json(payload) {
                Ok(event) => return Ok(Some(event)),
                Err(err) => {
                    warn!("skipping malformed event: {err}");
                    self.skipped += 1;
                }
            }
        }
    }
}
