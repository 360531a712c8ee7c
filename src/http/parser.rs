//! Incremental HTTP/1.x response parser.
//!
//! The parser does no I/O: the caller feeds whatever chunks the transport
//! produced and calls [`ResponseParser::finish`] on end-of-stream. Chunk
//! boundaries never affect the result.
//!
//! Phases advance strictly in order:
//!
//! ```text
//! StatusLine -> Headers -> Body -> Complete
//! ```
//!
//! The body is close-delimited: end-of-stream is its only terminator,
//! whatever the status code.

use crate::base::neterror::NetError;
use crate::http::response::FetchResponse;
use bytes::{Buf, BytesMut};

/// Chromium's `kMaxHeaderBufSize`.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 256 * 1024;

const VERSION_PREFIX: &[u8] = b"HTTP/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParsePhase {
    StatusLine,
    Headers,
    Body,
    Complete,
}

/// Size limits applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    /// Cap on the status line plus header block, terminators included.
    pub max_header_bytes: usize,
    /// Cap on the body; `None` accumulates until end-of-stream.
    pub max_body_bytes: Option<usize>,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    /// Parse a status line with its terminator already stripped.
    pub fn parse(line: &[u8]) -> Result<Self, NetError> {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_start();

        let (version, rest) = split_token(text);
        if !version.starts_with("HTTP/") {
            return Err(NetError::InvalidHttpResponse(format!(
                "bad protocol version {version:?}"
            )));
        }

        let (code, rest) = split_token(rest.trim_start());
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NetError::InvalidHttpResponse(format!(
                "bad status code {code:?}"
            )));
        }
        let code: u16 = code
            .parse()
            .map_err(|_| NetError::InvalidHttpResponse(format!("bad status code {code:?}")))?;
        if code < 100 {
            return Err(NetError::InvalidHttpResponse(format!(
                "status code {code} out of range"
            )));
        }

        Ok(Self {
            version: version.to_string(),
            code,
            reason: rest.trim().to_string(),
        })
    }
}

fn split_token(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    }
}

/// Strip the trailing `\n` and an optional `\r` before it.
fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[derive(Debug)]
pub struct ResponseParser {
    phase: ParsePhase,
    limits: ParserLimits,
    /// Bytes received but not yet assigned to a line.
    pending: BytesMut,
    /// Leading bytes of `pending` already known to hold no `\n`.
    scanned: usize,
    /// Status line and header bytes consumed so far.
    head_len: usize,
    status: Option<StatusLine>,
    headers: BytesMut,
    body: BytesMut,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(ParserLimits::default())
    }
}

impl ResponseParser {
    pub fn new(limits: ParserLimits) -> Self {
        Self {
            phase: ParsePhase::StatusLine,
            limits,
            pending: BytesMut::new(),
            scanned: 0,
            head_len: 0,
            status: None,
            headers: BytesMut::new(),
            body: BytesMut::new(),
        }
    }

    pub fn phase(&self) -> ParsePhase {
        self.phase
    }

    pub fn status_line(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    /// The parsed status code, 0 until the status line is complete.
    pub fn status_code(&self) -> u16 {
        self.status.as_ref().map_or(0, |s| s.code)
    }

    /// The raw header block (without the blank terminator line).
    pub fn raw_headers(&self) -> &[u8] {
        &self.headers
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Consume one chunk from the transport and return the phase reached.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<ParsePhase, NetError> {
        match self.phase {
            ParsePhase::Complete => return Ok(ParsePhase::Complete),
            ParsePhase::Body => {
                self.append_body(chunk)?;
                return Ok(self.phase);
            }
            ParsePhase::StatusLine | ParsePhase::Headers => {}
        }

        self.pending.extend_from_slice(chunk);
        if self.phase == ParsePhase::StatusLine {
            self.check_version_prefix()?;
        }

        while self.phase < ParsePhase::Body {
            let newline = self.pending[self.scanned..]
                .iter()
                .position(|&b| b == b'\n');
            let Some(pos) = newline else {
                self.scanned = self.pending.len();
                if self.head_len + self.pending.len() > self.limits.max_header_bytes {
                    return Err(NetError::ResponseHeadersTooBig {
                        limit: self.limits.max_header_bytes,
                    });
                }
                return Ok(self.phase);
            };

            let line = self.pending.split_to(self.scanned + pos + 1);
            self.scanned = 0;
            self.head_len += line.len();
            if self.head_len > self.limits.max_header_bytes {
                return Err(NetError::ResponseHeadersTooBig {
                    limit: self.limits.max_header_bytes,
                });
            }

            self.consume_line(&line)?;
        }

        if self.pending.has_remaining() {
            let rest = self.pending.split();
            self.append_body(&rest)?;
        }
        Ok(self.phase)
    }

    /// Fail as soon as the start of the status line cannot become `HTTP/`,
    /// instead of waiting for a line terminator that may never come.
    fn check_version_prefix(&self) -> Result<(), NetError> {
        let Some(start) = self.pending.iter().position(|b| !b.is_ascii_whitespace()) else {
            return Ok(());
        };
        let head = &self.pending[start..];
        let n = head.len().min(VERSION_PREFIX.len());
        if head[..n] != VERSION_PREFIX[..n] {
            return Err(NetError::InvalidHttpResponse(format!(
                "bad protocol version {:?}",
                String::from_utf8_lossy(&head[..n])
            )));
        }
        Ok(())
    }

    fn consume_line(&mut self, line: &[u8]) -> Result<(), NetError> {
        let content = trim_line_end(line);
        match self.phase {
            ParsePhase::StatusLine => {
                let status = StatusLine::parse(content)?;
                tracing::debug!(
                    version = %status.version,
                    status_code = status.code,
                    reason = %status.reason,
                    "status line parsed"
                );
                self.status = Some(status);
                self.phase = ParsePhase::Headers;
            }
            ParsePhase::Headers if content.is_empty() => {
                tracing::trace!(
                    headers = %String::from_utf8_lossy(&self.headers),
                    "header block complete"
                );
                self.phase = ParsePhase::Body;
            }
            ParsePhase::Headers => {
                self.headers.extend_from_slice(line);
            }
            ParsePhase::Body | ParsePhase::Complete => {
                unreachable!("lines are only consumed before the body")
            }
        }
        Ok(())
    }

    fn append_body(&mut self, chunk: &[u8]) -> Result<(), NetError> {
        if let Some(limit) = self.limits.max_body_bytes {
            if self.body.len() + chunk.len() > limit {
                return Err(NetError::ResponseBodyTooBig { limit });
            }
        }
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    /// Signal end-of-stream.
    ///
    /// Only legal once the header block is complete; earlier it means the
    /// peer closed mid-response.
    pub fn finish(mut self) -> Result<FetchResponse, NetError> {
        match self.phase {
            ParsePhase::StatusLine if self.head_len == 0 && self.pending.is_empty() => {
                Err(NetError::EmptyResponse)
            }
            ParsePhase::StatusLine => Err(NetError::InvalidHttpResponse(
                "connection closed inside the status line".into(),
            )),
            ParsePhase::Headers => Err(NetError::ResponseHeadersTruncated),
            ParsePhase::Body | ParsePhase::Complete => {
                self.phase = ParsePhase::Complete;
                let status = self
                    .status
                    .take()
                    .ok_or(NetError::EmptyResponse)?;
                Ok(FetchResponse::new(status, self.body.freeze()))
            }
        }
    }
}
