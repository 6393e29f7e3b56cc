//! HTTP request decoder module
//!
//! This module decodes HTTP/1.1 requests from raw bytes using a streaming
//! approach: the header block is parsed in one pass once its terminating
//! blank line has arrived, then the declared number of body bytes is
//! awaited. Parsing is done by hand over the buffer; there is no external
//! HTTP parser underneath.
//!
//! # Wire expectations
//!
//! - Lines end with `\n`, with an optional preceding `\r`, so both strict
//!   CRLF clients and hand-typed requests parse.
//! - The request line is `METHOD TARGET VERSION`; fewer than three tokens
//!   or an unknown method is a parse error.
//! - Header lines split at the first `:` with both sides trimmed; lines
//!   without a colon are skipped.
//! - A `Content-Length` header declares the body size; a missing or
//!   non-numeric value means an empty body.
//!
//! # Limits
//!
//! - Maximum header block size: 8KB
//! - Maximum number of header lines: 64

use std::collections::HashMap;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::codec::query::{parse_cookies, parse_query};
use crate::ensure;
use crate::protocol::{Method, ParseError, Request};

/// Maximum number of header lines allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the request line plus all headers
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// A decoder for HTTP requests implementing the [`Decoder`] trait.
///
/// The decoder operates in two phases, tracked by the `head` field:
/// - `None`: waiting for the header block's terminating blank line
/// - `Some(head)`: header block parsed, waiting for `remaining` body bytes
#[derive(Debug)]
pub struct RequestDecoder {
    head: Option<Head>,
    remaining: usize,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` instance
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { head: None, remaining: 0 }
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// Attempts to decode an HTTP request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: a complete request, head and body
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the request is malformed or exceeds a limit
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.head.is_none() {
            let Some(span) = find_blank_line(src) else {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            };
            ensure!(span.head_len <= MAX_HEADER_BYTES, ParseError::too_large_header(span.head_len, MAX_HEADER_BYTES));

            let head_bytes = src.split_to(span.head_len);
            src.advance(span.body_start - span.head_len);

            let head = parse_head(&head_bytes)?;
            self.remaining = declared_content_length(&head.headers);
            self.head = Some(head);
        }

        if src.len() < self.remaining {
            return Ok(None);
        }

        let Some(head) = self.head.take() else {
            return Ok(None);
        };
        let body = src.split_to(self.remaining).freeze();
        self.remaining = 0;
        Ok(Some(head.into_request(body)))
    }

    /// On EOF, a half-received request is a parse failure rather than a
    /// silently dropped one.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(request) => Ok(Some(request)),
            None => {
                ensure!(self.head.is_none() && src.is_empty(), ParseError::invalid_body("unexpected eof before request was complete"));
                Ok(None)
            }
        }
    }
}

/// The parsed header block, waiting for its body.
#[derive(Debug)]
struct Head {
    method: Method,
    path: String,
    query_params: HashMap<String, String>,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
}

impl Head {
    fn into_request(self, body: Bytes) -> Request {
        Request::new(self.method, self.path, self.query_params, self.headers, self.cookies, body)
    }
}

/// Byte positions delimiting the header block within the buffer.
struct HeadSpan {
    /// Length of the header block, excluding the blank line
    head_len: usize,
    /// Offset of the first body byte, past the blank line
    body_start: usize,
}

/// Finds the blank line terminating the header block, if it has arrived.
fn find_blank_line(src: &[u8]) -> Option<HeadSpan> {
    let mut line_start = 0;
    for (i, byte) in src.iter().enumerate() {
        if *byte != b'\n' {
            continue;
        }
        let line = &src[line_start..i];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            return Some(HeadSpan { head_len: line_start, body_start: i + 1 });
        }
        line_start = i + 1;
    }
    None
}

fn parse_head(head: &[u8]) -> Result<Head, ParseError> {
    let text = std::str::from_utf8(head).map_err(|e| ParseError::invalid_header(format!("header block is not utf-8: {e}")))?;

    let mut lines = text.lines();
    let request_line = lines.next().ok_or_else(|| ParseError::invalid_request_line("empty request line"))?;

    let mut tokens = request_line.split_whitespace();
    let (Some(method_token), Some(target), Some(version)) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(ParseError::invalid_request_line(format!("expected `METHOD TARGET VERSION`, got {request_line:?}")));
    };

    let method = Method::from_token(method_token).ok_or_else(|| ParseError::invalid_method(method_token))?;
    ensure!(version.starts_with("HTTP/"), ParseError::invalid_version(version));

    let (path, raw_query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    let query_params = raw_query.map(parse_query).unwrap_or_default();

    let mut headers = HashMap::new();
    let mut header_count = 0usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        header_count += 1;
        ensure!(header_count <= MAX_HEADER_NUM, ParseError::too_many_headers(MAX_HEADER_NUM));
        headers.insert(name.to_string(), value.trim().to_string());
    }

    let cookies = headers.get("Cookie").map(|raw| parse_cookies(raw)).unwrap_or_default();

    Ok(Head { method, path: path.to_string(), query_params, headers, cookies })
}

fn declared_content_length(headers: &HashMap<String, String>) -> usize {
    headers.get("Content-Length").and_then(|value| value.trim().parse::<usize>().ok()).unwrap_or(0)
}
