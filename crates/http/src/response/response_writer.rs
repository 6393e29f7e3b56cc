//! HTTP response writer implementation for serializing responses to a connection
//!
//! This module provides [`ResponseWriter`], a stateful writer that accumulates
//! status, headers and cookies, then serializes the header block and body to
//! the underlying connection in a single terminal send.
//!
//! # Lifecycle
//!
//! A writer starts in the pending state: `set_status`, `add_header`,
//! `append_header` and `add_cookie` mutate what will be sent. The first
//! terminal operation (`send_text`, `send_json`, `send_file`, ...) freezes
//! that state, writes the header block followed by the body, and flushes.
//! The header block is written exactly once per connection:
//!
//! - a second terminal operation returns [`WriteError::AlreadySent`] and
//!   leaves the bytes of the first response untouched
//! - mutating status, headers or cookies after the send panics, since the
//!   data can no longer reach the wire
//!
//! # Framing
//!
//! Every response carries a `Content-Length` header with the exact byte
//! length of the body. There is no chunked encoding and no keep-alive; the
//! connection closes after the response.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use mime::Mime;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::ensure;
use crate::protocol::{reason_phrase, WriteError};
use crate::template::{RenderError, TemplateEngine};

/// Initial buffer size allocated for header serialization
const INIT_HEAD_SIZE: usize = 4 * 1024;

/// A write-once response writer bound to a single connection.
///
/// See the [module docs](self) for the lifecycle rules.
pub struct ResponseWriter {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    status: u16,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    headers_sent: bool,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl ResponseWriter {
    /// Creates a writer over the connection's write half.
    ///
    /// The status defaults to `200` and no headers are pending.
    pub fn new(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            writer: Box::new(writer),
            status: 200,
            headers: Vec::new(),
            cookies: Vec::new(),
            headers_sent: false,
            templates: None,
        }
    }

    /// Attaches the template engine used by [`send_template`](Self::send_template).
    pub fn with_template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.templates = Some(engine);
        self
    }

    /// Returns the pending status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns whether the header block has already been written.
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Sets the pending status code.
    ///
    /// # Panics
    ///
    /// Panics if the response was already sent.
    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.assert_pending();
        self.status = status;
        self
    }

    /// Sets a header, replacing any existing header with the same name.
    ///
    /// Name comparison is ASCII case-insensitive; the replacement keeps the
    /// original position in the header block.
    ///
    /// # Panics
    ///
    /// Panics if the response was already sent.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.assert_pending();
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => *entry = (name, value),
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Appends a header line without replacing existing ones of the same name.
    ///
    /// # Panics
    ///
    /// Panics if the response was already sent.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.assert_pending();
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a cookie, emitted as its own `Set-Cookie` line.
    ///
    /// Setting the same cookie name again replaces the value in place.
    ///
    /// # Panics
    ///
    /// Panics if the response was already sent.
    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.assert_pending();
        let name = name.into();
        let value = value.into();
        match self.cookies.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.cookies.push((name, value)),
        }
        self
    }

    /// Sends a `text/plain` body with the pending status.
    pub async fn send_text(&mut self, body: impl AsRef<str>) -> Result<(), WriteError> {
        self.send_response(mime::TEXT_PLAIN.as_ref(), body.as_ref().as_bytes()).await
    }

    /// Serializes `value` as JSON and sends it as `application/json`.
    ///
    /// The pending status is respected, so `set_status(201)` followed by
    /// `send_json` produces a 201.
    pub async fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), WriteError> {
        ensure!(!self.headers_sent, WriteError::AlreadySent);
        let body = serde_json::to_vec(value)?;
        self.send_response(mime::APPLICATION_JSON.as_ref(), &body).await
    }

    /// Sends a body with an explicit content type and the pending status.
    pub async fn send_bytes(&mut self, content_type: &str, body: &[u8]) -> Result<(), WriteError> {
        self.send_response(content_type, body).await
    }

    /// Sends a body with an explicit status code and content type.
    ///
    /// Unlike [`set_status`](Self::set_status), this works regardless of the
    /// pending status and is usable from recovery paths that must not panic.
    pub async fn send_custom(&mut self, status: u16, content_type: &str, body: &[u8]) -> Result<(), WriteError> {
        ensure!(!self.headers_sent, WriteError::AlreadySent);
        self.status = status;
        self.send_response(content_type, body).await
    }

    /// Sends the file at `path`, deriving the content type from its extension.
    ///
    /// A missing file produces a plain 404 response on the same connection
    /// rather than an error. Other read failures propagate as
    /// [`WriteError::Io`].
    pub async fn send_file(&mut self, path: impl AsRef<Path>) -> Result<(), WriteError> {
        ensure!(!self.headers_sent, WriteError::AlreadySent);
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(body) => {
                let content_type = content_type_for(path);
                self.send_response(content_type.as_ref(), &body).await
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.send_custom(404, mime::TEXT_PLAIN.as_ref(), b"File not found!").await
            }
            Err(e) => Err(WriteError::io(e)),
        }
    }

    /// Renders the named template and sends it as `text/html`.
    ///
    /// A missing engine or an unknown template name produce a plain 500
    /// response; a render failure propagates as [`WriteError::Render`].
    pub async fn send_template(&mut self, name: &str, params: &serde_json::Value) -> Result<(), WriteError> {
        ensure!(!self.headers_sent, WriteError::AlreadySent);
        let Some(engine) = self.templates.clone() else {
            return self.send_custom(500, mime::TEXT_PLAIN.as_ref(), b"template engine is not configured").await;
        };
        match engine.render(name, params) {
            Ok(body) => self.send_response(mime::TEXT_HTML.as_ref(), &body).await,
            Err(RenderError::NotFound { name }) => {
                let body = format!("template not found: {name}");
                self.send_custom(500, mime::TEXT_PLAIN.as_ref(), body.as_bytes()).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sends a `302 Found` redirect to `location` with an empty body.
    pub async fn redirect(&mut self, location: impl AsRef<str>) -> Result<(), WriteError> {
        ensure!(!self.headers_sent, WriteError::AlreadySent);
        self.add_header("Location", location.as_ref());
        self.status = 302;
        self.send_response("", b"").await
    }

    /// Shuts down the underlying connection once the response is out.
    pub(crate) async fn finish(mut self) -> Result<(), WriteError> {
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Writes the header block and body, then flushes.
    ///
    /// An empty `content_type` suppresses the `Content-Type` header, which
    /// redirects rely on.
    async fn send_response(&mut self, content_type: &str, body: &[u8]) -> Result<(), WriteError> {
        ensure!(!self.headers_sent, WriteError::AlreadySent);
        if !content_type.is_empty() {
            self.add_header("Content-Type", content_type);
        }
        self.add_header("Content-Length", body.len().to_string());
        self.headers_sent = true;

        let head = self.encode_head()?;
        self.writer.write_all(&head).await?;
        self.writer.write_all(body).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Serializes the status line, headers and cookies into one buffer.
    fn encode_head(&self) -> Result<BytesMut, WriteError> {
        let mut buf = BytesMut::with_capacity(INIT_HEAD_SIZE);
        write!(FastWrite(&mut buf), "HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status))?;

        for (name, value) in &self.headers {
            buf.put_slice(name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        for (name, value) in &self.cookies {
            write!(FastWrite(&mut buf), "Set-Cookie: {name}={value}\r\n")?;
        }
        buf.put_slice(b"\r\n");
        Ok(buf)
    }

    fn assert_pending(&self) {
        assert!(!self.headers_sent, "response was already sent, headers can no longer change");
    }
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("headers_sent", &self.headers_sent)
            .finish_non_exhaustive()
    }
}

/// Maps a file extension to the content type served for it.
///
/// Unknown extensions fall back to `application/octet-stream`.
fn content_type_for(path: &Path) -> Mime {
    let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML,
        Some("css") => mime::TEXT_CSS,
        Some("js") => mime::TEXT_JAVASCRIPT,
        Some("json") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        Some("pdf") => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// This is an optimization to avoid unnecessary bounds checking when writing
/// to the bytes buffer, since we've already reserved enough space.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    /// Writes a buffer into this writer, returning how many bytes were written.
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    /// Flush this output stream, ensuring that all intermediately buffered contents reach their destination.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
