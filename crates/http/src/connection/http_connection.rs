use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::debug;

use crate::codec::RequestDecoder;
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError};
use crate::response::ResponseWriter;
use crate::template::TemplateEngine;

use tokio_util::codec::FramedRead;

/// How long a connection may take to deliver a complete request before the
/// worker gives up on it.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP connection that reads one request and writes one response
///
/// `HttpConnection` drives the full lifecycle of a single connection:
/// - reading and decoding the request, bounded by a read timeout
/// - invoking the handler with the request and the response writer
/// - shutting the stream down once the handler returns
///
/// There is no keep-alive. After one request/response exchange the
/// connection is closed, whatever the outcome.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    writer: W,
    remote_addr: Option<SocketAddr>,
    read_timeout: Duration,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Send + Unpin + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            writer,
            remote_addr: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            templates: None,
        }
    }

    /// Records the peer address, exposed to handlers via `Request::remote_addr`.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Overrides [`DEFAULT_READ_TIMEOUT`] for this connection.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Attaches the template engine handed to the response writer.
    pub fn with_template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.templates = Some(engine);
        self
    }

    /// Processes the connection: decode, handle, respond, close.
    ///
    /// A malformed or timed-out request surfaces as an error without any
    /// bytes having been written; the caller logs it and drops the
    /// connection. A peer that closes before sending anything is not an
    /// error.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        let mut request = match timeout(self.read_timeout, self.framed_read.next()).await {
            Ok(Some(Ok(request))) => request,
            Ok(Some(Err(e))) => return Err(e.into()),
            Ok(None) => {
                debug!("connection closed before a request arrived");
                return Ok(());
            }
            Err(_) => return Err(ParseError::read_timeout(self.read_timeout).into()),
        };
        request.set_remote_addr(self.remote_addr);

        let mut response = ResponseWriter::new(self.writer);
        if let Some(templates) = self.templates {
            response = response.with_template_engine(templates);
        }

        handler.handle(request, &mut response).await.map_err(HttpError::handler)?;

        response.finish().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use crate::protocol::Request;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    fn echo_handler() -> impl Handler {
        make_handler(|request: Request, response| {
            Box::pin(async move {
                response.send_text(format!("{} {} {}", request.method(), request.path(), request.text())).await?;
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn processes_one_request_then_closes() {
        let (mut client, server) = duplex(4096);
        let (reader, writer) = tokio::io::split(server);

        let conn = HttpConnection::new(reader, writer);
        let worker = tokio::spawn(conn.process(Arc::new(echo_handler())));

        client.write_all(b"GET /ping HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("GET /ping "));
        worker.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn delivers_post_body_to_handler() {
        let (mut client, server) = duplex(4096);
        let (reader, writer) = tokio::io::split(server);

        let conn = HttpConnection::new(reader, writer);
        let worker = tokio::spawn(conn.process(Arc::new(echo_handler())));

        client.write_all(b"POST /data HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello").await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.ends_with("POST /data hello"));
        worker.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn exposes_remote_addr_to_handler() {
        let (mut client, server) = duplex(4096);
        let (reader, writer) = tokio::io::split(server);

        let handler = make_handler(|request: Request, response| {
            Box::pin(async move {
                let addr = request.remote_addr().map(|a| a.to_string()).unwrap_or_default();
                response.send_text(addr).await?;
                Ok(())
            })
        });
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let conn = HttpConnection::new(reader, writer).with_remote_addr(addr);
        let worker = tokio::spawn(conn.process(Arc::new(handler)));

        client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("127.0.0.1:9999"));
        worker.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn malformed_request_closes_without_a_response() {
        let (mut client, server) = duplex(4096);
        let (reader, writer) = tokio::io::split(server);

        let conn = HttpConnection::new(reader, writer);
        let worker = tokio::spawn(conn.process(Arc::new(echo_handler())));

        client.write_all(b"NONSENSE\r\n\r\n").await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        assert!(out.is_empty());

        let err = worker.await.unwrap().unwrap_err();
        assert!(matches!(err, HttpError::RequestError { .. }));
    }

    #[tokio::test]
    async fn peer_disconnect_before_request_is_clean() {
        let (client, server) = duplex(4096);
        let (reader, writer) = tokio::io::split(server);
        drop(client);

        let conn = HttpConnection::new(reader, writer);
        conn.process(Arc::new(echo_handler())).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_hits_read_timeout() {
        let (_client, server) = duplex(4096);
        let (reader, writer) = tokio::io::split(server);

        let conn = HttpConnection::new(reader, writer).with_read_timeout(Duration::from_secs(5));
        let err = conn.process(Arc::new(echo_handler())).await.unwrap_err();

        assert!(matches!(
            err,
            HttpError::RequestError { source: ParseError::ReadTimeout { .. } }
        ));
    }

    #[tokio::test]
    async fn handler_error_propagates() {
        let (mut client, server) = duplex(4096);
        let (reader, writer) = tokio::io::split(server);

        let handler = make_handler(|_request: Request, _response| {
            Box::pin(async move { Err("boom".into()) })
        });
        let conn = HttpConnection::new(reader, writer);
        let worker = tokio::spawn(conn.process(Arc::new(handler)));

        client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        assert!(out.is_empty());

        let err = worker.await.unwrap().unwrap_err();
        assert!(matches!(err, HttpError::HandlerError { .. }));
    }
}
