//! Server assembly and the accept loops.
//!
//! [`ServerBuilder`] collects everything configurable before startup; the
//! built [`Server`] owns the route table and middleware stack and drives
//! one worker task per accepted connection. A plain and a TLS listener run
//! side by side, each disabled by leaving its port at `0`.

mod tls;

pub use tls::load_server_config;
pub use tls::TlsError;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, warn};

use weft_http::connection::{HttpConnection, DEFAULT_READ_TIMEOUT};
use weft_http::handler::Handler;
use weft_http::protocol::{HandlerError, Request};
use weft_http::response::ResponseWriter;
use weft_http::template::TemplateEngine;

use crate::handler::{ErrorHandler, RouteHandler};
use crate::middleware::{Chain, Middleware};
use crate::router::{Route, Router};
use crate::static_files::StaticFiles;
use crate::templates::DirectoryEngine;

const NOT_FOUND_BODY: &[u8] = b"<html><body>File not found!</body></html>";

/// Configures and builds a [`Server`].
///
/// At least one of `http_port` and `https_port` must be non-zero. Setting
/// `https_port` requires `private_key` and `certificate`, which are loaded
/// and validated by [`build`](Self::build), not at serve time.
pub struct ServerBuilder {
    http_port: u16,
    https_port: u16,
    templates_dir: Option<PathBuf>,
    private_key: Option<PathBuf>,
    certificate: Option<PathBuf>,
    not_found_handler: Option<Arc<dyn RouteHandler>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    read_timeout: Duration,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            http_port: 0,
            https_port: 0,
            templates_dir: None,
            private_key: None,
            certificate: None,
            not_found_handler: None,
            error_handler: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Port for the plain listener, `0` leaves it disabled.
    pub fn http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    /// Port for the TLS listener, `0` leaves it disabled.
    pub fn https_port(mut self, port: u16) -> Self {
        self.https_port = port;
        self
    }

    /// Directory holding the templates served by
    /// [`ResponseWriter::send_template`].
    pub fn templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }

    /// PEM private key for the TLS listener.
    pub fn private_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key = Some(path.into());
        self
    }

    /// PEM certificate chain for the TLS listener.
    pub fn certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate = Some(path.into());
        self
    }

    /// Handler invoked when no route matches, replacing the built-in 404
    /// page.
    pub fn not_found_handler(mut self, handler: impl RouteHandler + 'static) -> Self {
        self.not_found_handler = Some(Arc::new(handler));
        self
    }

    /// Handler invoked when a route handler fails before anything was
    /// written. Without one the connection is closed with no response.
    pub fn error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Overrides the per-connection read timeout.
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Validates the configuration and loads the TLS material and template
    /// engine.
    pub fn build(self) -> Result<Server, BuildError> {
        if self.http_port == 0 && self.https_port == 0 {
            return Err(BuildError::NoListeners);
        }

        let tls = if self.https_port != 0 {
            let key = self.private_key.ok_or(BuildError::MissingPrivateKey)?;
            let cert = self.certificate.ok_or(BuildError::MissingCertificate)?;
            let config = load_server_config(&key, &cert)?;
            Some(TlsAcceptor::from(Arc::new(config)))
        } else {
            None
        };

        let templates: Option<Arc<dyn TemplateEngine>> = match self.templates_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(BuildError::TemplatesDirNotFound { path: dir });
                }
                Some(Arc::new(DirectoryEngine::new(dir)))
            }
            None => None,
        };

        Ok(Server {
            router: Router::new(),
            middlewares: Vec::new(),
            not_found_handler: self.not_found_handler,
            error_handler: self.error_handler,
            templates,
            tls,
            http_port: self.http_port,
            https_port: self.https_port,
            read_timeout: self.read_timeout,
        })
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("http_port or https_port must be set")]
    NoListeners,

    #[error("private_key must be set when https_port is set")]
    MissingPrivateKey,

    #[error("certificate must be set when https_port is set")]
    MissingCertificate,

    #[error("templates dir {} is not a directory", path.display())]
    TemplatesDirNotFound { path: PathBuf },

    #[error(transparent)]
    Tls(#[from] TlsError),
}

/// The assembled server.
///
/// Routes and middleware are registered on the built server, then
/// [`listen`](Self::listen) or [`serve_until`](Self::serve_until) consumes
/// it and accepts connections until shutdown. Each connection is handled by
/// its own task: parse, route, handle, write, close.
pub struct Server {
    router: Router,
    middlewares: Vec<Arc<dyn Middleware>>,
    not_found_handler: Option<Arc<dyn RouteHandler>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    templates: Option<Arc<dyn TemplateEngine>>,
    tls: Option<TlsAcceptor>,
    http_port: u16,
    https_port: u16,
    read_timeout: Duration,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Registers a `GET` route, returning it for per-route configuration.
    ///
    /// # Panics
    ///
    /// Panics if the pattern does not compile, see [`Router::get`].
    pub fn get(&mut self, pattern: &str, handler: impl RouteHandler + 'static) -> &mut Route {
        self.router.get(pattern, handler)
    }

    /// Registers a `POST` route, returning it for per-route configuration.
    ///
    /// # Panics
    ///
    /// Panics if the pattern does not compile, see [`Router::post`].
    pub fn post(&mut self, pattern: &str, handler: impl RouteHandler + 'static) -> &mut Route {
        self.router.post(pattern, handler)
    }

    /// Mounts every route of `router` under `prefix`, see [`Router::mount`].
    ///
    /// # Panics
    ///
    /// Panics if a re-derived pattern does not compile.
    pub fn mount(&mut self, prefix: &str, router: &Router) {
        self.router.mount(prefix, router);
    }

    /// Appends a middleware that wraps every route, running in registration
    /// order before any per-route middleware.
    pub fn add_middleware(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Serves the files below `dir` under the URL prefix, e.g.
    /// `serve_static("/assets", "static")` maps `/assets/css/app.css` to
    /// `static/css/app.css`. Requests escaping the directory get a 404.
    pub fn serve_static(&mut self, prefix: &str, dir: impl Into<PathBuf>) -> &mut Route {
        let prefix = prefix.trim_end_matches('/');
        let pattern = format!("{prefix}/*");
        self.router.get(&pattern, StaticFiles::new(prefix, dir))
    }

    /// Serves until the process receives `Ctrl-C`.
    pub async fn listen(self) -> Result<(), ServeError> {
        self.serve_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` completes, then stops accepting.
    ///
    /// Connections already being processed run to completion on their own
    /// tasks.
    pub async fn serve_until(self, shutdown: impl Future<Output = ()>) -> Result<(), ServeError> {
        let plain = match self.http_port {
            0 => None,
            port => Some(bind(port).await?),
        };
        let tls = match (self.https_port, self.tls.clone()) {
            (port, Some(acceptor)) if port != 0 => Some((bind(port).await?, acceptor)),
            _ => None,
        };

        let server = Arc::new(self);
        let accept = async {
            match (plain, tls) {
                (Some(listener), Some((tls_listener, acceptor))) => {
                    tokio::join!(
                        serve_plain(listener, Arc::clone(&server)),
                        serve_tls(tls_listener, acceptor, Arc::clone(&server))
                    );
                }
                (Some(listener), None) => serve_plain(listener, Arc::clone(&server)).await,
                (None, Some((tls_listener, acceptor))) => {
                    serve_tls(tls_listener, acceptor, Arc::clone(&server)).await;
                }
                (None, None) => {}
            }
        };

        tokio::select! {
            _ = accept => {}
            _ = shutdown => info!("shutting down, no longer accepting connections"),
        }
        Ok(())
    }

    async fn not_found(&self, request: &Request, response: &mut ResponseWriter) -> Result<(), HandlerError> {
        match &self.not_found_handler {
            Some(handler) => handler.handle(request, response).await,
            None => {
                response.send_custom(404, mime::TEXT_HTML.as_ref(), NOT_FOUND_BODY).await?;
                Ok(())
            }
        }
    }

    async fn recover(
        &self,
        request: &Request,
        response: &mut ResponseWriter,
        error: HandlerError,
    ) -> Result<(), HandlerError> {
        if response.headers_sent() {
            return Err(error);
        }
        match &self.error_handler {
            Some(handler) => {
                warn!(cause = %error, "handler failed, invoking error handler");
                handler.handle(request, response, error).await
            }
            None => Err(error),
        }
    }
}

/// The error handler wraps the middleware chain and the terminal handler
/// only. A failing not-found handler closes the connection instead.
#[async_trait]
impl Handler for Server {
    async fn handle(&self, mut request: Request, response: &mut ResponseWriter) -> Result<(), HandlerError> {
        let Some((route, params)) = self.router.resolve(request.method(), request.path()) else {
            return self.not_found(&request, response).await;
        };

        request.set_path_params(params);
        let combined: Vec<Arc<dyn Middleware>> =
            self.middlewares.iter().chain(route.middlewares().iter()).map(Arc::clone).collect();
        let mut chain = Chain::new(&combined, route.handler());
        match chain.next(&request, response).await {
            Ok(()) => Ok(()),
            Err(error) => self.recover(&request, response, error).await,
        }
    }
}

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("can't bind port {port}: {source}")]
    Bind { port: u16, source: io::Error },
}

async fn bind(port: u16) -> Result<TcpListener, ServeError> {
    match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => {
            info!("start listening at 0.0.0.0:{port}");
            Ok(listener)
        }
        Err(e) => Err(ServeError::Bind { port, source: e }),
    }
}

async fn serve_plain(listener: TcpListener, server: Arc<Server>) {
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let server = Arc::clone(&server);
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            serve_connection(reader, writer, server, remote_addr).await;
        });
    }
}

async fn serve_tls(listener: TcpListener, acceptor: TlsAcceptor, server: Arc<Server>) {
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(stream) => stream,
                Err(e) => {
                    debug!(cause = %e, "tls handshake failed, connection dropped");
                    return;
                }
            };
            let (reader, writer) = tokio::io::split(stream);
            serve_connection(reader, writer, server, remote_addr).await;
        });
    }
}

async fn serve_connection<R, W>(reader: R, writer: W, server: Arc<Server>, remote_addr: SocketAddr)
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let connection = HttpConnection::new(reader, writer)
        .with_remote_addr(remote_addr)
        .with_read_timeout(server.read_timeout);
    let connection = match &server.templates {
        Some(templates) => connection.with_template_engine(Arc::clone(templates)),
        None => connection,
    };

    match connection.process(server).await {
        Ok(()) => info!("finished process, connection shutdown"),
        Err(e) => error!("service has error, cause {}, connection shutdown", e),
    }
}

/// Completes when the process receives `Ctrl-C`. If the signal handler
/// can't be installed the server keeps serving until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(cause = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{error_handler_fn, handler_fn};
    use serde_json::json;
    use std::fs::File;
    use std::io::BufReader;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio_rustls::rustls::pki_types::ServerName;
    use tokio_rustls::rustls::{ClientConfig, RootCertStore};
    use tokio_rustls::TlsConnector;

    fn test_server() -> Server {
        Server::builder().http_port(8080).build().unwrap()
    }

    fn testdata(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
    }

    async fn spawn_plain(server: Server) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_plain(listener, Arc::new(server)));
        addr
    }

    async fn send_raw(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn routes_and_path_params_over_the_wire() {
        let mut server = test_server();
        server.get("/users/:id", handler_fn(|request, response| {
            Box::pin(async move {
                let id = request.path_param("id").unwrap_or_default();
                response.send_text(format!("user {id}")).await?;
                Ok(())
            })
        }));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /users/42 HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Length: 7\r\n"));
        assert!(response.ends_with("\r\n\r\nuser 42"));
    }

    #[tokio::test]
    async fn query_params_reach_handlers() {
        let mut server = test_server();
        server.get("/search", handler_fn(|request, response| {
            Box::pin(async move {
                let q = request.query_param("q").unwrap_or_default();
                let page = request.query_param("page").unwrap_or_default();
                response.send_text(format!("{q} page {page}")).await?;
                Ok(())
            })
        }));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /search?q=rust&page=2 HTTP/1.1\r\n\r\n").await;
        assert!(response.ends_with("rust page 2"));
    }

    #[tokio::test]
    async fn post_body_reaches_handlers() {
        let mut server = test_server();
        server.post("/echo", handler_fn(|request, response| {
            Box::pin(async move {
                response.send_text(request.text()).await?;
                Ok(())
            })
        }));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "POST /echo HTTP/1.1\r\nContent-Length: 12\r\n\r\nhello server").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("hello server"));
    }

    #[tokio::test]
    async fn unmatched_path_gets_the_default_not_found_page() {
        let mut server = test_server();
        server.get("/", handler_fn(|_request, response| {
            Box::pin(async move {
                response.send_text("home").await?;
                Ok(())
            })
        }));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /missing HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.contains("Content-Type: text/html\r\n"));
        assert!(response.ends_with("<html><body>File not found!</body></html>"));
    }

    #[tokio::test]
    async fn custom_not_found_handler_replaces_the_default() {
        let mut server = Server::builder()
            .http_port(8080)
            .not_found_handler(handler_fn(|request, response| {
                Box::pin(async move {
                    let body = format!("no route for {}", request.path());
                    response.send_custom(404, mime::TEXT_PLAIN.as_ref(), body.as_bytes()).await?;
                    Ok(())
                })
            }))
            .build()
            .unwrap();
        server.get("/", handler_fn(|_request, response| {
            Box::pin(async move {
                response.send_text("home").await?;
                Ok(())
            })
        }));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /missing HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.ends_with("no route for /missing"));
    }

    struct Tag(&'static str);

    #[async_trait]
    impl Middleware for Tag {
        async fn handle(
            &self,
            request: &Request,
            response: &mut ResponseWriter,
            chain: &mut Chain<'_>,
        ) -> Result<(), HandlerError> {
            response.append_header("X-Trace", self.0);
            chain.next(request, response).await
        }
    }

    #[tokio::test]
    async fn global_middleware_runs_before_route_middleware() {
        let mut server = test_server();
        server.add_middleware(Tag("global"));
        server
            .get("/", handler_fn(|_request, response| {
                Box::pin(async move {
                    response.send_text("home").await?;
                    Ok(())
                })
            }))
            .with(Tag("route"));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET / HTTP/1.1\r\n\r\n").await;
        let head = response.split("\r\n\r\n").next().unwrap().to_string();
        let global_at = head.find("X-Trace: global").unwrap();
        let route_at = head.find("X-Trace: route").unwrap();
        assert!(global_at < route_at);
        assert!(response.ends_with("home"));
    }

    struct Gate;

    #[async_trait]
    impl Middleware for Gate {
        async fn handle(
            &self,
            _request: &Request,
            response: &mut ResponseWriter,
            _chain: &mut Chain<'_>,
        ) -> Result<(), HandlerError> {
            response.send_custom(403, mime::TEXT_PLAIN.as_ref(), b"forbidden").await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn middleware_can_short_circuit_the_handler() {
        let mut server = test_server();
        server.add_middleware(Gate);
        server.get("/secret", handler_fn(|_request, response| {
            Box::pin(async move {
                response.send_text("secret").await?;
                Ok(())
            })
        }));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /secret HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 403 Forbidden\r\n"));
        assert!(response.ends_with("forbidden"));
        assert!(!response.contains("secret"));
    }

    #[tokio::test]
    async fn error_handler_turns_failures_into_responses() {
        let mut server = Server::builder()
            .http_port(8080)
            .error_handler(error_handler_fn(|_request, response, error| {
                Box::pin(async move {
                    response.send_custom(500, mime::TEXT_PLAIN.as_ref(), error.to_string().as_bytes()).await?;
                    Ok(())
                })
            }))
            .build()
            .unwrap();
        server.get("/fail", handler_fn(|_request, _response| {
            Box::pin(async move { Err("database is down".into()) })
        }));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /fail HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(response.ends_with("database is down"));
    }

    #[tokio::test]
    async fn handler_error_without_error_handler_closes_bare() {
        let mut server = test_server();
        server.get("/fail", handler_fn(|_request, _response| {
            Box::pin(async move { Err("database is down".into()) })
        }));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /fail HTTP/1.1\r\n\r\n").await;
        assert_eq!(response, "");
    }

    #[tokio::test]
    async fn not_found_handler_errors_are_not_recovered() {
        let server = Server::builder()
            .http_port(8080)
            .not_found_handler(handler_fn(|_request, _response| {
                Box::pin(async move { Err("lookup failed".into()) })
            }))
            .error_handler(error_handler_fn(|_request, response, _error| {
                Box::pin(async move {
                    response.send_custom(500, mime::TEXT_PLAIN.as_ref(), b"recovered").await?;
                    Ok(())
                })
            }))
            .build()
            .unwrap();

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /nowhere HTTP/1.1\r\n\r\n").await;
        assert_eq!(response, "");
    }

    #[tokio::test]
    async fn mounted_router_resolves_under_prefix() {
        let mut api = Router::new();
        api.get("/users/:id", handler_fn(|request, response| {
            Box::pin(async move {
                let id = request.path_param("id").unwrap_or_default();
                response.send_text(format!("api user {id}")).await?;
                Ok(())
            })
        }));

        let mut server = test_server();
        server.mount("/api", &api);

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /api/users/7 HTTP/1.1\r\n\r\n").await;
        assert!(response.ends_with("api user 7"));
    }

    #[tokio::test]
    async fn static_files_are_served_below_the_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.css"), "body { margin: 0 }").unwrap();

        let mut server = test_server();
        server.serve_static("/assets", dir.path());

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /assets/app.css HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/css\r\n"));
        assert!(response.ends_with("body { margin: 0 }"));

        let response = send_raw(addr, "GET /assets/../Cargo.toml HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[tokio::test]
    async fn templates_render_over_the_wire() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.html"), "<h1>Hello {{ name }}!</h1>").unwrap();

        let mut server = Server::builder().http_port(8080).templates_dir(dir.path()).build().unwrap();
        server.get("/hello/:name", handler_fn(|request, response| {
            Box::pin(async move {
                let name = request.path_param("name").unwrap_or_default();
                response.send_template("hello.html", &json!({ "name": name })).await?;
                Ok(())
            })
        }));

        let addr = spawn_plain(server).await;
        let response = send_raw(addr, "GET /hello/weft HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/html\r\n"));
        assert!(response.ends_with("<h1>Hello weft!</h1>"));
    }

    #[tokio::test]
    async fn tls_round_trip() {
        let config = load_server_config(&testdata("key.pem"), &testdata("cert.pem")).unwrap();
        let acceptor = TlsAcceptor::from(Arc::new(config));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut server = test_server();
        server.get("/secure", handler_fn(|_request, response| {
            Box::pin(async move {
                response.send_text("over tls").await?;
                Ok(())
            })
        }));
        tokio::spawn(serve_tls(listener, acceptor, Arc::new(server)));

        let mut roots = RootCertStore::empty();
        let mut reader = BufReader::new(File::open(testdata("cert.pem")).unwrap());
        for cert in rustls_pemfile::certs(&mut reader) {
            roots.add(cert.unwrap()).unwrap();
        }
        let client_config = ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();
        let connector = TlsConnector::from(Arc::new(client_config));

        let stream = TcpStream::connect(addr).await.unwrap();
        let server_name = ServerName::try_from("localhost").unwrap();
        let mut stream = connector.connect(server_name, stream).await.unwrap();
        stream.write_all(b"GET /secure HTTP/1.1\r\n\r\n").await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("over tls"));
    }

    #[tokio::test]
    async fn serve_until_surfaces_bind_errors() {
        let occupied = TcpListener::bind(("0.0.0.0", 0)).await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let server = Server::builder().http_port(port).build().unwrap();
        let err = server.serve_until(std::future::pending()).await.unwrap_err();
        assert!(matches!(err, ServeError::Bind { port: p, .. } if p == port));
    }

    #[test]
    fn build_rejects_missing_listeners_and_tls_material() {
        assert!(matches!(Server::builder().build(), Err(BuildError::NoListeners)));
        assert!(matches!(
            Server::builder().https_port(8443).certificate(testdata("cert.pem")).build(),
            Err(BuildError::MissingPrivateKey)
        ));
        assert!(matches!(
            Server::builder().https_port(8443).private_key(testdata("key.pem")).build(),
            Err(BuildError::MissingCertificate)
        ));
    }

    #[test]
    fn build_rejects_absent_templates_dir() {
        let result = Server::builder().http_port(8080).templates_dir("/no/such/dir").build();
        assert!(matches!(result, Err(BuildError::TemplatesDirNotFound { .. })));
    }

    #[test]
    fn build_loads_tls_material() {
        let server = Server::builder()
            .https_port(8443)
            .private_key(testdata("key.pem"))
            .certificate(testdata("cert.pem"))
            .build();
        assert!(server.is_ok());
    }
}
