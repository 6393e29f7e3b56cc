//! An asynchronous minimal HTTP/1.1 server implementation
//!
//! This crate provides the wire layer of the weft web framework: a hand-rolled
//! HTTP/1.1 request parser, a write-once response writer and a per-connection
//! processing loop built on top of tokio. It deliberately implements a small,
//! predictable slice of the protocol and keeps the connection model simple:
//! one request, one response, then the connection closes.
//!
//! # Features
//!
//! - Hand-rolled HTTP/1.1 request parsing, no external parser underneath
//! - Asynchronous I/O using tokio
//! - Query parameter, cookie and JSON body access on the request
//! - Write-once response writer with `Content-Length` framing
//! - Double-send protection: the first response's bytes always win
//! - Connection-level read timeout against silent peers
//! - Clean error handling
//!
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn, Level};
//! use tracing_subscriber::FmtSubscriber;
//! use weft_http::connection::HttpConnection;
//! use weft_http::handler::make_handler;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     info!(port = 8080, "start listening");
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(|request, response| {
//!         Box::pin(async move {
//!             info!("request path {}", request.path());
//!             response.send_text("Hello World!\r\n").await?;
//!             Ok(())
//!         })
//!     }));
//!
//!     loop {
//!         let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer).with_remote_addr(remote_addr);
//!             match connection.process(handler).await {
//!                 Ok(_) => {
//!                     info!("finished process, connection shutdown");
//!                 }
//!                 Err(e) => {
//!                     error!("service has error, cause {}, connection shutdown", e);
//!                 }
//!             }
//!         });
//!     }
//! }
//! ```
//!
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`connection`]: Core connection handling and lifecycle management
//! - [`protocol`]: Protocol types and abstractions
//! - [`codec`]: Request decoding implementation
//! - [`response`]: Response serialization
//! - [`handler`]: Request handler traits and utilities
//! - [`template`]: The template engine seam used by `send_template`
//!
//!
//! # Core Components
//!
//! ## Connection Handling
//!
//! The [`connection::HttpConnection`] type is the main entry point for processing
//! HTTP connections. It reads and parses exactly one request (bounded by a read
//! timeout), invokes the handler, and closes the stream once the response is out.
//! There is no keep-alive and no pipelining.
//!
//! ## Request Processing
//!
//! Requests are processed through handler functions that implement the
//! [`handler::Handler`] trait. The crate provides utilities for creating handlers
//! from async closures through [`handler::make_handler`].
//!
//! ## Response Writing
//!
//! Handlers receive a [`response::ResponseWriter`] bound to the connection.
//! Status, headers and cookies accumulate until the first terminal send, which
//! writes the header block and the `Content-Length` framed body in one shot.
//! A second send fails with `WriteError::AlreadySent` and cannot corrupt the
//! bytes already on the wire.
//!
//! ## Error Handling
//!
//! The crate uses custom error types that implement `std::error::Error`:
//!
//! - [`protocol::HttpError`]: Top-level error type
//! - [`protocol::ParseError`]: Request parsing errors
//! - [`protocol::WriteError`]: Response writing errors
//!
//! # Limitations
//!
//! - HTTP/1.1 only, GET and POST only
//! - No keep-alive, no pipelining, no chunked transfer encoding
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64
//! - TLS termination lives in the framework layer, not here

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod response;
pub mod template;

mod utils;
pub(crate) use utils::ensure;
