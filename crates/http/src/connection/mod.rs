//! HTTP connection handling module
//!
//! This module provides functionality for managing HTTP connections: reading
//! and parsing the request, invoking the handler and closing the stream once
//! the response has been written.
//!
//! # Components
//!
//! - [`HttpConnection`]: Main connection handler that:
//!   - Manages the lifecycle of one request/response exchange
//!   - Bounds request parsing with a read timeout
//!   - Hands the parsed request and the response writer to the handler
//!   - Shuts the connection down afterwards, success or not
//!
//! # Features
//!
//! - Asynchronous I/O handling
//! - Strict one-request-per-connection model
//! - Error handling without leaking partial responses

mod http_connection;

pub use http_connection::HttpConnection;
pub use http_connection::DEFAULT_READ_TIMEOUT;
