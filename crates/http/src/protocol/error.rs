use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::template::RenderError;

/// Errors surfaced by application handlers and middleware.
///
/// Handlers may fail for arbitrary domain reasons, so the seam uses a boxed
/// error; concrete errors like [`WriteError`] convert into it with `?`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for a connection's single request/response cycle.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: WriteError,
    },

    #[error("handler error: {source}")]
    HandlerError { source: HandlerError },
}

impl HttpError {
    pub fn handler<E: Into<HandlerError>>(e: E) -> Self {
        Self::HandlerError { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid request line: {reason}")]
    InvalidRequestLine { reason: String },

    #[error("invalid http method: {token}")]
    InvalidMethod { token: String },

    #[error("invalid http version: {token}")]
    InvalidVersion { token: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("read timed out after {timeout:?}")]
    ReadTimeout { timeout: Duration },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_request_line<S: ToString>(str: S) -> Self {
        Self::InvalidRequestLine { reason: str.to_string() }
    }

    pub fn invalid_method<S: ToString>(token: S) -> Self {
        Self::InvalidMethod { token: token.to_string() }
    }

    pub fn invalid_version<S: ToString>(token: S) -> Self {
        Self::InvalidVersion { token: token.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn read_timeout(timeout: Duration) -> Self {
        Self::ReadTimeout { timeout }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum WriteError {
    /// A terminal send was attempted after the response had already been
    /// written. The first response's bytes are left untouched.
    #[error("response already sent")]
    AlreadySent,

    #[error("json encode error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("render error: {source}")]
    Render {
        #[from]
        source: RenderError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl WriteError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
