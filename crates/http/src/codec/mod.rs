//! HTTP codec module for decoding HTTP requests
//!
//! This module provides streaming decoding of HTTP/1.1 requests from raw
//! bytes. The wire format is parsed by hand; no external HTTP parser is
//! involved.
//!
//! # Architecture
//!
//! The codec module is organized into two components:
//!
//! - [`RequestDecoder`]: a [`tokio_util::codec::Decoder`] that accumulates
//!   bytes until a full request, head and body, is available
//! - `query`: parsing of query strings and `Cookie` headers into maps
//!
//! # Example
//!
//! ```no_run
//! use weft_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::new();
//! let request = decoder.decode(&mut buffer);
//! ```

mod query;
mod request_decoder;

pub use request_decoder::RequestDecoder;
