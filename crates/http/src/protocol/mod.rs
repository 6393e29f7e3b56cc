//! Core HTTP protocol types.
//!
//! This module provides the fundamental building blocks for HTTP protocol
//! handling: the request value type, the method and status vocabulary, and
//! the error taxonomy shared by the codec, connection and response layers.
//!
//! # Architecture
//!
//! - **Request Processing** (`request`): the parsed request
//!   - [`Request`]: one immutable request per connection
//!   - [`RequestBuilder`]: direct construction, mainly for tests
//!
//! - **Protocol Vocabulary** (`method`, `status`):
//!   - [`Method`]: the dispatch surface (`GET`, `POST`)
//!   - [`reason_phrase`]: status-line reason lookup
//!
//! - **Error Handling** (`error`): comprehensive error types
//!   - [`HttpError`]: top-level error type
//!   - [`ParseError`]: request parsing errors
//!   - [`WriteError`]: response writing errors
//!   - [`HandlerError`]: boxed application errors at the handler seam

mod method;
pub use method::Method;

mod status;
pub use status::reason_phrase;

mod request;
pub use request::Request;
pub use request::RequestBuilder;

mod error;
pub use error::HandlerError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::WriteError;
