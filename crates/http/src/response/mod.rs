//! HTTP response serialization
//!
//! This module provides [`ResponseWriter`], the write-once response surface
//! handed to request handlers.

mod response_writer;

pub use response_writer::ResponseWriter;
