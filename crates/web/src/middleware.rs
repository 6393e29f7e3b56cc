//! Middleware chain
//!
//! Middleware wraps route handling: each interceptor sees the request and
//! the response writer, and decides whether to call [`Chain::next`] to pass
//! control onward. The chain is rebuilt per request from the globally
//! registered middleware followed by the matched route's own, ending at the
//! terminal handler.
//!
//! Short-circuiting is just not calling `next()`. Erroring is returning
//! `Err`, which unwinds the chain without reaching the layers below.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use weft_http::protocol::{HandlerError, Request};
use weft_http::response::ResponseWriter;

use crate::handler::RouteHandler;

/// An interceptor around route handling.
///
/// Implementations run code before and after `chain.next(...)`, send a
/// response themselves to short-circuit, or return `Err` to abort.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: &Request, response: &mut ResponseWriter, chain: &mut Chain<'_>) -> Result<(), HandlerError>;
}

#[derive(Error, Debug)]
pub enum ChainError {
    /// `next()` was called again after the terminal handler had already run.
    #[error("middleware chain is exhausted, the terminal handler already ran")]
    Exhausted,
}

/// The per-request cursor over the middleware stack.
///
/// `next()` hands control to the next interceptor, or to the terminal
/// handler once no interceptor remains. The terminal handler runs at most
/// once per request.
pub struct Chain<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn RouteHandler,
    terminal_called: bool,
}

impl<'a> Chain<'a> {
    pub fn new(middlewares: &'a [Arc<dyn Middleware>], terminal: &'a dyn RouteHandler) -> Self {
        Self { remaining: middlewares, terminal, terminal_called: false }
    }

    /// Advances the chain.
    ///
    /// Returns whatever the next layer returns. Calling `next()` after the
    /// terminal handler has run fails with [`ChainError::Exhausted`].
    pub async fn next(&mut self, request: &Request, response: &mut ResponseWriter) -> Result<(), HandlerError> {
        let remaining = self.remaining;
        match remaining.split_first() {
            Some((middleware, rest)) => {
                self.remaining = rest;
                middleware.handle(request, response, self).await
            }
            None => {
                if self.terminal_called {
                    return Err(ChainError::Exhausted.into());
                }
                self.terminal_called = true;
                self.terminal.handle(request, response).await
            }
        }
    }
}
