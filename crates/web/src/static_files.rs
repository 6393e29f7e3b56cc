//! Static file serving
//!
//! [`StaticFiles`] maps a URL prefix onto a directory and serves whatever
//! lives below it, rejecting any request path that could step outside the
//! directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use weft_http::protocol::{HandlerError, Request};
use weft_http::response::ResponseWriter;

use crate::handler::RouteHandler;

/// A [`RouteHandler`] serving files from one directory.
///
/// Registered via `Server::serve_static`, which pairs it with a `prefix/*`
/// route.
pub struct StaticFiles {
    base: String,
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(base: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base, root: root.into() }
    }

    /// Maps a request path to a file below the root.
    ///
    /// `None` means the path is outside this handler's territory: it does
    /// not carry the prefix, names no file, or tries to traverse upwards
    /// with `..` components.
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = request_path.strip_prefix(&self.base)?;
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }

        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                _ => return None,
            }
        }
        Some(resolved)
    }
}

#[async_trait]
impl RouteHandler for StaticFiles {
    async fn handle(&self, request: &Request, response: &mut ResponseWriter) -> Result<(), HandlerError> {
        match self.resolve(request.path()) {
            Some(path) => {
                response.send_file(path).await?;
                Ok(())
            }
            None => {
                response.send_custom(404, mime::TEXT_PLAIN.as_ref(), b"File not found!").await?;
                Ok(())
            }
        }
    }
}
