//! Directory-backed template rendering
//!
//! [`DirectoryEngine`] plugs minijinja into the response layer's
//! [`TemplateEngine`] seam. Templates are addressed by their file name
//! relative to the configured directory and loaded on first use.

use std::path::Path;

use minijinja::{path_loader, Environment, ErrorKind};
use serde_json::Value;

use weft_http::template::{RenderError, TemplateEngine};

/// A [`TemplateEngine`] rendering files from one directory.
#[derive(Debug)]
pub struct DirectoryEngine {
    env: Environment<'static>,
}

impl DirectoryEngine {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        Self { env }
    }
}

impl TemplateEngine for DirectoryEngine {
    fn render(&self, name: &str, params: &Value) -> Result<Vec<u8>, RenderError> {
        let template = self.env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => RenderError::not_found(name),
            _ => RenderError::failed(name, e),
        })?;
        let body = template.render(params).map_err(|e| RenderError::failed(name, e))?;
        Ok(body.into_bytes())
    }
}
