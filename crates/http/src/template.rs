//! Template rendering seam.
//!
//! Rendering happens behind the [`TemplateEngine`] trait so the response
//! layer stays independent of any concrete engine. The web framework ships
//! a directory-backed implementation; tests substitute mocks.

use serde_json::Value;
use thiserror::Error;

/// Renders named templates with JSON parameters.
pub trait TemplateEngine: Send + Sync {
    /// Renders the template called `name` with `params`.
    fn render(&self, name: &str, params: &Value) -> Result<Vec<u8>, RenderError>;
}

/// Errors produced by a [`TemplateEngine`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {name}")]
    NotFound { name: String },

    #[error("render failed for template {name}: {reason}")]
    Failed { name: String, reason: String },
}

impl RenderError {
    pub fn not_found<S: ToString>(name: S) -> Self {
        Self::NotFound { name: name.to_string() }
    }

    pub fn failed<S: ToString, R: ToString>(name: S, reason: R) -> Self {
        Self::Failed { name: name.to_string(), reason: reason.to_string() }
    }
}
