//! Route pattern compilation
//!
//! Patterns are plain path literals with two extensions:
//!
//! - `:name` captures one path segment (anything but `/`) as the path
//!   parameter `name`
//! - `*` matches any remainder, including `/`
//!
//! Everything else matches literally. A pattern is compiled once at
//! registration into an anchored regex; matching a request path yields the
//! captured parameters.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
    param_names: Vec<String>,
}

#[derive(Error, Debug)]
pub enum PatternError {
    /// The same `:name` appears twice in one pattern, so its captures
    /// would be ambiguous.
    #[error("duplicate path parameter `:{name}` in pattern `{pattern}`")]
    DuplicateParam { pattern: String, name: String },

    #[error("pattern `{pattern}` failed to compile: {source}")]
    Compile { pattern: String, source: regex::Error },
}

impl PatternError {
    fn duplicate_param(pattern: &str, name: String) -> Self {
        Self::DuplicateParam { pattern: pattern.to_string(), name }
    }

    fn compile(pattern: &str, source: regex::Error) -> Self {
        Self::Compile { pattern: pattern.to_string(), source }
    }
}

impl PathPattern {
    /// Compiles `pattern` into an anchored matcher.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut regex_src = String::with_capacity(pattern.len() + 8);
        regex_src.push('^');

        let mut param_names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                ':' if chars.peek().is_some_and(|next| next.is_ascii_alphabetic() || *next == '_') => {
                    regex_src.push_str(&regex::escape(&literal));
                    literal.clear();

                    let mut name = String::new();
                    while let Some(next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || *next == '_' {
                            name.push(*next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if param_names.contains(&name) {
                        return Err(PatternError::duplicate_param(pattern, name));
                    }
                    regex_src.push_str("(?P<");
                    regex_src.push_str(&name);
                    regex_src.push_str(">[^/]+)");
                    param_names.push(name);
                }
                '*' => {
                    regex_src.push_str(&regex::escape(&literal));
                    literal.clear();
                    regex_src.push_str(".*");
                }
                c => literal.push(c),
            }
        }
        regex_src.push_str(&regex::escape(&literal));
        regex_src.push('$');

        let regex = Regex::new(&regex_src).map_err(|e| PatternError::compile(pattern, e))?;
        Ok(Self { raw: pattern.to_string(), regex, param_names })
    }

    /// The pattern text as registered, used when mounting re-derives it
    /// under a prefix.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Matches `path` structurally, returning the captured parameters.
    ///
    /// `None` means the pattern does not cover this path at all; an empty
    /// map means it matched without capturing anything.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let mut params = HashMap::with_capacity(self.param_names.len());
        for name in &self.param_names {
            if let Some(capture) = captures.name(name) {
                params.insert(name.clone(), capture.as_str().to_string());
            }
        }
        Some(params)
    }
}
