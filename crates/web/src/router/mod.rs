//! Request routing
//!
//! The route table is a plain ordered list: routes are tried in
//! registration order and the first structural match wins, regardless of
//! how specific later patterns are. Registering the catch-all before the
//! specific route therefore shadows it, which keeps dispatch behavior
//! obvious from the registration site.

mod pattern;

pub use pattern::PathPattern;
pub use pattern::PatternError;

use std::collections::HashMap;
use std::sync::Arc;

use weft_http::protocol::Method;

use crate::handler::RouteHandler;
use crate::middleware::Middleware;

/// One registered route.
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Arc<dyn RouteHandler>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Route {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &dyn RouteHandler {
        self.handler.as_ref()
    }

    /// The middleware attached to this route alone, in attachment order.
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    /// Attaches a middleware to this route only.
    ///
    /// Route middleware runs after the globally registered middleware and
    /// before the terminal handler.
    pub fn with(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }
}

/// An ordered route table mapping method + path pattern to a handler.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a `GET` route, returning it for per-route configuration.
    ///
    /// # Panics
    ///
    /// Panics if the pattern does not compile, e.g. on duplicate parameter
    /// names. Routes are registered during startup, before the server
    /// accepts connections.
    pub fn get(&mut self, pattern: &str, handler: impl RouteHandler + 'static) -> &mut Route {
        self.register(Method::Get, pattern, Arc::new(handler))
    }

    /// Registers a `POST` route, returning it for per-route configuration.
    ///
    /// # Panics
    ///
    /// Panics if the pattern does not compile.
    pub fn post(&mut self, pattern: &str, handler: impl RouteHandler + 'static) -> &mut Route {
        self.register(Method::Post, pattern, Arc::new(handler))
    }

    fn register(&mut self, method: Method, pattern: &str, handler: Arc<dyn RouteHandler>) -> &mut Route {
        let compiled = match PathPattern::compile(pattern) {
            Ok(compiled) => compiled,
            Err(e) => panic!("invalid route pattern: {e}"),
        };
        self.routes.push(Route { method, pattern: compiled, handler, middlewares: Vec::new() });
        let index = self.routes.len() - 1;
        &mut self.routes[index]
    }

    /// Mounts every route of `router` under `prefix`.
    ///
    /// Each pattern is re-derived as `prefix + pattern` and recompiled, so
    /// parameters keep working: mounting a router with `/:id` under
    /// `/user` resolves `GET /user/42` with `id = "42"`. The mounted
    /// routes keep their relative order and slot in after everything
    /// already registered. The sub-table is left untouched and can be
    /// mounted again under another prefix.
    ///
    /// # Panics
    ///
    /// Panics if a re-derived pattern does not compile.
    pub fn mount(&mut self, prefix: &str, router: &Router) {
        let prefix = prefix.trim_end_matches('/');
        for route in &router.routes {
            let combined = format!("{prefix}{}", route.pattern.raw());
            let compiled = match PathPattern::compile(&combined) {
                Ok(compiled) => compiled,
                Err(e) => panic!("invalid mounted route pattern: {e}"),
            };
            self.routes.push(Route {
                method: route.method,
                pattern: compiled,
                handler: Arc::clone(&route.handler),
                middlewares: route.middlewares.clone(),
            });
        }
    }

    /// Resolves a request to the first matching route, in registration
    /// order, together with its captured path parameters.
    pub fn resolve(&self, method: Method, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        self.routes.iter().find_map(|route| {
            if route.method != method {
                return None;
            }
            route.pattern.matches(path).map(|params| (route, params))
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
