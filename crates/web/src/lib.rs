mod handler;
mod middleware;
mod server;
mod static_files;
mod templates;

pub mod router;

pub use handler::error_handler_fn;
pub use handler::handler_fn;
pub use handler::ErrorHandler;
pub use handler::FnErrorHandler;
pub use handler::FnHandler;
pub use handler::RouteHandler;
pub use middleware::Chain;
pub use middleware::ChainError;
pub use middleware::Middleware;
pub use router::Router;
pub use server::load_server_config;
pub use server::BuildError;
pub use server::ServeError;
pub use server::Server;
pub use server::ServerBuilder;
pub use server::TlsError;
pub use static_files::StaticFiles;
pub use templates::DirectoryEngine;
