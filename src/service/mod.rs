//! Service layer for the quote collection service
//!
//! Application state, HTTP routes and the server that hosts them.

pub mod app;
pub mod routes;
pub mod server;

pub use app::{AppState, ServiceError};
pub use routes::create_router;
pub use server::{HttpServer, HttpServerConfig};
