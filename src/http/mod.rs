//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, RequestContext)
//!     → [api router picks the resource, resource router picks the endpoint]
//!     → response.rs (ResponseSender renders the result)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, RequestContext, X_REQUEST_ID};
pub use response::{JsonApiSender, ResponseSender, Sendable};
pub use server::HttpServer;
