//! JSON:API resource routing and dispatch.
//!
//! Declare resource types, their relationships and custom actions; the
//! crate derives the HTTP routes, enforces per-method allow/disallow,
//! answers `OPTIONS` and 405 with an `Allow` header, and dispatches each
//! request to caller-supplied storage.
//!
//! ```text
//! Api (prefix, type → Resource, top-level actions)
//!  └─ Resource (route table, relationships)
//!      └─ storage callables (Crud / ToOne / ToMany / Action)
//! ```

pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resource;
pub mod routing;
pub mod store;

pub use api::Api;
pub use config::AppConfig;
pub use document::{IdObject, Object};
pub use error::ApiError;
pub use http::{HttpServer, JsonApiSender, RequestContext, ResponseSender, Sendable};
pub use lifecycle::Shutdown;
pub use resource::{Relationship, Resource, ResourceOptions};
pub use routing::{Disallow, PathParams, Route};
pub use store::{Crud, StoreResult, ToMany, ToOne};
