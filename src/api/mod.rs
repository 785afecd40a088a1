//! Top-level API router.
//!
//! # Responsibilities
//! - Own the path prefix every resource is mounted under
//! - Keep one [`Resource`] per type
//! - Serve top-level actions at `<prefix>/<name>`
//! - Build the axum [`Router`] that forwards into resource dispatch
//!
//! # Data Flow
//! ```text
//! GET /api/widgets/1
//!     → axum route /api/widgets/{*rest}
//!     → strip prefix → /widgets/1
//!     → Resource::dispatch (route table lookup, storage call)
//!     → ResponseSender
//! ```
//!
//! # Design Decisions
//! - Each resource is mounted at `<prefix>/<type>` and `<prefix>/<type>/{*rest}`;
//!   one wildcard pattern cannot match both the collection and its members
//! - The axum router is built on demand from the type map, so re-adding a
//!   type replaces the earlier resource instead of colliding
//! - Resources are frozen behind `Arc` once added

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use axum::routing::any;
use axum::Router;

use crate::document::CONTENT_TYPE;
use crate::error::ApiError;
use crate::http::{JsonApiSender, RequestContext, ResponseSender, Sendable};
use crate::observability::metrics;
use crate::resource::{run_action, Resource};
use crate::routing::PathParams;
use crate::store;

/// Resources and top-level actions mounted under one prefix.
pub struct Api {
    prefix: String,
    resources: BTreeMap<String, Arc<Resource>>,
    actions: BTreeMap<String, store::Action>,
    sender: Arc<dyn ResponseSender>,
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("prefix", &self.prefix)
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Api {
    /// An empty API under `prefix`. `"api"`, `"/api"` and `"/api/"` are
    /// equivalent.
    pub fn new(prefix: &str) -> Self {
        Self::with_sender(prefix, Arc::new(JsonApiSender))
    }

    /// Like [`Api::new`], sending every response through `sender`.
    pub fn with_sender(prefix: &str, sender: Arc<dyn ResponseSender>) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
            resources: BTreeMap::new(),
            actions: BTreeMap::new(),
            sender,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Mount `resource`. A resource of the same type is replaced.
    pub fn add(&mut self, resource: Resource) -> &mut Self {
        let resource_type = resource.resource_type().to_owned();
        tracing::debug!(
            prefix = %self.prefix,
            resource = %resource_type,
            routes = resource.route_count(),
            "Mounting resource"
        );
        if self
            .resources
            .insert(resource_type.clone(), Arc::new(resource))
            .is_some()
        {
            tracing::debug!(resource = %resource_type, "Replaced previously mounted resource");
        }
        self
    }

    /// Register `POST <prefix>/<name>`.
    pub fn action(&mut self, name: &str, handler: store::Action) -> &mut Self {
        self.actions
            .insert(name.trim_matches('/').to_owned(), handler);
        self
    }

    pub fn resource(&self, resource_type: &str) -> Option<&Resource> {
        self.resources.get(resource_type).map(Arc::as_ref)
    }

    /// Mounted resources, ordered by type.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values().map(Arc::as_ref)
    }

    /// Every mounted route, one per line, resources ordered by type.
    pub fn route_tree(&self) -> String {
        self.resources
            .values()
            .map(|resource| resource.route_tree())
            .filter(|tree| !tree.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn mount_path(&self, segment: &str) -> String {
        if self.prefix == "/" {
            format!("/{segment}")
        } else {
            format!("{}/{segment}", self.prefix)
        }
    }

    /// Build the axum router serving this API.
    pub fn router(&self) -> Router {
        let mut router = Router::new();

        for (resource_type, resource) in &self.resources {
            let base = self.mount_path(resource_type);
            let handler = {
                let resource = Arc::clone(resource);
                let sender = Arc::clone(&self.sender);
                let prefix = self.prefix.clone();
                move |request: Request| {
                    let path = relative_path(&prefix, request.uri().path());
                    async move { resource.dispatch(request, &path, sender.as_ref()).await }
                }
            };
            router = router
                .route(&base, any(handler.clone()))
                .route(&format!("{base}/{{*rest}}"), any(handler));
        }

        for (name, action) in &self.actions {
            if self.resources.contains_key(name) {
                tracing::warn!(action = %name, "Action shadowed by a resource of the same name");
                continue;
            }
            let handler = {
                let action = Arc::clone(action);
                let sender = Arc::clone(&self.sender);
                let name = name.clone();
                move |request: Request| async move {
                    top_level_action(&name, &action, request, sender.as_ref()).await
                }
            };
            router = router.route(&self.mount_path(name), any(handler));
        }

        let sender = Arc::clone(&self.sender);
        router.fallback(move |request: Request| async move {
            let ctx = RequestContext::new(&request, PathParams::default());
            let path = request.uri().path().to_owned();
            sender.send(&ctx, Sendable::Error(ApiError::not_found(format!("no route matches {path}"))))
        })
    }
}

async fn top_level_action(
    name: &str,
    action: &store::Action,
    request: Request,
    sender: &dyn ResponseSender,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    let response = if method == Method::POST {
        tracing::debug!(action = %name, "Dispatching action");
        let ctx = RequestContext::new(&request, PathParams::default());
        let sendable = run_action(action, request)
            .await
            .unwrap_or_else(Sendable::Error);
        sender.send(&ctx, sendable)
    } else {
        let status = if method == Method::OPTIONS {
            StatusCode::OK
        } else {
            metrics::record_method_not_allowed(name, method.as_str());
            StatusCode::METHOD_NOT_ALLOWED
        };
        let mut response = Response::default();
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(header::ALLOW, HeaderValue::from_static("POST"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
        response
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), name, start);
    response
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}")
    }
}

/// `path` with the API prefix removed, still starting with `/`.
fn relative_path(prefix: &str, path: &str) -> String {
    if prefix == "/" {
        return path.to_owned();
    }
    path.strip_prefix(prefix).unwrap_or(path).to_owned()
}
