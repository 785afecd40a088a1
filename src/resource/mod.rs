//! Resource router: the routes of one resource type.
//!
//! # Responsibilities
//! - Register CRUD, relationship and action routes for one type
//! - Record every route, allowed or not, for `Allow` computation
//! - Dispatch a request (path relative to the API prefix) to its operation
//!
//! # Route Layout
//! ```text
//! OPTIONS           /T, /T/:id, /T/:id/R, /T/:id/relationships/R
//! HEAD, GET         /T                        list
//! POST              /T                        create
//! HEAD, GET         /T/:id                    fetch
//! PATCH             /T/:id                    update
//! DELETE            /T/:id                    delete
//! HEAD, GET         /T/:id/R                  related resource(s)
//! HEAD, GET         /T/:id/relationships/R    linkage
//! POST/PATCH/DELETE /T/:id/relationships/R    add / replace / remove linkage
//! POST              /T/:id/A                  action
//! ```
//!
//! # Design Decisions
//! - A disallowed route is registered and answers 405
//! - GET always registers a HEAD twin with the same allow state
//! - Reads (list, fetch, relationship reads) are never disallowable
//! - OPTIONS is never disallowed
//! - Registration takes `&mut self`; once mounted behind `Arc` a resource is
//!   frozen

mod handlers;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;

use crate::config::ApiConfig;
use crate::document::CONTENT_TYPE;
use crate::error::ApiError;
use crate::http::{RequestContext, ResponseSender, Sendable};
use crate::observability::metrics;
use crate::routing::{Disallow, Lookup, PathParams, Route, RouteTable};
use crate::store::{
    self, Crud, CrudOps, ToMany, ToManyList, ToManyListResources, ToManyOps, ToManyUpdate, ToOne,
    ToOneGet, ToOneOps, ToOneUpdate,
};

pub(crate) use handlers::run_action;

const PAT_ROOT: &str = "";
const PAT_ID: &str = "/:id";

/// Kind of a registered relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    ToOne,
    ToMany,
}

/// Per-resource behavior switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Accept ids supplied by the client on create.
    pub client_generated_ids: bool,
    /// Largest request body a handler will buffer.
    pub max_body_size: usize,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            client_generated_ids: false,
            max_body_size: 1024 * 1024,
        }
    }
}

impl From<&ApiConfig> for ResourceOptions {
    fn from(config: &ApiConfig) -> Self {
        Self {
            client_generated_ids: config.client_generated_ids,
            max_body_size: config.max_body_size,
        }
    }
}

/// A bound storage operation.
#[derive(Clone)]
pub(crate) enum Operation {
    Create(store::Save),
    Fetch(store::Get),
    List(store::List),
    Update(store::Update),
    Delete(store::Delete),
    FetchRelationship(ToOneGet),
    UpdateToOne(ToOneUpdate),
    ListRelated(ToManyListResources),
    ListRelationships(ToManyList),
    /// PATCH on a to-many linkage.
    ReplaceToMany(ToManyUpdate),
    /// POST or DELETE on a to-many linkage.
    ModifyToMany(ToManyUpdate),
    Action(store::Action),
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Fetch(_) => "fetch",
            Self::List(_) => "list",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::FetchRelationship(_) => "fetch_relationship",
            Self::UpdateToOne(_) => "update_to_one",
            Self::ListRelated(_) => "list_related",
            Self::ListRelationships(_) => "list_relationships",
            Self::ReplaceToMany(_) => "replace_to_many",
            Self::ModifyToMany(_) => "modify_to_many",
            Self::Action(_) => "action",
        }
    }
}

#[derive(Clone)]
pub(crate) enum Endpoint {
    Options,
    Operation(Operation),
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Options => f.write_str("options"),
            Self::Operation(op) => f.write_str(op.name()),
        }
    }
}

/// Routes and relationships of one resource type, served at `/<type>`.
pub struct Resource {
    resource_type: String,
    routes: RouteTable<Endpoint>,
    relationships: HashMap<String, Relationship>,
    options: ResourceOptions,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("resource_type", &self.resource_type)
            .field("routes", &self.routes.len())
            .field("relationships", &self.relationships)
            .field("options", &self.options)
            .finish()
    }
}

impl Resource {
    /// A resource with no routes. The type is used verbatim as the path
    /// segment; plurality is up to the caller.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self::with_options(resource_type, ResourceOptions::default())
    }

    pub fn with_options(resource_type: impl Into<String>, options: ResourceOptions) -> Self {
        Self {
            resource_type: resource_type.into(),
            routes: RouteTable::new(),
            relationships: HashMap::new(),
            options,
        }
    }

    /// A resource with every CRUD route bound to `storage`, using
    /// [`ResourceOptions::default`]. Build with [`Resource::with_options`]
    /// and call [`Resource::crud`] to apply configured options.
    pub fn new_crud<S: Crud + ?Sized>(resource_type: impl Into<String>, storage: Arc<S>) -> Self {
        let mut resource = Self::new(resource_type);
        resource.crud(storage);
        resource
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.routes()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn relationships(&self) -> &HashMap<String, Relationship> {
        &self.relationships
    }

    /// Methods allowed at `path`, e.g. `/widgets/1`.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.routes.allowed_methods(path)
    }

    pub fn allow_header(&self, path: &str) -> String {
        self.routes.allow_header(path)
    }

    /// One line per registered route.
    pub fn route_tree(&self) -> String {
        self.routes.route_tree()
    }

    /// Register every CRUD route:
    ///
    /// ```text
    /// GET    /resource
    /// POST   /resource
    /// GET    /resource/:id
    /// PATCH  /resource/:id
    /// DELETE /resource/:id
    /// ```
    pub fn crud<S: Crud + ?Sized>(&mut self, storage: Arc<S>) -> &mut Self {
        self.partial_crud(storage, &Disallow::none())
    }

    /// Register every CRUD route with OPTIONS and HEAD support. POST, PATCH
    /// and DELETE answer 405 when named in `disallow`; GET always works.
    pub fn partial_crud<S: Crud + ?Sized>(&mut self, storage: Arc<S>, disallow: &Disallow) -> &mut Self {
        let ops = CrudOps::bind(storage);
        self.options(PAT_ROOT);
        self.list(ops.list, true);
        self.post(ops.save, disallow.allows(&Method::POST));
        self.options(PAT_ID);
        self.get(ops.get, true);
        self.patch(ops.update, disallow.allows(&Method::PATCH));
        self.delete(ops.delete, disallow.allows(&Method::DELETE))
    }

    /// Register the routes of a to-one relationship:
    ///
    /// ```text
    /// GET    /resource/:id/relationship
    /// GET    /resource/:id/relationships/relationship
    /// PATCH  /resource/:id/relationships/relationship
    /// ```
    pub fn to_one<S: ToOne + ?Sized>(&mut self, relationship: &str, storage: Arc<S>) -> &mut Self {
        self.partial_to_one(relationship, storage, &Disallow::none())
    }

    /// Like [`Resource::to_one`]; PATCH answers 405 when named in `disallow`.
    pub fn partial_to_one<S: ToOne + ?Sized>(
        &mut self,
        relationship: &str,
        storage: Arc<S>,
        disallow: &Disallow,
    ) -> &mut Self {
        let ops = ToOneOps::bind(storage);

        let matcher = format!("{PAT_ID}/{relationship}");
        self.options(&matcher);
        self.get_related(ops.get_resource, &matcher, true);

        let relationship_matcher = format!("{PAT_ID}/relationships/{relationship}");
        self.options(&relationship_matcher);
        self.get_relationship(ops.get, &relationship_matcher, true);
        self.patch_one(ops.update, &relationship_matcher, disallow.allows(&Method::PATCH));

        self.relationships
            .insert(relationship.to_owned(), Relationship::ToOne);
        self
    }

    /// Register the routes of a to-many relationship:
    ///
    /// ```text
    /// GET    /resource/:id/relationship
    /// GET    /resource/:id/relationships/relationship
    /// POST   /resource/:id/relationships/relationship
    /// PATCH  /resource/:id/relationships/relationship
    /// DELETE /resource/:id/relationships/relationship
    /// ```
    pub fn to_many<S: ToMany + ?Sized>(&mut self, relationship: &str, storage: Arc<S>) -> &mut Self {
        self.partial_to_many(relationship, storage, &Disallow::none())
    }

    /// Like [`Resource::to_many`]; POST, PATCH and DELETE answer 405 when
    /// named in `disallow`.
    pub fn partial_to_many<S: ToMany + ?Sized>(
        &mut self,
        relationship: &str,
        storage: Arc<S>,
        disallow: &Disallow,
    ) -> &mut Self {
        let ops = ToManyOps::bind(storage);

        let matcher = format!("{PAT_ID}/{relationship}");
        self.options(&matcher);
        self.list_related(ops.list_resources, &matcher, true);

        let relationship_matcher = format!("{PAT_ID}/relationships/{relationship}");
        self.options(&relationship_matcher);
        self.list_relationships(ops.list, &relationship_matcher, true);
        self.post_many(ops.save, &relationship_matcher, disallow.allows(&Method::POST));
        self.patch_many(ops.update, &relationship_matcher, disallow.allows(&Method::PATCH));
        self.delete_many(ops.delete, &relationship_matcher, disallow.allows(&Method::DELETE));

        self.relationships
            .insert(relationship.to_owned(), Relationship::ToMany);
        self
    }

    /// Register `POST /resource/:id/<action>`.
    pub fn action(&mut self, action: &str, handler: store::Action, allow: bool) -> &mut Self {
        let matcher = format!("{PAT_ID}/{}", action.trim_matches('/'));
        self.add_route(Method::POST, &matcher, allow, Endpoint::Operation(Operation::Action(handler)))
    }

    /// Register `OPTIONS /resource<pattern>`.
    pub fn options(&mut self, pattern: &str) -> &mut Self {
        self.add_route(Method::OPTIONS, pattern, true, Endpoint::Options)
    }

    /// Register `POST /resource`.
    pub fn post(&mut self, op: store::Save, allow: bool) -> &mut Self {
        self.add_operation(Method::POST, PAT_ROOT, allow, Operation::Create(op))
    }

    /// Register `GET /resource/:id`.
    pub fn get(&mut self, op: store::Get, allow: bool) -> &mut Self {
        self.add_read(PAT_ID, allow, Operation::Fetch(op))
    }

    /// Register `GET /resource`.
    pub fn list(&mut self, op: store::List, allow: bool) -> &mut Self {
        self.add_read(PAT_ROOT, allow, Operation::List(op))
    }

    /// Register `PATCH /resource/:id`.
    pub fn patch(&mut self, op: store::Update, allow: bool) -> &mut Self {
        self.add_operation(Method::PATCH, PAT_ID, allow, Operation::Update(op))
    }

    /// Register `DELETE /resource/:id`.
    pub fn delete(&mut self, op: store::Delete, allow: bool) -> &mut Self {
        self.add_operation(Method::DELETE, PAT_ID, allow, Operation::Delete(op))
    }

    /// Register `GET /resource/:id/<relationship>` for a to-one relationship.
    pub fn get_related(&mut self, op: store::Get, matcher: &str, allow: bool) -> &mut Self {
        self.add_read(matcher, allow, Operation::Fetch(op))
    }

    /// Register `GET /resource/:id/relationships/<relationship>` for a to-one
    /// relationship.
    pub fn get_relationship(&mut self, op: ToOneGet, matcher: &str, allow: bool) -> &mut Self {
        self.add_read(matcher, allow, Operation::FetchRelationship(op))
    }

    /// Register `PATCH /resource/:id/relationships/<relationship>` for a
    /// to-one relationship.
    pub fn patch_one(&mut self, op: ToOneUpdate, matcher: &str, allow: bool) -> &mut Self {
        self.add_operation(Method::PATCH, matcher, allow, Operation::UpdateToOne(op))
    }

    /// Register `GET /resource/:id/<relationship>` for a to-many relationship.
    pub fn list_related(&mut self, op: ToManyListResources, matcher: &str, allow: bool) -> &mut Self {
        self.add_read(matcher, allow, Operation::ListRelated(op))
    }

    /// Register `GET /resource/:id/relationships/<relationship>` for a
    /// to-many relationship.
    pub fn list_relationships(&mut self, op: ToManyList, matcher: &str, allow: bool) -> &mut Self {
        self.add_read(matcher, allow, Operation::ListRelationships(op))
    }

    /// Register `POST /resource/:id/relationships/<relationship>`.
    pub fn post_many(&mut self, op: ToManyUpdate, matcher: &str, allow: bool) -> &mut Self {
        self.add_operation(Method::POST, matcher, allow, Operation::ModifyToMany(op))
    }

    /// Register `PATCH /resource/:id/relationships/<relationship>` for a
    /// to-many relationship.
    pub fn patch_many(&mut self, op: ToManyUpdate, matcher: &str, allow: bool) -> &mut Self {
        self.add_operation(Method::PATCH, matcher, allow, Operation::ReplaceToMany(op))
    }

    /// Register `DELETE /resource/:id/relationships/<relationship>`.
    pub fn delete_many(&mut self, op: ToManyUpdate, matcher: &str, allow: bool) -> &mut Self {
        self.add_operation(Method::DELETE, matcher, allow, Operation::ModifyToMany(op))
    }

    /// HEAD then GET, sharing one operation and one allow state.
    fn add_read(&mut self, pattern: &str, allow: bool, op: Operation) -> &mut Self {
        self.add_operation(Method::HEAD, pattern, allow, op.clone());
        self.add_operation(Method::GET, pattern, allow, op)
    }

    fn add_operation(&mut self, method: Method, pattern: &str, allow: bool, op: Operation) -> &mut Self {
        self.add_route(method, pattern, allow, Endpoint::Operation(op))
    }

    fn add_route(&mut self, method: Method, pattern: &str, allow: bool, endpoint: Endpoint) -> &mut Self {
        let path = format!("/{}{}", self.resource_type, pattern);
        tracing::trace!(
            resource = %self.resource_type,
            method = %method,
            path = %path,
            allow,
            endpoint = ?endpoint,
            "Registering route"
        );
        self.routes.add_route(method, path, allow, endpoint);
        self
    }

    /// Handle a request whose path, relative to the API prefix, is `path`.
    pub async fn dispatch(&self, request: Request, path: &str, sender: &dyn ResponseSender) -> Response {
        let start = Instant::now();
        let method = request.method().clone();

        let response = match self.routes.lookup(&method, path) {
            Lookup::Found {
                route,
                handler,
                params,
            } if route.allow => match handler {
                Endpoint::Options => self.allow_response(StatusCode::OK, path),
                Endpoint::Operation(op) => {
                    tracing::debug!(
                        resource = %self.resource_type,
                        method = %method,
                        route = %route.path,
                        operation = op.name(),
                        "Dispatching request"
                    );
                    handlers::run(op, request, params, &self.options, sender).await
                }
            },
            Lookup::MethodNotRegistered if method == Method::OPTIONS => {
                self.allow_response(StatusCode::OK, path)
            }
            Lookup::Found { .. } | Lookup::MethodNotRegistered => {
                tracing::debug!(
                    resource = %self.resource_type,
                    method = %method,
                    path = %path,
                    "Method not allowed"
                );
                metrics::record_method_not_allowed(&self.resource_type, method.as_str());
                self.allow_response(StatusCode::METHOD_NOT_ALLOWED, path)
            }
            Lookup::NoMatch => {
                tracing::debug!(resource = %self.resource_type, path = %path, "No route matched");
                let ctx = RequestContext::new(&request, PathParams::default());
                sender.send(
                    &ctx,
                    Sendable::Error(ApiError::not_found(format!("no route matches {path}"))),
                )
            }
        };

        metrics::record_request(
            method.as_str(),
            response.status().as_u16(),
            &self.resource_type,
            start,
        );
        response
    }

    /// Empty response carrying the `Allow` header for `path`.
    fn allow_response(&self, status: StatusCode, path: &str) -> Response {
        let mut response = Response::default();
        *response.status_mut() = status;

        let headers = response.headers_mut();
        // An empty value still tells the client the path exists.
        let allow = HeaderValue::from_str(&self.allow_header(path))
            .unwrap_or_else(|_| HeaderValue::from_static(""));
        headers.insert(header::ALLOW, allow);
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
        response
    }
}
