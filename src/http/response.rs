//! Response sending.
//!
//! # Responsibilities
//! - Turn handler results into JSON:API responses
//! - Pick default status codes
//! - Log server errors before they leave the process
//!
//! # Design Decisions
//! - Sending is a trait so callers can swap the document format or logging
//! - An object's own status always wins over the default
//! - Default for a created object is 201; handlers that want 200 set it

use axum::http::{Method, StatusCode};
use axum::response::Response;
use serde::Serialize;

use crate::document::{data_document, document_response, error_response, IdObject, Object};
use crate::error::ApiError;
use crate::http::request::RequestContext;

/// Anything a handler can send back.
#[derive(Debug, Clone)]
pub enum Sendable {
    Object(Object),
    List(Vec<Object>),
    Linkage(Option<IdObject>),
    Linkages(Vec<IdObject>),
    NoContent,
    Error(ApiError),
}

impl From<ApiError> for Sendable {
    fn from(error: ApiError) -> Self {
        Self::Error(error)
    }
}

/// Writes the final response for a request.
pub trait ResponseSender: Send + Sync {
    fn send(&self, ctx: &RequestContext, sendable: Sendable) -> Response;
}

/// Default sender producing `application/vnd.api+json` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonApiSender;

impl JsonApiSender {
    fn prepare<T: Serialize>(&self, ctx: &RequestContext, status: StatusCode, data: &T) -> Response {
        match serde_json::to_value(data) {
            Ok(value) => document_response(status, &data_document(value)),
            Err(e) => self.send(
                ctx,
                Sendable::Error(ApiError::internal(format!("failed to serialize response: {e}"))),
            ),
        }
    }
}

impl ResponseSender for JsonApiSender {
    fn send(&self, ctx: &RequestContext, sendable: Sendable) -> Response {
        match sendable {
            Sendable::Object(object) => {
                let status = object.status.unwrap_or(if ctx.method == Method::POST {
                    StatusCode::CREATED
                } else {
                    StatusCode::OK
                });
                self.prepare(ctx, status, &object)
            }
            Sendable::List(list) => self.prepare(ctx, StatusCode::OK, &list),
            Sendable::Linkage(linkage) => self.prepare(ctx, StatusCode::OK, &linkage),
            Sendable::Linkages(linkages) => self.prepare(ctx, StatusCode::OK, &linkages),
            Sendable::NoContent => {
                let mut response = Response::default();
                *response.status_mut() = StatusCode::NO_CONTENT;
                response
            }
            Sendable::Error(error) => {
                if error.status().is_server_error() {
                    tracing::error!(
                        request_id = ?ctx.request_id,
                        method = %ctx.method,
                        path = %ctx.uri.path(),
                        error = %error,
                        "Returning server error"
                    );
                }
                error_response(&error)
            }
        }
    }
}
