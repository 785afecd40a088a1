//! JSON:API document codec.
//!
//! # Responsibilities
//! - Resource objects and resource identifier (linkage) objects
//! - Parse request documents into those types
//! - Render `data` and `errors` response documents
//!
//! # Design Decisions
//! - Attributes stay as untyped JSON; storage decides their shape
//! - A resource object's response status rides along on the object itself
//!   and is never serialized
//! - Parse failures are `ApiError::Validation` with a JSON pointer

mod parse;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ApiError;

pub use parse::{parse_linkage, parse_linkages, parse_object};

/// Media type of every document this crate emits.
pub const CONTENT_TYPE: &str = "application/vnd.api+json";

/// Version advertised in the top-level `jsonapi` member.
pub const JSONAPI_VERSION: &str = "1.0";

/// A full resource object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    #[serde(rename = "type")]
    pub object_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,

    /// Status to respond with. `None` lets the sender pick the default.
    #[serde(skip)]
    pub status: Option<StatusCode>,
}

impl Object {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            id: None,
            attributes: Map::new(),
            relationships: Map::new(),
            status: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Replace the attributes with the serialized form of `attributes`,
    /// which must serialize to a JSON object.
    pub fn with_attributes<T: Serialize>(mut self, attributes: &T) -> Result<Self, ApiError> {
        match serde_json::to_value(attributes) {
            Ok(Value::Object(map)) => {
                self.attributes = map;
                Ok(self)
            }
            Ok(_) => Err(ApiError::validation(
                "attributes must be a JSON object",
                Some("/data/attributes"),
            )),
            Err(e) => Err(ApiError::internal(format!("failed to serialize attributes: {e}"))),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// The identifier, treating an empty string as absent.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Identifier-only view of this object.
    pub fn identifier(&self) -> Option<IdObject> {
        self.id().map(|id| IdObject::new(self.object_type.clone(), id))
    }
}

/// A resource identifier object: type and id, no attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub id: String,
}

impl IdObject {
    pub fn new(object_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            id: id.into(),
        }
    }
}

/// Top-level document wrapping primary data.
pub fn data_document(data: Value) -> Value {
    json!({
        "jsonapi": { "version": JSONAPI_VERSION },
        "data": data,
    })
}

/// Top-level document wrapping a single error.
pub fn error_document(error: &ApiError) -> Value {
    json!({
        "jsonapi": { "version": JSONAPI_VERSION },
        "errors": [error.to_error_object()],
    })
}

/// Build a response carrying `document` with the JSON:API media type.
pub fn document_response(status: StatusCode, document: &Value) -> Response {
    let mut response = Response::new(Body::from(document.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
    response
}

pub fn error_response(error: &ApiError) -> Response {
    document_response(error.status(), &error_document(error))
}
