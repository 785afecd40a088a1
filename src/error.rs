//! Request-level error taxonomy.
//!
//! Every failure that can short-circuit a handler is an [`ApiError`]: codec
//! failures, routing policy rejections, and whatever a storage operation
//! returns. Storage errors pass through unchanged; the router never inspects
//! them beyond asking for their status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors surfaced to API clients as JSON:API `errors` documents.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request document is malformed.
    #[error("validation error: {detail}")]
    Validation {
        detail: String,
        /// JSON pointer to the offending member, e.g. `/data/type`.
        pointer: Option<String>,
    },

    /// The request is well formed but cannot be acted upon.
    #[error("{title}: {detail}")]
    BadRequest { title: String, detail: String },

    /// The request is understood but refused.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Nothing lives at the requested path, or storage has no such record.
    #[error("not found: {0}")]
    NotFound(String),

    /// The identifier in the path differs from the one in the document.
    #[error("conflict: expected id {expected:?}, got {provided:?}")]
    Conflict { expected: String, provided: String },

    /// Unexpected server-side failure. The message is logged, not rendered.
    #[error("internal error: {0}")]
    Internal(String),

    /// Any other status a storage backend wants to report.
    #[error("{title}")]
    Status {
        status: StatusCode,
        title: String,
        detail: Option<String>,
    },
}

impl ApiError {
    pub fn validation(detail: impl Into<String>, pointer: Option<&str>) -> Self {
        Self::Validation {
            detail: detail.into(),
            pointer: pointer.map(str::to_owned),
        }
    }

    pub fn bad_request(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::BadRequest {
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden(detail.into())
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound(detail.into())
    }

    pub fn conflict(expected: impl Into<String>, provided: impl Into<String>) -> Self {
        Self::Conflict {
            expected: expected.into(),
            provided: provided.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status this error is rendered with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Status { status, .. } => *status,
        }
    }

    fn title(&self) -> &str {
        match self {
            Self::Validation { .. } => "Validation error",
            Self::BadRequest { title, .. } => title,
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "Not Found",
            Self::Conflict { .. } => "Conflict",
            Self::Internal(_) => "Internal Server Error",
            Self::Status { title, .. } => title,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::Validation { detail, .. } | Self::BadRequest { detail, .. } => {
                Some(detail.clone())
            }
            Self::Forbidden(detail) | Self::NotFound(detail) => Some(detail.clone()),
            Self::Conflict { expected, provided } => Some(format!(
                "resource id \"{provided}\" does not match the requested id \"{expected}\""
            )),
            Self::Internal(_) => None,
            Self::Status { detail, .. } => detail.clone(),
        }
    }

    /// Single entry of a JSON:API `errors` array.
    pub fn to_error_object(&self) -> Value {
        let mut object = json!({
            "status": self.status().as_u16().to_string(),
            "title": self.title(),
        });
        if let Some(detail) = self.detail() {
            object["detail"] = Value::String(detail);
        }
        if let Self::Validation {
            pointer: Some(pointer),
            ..
        } = self
        {
            object["source"] = json!({ "pointer": pointer });
        }
        object
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        crate::document::error_response(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::validation("x", None).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::bad_request("a", "b").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::forbidden("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("gone").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("2", "1").status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::internal("boom").status(), StatusCode::INTERNAL_SERVER_ERROR);

        let custom = ApiError::Status {
            status: StatusCode::LOCKED,
            title: "Locked".into(),
            detail: None,
        };
        assert_eq!(custom.status(), StatusCode::LOCKED);
    }

    #[test]
    fn test_conflict_names_both_ids() {
        let object = ApiError::conflict("2", "1").to_error_object();
        assert_eq!(object["status"], "409");
        let detail = object["detail"].as_str().unwrap();
        assert!(detail.contains("\"1\""));
        assert!(detail.contains("\"2\""));
    }

    #[test]
    fn test_validation_carries_pointer() {
        let object = ApiError::validation("missing type", Some("/data/type")).to_error_object();
        assert_eq!(object["source"]["pointer"], "/data/type");
    }

    #[test]
    fn test_internal_hides_message() {
        let object = ApiError::internal("db password leaked").to_error_object();
        assert!(object.get("detail").is_none());
    }
}
