//! Request document parsing.

use serde_json::Value;

use super::{IdObject, Object};
use crate::error::ApiError;

/// Parse a document whose primary data is a single resource object.
pub fn parse_object(body: &[u8]) -> Result<Object, ApiError> {
    let data = primary_data(body)?;
    if !data.is_object() {
        return Err(ApiError::validation(
            "primary data must be a single resource object",
            Some("/data"),
        ));
    }

    let object: Object = serde_json::from_value(data)
        .map_err(|e| ApiError::validation(e.to_string(), Some("/data")))?;
    if object.object_type.is_empty() {
        return Err(ApiError::validation(
            "resource object must have a type",
            Some("/data/type"),
        ));
    }
    Ok(object)
}

/// Parse a to-one linkage document. `null` data clears the relationship.
pub fn parse_linkage(body: &[u8]) -> Result<Option<IdObject>, ApiError> {
    match primary_data(body)? {
        Value::Null => Ok(None),
        data @ Value::Object(_) => parse_identifier(data, "/data").map(Some),
        _ => Err(ApiError::validation(
            "primary data must be a resource identifier or null",
            Some("/data"),
        )),
    }
}

/// Parse a to-many linkage document. `null` data reads as an empty list.
pub fn parse_linkages(body: &[u8]) -> Result<Vec<IdObject>, ApiError> {
    match primary_data(body)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| parse_identifier(item, &format!("/data/{i}")))
            .collect(),
        _ => Err(ApiError::validation(
            "primary data must be an array of resource identifiers",
            Some("/data"),
        )),
    }
}

fn primary_data(body: &[u8]) -> Result<Value, ApiError> {
    if body.is_empty() {
        return Err(ApiError::validation("request body is empty", None));
    }

    let document: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::validation(format!("invalid JSON: {e}"), None))?;
    let Value::Object(mut members) = document else {
        return Err(ApiError::validation("document must be a JSON object", Some("")));
    };

    members
        .remove("data")
        .ok_or_else(|| ApiError::validation("missing primary data", Some("/data")))
}

fn parse_identifier(value: Value, pointer: &str) -> Result<IdObject, ApiError> {
    let identifier: IdObject = serde_json::from_value(value)
        .map_err(|e| ApiError::validation(e.to_string(), Some(pointer)))?;
    if identifier.object_type.is_empty() || identifier.id.is_empty() {
        return Err(ApiError::validation(
            "resource identifier must have a type and an id",
            Some(pointer),
        ));
    }
    Ok(identifier)
}
