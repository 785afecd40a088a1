//! Canned storage for demos and tests.
//!
//! Every mock answers from its configured type and attributes; nothing is
//! persisted. Relationship mutations return no linkage, so they respond 204.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::document::{IdObject, Object};
use crate::http::RequestContext;
use crate::resource::Resource;
use crate::store::{Crud, StoreResult, ToMany, ToOne};

fn attributes_map(attributes: Value) -> Map<String, Value> {
    match attributes {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn sample_object(resource_type: &str, attributes: &Map<String, Value>, id: &str) -> Object {
    let mut object = Object::new(resource_type).with_id(id);
    object.attributes = attributes.clone();
    object
}

/// Resource storage returning `list_count` sample objects.
#[derive(Debug, Clone)]
pub struct MockStorage {
    pub resource_type: String,
    pub attributes: Map<String, Value>,
    pub list_count: usize,
}

impl MockStorage {
    /// Non-object `attributes` are treated as empty.
    pub fn new(resource_type: impl Into<String>, list_count: usize, attributes: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: attributes_map(attributes),
            list_count,
        }
    }

    pub fn sample_object(&self, id: &str) -> Object {
        sample_object(&self.resource_type, &self.attributes, id)
    }

    /// Objects with ids `1..=count`.
    pub fn sample_list(&self, count: usize) -> Vec<Object> {
        (1..=count)
            .map(|n| self.sample_object(&n.to_string()))
            .collect()
    }
}

#[async_trait]
impl Crud for MockStorage {
    async fn save(&self, _ctx: RequestContext, mut object: Object) -> StoreResult<Object> {
        object.id = Some("1".to_owned());
        Ok(object)
    }

    async fn get(&self, _ctx: RequestContext, id: String) -> StoreResult<Object> {
        Ok(self.sample_object(&id))
    }

    async fn list(&self, _ctx: RequestContext) -> StoreResult<Vec<Object>> {
        Ok(self.sample_list(self.list_count))
    }

    async fn update(&self, _ctx: RequestContext, object: Object) -> StoreResult<Object> {
        Ok(object)
    }

    async fn delete(&self, _ctx: RequestContext, _id: String) -> StoreResult<()> {
        Ok(())
    }
}

/// To-one relationship storage pointing every parent at the related
/// object with the parent's id.
#[derive(Debug, Clone)]
pub struct MockToOneStorage {
    pub resource_type: String,
    pub attributes: Map<String, Value>,
}

impl MockToOneStorage {
    pub fn new(resource_type: impl Into<String>, attributes: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: attributes_map(attributes),
        }
    }
}

#[async_trait]
impl ToOne for MockToOneStorage {
    async fn get_resource(&self, _ctx: RequestContext, id: String) -> StoreResult<Object> {
        Ok(sample_object(&self.resource_type, &self.attributes, &id))
    }

    async fn get(&self, _ctx: RequestContext, id: String) -> StoreResult<Option<IdObject>> {
        Ok(Some(IdObject::new(self.resource_type.clone(), id)))
    }

    async fn update(
        &self,
        _ctx: RequestContext,
        _id: String,
        _linkage: Option<IdObject>,
    ) -> StoreResult<Option<IdObject>> {
        Ok(None)
    }
}

/// To-many relationship storage with a single related object per parent.
#[derive(Debug, Clone)]
pub struct MockToManyStorage {
    pub resource_type: String,
    pub attributes: Map<String, Value>,
}

impl MockToManyStorage {
    pub fn new(resource_type: impl Into<String>, attributes: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: attributes_map(attributes),
        }
    }
}

#[async_trait]
impl ToMany for MockToManyStorage {
    async fn list_resources(&self, _ctx: RequestContext, id: String) -> StoreResult<Vec<Object>> {
        Ok(vec![sample_object(&self.resource_type, &self.attributes, &id)])
    }

    async fn list(&self, _ctx: RequestContext, id: String) -> StoreResult<Vec<IdObject>> {
        Ok(vec![IdObject::new(self.resource_type.clone(), id)])
    }

    async fn save(
        &self,
        _ctx: RequestContext,
        _id: String,
        _linkages: Vec<IdObject>,
    ) -> StoreResult<Vec<IdObject>> {
        Ok(Vec::new())
    }

    async fn update(
        &self,
        _ctx: RequestContext,
        _id: String,
        _linkages: Vec<IdObject>,
    ) -> StoreResult<Vec<IdObject>> {
        Ok(Vec::new())
    }

    async fn delete(
        &self,
        _ctx: RequestContext,
        _id: String,
        _linkages: Vec<IdObject>,
    ) -> StoreResult<Vec<IdObject>> {
        Ok(Vec::new())
    }
}

/// A CRUD resource backed by [`MockStorage`], with default options.
pub fn new_mock_resource(resource_type: &str, list_count: usize, attributes: Value) -> Resource {
    Resource::new_crud(
        resource_type,
        Arc::new(MockStorage::new(resource_type, list_count, attributes)),
    )
}
