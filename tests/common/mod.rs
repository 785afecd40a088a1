//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use jsonapi_router::store::{Crud, StoreResult, ToMany};
use jsonapi_router::{Api, ApiError, IdObject, Object, RequestContext, Resource, ResourceOptions};

/// In-memory resource storage with a to-many relationship per object.
#[derive(Default)]
pub struct MemoryStore {
    resource_type: String,
    objects: Mutex<BTreeMap<String, Object>>,
    links: Mutex<HashMap<String, Vec<IdObject>>>,
    next_id: AtomicU32,
    calls: AtomicU32,
}

impl MemoryStore {
    pub fn new(resource_type: &str) -> Arc<Self> {
        Arc::new(Self {
            resource_type: resource_type.to_owned(),
            ..Self::default()
        })
    }

    /// Number of storage calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn links(&self, id: &str) -> Vec<IdObject> {
        self.links.lock().unwrap().get(id).cloned().unwrap_or_default()
    }

    fn called(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn not_found(&self, id: &str) -> ApiError {
        ApiError::not_found(format!("{} {id} not found", self.resource_type))
    }
}

#[async_trait]
impl Crud for MemoryStore {
    async fn save(&self, _ctx: RequestContext, mut object: Object) -> StoreResult<Object> {
        self.called();
        if object.id().is_none() {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            object.id = Some(id.to_string());
        }
        let id = object.id.clone().unwrap_or_default();
        self.objects.lock().unwrap().insert(id, object.clone());
        Ok(object)
    }

    async fn get(&self, _ctx: RequestContext, id: String) -> StoreResult<Object> {
        self.called();
        self.objects
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| self.not_found(&id))
    }

    async fn list(&self, _ctx: RequestContext) -> StoreResult<Vec<Object>> {
        self.called();
        Ok(self.objects.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, _ctx: RequestContext, object: Object) -> StoreResult<Object> {
        self.called();
        let id = object.id().unwrap_or_default().to_owned();
        let mut objects = self.objects.lock().unwrap();
        let stored = objects.get_mut(&id).ok_or_else(|| self.not_found(&id))?;
        stored.attributes.extend(object.attributes);
        Ok(stored.clone())
    }

    async fn delete(&self, _ctx: RequestContext, id: String) -> StoreResult<()> {
        self.called();
        self.objects
            .lock()
            .unwrap()
            .remove(&id)
            .ok_or_else(|| self.not_found(&id))?;
        self.links.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ToMany for MemoryStore {
    async fn list_resources(&self, _ctx: RequestContext, id: String) -> StoreResult<Vec<Object>> {
        self.called();
        Ok(self
            .links(&id)
            .into_iter()
            .map(|link| Object::new(link.object_type).with_id(link.id))
            .collect())
    }

    async fn list(&self, _ctx: RequestContext, id: String) -> StoreResult<Vec<IdObject>> {
        self.called();
        Ok(self.links(&id))
    }

    async fn save(
        &self,
        _ctx: RequestContext,
        id: String,
        linkages: Vec<IdObject>,
    ) -> StoreResult<Vec<IdObject>> {
        self.called();
        let mut links = self.links.lock().unwrap();
        let entry = links.entry(id).or_default();
        for linkage in linkages {
            if !entry.contains(&linkage) {
                entry.push(linkage);
            }
        }
        Ok(Vec::new())
    }

    async fn update(
        &self,
        _ctx: RequestContext,
        id: String,
        linkages: Vec<IdObject>,
    ) -> StoreResult<Vec<IdObject>> {
        self.called();
        self.links.lock().unwrap().insert(id, linkages);
        Ok(Vec::new())
    }

    async fn delete(
        &self,
        _ctx: RequestContext,
        id: String,
        linkages: Vec<IdObject>,
    ) -> StoreResult<Vec<IdObject>> {
        self.called();
        if let Some(entry) = self.links.lock().unwrap().get_mut(&id) {
            entry.retain(|link| !linkages.contains(link));
        }
        Ok(Vec::new())
    }
}

/// `widgets` with full CRUD and a to-many `parts` relationship.
pub fn widgets_resource(store: &Arc<MemoryStore>, options: ResourceOptions) -> Resource {
    let mut resource = Resource::with_options("widgets", options);
    resource
        .crud(Arc::clone(store))
        .to_many("parts", Arc::clone(store));
    resource
}

pub fn widgets_api(store: &Arc<MemoryStore>) -> Api {
    let mut api = Api::new("/");
    api.add(widgets_resource(store, ResourceOptions::default()));
    api
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Value::Null` when the body is empty.
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn error_title(&self) -> &str {
        self.body["errors"][0]["title"].as_str().unwrap_or_default()
    }
}

/// Drive one request through `router` without a socket.
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/vnd.api+json")
        .body(body)
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn object_document(resource_type: &str, id: Option<&str>, attributes: Value) -> Value {
    let mut data = json!({ "type": resource_type, "attributes": attributes });
    if let Some(id) = id {
        data["id"] = json!(id);
    }
    json!({ "data": data })
}

pub fn linkage_document(resource_type: &str, ids: &[&str]) -> Value {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "type": resource_type, "id": id }))
        .collect();
    json!({ "data": data })
}
