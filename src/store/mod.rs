//! Storage capability contracts.
//!
//! # Responsibilities
//! - Define the operation bundles a resource binds to ([`Crud`], [`ToOne`],
//!   [`ToMany`])
//! - Define one narrow callable type per operation
//! - Bind bundle implementations into those callables
//!
//! # Design Decisions
//! - Storage is a black box: it gets a [`RequestContext`] and returns
//!   [`ApiError`] on failure, which is sent unchanged
//! - Operations are `Arc<dyn Fn>` so one bundle can back many routes
//! - Ids arrive owned; futures are `'static` and `Send`

pub mod mock;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use futures_util::future::{BoxFuture, FutureExt};

use crate::document::{IdObject, Object};
use crate::error::ApiError;
use crate::http::RequestContext;

pub use mock::{new_mock_resource, MockStorage, MockToManyStorage, MockToOneStorage};

pub type StoreResult<T> = Result<T, ApiError>;

/// Resource controller.
#[async_trait]
pub trait Crud: Send + Sync + 'static {
    /// Save a new resource.
    async fn save(&self, ctx: RequestContext, object: Object) -> StoreResult<Object>;

    /// Get one resource by id.
    async fn get(&self, ctx: RequestContext, id: String) -> StoreResult<Object>;

    /// List all resources.
    async fn list(&self, ctx: RequestContext) -> StoreResult<Vec<Object>>;

    /// Update an existing resource.
    async fn update(&self, ctx: RequestContext, object: Object) -> StoreResult<Object>;

    /// Delete a resource by id.
    async fn delete(&self, ctx: RequestContext, id: String) -> StoreResult<()>;
}

/// To-one relationship controller.
#[async_trait]
pub trait ToOne: Send + Sync + 'static {
    /// The related resource itself.
    async fn get_resource(&self, ctx: RequestContext, id: String) -> StoreResult<Object>;

    /// The relationship linkage, `None` when empty.
    async fn get(&self, ctx: RequestContext, id: String) -> StoreResult<Option<IdObject>>;

    /// Replace the linkage. `None` clears it.
    async fn update(
        &self,
        ctx: RequestContext,
        id: String,
        linkage: Option<IdObject>,
    ) -> StoreResult<Option<IdObject>>;
}

/// To-many relationship controller.
#[async_trait]
pub trait ToMany: Send + Sync + 'static {
    /// The related resources.
    async fn list_resources(&self, ctx: RequestContext, id: String) -> StoreResult<Vec<Object>>;

    /// The relationship linkage.
    async fn list(&self, ctx: RequestContext, id: String) -> StoreResult<Vec<IdObject>>;

    /// Append linkage entries.
    async fn save(
        &self,
        ctx: RequestContext,
        id: String,
        linkages: Vec<IdObject>,
    ) -> StoreResult<Vec<IdObject>>;

    /// Replace all linkage entries.
    async fn update(
        &self,
        ctx: RequestContext,
        id: String,
        linkages: Vec<IdObject>,
    ) -> StoreResult<Vec<IdObject>>;

    /// Remove linkage entries.
    async fn delete(
        &self,
        ctx: RequestContext,
        id: String,
        linkages: Vec<IdObject>,
    ) -> StoreResult<Vec<IdObject>>;
}

pub type Save = Arc<dyn Fn(RequestContext, Object) -> BoxFuture<'static, StoreResult<Object>> + Send + Sync>;
pub type Get = Arc<dyn Fn(RequestContext, String) -> BoxFuture<'static, StoreResult<Object>> + Send + Sync>;
pub type List = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, StoreResult<Vec<Object>>> + Send + Sync>;
pub type Update = Arc<dyn Fn(RequestContext, Object) -> BoxFuture<'static, StoreResult<Object>> + Send + Sync>;
pub type Delete = Arc<dyn Fn(RequestContext, String) -> BoxFuture<'static, StoreResult<()>> + Send + Sync>;

pub type ToOneGet =
    Arc<dyn Fn(RequestContext, String) -> BoxFuture<'static, StoreResult<Option<IdObject>>> + Send + Sync>;
pub type ToOneUpdate = Arc<
    dyn Fn(RequestContext, String, Option<IdObject>) -> BoxFuture<'static, StoreResult<Option<IdObject>>>
        + Send
        + Sync,
>;

pub type ToManyListResources =
    Arc<dyn Fn(RequestContext, String) -> BoxFuture<'static, StoreResult<Vec<Object>>> + Send + Sync>;
pub type ToManyList =
    Arc<dyn Fn(RequestContext, String) -> BoxFuture<'static, StoreResult<Vec<IdObject>>> + Send + Sync>;
pub type ToManyUpdate = Arc<
    dyn Fn(RequestContext, String, Vec<IdObject>) -> BoxFuture<'static, StoreResult<Vec<IdObject>>>
        + Send
        + Sync,
>;

/// Free-form handler for behavior outside plain CRUD. Receives the raw
/// request; path parameters are in its extensions as [`crate::routing::PathParams`].
pub type Action = Arc<dyn Fn(Request) -> BoxFuture<'static, StoreResult<Object>> + Send + Sync>;

pub fn save<F, Fut>(f: F) -> Save
where
    F: Fn(RequestContext, Object) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Object>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, object: Object| f(ctx, object).boxed())
}

pub fn get<F, Fut>(f: F) -> Get
where
    F: Fn(RequestContext, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Object>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, id: String| f(ctx, id).boxed())
}

pub fn list<F, Fut>(f: F) -> List
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Vec<Object>>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext| f(ctx).boxed())
}

pub fn update<F, Fut>(f: F) -> Update
where
    F: Fn(RequestContext, Object) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Object>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, object: Object| f(ctx, object).boxed())
}

pub fn delete<F, Fut>(f: F) -> Delete
where
    F: Fn(RequestContext, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<()>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, id: String| f(ctx, id).boxed())
}

pub fn to_one_get<F, Fut>(f: F) -> ToOneGet
where
    F: Fn(RequestContext, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Option<IdObject>>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, id: String| f(ctx, id).boxed())
}

pub fn to_one_update<F, Fut>(f: F) -> ToOneUpdate
where
    F: Fn(RequestContext, String, Option<IdObject>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Option<IdObject>>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, id: String, linkage: Option<IdObject>| {
        f(ctx, id, linkage).boxed()
    })
}

pub fn to_many_list_resources<F, Fut>(f: F) -> ToManyListResources
where
    F: Fn(RequestContext, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Vec<Object>>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, id: String| f(ctx, id).boxed())
}

pub fn to_many_list<F, Fut>(f: F) -> ToManyList
where
    F: Fn(RequestContext, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Vec<IdObject>>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, id: String| f(ctx, id).boxed())
}

pub fn to_many_update<F, Fut>(f: F) -> ToManyUpdate
where
    F: Fn(RequestContext, String, Vec<IdObject>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Vec<IdObject>>> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, id: String, linkages: Vec<IdObject>| {
        f(ctx, id, linkages).boxed()
    })
}

pub fn action<F, Fut>(f: F) -> Action
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<Object>> + Send + 'static,
{
    Arc::new(move |request: Request| f(request).boxed())
}

/// The five CRUD operations of one storage, bound as callables.
#[derive(Clone)]
pub struct CrudOps {
    pub save: Save,
    pub get: Get,
    pub list: List,
    pub update: Update,
    pub delete: Delete,
}

impl CrudOps {
    pub fn bind<S: Crud + ?Sized>(storage: Arc<S>) -> Self {
        let s = Arc::clone(&storage);
        let save: Save = Arc::new(move |ctx: RequestContext, object: Object| {
            let s = Arc::clone(&s);
            async move { s.save(ctx, object).await }.boxed()
        });
        let s = Arc::clone(&storage);
        let get: Get = Arc::new(move |ctx: RequestContext, id: String| {
            let s = Arc::clone(&s);
            async move { s.get(ctx, id).await }.boxed()
        });
        let s = Arc::clone(&storage);
        let list: List = Arc::new(move |ctx: RequestContext| {
            let s = Arc::clone(&s);
            async move { s.list(ctx).await }.boxed()
        });
        let s = Arc::clone(&storage);
        let update: Update = Arc::new(move |ctx: RequestContext, object: Object| {
            let s = Arc::clone(&s);
            async move { s.update(ctx, object).await }.boxed()
        });
        let s = storage;
        let delete: Delete = Arc::new(move |ctx: RequestContext, id: String| {
            let s = Arc::clone(&s);
            async move { s.delete(ctx, id).await }.boxed()
        });

        Self {
            save,
            get,
            list,
            update,
            delete,
        }
    }
}

/// To-one relationship operations, bound as callables.
#[derive(Clone)]
pub struct ToOneOps {
    pub get_resource: Get,
    pub get: ToOneGet,
    pub update: ToOneUpdate,
}

impl ToOneOps {
    pub fn bind<S: ToOne + ?Sized>(storage: Arc<S>) -> Self {
        let s = Arc::clone(&storage);
        let get_resource: Get = Arc::new(move |ctx: RequestContext, id: String| {
            let s = Arc::clone(&s);
            async move { s.get_resource(ctx, id).await }.boxed()
        });
        let s = Arc::clone(&storage);
        let get: ToOneGet = Arc::new(move |ctx: RequestContext, id: String| {
            let s = Arc::clone(&s);
            async move { s.get(ctx, id).await }.boxed()
        });
        let s = storage;
        let update: ToOneUpdate = Arc::new(move |ctx: RequestContext, id: String, linkage: Option<IdObject>| {
            let s = Arc::clone(&s);
            async move { s.update(ctx, id, linkage).await }.boxed()
        });

        Self {
            get_resource,
            get,
            update,
        }
    }
}

/// To-many relationship operations, bound as callables.
#[derive(Clone)]
pub struct ToManyOps {
    pub list_resources: ToManyListResources,
    pub list: ToManyList,
    pub save: ToManyUpdate,
    pub update: ToManyUpdate,
    pub delete: ToManyUpdate,
}

impl ToManyOps {
    pub fn bind<S: ToMany + ?Sized>(storage: Arc<S>) -> Self {
        let s = Arc::clone(&storage);
        let list_resources: ToManyListResources = Arc::new(move |ctx: RequestContext, id: String| {
            let s = Arc::clone(&s);
            async move { s.list_resources(ctx, id).await }.boxed()
        });
        let s = Arc::clone(&storage);
        let list: ToManyList = Arc::new(move |ctx: RequestContext, id: String| {
            let s = Arc::clone(&s);
            async move { s.list(ctx, id).await }.boxed()
        });
        let s = Arc::clone(&storage);
        let save: ToManyUpdate = Arc::new(move |ctx: RequestContext, id: String, linkages: Vec<IdObject>| {
            let s = Arc::clone(&s);
            async move { s.save(ctx, id, linkages).await }.boxed()
        });
        let s = Arc::clone(&storage);
        let update: ToManyUpdate = Arc::new(move |ctx: RequestContext, id: String, linkages: Vec<IdObject>| {
            let s = Arc::clone(&s);
            async move { s.update(ctx, id, linkages).await }.boxed()
        });
        let s = storage;
        let delete: ToManyUpdate = Arc::new(move |ctx: RequestContext, id: String, linkages: Vec<IdObject>| {
            let s = Arc::clone(&s);
            async move { s.delete(ctx, id, linkages).await }.boxed()
        });

        Self {
            list_resources,
            list,
            save,
            update,
            delete,
        }
    }
}
