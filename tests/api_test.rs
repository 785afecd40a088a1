//! Dispatch semantics: body validation, status defaults, actions.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use serde_json::json;

use jsonapi_router::routing::PathParams;
use jsonapi_router::store::{self, MockToOneStorage};
use jsonapi_router::{
    Api, ApiError, JsonApiSender, Object, RequestContext, Resource, ResourceOptions,
    ResponseSender, Sendable,
};

mod common;

use common::{linkage_document, object_document, send, widgets_api, widgets_resource, MemoryStore};

#[tokio::test]
async fn test_create_defaults_to_200() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    let response = send(
        &router,
        Method::POST,
        "/widgets",
        Some(object_document("widgets", None, json!({ "name": "x" }))),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], "1");
    assert_eq!(response.body["data"]["attributes"]["name"], "x");
    assert_eq!(response.body["jsonapi"]["version"], "1.0");
    assert_eq!(
        response.header(header::CONTENT_TYPE),
        Some("application/vnd.api+json")
    );
}

#[tokio::test]
async fn test_create_rejects_client_id() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    let response = send(
        &router,
        Method::POST,
        "/widgets",
        Some(object_document("widgets", Some("7"), json!({}))),
    )
    .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["errors"][0]["status"], "403");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_create_accepts_client_id_when_enabled() {
    let store = MemoryStore::new("widgets");
    let options = ResourceOptions {
        client_generated_ids: true,
        ..ResourceOptions::default()
    };
    let mut api = Api::new("/");
    api.add(widgets_resource(&store, options));

    let response = send(
        &api.router(),
        Method::POST,
        "/widgets",
        Some(object_document("widgets", Some("7"), json!({}))),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], "7");
}

#[tokio::test]
async fn test_create_with_explicit_status() {
    let mut resource = Resource::new("widgets");
    resource.post(
        store::save(|_ctx, object: Object| async move {
            Ok(object.with_id("9").with_status(StatusCode::CREATED))
        }),
        true,
    );
    let mut api = Api::new("/");
    api.add(resource);

    let response = send(
        &api.router(),
        Method::POST,
        "/widgets",
        Some(object_document("widgets", None, json!({}))),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    let response = send(
        &router,
        Method::POST,
        "/widgets",
        Some(json!({ "data": { "attributes": {} } })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(&router, Method::POST, "/widgets", None).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_update_id_mismatch_is_conflict() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    let response = send(
        &router,
        Method::PATCH,
        "/widgets/2",
        Some(object_document("widgets", Some("1"), json!({ "name": "y" }))),
    )
    .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    let detail = response.body["errors"][0]["detail"].as_str().unwrap();
    assert!(detail.contains('2') && detail.contains('1'));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_update_missing_body_id_is_conflict() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    let response = send(
        &router,
        Method::PATCH,
        "/widgets/2",
        Some(object_document("widgets", None, json!({}))),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_and_fetch() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    send(
        &router,
        Method::POST,
        "/widgets",
        Some(object_document("widgets", None, json!({ "name": "x" }))),
    )
    .await;

    let response = send(
        &router,
        Method::PATCH,
        "/widgets/1",
        Some(object_document("widgets", Some("1"), json!({ "name": "y" }))),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["attributes"]["name"], "y");

    let response = send(&router, Method::GET, "/widgets/1", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["attributes"]["name"], "y");
}

#[tokio::test]
async fn test_storage_error_is_sent_unchanged() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    let response = send(&router, Method::GET, "/widgets/42", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["errors"][0]["detail"], "widgets 42 not found");
}

#[tokio::test]
async fn test_to_many_empty_add_and_remove_are_rejected() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    for method in [Method::POST, Method::DELETE] {
        let response = send(
            &router,
            method,
            "/widgets/1/relationships/parts",
            Some(json!({ "data": [] })),
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_title(), "Invalid document");
        assert_eq!(
            response.body["errors"][0]["detail"],
            "Missing description of changes"
        );
    }
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_to_many_empty_replace_clears() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    send(
        &router,
        Method::POST,
        "/widgets/1/relationships/parts",
        Some(linkage_document("parts", &["a", "b"])),
    )
    .await;
    assert_eq!(store.links("1").len(), 2);

    let response = send(
        &router,
        Method::PATCH,
        "/widgets/1/relationships/parts",
        Some(json!({ "data": [] })),
    )
    .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(store.links("1").is_empty());
}

#[tokio::test]
async fn test_to_many_mutations_invoke_storage() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();
    let path = "/widgets/1/relationships/parts";

    let response = send(&router, Method::POST, path, Some(linkage_document("parts", &["a", "b"]))).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&router, Method::DELETE, path, Some(linkage_document("parts", &["a"]))).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&router, Method::PATCH, path, Some(linkage_document("parts", &["c"]))).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&router, Method::GET, path, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], json!([{ "type": "parts", "id": "c" }]));

    let response = send(&router, Method::GET, "/widgets/1/parts", None).await;
    assert_eq!(response.body["data"][0]["id"], "c");
}

#[tokio::test]
async fn test_to_many_mutation_returning_linkage_is_200() {
    let mut resource = Resource::new("widgets");
    resource.post_many(
        store::to_many_update(|_ctx, _id, linkages| async move { Ok(linkages) }),
        "/:id/relationships/parts",
        true,
    );
    let mut api = Api::new("/");
    api.add(resource);

    let response = send(
        &api.router(),
        Method::POST,
        "/widgets/1/relationships/parts",
        Some(linkage_document("parts", &["a"])),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"][0]["id"], "a");
}

#[tokio::test]
async fn test_to_one_routes() {
    let mut resource = Resource::new("widgets");
    resource.to_one("owner", Arc::new(MockToOneStorage::new("users", json!({ "name": "ada" }))));
    let mut api = Api::new("/");
    api.add(resource);
    let router = api.router();

    let response = send(&router, Method::GET, "/widgets/3/owner", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["type"], "users");
    assert_eq!(response.body["data"]["attributes"]["name"], "ada");

    let response = send(&router, Method::GET, "/widgets/3/relationships/owner", None).await;
    assert_eq!(response.body["data"], json!({ "type": "users", "id": "3" }));

    let response = send(
        &router,
        Method::PATCH,
        "/widgets/3/relationships/owner",
        Some(json!({ "data": null })),
    )
    .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_is_204_without_body() {
    let store = MemoryStore::new("widgets");
    let router = widgets_api(&store).router();

    send(
        &router,
        Method::POST,
        "/widgets",
        Some(object_document("widgets", None, json!({}))),
    )
    .await;

    let response = send(&router, Method::DELETE, "/widgets/1", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.body, serde_json::Value::Null);
}

#[tokio::test]
async fn test_resource_action_sees_path_params() {
    let mut resource = Resource::new("widgets");
    resource.action(
        "publish",
        store::action(|request: Request| async move {
            let id = request
                .extensions()
                .get::<PathParams>()
                .map(|params| params.id().to_owned())
                .unwrap_or_default();
            Ok(Object::new("widgets").with_id(id))
        }),
        true,
    );
    let mut api = Api::new("api");
    api.add(resource);

    let response = send(&api.router(), Method::POST, "/api/widgets/5/publish", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], "5");
}

#[tokio::test]
async fn test_action_error_and_explicit_status() {
    let mut resource = Resource::new("widgets");
    resource
        .action(
            "fail",
            store::action(|_request| async { Err(ApiError::forbidden("not yours")) }),
            true,
        )
        .action(
            "queue",
            store::action(|_request| async {
                Ok(Object::new("jobs").with_id("1").with_status(StatusCode::ACCEPTED))
            }),
            true,
        );
    let mut api = Api::new("/");
    api.add(resource);
    let router = api.router();

    let response = send(&router, Method::POST, "/widgets/1/fail", None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = send(&router, Method::POST, "/widgets/1/queue", None).await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_top_level_action() {
    let mut api = Api::new("api");
    api.action(
        "ping",
        store::action(|_request| async { Ok(Object::new("pongs").with_id("1")) }),
    );
    let router = api.router();

    let response = send(&router, Method::POST, "/api/ping", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["type"], "pongs");

    let response = send(&router, Method::GET, "/api/ping", None).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.header(header::ALLOW), Some("POST"));

    let response = send(&router, Method::OPTIONS, "/api/ping", None).await;
    assert_eq!(response.status, StatusCode::OK);
}

/// Delegates to [`JsonApiSender`] and tags every response.
struct TaggingSender;

impl ResponseSender for TaggingSender {
    fn send(&self, ctx: &RequestContext, sendable: Sendable) -> Response {
        let mut response = JsonApiSender.send(ctx, sendable);
        response
            .headers_mut()
            .insert("x-sent-by", HeaderValue::from_static("tagging"));
        response
    }
}

#[tokio::test]
async fn test_custom_sender() {
    let store = MemoryStore::new("widgets");
    let mut api = Api::with_sender("/", Arc::new(TaggingSender));
    api.add(widgets_resource(&store, ResourceOptions::default()));

    let response = send(&api.router(), Method::GET, "/widgets", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["x-sent-by"], "tagging");
}
