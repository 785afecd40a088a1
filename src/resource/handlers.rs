//! Per-operation request handling: decode, call storage, pick the result.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;

use super::{Operation, ResourceOptions};
use crate::document::{parse_linkage, parse_linkages, parse_object, IdObject};
use crate::error::ApiError;
use crate::http::{RequestContext, ResponseSender, Sendable};
use crate::routing::PathParams;
use crate::store;

/// Run `op` for a matched, allowed route and send the outcome.
pub(super) async fn run(
    op: &Operation,
    request: Request,
    params: PathParams,
    options: &ResourceOptions,
    sender: &dyn ResponseSender,
) -> Response {
    let ctx = RequestContext::new(&request, params);
    let sendable = execute(op, &ctx, request, options)
        .await
        .unwrap_or_else(Sendable::Error);
    sender.send(&ctx, sendable)
}

async fn execute(
    op: &Operation,
    ctx: &RequestContext,
    mut request: Request,
    options: &ResourceOptions,
) -> Result<Sendable, ApiError> {
    let id = ctx.id().to_owned();

    match op {
        Operation::Create(save) => {
            let body = read_body(request, options).await?;
            let object = parse_object(&body)?;
            if !options.client_generated_ids && object.id().is_some() {
                return Err(ApiError::forbidden("Client-generated IDs are unsupported"));
            }

            let mut object = save(ctx.clone(), object).await?;
            object.status.get_or_insert(StatusCode::OK);
            Ok(Sendable::Object(object))
        }
        Operation::Fetch(get) => get(ctx.clone(), id).await.map(Sendable::Object),
        Operation::List(list) => list(ctx.clone()).await.map(Sendable::List),
        Operation::Update(update) => {
            let body = read_body(request, options).await?;
            let object = parse_object(&body)?;
            if object.id() != Some(id.as_str()) {
                return Err(ApiError::conflict(id, object.id().unwrap_or_default()));
            }
            update(ctx.clone(), object).await.map(Sendable::Object)
        }
        Operation::Delete(delete) => {
            delete(ctx.clone(), id).await?;
            Ok(Sendable::NoContent)
        }
        Operation::FetchRelationship(get) => get(ctx.clone(), id).await.map(Sendable::Linkage),
        Operation::UpdateToOne(update) => {
            let body = read_body(request, options).await?;
            let linkage = parse_linkage(&body)?;
            Ok(match update(ctx.clone(), id, linkage).await? {
                Some(linkage) => Sendable::Linkage(Some(linkage)),
                None => Sendable::NoContent,
            })
        }
        Operation::ListRelated(list) => list(ctx.clone(), id).await.map(Sendable::List),
        Operation::ListRelationships(list) => list(ctx.clone(), id).await.map(Sendable::Linkages),
        Operation::ReplaceToMany(update) => {
            let body = read_body(request, options).await?;
            let linkages = parse_linkages(&body)?;
            linkage_result(update(ctx.clone(), id, linkages).await?)
        }
        Operation::ModifyToMany(update) => {
            let body = read_body(request, options).await?;
            let linkages = parse_linkages(&body)?;
            // An empty replace clears the relationship; an empty add or
            // remove describes nothing.
            if linkages.is_empty() {
                return Err(ApiError::bad_request(
                    "Invalid document",
                    "Missing description of changes",
                ));
            }
            linkage_result(update(ctx.clone(), id, linkages).await?)
        }
        Operation::Action(handler) => {
            request.extensions_mut().insert(ctx.params.clone());
            run_action(handler, request).await
        }
    }
}

/// Invoke an action handler, defaulting its status to 200.
pub(crate) async fn run_action(handler: &store::Action, request: Request) -> Result<Sendable, ApiError> {
    let mut object = handler(request).await?;
    object.status.get_or_insert(StatusCode::OK);
    Ok(Sendable::Object(object))
}

fn linkage_result(linkages: Vec<IdObject>) -> Result<Sendable, ApiError> {
    Ok(if linkages.is_empty() {
        Sendable::NoContent
    } else {
        Sendable::Linkages(linkages)
    })
}

async fn read_body(request: Request, options: &ResourceOptions) -> Result<axum::body::Bytes, ApiError> {
    axum::body::to_bytes(request.into_body(), options.max_body_size)
        .await
        .map_err(|e| ApiError::bad_request("Invalid request body", e.to_string()))
}
