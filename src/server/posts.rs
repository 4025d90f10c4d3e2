use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    post::{render_markdown, Post},
    store::ListedPost,
};

use super::{error::ApiError, AppState};

const DEFAULT_FEATURED_LIMIT: usize = 3;

#[derive(Deserialize, Debug, Default)]
pub(crate) struct FilenameQuery {
    filename: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct FeaturedQuery {
    limit: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct FilterQuery {
    category: Option<String>,
    tag: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct PostRef {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct DeleteCommand {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

fn require_filename(filename: Option<String>) -> Result<String, ApiError> {
    filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Filename is required"))
}

fn display_title(title: Option<String>, filename: &str) -> String {
    title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| filename.to_string())
}

pub(crate) async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<ListedPost>>, ApiError> {
    Ok(Json(state.with_store(|store| store.list_all()).await?))
}

pub(crate) async fn featured_posts(
    State(state): State<AppState>,
    query: Result<Query<FeaturedQuery>, QueryRejection>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
    Ok(Json(state.with_store(move |store| store.featured(limit)).await?))
}

/// Visible posts, narrowed by `?category=` and/or `?tag=`.
pub(crate) async fn filter_posts(
    State(state): State<AppState>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let Query(FilterQuery { category, tag }) = query?;
    let posts = state
        .with_store(move |store| {
            let mut posts = match &category {
                Some(category) => store.by_category(category)?,
                None => store.list_visible()?,
            };
            if let Some(tag) = &tag {
                posts.retain(|p| p.has_tag(tag));
            }
            Ok(posts)
        })
        .await?;
    Ok(Json(posts))
}

pub(crate) async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let post = state.with_store(move |store| store.get(&id)).await?;
    let html = render_markdown(&post.body);
    let mut body = json!(post);
    body["html"] = json!(html);
    Ok(Json(body))
}

pub(crate) async fn hard_delete(
    State(state): State<AppState>,
    query: Result<Query<FilenameQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let filename = require_filename(query.filename)?;
    state
        .with_store(move |store| store.hard_delete(&filename))
        .await?;
    state.rebuild.request();
    Ok(Json(json!({
        "success": true,
        "message": "Post deleted successfully",
    })))
}

pub(crate) async fn soft_delete(
    State(state): State<AppState>,
    payload: Result<Json<PostRef>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(PostRef { filename, title }) = payload?;
    let filename = require_filename(filename)?;
    let title = display_title(title, &filename);
    state
        .with_store(move |store| store.soft_delete(&filename))
        .await?;
    state.rebuild.request();
    Ok(Json(json!({
        "success": true,
        "message": format!("Post \"{title}\" marked as deleted"),
    })))
}

pub(crate) async fn restore(
    State(state): State<AppState>,
    payload: Result<Json<PostRef>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(PostRef { filename, title }) = payload?;
    let filename = require_filename(filename)?;
    let title = display_title(title, &filename);
    let restored = state
        .with_store(move |store| store.restore(&filename))
        .await?;
    if restored {
        state.rebuild.request();
    }
    Ok(Json(json!({
        "success": true,
        "restored": restored,
        "message": format!("Post \"{title}\" restored"),
    })))
}

/// Command-style soft delete for automation clients. Shares the tombstone
/// list with every other delete path.
pub(crate) async fn delete_manager(
    State(state): State<AppState>,
    payload: Result<Json<DeleteCommand>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(command) = payload?;
    let filename = match (command.action.as_deref(), command.filename) {
        (Some("delete"), Some(filename)) if !filename.trim().is_empty() => filename,
        _ => return Err(ApiError::bad_request("Invalid action or missing filename")),
    };
    let title = display_title(command.title, &filename);
    let deleted = state
        .with_store(move |store| {
            store.soft_delete(&filename)?;
            store.deleted()
        })
        .await?;
    state.rebuild.request();
    Ok(Json(json!({
        "success": true,
        "message": format!("Post \"{title}\" marked as deleted"),
        "deletedCount": deleted.len(),
    })))
}

pub(crate) async fn deleted_posts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let deleted = state.with_store(|store| store.deleted()).await?;
    Ok(Json(json!({
        "message": "Delete management endpoint",
        "deletedCount": deleted.len(),
        "deletedPosts": deleted,
    })))
}
