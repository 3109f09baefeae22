/// Post handlers - listings, detail, and the post forms
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use super::{redirect, PageQuery};
use crate::error::Result;
use crate::forms::read_post_form;
use crate::middleware::CurrentUser;
use crate::services::{DeleteOutcome, EditOutcome};
use crate::state::AppState;
use crate::urls;

/// Main page: all posts, served through the page cache
pub async fn index(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(urls::INDEX);

    let body = state
        .posts
        .index_page(path_and_query, query.page.as_deref())
        .await?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let context = state
        .posts
        .group_page(&path.into_inner(), query.page.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(context))
}

pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    viewer: Option<CurrentUser>,
) -> Result<HttpResponse> {
    let context = state
        .posts
        .profile_page(
            &path.into_inner(),
            query.page.as_deref(),
            viewer.map(|v| v.id()),
        )
        .await?;
    Ok(HttpResponse::Ok().json(context))
}

pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let context = state.posts.post_detail(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(context))
}

pub async fn post_create_form(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<HttpResponse> {
    let context = state.posts.create_form().await?;
    Ok(HttpResponse::Ok().json(context))
}

/// Create a post, then go to the author's profile
pub async fn post_create(
    state: web::Data<AppState>,
    user: CurrentUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = read_post_form(payload, state.posts.max_upload_bytes()).await?;
    state.posts.create_post(user.id(), form).await?;
    Ok(redirect(urls::profile(user.username())))
}

pub async fn post_edit_form(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    match state.posts.edit_form(post_id, user.id()).await? {
        EditOutcome::Done(context) => Ok(HttpResponse::Ok().json(context)),
        EditOutcome::NotAuthor => Ok(redirect(urls::post_detail(post_id))),
    }
}

/// Save an edit; authors and non-authors alike land on the post page
pub async fn post_edit(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: CurrentUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let form = read_post_form(payload, state.posts.max_upload_bytes()).await?;
    state.posts.edit_post(post_id, user.id(), form).await?;
    Ok(redirect(urls::post_detail(post_id)))
}

pub async fn post_delete(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    match state.posts.delete_post(post_id, user.id()).await? {
        DeleteOutcome::Deleted => Ok(redirect(urls::profile(user.username()))),
        DeleteOutcome::NotAuthor => Ok(redirect(urls::post_detail(post_id))),
    }
}
