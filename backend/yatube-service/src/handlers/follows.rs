use actix_web::{web, HttpResponse};

use super::{redirect, PageQuery};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::urls;

/// Feed of posts by followed authors
pub async fn follow_index(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let context = state
        .follows
        .follow_index(user.id(), query.page.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(context))
}

pub async fn profile_follow(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    state.follows.follow(user.id(), &username).await?;
    Ok(redirect(urls::profile(&username)))
}

pub async fn profile_unfollow(
    state: web::Data<AppState>,
    path: web::Path<String>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    state.follows.unfollow(user.id(), &username).await?;
    Ok(redirect(urls::profile(&username)))
}
