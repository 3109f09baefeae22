use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::redirect;
use crate::error::Result;
use crate::forms::CommentForm;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::urls;

/// Add a comment and return to the post, whether or not the form was valid
pub async fn add_comment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: CurrentUser,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    state
        .comments
        .add_comment(post_id, user.id(), form.into_inner())
        .await?;
    Ok(redirect(urls::post_detail(post_id)))
}
