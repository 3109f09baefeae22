use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::forms::CommentForm;
use crate::metrics::blog::COMMENTS_CREATED_TOTAL;
use crate::models::{Comment, NewComment};

#[derive(Clone)]
pub struct CommentService {
    repo: Arc<dyn BlogRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Attach a comment to `post_id`.
    ///
    /// Returns `None` when the form is invalid; the caller redirects back to
    /// the post either way. A missing post is `NotFound`.
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        form: CommentForm,
    ) -> Result<Option<Comment>> {
        if self.repo.find_post(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        let text = match form.clean() {
            Ok(text) => text,
            Err(errors) => {
                debug!(post_id = %post_id, %errors, "Rejected comment form");
                return Ok(None);
            }
        };

        let comment = self
            .repo
            .create_comment(NewComment {
                post_id,
                author_id,
                text,
            })
            .await?;

        COMMENTS_CREATED_TOTAL.inc();
        info!(comment_id = %comment.id, post_id = %post_id, "Comment created");
        Ok(Some(comment))
    }
}
