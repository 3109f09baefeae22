use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{paginate_posts, PostCard};
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::media::MediaStorage;
use crate::metrics::blog::FOLLOW_EVENTS_TOTAL;
use crate::models::{PostFilter, User};
use crate::pagination::Page;

#[derive(Debug, Serialize)]
pub struct FollowContext {
    pub page: Page<PostCard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    /// Users cannot follow themselves; the request is a no-op
    SelfFollowIgnored,
}

#[derive(Clone)]
pub struct FollowService {
    repo: Arc<dyn BlogRepository>,
    media: Arc<MediaStorage>,
    posts_per_page: usize,
}

impl FollowService {
    pub fn new(
        repo: Arc<dyn BlogRepository>,
        media: Arc<MediaStorage>,
        posts_per_page: usize,
    ) -> Self {
        Self {
            repo,
            media,
            posts_per_page,
        }
    }

    /// Posts whose author `user_id` follows, newest first.
    pub async fn follow_index(&self, user_id: Uuid, raw_page: Option<&str>) -> Result<FollowContext> {
        let page = paginate_posts(
            self.repo.as_ref(),
            &self.media,
            PostFilter::FollowedBy(user_id),
            raw_page,
            self.posts_per_page,
        )
        .await?;

        Ok(FollowContext { page })
    }

    /// Idempotent follow of `username`.
    pub async fn follow(&self, user_id: Uuid, username: &str) -> Result<FollowOutcome> {
        let author = self.find_author(username).await?;

        if author.id == user_id {
            FOLLOW_EVENTS_TOTAL.with_label_values(&["ignored"]).inc();
            debug!(user_id = %user_id, "Self-follow ignored");
            return Ok(FollowOutcome::SelfFollowIgnored);
        }

        if self.repo.create_follow(user_id, author.id).await? {
            FOLLOW_EVENTS_TOTAL.with_label_values(&["follow"]).inc();
            info!(user_id = %user_id, author_id = %author.id, "Follow created");
            Ok(FollowOutcome::Followed)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    /// Idempotent unfollow; returns true if an edge was removed.
    pub async fn unfollow(&self, user_id: Uuid, username: &str) -> Result<bool> {
        let author = self.find_author(username).await?;

        let removed = self.repo.delete_follow(user_id, author.id).await?;
        if removed {
            FOLLOW_EVENTS_TOTAL.with_label_values(&["unfollow"]).inc();
            info!(user_id = %user_id, author_id = %author.id, "Follow removed");
        }
        Ok(removed)
    }

    async fn find_author(&self, username: &str) -> Result<User> {
        self.repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))
    }
}
