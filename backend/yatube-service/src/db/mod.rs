//! Storage layer
//!
//! [`BlogRepository`] is the only way services touch persistent state.
//! [`PostgresBlogRepository`] backs production; [`MemoryBlogRepository`]
//! keeps everything in-process for tests and local runs.
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Comment, CommentDetails, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges,
    PostDetails, PostFilter, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryBlogRepository;
pub use postgres::PostgresBlogRepository;

#[async_trait]
pub trait BlogRepository: Send + Sync {
    // Users

    /// Fails with `Conflict` if the username is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    // Groups

    /// Fails with `Conflict` if the slug is taken
    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// All groups ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>>;

    // Posts

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    /// Returns `None` if the post does not exist
    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> Result<Option<Post>>;

    /// Returns the removed post, with its comments deleted alongside it
    async fn delete_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    async fn find_post_details(&self, post_id: Uuid) -> Result<Option<PostDetails>>;

    /// Posts matching `filter`, newest first
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostDetails>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<i64>;

    // Comments

    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;

    /// Comments on a post, newest first
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentDetails>>;

    // Follows

    /// Returns `false` if the edge already existed
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    /// Returns `false` if there was no edge to remove
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    async fn count_followers(&self, author_id: Uuid) -> Result<i64>;

    async fn count_following(&self, user_id: Uuid) -> Result<i64>;

    /// Check the backend is reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
