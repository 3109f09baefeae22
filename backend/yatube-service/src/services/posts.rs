/// Post service - listings, post detail, and the post create/edit/delete forms
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{paginate_posts, PostCard};
use crate::cache::{index_page_key, PageCache, INDEX_CACHE_TTL_SECS};
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::forms::{comment_form_schema, post_form_schema, FormSchema, PostForm, UploadedImage};
use crate::media::MediaStorage;
use crate::metrics::blog::{PAGE_CACHE_EVENTS, POSTS_CREATED_TOTAL, POST_CHANGES_TOTAL};
use crate::models::{
    CommentDetails, Group, NewPost, Post, PostChanges, PostFilter, User, UserProfile,
};
use crate::pagination::{Page, POSTS_PER_PAGE};

#[derive(Debug, Clone)]
pub struct PostServiceConfig {
    pub posts_per_page: usize,
    pub index_cache_ttl: Duration,
    pub max_upload_bytes: usize,
}

impl Default for PostServiceConfig {
    fn default() -> Self {
        Self {
            posts_per_page: POSTS_PER_PAGE,
            index_cache_ttl: Duration::from_secs(INDEX_CACHE_TTL_SECS),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub page: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct GroupContext {
    pub group: Group,
    pub page: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub author: UserProfile,
    pub page: Page<PostCard>,
    /// Whether the viewer follows this author; false for anonymous viewers
    pub following: bool,
}

#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub post: PostCard,
    pub author_post_count: i64,
    pub comments: Vec<CommentDetails>,
    pub form: FormSchema,
}

#[derive(Debug, Serialize)]
pub struct PostFormContext {
    pub form: FormSchema,
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Uuid>,
}

/// Result of an edit attempt on an existing post
#[derive(Debug)]
pub enum EditOutcome<T> {
    Done(T),
    /// The editor is not the post's author; nothing changed
    NotAuthor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotAuthor,
}

pub struct PostService {
    repo: Arc<dyn BlogRepository>,
    cache: Arc<dyn PageCache>,
    media: Arc<MediaStorage>,
    config: PostServiceConfig,
}

impl PostService {
    pub fn new(
        repo: Arc<dyn BlogRepository>,
        cache: Arc<dyn PageCache>,
        media: Arc<MediaStorage>,
        config: PostServiceConfig,
    ) -> Self {
        Self {
            repo,
            cache,
            media,
            config,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }

    /// Rendered index page body, served from the page cache when present.
    ///
    /// Cache failures fall through to a fresh render.
    pub async fn index_page(&self, path_and_query: &str, raw_page: Option<&str>) -> Result<String> {
        let key = index_page_key(path_and_query);

        match self.cache.get(&key).await {
            Ok(Some(body)) => {
                PAGE_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                debug!(%key, "Index page cache HIT");
                return Ok(body);
            }
            Ok(None) => {
                PAGE_CACHE_EVENTS.with_label_values(&["miss"]).inc();
            }
            Err(e) => {
                PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
                warn!(error = %e, %key, "Index page cache read failed");
            }
        }

        let page = paginate_posts(
            self.repo.as_ref(),
            &self.media,
            PostFilter::All,
            raw_page,
            self.config.posts_per_page,
        )
        .await?;
        let body = serde_json::to_string(&IndexContext { page })?;

        if let Err(e) = self
            .cache
            .set(&key, &body, self.config.index_cache_ttl)
            .await
        {
            PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
            warn!(error = %e, %key, "Index page cache write failed");
        }

        Ok(body)
    }

    pub async fn group_page(&self, slug: &str, raw_page: Option<&str>) -> Result<GroupContext> {
        let group = self
            .repo
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group '{}'", slug)))?;

        let page = paginate_posts(
            self.repo.as_ref(),
            &self.media,
            PostFilter::Group(group.id),
            raw_page,
            self.config.posts_per_page,
        )
        .await?;

        Ok(GroupContext { group, page })
    }

    pub async fn profile_page(
        &self,
        username: &str,
        raw_page: Option<&str>,
        viewer: Option<Uuid>,
    ) -> Result<ProfileContext> {
        let author = self
            .repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))?;

        let page = paginate_posts(
            self.repo.as_ref(),
            &self.media,
            PostFilter::Author(author.id),
            raw_page,
            self.config.posts_per_page,
        )
        .await?;

        let following = match viewer {
            Some(viewer_id) if viewer_id != author.id => {
                self.repo.is_following(viewer_id, author.id).await?
            }
            _ => false,
        };

        let author = self.profile_of(&author, page.count as i64).await?;
        Ok(ProfileContext {
            author,
            page,
            following,
        })
    }

    async fn profile_of(&self, user: &User, post_count: i64) -> Result<UserProfile> {
        Ok(UserProfile {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name(),
            date_joined: user.date_joined,
            post_count,
            follower_count: self.repo.count_followers(user.id).await?,
            following_count: self.repo.count_following(user.id).await?,
        })
    }

    pub async fn post_detail(&self, post_id: Uuid) -> Result<PostDetailContext> {
        let post = self
            .repo
            .find_post_details(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        let author_post_count = self
            .repo
            .count_posts(PostFilter::Author(post.author_id))
            .await?;
        let comments = self.repo.list_comments(post_id).await?;

        Ok(PostDetailContext {
            post: PostCard::new(post, &self.media),
            author_post_count,
            comments,
            form: comment_form_schema(),
        })
    }

    pub async fn create_form(&self) -> Result<PostFormContext> {
        let groups = self.repo.list_groups().await?;
        Ok(PostFormContext {
            form: post_form_schema(&groups, None),
            is_edit: false,
            post_id: None,
        })
    }

    pub async fn edit_form(
        &self,
        post_id: Uuid,
        editor_id: Uuid,
    ) -> Result<EditOutcome<PostFormContext>> {
        let post = self.find_post(post_id).await?;
        if post.author_id != editor_id {
            return Ok(EditOutcome::NotAuthor);
        }

        let groups = self.repo.list_groups().await?;
        Ok(EditOutcome::Done(PostFormContext {
            form: post_form_schema(&groups, Some(&post)),
            is_edit: true,
            post_id: Some(post.id),
        }))
    }

    /// Validate the form, store the image, and insert the post.
    pub async fn create_post(&self, author_id: Uuid, form: PostForm) -> Result<Post> {
        let groups = self.repo.list_groups().await?;
        let clean = form.clean(&groups, self.config.max_upload_bytes)?;

        let image = self.store_image(clean.image.as_ref(), clean.image_extension).await?;
        let created = self
            .repo
            .create_post(NewPost {
                author_id,
                group_id: clean.group_id,
                text: clean.text,
                image: image.clone(),
            })
            .await;

        let post = match created {
            Ok(post) => post,
            Err(e) => {
                self.discard_image(image.as_deref()).await;
                return Err(e);
            }
        };

        POSTS_CREATED_TOTAL.inc();
        info!(post_id = %post.id, author_id = %author_id, "Post created");
        Ok(post)
    }

    /// Apply an edit from `editor_id`. Only the author may edit; without a new
    /// upload the current image is kept.
    pub async fn edit_post(
        &self,
        post_id: Uuid,
        editor_id: Uuid,
        form: PostForm,
    ) -> Result<EditOutcome<Post>> {
        let existing = self.find_post(post_id).await?;
        if existing.author_id != editor_id {
            warn!(post_id = %post_id, editor_id = %editor_id, "Edit by non-author ignored");
            return Ok(EditOutcome::NotAuthor);
        }

        let groups = self.repo.list_groups().await?;
        let clean = form.clean(&groups, self.config.max_upload_bytes)?;
        let image = self.store_image(clean.image.as_ref(), clean.image_extension).await?;

        let updated = self
            .repo
            .update_post(
                post_id,
                PostChanges {
                    group_id: clean.group_id,
                    text: clean.text,
                    image: image.clone(),
                },
            )
            .await;

        let post = match updated {
            Ok(Some(post)) => post,
            Ok(None) => {
                self.discard_image(image.as_deref()).await;
                return Err(AppError::NotFound(format!("post {}", post_id)));
            }
            Err(e) => {
                self.discard_image(image.as_deref()).await;
                return Err(e);
            }
        };

        if image.is_some() && existing.image != post.image {
            self.discard_image(existing.image.as_deref()).await;
        }

        POST_CHANGES_TOTAL.with_label_values(&["edit"]).inc();
        info!(post_id = %post_id, "Post edited");
        Ok(EditOutcome::Done(post))
    }

    pub async fn delete_post(&self, post_id: Uuid, editor_id: Uuid) -> Result<DeleteOutcome> {
        let existing = self.find_post(post_id).await?;
        if existing.author_id != editor_id {
            warn!(post_id = %post_id, editor_id = %editor_id, "Delete by non-author ignored");
            return Ok(DeleteOutcome::NotAuthor);
        }

        if let Some(deleted) = self.repo.delete_post(post_id).await? {
            self.discard_image(deleted.image.as_deref()).await;
        }

        POST_CHANGES_TOTAL.with_label_values(&["delete"]).inc();
        info!(post_id = %post_id, "Post deleted");
        Ok(DeleteOutcome::Deleted)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Post> {
        self.repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    async fn store_image(
        &self,
        image: Option<&UploadedImage>,
        extension: Option<&'static str>,
    ) -> Result<Option<String>> {
        match (image, extension) {
            (Some(image), Some(ext)) => {
                let name = self.media.save_post_image(&image.bytes, ext).await?;
                Ok(Some(name))
            }
            _ => Ok(None),
        }
    }

    async fn discard_image(&self, name: Option<&str>) {
        if let Some(name) = name {
            if let Err(e) = self.media.delete(name).await {
                warn!(error = %e, image = %name, "Failed to remove stored image");
            }
        }
    }
}
