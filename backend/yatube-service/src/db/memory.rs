use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::BlogRepository;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentDetails, Follow, Group, NewComment, NewGroup, NewPost, NewUser, Post,
    PostChanges, PostDetails, PostFilter, User,
};

/// Rows plus the insertion sequence, which breaks ties between equal timestamps.
#[derive(Default)]
struct Tables {
    seq: u64,
    users: HashMap<Uuid, User>,
    groups: HashMap<Uuid, Group>,
    posts: HashMap<Uuid, (u64, Post)>,
    comments: Vec<(u64, Comment)>,
    follows: Vec<Follow>,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    fn details(&self, post: &Post) -> PostDetails {
        let author_username = self
            .users
            .get(&post.author_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        let group = post.group_id.and_then(|id| self.groups.get(&id));

        PostDetails {
            id: post.id,
            text: post.text.clone(),
            image: post.image.clone(),
            created_at: post.created_at,
            author_id: post.author_id,
            author_username,
            group_id: group.map(|g| g.id),
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        }
    }
}

/// In-process repository with the same semantics as the PostgreSQL one
#[derive(Default)]
pub struct MemoryBlogRepository {
    tables: RwLock<Tables>,
}

impl MemoryBlogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogRepository for MemoryBlogRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            date_joined: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group slug '{}' is already taken",
                group.slug
            )));
        }

        let created = Group {
            id: Uuid::new_v4(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.slug.cmp(&b.slug)));
        Ok(groups)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.author_id) {
            return Err(AppError::DatabaseError(format!(
                "author {} does not exist",
                post.author_id
            )));
        }

        let seq = tables.next_seq();
        let created = Post {
            id: Uuid::new_v4(),
            author_id: post.author_id,
            group_id: post.group_id,
            text: post.text,
            image: post.image,
            created_at: Utc::now(),
        };
        tables.posts.insert(created.id, (seq, created.clone()));
        Ok(created)
    }

    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let Some((_, post)) = tables.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        post.text = changes.text;
        post.group_id = changes.group_id;
        if changes.image.is_some() {
            post.image = changes.image;
        }
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let removed = tables.posts.remove(&post_id).map(|(_, post)| post);
        if removed.is_some() {
            tables.comments.retain(|(_, c)| c.post_id != post_id);
        }
        Ok(removed)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&post_id).map(|(_, post)| post.clone()))
    }

    async fn find_post_details(&self, post_id: Uuid) -> Result<Option<PostDetails>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .get(&post_id)
            .map(|(_, post)| tables.details(post)))
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostDetails>> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&(u64, Post)> = tables
            .posts
            .values()
            .filter(|(_, post)| tables.matches(post, filter))
            .collect();
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });

        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(_, post)| tables.details(post))
            .collect())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .posts
            .values()
            .filter(|(_, post)| tables.matches(post, filter))
            .count();
        Ok(count as i64)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(AppError::DatabaseError(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }

        let seq = tables.next_seq();
        let created = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: Utc::now(),
        };
        tables.comments.push((seq, created.clone()));
        Ok(created)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentDetails>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<&(u64, Comment)> = tables
            .comments
            .iter()
            .filter(|(_, c)| c.post_id == post_id)
            .collect();
        comments.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });

        Ok(comments
            .into_iter()
            .map(|(_, c)| CommentDetails {
                id: c.id,
                post_id: c.post_id,
                text: c.text.clone(),
                created_at: c.created_at,
                author_id: c.author_id,
                author_username: tables
                    .users
                    .get(&c.author_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        if user_id == author_id {
            return Err(AppError::ValidationError(
                "users cannot follow themselves".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        if tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(false);
        }

        tables.follows.push(Follow {
            id: Uuid::new_v4(),
            user_id,
            author_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() < before)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .filter(|f| f.author_id == author_id)
            .count() as i64)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().filter(|f| f.user_id == user_id).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(repo: &MemoryBlogRepository, username: &str) -> User {
        repo.create_user(NewUser {
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap()
    }

    async fn post(repo: &MemoryBlogRepository, author: &User, text: &str) -> Post {
        repo.create_post(NewPost {
            author_id: author.id,
            group_id: None,
            text: text.to_string(),
            image: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let repo = MemoryBlogRepository::new();
        user(&repo, "leo").await;
        let err = repo
            .create_user(NewUser {
                username: "leo".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_posts_listed_newest_first() {
        let repo = MemoryBlogRepository::new();
        let author = user(&repo, "leo").await;
        for i in 0..3 {
            post(&repo, &author, &format!("post {}", i)).await;
        }

        let posts = repo.list_posts(PostFilter::All, 10, 0).await.unwrap();
        let texts: Vec<_> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["post 2", "post 1", "post 0"]);
        assert_eq!(posts[0].author_username, "leo");
    }

    #[tokio::test]
    async fn test_followed_by_filter() {
        let repo = MemoryBlogRepository::new();
        let reader = user(&repo, "reader").await;
        let followed = user(&repo, "followed").await;
        let other = user(&repo, "other").await;
        post(&repo, &followed, "from followed").await;
        post(&repo, &other, "from other").await;

        assert!(repo.create_follow(reader.id, followed.id).await.unwrap());
        assert!(!repo.create_follow(reader.id, followed.id).await.unwrap());

        let feed = repo
            .list_posts(PostFilter::FollowedBy(reader.id), 10, 0)
            .await
            .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].text, "from followed");
        assert_eq!(repo.count_followers(followed.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_without_image_keeps_image() {
        let repo = MemoryBlogRepository::new();
        let author = user(&repo, "leo").await;
        let created = repo
            .create_post(NewPost {
                author_id: author.id,
                group_id: None,
                text: "before".to_string(),
                image: Some("posts/a.gif".to_string()),
            })
            .await
            .unwrap();

        let updated = repo
            .update_post(
                created.id,
                PostChanges {
                    group_id: None,
                    text: "after".to_string(),
                    image: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "after");
        assert_eq!(updated.image.as_deref(), Some("posts/a.gif"));
    }

    #[tokio::test]
    async fn test_delete_post_removes_comments() {
        let repo = MemoryBlogRepository::new();
        let author = user(&repo, "leo").await;
        let created = post(&repo, &author, "text").await;
        repo.create_comment(NewComment {
            post_id: created.id,
            author_id: author.id,
            text: "nice".to_string(),
        })
        .await
        .unwrap();

        assert!(repo.delete_post(created.id).await.unwrap().is_some());
        assert!(repo.list_comments(created.id).await.unwrap().is_empty());
        assert!(repo.delete_post(created.id).await.unwrap().is_none());
    }
}
