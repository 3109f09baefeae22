/// Data models for yatube-service
///
/// Row types map one-to-one onto tables. `*Details` types are the joined
/// read models that page contexts are built from.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of characters of a post shown by its `Display` impl.
pub const POST_PREVIEW_LEN: usize = 15;

/// Registered author / reader
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// "First Last", or the username when no name was given.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Community a post can be published in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    /// Path relative to the media root, e.g. `posts/<uuid>.gif`
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(POST_PREVIEW_LEN).collect();
        f.write_str(&preview)
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    pub image: Option<String>,
}

/// Replacement values for an edited post. `image: None` keeps the current image.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub group_id: Option<Uuid>,
    pub text: String,
    pub image: Option<String>,
}

/// Post joined with its author and group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostDetails {
    pub id: Uuid,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<Uuid>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(POST_PREVIEW_LEN).collect();
        f.write_str(&preview)
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentDetails {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
}

/// Subscription edge: `user_id` follows `author_id`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Public author card shown on the profile page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub date_joined: DateTime<Utc>,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

/// Which posts a listing is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts by authors that this user follows
    FollowedBy(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(text: &str) -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            group_id: None,
            text: text.to_string(),
            image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_post_display_is_truncated() {
        let post = sample_post("A test post written by a test user in a test group");
        assert_eq!(post.to_string(), "A test post wri");
        assert_eq!(post.to_string().chars().count(), POST_PREVIEW_LEN);
    }

    #[test]
    fn test_post_display_counts_characters_not_bytes() {
        let post = sample_post("Тестовый пост тестового пользователя");
        assert_eq!(post.to_string(), "Тестовый пост т");
    }

    #[test]
    fn test_short_post_display_is_whole_text() {
        assert_eq!(sample_post("short").to_string(), "short");
    }

    #[test]
    fn test_group_display_is_title() {
        let group = Group {
            id: Uuid::new_v4(),
            title: "Test group".to_string(),
            slug: "test_slug".to_string(),
            description: "Test description".to_string(),
        };
        assert_eq!(group.to_string(), "Test group");
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        let mut user = User {
            id: Uuid::new_v4(),
            username: "leo".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            date_joined: Utc::now(),
        };
        assert_eq!(user.full_name(), "leo");

        user.first_name = "Leo".to_string();
        user.last_name = "Tolstoy".to_string();
        assert_eq!(user.full_name(), "Leo Tolstoy");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "leo".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: "secret-hash".to_string(),
            date_joined: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
