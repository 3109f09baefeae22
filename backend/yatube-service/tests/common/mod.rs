//! Shared fixtures for the HTTP integration tests.
//!
//! Every test gets its own in-memory repository, in-process page cache and
//! temporary media root, so tests never share state.
#![allow(dead_code)]

use actix_web::{http::header, web};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;
use yatube_service::auth::TokenService;
use yatube_service::cache::LocalPageCache;
use yatube_service::db::{BlogRepository, MemoryBlogRepository};
use yatube_service::media::MediaStorage;
use yatube_service::models::{Group, NewGroup, NewPost, NewUser, Post, User};
use yatube_service::services::PostServiceConfig;
use yatube_service::AppState;

pub const BOUNDARY: &str = "----yatube-test-boundary";

// 1x1 transparent GIF
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04,
    0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02,
    0x00, 0x3b,
];

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub repo: Arc<MemoryBlogRepository>,
    pub cache: Arc<LocalPageCache>,
    pub tokens: Arc<TokenService>,
    pub media: Arc<MediaStorage>,
    pub media_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let repo = Arc::new(MemoryBlogRepository::new());
        let cache = Arc::new(LocalPageCache::new());
        let tokens = Arc::new(TokenService::new("test-secret", 3600));
        let media_dir = tempfile::tempdir().expect("create media dir");
        let media = Arc::new(MediaStorage::new(media_dir.path(), "/media/"));

        let state = web::Data::new(AppState::new(
            repo.clone(),
            cache.clone(),
            media.clone(),
            tokens.clone(),
            PostServiceConfig::default(),
        ));

        Self {
            state,
            repo,
            cache,
            tokens,
            media,
            media_dir,
        }
    }

    pub async fn create_user(&self, username: &str) -> User {
        self.repo
            .create_user(NewUser {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{}@yatube.test", username),
                password_hash: "not-used".to_string(),
            })
            .await
            .expect("create user")
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        self.repo
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: "Test description".to_string(),
            })
            .await
            .expect("create group")
    }

    pub async fn create_post(&self, author: &User, group: Option<&Group>, text: &str) -> Post {
        self.repo
            .create_post(NewPost {
                author_id: author.id,
                group_id: group.map(|g| g.id),
                text: text.to_string(),
                image: None,
            })
            .await
            .expect("create post")
    }

    /// `Authorization` header for `user`
    pub fn auth(&self, user: &User) -> (header::HeaderName, String) {
        let token = self
            .tokens
            .issue(user.id, &user.username)
            .expect("issue token");
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }
}

/// Build the full service with authentication, like `main` does.
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .wrap(yatube_service::middleware::AuthenticationMiddleware::new(
                    $ctx.tokens.clone(),
                ))
                .configure(yatube_service::handlers::configure),
        )
        .await
    };
}

/// Encode text fields and an optional file as `multipart/form-data`.
///
/// Returns the `Content-Type` header value and the body.
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/gif\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

pub fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn random_id() -> Uuid {
    Uuid::new_v4()
}
