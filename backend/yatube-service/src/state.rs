use std::sync::Arc;

use crate::auth::TokenService;
use crate::cache::PageCache;
use crate::db::BlogRepository;
use crate::media::MediaStorage;
use crate::services::{
    CommentService, FollowService, GroupService, PostService, PostServiceConfig, UserService,
};

/// Shared application state handed to every handler through `web::Data`.
pub struct AppState {
    pub posts: PostService,
    pub comments: CommentService,
    pub follows: FollowService,
    pub users: UserService,
    pub groups: GroupService,
    pub repo: Arc<dyn BlogRepository>,
    pub page_cache: Arc<dyn PageCache>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn BlogRepository>,
        page_cache: Arc<dyn PageCache>,
        media: Arc<MediaStorage>,
        tokens: Arc<TokenService>,
        config: PostServiceConfig,
    ) -> Self {
        let posts_per_page = config.posts_per_page;
        Self {
            posts: PostService::new(repo.clone(), page_cache.clone(), media.clone(), config),
            comments: CommentService::new(repo.clone()),
            follows: FollowService::new(repo.clone(), media, posts_per_page),
            users: UserService::new(repo.clone(), tokens.clone()),
            groups: GroupService::new(repo.clone()),
            repo,
            page_cache,
            tokens,
        }
    }
}
