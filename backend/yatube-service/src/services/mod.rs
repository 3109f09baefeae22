/// Business logic layer
///
/// Services own the rules behind each page and form. Handlers only translate
/// HTTP requests into service calls and service outcomes into responses.
use serde::Serialize;

use crate::db::BlogRepository;
use crate::error::Result;
use crate::media::MediaStorage;
use crate::models::{PostDetails, PostFilter};
use crate::pagination::{Page, Paginator};

pub mod comments;
pub mod follows;
pub mod groups;
pub mod posts;
pub mod users;

pub use comments::CommentService;
pub use follows::{FollowOutcome, FollowService};
pub use groups::GroupService;
pub use posts::{DeleteOutcome, EditOutcome, PostService, PostServiceConfig};
pub use users::UserService;

/// A post as shown in listings and on its detail page
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    #[serde(flatten)]
    pub post: PostDetails,
    pub image_url: Option<String>,
}

impl PostCard {
    pub fn new(post: PostDetails, media: &MediaStorage) -> Self {
        let image_url = post.image.as_deref().map(|name| media.url(name));
        Self { post, image_url }
    }
}

/// Load one page of posts for a listing.
pub(crate) async fn paginate_posts(
    repo: &dyn BlogRepository,
    media: &MediaStorage,
    filter: PostFilter,
    raw_page: Option<&str>,
    per_page: usize,
) -> Result<Page<PostCard>> {
    let count = repo.count_posts(filter).await?;
    let paginator = Paginator::new(count.max(0) as usize, per_page);
    let number = paginator.get_page(raw_page);
    let (offset, limit) = paginator.bounds(number);

    let posts = repo
        .list_posts(filter, limit as i64, offset as i64)
        .await?
        .into_iter()
        .map(|post| PostCard::new(post, media))
        .collect();

    Ok(paginator.page(number, posts))
}
