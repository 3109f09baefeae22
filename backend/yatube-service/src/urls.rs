//! Route paths, used for both routing and building redirect locations.
use uuid::Uuid;

pub const INDEX: &str = "/";
pub const POST_CREATE: &str = "/create/";
pub const FOLLOW_INDEX: &str = "/follow/";
pub const LOGIN: &str = "/auth/login/";
pub const SIGNUP: &str = "/auth/signup/";

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn post_detail(post_id: Uuid) -> String {
    format!("/posts/{}/", post_id)
}

/// Login page with the originally requested path in `next`. Slashes are
/// left unescaped so the location reads `/auth/login/?next=/create/`.
pub fn login_with_next(next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", LOGIN, encoded)
}

/// Only local absolute paths are accepted as post-login targets.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => INDEX.to_string(),
    }
}

/// A single leading slash, not followed by another slash or a backslash.
/// Browsers drop tabs and newlines from URLs, so control characters anywhere
/// are refused too.
fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/') | Some('\\'))
        && !path.chars().any(char::is_control)
}
