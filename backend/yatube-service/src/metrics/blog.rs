use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "yatube_posts_created_total",
        "Total posts created"
    )
    .expect("failed to register yatube_posts_created_total");

    /// Post edits and deletions (edit/delete).
    pub static ref POST_CHANGES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "yatube_post_changes_total",
        "Post modifications segmented by action",
        &["action"]
    )
    .expect("failed to register yatube_post_changes_total");

    pub static ref COMMENTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "yatube_comments_created_total",
        "Total comments created"
    )
    .expect("failed to register yatube_comments_created_total");

    /// Follow edge changes (follow/unfollow/ignored).
    pub static ref FOLLOW_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "yatube_follow_events_total",
        "Follow events segmented by action",
        &["action"]
    )
    .expect("failed to register yatube_follow_events_total");

    /// Index page cache events (hit/miss/error).
    pub static ref PAGE_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "yatube_page_cache_events_total",
        "Page cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register yatube_page_cache_events_total");
}
