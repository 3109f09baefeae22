use std::sync::Arc;
use tracing::info;

use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::models::{Group, NewGroup};

const MAX_SLUG_LEN: usize = 50;
const MAX_TITLE_LEN: usize = 200;

/// Group administration. Groups are created by operators, not through the web UI.
#[derive(Clone)]
pub struct GroupService {
    repo: Arc<dyn BlogRepository>,
}

impl GroupService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_group(&self, slug: &str, title: &str, description: &str) -> Result<Group> {
        let slug = slug.trim();
        let title = title.trim();

        if !is_valid_slug(slug) {
            return Err(AppError::ValidationError(format!(
                "slug must be 1-{} letters, digits, hyphens or underscores: '{}'",
                MAX_SLUG_LEN, slug
            )));
        }
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::ValidationError(format!(
                "title must be 1-{} characters",
                MAX_TITLE_LEN
            )));
        }

        let group = self
            .repo
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: description.trim().to_string(),
            })
            .await?;

        info!(group_id = %group.id, slug = %group.slug, "Group created");
        Ok(group)
    }
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
