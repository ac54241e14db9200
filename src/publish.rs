//! Idempotent pull request comment

use tracing::info;

use crate::clients::traits::HostingApi;
use crate::context::RepoSlug;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Created(u64),
    Updated(u64),
}

/// Update the first comment containing `marker`, or create one.
///
/// `body` is expected to contain `marker` itself so later runs find it.
pub async fn upsert_comment(
    api: &dyn HostingApi,
    repo: &RepoSlug,
    pull_request: u64,
    marker: &str,
    body: &str,
) -> Result<CommentAction> {
    let comments = api.list_comments(repo, pull_request).await?;
    let existing = comments
        .iter()
        .find(|c| c.body.as_deref().is_some_and(|b| b.contains(marker)));

    match existing {
        Some(comment) => {
            let updated = api.update_comment(repo, comment.id, body).await?;
            info!("Updated comment {} on {}#{}", updated.id, repo, pull_request);
            Ok(CommentAction::Updated(updated.id))
        }
        None => {
            let created = api.create_comment(repo, pull_request, body).await?;
            info!("Created comment {} on {}#{}", created.id, repo, pull_request);
            Ok(CommentAction::Created(created.id))
        }
    }
}
