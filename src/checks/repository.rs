//! Checks over the repository metadata returned by the hosting API

use super::{CheckDefinition, CheckFuture, CheckResponse, ready};
use crate::context::CheckContext;

const URL_REPOSITORY: &str = "https://hacs.xyz/docs/publish/include#check-repository";
const URL_ARCHIVED: &str = "https://hacs.xyz/docs/publish/include#check-archived";

/// The repository HACS itself publishes from; forks are only flagged there
const HACS_DEFAULT: &str = "hacs/default";

pub fn checks() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition::new(
            "description",
            "The repository has a description",
            URL_REPOSITORY,
            description,
        ),
        CheckDefinition::new(
            "archived",
            "The repository is not archived",
            URL_ARCHIVED,
            archived,
        ),
        CheckDefinition::new("topics", "The repository has topics", URL_REPOSITORY, topics),
        CheckDefinition::new(
            "issues",
            "The repository has issues enabled",
            URL_REPOSITORY,
            issues,
        ),
        CheckDefinition::new("fork", "The repository is not a fork", URL_REPOSITORY, fork)
            .neutral()
            .ignore_when(not_hacs_default),
    ]
}

fn not_hacs_default(ctx: &CheckContext) -> bool {
    ctx.env.repository.to_string() != HACS_DEFAULT
}

fn description(ctx: &CheckContext) -> CheckFuture<'_> {
    ready(ctx.repository().map(|repo| {
        let present = repo
            .description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty());
        CheckResponse::Bool(present)
    }))
}

fn archived(ctx: &CheckContext) -> CheckFuture<'_> {
    ready(
        ctx.repository()
            .map(|repo| CheckResponse::pass_or(!repo.archived, "The repository is archived")),
    )
}

fn topics(ctx: &CheckContext) -> CheckFuture<'_> {
    ready(ctx.repository().map(|repo| {
        CheckResponse::pass_or(!repo.topics.is_empty(), "The repository is missing topics")
    }))
}

fn issues(ctx: &CheckContext) -> CheckFuture<'_> {
    ready(ctx.repository().map(|repo| {
        CheckResponse::pass_or(repo.has_issues, "The repository does not have issues enabled")
    }))
}

fn fork(ctx: &CheckContext) -> CheckFuture<'_> {
    ready(
        ctx.repository()
            .map(|repo| CheckResponse::pass_or(!repo.fork, "The repository is a fork")),
    )
}
