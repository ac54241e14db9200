use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::RepoSlug;
use crate::error::Result;
use crate::requirements::RequirementSpec;

/// Subset of `GET /repos/{owner}/{repo}` the repository checks read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub has_issues: bool,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
}

/// Repository hosting provider API
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn repository(&self, repo: &RepoSlug) -> Result<RepositoryMetadata>;

    /// All comments on an issue or pull request, across every page
    async fn list_comments(&self, repo: &RepoSlug, issue: u64) -> Result<Vec<IssueComment>>;

    async fn create_comment(&self, repo: &RepoSlug, issue: u64, body: &str)
    -> Result<IssueComment>;

    async fn update_comment(
        &self,
        repo: &RepoSlug,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment>;
}

/// Reachability check for registry URLs
#[async_trait]
pub trait UrlProbe: Send + Sync {
    /// `Ok(false)` for a definitive non-success status, `Err` when the request itself failed
    async fn exists(&self, url: &str) -> Result<bool>;
}

/// Python package manager used by the requirements check
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install(&self, requirement: &RequirementSpec) -> Result<()>;

    /// Every distribution name in the dependency tree of `packages`, roots included
    async fn dependency_tree(&self, packages: &[String]) -> Result<Vec<String>>;
}
