//! Fakes and fixtures shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hacs_validator::checks::Registry;
use hacs_validator::clients::{
    HostingApi, IssueComment, PackageInstaller, RepositoryMetadata, UrlProbe,
};
use hacs_validator::context::{
    CheckContext, Environment, RegistryUrls, RepoFiles, RepoSlug, Services,
};
use hacs_validator::error::{Result, ValidatorError};
use hacs_validator::executor::ExecutionPolicy;
use hacs_validator::orchestrator::Orchestrator;
use hacs_validator::requirements::RequirementSpec;
use hacs_validator::stdlib::PythonVersion;

pub const REPO: &str = "octo/demo";

/// A repository that passes every repository check
pub fn healthy_metadata() -> RepositoryMetadata {
    RepositoryMetadata {
        full_name: REPO.to_string(),
        description: Some("A demo repository".to_string()),
        archived: false,
        topics: vec!["home-assistant".to_string()],
        has_issues: true,
        fork: false,
    }
}

/// In-memory hosting API; `metadata: None` makes every repository fetch fail
#[derive(Default)]
pub struct FakeHosting {
    pub metadata: Option<RepositoryMetadata>,
    pub panic_on_fetch: bool,
    pub comments: Mutex<Vec<IssueComment>>,
    next_id: AtomicU64,
}

impl FakeHosting {
    pub fn with_metadata(metadata: RepositoryMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_fetch: true,
            ..Self::default()
        }
    }

    pub fn comment_bodies(&self) -> Vec<String> {
        self.comments
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| c.body.clone())
            .collect()
    }
}

#[async_trait]
impl HostingApi for FakeHosting {
    async fn repository(&self, _repo: &RepoSlug) -> Result<RepositoryMetadata> {
        if self.panic_on_fetch {
            panic!("metadata decoder exploded");
        }
        self.metadata.clone().ok_or_else(|| ValidatorError::Github {
            message: "GET /repos/octo/demo returned 500: upstream unavailable".to_string(),
        })
    }

    async fn list_comments(&self, _repo: &RepoSlug, _issue: u64) -> Result<Vec<IssueComment>> {
        Ok(self.comments.lock().unwrap().clone())
    }

    async fn create_comment(
        &self,
        _repo: &RepoSlug,
        _issue: u64,
        body: &str,
    ) -> Result<IssueComment> {
        let comment = IssueComment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            body: Some(body.to_string()),
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(
        &self,
        _repo: &RepoSlug,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment> {
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| ValidatorError::Github {
                message: format!("comment {comment_id} not found"),
            })?;
        comment.body = Some(body.to_string());
        Ok(comment.clone())
    }
}

/// Answers every URL with the same verdict, or fails every request
pub struct FakeProbe {
    pub listed: bool,
    pub error: Option<String>,
}

impl FakeProbe {
    pub fn listed(listed: bool) -> Self {
        Self {
            listed,
            error: None,
        }
    }

    pub fn unreachable(message: &str) -> Self {
        Self {
            listed: false,
            error: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl UrlProbe for FakeProbe {
    async fn exists(&self, url: &str) -> Result<bool> {
        match &self.error {
            Some(message) => Err(ValidatorError::Http {
                message: format!("Failed checking {url}: {message}"),
            }),
            None => Ok(self.listed),
        }
    }
}

/// Installs nothing and reports the installed packages plus `tree` as the dependency tree.
///
/// Requirements named in `failing` are rejected; those in `slow` take that long.
#[derive(Default)]
pub struct FakeInstaller {
    pub tree: Vec<String>,
    pub failing: Vec<String>,
    pub slow: Vec<(String, Duration)>,
}

#[async_trait]
impl PackageInstaller for FakeInstaller {
    async fn install(&self, requirement: &RequirementSpec) -> Result<()> {
        if let Some((_, delay)) = self.slow.iter().find(|(name, _)| *name == requirement.name) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&requirement.name) {
            return Err(ValidatorError::Subprocess {
                message: format!("pip install {} exited with 1", requirement.requirement),
            });
        }
        Ok(())
    }

    async fn dependency_tree(&self, packages: &[String]) -> Result<Vec<String>> {
        let mut all: Vec<String> = packages.to_vec();
        all.extend(self.tree.iter().cloned());
        Ok(all)
    }
}

pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

pub fn services(probe: FakeProbe, installer: FakeInstaller) -> Services {
    Services {
        probe: Arc::new(probe),
        installer: Arc::new(installer),
        urls: RegistryUrls::default(),
    }
}

pub fn context_with(repo: &str, category: &str, root: &Path, services: Services) -> CheckContext {
    let env = Environment::new(
        category,
        repo.parse::<RepoSlug>().unwrap(),
        root,
        PythonVersion::default(),
    );
    let files = RepoFiles::load(root).unwrap();
    CheckContext::new(Arc::new(env), Arc::new(files), services)
}

pub fn context(category: &str, root: &Path) -> CheckContext {
    context_with(
        REPO,
        category,
        root,
        services(FakeProbe::listed(true), FakeInstaller::default()),
    )
}

/// Orchestrator over the full registry for `ctx`
pub fn orchestrator_for(
    ctx: CheckContext,
    hosting: Arc<FakeHosting>,
    ignored: &[&str],
    check_timeout: Duration,
) -> Orchestrator {
    let registry = Arc::new(Registry::build(&ctx.env));
    let policy = ExecutionPolicy::new(ignored.iter().copied(), check_timeout);
    Orchestrator::new(registry, hosting, ctx, policy)
}

pub fn orchestrator(
    category: &str,
    root: &Path,
    hosting: Arc<FakeHosting>,
    ignored: &[&str],
) -> Orchestrator {
    orchestrator_for(
        context(category, root),
        hosting,
        ignored,
        Duration::from_secs(30),
    )
}
