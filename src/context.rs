//! Values shared by every check in a run.
//!
//! Everything here is loaded once before the first check executes and is
//! handed to the checks as immutable data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use walkdir::WalkDir;

use crate::category::Category;
use crate::clients::traits::{PackageInstaller, RepositoryMetadata, UrlProbe};
use crate::error::{Result, ValidatorError};
use crate::stdlib::PythonVersion;

/// `owner/repo` identity of the repository under validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoSlug {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ValidatorError::Config {
                message: format!("repository must look like 'owner/repo', got '{}'", s),
            }),
        }
    }
}

/// Ambient inputs of a run that ignore predicates and checks read
#[derive(Debug, Clone)]
pub struct Environment {
    /// Category exactly as supplied, kept for messages
    pub category_input: String,
    /// `None` when the supplied category is not recognized
    pub category: Option<Category>,
    pub repository: RepoSlug,
    pub workspace: PathBuf,
    pub python_version: PythonVersion,
}

impl Environment {
    pub fn new(
        category_input: impl Into<String>,
        repository: RepoSlug,
        workspace: impl Into<PathBuf>,
        python_version: PythonVersion,
    ) -> Self {
        let category_input = category_input.into();
        let category = category_input.parse::<Category>().ok();
        Self {
            category_input,
            category,
            repository,
            workspace: workspace.into(),
            python_version,
        }
    }

    pub fn is_category(&self, category: Category) -> bool {
        self.category == Some(category)
    }
}

/// One non-hidden entry of the repository working tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the repository root, `/` separated
    pub path: String,
    pub is_dir: bool,
}

impl TreeEntry {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn is_top_level(&self) -> bool {
        !self.path.contains('/')
    }
}

/// Snapshot of the repository layout
#[derive(Debug, Clone, Default)]
pub struct RepoTree {
    pub entries: Vec<TreeEntry>,
}

impl RepoTree {
    /// Walk `root`, skipping hidden files and directories
    pub fn scan(root: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry.map_err(|e| ValidatorError::Io {
                message: format!("failed to scan {}: {}", root.display(), e),
            })?;
            let rel = entry.path().strip_prefix(root).map_err(|e| ValidatorError::Io {
                message: e.to_string(),
            })?;
            let path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            entries.push(TreeEntry {
                path,
                is_dir: entry.file_type().is_dir(),
            });
        }

        Ok(Self { entries })
    }

    pub fn files(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(|e| !e.is_dir)
    }

    /// Case-insensitive lookup of a file in the repository root
    pub fn find_top_level_file(&self, wanted: &str) -> Option<&TreeEntry> {
        self.files()
            .filter(|e| e.is_top_level())
            .find(|e| e.path.eq_ignore_ascii_case(wanted))
    }
}

/// A configuration file that may be absent or unparsable
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    Found(T),
    Missing,
    Invalid(String),
}

impl<T> Loaded<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Loaded::Found(v) => Some(v),
            _ => None,
        }
    }
}

/// The README/INFO file shown to users in HACS
#[derive(Debug, Clone, PartialEq)]
pub struct InfoFile {
    pub name: String,
    pub content: String,
}

/// Repository files the checks inspect, read once per run
#[derive(Debug, Clone)]
pub struct RepoFiles {
    pub tree: RepoTree,
    pub manifest: Loaded<Map<String, Value>>,
    pub hacs_config: Loaded<Map<String, Value>>,
    pub info_file: Option<InfoFile>,
}

impl RepoFiles {
    pub fn load(root: &Path) -> Result<Self> {
        let tree = RepoTree::scan(root)?;

        let manifests: Vec<&TreeEntry> = tree
            .files()
            .filter(|e| e.file_name() == "manifest.json")
            .collect();
        let manifest = match manifests.as_slice() {
            [only] => read_json_object(&root.join(&only.path)),
            [] => Loaded::Missing,
            many => {
                tracing::warn!(
                    "Found {} manifest.json files, expected exactly one",
                    many.len()
                );
                Loaded::Missing
            }
        };

        let hacs_config = if tree.files().any(|e| e.path == "hacs.json") {
            read_json_object(&root.join("hacs.json"))
        } else {
            Loaded::Missing
        };

        let render_readme = hacs_config
            .found()
            .and_then(|c| c.get("render_readme"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let candidates: [&str; 2] = if render_readme {
            ["README.md", "README"]
        } else {
            ["INFO.md", "INFO"]
        };
        let info_file = candidates
            .iter()
            .find_map(|name| tree.find_top_level_file(name))
            .map(|entry| {
                let content = std::fs::read_to_string(root.join(&entry.path)).unwrap_or_else(|e| {
                    tracing::warn!("Could not read {}: {}", entry.path, e);
                    String::new()
                });
                InfoFile {
                    name: entry.path.clone(),
                    content,
                }
            });

        Ok(Self {
            tree,
            manifest,
            hacs_config,
            info_file,
        })
    }

    /// `requirements` declared in manifest.json
    pub fn requirements(&self) -> Vec<String> {
        self.manifest
            .found()
            .and_then(|m| m.get("requirements"))
            .and_then(Value::as_array)
            .map(|reqs| {
                reqs.iter()
                    .map(|r| match r {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn manifest_domain(&self) -> Option<&str> {
        self.manifest
            .found()
            .and_then(|m| m.get("domain"))
            .and_then(Value::as_str)
    }
}

fn read_json_object(path: &Path) -> Loaded<Map<String, Value>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => return Loaded::Invalid(e.to_string()),
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Loaded::Found(map),
        Ok(_) => Loaded::Invalid("expected a JSON object".to_string()),
        Err(e) => Loaded::Invalid(e.to_string()),
    }
}

/// URL templates for the external registries
#[derive(Debug, Clone)]
pub struct RegistryUrls {
    pub brands_template: String,
    pub wheels_template: String,
}

impl RegistryUrls {
    pub fn brands(&self, domain: &str) -> String {
        self.brands_template.replace("{domain}", domain)
    }

    pub fn wheels(&self, domain: &str) -> String {
        self.wheels_template.replace("{domain}", domain)
    }
}

impl Default for RegistryUrls {
    fn default() -> Self {
        let defaults = crate::config::ValidationConfig::default();
        Self {
            brands_template: defaults.brands_url_template,
            wheels_template: defaults.wheels_url_template,
        }
    }
}

/// Side-effecting collaborators available to checks
#[derive(Clone)]
pub struct Services {
    pub probe: Arc<dyn UrlProbe>,
    pub installer: Arc<dyn PackageInstaller>,
    pub urls: RegistryUrls,
}

/// Everything a check may look at
#[derive(Clone)]
pub struct CheckContext {
    pub env: Arc<Environment>,
    pub files: Arc<RepoFiles>,
    pub services: Services,
    /// Present only for groups that fetch repository metadata
    pub repository: Option<Arc<RepositoryMetadata>>,
    /// When the executor gives up on the running check
    pub deadline: Option<Instant>,
}

impl CheckContext {
    pub fn new(env: Arc<Environment>, files: Arc<RepoFiles>, services: Services) -> Self {
        Self {
            env,
            files,
            services,
            repository: None,
            deadline: None,
        }
    }

    pub fn with_repository(&self, metadata: RepositoryMetadata) -> Self {
        Self {
            repository: Some(Arc::new(metadata)),
            ..self.clone()
        }
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Time left before the deadline, `None` when the check is unbounded
    pub fn time_left(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn repository(&self) -> Result<&RepositoryMetadata> {
        self.repository
            .as_deref()
            .ok_or_else(|| ValidatorError::Internal {
                message: "repository metadata was not fetched for this group".into(),
            })
    }
}
