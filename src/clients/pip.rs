use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::clients::traits::PackageInstaller;
use crate::error::{Result, ValidatorError};
use crate::requirements::RequirementSpec;

const STDERR_SNIPPET_CHARS: usize = 500;

/// Installs requirements with pip and inspects them with pipdeptree
#[derive(Debug)]
pub struct PipInstaller {
    pip: String,
    pipdeptree: String,
    index_url: String,
    extra_index_url: String,
    timeout: Duration,
    tree_tool: OnceCell<()>,
}

#[derive(Debug, Deserialize)]
struct TreeNode {
    key: String,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    package: TreeNode,
    #[serde(default)]
    dependencies: Vec<TreeNode>,
}

impl PipInstaller {
    pub fn new(
        pip: impl Into<String>,
        pipdeptree: impl Into<String>,
        index_url: impl Into<String>,
        extra_index_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            pip: pip.into(),
            pipdeptree: pipdeptree.into(),
            index_url: index_url.into(),
            extra_index_url: extra_index_url.into(),
            timeout,
            tree_tool: OnceCell::new(),
        }
    }

    async fn run(&self, program: &str, args: &[String], operation: &str) -> Result<String> {
        debug!("Running {} {}", program, args.join(" "));
        let mut cmd = Command::new(program);
        cmd.args(args)
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ValidatorError::Timeout {
                operation: operation.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|e| map_spawn_err(program, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ValidatorError::Subprocess {
                message: format!(
                    "{} exited with {}: {}",
                    operation,
                    output.status,
                    truncate_snippet(stderr.trim(), STDERR_SNIPPET_CHARS)
                ),
            });
        }
        Ok(stdout)
    }

    async fn ensure_tree_tool(&self) -> Result<()> {
        self.tree_tool
            .get_or_try_init(|| async {
                info!("Installing pipdeptree");
                let args = vec![
                    "--disable-pip-version-check".to_string(),
                    "install".to_string(),
                    "--quiet".to_string(),
                    "pipdeptree".to_string(),
                ];
                self.run(&self.pip, &args, "pip install pipdeptree")
                    .await
                    .map(|_| ())
            })
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl PackageInstaller for PipInstaller {
    async fn install(&self, requirement: &RequirementSpec) -> Result<()> {
        let mut args = vec![
            "--disable-pip-version-check".to_string(),
            "install".to_string(),
            "--quiet".to_string(),
            "--no-warn-script-location".to_string(),
            "--index-url".to_string(),
            self.index_url.clone(),
            "--extra-index-url".to_string(),
            self.extra_index_url.clone(),
        ];
        args.extend(requirement.install_args.iter().cloned());
        args.push(requirement.requirement.clone());

        self.run(&self.pip, &args, &format!("pip install {}", requirement.requirement))
            .await
            .map(|_| ())
    }

    async fn dependency_tree(&self, packages: &[String]) -> Result<Vec<String>> {
        self.ensure_tree_tool().await?;
        let args = vec![
            "-w".to_string(),
            "silence".to_string(),
            "--packages".to_string(),
            packages.join(","),
            "--json".to_string(),
        ];
        let stdout = self.run(&self.pipdeptree, &args, "pipdeptree").await?;
        parse_dependency_tree(&stdout)
    }
}

/// Flatten `pipdeptree --json` output into the distinct package keys it mentions
pub fn parse_dependency_tree(raw: &str) -> Result<Vec<String>> {
    let entries: Vec<TreeEntry> = serde_json::from_str(raw)?;
    let keys: BTreeSet<String> = entries
        .into_iter()
        .flat_map(|e| std::iter::once(e.package).chain(e.dependencies))
        .map(|node| node.key)
        .collect();
    Ok(keys.into_iter().collect())
}

fn map_spawn_err(program: &str, err: std::io::Error) -> ValidatorError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ValidatorError::Subprocess {
            message: format!("{program} executable not found"),
        }
    } else {
        ValidatorError::Subprocess {
            message: format!("failed to spawn {program}: {err}"),
        }
    }
}

fn truncate_snippet(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_keys_include_roots_and_dependencies() {
        let raw = r#"[
            {"package": {"key": "aiohttp", "package_name": "aiohttp", "installed_version": "3.8.1"},
             "dependencies": [
                {"key": "yarl", "package_name": "yarl", "installed_version": "1.8", "required_version": ">=1.0"},
                {"key": "typing", "package_name": "typing", "installed_version": "3.7", "required_version": null}
             ]},
            {"package": {"key": "yarl", "package_name": "yarl", "installed_version": "1.8"},
             "dependencies": []}
        ]"#;
        assert_eq!(
            parse_dependency_tree(raw).unwrap(),
            vec!["aiohttp", "typing", "yarl"]
        );
    }

    #[test]
    fn malformed_tree_is_an_error() {
        assert!(parse_dependency_tree("not json").is_err());
    }

    #[test]
    fn snippets_are_truncated_on_char_boundaries() {
        assert_eq!(truncate_snippet("ééé", 2), "éé…");
        assert_eq!(truncate_snippet("ok", 5), "ok");
    }

    #[tokio::test]
    async fn missing_executable_maps_to_subprocess_error() {
        let pip = PipInstaller::new(
            "definitely-not-a-real-pip-binary",
            "pipdeptree",
            "https://example.invalid/simple",
            "https://example.invalid/extra",
            Duration::from_secs(5),
        );
        let spec = RequirementSpec::parse("requests").unwrap();
        let err = pip.install(&spec).await.unwrap_err().to_string();
        assert!(err.contains("executable not found"), "{err}");
    }
}
