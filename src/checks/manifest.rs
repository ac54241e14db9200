//! JSON contents checks: manifest.json, hacs.json and integration requirements

use futures_util::FutureExt;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::{CheckDefinition, CheckFuture, CheckResponse, ready};
use crate::category::Category;
use crate::context::{CheckContext, Loaded};
use crate::requirements::RequirementSpec;
use crate::stdlib::shadows_stdlib;

const URL_MANIFEST: &str = "https://hacs.xyz/docs/publish/include#check-manifest";
const URL_HACS_MANIFEST: &str = "https://hacs.xyz/docs/publish/include#check-hacs-manifest";
const URL_REQUIREMENTS: &str = "https://hacs.xyz/docs/publish/include#check-requirements";

/// Part of the check's remaining time that installs may use; the rest is for the dependency tree
const INSTALL_SHARE: f64 = 0.75;

pub const REQUIRED_MANIFEST_KEYS: &[&str] = &[
    "issue_tracker",
    "domain",
    "documentation",
    "codeowners",
    "version",
];

pub fn checks() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition::new(
            "manifest",
            "All required keys are present in manifest.json",
            URL_MANIFEST,
            manifest,
        )
        .required(),
        CheckDefinition::new(
            "hacsjson",
            "hacs.json has the 'name' key set",
            URL_HACS_MANIFEST,
            hacs_json,
        ),
        CheckDefinition::new(
            "requirements",
            "Requirements validation",
            URL_REQUIREMENTS,
            requirements,
        )
        .ignore_when(no_integration_requirements),
    ]
}

/// Shared by the requirements and wheels checks
pub fn no_integration_requirements(ctx: &CheckContext) -> bool {
    !ctx.env.is_category(Category::Integration) || ctx.files.requirements().is_empty()
}

fn manifest(ctx: &CheckContext) -> CheckFuture<'_> {
    let response = match &ctx.files.manifest {
        Loaded::Found(manifest) => {
            let missing: Vec<&str> = REQUIRED_MANIFEST_KEYS
                .iter()
                .copied()
                .filter(|key| !manifest.contains_key(*key))
                .collect();
            if missing.is_empty() {
                CheckResponse::Bool(true)
            } else {
                CheckResponse::Message(format!(
                    "manifest.json is missing the key(s): {}",
                    missing.join(", ")
                ))
            }
        }
        Loaded::Missing => CheckResponse::Message("manifest.json file not found".to_string()),
        Loaded::Invalid(reason) => {
            CheckResponse::Message(format!("manifest.json could not be parsed: {reason}"))
        }
    };
    ready(Ok(response))
}

fn hacs_json(ctx: &CheckContext) -> CheckFuture<'_> {
    let response = match &ctx.files.hacs_config {
        Loaded::Found(config) => {
            CheckResponse::pass_or(has_name(config), "Missing 'name' from hacs.json")
        }
        Loaded::Missing => CheckResponse::Message(
            "hacs.json file not found in the root of the repository".to_string(),
        ),
        Loaded::Invalid(reason) => {
            CheckResponse::Message(format!("hacs.json could not be parsed: {reason}"))
        }
    };
    ready(Ok(response))
}

/// `name` is present and not the empty string; other value types are accepted
pub fn has_name(config: &Map<String, Value>) -> bool {
    config
        .get("name")
        .is_some_and(|name| name.as_str() != Some(""))
}

fn requirements(ctx: &CheckContext) -> CheckFuture<'_> {
    async move {
        let installer = &ctx.services.installer;
        let mut failed = Vec::new();
        let mut installed = Vec::new();

        // Installs stop early enough to report which requirements did not make it
        let install_until = ctx
            .time_left()
            .map(|left| Instant::now() + left.mul_f64(INSTALL_SHARE));

        let mut pending = ctx.files.requirements().into_iter();
        while let Some(raw) = pending.next() {
            let Some(spec) = RequirementSpec::parse(&raw) else {
                failed.push(raw);
                continue;
            };
            info!("Installing requirement {}", spec.requirement);
            let install = installer.install(&spec);
            let result = match install_until {
                Some(until) => match tokio::time::timeout_at(until, install).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            "Ran out of time installing {}, skipping the remaining requirements",
                            spec.requirement
                        );
                        failed.push(raw);
                        failed.extend(pending.by_ref());
                        break;
                    }
                },
                None => install.await,
            };
            match result {
                Ok(()) => installed.push(spec),
                Err(e) => {
                    error!("pip failed with: {}", e);
                    failed.push(raw);
                }
            }
        }

        if !failed.is_empty() {
            return Ok(CheckResponse::Message(format!(
                "These requirement(s) failed to parse or install: {}",
                failed.join(", ")
            )));
        }

        let names: Vec<String> = installed.iter().map(RequirementSpec::normalized_name).collect();
        let tree = installer.dependency_tree(&names).await?;
        let conflicts: Vec<String> = tree
            .into_iter()
            .filter(|package| shadows_stdlib(package, ctx.env.python_version))
            .collect();

        if conflicts.is_empty() {
            Ok(CheckResponse::Bool(true))
        } else {
            Ok(CheckResponse::Message(format!(
                "Packages: {} are not compatible with Python standard libraries",
                conflicts.join(", ")
            )))
        }
    }
    .boxed()
}
