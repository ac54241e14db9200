//! Check data model and the individual HACS checks

pub mod external;
pub mod files;
pub mod functionality;
pub mod manifest;
pub mod registry;
pub mod repository;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::CheckContext;
use crate::error::Result;

pub use registry::Registry;

/// What a check function reports, before the executor maps it to an outcome
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResponse {
    /// `true` passes with the check description, `false` fails with it
    Bool(bool),
    /// A failure (or neutral) message
    Message(String),
    Structured { pass: bool, message: String },
    /// Anything the executor cannot interpret
    Indeterminate(serde_json::Value),
}

impl CheckResponse {
    /// Pass when `ok`, otherwise report `message`
    pub fn pass_or(ok: bool, message: impl Into<String>) -> Self {
        if ok {
            CheckResponse::Bool(true)
        } else {
            CheckResponse::Message(message.into())
        }
    }
}

impl From<bool> for CheckResponse {
    fn from(value: bool) -> Self {
        CheckResponse::Bool(value)
    }
}

impl From<String> for CheckResponse {
    fn from(value: String) -> Self {
        CheckResponse::Message(value)
    }
}

impl From<&str> for CheckResponse {
    fn from(value: &str) -> Self {
        CheckResponse::Message(value.to_string())
    }
}

pub type CheckFuture<'a> = BoxFuture<'a, Result<CheckResponse>>;
pub type CheckFn = for<'a> fn(&'a CheckContext) -> CheckFuture<'a>;
pub type IgnoreFn = fn(&CheckContext) -> bool;

/// Wrap a synchronous check result
pub fn ready<'a>(result: Result<CheckResponse>) -> CheckFuture<'a> {
    futures_util::future::ready(result).boxed()
}

/// Ignore predicate for checks that always apply
pub fn never(_: &CheckContext) -> bool {
    false
}

/// Immutable descriptor of a single check
#[derive(Clone)]
pub struct CheckDefinition {
    pub name: &'static str,
    pub description: String,
    /// Whether the `ignore` input may suppress this check
    pub can_skip: bool,
    /// Report failures as informational
    pub neutral: bool,
    pub ignore: IgnoreFn,
    pub check: CheckFn,
    pub url: &'static str,
}

impl CheckDefinition {
    /// A skippable, non-neutral check that always applies
    pub fn new(
        name: &'static str,
        description: impl Into<String>,
        url: &'static str,
        check: CheckFn,
    ) -> Self {
        Self {
            name,
            description: description.into(),
            can_skip: true,
            neutral: false,
            ignore: never,
            check,
            url,
        }
    }

    /// Cannot be suppressed through the ignore list
    pub fn required(mut self) -> Self {
        self.can_skip = false;
        self
    }

    pub fn neutral(mut self) -> Self {
        self.neutral = true;
        self
    }

    pub fn ignore_when(mut self, ignore: IgnoreFn) -> Self {
        self.ignore = ignore;
        self
    }
}

impl fmt::Debug for CheckDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("can_skip", &self.can_skip)
            .field("neutral", &self.neutral)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Data a group needs fetched before its checks can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStrategy {
    None,
    RepositoryMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Repository,
    File,
    Json,
    External,
    Functionality,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Repository => "repository",
            GroupKind::File => "file",
            GroupKind::Json => "json",
            GroupKind::External => "external",
            GroupKind::Functionality => "functionality",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GroupKind::Repository => "Repository checks",
            GroupKind::File => "File existence checks",
            GroupKind::Json => "JSON contents checks",
            GroupKind::External => "External repo checks",
            GroupKind::Functionality => "Functionality checks",
        }
    }

    pub fn strategy(&self) -> ContextStrategy {
        match self {
            GroupKind::Repository => ContextStrategy::RepositoryMetadata,
            _ => ContextStrategy::None,
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered checks sharing one context-fetch strategy
#[derive(Debug, Clone)]
pub struct CheckGroup {
    pub kind: GroupKind,
    pub description: &'static str,
    pub strategy: ContextStrategy,
    pub checks: Vec<CheckDefinition>,
}

impl CheckGroup {
    pub fn new(kind: GroupKind, checks: Vec<CheckDefinition>) -> Self {
        Self {
            kind,
            description: kind.description(),
            strategy: kind.strategy(),
            checks,
        }
    }
}
