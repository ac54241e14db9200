//! Category layout rules.
//!
//! Each category maps to an ordered list of glob assertions over the
//! repository tree. The first rule that does not hold decides the failure
//! message. Adding a category only means adding a table entry here.

use globset::{GlobBuilder, GlobMatcher};

use crate::category::Category;
use crate::context::RepoTree;
use crate::error::{Result, ValidatorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    None,
    ExactlyOne,
    AtLeastOne,
}

impl Expect {
    fn holds(&self, count: usize) -> bool {
        match self {
            Expect::None => count == 0,
            Expect::ExactlyOne => count == 1,
            Expect::AtLeastOne => count > 0,
        }
    }
}

/// Patterns ending in `/` match directories, all others match files.
/// `{repo}` is replaced with the repository name.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRule {
    pub patterns: &'static [&'static str],
    pub expect: Expect,
    pub message: &'static str,
}

const fn rule(patterns: &'static [&'static str], expect: Expect, message: &'static str) -> LayoutRule {
    LayoutRule {
        patterns,
        expect,
        message,
    }
}

const NO_ROOT_PY: LayoutRule = rule(
    &["*.py"],
    Expect::None,
    "Should not be any python files in the root of the repository",
);

static APPDAEMON: &[LayoutRule] = &[
    NO_ROOT_PY,
    rule(
        &["apps/*.py"],
        Expect::None,
        "Should not be any python files in the apps directory of the repository",
    ),
    rule(
        &["apps/*/"],
        Expect::ExactlyOne,
        "Should only be one app in the apps directory of the repository",
    ),
    rule(
        &["apps/*/*.py"],
        Expect::AtLeastOne,
        "The application python files are not present in the apps/APP_NAME/ directory of the repository",
    ),
];

static INTEGRATION: &[LayoutRule] = &[
    NO_ROOT_PY,
    rule(
        &["custom_components/*.py"],
        Expect::None,
        "Should not be any python files in the custom_components directory of the repository",
    ),
    rule(
        &["custom_components/*/"],
        Expect::ExactlyOne,
        "Should only be one integration in the custom_components directory of the repository",
    ),
    rule(
        &["custom_components/*/*.py"],
        Expect::AtLeastOne,
        "The integration python files are not present in the custom_components/INTEGRATION_NAME/ directory of the repository",
    ),
];

static NETDAEMON: &[LayoutRule] = &[
    rule(
        &["*.cs"],
        Expect::None,
        "Should not be any cs files in the root of the repository",
    ),
    rule(
        &["apps/*.cs"],
        Expect::None,
        "Should not be any cs files in the apps directory of the repository",
    ),
    rule(
        &["apps/*/"],
        Expect::ExactlyOne,
        "Should only be one app in the apps directory of the repository",
    ),
    rule(
        &["apps/*/*.cs"],
        Expect::AtLeastOne,
        "The application cs files are not present in the apps/APP_NAME/ directory of the repository",
    ),
];

static PLUGIN: &[LayoutRule] = &[rule(
    &[
        "{repo}.js",
        "lovelace-{repo}.js",
        "dist/{repo}.js",
        "dist/lovelace-{repo}.js",
    ],
    Expect::ExactlyOne,
    "The plugin should follow the rules at https://hacs.xyz/docs/publish/plugin",
)];

static PYTHON_SCRIPT: &[LayoutRule] = &[
    NO_ROOT_PY,
    rule(
        &["python_scripts/*.py"],
        Expect::ExactlyOne,
        "Should only be one python file in the python_scripts directory of the repository",
    ),
];

static THEMES: &[LayoutRule] = &[
    NO_ROOT_PY,
    rule(
        &["themes/*.yaml"],
        Expect::ExactlyOne,
        "Should only be one yaml file in the themes directory of the repository",
    ),
];

pub fn rules_for(category: Category) -> &'static [LayoutRule] {
    match category {
        Category::Appdaemon => APPDAEMON,
        Category::Integration => INTEGRATION,
        Category::Netdaemon => NETDAEMON,
        Category::Plugin => PLUGIN,
        Category::PythonScript => PYTHON_SCRIPT,
        Category::Themes => THEMES,
    }
}

struct Pattern {
    matcher: GlobMatcher,
    dirs: bool,
}

fn compile(pattern: &str, repo_name: &str) -> Result<Pattern> {
    let dirs = pattern.ends_with('/');
    let expanded = pattern
        .trim_end_matches('/')
        .replace("{repo}", &globset::escape(repo_name));
    let glob = GlobBuilder::new(&expanded)
        .literal_separator(true)
        .build()
        .map_err(|e| ValidatorError::Internal {
            message: format!("invalid layout pattern {pattern:?}: {e}"),
        })?;
    Ok(Pattern {
        matcher: glob.compile_matcher(),
        dirs,
    })
}

/// Number of tree entries matched by any of `patterns`
pub fn count_matches(tree: &RepoTree, patterns: &[&str], repo_name: &str) -> Result<usize> {
    let compiled = patterns
        .iter()
        .map(|p| compile(p, repo_name))
        .collect::<Result<Vec<_>>>()?;
    Ok(tree
        .entries
        .iter()
        .filter(|entry| {
            compiled
                .iter()
                .any(|p| p.dirs == entry.is_dir && p.matcher.is_match(&entry.path))
        })
        .count())
}

/// Message of the first rule that does not hold, `None` when the layout is valid
pub fn evaluate(
    rules: &[LayoutRule],
    tree: &RepoTree,
    repo_name: &str,
) -> Result<Option<&'static str>> {
    for rule in rules {
        let count = count_matches(tree, rule.patterns, repo_name)?;
        if !rule.expect.holds(count) {
            tracing::debug!(
                "Layout rule {:?} {:?} matched {} entries",
                rule.patterns,
                rule.expect,
                count
            );
            return Ok(Some(rule.message));
        }
    }
    Ok(None)
}
