//! Parser for the requirement strings integrations declare in manifest.json.
//!
//! Accepts the subset of pip requirement syntax HACS integrations use:
//! optional leading `--flag` / `--flag=value` install options, a distribution
//! name, optional extras, and an optional version specifier or marker.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?P<extras>\[[^\]]*\])?\s*(?P<rest>.*)$",
    )
    .expect("requirement name regex should compile")
});

const SPECIFIER_PREFIXES: &[&str] = &["==", "!=", ">=", "<=", "~=", ">", "<", ";", "@"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementSpec {
    /// The string exactly as declared
    pub raw: String,
    /// Options passed to the installer before the requirement
    pub install_args: Vec<String>,
    /// Requirement without the install options, e.g. `aiohttp[speedups]>=3.8`
    pub requirement: String,
    /// Distribution name as written
    pub name: String,
}

impl RequirementSpec {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut install_args = Vec::new();
        let mut tokens = raw.split_whitespace().peekable();
        while let Some(token) = tokens.peek() {
            if token.starts_with("--") && token.len() > 2 {
                install_args.push(token.to_string());
                tokens.next();
            } else {
                break;
            }
        }
        let requirement = tokens.collect::<Vec<_>>().join(" ");
        let caps = NAME_RE.captures(&requirement)?;
        let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or_default();
        if !rest.is_empty() && !SPECIFIER_PREFIXES.iter().any(|p| rest.starts_with(p)) {
            return None;
        }
        let name = caps.name("name")?.as_str().to_string();

        Some(Self {
            raw: raw.to_string(),
            install_args,
            requirement,
            name,
        })
    }

    /// Name in the form dependency tree tools report it: lowercase, `_` as `-`
    pub fn normalized_name(&self) -> String {
        self.name.to_ascii_lowercase().replace('_', "-")
    }
}
