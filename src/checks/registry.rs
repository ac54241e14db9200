//! The table of check groups run for every repository

use super::{CheckDefinition, CheckGroup, GroupKind};
use super::{external, files, functionality, manifest, repository};
use crate::context::Environment;

/// All check groups, in declaration order.
///
/// Built once per run before any check executes and only read afterwards.
#[derive(Debug, Clone)]
pub struct Registry {
    groups: Vec<CheckGroup>,
}

impl Registry {
    pub fn build(env: &Environment) -> Self {
        Self::from_groups(vec![
            CheckGroup::new(GroupKind::Repository, repository::checks()),
            CheckGroup::new(GroupKind::File, files::checks()),
            CheckGroup::new(GroupKind::Json, manifest::checks()),
            CheckGroup::new(GroupKind::External, external::checks(&env.repository)),
            CheckGroup::new(GroupKind::Functionality, functionality::checks()),
        ])
    }

    pub fn from_groups(groups: Vec<CheckGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[CheckGroup] {
        &self.groups
    }

    pub fn checks(&self) -> impl Iterator<Item = &CheckDefinition> {
        self.groups.iter().flat_map(|g| g.checks.iter())
    }

    pub fn find(&self, name: &str) -> Option<&CheckDefinition> {
        self.checks().find(|c| c.name == name)
    }

    /// Closest known check name for a misspelt ignore entry
    pub fn suggest(&self, unknown: &str) -> Option<&'static str> {
        let wanted = unknown.to_lowercase();
        self.checks()
            .map(|c| (c.name, strsim::levenshtein(&wanted, c.name)))
            .filter(|(_, distance)| *distance <= 3)
            .min_by_key(|(_, distance)| *distance)
            .map(|(name, _)| name)
    }

    /// Warn about ignore entries that name no check or a check that cannot be skipped
    pub fn warn_about_ignores(&self, ignored: &[String]) {
        for name in ignored {
            match self.find(name) {
                Some(check) if !check.can_skip => {
                    tracing::warn!("Check '{}' cannot be ignored", name);
                }
                Some(_) => {}
                None => match self.suggest(name) {
                    Some(closest) => tracing::warn!(
                        "Unknown check '{}' in ignore list. Did you mean '{}'?",
                        name,
                        closest
                    ),
                    None => tracing::warn!("Unknown check '{}' in ignore list", name),
                },
            }
        }
    }
}
