use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidatorError;

/// Kind of HACS repository being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Appdaemon,
    Integration,
    Netdaemon,
    Plugin,
    PythonScript,
    Themes,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Appdaemon,
        Category::Integration,
        Category::Netdaemon,
        Category::Plugin,
        Category::PythonScript,
        Category::Themes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Appdaemon => "appdaemon",
            Category::Integration => "integration",
            Category::Netdaemon => "netdaemon",
            Category::Plugin => "plugin",
            Category::PythonScript => "python_script",
            Category::Themes => "themes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ValidatorError::Validation {
                message: format!(
                    "unknown category '{}', expected one of: {}",
                    wanted,
                    Category::ALL.map(|c| c.as_str()).join(", ")
                ),
            })
    }
}
