//! Outcomes, the run report and its rendering

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::checks::GroupKind;

const PASS_ICON: &str = "✅";
const FAIL_ICON: &str = "❌";
const SKIP_ICON: &str = "⚪";

const COMMENT_TITLE: &str = "🎉 **HACS repository validator summary** 🎉\n";
const COMMENT_FOOTER: &str = "\nThis check was completed with hacs-validator, which is designed to rapidly assess your HACS repository. If this is a release, we still recommend you use the official https://github.com/hacs/action/ action!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Named in the ignore input
    Ignored,
    /// The check's ignore predicate held
    NotApplicable,
}

/// Normalized result of running one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Pass {
        message: String,
    },
    Fail {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Neutral {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Skipped {
        reason: SkipReason,
    },
}

impl Outcome {
    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub group: GroupKind,
    pub check: String,
    pub outcome: Outcome,
}

impl ReportEntry {
    pub fn new(group: GroupKind, check: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            group,
            check: check.into(),
            outcome,
        }
    }

    /// Report line for this entry; checks that did not apply render nothing
    pub fn render(&self) -> Option<String> {
        let more_info = |url: &Option<String>| {
            url.as_ref()
                .map(|u| format!(" (more-info: {u})"))
                .unwrap_or_default()
        };
        match &self.outcome {
            Outcome::Pass { message } => Some(format!("{PASS_ICON} {message}")),
            Outcome::Fail { message, url } => {
                Some(format!("{FAIL_ICON} {message}{}", more_info(url)))
            }
            Outcome::Neutral { message, url } => {
                Some(format!("{SKIP_ICON} {message}{}", more_info(url)))
            }
            Outcome::Skipped {
                reason: SkipReason::Ignored,
            } => Some(format!("{SKIP_ICON} Ignored check: {}", self.check)),
            Outcome::Skipped {
                reason: SkipReason::NotApplicable,
            } => None,
        }
    }
}

/// All outcomes of a run, in the order they completed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        !self.entries.iter().any(|e| e.outcome.is_fail())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.outcome.is_fail())
    }

    pub fn outcome_of(&self, check: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|e| e.check == check)
            .map(|e| &e.outcome)
    }

    pub fn render(&self) -> Vec<String> {
        self.entries.iter().filter_map(ReportEntry::render).collect()
    }

    /// Pull request comment body, starting with `marker` so it can be found again
    pub fn comment_body(&self, marker: &str) -> String {
        let mut lines = vec![marker.to_string(), COMMENT_TITLE.to_string()];
        lines.extend(self.render());
        lines.push(COMMENT_FOOTER.to_string());
        lines.join("\n")
    }
}

/// Write side of the report; cheap to clone into concurrently running checks
#[derive(Debug, Clone)]
pub struct ReportSink {
    tx: mpsc::UnboundedSender<ReportEntry>,
}

impl ReportSink {
    pub fn record(&self, entry: ReportEntry) {
        match (&entry.outcome, entry.render()) {
            (Outcome::Fail { .. }, Some(line)) => error!("{}", line),
            (_, Some(line)) => info!("{}", line),
            (_, None) => debug!("Skipped {}: not applicable", entry.check),
        }
        if self.tx.send(entry).is_err() {
            debug!("Report already finalized, dropping late outcome");
        }
    }
}

/// Read side of the report
#[derive(Debug)]
pub struct Reporter {
    rx: mpsc::UnboundedReceiver<ReportEntry>,
}

impl Reporter {
    pub fn channel() -> (ReportSink, Reporter) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ReportSink { tx }, Reporter { rx })
    }

    /// Stop accepting outcomes and collect everything recorded so far
    pub async fn finish(mut self) -> RunReport {
        self.rx.close();
        let mut entries = Vec::new();
        while let Some(entry) = self.rx.recv().await {
            entries.push(entry);
        }
        RunReport { entries }
    }
}
