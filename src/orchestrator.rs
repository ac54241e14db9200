//! Runs every check group concurrently and collects the outcomes

use futures_util::FutureExt;
use futures_util::future::join_all;
use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::checks::{CheckGroup, ContextStrategy, Registry};
use crate::clients::traits::HostingApi;
use crate::context::CheckContext;
use crate::executor::{ExecutionPolicy, panic_message, run_check};
use crate::report::{Outcome, ReportEntry, ReportSink, Reporter, RunReport};

pub struct Orchestrator {
    registry: Arc<Registry>,
    hosting: Arc<dyn HostingApi>,
    ctx: CheckContext,
    policy: ExecutionPolicy,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<Registry>,
        hosting: Arc<dyn HostingApi>,
        ctx: CheckContext,
        policy: ExecutionPolicy,
    ) -> Self {
        Self {
            registry,
            hosting,
            ctx,
            policy,
        }
    }

    /// Fetch the group's context, then run its checks concurrently.
    ///
    /// Each outcome is recorded in `sink` as soon as its check finishes.
    pub async fn run_group(&self, group: &CheckGroup, sink: &ReportSink) -> Vec<ReportEntry> {
        let ctx = match group.strategy {
            ContextStrategy::None => Cow::Borrowed(&self.ctx),
            ContextStrategy::RepositoryMetadata => {
                match self.hosting.repository(&self.ctx.env.repository).await {
                    Ok(metadata) => Cow::Owned(self.ctx.with_repository(metadata)),
                    Err(e) => {
                        let entry = ReportEntry::new(
                            group.kind,
                            group.kind.as_str(),
                            Outcome::Fail {
                                message: format!("Failed to process repo check: {e}"),
                                url: None,
                            },
                        );
                        sink.record(entry.clone());
                        return vec![entry];
                    }
                }
            }
        };
        let ctx: &CheckContext = &ctx;

        debug!("Running {} ({} checks)", group.description, group.checks.len());
        join_all(group.checks.iter().map(|def| async move {
            let outcome = run_check(def, ctx, &self.policy).await;
            let entry = ReportEntry::new(group.kind, def.name, outcome);
            sink.record(entry.clone());
            entry
        }))
        .await
    }

    /// Run all groups; a fault in one group never stops the others
    pub async fn run_all(&self) -> RunReport {
        let (sink, reporter) = Reporter::channel();

        join_all(self.registry.groups().iter().map(|group| {
            let sink = sink.clone();
            async move {
                let guarded = AssertUnwindSafe(self.run_group(group, &sink)).catch_unwind();
                if let Err(payload) = guarded.await {
                    error!("{} panicked", group.description);
                    sink.record(ReportEntry::new(
                        group.kind,
                        group.kind.as_str(),
                        Outcome::Fail {
                            message: format!(
                                "Something went wrong when processing the {}: {}",
                                group.description,
                                panic_message(payload.as_ref())
                            ),
                            url: None,
                        },
                    ));
                }
            }
        }))
        .await;
        drop(sink);

        let report = reporter.finish().await;
        info!(
            "Finished {} checks with {} failures",
            report.entries.len(),
            report.failures().count()
        );
        report
    }
}
