//! Runs a single check and normalizes whatever it returns into an [`Outcome`]

use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::checks::{CheckDefinition, CheckResponse};
use crate::context::CheckContext;
use crate::error::Result;
use crate::report::{Outcome, SkipReason};

/// Per-run settings the executor applies to every check
#[derive(Debug, Clone)]
pub struct ExecutionPolicy {
    pub ignored: HashSet<String>,
    pub check_timeout: Duration,
}

impl ExecutionPolicy {
    pub fn new<I, S>(ignored: I, check_timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored: ignored.into_iter().map(Into::into).collect(),
            check_timeout,
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::new(Vec::<String>::new(), Duration::from_secs(600))
    }
}

pub async fn run_check(def: &CheckDefinition, ctx: &CheckContext, policy: &ExecutionPolicy) -> Outcome {
    if def.can_skip && policy.is_ignored(def.name) {
        return Outcome::Skipped {
            reason: SkipReason::Ignored,
        };
    }

    match std::panic::catch_unwind(AssertUnwindSafe(|| (def.ignore)(ctx))) {
        Ok(true) => {
            return Outcome::Skipped {
                reason: SkipReason::NotApplicable,
            };
        }
        Ok(false) => {}
        Err(payload) => {
            return fail(def, format!("check panicked: {}", panic_message(payload.as_ref())));
        }
    }

    debug!("Running check {}", def.name);
    let ctx = ctx.with_deadline(Instant::now() + policy.check_timeout);
    // a check may panic before it returns its future
    let guarded = AssertUnwindSafe(async { (def.check)(&ctx).await }).catch_unwind();
    match tokio::time::timeout(policy.check_timeout, guarded).await {
        Ok(Ok(result)) => normalize(def, result),
        Ok(Err(payload)) => fail(def, format!("check panicked: {}", panic_message(payload.as_ref()))),
        Err(_) => fail(
            def,
            format!(
                "{} timed out after {}ms",
                def.name,
                policy.check_timeout.as_millis()
            ),
        ),
    }
}

/// Map a check's raw response onto an outcome
pub fn normalize(def: &CheckDefinition, result: Result<CheckResponse>) -> Outcome {
    match result {
        Ok(CheckResponse::Bool(true)) => Outcome::Pass {
            message: def.description.clone(),
        },
        Ok(CheckResponse::Bool(false)) => fail(def, def.description.clone()),
        Ok(CheckResponse::Message(message)) => fail_or_neutral(def, message),
        Ok(CheckResponse::Structured {
            pass: true,
            message,
        }) => Outcome::Pass { message },
        Ok(CheckResponse::Structured {
            pass: false,
            message,
        }) => fail_or_neutral(def, message),
        Ok(CheckResponse::Indeterminate(value)) => {
            debug!("Check {} returned {}", def.name, value);
            fail(def, "Unknown check response type".to_string())
        }
        Err(e) => fail(def, e.to_string()),
    }
}

fn fail(def: &CheckDefinition, message: String) -> Outcome {
    Outcome::Fail {
        message,
        url: Some(def.url.to_string()),
    }
}

fn fail_or_neutral(def: &CheckDefinition, message: String) -> Outcome {
    if def.neutral {
        Outcome::Neutral {
            message,
            url: Some(def.url.to_string()),
        }
    } else {
        fail(def, message)
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
