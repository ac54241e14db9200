mod common;

use futures_util::FutureExt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{
    FakeHosting, FakeInstaller, FakeProbe, REPO, context, context_with, healthy_metadata,
    orchestrator, orchestrator_for, services, write_files,
};
use hacs_validator::checks::{
    CheckDefinition, CheckFuture, CheckGroup, CheckResponse, GroupKind, Registry, ready,
};
use hacs_validator::clients::RepositoryMetadata;
use hacs_validator::context::CheckContext;
use hacs_validator::executor::ExecutionPolicy;
use hacs_validator::orchestrator::Orchestrator;
use hacs_validator::report::{Outcome, RunReport, SkipReason};

const URL: &str = "https://example.test/more";

const THEMES_REPO: &[(&str, &str)] = &[
    ("hacs.json", r#"{"name": "Demo theme"}"#),
    ("info.md", "![preview](preview.png)"),
    ("themes/demo.yaml", "demo:\n  primary-color: red\n"),
];

#[tokio::test]
async fn repository_fetch_failure_yields_one_failure_for_the_group() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), THEMES_REPO);

    let report = orchestrator("themes", dir.path(), Arc::new(FakeHosting::failing()), &[])
        .run_all()
        .await;

    let repository: Vec<_> = report
        .entries
        .iter()
        .filter(|e| e.group == GroupKind::Repository)
        .collect();
    assert_eq!(repository.len(), 1);
    match &repository[0].outcome {
        Outcome::Fail { message, url } => {
            assert!(message.starts_with("Failed to process repo check: "));
            assert!(message.contains("upstream unavailable"));
            assert!(url.is_none());
        }
        other => panic!("expected failure, got {other:?}"),
    }

    // Every other group still reports all of its checks
    for (kind, count) in [
        (GroupKind::File, 2),
        (GroupKind::Json, 3),
        (GroupKind::External, 2),
        (GroupKind::Functionality, 1),
    ] {
        assert_eq!(
            report.entries.iter().filter(|e| e.group == kind).count(),
            count,
            "{kind}"
        );
    }
    assert!(!report.success());
}

#[tokio::test]
async fn every_check_reports_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), THEMES_REPO);

    let report = orchestrator(
        "themes",
        dir.path(),
        Arc::new(FakeHosting::with_metadata(healthy_metadata())),
        &[],
    )
    .run_all()
    .await;

    let mut names: Vec<&str> = report.entries.iter().map(|e| e.check.as_str()).collect();
    names.sort_unstable();
    let before = names.len();
    names.dedup();
    assert_eq!(names.len(), before);
    assert_eq!(names.len(), 13);
}

fn explodes_before_returning(ctx: &CheckContext) -> CheckFuture<'_> {
    if ctx.env.repository.name == "demo" {
        panic!("sync kaboom");
    }
    ready(Ok(CheckResponse::Bool(true)))
}

fn passes(_: &CheckContext) -> CheckFuture<'_> {
    ready(Ok(CheckResponse::Bool(true)))
}

fn naps(_: &CheckContext) -> CheckFuture<'_> {
    async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(CheckResponse::Bool(true))
    }
    .boxed()
}

async fn run_file_group(checks: Vec<CheckDefinition>) -> RunReport {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::from_groups(vec![CheckGroup::new(GroupKind::File, checks)]);
    Orchestrator::new(
        Arc::new(registry),
        Arc::new(FakeHosting::with_metadata(healthy_metadata())),
        context("themes", dir.path()),
        ExecutionPolicy::new(Vec::<String>::new(), Duration::from_secs(5)),
    )
    .run_all()
    .await
}

#[tokio::test]
async fn early_panic_only_fails_its_own_check() {
    let report = run_file_group(vec![
        CheckDefinition::new("boom", "Boom", URL, explodes_before_returning),
        CheckDefinition::new("after", "After", URL, passes),
    ])
    .await;

    assert_eq!(report.entries.len(), 2);
    assert_eq!(
        report.outcome_of("boom"),
        Some(&Outcome::Fail {
            message: "check panicked: sync kaboom".to_string(),
            url: Some(URL.to_string())
        })
    );
    assert!(matches!(report.outcome_of("after"), Some(Outcome::Pass { .. })));
    assert!(
        report
            .render()
            .iter()
            .all(|line| !line.contains("Something went wrong"))
    );
}

#[tokio::test]
async fn checks_in_a_group_run_concurrently() {
    let started = Instant::now();
    let report = run_file_group(vec![
        CheckDefinition::new("first", "First", URL, naps),
        CheckDefinition::new("second", "Second", URL, naps),
    ])
    .await;

    assert_eq!(report.entries.len(), 2);
    assert!(report.success());
    assert!(
        started.elapsed() < Duration::from_millis(390),
        "took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn panic_while_fetching_context_fails_only_that_group() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), THEMES_REPO);

    let report = orchestrator("themes", dir.path(), Arc::new(FakeHosting::panicking()), &[])
        .run_all()
        .await;

    let repository: Vec<_> = report
        .entries
        .iter()
        .filter(|e| e.group == GroupKind::Repository)
        .collect();
    assert_eq!(repository.len(), 1);
    assert_eq!(
        repository[0].outcome,
        Outcome::Fail {
            message: "Something went wrong when processing the Repository checks: metadata decoder exploded"
                .to_string(),
            url: None
        }
    );
    assert_eq!(
        report
            .entries
            .iter()
            .filter(|e| e.group != GroupKind::Repository)
            .count(),
        8
    );
}

async fn fork_outcome(repo: &str) -> Option<Outcome> {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), THEMES_REPO);
    let ctx = context_with(
        repo,
        "themes",
        dir.path(),
        services(FakeProbe::listed(true), FakeInstaller::default()),
    );
    let metadata = RepositoryMetadata {
        full_name: repo.to_string(),
        fork: true,
        ..healthy_metadata()
    };
    let report = orchestrator_for(
        ctx,
        Arc::new(FakeHosting::with_metadata(metadata)),
        &[],
        Duration::from_secs(30),
    )
    .run_all()
    .await;
    report.outcome_of("fork").cloned()
}

#[tokio::test]
async fn forks_are_neutral_only_for_the_default_repository() {
    match fork_outcome("hacs/default").await {
        Some(Outcome::Neutral { message, .. }) => assert_eq!(message, "The repository is a fork"),
        other => panic!("expected neutral, got {other:?}"),
    }
    assert_eq!(
        fork_outcome(REPO).await,
        Some(Outcome::Skipped {
            reason: SkipReason::NotApplicable
        })
    );
}

#[tokio::test]
async fn unreachable_brands_registry_fails_brands_only() {
    let manifest = r#"{
        "domain": "demo",
        "documentation": "https://example.test/docs",
        "issue_tracker": "https://example.test/issues",
        "codeowners": [],
        "version": "1.0.0"
    }"#;
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("hacs.json", r#"{"name": "Demo"}"#),
            ("custom_components/demo/__init__.py", ""),
            ("custom_components/demo/manifest.json", manifest),
        ],
    );
    let ctx = context_with(
        REPO,
        "integration",
        dir.path(),
        services(
            FakeProbe::unreachable("connection refused"),
            FakeInstaller::default(),
        ),
    );
    let report = orchestrator_for(
        ctx,
        Arc::new(FakeHosting::with_metadata(healthy_metadata())),
        &[],
        Duration::from_secs(30),
    )
    .run_all()
    .await;

    match report.outcome_of("brands") {
        Some(Outcome::Fail { message, .. }) => assert!(message.contains("connection refused")),
        other => panic!("expected brands to fail, got {other:?}"),
    }
    assert_eq!(report.entries.len(), 13);
    assert!(matches!(report.outcome_of("manifest"), Some(Outcome::Pass { .. })));
    assert!(matches!(report.outcome_of("hacs"), Some(Outcome::Pass { .. })));
}
