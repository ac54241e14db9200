mod common;

use common::FakeHosting;
use hacs_validator::clients::HostingApi;
use hacs_validator::context::RepoSlug;
use hacs_validator::publish::{CommentAction, upsert_comment};

const MARKER: &str = "<!-- hacs-validator comment -->";

fn repo() -> RepoSlug {
    common::REPO.parse().unwrap()
}

#[tokio::test]
async fn publishing_twice_keeps_a_single_comment() {
    let api = FakeHosting::default();

    let first = upsert_comment(&api, &repo(), 7, MARKER, &format!("{MARKER}\nfirst run"))
        .await
        .unwrap();
    let second = upsert_comment(&api, &repo(), 7, MARKER, &format!("{MARKER}\nsecond run"))
        .await
        .unwrap();

    let CommentAction::Created(id) = first else {
        panic!("first publish should create, got {first:?}");
    };
    assert_eq!(second, CommentAction::Updated(id));
    assert_eq!(api.comment_bodies(), vec![format!("{MARKER}\nsecond run")]);
}

#[tokio::test]
async fn unrelated_comments_are_left_alone() {
    let api = FakeHosting::default();
    api.create_comment(&repo(), 7, "LGTM").await.unwrap();

    let action = upsert_comment(&api, &repo(), 7, MARKER, &format!("{MARKER}\nsummary"))
        .await
        .unwrap();

    assert!(matches!(action, CommentAction::Created(_)));
    assert_eq!(
        api.comment_bodies(),
        vec!["LGTM".to_string(), format!("{MARKER}\nsummary")]
    );
}
