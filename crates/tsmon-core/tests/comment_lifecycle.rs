//! Report publisher lifecycle against the in-memory hosting API.

use tsmon_core::fakes::{FailureInjection, MemoryHostingApi};
use tsmon_core::{
    CheckConclusion, CheckRunState, CommentOutcome, ReportPublisher, ReportTarget, REPORT_MARKER,
};

const BOT: &str = "github-actions[bot]";

fn target() -> ReportTarget {
    ReportTarget {
        pull_number: 12,
        head_sha: "head-sha".to_string(),
    }
}

#[tokio::test]
async fn first_publish_creates_exactly_one_comment() {
    let api = MemoryHostingApi::new(BOT);
    let publisher = ReportPublisher::new(&api, BOT);

    let outcome = publisher.publish_comment(&target(), "report v1").await;

    assert!(matches!(outcome, CommentOutcome::Created(_)));
    let marked = api.marked_comments(12, REPORT_MARKER);
    assert_eq!(marked.len(), 1);
    assert!(marked[0].body.starts_with("report v1"));
}

#[tokio::test]
async fn existing_marker_comment_is_updated_in_place() {
    let api = MemoryHostingApi::new(BOT);
    let existing = api.seed_comment(12, BOT, &format!("old report\n\n{REPORT_MARKER}"));
    let publisher = ReportPublisher::new(&api, BOT);

    let outcome = publisher.publish_comment(&target(), "new report").await;

    assert_eq!(outcome, CommentOutcome::Updated(existing));
    let comments = api.comments_on(12);
    assert_eq!(comments.len(), 1);
    assert!(comments[0].body.starts_with("new report"));
}

#[tokio::test]
async fn repeated_publish_never_duplicates() {
    let api = MemoryHostingApi::new(BOT);
    let publisher = ReportPublisher::new(&api, BOT);

    for round in 0..3 {
        publisher
            .publish_comment(&target(), &format!("report round {round}"))
            .await;
    }

    let marked = api.marked_comments(12, REPORT_MARKER);
    assert_eq!(marked.len(), 1);
    assert!(marked[0].body.starts_with("report round 2"));
}

#[tokio::test]
async fn marker_comments_from_other_authors_are_ignored() {
    let api = MemoryHostingApi::new(BOT);
    api.seed_comment(12, "some-human", &format!("quoting {REPORT_MARKER}"));
    let publisher = ReportPublisher::new(&api, BOT);

    let outcome = publisher.publish_comment(&target(), "report").await;

    assert!(matches!(outcome, CommentOutcome::Created(_)));
    assert_eq!(api.comments_on(12).len(), 2);
    assert_eq!(api.comments_on(12)[0].body, format!("quoting {REPORT_MARKER}"));
}

#[tokio::test]
async fn most_recent_marker_comment_wins() {
    let api = MemoryHostingApi::new(BOT);
    let older = api.seed_comment(12, BOT, REPORT_MARKER);
    let newer = api.seed_comment(12, BOT, REPORT_MARKER);
    let publisher = ReportPublisher::new(&api, BOT);

    let outcome = publisher.publish_comment(&target(), "report").await;

    assert_eq!(outcome, CommentOutcome::Updated(newer));
    let older_body = api
        .comments_on(12)
        .into_iter()
        .find(|c| c.id == older)
        .unwrap()
        .body;
    assert_eq!(older_body, REPORT_MARKER);
}

#[tokio::test]
async fn failed_update_falls_back_to_create() {
    let api = MemoryHostingApi::new(BOT);
    api.seed_comment(12, BOT, REPORT_MARKER);
    api.inject_failures(FailureInjection {
        update_comment: true,
        ..Default::default()
    });
    let publisher = ReportPublisher::new(&api, BOT);

    let outcome = publisher.publish_comment(&target(), "report").await;

    assert!(matches!(outcome, CommentOutcome::Created(_)));
}

#[tokio::test]
async fn failed_create_falls_back_to_review() {
    let api = MemoryHostingApi::new(BOT);
    api.inject_failures(FailureInjection {
        create_comment: true,
        ..Default::default()
    });
    let publisher = ReportPublisher::new(&api, BOT);

    let outcome = publisher.publish_comment(&target(), "report").await;

    assert_eq!(outcome, CommentOutcome::Reviewed);
    let reviews = api.reviews();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].0, 12);
    assert!(reviews[0].1.contains(REPORT_MARKER));
}

#[tokio::test]
async fn total_failure_is_swallowed() {
    let api = MemoryHostingApi::new(BOT);
    api.inject_failures(FailureInjection {
        list_comments: true,
        create_comment: true,
        create_review: true,
        ..Default::default()
    });
    let publisher = ReportPublisher::new(&api, BOT);

    let outcome = publisher.publish_comment(&target(), "report").await;

    assert_eq!(outcome, CommentOutcome::Failed);
    assert!(api.comments_on(12).is_empty());
}

#[tokio::test]
async fn failed_listing_posts_nothing() {
    let api = MemoryHostingApi::new(BOT);
    let existing = api.seed_comment(12, BOT, &format!("old report\n\n{REPORT_MARKER}"));
    api.inject_failures(FailureInjection {
        list_comments: true,
        ..Default::default()
    });
    let publisher = ReportPublisher::new(&api, BOT);

    let outcome = publisher.publish_comment(&target(), "new report").await;

    assert_eq!(outcome, CommentOutcome::Failed);
    let marked = api.marked_comments(12, REPORT_MARKER);
    assert_eq!(marked.len(), 1);
    assert_eq!(marked[0].id, existing);
    assert!(marked[0].body.starts_with("old report"));
    assert!(api.reviews().is_empty());
}

#[tokio::test]
async fn check_run_opens_in_progress_and_completes_once() {
    let api = MemoryHostingApi::new(BOT);
    let publisher = ReportPublisher::new(&api, BOT);

    let handle = publisher.open_check(&target()).await.expect("check opened");
    let runs = api.check_runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].state, CheckRunState::InProgress);
    assert_eq!(runs[0].head_sha, "head-sha");

    assert!(
        publisher
            .complete_check(handle, CheckConclusion::Failure, "TypeScript errors increased by 2")
            .await
    );

    let runs = api.check_runs();
    assert_eq!(runs[0].state, CheckRunState::Completed);
    assert_eq!(runs[0].conclusion, Some(CheckConclusion::Failure));
    assert_eq!(runs[0].completions, 1);
    assert_eq!(
        runs[0].output.as_ref().unwrap().summary,
        "TypeScript errors increased by 2"
    );
}

#[tokio::test]
async fn check_run_failure_is_swallowed() {
    let api = MemoryHostingApi::new(BOT);
    api.inject_failures(FailureInjection {
        check_runs: true,
        ..Default::default()
    });
    let publisher = ReportPublisher::new(&api, BOT);

    assert!(publisher.open_check(&target()).await.is_none());
    assert!(api.check_runs().is_empty());
}
