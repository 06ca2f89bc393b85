use super::*;
use crate::error::{ApiError, StoreError, UploadError};
use crate::fakes::{count, item, new_log, Call, CallLog, CreateOutcome, FakePublisher, FakeSleeper, FakeStore};
use std::time::Duration;

fn plan() -> RunPlan {
    RunPlan {
        folder_id: "folder-1".to_string(),
        caption_template: "Daily: {name} #reels".to_string(),
        poll: PollPolicy {
            max_attempts: 10,
            interval: Duration::from_secs(30),
        },
    }
}

fn run(store: &FakeStore, publisher: &FakePublisher, log: &CallLog) -> Result<RunOutcome, RunError> {
    let sleeper = FakeSleeper::new(log);
    PublishWorkflow::new(store, publisher, &sleeper).run(&plan())
}

fn is_delete(call: &Call) -> bool {
    matches!(call, Call::Delete(_))
}

fn is_publish(call: &Call) -> bool {
    matches!(call, Call::Publish(_))
}

fn is_status(call: &Call) -> bool {
    matches!(call, Call::Status(_))
}

fn is_sleep(call: &Call) -> bool {
    matches!(call, Call::Sleep(_))
}

#[test]
fn empty_folder_finishes_without_publishing_or_deleting() {
    let log = new_log();
    let store = FakeStore::new(&log, Vec::new());
    let publisher = FakePublisher::new(&log);

    let outcome = run(&store, &publisher, &log).expect("run");

    assert_eq!(outcome, RunOutcome::NothingToDo);
    assert_eq!(*log.borrow(), vec![Call::List("folder-1".to_string())]);
}

#[test]
fn happy_path_publishes_oldest_and_deletes_it_once() {
    let log = new_log();
    let store = FakeStore::new(&log, vec![item("a", "sunrise.mp4"), item("b", "sunset.mp4")]);
    let publisher = FakePublisher::new(&log).finishing_on(1);

    let outcome = run(&store, &publisher, &log).expect("run");

    let RunOutcome::Published(report) = outcome else {
        panic!("expected a publication");
    };
    assert_eq!(report.item.id, "a");
    assert_eq!(report.container_id, ContainerId::new("container-1"));
    assert_eq!(report.publication_id, PublicationId::new("media-42"));
    assert_eq!(report.poll_attempts, 1);
    assert!(report.source_deleted);
    assert_eq!(
        *log.borrow(),
        vec![
            Call::List("folder-1".to_string()),
            Call::Create {
                download_ref: "https://drive.google.com/uc?export=download&id=a".to_string(),
                caption: "Daily: sunrise #reels".to_string(),
            },
            Call::Status("container-1".to_string()),
            Call::Publish("container-1".to_string()),
            Call::Delete("a".to_string()),
        ]
    );
}

#[test]
fn listing_failure_stops_before_any_publishing_call() {
    let log = new_log();
    let mut store = FakeStore::new(&log, vec![item("a", "a.mp4")]);
    store.fail_list = true;
    let publisher = FakePublisher::new(&log);

    let err = run(&store, &publisher, &log).unwrap_err();

    assert!(matches!(err, RunError::Store(StoreError::List { .. })));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn container_rejection_issues_no_poll_publish_or_delete() {
    let log = new_log();
    let store = FakeStore::new(&log, vec![item("a", "a.mp4")]);
    let mut publisher = FakePublisher::new(&log);
    publisher.create = CreateOutcome::Rejected;

    let err = run(&store, &publisher, &log).unwrap_err();

    assert!(matches!(err, RunError::Upload(_)));
    assert_eq!(count(&log, is_status), 0);
    assert_eq!(count(&log, is_publish), 0);
    assert_eq!(count(&log, is_delete), 0);
}

#[test]
fn container_response_without_id_halts_as_upload_error() {
    let log = new_log();
    let store = FakeStore::new(&log, vec![item("a", "a.mp4")]);
    let mut publisher = FakePublisher::new(&log);
    publisher.create = CreateOutcome::MissingId;

    let err = run(&store, &publisher, &log).unwrap_err();

    assert!(matches!(
        err,
        RunError::Upload(UploadError(ApiError::MissingField { field: "id", .. }))
    ));
    assert_eq!(count(&log, is_status), 0);
    assert_eq!(count(&log, is_delete), 0);
}

#[test]
fn poll_timeout_is_fatal_and_keeps_source() {
    let log = new_log();
    let store = FakeStore::new(&log, vec![item("a", "a.mp4")]);
    let publisher = FakePublisher::new(&log);

    let err = run(&store, &publisher, &log).unwrap_err();

    assert!(matches!(err, RunError::Timeout(_)));
    assert_eq!(count(&log, is_status), 10);
    assert_eq!(count(&log, is_sleep), 9);
    assert_eq!(count(&log, is_publish), 0);
    assert_eq!(count(&log, is_delete), 0);
}

#[test]
fn publish_failure_never_deletes_source() {
    let log = new_log();
    let store = FakeStore::new(&log, vec![item("a", "a.mp4")]);
    let mut publisher = FakePublisher::new(&log).finishing_on(2);
    publisher.fail_publish = true;

    let err = run(&store, &publisher, &log).unwrap_err();

    assert!(matches!(err, RunError::Publish(_)));
    assert_eq!(count(&log, is_publish), 1);
    assert_eq!(count(&log, is_delete), 0);
}

#[test]
fn delete_failure_after_publish_still_succeeds() {
    let log = new_log();
    let mut store = FakeStore::new(&log, vec![item("a", "a.mp4")]);
    store.fail_delete = true;
    let publisher = FakePublisher::new(&log).finishing_on(3);

    let outcome = run(&store, &publisher, &log).expect("run succeeds");

    let RunOutcome::Published(report) = outcome else {
        panic!("expected a publication");
    };
    assert!(!report.source_deleted);
    assert_eq!(report.poll_attempts, 3);
    assert_eq!(count(&log, is_delete), 1);
}

#[test]
fn caption_without_placeholder_is_used_verbatim() {
    let caption = render_caption("Your daily reel! #reels #viral", &item("a", "clip.mp4"));
    assert_eq!(caption, "Your daily reel! #reels #viral");
}

#[test]
fn caption_placeholder_expands_every_occurrence() {
    let caption = render_caption("{name} / {name}", &item("a", "teaser.final.mov"));
    assert_eq!(caption, "teaser.final / teaser.final");
}

#[test]
fn caption_keeps_slashes_from_storage_name() {
    let caption = render_caption("{name}", &item("a", "Ep 1/2 finale.mp4"));
    assert_eq!(caption, "Ep 1/2 finale");
}
