use super::*;
use crate::test_support::{qid, Operation, Reply, ScriptedGateway};

const COUNT_4: &str = r#"{"count":4}"#;

#[tokio::test(start_paused = true)]
async fn polls_immediately_and_then_every_interval() {
    let gateway = ScriptedGateway::new();
    gateway.set_fallback(Operation::OpinionCount, Reply::ok(COUNT_4));
    let mut poller = LiveCounterPoller::new(gateway.clone());
    let mut display = poller.subscribe();

    poller.start(qid("abc123"));
    assert!(poller.display().visible);
    assert!(poller.is_running());

    let shown = display
        .wait_for(|display| display.count.is_some())
        .await
        .expect("first tick")
        .clone();
    assert_eq!(shown.count, Some(4));
    assert_eq!(gateway.count_calls(Operation::OpinionCount, "abc123"), 1);

    tokio::time::sleep(Duration::from_millis(6_100)).await;
    assert_eq!(gateway.count_calls(Operation::OpinionCount, "abc123"), 3);
}

#[tokio::test(start_paused = true)]
async fn keeps_last_count_when_a_later_count_is_not_numeric() {
    let gateway = ScriptedGateway::new();
    gateway.enqueue(Operation::OpinionCount, Reply::ok(COUNT_4));
    gateway.set_fallback(Operation::OpinionCount, Reply::ok(r#"{"count":"x"}"#));
    let mut poller = LiveCounterPoller::new(gateway.clone());

    poller.start(qid("abc123"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(poller.display().count, Some(4));

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert!(gateway.count_calls(Operation::OpinionCount, "abc123") >= 3);
    assert_eq!(poller.display().count, Some(4));
}

#[tokio::test(start_paused = true)]
async fn failed_polls_never_change_the_display() {
    let gateway = ScriptedGateway::new();
    gateway.enqueue(Operation::OpinionCount, Reply::status(500, "boom"));
    gateway.enqueue(Operation::OpinionCount, Reply::transport());
    gateway.enqueue(Operation::OpinionCount, Reply::ok("<html>not json</html>"));
    gateway.set_fallback(Operation::OpinionCount, Reply::ok(r#"{"count":2}"#));
    let mut poller = LiveCounterPoller::new(gateway.clone());

    poller.start(qid("q1"));
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    assert_eq!(gateway.count_calls(Operation::OpinionCount, "q1"), 3);
    let display = poller.display();
    assert!(display.visible);
    assert_eq!(display.count, None);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(poller.display().count, Some(2));
}

#[tokio::test(start_paused = true)]
async fn restarting_replaces_the_previous_schedule() {
    let gateway = ScriptedGateway::new();
    gateway.set_fallback(Operation::OpinionCount, Reply::ok(r#"{"count":7}"#));
    let mut poller = LiveCounterPoller::new(gateway.clone());

    poller.start(qid("first"));
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let first_calls = gateway.count_calls(Operation::OpinionCount, "first");
    assert_eq!(first_calls, 2);

    poller.start(qid("second"));
    assert_eq!(poller.active_question().map(QuestionId::as_str), Some("second"));
    assert_eq!(poller.display().count, None);

    tokio::time::sleep(Duration::from_millis(9_500)).await;
    assert_eq!(
        gateway.count_calls(Operation::OpinionCount, "first"),
        first_calls
    );
    assert_eq!(gateway.count_calls(Operation::OpinionCount, "second"), 4);
    let display = poller.display();
    assert_eq!(display.question_id.as_ref().map(QuestionId::as_str), Some("second"));
    assert_eq!(display.count, Some(7));
}

#[tokio::test(start_paused = true)]
async fn stale_response_does_not_overwrite_newer_count() {
    let gateway = ScriptedGateway::new();
    gateway.enqueue(
        Operation::OpinionCount,
        Reply::ok(r#"{"count":1}"#).after(Duration::from_secs(5)),
    );
    gateway.enqueue(Operation::OpinionCount, Reply::ok(r#"{"count":2}"#));
    gateway.set_fallback(Operation::OpinionCount, Reply::status(503, "busy"));
    let mut poller = LiveCounterPoller::new(gateway.clone());

    poller.start(qid("q1"));
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(poller.display().count, Some(2));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(poller.display().count, Some(2));
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_schedule_and_inflight_requests() {
    let gateway = ScriptedGateway::new();
    gateway.enqueue(
        Operation::OpinionCount,
        Reply::ok(COUNT_4).after(Duration::from_secs(2)),
    );
    let mut poller = LiveCounterPoller::new(gateway.clone());

    poller.stop();
    poller.start(qid("q1"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    poller.stop();
    poller.stop();
    assert!(!poller.is_running());
    assert!(poller.active_question().is_none());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(gateway.count_calls(Operation::OpinionCount, "q1"), 1);
    assert_eq!(poller.display().count, None);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_poller_cancels_its_schedule() {
    let gateway = ScriptedGateway::new();
    gateway.set_fallback(Operation::OpinionCount, Reply::ok(COUNT_4));
    let mut poller = LiveCounterPoller::with_interval(gateway.clone(), Duration::from_secs(1));
    poller.start(qid("q1"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    drop(poller);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(gateway.count_calls(Operation::OpinionCount, "q1"), 1);
}

#[tokio::test(start_paused = true)]
async fn integral_float_counts_are_shown() {
    let gateway = ScriptedGateway::new();
    gateway.enqueue(Operation::OpinionCount, Reply::ok(r#"{"count":4.0}"#));
    gateway.enqueue(Operation::OpinionCount, Reply::ok(r#"{"count":4.5}"#));
    gateway.enqueue(Operation::OpinionCount, Reply::ok(r#"{"count":-1}"#));
    gateway.set_fallback(Operation::OpinionCount, Reply::ok(r#"{"count":true}"#));
    let mut poller = LiveCounterPoller::new(gateway.clone());

    poller.start(qid("q1"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(poller.display().count, Some(4));

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert_eq!(gateway.count_calls(Operation::OpinionCount, "q1"), 4);
    assert_eq!(poller.display().count, Some(4));
}

#[tokio::test(start_paused = true)]
async fn unresponsive_backend_caps_pending_requests() {
    let gateway = ScriptedGateway::new();
    gateway.set_fallback(
        Operation::OpinionCount,
        Reply::ok(COUNT_4).after(Duration::from_secs(60)),
    );
    let mut poller = LiveCounterPoller::new(gateway.clone());

    poller.start(qid("q1"));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(
        gateway.count_calls(Operation::OpinionCount, "q1"),
        MAX_PENDING_POLLS
    );
    assert_eq!(poller.display().count, None);

    tokio::time::sleep(Duration::from_secs(34)).await;
    assert_eq!(poller.display().count, Some(4));
    assert!(gateway.count_calls(Operation::OpinionCount, "q1") > MAX_PENDING_POLLS);
}
