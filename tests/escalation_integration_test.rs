/// Integration tests for timed escalation chains driven by alarm writes
///
/// Timers run on a paused tokio clock, so step delays elapse instantly.
mod common;

use alm_engine::{
    lifecycle::WriteRequest,
    models::{
        AlarmPatch, AlarmState, EscalationPolicy, EscalationStep, NotificationChannel, Severity,
    },
    state::StoreSeed,
};
use common::{alarm_on, Harness};
use std::time::Duration;

fn step(order: u32, delay_minutes: u32, endpoint: &str) -> EscalationStep {
    EscalationStep {
        step_order: order,
        delay_minutes,
        channel: NotificationChannel::Pagerduty,
        endpoint: endpoint.to_string(),
        message_template: String::new(),
    }
}

fn harness(steps: Vec<EscalationStep>) -> Harness {
    Harness::new(StoreSeed {
        escalation_policies: vec![EscalationPolicy {
            policy_id: "noc".to_string(),
            name: "NOC escalation".to_string(),
            min_severity: Some(Severity::Major),
            steps,
            ..Default::default()
        }],
        ..Default::default()
    })
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

#[tokio::test(start_paused = true)]
async fn test_acknowledge_before_first_step_sends_nothing() {
    let harness = harness(vec![step(1, 5, "tier1")]);

    harness
        .lifecycle
        .write(WriteRequest::Create {
            alarm: alarm_on("a", "n0", "linkDown", Severity::Major),
        })
        .await
        .unwrap();
    assert!(harness.hooks.escalation().unwrap().active_escalation("a").is_some());

    tokio::time::sleep(minutes(1)).await;
    harness
        .lifecycle
        .write(WriteRequest::PartialUpdate {
            alarm_id: "a".to_string(),
            patch: AlarmPatch::state(AlarmState::Acknowledged),
        })
        .await
        .unwrap();

    tokio::time::sleep(minutes(30)).await;

    assert_eq!(harness.recorder.count(), 0);
    assert!(harness.hooks.escalation().unwrap().active_escalation("a").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_steps_fire_in_order_with_relative_delays() {
    let harness = harness(vec![step(2, 10, "tier2"), step(1, 5, "tier1")]);

    harness
        .lifecycle
        .write(WriteRequest::Create {
            alarm: alarm_on("a", "n0", "linkDown", Severity::Critical),
        })
        .await
        .unwrap();

    tokio::time::sleep(minutes(5) + Duration::from_secs(1)).await;
    assert_eq!(harness.recorder.endpoints(), vec!["tier1"]);
    assert_eq!(
        harness.recorder.messages()[0],
        "[ESCALATION] Alarm a (linkDown) on n0 - unacknowledged for 5 minutes"
    );

    tokio::time::sleep(minutes(9)).await;
    assert_eq!(harness.recorder.count(), 1);

    tokio::time::sleep(minutes(1)).await;
    assert_eq!(harness.recorder.endpoints(), vec!["tier1", "tier2"]);
    assert_eq!(harness.hooks.escalation().unwrap().active_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_clear_between_steps_stops_chain() {
    let harness = harness(vec![step(1, 5, "tier1"), step(2, 10, "tier2")]);
    let alarm = alarm_on("a", "n0", "linkDown", Severity::Major);

    harness
        .lifecycle
        .write(WriteRequest::Create {
            alarm: alarm.clone(),
        })
        .await
        .unwrap();

    tokio::time::sleep(minutes(6)).await;
    assert_eq!(harness.recorder.count(), 1);

    harness
        .lifecycle
        .write(WriteRequest::Replace {
            alarm: alarm.with_state(AlarmState::Cleared),
        })
        .await
        .unwrap();

    tokio::time::sleep(minutes(60)).await;
    assert_eq!(harness.recorder.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rescheduling_replaces_running_chain() {
    let harness = harness(vec![step(1, 5, "tier1")]);
    let alarm = alarm_on("a", "n0", "linkDown", Severity::Major);

    for _ in 0..3 {
        harness
            .lifecycle
            .write(WriteRequest::Create {
                alarm: alarm.clone(),
            })
            .await
            .unwrap();
        tokio::time::sleep(minutes(1)).await;
    }

    tokio::time::sleep(minutes(10)).await;
    assert_eq!(harness.recorder.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_scope_alarm_not_escalated() {
    let harness = harness(vec![step(1, 5, "tier1")]);

    harness
        .lifecycle
        .write(WriteRequest::Create {
            alarm: alarm_on("a", "n0", "fanDegraded", Severity::Minor),
        })
        .await
        .unwrap();

    tokio::time::sleep(minutes(10)).await;
    assert_eq!(harness.recorder.count(), 0);
    assert_eq!(harness.hooks.escalation().unwrap().active_count(), 0);
}
