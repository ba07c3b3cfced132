use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use step_adapters::{TaskOptions, TaskOutcome, TaskStep};
use step_core::{EventRecorder, LifecycleHost, StatusCode, Step, StepError, StepEventName, StepStatus};

fn code(raw: i64) -> StatusCode {
    StatusCode::new(raw).expect("valid code")
}

#[test]
fn processes_items_reporting_granular_progress() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut step = TaskStep::new("etl", move |item| {
        sink.lock().unwrap().push(item.to_string());
        TaskOutcome::Completed
    });
    let recorder = EventRecorder::new();
    recorder.attach(&mut step);

    step.configure(&TaskOptions::new(["a", "b", "c", "d"])).unwrap();
    step.run();

    assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c", "d"]);
    assert_eq!(step.processed(), 4);
    assert_eq!(recorder.status_trail(),
               vec![(code(0), code(100)),
                    (code(100), code(200)),
                    (code(200), code(224)),
                    (code(224), code(249)),
                    (code(249), code(274)),
                    (code(274), code(300))]);
    // los códigos intermedios se clasifican como "in progress"
    assert!(recorder.status_trail()[2..5].iter().all(|(_, to)| to.phase() == StepStatus::InProgress));
    assert_eq!(recorder.of_kind(&StepEventName::Done).len(), 1);
}

#[test]
fn failed_items_are_retried_up_to_max_attempts() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let flaky = move |item: &str| {
        if item == "b" && counter.fetch_add(1, Ordering::SeqCst) == 0 {
            TaskOutcome::Failed("timeout".into())
        } else {
            TaskOutcome::Completed
        }
    };

    let mut step = TaskStep::new("retrying", flaky);
    step.configure(&TaskOptions::new(["a", "b"]).with_max_attempts(2)).unwrap();
    step.run();
    assert_eq!(step.get_status(), StepStatus::Done);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn exhausted_retries_end_in_error() {
    let mut step = TaskStep::new("broken", |item| {
        if item == "b" {
            TaskOutcome::Failed("disk full".into())
        } else {
            TaskOutcome::Completed
        }
    });
    let recorder = EventRecorder::new();
    recorder.attach(&mut step);
    step.configure(&TaskOptions::new(["a", "b"])).unwrap();
    step.run();

    assert_eq!(step.get_status(), StepStatus::Error);
    assert_eq!(step.processed(), 1);
    let last = recorder.events().pop().unwrap();
    assert_eq!(last.previous_status, code(249));
    assert_eq!(last.reason.as_deref(), Some("item 'b' failed after 1 attempt(s): disk full"));
    assert!(recorder.of_kind(&StepEventName::Done).is_empty());

    // terminal: run() no hace nada
    let before = recorder.len();
    step.run();
    assert_eq!(recorder.len(), before);
}

#[test]
fn blocked_item_resumes_at_the_same_item() {
    let ready = Arc::new(AtomicBool::new(false));
    let a_calls = Arc::new(AtomicUsize::new(0));
    let (gate, counter) = (Arc::clone(&ready), Arc::clone(&a_calls));
    let mut step = TaskStep::new("waits", move |item| match item {
        "a" => {
            counter.fetch_add(1, Ordering::SeqCst);
            TaskOutcome::Completed
        }
        "b" if !gate.load(Ordering::SeqCst) => TaskOutcome::Blocked("quota exhausted".into()),
        _ => TaskOutcome::Completed,
    });
    let recorder = EventRecorder::new();
    recorder.attach(&mut step);
    step.configure(&TaskOptions::new(["a", "b"])).unwrap();

    step.run();
    assert_eq!(step.get_status(), StepStatus::Blocked);
    assert_eq!(step.processed(), 1);
    assert_eq!(step.lifecycle().reason(), Some("item 'b': quota exhausted"));

    ready.store(true, Ordering::SeqCst);
    step.run();
    assert_eq!(step.get_status(), StepStatus::Done);
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(step.lifecycle().runs(), 2);

    let trail = recorder.status_trail();
    assert_eq!(&trail[trail.len() - 3..],
               &[(code(249), code(400)), (code(400), code(249)), (code(249), code(300))]);
}

#[test]
fn missing_options_block_until_configured() {
    let mut step = TaskStep::new("lazy", |_| TaskOutcome::Completed);
    let recorder = EventRecorder::new();
    recorder.attach(&mut step);

    step.run();
    assert_eq!(step.get_status(), StepStatus::Blocked);
    let events = recorder.len();
    step.run();
    assert_eq!(recorder.len(), events, "still unconfigured: no transition");

    step.set_options(json!({"items": ["x"]})).unwrap();
    step.run();
    assert_eq!(step.get_status(), StepStatus::Done);
}

#[test]
fn invalid_options_are_rejected_and_previous_kept() {
    let mut step = TaskStep::new("strict", |_| TaskOutcome::Completed).strict();
    step.set_options(json!({"items": ["keep"]})).unwrap();

    for bad in [json!({"items": []}), json!({"items": "nope"}), json!({"max_attempts": 2}), json!({"items": ["a"], "max_attempts": 0})] {
        let err = step.set_options(bad).unwrap_err();
        assert!(err.is_validation(), "{err}");
    }
    assert_eq!(step.options_value(), Some(json!({"items": ["keep"], "max_attempts": 1})));
    assert_eq!(step.options().map(|o| o.items.len()), Some(1));
}

#[test]
fn options_cannot_change_after_completion() {
    let mut step = TaskStep::new("once", |_| TaskOutcome::Completed);
    step.configure(&TaskOptions::new(["x"])).unwrap();
    step.run();
    assert_eq!(step.get_status(), StepStatus::Done);
    let err = step.set_options(json!({"items": ["y"]})).unwrap_err();
    assert!(matches!(err, StepError::StepAlreadyTerminal { .. }));
    assert_eq!(step.options().map(|o| o.items.clone()), Some(vec!["x".to_string()]));
}

#[test]
fn empty_item_list_completes_immediately() {
    let mut step = TaskStep::new("noop", |_| TaskOutcome::Completed);
    step.set_options(json!({"items": []})).unwrap();
    step.run();
    assert_eq!(step.get_status(), StepStatus::Done);
    assert!(step.get_options(&Value::Null).required_fields().contains(&"items"));
}

#[test]
fn reconfiguring_a_blocked_step_keeps_or_resets_the_cursor() {
    let ready = Arc::new(AtomicBool::new(false));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (gate, sink) = (Arc::clone(&ready), Arc::clone(&seen));
    let mut step = TaskStep::new("reconfigured", move |item| {
        if item == "b" && !gate.load(Ordering::SeqCst) {
            return TaskOutcome::Blocked("waiting".into());
        }
        sink.lock().unwrap().push(item.to_string());
        TaskOutcome::Completed
    });
    step.configure(&TaskOptions::new(["a", "b", "c"])).unwrap();
    step.run();
    assert_eq!(step.get_status(), StepStatus::Blocked);
    assert_eq!(step.processed(), 1);

    // misma lista, otro presupuesto de reintentos: se conserva el avance
    step.configure(&TaskOptions::new(["a", "b", "c"]).with_max_attempts(3)).unwrap();
    assert_eq!(step.processed(), 1);

    // otra lista: se empieza de cero
    step.configure(&TaskOptions::new(["x", "b"])).unwrap();
    assert_eq!(step.processed(), 0);
    assert_eq!(step.get_status(), StepStatus::Blocked);

    ready.store(true, Ordering::SeqCst);
    step.run();
    assert_eq!(step.get_status(), StepStatus::Done);
    assert_eq!(*seen.lock().unwrap(), vec!["a", "x", "b"]);
}

#[test]
fn retry_budget_restarts_after_a_block() {
    let outcomes = Arc::new(Mutex::new(vec![TaskOutcome::Failed("flaky".into()),
                                            TaskOutcome::Blocked("maintenance".into()),
                                            TaskOutcome::Failed("flaky".into()),
                                            TaskOutcome::Completed]));
    let queue = Arc::clone(&outcomes);
    let mut step = TaskStep::new("budget", move |_| {
        let mut queue = queue.lock().unwrap();
        if queue.is_empty() { TaskOutcome::Completed } else { queue.remove(0) }
    });
    step.configure(&TaskOptions::new(["only"]).with_max_attempts(2)).unwrap();

    step.run();
    assert_eq!(step.get_status(), StepStatus::Blocked);

    step.run();
    assert_eq!(step.get_status(), StepStatus::Done);
    assert!(outcomes.lock().unwrap().is_empty());
}
