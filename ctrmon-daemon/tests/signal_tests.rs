//! Signal listener tests.
//!
//! Signals are fed through an mpsc channel, which implements `SignalSource`.

mod common;

use std::time::Duration;

use tokio::sync::mpsc;

use ctrmon_core::shutdown::ShutdownSignal;
use ctrmon_daemon::signals::{SignalListener, StopTrigger};
use ctrmon_daemon::supervisor::Supervisor;

use common::{MockRuntime, StopCall, sample_config, sample_target, shared};

fn expected_stop() -> StopCall {
    StopCall {
        image_name: "svc:latest".to_owned(),
        container_name: "svc".to_owned(),
        force: false,
    }
}

#[tokio::test]
async fn first_signal_sets_flag_and_stops_once() {
    let runtime = shared(MockRuntime::new());
    let shutdown = ShutdownSignal::new();
    let (tx, rx) = mpsc::channel(4);
    tx.send("SIGTERM").await.unwrap();
    tx.send("SIGINT").await.unwrap();

    let listener = SignalListener::new(runtime.clone(), shutdown.clone(), "svc:latest", "svc");
    let trigger = listener.listen(rx).await;

    assert_eq!(trigger, StopTrigger::Signal("SIGTERM"));
    assert!(shutdown.is_stop_requested());
    assert!(shutdown.token().is_cancelled());
    assert_eq!(runtime.stop_calls(), vec![expected_stop()]);
}

#[tokio::test]
async fn later_signals_are_ignored() {
    let runtime = shared(MockRuntime::new());
    let shutdown = ShutdownSignal::new();
    let (tx, rx) = mpsc::channel(8);

    let listener = SignalListener::new(runtime.clone(), shutdown.clone(), "svc:latest", "svc");
    let handle = tokio::spawn(listener.listen(rx));

    tx.send("SIGQUIT").await.unwrap();
    let trigger = handle.await.unwrap();
    // listener is gone, the second signal has nowhere to go
    assert!(tx.send("SIGTERM").await.is_err());

    assert_eq!(trigger, StopTrigger::Signal("SIGQUIT"));
    assert_eq!(runtime.stop_calls().len(), 1);
    assert!(!shutdown.trigger(), "flag must already be set");
}

#[tokio::test]
async fn cancellation_from_elsewhere_still_stops() {
    let runtime = shared(MockRuntime::new());
    let shutdown = ShutdownSignal::new();
    let (_tx, rx) = mpsc::channel::<&'static str>(1);

    let listener = SignalListener::new(runtime.clone(), shutdown.clone(), "svc:latest", "svc");
    let handle = tokio::spawn(listener.listen(rx));
    shutdown.trigger();

    assert_eq!(handle.await.unwrap(), StopTrigger::Cancelled);
    assert_eq!(runtime.stop_calls(), vec![expected_stop()]);
}

#[tokio::test]
async fn closed_source_waits_for_cancellation() {
    let runtime = shared(MockRuntime::new());
    let shutdown = ShutdownSignal::new();
    let (tx, rx) = mpsc::channel::<&'static str>(1);
    drop(tx);

    let listener = SignalListener::new(runtime.clone(), shutdown.clone(), "svc:latest", "svc");
    let handle = tokio::spawn(listener.listen(rx));

    tokio::task::yield_now().await;
    assert!(runtime.stop_calls().is_empty());

    shutdown.trigger();
    assert_eq!(handle.await.unwrap(), StopTrigger::Cancelled);
    assert_eq!(runtime.stop_calls().len(), 1);
}

#[tokio::test]
async fn stop_failure_is_not_retried() {
    let runtime = shared(MockRuntime::new().failing_stop());
    let shutdown = ShutdownSignal::new();
    let (tx, rx) = mpsc::channel(1);
    tx.send("SIGTERM").await.unwrap();

    let listener = SignalListener::new(runtime.clone(), shutdown.clone(), "svc:latest", "svc");
    let trigger = listener.listen(rx).await;

    assert_eq!(trigger, StopTrigger::Signal("SIGTERM"));
    assert_eq!(runtime.stop_calls().len(), 1);
    assert!(shutdown.is_stop_requested());
}

#[tokio::test]
async fn empty_container_name_is_passed_through() {
    let runtime = shared(MockRuntime::new());
    let shutdown = ShutdownSignal::new();
    let (tx, rx) = mpsc::channel(1);
    tx.send("SIGINT").await.unwrap();

    SignalListener::new(runtime.clone(), shutdown, "svc:latest", "")
        .listen(rx)
        .await;

    let calls = runtime.stop_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].container_name.is_empty());
    assert!(!calls[0].force);
}

#[tokio::test(start_paused = true)]
async fn signal_stops_running_container_and_ends_loop() {
    let runtime = shared(MockRuntime::new().blocking());
    let shutdown = ShutdownSignal::new();
    let (tx, rx) = mpsc::channel(8);

    let listener = SignalListener::new(runtime.clone(), shutdown.clone(), "svc:latest", "svc");
    let listener_handle = tokio::spawn(listener.listen(rx));

    let supervisor = Supervisor::new(
        runtime.clone(),
        shutdown.clone(),
        sample_target(),
        sample_config(),
        Duration::from_secs(2),
    );

    let (attempts, ()) = tokio::join!(supervisor.run(), async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        for name in ["SIGINT", "SIGTERM", "SIGQUIT"] {
            let _ = tx.send(name).await;
        }
    });

    assert_eq!(listener_handle.await.unwrap(), StopTrigger::Signal("SIGINT"));
    assert_eq!(attempts, 1);
    assert_eq!(runtime.start_calls(), 1);
    assert_eq!(runtime.stop_calls(), vec![expected_stop()]);
}
