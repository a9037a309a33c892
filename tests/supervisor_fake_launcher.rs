// tests/supervisor_fake_launcher.rs
//
// Build/restart behaviour of the supervisor against a launcher that never
// touches the OS.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Duration;

use autobuild::supervisor::{CommandLine, ExitOutcome, ManagedProcess, Supervisor};
use autobuild::types::RebuildSignal;
use autobuild_test_utils::{init_tracing, with_timeout, FakeLauncher, LauncherEvent};

fn supervisor(launcher: &FakeLauncher) -> Supervisor {
    init_tracing();
    Supervisor::new(
        CommandLine::parse("go install -v").unwrap(),
        CommandLine::parse("./app --port 8080").unwrap(),
        Arc::new(launcher.clone()),
    )
}

fn build() -> LauncherEvent {
    LauncherEvent::Build("go install -v".to_string())
}

fn launch(id: u32) -> LauncherEvent {
    LauncherEvent::Launch {
        id,
        cmd: "./app --port 8080".to_string(),
    }
}

async fn wait_for_launches(launcher: &FakeLauncher, n: usize) {
    with_timeout(launcher.wait_until(|events| {
        events
            .iter()
            .filter(|e| matches!(e, LauncherEvent::Launch { .. }))
            .count()
            >= n
    }))
    .await;
}

/// Wait until no restart task holds the process lock.
async fn settle(managed: &ManagedProcess) {
    drop(with_timeout(managed.lock()).await);
}

#[tokio::test]
async fn successful_build_launches_the_application() {
    let launcher = FakeLauncher::new();
    let sup = supervisor(&launcher);

    assert!(sup.rebuild().await);
    wait_for_launches(&launcher, 1).await;

    assert_eq!(launcher.events(), vec![build(), launch(1)]);
    assert!(sup.managed().is_running().await);
    assert_eq!(sup.managed().current_pid().await, Some(1));
}

#[tokio::test]
async fn restart_kills_the_previous_process_before_launching() {
    let launcher = FakeLauncher::new();
    let sup = supervisor(&launcher);

    sup.rebuild().await;
    wait_for_launches(&launcher, 1).await;
    sup.rebuild().await;
    wait_for_launches(&launcher, 2).await;

    assert_eq!(
        launcher.events(),
        vec![build(), launch(1), build(), LauncherEvent::Kill { id: 1 }, launch(2)]
    );
    assert_eq!(launcher.max_live(), 1);
    assert_eq!(launcher.live(), 1);
}

#[tokio::test]
async fn failed_build_kills_and_does_not_launch() {
    let launcher = FakeLauncher::new();
    launcher.push_build_outcome(ExitOutcome::Success);
    launcher.push_build_outcome(ExitOutcome::Failed(2));
    let sup = supervisor(&launcher);

    sup.rebuild().await;
    wait_for_launches(&launcher, 1).await;
    assert!(!sup.rebuild().await);

    assert_eq!(
        launcher.events(),
        vec![build(), launch(1), build(), LauncherEvent::Kill { id: 1 }]
    );
    assert_eq!(launcher.live(), 0);
    assert!(!sup.managed().is_running().await);
}

#[tokio::test]
async fn failed_build_with_nothing_running_is_a_no_op() {
    let launcher = FakeLauncher::new();
    launcher.push_build_outcome(ExitOutcome::Failed(1));
    let sup = supervisor(&launcher);

    assert!(!sup.rebuild().await);
    assert_eq!(launcher.events(), vec![build()]);
}

#[tokio::test]
async fn build_that_cannot_start_counts_as_failed() {
    let launcher = FakeLauncher::new();
    launcher.push_build_start_failure();
    let sup = supervisor(&launcher);

    assert!(!sup.rebuild().await);
    assert_eq!(launcher.launches(), 0);
}

#[tokio::test]
async fn run_command_that_cannot_start_leaves_nothing_running() {
    let launcher = FakeLauncher::new();
    launcher.fail_launches(true);
    let sup = supervisor(&launcher);

    assert!(sup.rebuild().await);
    settle(&sup.managed()).await;

    let slot = sup.managed().lock().await;
    assert!(!slot.is_running());
    assert_eq!(slot.launches(), 0);
    drop(slot);

    // The next successful cycle still works.
    launcher.fail_launches(false);
    sup.rebuild().await;
    wait_for_launches(&launcher, 1).await;
    assert!(sup.managed().is_running().await);
}

#[tokio::test]
async fn kill_errors_are_logged_and_the_restart_proceeds() {
    let launcher = FakeLauncher::new();
    launcher.fail_kills(true);
    let sup = supervisor(&launcher);

    sup.rebuild().await;
    wait_for_launches(&launcher, 1).await;
    sup.rebuild().await;
    wait_for_launches(&launcher, 2).await;

    assert_eq!(launcher.kills(), 1);
    assert_eq!(sup.managed().current_pid().await, Some(2));
}

#[tokio::test]
async fn natural_exit_clears_the_slot_and_next_launch_needs_no_kill() {
    let launcher = FakeLauncher::new();
    let sup = supervisor(&launcher);
    let managed = sup.managed();

    sup.rebuild().await;
    wait_for_launches(&launcher, 1).await;

    assert!(launcher.exit_process(1, ExitOutcome::Failed(3)));
    with_timeout(async {
        while managed.is_running().await {
            tokio::task::yield_now().await;
        }
    })
    .await;

    sup.rebuild().await;
    wait_for_launches(&launcher, 2).await;

    assert_eq!(
        launcher.events(),
        vec![build(), launch(1), LauncherEvent::Exit { id: 1 }, build(), launch(2)]
    );
}

#[tokio::test]
async fn kill_after_natural_exit_does_not_hang() {
    let launcher = FakeLauncher::new();
    let sup = supervisor(&launcher);
    let managed = sup.managed();

    sup.rebuild().await;
    wait_for_launches(&launcher, 1).await;

    // Exit and kill race; either order must leave nothing running.
    launcher.exit_process(1, ExitOutcome::Success);
    with_timeout(managed.kill()).await;

    assert!(!managed.is_running().await);
    assert_eq!(launcher.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn signals_are_handled_one_build_at_a_time() {
    let launcher = FakeLauncher::new();
    launcher.set_build_delay(Duration::from_millis(200));
    let sup = supervisor(&launcher);
    let managed = sup.managed();

    let (tx, rx) = mpsc::channel(1);
    let supervisor_task = tokio::spawn(sup.run(rx));

    for _ in 0..3 {
        tx.send(RebuildSignal).await.unwrap();
    }
    drop(tx);

    with_timeout(supervisor_task).await.unwrap();
    settle(&managed).await;

    assert_eq!(launcher.builds(), 3);
    assert_eq!(launcher.launches(), 3);
    assert_eq!(launcher.max_builds_in_flight(), 1);
    assert_eq!(launcher.max_live(), 1);
}

#[tokio::test]
async fn startup_signal_runs_exactly_one_cycle() {
    let launcher = FakeLauncher::new();
    let sup = supervisor(&launcher);

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        tx.send(RebuildSignal).await.unwrap();
    });

    with_timeout(sup.run(rx)).await;
    wait_for_launches(&launcher, 1).await;

    assert_eq!(launcher.builds(), 1);
    assert_eq!(launcher.events(), vec![build(), launch(1)]);
}
