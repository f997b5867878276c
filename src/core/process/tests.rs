// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ExecMode, ProcessConfig, ProcessHandle, UNKNOWN_EXIT_CODE};
use crate::error::ProcessError;

fn status(handle: &ProcessHandle) -> &super::Status {
    handle.status().expect("handle should be finalized")
}

#[tokio::test]
async fn test_run_stdout_only() {
    let handle = ProcessHandle::shell("echo -n 123123");
    handle.run().await.expect("echo should succeed");

    let status = status(&handle);
    assert_eq!(status.output(), "123123");
    assert_eq!(status.stdout(), "123123");
    assert_eq!(status.stderr(), "");
    assert_eq!(status.exit_code(), 0);
    assert!(status.finished());
    assert!(status.error().is_none());
    assert!(status.pid().is_some_and(|pid| pid > 0));
}

#[tokio::test]
async fn test_run_stderr_only() {
    let handle = ProcessHandle::shell("echo -n 123123 1>&2");
    handle.run().await.expect("echo should succeed");

    let status = status(&handle);
    assert_eq!(status.output(), "123123");
    assert_eq!(status.stdout(), "");
    assert_eq!(status.stderr(), "123123");
}

#[tokio::test]
async fn test_combined_output_is_union_of_streams() {
    let handle = ProcessHandle::shell("echo out; echo err >&2");
    handle.run().await.unwrap();

    let status = status(&handle);
    assert_eq!(status.stdout(), "out\n");
    assert_eq!(status.stderr(), "err\n");
    let mut combined: Vec<&str> = status.output().lines().collect();
    combined.sort_unstable();
    assert_eq!(combined, vec!["err", "out"]);
}

#[tokio::test]
async fn test_multiline_script() {
    let script = "
        echo -n 1
        echo -n 2
        echo -n 3
    ";
    let handle = ProcessHandle::shell(script);
    handle.run().await.unwrap();
    assert_eq!(status(&handle).output(), "123");
}

#[tokio::test]
async fn test_cost_covers_runtime() {
    let handle = ProcessHandle::shell("sleep 1; echo done");
    handle.run().await.unwrap();

    let cost = handle.cost().expect("cost is set after finalize");
    assert!(cost >= Duration::from_secs(1), "cost was {cost:?}");
}

#[tokio::test]
async fn test_non_zero_exit() {
    let handle = ProcessHandle::shell("exit 3");
    let err = handle.run().await.unwrap_err();

    assert!(matches!(err, ProcessError::NonZeroExit { code: 3 }));
    assert_eq!(status(&handle).exit_code(), 3);
}

#[tokio::test]
async fn test_command_not_found() {
    let handle = ProcessHandle::shell("procwatch-no-such-command-12345");
    let err = handle.run().await.unwrap_err();

    assert!(matches!(err, ProcessError::CommandNotFound));
    assert_eq!(status(&handle).exit_code(), 127);
    assert!(!status(&handle).stderr().is_empty());
    assert_eq!(status(&handle).stdout(), "");
}

#[cfg(unix)]
#[tokio::test]
async fn test_not_executable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("script.sh");
    std::fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o644)).unwrap();

    let handle = ProcessHandle::shell(script.display().to_string());
    let err = handle.run().await.unwrap_err();
    assert!(matches!(err, ProcessError::NotExecutable));
}

#[tokio::test]
async fn test_timeout() {
    let config = ProcessConfig::builder()
        .command("sleep 10; echo 111")
        .timeout(Duration::from_secs(1))
        .build();
    let handle = ProcessHandle::new(config);

    let err = handle.run().await.unwrap_err();
    assert!(matches!(err, ProcessError::Timeout { .. }));

    let cost = handle.cost().unwrap();
    assert!(cost >= Duration::from_secs(1), "cost was {cost:?}");
    assert!(cost < Duration::from_millis(1500), "cost was {cost:?}");
    assert_eq!(status(&handle).exit_code(), UNKNOWN_EXIT_CODE);
}

#[tokio::test]
async fn test_zero_timeout_is_unbounded() {
    let config = ProcessConfig::builder()
        .command("sleep 0.2")
        .timeout(Duration::ZERO)
        .build();
    assert!(config.timeout().is_none());
    ProcessHandle::new(config).run().await.unwrap();
}

#[tokio::test]
async fn test_timeout_preserves_partial_output() {
    let config = ProcessConfig::builder()
        .command("echo before; sleep 10")
        .timeout(Duration::from_millis(500))
        .build();
    let handle = ProcessHandle::new(config);
    let _ = handle.run().await;

    assert_eq!(status(&handle).stdout(), "before\n");
}

#[tokio::test]
async fn test_fast_stop() {
    let start = Instant::now();
    let handle = ProcessHandle::shell("sleep 5; echo 123; sleep 123");
    handle.start().unwrap();
    handle.stop();

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, ProcessError::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delayed_stop_from_another_task() {
    let start = Instant::now();
    let handle = Arc::new(ProcessHandle::shell("sleep 5; echo 123; sleep 123"));
    handle.start().unwrap();

    let stopper = Arc::clone(&handle);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        stopper.stop();
    });

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, ProcessError::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[cfg(unix)]
#[tokio::test]
async fn test_stop_leaves_no_live_child() {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let handle = ProcessHandle::shell("sleep 30; echo unreachable");
    handle.start().unwrap();
    let pid = Pid::from_raw(i32::try_from(handle.pid().unwrap()).unwrap());
    tokio::time::sleep(Duration::from_millis(200)).await;

    handle.stop();
    let _ = handle.wait().await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(kill(pid, None).is_err(), "child should be killed and reaped");
    assert_eq!(status(&handle).stdout(), "");
}

/// True once `pid` is gone or only a zombie awaiting its new parent.
#[cfg(unix)]
fn is_dead(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if kill(Pid::from_raw(pid), None).is_err() {
        return true;
    }
    std::fs::read_to_string(format!("/proc/{pid}/stat")).map_or(true, |stat| {
        stat.rsplit(')')
            .next()
            .is_some_and(|rest| rest.trim_start().starts_with('Z'))
    })
}

/// Starts a shell that backgrounds a `sleep` and returns the sleep's pid.
#[cfg(unix)]
async fn start_with_grandchild(
    dir: &tempfile::TempDir,
    timeout: Option<Duration>,
) -> (ProcessHandle, i32) {
    let pidfile = dir.path().join("grandchild.pid");
    let config = ProcessConfig::builder()
        .command(format!(
            "sleep 30 & echo $! > '{}'; wait",
            pidfile.display()
        ))
        .maybe_timeout(timeout)
        .build();
    let handle = ProcessHandle::new(config);
    handle.start().unwrap();

    for _ in 0..100 {
        if let Ok(pid) = std::fs::read_to_string(&pidfile)
            && let Ok(pid) = pid.trim().parse::<i32>()
        {
            return (handle, pid);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("grandchild pid was never written");
}

#[cfg(unix)]
#[tokio::test]
async fn test_stop_kills_grandchildren() {
    let dir = tempfile::tempdir().unwrap();
    let (handle, grandchild) = start_with_grandchild(&dir, None).await;
    assert!(!is_dead(grandchild));

    handle.stop();
    assert!(matches!(handle.wait().await, Err(ProcessError::Cancelled)));
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(is_dead(grandchild), "grandchild {grandchild} survived stop");
}

#[cfg(unix)]
#[tokio::test]
async fn test_timeout_kills_grandchildren() {
    let dir = tempfile::tempdir().unwrap();
    let (handle, grandchild) =
        start_with_grandchild(&dir, Some(Duration::from_millis(500))).await;

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, ProcessError::Timeout { .. }));
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(is_dead(grandchild), "grandchild {grandchild} survived timeout");
}

#[tokio::test]
async fn test_timeout_keeps_output_burst() {
    let config = ProcessConfig::builder()
        .command("seq 1 50000; sleep 10")
        .timeout(Duration::from_millis(700))
        .build();
    let handle = ProcessHandle::new(config);

    let err = handle.run().await.unwrap_err();
    assert!(matches!(err, ProcessError::Timeout { .. }));

    let status = status(&handle);
    assert_eq!(status.stdout().lines().count(), 50000);
    assert!(status.stdout().ends_with("50000\n"));
    assert!(status.cost() < Duration::from_millis(1200), "cost was {:?}", status.cost());
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let handle = ProcessHandle::shell("sleep 30");
    handle.start().unwrap();
    handle.stop();
    handle.stop();
    assert!(matches!(handle.wait().await, Err(ProcessError::Cancelled)));

    let cost = handle.cost();
    assert!(cost.is_some());
    handle.stop();
    assert!(matches!(handle.wait().await, Err(ProcessError::Cancelled)));
    assert_eq!(handle.cost(), cost);
}

#[tokio::test]
async fn test_stop_after_completion_keeps_status() {
    let handle = ProcessHandle::shell("echo -n ok");
    handle.run().await.unwrap();
    handle.stop();

    let status = status(&handle);
    assert!(status.error().is_none());
    assert_eq!(status.stdout(), "ok");
    assert!(handle.wait().await.is_ok());
}

#[tokio::test]
async fn test_stop_before_start_is_noop() {
    let handle = ProcessHandle::shell("echo -n late");
    handle.stop();
    assert!(!handle.is_finished());

    handle.run().await.unwrap();
    assert_eq!(status(&handle).stdout(), "late");
}

#[tokio::test]
async fn test_start_twice_fails() {
    let handle = ProcessHandle::shell("sleep 0.2");
    handle.start().unwrap();
    assert!(matches!(handle.start(), Err(ProcessError::AlreadyStarted)));

    handle.wait().await.unwrap();
    assert!(matches!(handle.start(), Err(ProcessError::AlreadyFinished)));
}

#[tokio::test]
async fn test_spawn_failure_finalizes() {
    let config = ProcessConfig::argv("/nonexistent/procwatch-binary", ["--flag"]);
    let handle = ProcessHandle::new(config);

    let err = handle.start().unwrap_err();
    assert!(matches!(err, ProcessError::SpawnFailed { .. }));
    assert!(handle.is_finished());
    assert!(matches!(
        handle.wait().await,
        Err(ProcessError::SpawnFailed { .. })
    ));
    assert!(status(&handle).pid().is_none());
    assert!(matches!(handle.start(), Err(ProcessError::AlreadyFinished)));
}

#[tokio::test]
async fn test_exec_mode_splits_command() {
    let config = ProcessConfig::builder()
        .command("echo a  b")
        .mode(ExecMode::Exec)
        .build();
    let handle = ProcessHandle::new(config);
    handle.run().await.unwrap();
    assert_eq!(status(&handle).stdout(), "a b\n");
}

#[tokio::test]
async fn test_exec_mode_empty_command() {
    let config = ProcessConfig::builder()
        .command("   ")
        .mode(ExecMode::Exec)
        .build();
    let handle = ProcessHandle::new(config);
    assert!(matches!(
        handle.start(),
        Err(ProcessError::InvalidCommand { .. })
    ));
}

#[tokio::test]
async fn test_cwd_and_env() {
    let dir = tempfile::tempdir().unwrap();
    let config = ProcessConfig::builder()
        .command("pwd; echo -n $PROCWATCH_TEST_VAR")
        .cwd(dir.path())
        .build()
        .with_env_list(["PROCWATCH_TEST_VAR=test_value"])
        .unwrap();
    let handle = ProcessHandle::new(config);
    handle.run().await.unwrap();

    let stdout = status(&handle).stdout().to_string();
    let canonical = dir.path().canonicalize().unwrap();
    assert!(stdout.starts_with(&canonical.display().to_string()), "{stdout}");
    assert!(stdout.ends_with("test_value"));
}

#[test]
fn test_env_list_rejects_malformed_entry() {
    let result = ProcessConfig::shell_command("true").with_env_list(["NOEQUALS"]);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_line_queue_receives_both_streams() {
    let (tx, rx) = flume::bounded(16);
    let handle = ProcessHandle::shell("echo 123; echo 456 >&2; echo -n 789").with_line_queue(tx);
    handle.run().await.unwrap();

    let mut lines: Vec<String> = rx.drain().collect();
    lines.sort();
    assert_eq!(lines, vec!["123", "456", "789"]);
    assert!(rx.is_disconnected());
}

#[tokio::test]
async fn test_line_queue_closed_after_spawn_failure() {
    let (tx, rx) = flume::unbounded::<String>();
    let config = ProcessConfig::builder()
        .command("echo hi")
        .shell("/procwatch/missing/shell")
        .build();
    let handle = ProcessHandle::new(config).with_line_queue(tx);

    let err = handle.start().unwrap_err();
    assert!(matches!(err, ProcessError::SpawnFailed { .. }));
    assert!(handle.is_finished());
    assert!(rx.is_disconnected());
    assert!(rx.recv_async().await.is_err());
}

#[tokio::test]
async fn test_fresh_copies_configuration() {
    let config = ProcessConfig::builder()
        .command("echo -n again")
        .timeout(Duration::from_secs(5))
        .build();
    let handle = ProcessHandle::new(config);
    handle.run().await.unwrap();

    let next = handle.fresh();
    assert!(!next.is_finished());
    assert_eq!(next.config().timeout(), Some(Duration::from_secs(5)));
    next.run().await.unwrap();
    assert_eq!(status(&next).stdout(), "again");
}

#[cfg(unix)]
#[tokio::test]
async fn test_kill_with_custom_signal() {
    use super::Signal;

    let handle = ProcessHandle::shell("sleep 30");
    handle.start().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.kill(Signal::SIGTERM).unwrap();

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, ProcessError::NonZeroExit { .. }));
    // A killed process is not classified as cancelled.
    assert!(!err.is_terminated());
    // After finalize the pid is no longer signalled.
    handle.kill(Signal::SIGTERM).unwrap();
}

#[test]
fn test_start_outside_runtime() {
    let handle = ProcessHandle::shell("true");
    assert!(matches!(handle.start(), Err(ProcessError::NoRuntime)));
}

#[test]
fn test_command_line_rendering() {
    let config = ProcessConfig::argv("git", ["commit", "-m", "two words"]);
    insta::assert_snapshot!(config.command_line(), @r#"git commit -m "two words""#);

    let shell = ProcessConfig::builder()
        .command("echo hi")
        .shell("sh")
        .build();
    insta::assert_snapshot!(shell.command_line(), @r#"sh -c "echo hi""#);
}
