// Dispatch orchestrator tests: argument convention and restart semantics

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use dispatchmon::dispatcher::DispatchOrchestrator;

/// Writes an executable script that records its arguments and then idles.
fn recording_script(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
    let args_file = dir.path().join("args.txt");
    let script = dir.path().join("dispatch.sh");
    let body = format!("#!/bin/sh\nprintf '%s' \"$*\" > {}\nsleep 30\n", args_file.display());
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    (script, args_file)
}

fn orchestrator(executable: impl Into<PathBuf>) -> DispatchOrchestrator {
    DispatchOrchestrator::new(
        executable,
        Duration::from_millis(100),
        Duration::from_secs(10),
    )
}

#[tokio::test]
async fn restart_prefixes_start_and_passes_weighted_tokens() {
    let dir = tempfile::TempDir::new().unwrap();
    let (script, args_file) = recording_script(&dir);
    let mut dispatch = orchestrator(&script);

    let tokens = vec!["192.168.1.10/2".to_string(), "10.0.0.9/7".to_string()];
    assert!(dispatch.restart(&tokens).await.expect("restart"));
    assert!(dispatch.is_running());

    let recorded = std::fs::read_to_string(&args_file).unwrap();
    assert_eq!(recorded, "start 192.168.1.10/2 10.0.0.9/7");
    assert!(dispatch.stop().await);
}

#[tokio::test]
async fn restart_with_empty_tokens_leaves_the_dispatcher_stopped() {
    let mut dispatch = orchestrator("/definitely/not/a/real/binary");
    let running = dispatch.restart(&[]).await.expect("empty restart");
    assert!(!running);
    assert!(!dispatch.is_running());
}

#[tokio::test]
async fn restart_replaces_a_running_process() {
    let dir = tempfile::TempDir::new().unwrap();
    let (script, args_file) = recording_script(&dir);
    let mut dispatch = orchestrator(&script);

    assert!(dispatch.restart(&["1.1.1.1/1".to_string()]).await.unwrap());
    assert!(dispatch.restart(&["2.2.2.2/2".to_string()]).await.unwrap());
    assert!(dispatch.is_running());

    let recorded = std::fs::read_to_string(&args_file).unwrap();
    assert_eq!(recorded, "start 2.2.2.2/2");
    assert!(dispatch.stop().await);
}

#[tokio::test]
async fn restart_to_empty_stops_a_running_process() {
    let dir = tempfile::TempDir::new().unwrap();
    let (script, _) = recording_script(&dir);
    let mut dispatch = orchestrator(&script);

    assert!(dispatch.restart(&["1.1.1.1/1".to_string()]).await.unwrap());
    assert!(dispatch.is_running());

    assert!(!dispatch.restart(&[]).await.unwrap());
    assert!(!dispatch.is_running());
}
