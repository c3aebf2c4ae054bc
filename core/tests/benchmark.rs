#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(unix)]

use bun_runner_core::bench::BenchmarkConfig;
use bun_runner_core::bench::BenchmarkRequest;
use bun_runner_core::bench::run_benchmark;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn warmup_runs_execute_but_are_not_measured() {
    let dir = tempfile::tempdir().unwrap();
    let request = BenchmarkRequest {
        base_command: vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "echo x >> runs.txt".to_string(),
        ],
        configs: vec![BenchmarkConfig::new("Default", Vec::new())],
        iterations: 3,
        warmup: 2,
        cwd: dir.path().to_path_buf(),
        timeout_ms: Some(5_000),
    };

    let summaries = run_benchmark(&request).await;
    let summary = &summaries["Default"];
    assert_eq!(summary.successes(), 3);
    assert_eq!(summary.failed, 0);

    // Warm-up runs still hit the process: 2 warmup + 3 measured.
    let recorded = tokio::fs::read_to_string(dir.path().join("runs.txt"))
        .await
        .unwrap();
    assert_eq!(recorded.lines().count(), 5);
}

#[tokio::test]
async fn failing_config_does_not_abort_later_configs() {
    let dir = tempfile::tempdir().unwrap();
    // `sh -c "exit 1" -c "exit 0"` runs "exit 1"; the splice puts a config's
    // own `-c <script>` first, so an overriding config can succeed while the
    // plain one fails.
    let request = BenchmarkRequest {
        base_command: vec!["/bin/sh".to_string(), "-c".to_string(), "exit 1".to_string()],
        configs: vec![
            BenchmarkConfig::new("Plain", Vec::new()),
            BenchmarkConfig::new(
                "Overridden",
                vec!["-c".to_string(), "exit 0".to_string()],
            ),
        ],
        iterations: 2,
        warmup: 0,
        cwd: dir.path().to_path_buf(),
        timeout_ms: Some(5_000),
    };

    let summaries = run_benchmark(&request).await;

    let plain = &summaries["Plain"];
    assert_eq!(plain.successes(), 0);
    assert_eq!(plain.failed, 2);
    assert_eq!(plain.average(), None);

    let overridden = &summaries["Overridden"];
    assert_eq!(overridden.successes(), 2);
    assert_eq!(overridden.failed, 0);
    assert!(overridden.average().is_some());

    // Result order follows the supplied configuration order.
    let names: Vec<&String> = summaries.keys().collect();
    assert_eq!(names, vec!["Plain", "Overridden"]);
}

#[tokio::test]
async fn zero_iterations_yield_an_empty_summary() {
    let dir = tempfile::tempdir().unwrap();
    let request = BenchmarkRequest {
        base_command: vec!["/bin/sh".to_string(), "-c".to_string(), "true".to_string()],
        configs: vec![BenchmarkConfig::new("Default", Vec::new())],
        iterations: 0,
        warmup: 0,
        cwd: dir.path().to_path_buf(),
        timeout_ms: Some(5_000),
    };

    let summaries = run_benchmark(&request).await;
    let summary = &summaries["Default"];
    assert_eq!(summary.successes(), 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.requested, 0);
    assert_eq!(summary.average(), None);
}
