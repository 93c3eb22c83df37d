use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use assert_cmd::Command;
use tempfile::TempDir;

struct CliTest {
    _tmp: TempDir,
    work_dir: PathBuf,
    config_path: PathBuf,
    log_dir: PathBuf,
}

impl CliTest {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir().context("failed to create temp dir")?;
        let work_dir = tmp.path().join("work");
        fs::create_dir_all(&work_dir).context("failed to create temporary work directory")?;
        let log_dir = tmp.path().join("logs");
        fs::create_dir_all(&log_dir).context("failed to create temporary log directory")?;
        let config_path = tmp.path().join("config.toml");
        Ok(Self {
            _tmp: tmp,
            work_dir,
            config_path,
            log_dir,
        })
    }

    fn command(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("sdbx")?;
        cmd.current_dir(&self.work_dir);
        cmd.env("SNAPDBX_LOG_DIR", &self.log_dir);
        cmd.arg("--config").arg(&self.config_path);
        Ok(cmd)
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let assert = self.command()?.args(args).assert().success();
        Ok(String::from_utf8_lossy(&assert.get_output().stdout).into_owned())
    }

    fn run_failure(&self, args: &[&str]) -> Result<String> {
        let assert = self.command()?.args(args).assert().failure();
        Ok(String::from_utf8_lossy(&assert.get_output().stderr).into_owned())
    }
}

#[test]
fn record_then_history_round_trips() -> Result<()> {
    let cli = CliTest::new()?;

    let stdout = cli.run(&[
        "snapshot",
        "record",
        "--app-id",
        "570",
        "--total",
        "120",
        "--recent",
        "30",
        "--at",
        "2024-01-05T10:00:00Z",
    ])?;
    assert!(stdout.contains("recorded snapshot for app 570"));

    let stdout = cli.run(&[
        "snapshot",
        "history",
        "--app-id",
        "570",
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-31",
    ])?;
    assert!(
        stdout.contains("\"total_reviews\":120"),
        "unexpected history output:\n{stdout}"
    );

    Ok(())
}

#[test]
fn same_day_record_overwrites_in_history() -> Result<()> {
    let cli = CliTest::new()?;

    for total in ["100", "150"] {
        cli.run(&[
            "snapshot",
            "record",
            "--app-id",
            "10",
            "--total",
            total,
            "--at",
            "2024-01-05T10:00:00Z",
        ])?;
    }

    let stdout = cli.run(&[
        "snapshot",
        "history",
        "--app-id",
        "10",
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-31",
    ])?;
    assert_eq!(stdout.lines().count(), 1, "expected one line:\n{stdout}");
    assert!(stdout.contains("\"total_reviews\":150"));

    Ok(())
}

#[test]
fn status_reports_bucket_and_catalog_counts() -> Result<()> {
    let cli = CliTest::new()?;

    cli.run(&[
        "snapshot",
        "record",
        "--app-id",
        "10",
        "--total",
        "5",
        "--at",
        "2024-02-01T00:00:00Z",
    ])?;

    let stdout = cli.run(&["status"])?;
    assert!(stdout.contains("series buckets: 1"), "got:\n{stdout}");
    assert!(stdout.contains("catalog entries: 0"), "got:\n{stdout}");

    Ok(())
}

#[test]
fn catalog_sync_without_url_fails() -> Result<()> {
    let cli = CliTest::new()?;
    let stderr = cli.run_failure(&["catalog", "sync"])?;
    assert!(
        stderr.contains("catalog_url is not configured"),
        "got:\n{stderr}"
    );
    Ok(())
}

#[test]
fn config_show_and_update() -> Result<()> {
    let cli = CliTest::new()?;

    let stdout = cli.run(&["config"])?;
    assert!(stdout.contains("data_dir"), "got:\n{stdout}");

    cli.run(&["config", "--catalog-url", "http://localhost:7070/catalog"])?;
    let stdout = cli.run(&["config"])?;
    assert!(
        stdout.contains("http://localhost:7070/catalog"),
        "got:\n{stdout}"
    );

    Ok(())
}

#[test]
fn destroy_force_removes_data_and_config() -> Result<()> {
    let cli = CliTest::new()?;

    cli.run(&[
        "snapshot",
        "record",
        "--app-id",
        "10",
        "--total",
        "5",
        "--at",
        "2024-02-01T00:00:00Z",
    ])?;
    assert!(cli.work_dir.join(".snapdbx").exists());

    let stdout = cli.run(&["destroy", "--force"])?;
    assert!(stdout.contains("removed"), "got:\n{stdout}");
    assert!(!cli.work_dir.join(".snapdbx").exists());
    assert!(!cli.config_path.exists());

    Ok(())
}
