//! CLI integration tests against the DuckDB-backed sample project

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the compiled ct binary (resolved at compile time)
fn ct_bin() -> String {
    env!("CARGO_BIN_EXE_ct").to_string()
}

fn sample_project_dir() -> &'static str {
    "tests/fixtures/sample_project"
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let path = entry.unwrap().path();
        let target = to.join(path.file_name().unwrap());
        if path.is_dir() {
            copy_dir(&path, &target);
        } else {
            fs::copy(&path, &target).unwrap();
        }
    }
}

/// Copy of the sample project whose `warehouse.duckdb` holds `raw_orders`
/// but not `raw_returns`
fn seeded_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    copy_dir(Path::new(sample_project_dir()), dir.path());

    let conn = duckdb::Connection::open(dir.path().join("warehouse.duckdb")).unwrap();
    conn.execute_batch(
        "CREATE TABLE raw_orders (order_id INTEGER, customer_id INTEGER, amount DOUBLE);
         INSERT INTO raw_orders VALUES (1, 42, 19.99);",
    )
    .unwrap();
    drop(conn);
    dir
}

fn ct(args: &[&str]) -> Output {
    Command::new(ct_bin())
        .args(args)
        .output()
        .expect("Failed to run ct")
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn test_ls_lists_tasks_in_execution_order() {
    let output = ct(&["ls", "--project-dir", sample_project_dir()]);
    assert!(output.status.success(), "ls failed: {}", combined(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in [
        "session",
        "main_orders",
        "main_returns",
        "stg_customers",
        "stg_orders",
        "compile_fct_orders_model",
        "fct_orders",
    ] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
    assert!(stdout.contains("7 tasks"));
}

#[test]
fn test_ls_json_output() {
    let output = ct(&[
        "ls",
        "--project-dir",
        sample_project_dir(),
        "--output",
        "json",
        "--select",
        "fct_orders",
    ]);
    assert!(output.status.success(), "ls failed: {}", combined(&output));

    let tasks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["name"], "compile_fct_orders_model");
    assert_eq!(tasks[1]["name"], "fct_orders");
    assert_eq!(tasks[1]["kind"], "table");
    assert_eq!(tasks[1]["depends_on"][0], "compile_fct_orders_model");
}

#[test]
fn test_graph_text_and_dot() {
    let output = ct(&["graph", "--project-dir", sample_project_dir(), "--format", "text"]);
    assert!(output.status.success(), "graph failed: {}", combined(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fct_orders <- compile_fct_orders_model\n"));

    let output = ct(&["graph", "--project-dir", sample_project_dir()]);
    assert!(output.status.success(), "graph failed: {}", combined(&output));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("digraph {"));
}

#[test]
fn test_run_ephemeral_models() {
    let project = seeded_project();
    let output = ct(&[
        "run",
        "--project-dir",
        project.path().to_str().unwrap(),
        "--select",
        "stg_orders,stg_customers",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "run failed: {}", combined(&output));
    assert!(stdout.contains("✓ stg_orders"));
    assert!(stdout.contains("✓ stg_customers"));
    assert!(stdout.contains("Completed 2 tasks"));
}

#[test]
fn test_run_resolves_source_table() {
    let project = seeded_project();
    let output = ct(&[
        "run",
        "--project-dir",
        project.path().to_str().unwrap(),
        "--select",
        "main_orders",
    ]);
    assert!(output.status.success(), "run failed: {}", combined(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("✓ main_orders"));
}

#[test]
fn test_run_failure_exits_non_zero() {
    let project = seeded_project();
    let output = ct(&[
        "run",
        "--project-dir",
        project.path().to_str().unwrap(),
        "--select",
        "main_returns",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("✗ main_returns"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Pipeline run failed"));
}

#[test]
fn test_verbose_logs_statements() {
    let project = seeded_project();
    let output = ct(&[
        "run",
        "--project-dir",
        project.path().to_str().unwrap(),
        "--select",
        "stg_orders",
        "--verbose",
    ]);
    assert!(output.status.success(), "run failed: {}", combined(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[verbose] DESCRIBE SELECT"));
}

#[test]
fn test_warnings_shown_without_verbose() {
    let dir = TempDir::new().unwrap();
    let models = dir.path().join("models");
    fs::create_dir(&models).unwrap();
    fs::write(models.join("t.sql"), "SELECT 1 AS x").unwrap();
    fs::write(models.join(".draft.sql"), "SELECT 2 AS x").unwrap();
    fs::write(
        dir.path().join("ct.yml"),
        "name: drafts\nconnection:\n  backend: duckdb\nmodel_paths: [models]\n",
    )
    .unwrap();

    let output = ct(&["ls", "--project-dir", dir.path().to_str().unwrap()]);
    assert!(output.status.success(), "ls failed: {}", combined(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: Skipping"), "stderr:\n{}", stderr);
    assert!(!stderr.contains("[verbose]"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("2 tasks"));
}

#[test]
fn test_unknown_target_fails() {
    let output = ct(&["run", "--project-dir", sample_project_dir(), "--select", "nope"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("nope"));
}

#[test]
fn test_missing_project_file() {
    let dir = TempDir::new().unwrap();
    let output = ct(&["ls", "--project-dir", dir.path().to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("Failed to load project"));
}

#[test]
fn test_config_override_and_table_without_engine() {
    let dir = TempDir::new().unwrap();
    let models = dir.path().join("models");
    fs::create_dir(&models).unwrap();
    fs::write(models.join("t.sql"), "SELECT 1 AS x").unwrap();
    let config = dir.path().join("custom.yml");
    fs::write(
        &config,
        "name: broken\nconnection:\n  backend: duckdb\nmodel_paths: [models]\ntables:\n  - model: t\n    engine: ''\n",
    )
    .unwrap();

    let output = ct(&[
        "ls",
        "--project-dir",
        dir.path().to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("Must specify engine"));
}
