use super::*;
use ct_core::{Schema, SessionConfig, SqlModel};
use ct_db::testing::RecordingStore;
use std::fs;
use tempfile::TempDir;

fn write(dir: &Path, relative: &str, sql: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, sql).unwrap();
    path
}

#[test]
fn test_model_name_is_lowercased_stem() {
    assert_eq!(
        sql_model_name(Path::new("models/Orders.Daily.SQL")).unwrap(),
        "orders"
    );
    assert_eq!(sql_model_name(Path::new("stg_users.sql")).unwrap(), "stg_users");
    assert!(sql_model_name(Path::new(".sql")).is_none());
}

#[test]
fn test_load_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Enriched.sql", "SELECT 1 AS x;\n");

    let file = SqlFile::load(&path).unwrap();
    assert_eq!(file.name, "enriched");
    assert_eq!(file.sql, "SELECT 1 AS x;\n");
    assert_eq!(file.path, path);
}

#[test]
fn test_load_rejects_bad_paths() {
    let dir = TempDir::new().unwrap();
    let txt = write(dir.path(), "notes.txt", "SELECT 1");

    for (path, reason) in [
        (dir.path().join("missing.sql"), "does not exist"),
        (dir.path().to_path_buf(), "not a regular file"),
        (txt, "extension"),
    ] {
        match SqlFile::load(&path) {
            Err(CoreError::NotFound { reason: r, .. }) => assert!(r.contains(reason), "{}", r),
            other => panic!("expected NotFound for {}, got {:?}", path.display(), other),
        }
    }
}

#[test]
fn test_discover_is_sorted_and_recursive() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.sql", "SELECT 2");
    write(dir.path(), "a.SQL", "SELECT 1");
    write(dir.path(), "sub/c.sql", "SELECT 3");
    write(dir.path(), "readme.md", "# models");

    let names: Vec<String> = discover_sql_files(dir.path())
        .unwrap()
        .iter()
        .map(|p| sql_model_name(p).unwrap().into_inner())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_discover_skips_files_without_model_name() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "orders.sql", "SELECT 1");
    write(dir.path(), ".draft.sql", "SELECT 2");
    write(dir.path(), "sub/.wip.SQL", "SELECT 3");

    let files = discover_sql_files(dir.path()).unwrap();
    assert_eq!(files, vec![dir.path().join("orders.sql")]);

    match SqlFile::load(&dir.path().join(".draft.sql")) {
        Err(CoreError::EmptyName { .. }) => {}
        other => panic!("expected EmptyName, got {:?}", other),
    }
}

#[test]
fn test_model_from_fn_passes_dependencies() {
    let task = model_from_fn("doubled", &["orders"], |args| {
        let upstream = args
            .get("orders")
            .and_then(Value::as_model)
            .ok_or_else(|| anyhow::anyhow!("orders missing"))?;
        Ok(SqlModel::new(
            format!("SELECT id * 2 AS id FROM ({})", upstream.compile()),
            upstream.schema().clone(),
        )
        .into_shared())
    })
    .unwrap();

    assert_eq!(task.dependencies(), &["orders"]);

    let orders = SqlModel::table_ref("db", "orders", Schema::default()).into_shared();
    let args = TaskArgs::new(vec![(TaskName::new("orders"), Value::Model(orders))]);
    let result = task.call(&args).unwrap();
    assert_eq!(
        result.as_model().unwrap().compile(),
        "SELECT id * 2 AS id FROM (SELECT * FROM db.orders)"
    );
}

#[test]
fn test_model_from_fn_rejects_empty_name() {
    assert!(model_from_fn("", &[], |_| Ok(SqlModel::new("SELECT 1", Schema::default()).into_shared())).is_err());
}

#[test]
fn test_sql_file_task_plans_through_session() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "totals.sql", "SELECT sum(amount) AS total FROM db.orders;");
    let schema: Schema = [("total", "Float64")].into_iter().collect();
    let store = RecordingStore::new()
        .with_query("SELECT sum(amount) AS total FROM db.orders", schema.clone());
    let session = Session::builder()
        .from_configs(SessionConfig::default())
        .connector(store.connector())
        .create()
        .unwrap();

    let task = model_from_sql_file(&path, &session).unwrap();
    assert_eq!(task.name(), "totals");
    assert!(task.dependencies().is_empty());

    let value = task.call(&TaskArgs::default()).unwrap();
    assert_eq!(value.as_model().unwrap().schema(), &schema);
}
