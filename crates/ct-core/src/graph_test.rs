use super::*;
use std::sync::Mutex;

/// Graph over integers whose tasks append their name to a shared log
fn recording_graph(spec: &[(&str, &[&str])]) -> (TaskGraph<i64>, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = TaskGraph::new();
    for (name, deps) in spec {
        let log = Arc::clone(&log);
        let owned = name.to_string();
        graph
            .register_fn(name, deps, move |args: &TaskArgs<i64>| {
                log.lock().unwrap().push(owned.clone());
                Ok(1 + args.iter().map(|(_, v)| *v).sum::<i64>())
            })
            .unwrap();
    }
    (graph, log)
}

fn position(order: &[String], name: &str) -> usize {
    order.iter().position(|n| n == name).unwrap()
}

#[test]
fn test_runs_each_task_once_after_dependencies() {
    let (graph, log) = recording_graph(&[
        ("fct_orders", &["stg_orders", "stg_customers"]),
        ("stg_orders", &["raw"]),
        ("stg_customers", &["raw"]),
        ("raw", &[]),
    ]);

    let output = graph.run(&[]).unwrap();
    let executed = log.lock().unwrap().clone();

    assert_eq!(executed.len(), 4);
    let mut unique = executed.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 4);

    assert!(position(&executed, "raw") < position(&executed, "stg_orders"));
    assert!(position(&executed, "raw") < position(&executed, "stg_customers"));
    assert!(position(&executed, "stg_orders") < position(&executed, "fct_orders"));
    assert!(position(&executed, "stg_customers") < position(&executed, "fct_orders"));

    // raw = 1, stg_* = 2, fct = 1 + 2 + 2
    assert_eq!(output.get("fct_orders"), Some(&5));
    assert_eq!(output.order().len(), 4);
}

#[test]
fn test_tie_break_follows_registration_order() {
    let (graph, _) = recording_graph(&[("c", &[]), ("a", &[]), ("b", &[]), ("d", &["a"])]);

    for _ in 0..5 {
        let order: Vec<String> = graph
            .execution_plan(&[])
            .unwrap()
            .into_iter()
            .map(|n| n.into_inner())
            .collect();
        assert_eq!(order, vec!["c", "a", "b", "d"]);
    }
}

#[test]
fn test_reregistration_last_write_wins() {
    let mut graph: TaskGraph<&'static str> = TaskGraph::new();
    graph.register_value("model", "first").unwrap();
    graph.register_value("other", "x").unwrap();
    graph.register_value("model", "second").unwrap();

    assert_eq!(graph.len(), 2);
    let output = graph.run(&[]).unwrap();
    assert_eq!(output.get("model"), Some(&"second"));
    // Replacement keeps the original registration slot
    assert_eq!(output.order()[0], "model");
}

#[test]
fn test_cycle_fails_before_any_execution() {
    let (graph, log) = recording_graph(&[("independent", &[]), ("a", &["b"]), ("b", &["a"])]);

    let err = graph.run(&[]).unwrap_err();
    match err {
        CoreError::CyclicDependency { tasks } => {
            assert_eq!(tasks, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected cycle error, got {other}"),
    }
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let (graph, log) = recording_graph(&[("loop", &["loop"])]);
    assert!(matches!(
        graph.run(&[]),
        Err(CoreError::CyclicDependency { .. })
    ));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_cycle_outside_targets_is_ignored() {
    let (graph, log) = recording_graph(&[("ok", &[]), ("a", &["b"]), ("b", &["a"])]);
    graph.run(&["ok"]).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["ok".to_string()]);
}

#[test]
fn test_unresolved_dependency() {
    let (graph, log) = recording_graph(&[("root", &[]), ("child", &["missing"])]);

    let err = graph.run(&[]).unwrap_err();
    assert!(matches!(
        err,
        CoreError::UnresolvedDependency { ref task, ref dependency }
            if task == "child" && dependency == "missing"
    ));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_dependency_may_be_registered_later() {
    let (mut graph, _) = recording_graph(&[("child", &["parent"])]);
    graph.register_value("parent", 10).unwrap();
    let output = graph.run(&[]).unwrap();
    assert_eq!(output.get("child"), Some(&11));
}

#[test]
fn test_first_failure_stops_run() {
    let (mut graph, log) = recording_graph(&[("first", &[])]);
    graph
        .register_fn("boom", &["first"], |_| anyhow::bail!("table creation failed"))
        .unwrap();
    let after_log = Arc::clone(&log);
    graph
        .register_fn("after", &["boom"], move |_| {
            after_log.lock().unwrap().push("after".into());
            Ok(0)
        })
        .unwrap();
    let (extra, extra_log) = recording_graph(&[("later", &[])]);
    graph.merge(&extra);

    let err = graph.run(&[]).unwrap_err();
    assert_eq!(err.failed_task(), Some("boom"));
    assert!(err.to_string().contains("table creation failed"));
    assert_eq!(*log.lock().unwrap(), vec!["first".to_string()]);
    // "later" comes after "boom" in registration order and never starts
    assert!(extra_log.lock().unwrap().is_empty());
}

#[test]
fn test_task_error_source_is_preserved() {
    #[derive(Debug, thiserror::Error)]
    #[error("store unavailable")]
    struct StoreDown;

    let mut graph: TaskGraph<()> = TaskGraph::new();
    graph
        .register_fn("load", &[], |_| Err(StoreDown.into()))
        .unwrap();

    match graph.run(&[]).unwrap_err() {
        CoreError::TaskFailed { task, source } => {
            assert_eq!(task, "load");
            assert!(source.downcast_ref::<StoreDown>().is_some());
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_targets_limit_execution_to_ancestors() {
    let (graph, log) = recording_graph(&[
        ("raw", &[]),
        ("stg", &["raw"]),
        ("fct", &["stg"]),
        ("unrelated", &[]),
    ]);

    let output = graph.run(&["stg"]).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["raw".to_string(), "stg".to_string()]);
    assert!(output.get("fct").is_none());
}

#[test]
fn test_unknown_target() {
    let (graph, _) = recording_graph(&[("raw", &[])]);
    assert!(matches!(
        graph.run(&["nope"]),
        Err(CoreError::TaskNotFound { ref name }) if name == "nope"
    ));
}

#[test]
fn test_merge_is_union_with_incoming_precedence() {
    let mut base: TaskGraph<i64> = TaskGraph::new();
    base.register_value("shared", 1).unwrap();
    base.register_value("base_only", 2).unwrap();

    let mut other: TaskGraph<i64> = TaskGraph::new();
    other.register_value("shared", 100).unwrap();
    other
        .register_fn("other_only", &["base_only"], |args| Ok(args.at(0).copied().unwrap_or(0) * 3))
        .unwrap();

    base.merge(&other);
    assert_eq!(base.len(), 3);

    let output = base.run(&[]).unwrap();
    assert_eq!(output.get("shared"), Some(&100));
    assert_eq!(output.get("other_only"), Some(&6));
}

#[test]
fn test_observer_sees_state_transitions() {
    let (graph, _) = recording_graph(&[("a", &[]), ("b", &["a"])]);
    let mut events = Vec::new();
    graph
        .run_with(&[], |name, state| events.push((name.to_string(), state)))
        .unwrap();

    assert_eq!(
        events,
        vec![
            ("a".to_string(), TaskState::Registered),
            ("b".to_string(), TaskState::Registered),
            ("a".to_string(), TaskState::Resolving),
            ("a".to_string(), TaskState::Done),
            ("b".to_string(), TaskState::Resolving),
            ("b".to_string(), TaskState::Done),
        ]
    );
}

#[test]
fn test_args_by_name_and_position() {
    let mut graph: TaskGraph<String> = TaskGraph::new();
    graph.register_value("left", "L".to_string()).unwrap();
    graph.register_value("right", "R".to_string()).unwrap();
    graph
        .register_fn("joined", &["right", "left"], |args| {
            let by_name = format!("{}{}", args.get("left").unwrap(), args.get("right").unwrap());
            let by_pos = format!("{}{}", args.at(0).unwrap(), args.at(1).unwrap());
            Ok(format!("{by_name}/{by_pos}"))
        })
        .unwrap();

    let output = graph.run(&["joined"]).unwrap();
    assert_eq!(output.get("joined").unwrap(), "LR/RL");
}

#[test]
fn test_empty_names_rejected() {
    let mut graph: TaskGraph<i64> = TaskGraph::new();
    assert!(matches!(
        graph.register_value("", 1),
        Err(CoreError::EmptyName { .. })
    ));
    assert!(graph.register_fn("x", &[""], |_| Ok(1)).is_err());
    assert!(graph.is_empty());
}

#[test]
fn test_render_text_and_dot() {
    let (graph, _) = recording_graph(&[("raw", &[]), ("stg", &["raw"])]);
    assert_eq!(graph.render_text(), "raw\nstg <- raw\n");

    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("raw"));
    assert!(dot.contains("->"));
}
