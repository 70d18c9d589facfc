//! Task graph: registration, dependency resolution and sequential execution

use crate::error::{CoreError, CoreResult};
use crate::task_name::TaskName;
use petgraph::algo::tarjan_scc;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Callable behind a task. Receives the resolved results of the task's
/// declared dependencies.
pub type TaskFn<V> = Arc<dyn Fn(&TaskArgs<V>) -> anyhow::Result<V> + Send + Sync>;

/// Lifecycle of a task within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Registered,
    Resolving,
    Done,
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Registered => "registered",
            TaskState::Resolving => "resolving",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A named unit of work with declared upstream dependencies
pub struct Task<V> {
    name: TaskName,
    dependencies: Vec<TaskName>,
    func: TaskFn<V>,
}

impl<V> Clone for Task<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            dependencies: self.dependencies.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<V> fmt::Debug for Task<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl<V> Task<V> {
    /// Build a task from a callable and an explicit dependency list
    pub fn new<F>(name: &str, dependencies: &[&str], func: F) -> CoreResult<Self>
    where
        F: Fn(&TaskArgs<V>) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Ok(Self {
            name: TaskName::try_new(name)?,
            dependencies: dependencies
                .iter()
                .map(|d| TaskName::try_new(*d))
                .collect::<CoreResult<_>>()?,
            func: Arc::new(func),
        })
    }

    /// Build a task from already validated names
    pub fn from_parts<F>(name: TaskName, dependencies: Vec<TaskName>, func: F) -> Self
    where
        F: Fn(&TaskArgs<V>) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Self {
            name,
            dependencies,
            func: Arc::new(func),
        }
    }

    /// Zero-argument task that always yields a clone of `value`
    pub fn from_value(name: &str, value: V) -> CoreResult<Self>
    where
        V: Clone + Send + Sync + 'static,
    {
        Self::new(name, &[], move |_| Ok(value.clone()))
    }

    pub fn name(&self) -> &TaskName {
        &self.name
    }

    pub fn dependencies(&self) -> &[TaskName] {
        &self.dependencies
    }

    /// Invoke the callable directly, outside of a graph run
    pub fn call(&self, args: &TaskArgs<V>) -> anyhow::Result<V> {
        (self.func)(args)
    }
}

/// Resolved dependency results handed to a task, in declaration order
#[derive(Debug)]
pub struct TaskArgs<V> {
    entries: Vec<(TaskName, V)>,
}

impl<V> Default for TaskArgs<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> TaskArgs<V> {
    pub fn new(entries: Vec<(TaskName, V)>) -> Self {
        Self { entries }
    }

    /// Result of the dependency called `name`
    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Result of the `index`-th declared dependency
    pub fn at(&self, index: usize) -> Option<&V> {
        self.entries.get(index).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskName, &V)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Results of a successful run
#[derive(Debug)]
pub struct RunOutput<V> {
    order: Vec<TaskName>,
    results: HashMap<TaskName, V>,
}

impl<V> RunOutput<V> {
    /// Tasks in the order they executed
    pub fn order(&self) -> &[TaskName] {
        &self.order
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> HashMap<TaskName, V> {
        self.results
    }
}

/// A directed acyclic graph of named tasks.
///
/// Task names are unique keys: registering a name that already exists
/// replaces the earlier task (last write wins) while keeping its original
/// registration position. Dependencies are resolved lazily when a run is
/// planned, so tasks may be registered in any order.
pub struct TaskGraph<V> {
    tasks: HashMap<TaskName, Task<V>>,
    /// Registration sequence, used as the topological tie-break
    order: Vec<TaskName>,
}

impl<V> Default for TaskGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for TaskGraph<V> {
    fn clone(&self) -> Self {
        Self {
            tasks: self.tasks.clone(),
            order: self.order.clone(),
        }
    }
}

impl<V> fmt::Debug for TaskGraph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.order)
            .finish()
    }
}

impl<V> TaskGraph<V> {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a task, replacing any task with the same name
    pub fn register(&mut self, task: Task<V>) {
        let name = task.name.clone();
        if self.tasks.insert(name.clone(), task).is_some() {
            log::warn!("Task '{}' re-registered; previous definition replaced", name);
        } else {
            self.order.push(name);
        }
    }

    /// Register a callable with explicit dependencies
    pub fn register_fn<F>(&mut self, name: &str, dependencies: &[&str], func: F) -> CoreResult<()>
    where
        F: Fn(&TaskArgs<V>) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.register(Task::new(name, dependencies, func)?);
        Ok(())
    }

    /// Register a raw value as a zero-argument task
    pub fn register_value(&mut self, name: &str, value: V) -> CoreResult<()>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.register(Task::from_value(name, value)?);
        Ok(())
    }

    /// Add every task of `other` to this graph.
    ///
    /// Name collisions are not validated: the incoming task replaces the
    /// existing one.
    pub fn merge(&mut self, other: &TaskGraph<V>) {
        for name in &other.order {
            if let Some(task) = other.tasks.get(name) {
                self.register(task.clone());
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Task<V>> {
        self.tasks.get(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in registration order
    pub fn tasks(&self) -> impl Iterator<Item = &Task<V>> {
        self.order.iter().filter_map(|n| self.tasks.get(n))
    }

    /// Declared dependencies of a task, empty if the task is unknown
    pub fn dependencies(&self, name: &str) -> &[TaskName] {
        self.tasks
            .get(name)
            .map(|t| t.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Order in which `run` would execute `targets` (all tasks if empty).
    ///
    /// Fails if a target or a dependency is unregistered, or if the selected
    /// tasks contain a cycle.
    pub fn execution_plan(&self, targets: &[&str]) -> CoreResult<Vec<TaskName>> {
        let selected = self.reachable(targets)?;
        let (graph, _) = self.build_graph(&selected);
        Self::check_acyclic(&graph)?;
        Ok(Self::stable_toposort(&graph))
    }

    /// Run `targets` and everything they depend on (all tasks if empty)
    pub fn run(&self, targets: &[&str]) -> CoreResult<RunOutput<V>>
    where
        V: Clone,
    {
        self.run_with(targets, |_, _| {})
    }

    /// Like [`run`](Self::run), reporting every task state change to `observer`.
    ///
    /// Nothing executes unless the whole plan resolves. The first failing task
    /// stops the run; side effects of tasks that already completed stay in place.
    pub fn run_with<F>(&self, targets: &[&str], mut observer: F) -> CoreResult<RunOutput<V>>
    where
        V: Clone,
        F: FnMut(&TaskName, TaskState),
    {
        let order = self.execution_plan(targets)?;
        for name in &order {
            observer(name, TaskState::Registered);
        }

        let mut results: HashMap<TaskName, V> = HashMap::with_capacity(order.len());
        for name in &order {
            let Some(task) = self.tasks.get(name) else {
                return Err(CoreError::TaskNotFound {
                    name: name.to_string(),
                });
            };

            observer(name, TaskState::Resolving);
            let args = self.collect_args(task, &results)?;

            log::debug!("Running task '{}'", name);
            match task.call(&args) {
                Ok(value) => {
                    results.insert(name.clone(), value);
                    observer(name, TaskState::Done);
                }
                Err(source) => {
                    observer(name, TaskState::Failed);
                    log::debug!("Task '{}' failed: {:#}", name, source);
                    return Err(CoreError::TaskFailed {
                        task: name.to_string(),
                        source,
                    });
                }
            }
        }

        Ok(RunOutput { order, results })
    }

    fn collect_args(&self, task: &Task<V>, results: &HashMap<TaskName, V>) -> CoreResult<TaskArgs<V>>
    where
        V: Clone,
    {
        let entries = task
            .dependencies
            .iter()
            .map(|dep| {
                results
                    .get(dep)
                    .map(|v| (dep.clone(), v.clone()))
                    .ok_or_else(|| CoreError::UnresolvedDependency {
                        task: task.name.to_string(),
                        dependency: dep.to_string(),
                    })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(TaskArgs::new(entries))
    }

    /// Tasks reachable from `targets` by walking dependency edges backwards
    fn reachable(&self, targets: &[&str]) -> CoreResult<HashSet<TaskName>> {
        let mut stack: Vec<TaskName> = if targets.is_empty() {
            self.order.clone()
        } else {
            targets
                .iter()
                .map(|t| {
                    self.tasks
                        .get_key_value(*t)
                        .map(|(k, _)| k.clone())
                        .ok_or_else(|| CoreError::TaskNotFound {
                            name: t.to_string(),
                        })
                })
                .collect::<CoreResult<_>>()?
        };

        let mut selected = HashSet::new();
        while let Some(name) = stack.pop() {
            if !selected.insert(name.clone()) {
                continue;
            }
            let task = &self.tasks[&name];
            for dep in &task.dependencies {
                if !self.tasks.contains_key(dep) {
                    return Err(CoreError::UnresolvedDependency {
                        task: name.to_string(),
                        dependency: dep.to_string(),
                    });
                }
                if !selected.contains(dep) {
                    stack.push(dep.clone());
                }
            }
        }
        Ok(selected)
    }

    /// Build a petgraph view over `selected`, nodes added in registration
    /// order so that node indices double as the tie-break key.
    fn build_graph(
        &self,
        selected: &HashSet<TaskName>,
    ) -> (DiGraph<TaskName, ()>, HashMap<TaskName, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for name in self.order.iter().filter(|n| selected.contains(*n)) {
            let idx = graph.add_node(name.clone());
            node_map.insert(name.clone(), idx);
        }

        for name in self.order.iter().filter(|n| selected.contains(*n)) {
            let to = node_map[name];
            for dep in &self.tasks[name].dependencies {
                if let Some(&from) = node_map.get(dep) {
                    // Edge goes from dependency to dependent
                    graph.update_edge(from, to, ());
                }
            }
        }

        (graph, node_map)
    }

    fn check_acyclic(graph: &DiGraph<TaskName, ()>) -> CoreResult<()> {
        for component in tarjan_scc(graph) {
            let is_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| graph.find_edge(n, n).is_some());
            if is_cycle {
                let mut nodes = component;
                nodes.sort();
                return Err(CoreError::CyclicDependency {
                    tasks: nodes.iter().map(|&n| graph[n].to_string()).collect(),
                });
            }
        }
        Ok(())
    }

    /// Kahn's algorithm, always picking the ready task registered earliest
    fn stable_toposort(graph: &DiGraph<TaskName, ()>) -> Vec<TaskName> {
        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(graph.node_count());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(graph[node].clone());
            for next in graph.neighbors_directed(node, Direction::Outgoing) {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
        order
    }

    /// Graphviz DOT rendering of the whole graph
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<&str, &str> = DiGraph::new();
        let mut node_map: HashMap<&str, NodeIndex> = HashMap::new();
        for name in &self.order {
            node_map.insert(name.as_str(), graph.add_node(name.as_str()));
        }
        for task in self.tasks() {
            let to = node_map[task.name.as_str()];
            for dep in &task.dependencies {
                let from = *node_map
                    .entry(dep.as_str())
                    .or_insert_with(|| graph.add_node(dep.as_str()));
                graph.update_edge(from, to, "");
            }
        }
        format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }

    /// One line per task in registration order: `name <- dep, dep`
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for task in self.tasks() {
            out.push_str(task.name.as_str());
            if !task.dependencies.is_empty() {
                let deps: Vec<&str> = task.dependencies.iter().map(|d| d.as_str()).collect();
                out.push_str(" <- ");
                out.push_str(&deps.join(", "));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
