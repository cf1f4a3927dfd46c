//! Task graph construction and validation
//!
//! Tasks are collected as data first and only turned into an [`ExecutionPlan`]
//! once the whole graph is known. Validation rejects duplicate ids, dangling
//! dependencies and cycles before anything runs.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use petgraph::algo::kosaraju_scc;
use petgraph::prelude::*;
use petgraph::visit::Dfs;

use crate::actions::Action;
use crate::types::GraphError;

/// A declared task before planning
struct TaskNode {
    id: String,
    dependencies: Vec<String>,
    action: Arc<dyn Action>,
}

/// A task placed in an execution plan
#[derive(Clone)]
pub struct PlannedTask {
    pub id: String,
    pub dependencies: Vec<String>,
    pub action: Arc<dyn Action>,
}

impl std::fmt::Debug for PlannedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannedTask")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("action", &self.action.describe())
            .finish()
    }
}

#[derive(Default)]
pub struct TaskGraph {
    tasks: Vec<TaskNode>,
    index: HashMap<String, usize>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task<I, S>(
        &mut self,
        id: impl Into<String>,
        dependencies: I,
        action: Arc<dyn Action>,
    ) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateTask(id));
        }

        // Repeated dependency names collapse into one edge
        let mut seen = HashSet::new();
        let dependencies = dependencies
            .into_iter()
            .map(Into::into)
            .filter(|dep: &String| seen.insert(dep.clone()))
            .collect();

        self.index.insert(id.clone(), self.tasks.len());
        self.tasks.push(TaskNode {
            id,
            dependencies,
            action,
        });
        Ok(())
    }

    /// Validate the graph and order it for execution
    ///
    /// Edges point from a dependency to its dependent. Node indices follow
    /// insertion order, which is what breaks ties between ready tasks.
    pub fn build(self) -> Result<ExecutionPlan, GraphError> {
        let mut graph = DiGraph::<usize, ()>::with_capacity(self.tasks.len(), 0);
        let nodes: Vec<NodeIndex> = (0..self.tasks.len()).map(|i| graph.add_node(i)).collect();

        for (position, task) in self.tasks.iter().enumerate() {
            for dep in &task.dependencies {
                let Some(&dep_position) = self.index.get(dep) else {
                    return Err(GraphError::UnknownDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    });
                };
                graph.add_edge(nodes[dep_position], nodes[position], ());
            }
        }

        if let Some(cycle) = self.find_cycle(&graph) {
            return Err(GraphError::CyclicDependency { cycle });
        }

        let mut in_degree: Vec<usize> = nodes
            .iter()
            .map(|&node| graph.neighbors_directed(node, Incoming).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(position, _)| Reverse(position))
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(Reverse(position)) = ready.pop() {
            order.push(position);
            for dependent in graph.neighbors_directed(nodes[position], Outgoing) {
                let dependent = graph[dependent];
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        let mut slots: Vec<Option<TaskNode>> = self.tasks.into_iter().map(Some).collect();
        let tasks = order
            .into_iter()
            .filter_map(|position| slots[position].take())
            .map(|node| PlannedTask {
                id: node.id,
                dependencies: node.dependencies,
                action: node.action,
            })
            .collect();

        Ok(ExecutionPlan { tasks })
    }

    /// Find one cycle and return its members in path order, starting from the
    /// earliest declared task on it
    fn find_cycle(&self, graph: &DiGraph<usize, ()>) -> Option<Vec<String>> {
        let mut components: Vec<Vec<NodeIndex>> = kosaraju_scc(graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || graph.contains_edge(component[0], component[0])
            })
            .collect();

        for component in &mut components {
            component.sort_by_key(|node| graph[*node]);
        }
        components.sort_by_key(|component| graph[component[0]]);

        let component = components.first()?;
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let start = component[0];

        // Walk forward inside the component until we come back to `start`
        let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut stack = vec![start];
        let mut visited = HashSet::new();
        let mut closing = None;
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            let mut successors: Vec<NodeIndex> = graph
                .neighbors_directed(node, Outgoing)
                .filter(|next| members.contains(next))
                .collect();
            successors.sort_by_key(|next| Reverse(graph[*next]));
            if successors.contains(&start) {
                closing = Some(node);
                break;
            }
            for next in successors {
                if !visited.contains(&next) {
                    parents.entry(next).or_insert(node);
                    stack.push(next);
                }
            }
        }

        let members_by_order = || {
            component
                .iter()
                .map(|node| self.tasks[graph[*node]].id.clone())
                .collect::<Vec<_>>()
        };

        let Some(mut cursor) = closing else {
            return Some(members_by_order());
        };
        let mut path = Vec::new();
        loop {
            path.push(self.tasks[graph[cursor]].id.clone());
            if cursor == start {
                break;
            }
            match parents.get(&cursor) {
                Some(parent) => cursor = *parent,
                None => return Some(members_by_order()),
            }
        }
        path.reverse();
        Some(path)
    }
}

/// Tasks in dependency order
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    tasks: Vec<PlannedTask>,
}

impl ExecutionPlan {
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|task| task.id.as_str())
    }

    pub fn tasks(&self) -> &[PlannedTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Restrict the plan to `targets` and everything they transitively depend
    /// on, keeping the original order
    pub fn closure<S: AsRef<str>>(&self, targets: &[S]) -> Result<ExecutionPlan, GraphError> {
        let mut graph = DiGraph::<usize, ()>::with_capacity(self.tasks.len(), 0);
        let mut by_id = HashMap::new();
        for (position, task) in self.tasks.iter().enumerate() {
            by_id.insert(task.id.as_str(), graph.add_node(position));
        }
        // Here edges run from dependent to dependency so a DFS walks upstream
        for task in &self.tasks {
            for dep in &task.dependencies {
                let from = by_id.get(task.id.as_str());
                if let (Some(&from), Some(&to)) = (from, by_id.get(dep.as_str())) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut keep = HashSet::new();
        for target in targets {
            let target = target.as_ref();
            let &start = by_id
                .get(target)
                .ok_or_else(|| GraphError::UnknownTask(target.to_string()))?;
            let mut dfs = Dfs::new(&graph, start);
            while let Some(node) = dfs.next(&graph) {
                keep.insert(graph[node]);
            }
        }

        let tasks = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(position, _)| keep.contains(position))
            .map(|(_, task)| task.clone())
            .collect();
        Ok(ExecutionPlan { tasks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::Noop;

    fn graph_of(edges: &[(&str, &[&str])]) -> TaskGraph {
        let mut graph = TaskGraph::new();
        for (id, deps) in edges {
            graph
                .add_task(*id, deps.iter().copied(), Arc::new(Noop))
                .unwrap();
        }
        graph
    }

    fn ids(plan: &ExecutionPlan) -> Vec<&str> {
        plan.task_ids().collect()
    }

    #[test]
    fn test_duplicate_task_is_rejected() {
        let mut graph = TaskGraph::new();
        graph.add_task("a", Vec::<String>::new(), Arc::new(Noop)).unwrap();
        let err = graph
            .add_task("a", Vec::<String>::new(), Arc::new(Noop))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateTask(id) if id == "a"));
    }

    #[test]
    fn test_dependencies_come_first() {
        let graph = graph_of(&[
            ("publish", &["jar", "docs"]),
            ("jar", &["compile"]),
            ("docs", &["compile"]),
            ("compile", &[]),
        ]);
        let plan = graph.build().unwrap();
        assert_eq!(ids(&plan), vec!["compile", "jar", "docs", "publish"]);
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        let graph = graph_of(&[("c", &[]), ("a", &[]), ("b", &[])]);
        let plan = graph.build().unwrap();
        assert_eq!(ids(&plan), vec!["c", "a", "b"]);

        let graph = graph_of(&[("root", &[]), ("z", &["root"]), ("y", &["root"]), ("x", &[])]);
        let plan = graph.build().unwrap();
        assert_eq!(ids(&plan), vec!["root", "z", "y", "x"]);
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let graph = graph_of(&[("a", &["ghost"])]);
        match graph.build() {
            Err(GraphError::UnknownDependency { task, dependency }) => {
                assert_eq!(task, "a");
                assert_eq!(dependency, "ghost");
            }
            other => panic!("unexpected result {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_cycle_is_reported_in_path_order() {
        let graph = graph_of(&[("ok", &[]), ("a", &["c"]), ("b", &["a"]), ("c", &["b"])]);
        match graph.build() {
            Err(GraphError::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec!["a", "b", "c"]);
            }
            other => panic!("expected a cycle, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let graph = graph_of(&[("a", &["a"])]);
        match graph.build() {
            Err(GraphError::CyclicDependency { cycle }) => assert_eq!(cycle, vec!["a"]),
            other => panic!("expected a cycle, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_acyclic_graphs_never_report_cycles() {
        // Every task depends on all earlier ones: the densest acyclic shape
        let names: Vec<String> = (0..8).map(|i| format!("t{}", i)).collect();
        let mut graph = TaskGraph::new();
        for (i, name) in names.iter().enumerate() {
            graph
                .add_task(name.clone(), names[..i].to_vec(), Arc::new(Noop))
                .unwrap();
        }
        let plan = graph.build().unwrap();
        assert_eq!(plan.task_ids().collect::<Vec<_>>(), names);
    }

    #[test]
    fn test_closure_keeps_only_upstream_tasks() {
        let graph = graph_of(&[
            ("compile", &[]),
            ("test", &["compile"]),
            ("docs", &[]),
            ("javadocJar", &["docs"]),
            ("jar", &["compile"]),
        ]);
        let plan = graph.build().unwrap();

        let closure = plan.closure(&["jar"]).unwrap();
        assert_eq!(ids(&closure), vec!["compile", "jar"]);

        let closure = plan.closure(&["javadocJar", "test"]).unwrap();
        assert_eq!(ids(&closure), vec!["compile", "test", "docs", "javadocJar"]);

        assert!(matches!(
            plan.closure(&["nope"]),
            Err(GraphError::UnknownTask(id)) if id == "nope"
        ));
    }
}
