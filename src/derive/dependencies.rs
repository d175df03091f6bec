use std::collections::HashMap;

use crate::snapshot::{Snapshot, Task};

/// Dependencies of `task` that resolve to a task which is not yet done.
/// Ids that resolve to nothing are left out.
pub fn blocked_by(task: &Task, all_tasks: &[&Task]) -> Vec<String> {
    task.depends_on
        .iter()
        .filter(|dep| {
            all_tasks
                .iter()
                .any(|other| &other.id == *dep && !other.status.is_done())
        })
        .cloned()
        .collect()
}

/// Unfinished tasks that list `task` as a dependency.
pub fn blocking(task: &Task, all_tasks: &[&Task]) -> Vec<String> {
    all_tasks
        .iter()
        .filter(|other| !other.status.is_done() && other.depends_on.contains(&task.id))
        .map(|other| other.id.clone())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Edges {
    blocked_by: Vec<String>,
    blocking: Vec<String>,
}

/// Blocking relations for every task in a snapshot. Built fresh per
/// derivation and thrown away afterwards.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: HashMap<String, Edges>,
}

impl DependencyGraph {
    pub fn build(snapshot: &Snapshot) -> Self {
        let tasks = snapshot.all_tasks();
        let edges = tasks
            .iter()
            .map(|task| {
                (
                    task.id.clone(),
                    Edges {
                        blocked_by: blocked_by(task, &tasks),
                        blocking: blocking(task, &tasks),
                    },
                )
            })
            .collect();
        Self { edges }
    }

    pub fn blocked_by(&self, task_id: &str) -> &[String] {
        self.edges
            .get(task_id)
            .map(|e| e.blocked_by.as_slice())
            .unwrap_or_default()
    }

    pub fn blocking(&self, task_id: &str) -> &[String] {
        self.edges
            .get(task_id)
            .map(|e| e.blocking.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Feature, TaskStatus};

    fn task(id: &str, status: TaskStatus, deps: &[&str]) -> Task {
        Task {
            id: id.to_string(),
            status,
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_blocked_by_unfinished_dependency() {
        let t1 = task("T1", TaskStatus::InProgress, &[]);
        let t2 = task("T2", TaskStatus::Queued, &["T1"]);
        let all = vec![&t1, &t2];
        assert_eq!(blocked_by(&t2, &all), vec!["T1"]);
        assert_eq!(blocking(&t1, &all), vec!["T2"]);
    }

    #[test]
    fn test_done_dependency_does_not_block() {
        let t1 = task("T1", TaskStatus::Done, &[]);
        let t2 = task("T2", TaskStatus::Queued, &["T1"]);
        let all = vec![&t1, &t2];
        assert!(blocked_by(&t2, &all).is_empty());
    }

    #[test]
    fn test_done_dependent_is_not_blocked() {
        let t1 = task("T1", TaskStatus::InProgress, &[]);
        let t2 = task("T2", TaskStatus::Completed, &["T1"]);
        let all = vec![&t1, &t2];
        assert!(blocking(&t1, &all).is_empty());
    }

    #[test]
    fn test_unresolved_dependency_is_ignored() {
        let t2 = task("T2", TaskStatus::Queued, &["T404"]);
        let all = vec![&t2];
        assert!(blocked_by(&t2, &all).is_empty());
    }

    #[test]
    fn test_graph_spans_features() {
        let snapshot = Snapshot {
            features: vec![
                Feature {
                    id: "F1".into(),
                    tasks: vec![task("T1", TaskStatus::Assigned, &[])],
                    ..Default::default()
                },
                Feature {
                    id: "F2".into(),
                    tasks: vec![
                        task("T2", TaskStatus::Queued, &["T1"]),
                        task("T3", TaskStatus::Queued, &["T1", "T2"]),
                    ],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let graph = DependencyGraph::build(&snapshot);
        assert_eq!(graph.blocking("T1"), ["T2", "T3"]);
        assert_eq!(graph.blocked_by("T3"), ["T1", "T2"]);
        assert!(graph.blocked_by("T1").is_empty());
        assert!(graph.blocking("missing").is_empty());
    }
}
