use serde::Serialize;

use crate::snapshot::{Agent, Snapshot, Task, TaskStatus};

/// A task together with the feature it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgentTask<'a> {
    pub task: &'a Task,
    pub feature_name: &'a str,
}

/// Work assigned to one agent, split into what is in flight and what is
/// finished. Queued tasks appear in neither list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentQueue<'a> {
    pub agent: Agent,
    pub active: Vec<AgentTask<'a>>,
    pub done: Vec<AgentTask<'a>>,
}

impl AgentQueue<'_> {
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }
}

/// Group every task by agent, one queue per entry in `agents`, in that order.
/// Tasks with no agent or an agent outside the list are skipped.
pub fn group_by_agent<'a>(snapshot: &'a Snapshot, agents: &[Agent]) -> Vec<AgentQueue<'a>> {
    let mut queues: Vec<AgentQueue<'a>> = agents
        .iter()
        .map(|agent| AgentQueue {
            agent: *agent,
            active: Vec::new(),
            done: Vec::new(),
        })
        .collect();

    for feature in &snapshot.features {
        for task in &feature.tasks {
            let Some(agent) = task.known_agent() else {
                continue;
            };
            let Some(queue) = queues.iter_mut().find(|q| q.agent == agent) else {
                continue;
            };
            let entry = AgentTask {
                task,
                feature_name: feature.display_name(),
            };
            if task.status.is_done() {
                queue.done.push(entry);
            } else if task.status != TaskStatus::Queued {
                queue.active.push(entry);
            }
        }
    }
    queues
}
