use serde::Serialize;

use super::ProjectionContext;
use super::card::TaskCard;
use crate::derive::group_by_agent;
use crate::snapshot::Agent;

/// A finished task in an agent's done list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoneEntry {
    pub id: String,
    pub title: String,
    pub feature_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentColumn {
    pub agent: Agent,
    pub name: String,
    pub active: Vec<TaskCard>,
    pub done_preview: Vec<DoneEntry>,
    pub done_total: usize,
    /// Finished tasks not included in the preview ("+N more").
    pub done_overflow: usize,
}

impl AgentColumn {
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentView {
    pub columns: Vec<AgentColumn>,
}

pub(super) fn project(ctx: &ProjectionContext<'_>) -> AgentView {
    let preview = ctx.config.agent_done_preview;
    let columns = group_by_agent(ctx.snapshot, &ctx.config.agents)
        .into_iter()
        .map(|queue| AgentColumn {
            agent: queue.agent,
            name: queue.agent.display_name(),
            active: queue
                .active
                .iter()
                .map(|entry| TaskCard::build(ctx, entry.task, Some(entry.feature_name)))
                .collect(),
            done_preview: queue
                .done
                .iter()
                .take(preview)
                .map(|entry| DoneEntry {
                    id: entry.task.id.clone(),
                    title: entry.task.title.clone(),
                    feature_name: entry.feature_name.to_string(),
                })
                .collect(),
            done_total: queue.done.len(),
            done_overflow: queue.done.len().saturating_sub(preview),
        })
        .collect();
    AgentView { columns }
}
