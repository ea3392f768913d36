use serde::Serialize;

use super::{
    history::HistoryEntry,
    state::{Entity, EntityId, EntityState, ExecutionUnit, Ticks},
};
use crate::scheduler::Policy;

/// Copy of the simulation state handed to renderers after each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSnapshot {
    pub now: Ticks,
    pub policy: Policy,
    pub entities: Vec<Entity>,
    pub units: Vec<ExecutionUnit>,
    /// Open and closed entries, in the order they were opened
    pub history: Vec<HistoryEntry>,
    /// Round-Robin rotation queues per unit; empty vectors for other policies
    pub queues: Vec<Vec<EntityId>>,
    pub completion_order: Vec<EntityId>,
}

impl SimulationSnapshot {
    pub fn in_state(&self, state: EntityState) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |entity| entity.state == state)
    }

    pub fn waiting(&self) -> impl Iterator<Item = &Entity> {
        self.in_state(EntityState::Waiting)
    }

    pub fn ready(&self) -> impl Iterator<Item = &Entity> {
        self.in_state(EntityState::Ready)
    }

    pub fn running(&self) -> impl Iterator<Item = &Entity> {
        self.in_state(EntityState::Running)
    }

    pub fn finished(&self) -> impl Iterator<Item = &Entity> {
        self.in_state(EntityState::Finished)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
