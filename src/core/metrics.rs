use average::{Estimate, Mean};
use serde::Serialize;

use super::{
    history::ExecutionHistory,
    state::{Entity, EntityId, SimState, Ticks},
};

/// Per-entity scheduling metrics. All `None` until the entity finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityMetrics {
    pub entity: EntityId,
    pub completion_time: Option<Ticks>,
    pub turnaround: Option<Ticks>,
    pub waiting: Option<Ticks>,
    pub response: Option<Ticks>,
}

impl EntityMetrics {
    pub fn of(entity: &Entity) -> Self {
        let finished = entity.is_finished();
        let completion_time = entity.completion_time.filter(|_| finished);
        let turnaround = completion_time.map(|done| done.saturating_sub(entity.arrival_time));
        let waiting = turnaround.map(|turnaround| turnaround.saturating_sub(entity.service_time));
        let response = entity
            .start_time
            .filter(|_| finished)
            .map(|start| start.saturating_sub(entity.arrival_time));

        Self {
            entity: entity.id,
            completion_time,
            turnaround,
            waiting,
            response,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub now: Ticks,
    pub entities: Vec<EntityMetrics>,
    pub finished: usize,
    pub total: usize,
    pub mean_turnaround: Option<f64>,
    pub mean_waiting: Option<f64>,
    pub mean_response: Option<f64>,
    pub completion_ratio: f64,
    /// Finished entities per tick elapsed
    pub throughput: f64,
    /// Busy fraction per unit, indexed by unit id
    pub utilization: Vec<f64>,
}

impl MetricsReport {
    pub fn collect(state: &SimState, history: &ExecutionHistory) -> Self {
        let entities: Vec<EntityMetrics> =
            state.entities.values().map(EntityMetrics::of).collect();
        let finished = entities
            .iter()
            .filter(|metrics| metrics.completion_time.is_some())
            .count();
        let total = entities.len();

        let mean_of = |field: fn(&EntityMetrics) -> Option<Ticks>| {
            mean(entities.iter().filter_map(field).map(|ticks| ticks as f64))
        };

        Self {
            now: state.now,
            mean_turnaround: mean_of(|m| m.turnaround),
            mean_waiting: mean_of(|m| m.waiting),
            mean_response: mean_of(|m| m.response),
            completion_ratio: ratio(finished as f64, total as f64),
            throughput: ratio(finished as f64, state.now as f64),
            utilization: state
                .units
                .iter()
                .map(|unit| history.utilization(unit.id, state.now))
                .collect(),
            entities,
            finished,
            total,
        }
    }
}

fn mean(iter: impl Iterator<Item = f64>) -> Option<f64> {
    let mean: Mean = iter.collect();
    if mean.is_empty() {
        None
    } else {
        Some(mean.estimate())
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
