use log::{debug, info, trace, warn};

use super::{
    event::{ReleaseReason, SchedEvent},
    history::{ExecutionHistory, HistoryEntry},
    metrics::{EntityMetrics, MetricsReport},
    observer::Observer,
    snapshot::SimulationSnapshot,
    state::{Entity, EntityId, EntityState, ExecutionUnit, SimState, Ticks, UnitId},
};
use crate::{
    config::{self, SimConfig},
    error::{EntityError, Result},
    scheduler::{Policy, Rank, RoundRobinQueues},
};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The tick that was simulated; the clock now reads `time + 1`
    pub time: Ticks,
    pub events: Vec<SchedEvent>,
    pub completed: Vec<EntityId>,
    pub snapshot: SimulationSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Advanced(TickReport),
    /// Nothing is waiting, ready or running; state was left untouched
    AlreadyComplete,
}

impl TickOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::AlreadyComplete)
    }

    pub fn report(&self) -> Option<&TickReport> {
        match self {
            Self::Advanced(report) => Some(report),
            Self::AlreadyComplete => None,
        }
    }
}

/// The simulation clock and dispatcher.
///
/// Owns the whole simulation state; every mutation goes through `&mut self`,
/// so one tick always runs to completion before anything else can observe or
/// change the state.
#[derive(Debug)]
pub struct Simulator {
    policy: Policy,
    state: SimState,
    history: ExecutionHistory,
    queues: RoundRobinQueues,
    completion_order: Vec<EntityId>,
    // Raised between ticks; reported at the head of the next tick's events
    pending_events: Vec<SchedEvent>,
    observer: Observer,
}

impl Simulator {
    pub fn new(config: &SimConfig) -> Result<Self> {
        let policy = config.policy()?;
        Self::with_policy(policy, config.unit_count)
    }

    pub fn with_policy(policy: Policy, unit_count: usize) -> Result<Self> {
        config::validate(policy, unit_count)?;
        info!("configured {} on {unit_count} unit(s)", policy.name());

        Ok(Self {
            policy,
            state: SimState::new(unit_count),
            history: ExecutionHistory::new(),
            queues: RoundRobinQueues::new(unit_count),
            completion_order: Vec::new(),
            pending_events: Vec::new(),
            observer: Observer::new(),
        })
    }

    /// Switches policy and parameters. Entities are kept, the run restarts from t=0.
    pub fn configure(&mut self, config: &SimConfig) -> Result<()> {
        let policy = config.policy()?;
        if config.unit_count != self.state.units.len() {
            self.state.resize_units(config.unit_count);
            self.queues = RoundRobinQueues::new(config.unit_count);
        }
        self.policy = policy;
        info!(
            "reconfigured to {} on {} unit(s)",
            policy.name(),
            config.unit_count
        );
        self.reset(true);
        Ok(())
    }

    pub fn add_entity(
        &mut self,
        arrival_time: Ticks,
        service_time: Ticks,
        priority: i32,
    ) -> Result<EntityId> {
        self.admit(None, arrival_time, service_time, priority)
    }

    pub fn add_named_entity(
        &mut self,
        name: impl Into<String>,
        arrival_time: Ticks,
        service_time: Ticks,
        priority: i32,
    ) -> Result<EntityId> {
        self.admit(Some(name.into()), arrival_time, service_time, priority)
    }

    fn admit(
        &mut self,
        name: Option<String>,
        arrival_time: Ticks,
        service_time: Ticks,
        priority: i32,
    ) -> Result<EntityId> {
        if service_time == 0 {
            return Err(EntityError::ZeroServiceTime.into());
        }

        let id = self
            .state
            .create_entity(name, arrival_time, service_time, priority);
        trace!(
            "t={} added entity {id} (arrival {arrival_time}, service {service_time})",
            self.state.now
        );
        Ok(id)
    }

    /// Drops an entity from the run, freeing its unit and queue slot. No-op for unknown ids.
    ///
    /// A running entity is released with [`ReleaseReason::Removed`]; that event
    /// leads the events of the next tick.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let Some(entity) = self.state.entity(id) else {
            warn!("remove_entity: no entity {id}");
            return None;
        };

        if let Some(unit) = entity.unit {
            let now = self.state.now;
            let mut events = Vec::new();
            self.release(unit, id, ReleaseReason::Removed, now, &mut events);
            self.pending_events.append(&mut events);
        }
        self.queues.remove(id);
        self.completion_order.retain(|&done| done != id);
        debug!("t={} removed entity {id}", self.state.now);

        self.state.remove_entity(id)
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.has_pending() {
            debug!("t={} nothing left to schedule", self.state.now);
            return TickOutcome::AlreadyComplete;
        }

        let now = self.state.now;
        let mut events = std::mem::take(&mut self.pending_events);

        self.admit_arrivals(&mut events);

        // Must run before any free unit is filled and before this tick's work is done
        if self.policy.is_preemptive() {
            self.preempt_for_better_candidates(&mut events);
        }

        let unit_count = self.state.units.len();
        for unit in 0..unit_count {
            if self.state.unit_is_idle(unit) {
                self.try_dispatch(unit, &mut events);
            }
        }

        let mut completed = Vec::new();
        for unit in 0..unit_count {
            if let Some(entity) = self.tick_unit(unit, &mut events) {
                completed.push(entity);
            }
        }

        self.state.advance_time(1);
        self.observer.observe(&self.state, &self.history, &self.queues);
        debug!(
            "t={now} {} event(s), {} completed",
            events.len(),
            completed.len()
        );

        TickOutcome::Advanced(TickReport {
            time: now,
            events,
            completed,
            snapshot: self.snapshot(),
        })
    }

    fn admit_arrivals(&mut self, events: &mut Vec<SchedEvent>) {
        for entity in self.state.due_arrivals() {
            self.state.mark_ready(entity);
            events.push(SchedEvent::EntityStateChange {
                entity,
                from: EntityState::Waiting,
                to: EntityState::Ready,
            });

            if self.policy.is_round_robin() {
                let unit = self.queues.on_arrival(entity);
                trace!("t={} entity {entity} queued on unit {unit}", self.state.now);
            }
        }
    }

    // Pairs the best waiting candidates (after those that will fill idle units)
    // with the worst running entities and evicts every victim that is strictly worse.
    fn preempt_for_better_candidates(&mut self, events: &mut Vec<SchedEvent>) {
        let now = self.state.now;
        let policy = self.policy;

        let mut candidates: Vec<(Rank, EntityId)> = self
            .state
            .ready_pool()
            .into_iter()
            .filter_map(|entity| policy.rank(entity).map(|rank| (rank, entity.id)))
            .collect();
        candidates.sort_unstable();

        let mut running: Vec<(Rank, EntityId, UnitId)> = self
            .state
            .running()
            .filter_map(|(unit, entity)| policy.rank(entity).map(|rank| (rank, entity.id, unit)))
            .collect();
        // Worst first; equal ranks give up the unit in descending id order
        running.sort_unstable_by(|a, b| b.cmp(a));

        let idle = self.state.idle_unit_count();
        let victims: Vec<(EntityId, UnitId)> = candidates
            .iter()
            .skip(idle)
            .zip(&running)
            .take_while(|&(&(rank, _), &(victim_rank, _, _))| rank < victim_rank)
            .map(|(&(rank, candidate), &(victim_rank, victim, unit))| {
                trace!(
                    "t={now} unit {unit}: {candidate} ({rank}) preempts {victim} ({victim_rank})"
                );
                (victim, unit)
            })
            .collect();

        for (victim, unit) in victims {
            self.release(unit, victim, ReleaseReason::Preempted, now, events);
            self.state.mark_ready(victim);
            events.push(SchedEvent::EntityStateChange {
                entity: victim,
                from: EntityState::Running,
                to: EntityState::Ready,
            });
        }
    }

    fn try_dispatch(&mut self, unit: UnitId, events: &mut Vec<SchedEvent>) {
        let now = self.state.now;
        let next = if self.policy.is_round_robin() {
            let state = &self.state;
            self.queues.take_next(unit, |entity| state.is_live(entity))
        } else {
            self.policy.select_next(&self.state.ready_pool(), now)
        };

        let Some(entity) = next else {
            events.push(SchedEvent::UnitIdle { unit });
            return;
        };

        let first_run = self.state.set_running(unit, entity);
        self.history.open(unit, entity, now);
        trace!("t={now} unit {unit} <- entity {entity}");
        events.push(SchedEvent::EntityStateChange {
            entity,
            from: EntityState::Ready,
            to: EntityState::Running,
        });
        events.push(SchedEvent::Dispatched {
            unit,
            entity,
            first_run,
        });
    }

    // Return EntityId if the entity on `unit` completed during this tick
    fn tick_unit(&mut self, unit: UnitId, events: &mut Vec<SchedEvent>) -> Option<EntityId> {
        let entity_id = self.state.units[unit].current?;
        let now = self.state.now;
        let end = now + 1;

        // In its own block to end the mutable borrow of the entity
        let remaining = {
            let entity = self.state.entity_mut(entity_id);
            entity.remaining_work -= 1;
            entity.remaining_work
        };

        if remaining == 0 {
            self.release(unit, entity_id, ReleaseReason::Completed, end, events);
            self.state.mark_finished(entity_id, end);
            self.queues.on_completion(entity_id);
            self.completion_order.push(entity_id);
            events.push(SchedEvent::EntityStateChange {
                entity: entity_id,
                from: EntityState::Running,
                to: EntityState::Finished,
            });
            debug!("t={now} entity {entity_id} finished at {end}");
            return Some(entity_id);
        }

        if let Some(quantum) = self.policy.quantum() {
            let consumed = {
                let unit_state = &mut self.state.units[unit];
                unit_state.quantum_consumed += 1;
                unit_state.quantum_consumed
            };

            if consumed >= quantum {
                self.release(unit, entity_id, ReleaseReason::QuantumExpired, end, events);
                self.state.mark_ready(entity_id);
                self.queues.on_quantum_expiry(unit, entity_id);
                events.push(SchedEvent::EntityStateChange {
                    entity: entity_id,
                    from: EntityState::Running,
                    to: EntityState::Ready,
                });
                trace!("t={now} entity {entity_id} quantum expired on unit {unit}");
            }
        }

        None
    }

    fn release(
        &mut self,
        unit: UnitId,
        entity: EntityId,
        reason: ReleaseReason,
        at: Ticks,
        events: &mut Vec<SchedEvent>,
    ) {
        self.history.close(unit, at);
        let cleared = self.state.clear_unit(unit);
        debug_assert_eq!(cleared, Some(entity), "unit {unit} released the wrong entity");
        events.push(SchedEvent::Released {
            unit,
            entity,
            reason,
            at,
        });
    }

    /// Rewinds the clock and history. With `keep_entities` every entity goes
    /// back to Waiting with its full service time; otherwise they are dropped.
    pub fn reset(&mut self, keep_entities: bool) {
        self.state.rewind(keep_entities);
        self.history.clear();
        self.queues.clear();
        self.completion_order.clear();
        self.pending_events.clear();
        self.observer.reset();
        info!(
            "simulation reset ({} entities kept)",
            self.state.entities.len()
        );
    }

    /// Ticks until everything finished or `max_ticks` ticks ran. Returns the ticks run.
    pub fn run_to_completion(&mut self, max_ticks: Ticks) -> Ticks {
        let mut ran = 0;
        while ran < max_ticks {
            if self.tick().is_complete() {
                break;
            }
            ran += 1;
        }
        ran
    }

    /// Closed history entries in closing order.
    pub fn export_history(&self) -> Vec<HistoryEntry> {
        self.history.closed()
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            now: self.state.now,
            policy: self.policy,
            entities: self.state.entities.values().cloned().collect(),
            units: self.state.units.clone(),
            history: self.history.entries().to_vec(),
            queues: self.queues.snapshot(),
            completion_order: self.completion_order.clone(),
        }
    }

    pub fn metrics(&self) -> MetricsReport {
        MetricsReport::collect(&self.state, &self.history)
    }

    pub fn entity_metrics(&self, id: EntityId) -> Option<EntityMetrics> {
        self.state.entity(id).map(EntityMetrics::of)
    }

    pub fn is_complete(&self) -> bool {
        !self.state.has_pending()
    }

    pub fn now(&self) -> Ticks {
        self.state.now
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn unit_count(&self) -> usize {
        self.state.units.len()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.state.entity(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.state.entities.values()
    }

    pub fn units(&self) -> &[ExecutionUnit] {
        &self.state.units
    }

    pub fn completion_order(&self) -> &[EntityId] {
        &self.completion_order
    }

    pub fn history(&self) -> &ExecutionHistory {
        &self.history
    }

    pub fn queues(&self) -> &RoundRobinQueues {
        &self.queues
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}
