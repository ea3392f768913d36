use super::{
    history::ExecutionHistory,
    state::{EntityState, SimState},
};
use crate::scheduler::round_robin::RoundRobinQueues;

/// Checks the simulator's structural invariants after every tick (debug builds).
#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn reset(&mut self) {
        self.step = 0;
    }

    pub fn observe(
        &mut self,
        state: &SimState,
        history: &ExecutionHistory,
        queues: &RoundRobinQueues,
    ) {
        self.step += 1;

        for unit in &state.units {
            let open = history.open_entry(unit.id);
            match unit.current {
                Some(entity_id) => {
                    let entity = state.entities.get(&entity_id);
                    debug_assert!(
                        entity.is_some(),
                        "unit {} runs unknown entity {entity_id}",
                        unit.id
                    );
                    if let Some(entity) = entity {
                        debug_assert_eq!(
                            entity.state,
                            EntityState::Running,
                            "unit.current entity {entity_id} must be Running"
                        );
                        debug_assert_eq!(
                            entity.unit,
                            Some(unit.id),
                            "Entity {entity_id} metadata unit mismatch"
                        );
                    }
                    debug_assert_eq!(
                        open.map(|entry| entry.entity),
                        Some(entity_id),
                        "unit {} must have exactly one open entry for its entity",
                        unit.id
                    );
                }
                None => debug_assert!(
                    open.is_none(),
                    "idle unit {} still has an open history entry",
                    unit.id
                ),
            }
        }

        for entity in state.entities.values() {
            debug_assert_eq!(
                entity.state == EntityState::Finished,
                entity.remaining_work == 0,
                "Entity {} finished state disagrees with remaining work",
                entity.id
            );
            if entity.state == EntityState::Running {
                let occupied = state
                    .units
                    .iter()
                    .filter(|unit| unit.current == Some(entity.id))
                    .count();
                debug_assert_eq!(occupied, 1, "Entity {} occupies {occupied} units", entity.id);
            }
            debug_assert_eq!(
                history.busy_ticks_for_entity(entity.id, state.now) + entity.remaining_work,
                entity.service_time,
                "Entity {} work is not conserved",
                entity.id
            );
        }

        for (entity_id, unit) in queues.membership() {
            let state_of = state.entities.get(&entity_id).map(|entity| entity.state);
            debug_assert_ne!(
                state_of,
                Some(EntityState::Running),
                "Running entity {entity_id} must not appear in queue {unit}"
            );
            debug_assert!(
                queues.queue(unit).contains(&entity_id),
                "entity {entity_id} is mapped to queue {unit} but missing from it"
            );
        }
    }
}
