use serde::Serialize;
use std::collections::BTreeMap;

// Entity ids are handed out in creation order and never reused within a run
pub type EntityId = u64;
pub type UnitId = usize;
pub type Ticks = u64;

pub const FIRST_ENTITY_ID: EntityId = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityState {
    /// Created, arrival time not reached yet
    Waiting,
    Ready,
    Running,
    Finished,
}

/// A schedulable process or thread record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub arrival_time: Ticks,
    pub service_time: Ticks,
    pub remaining_work: Ticks,
    /// Lower value is more urgent
    pub priority: i32,
    pub state: EntityState,
    pub unit: Option<UnitId>,
    pub start_time: Option<Ticks>,
    pub completion_time: Option<Ticks>,
}

impl Entity {
    fn new(
        id: EntityId,
        name: String,
        arrival_time: Ticks,
        service_time: Ticks,
        priority: i32,
    ) -> Self {
        Self {
            id,
            name,
            arrival_time,
            service_time,
            remaining_work: service_time,
            priority,
            state: EntityState::Waiting,
            unit: None,
            start_time: None,
            completion_time: None,
        }
    }

    /// Arrived and still has work left.
    pub fn is_eligible(&self, now: Ticks) -> bool {
        self.arrival_time <= now && self.remaining_work > 0
    }

    pub fn is_finished(&self) -> bool {
        self.state == EntityState::Finished
    }

    pub fn executed(&self) -> Ticks {
        self.service_time - self.remaining_work
    }

    fn rewind(&mut self) {
        self.remaining_work = self.service_time;
        self.state = EntityState::Waiting;
        self.unit = None;
        self.start_time = None;
        self.completion_time = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionUnit {
    pub id: UnitId,
    pub current: Option<EntityId>,
    /// Only advanced under Round-Robin
    pub quantum_consumed: Ticks,
}

impl ExecutionUnit {
    fn new(id: UnitId) -> Self {
        Self {
            id,
            current: None,
            quantum_consumed: 0,
        }
    }
}

#[derive(Debug)]
pub struct SimState {
    pub now: Ticks,
    pub units: Vec<ExecutionUnit>,
    pub entities: BTreeMap<EntityId, Entity>,

    // Increment upon entity creation
    next_entity_id: EntityId,
}

impl SimState {
    pub fn new(unit_count: usize) -> Self {
        Self {
            now: 0,
            units: (0..unit_count).map(ExecutionUnit::new).collect(),
            entities: BTreeMap::new(),
            next_entity_id: FIRST_ENTITY_ID,
        }
    }

    pub fn create_entity(
        &mut self,
        name: Option<String>,
        arrival_time: Ticks,
        service_time: Ticks,
        priority: i32,
    ) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;

        let name = name.unwrap_or_else(|| format!("P{id}"));
        let entity = Entity::new(id, name, arrival_time, service_time, priority);
        debug_assert!(
            !self.entities.contains_key(&id),
            "Entity id {id} handed out twice"
        );
        self.entities.insert(id, entity);

        id
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        self.entities
            .get_mut(&id)
            .expect("Scheduled entity missing from entity table")
    }

    /// Alive means present and not out of work; used to purge stale queue entries.
    pub fn is_live(&self, id: EntityId) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|entity| entity.remaining_work > 0)
    }

    /// Waiting entities whose arrival time has come, in ascending id order.
    pub fn due_arrivals(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| {
                entity.state == EntityState::Waiting && entity.arrival_time <= self.now
            })
            .map(|entity| entity.id)
            .collect()
    }

    /// Ready entities that do not occupy a unit; the input of the policy selector.
    pub fn ready_pool(&self) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|entity| entity.state == EntityState::Ready && entity.is_eligible(self.now))
            .collect()
    }

    pub fn running(&self) -> impl Iterator<Item = (UnitId, &Entity)> {
        self.units.iter().filter_map(|unit| {
            let id = unit.current?;
            self.entities.get(&id).map(|entity| (unit.id, entity))
        })
    }

    pub fn has_pending(&self) -> bool {
        self.entities.values().any(|entity| !entity.is_finished())
    }

    pub fn unit_is_idle(&self, unit: UnitId) -> bool {
        self.units[unit].current.is_none()
    }

    pub fn idle_unit_count(&self) -> usize {
        self.units.iter().filter(|unit| unit.current.is_none()).count()
    }

    pub fn mark_ready(&mut self, id: EntityId) {
        let entity = self.entity_mut(id);
        debug_assert!(
            entity.remaining_work > 0,
            "Entity {id} with no work left cannot be ready"
        );
        entity.state = EntityState::Ready;
        entity.unit = None;
    }

    // Returns true if this is the first time the entity runs
    pub fn set_running(&mut self, unit: UnitId, id: EntityId) -> bool {
        debug_assert!(
            self.units[unit].current.is_none(),
            "Unit {unit} already running an entity"
        );

        let now = self.now;
        self.units[unit].current = Some(id);
        self.units[unit].quantum_consumed = 0;

        let entity = self.entity_mut(id);
        debug_assert_eq!(
            entity.state,
            EntityState::Ready,
            "Entity {id} must be ready before it is dispatched"
        );
        entity.state = EntityState::Running;
        entity.unit = Some(unit);
        if entity.start_time.is_none() {
            entity.start_time = Some(now);
            return true;
        }
        false
    }

    pub fn mark_finished(&mut self, id: EntityId, completion_time: Ticks) {
        let entity = self.entity_mut(id);
        debug_assert_eq!(
            entity.remaining_work, 0,
            "Entity {id} finished with work left"
        );
        entity.state = EntityState::Finished;
        entity.unit = None;
        entity.completion_time = Some(completion_time);
    }

    pub fn clear_unit(&mut self, unit: UnitId) -> Option<EntityId> {
        let unit = &mut self.units[unit];
        unit.quantum_consumed = 0;
        unit.current.take()
    }

    /// Back to time zero. Entities are rewound, or dropped together with the id counter.
    pub fn rewind(&mut self, keep_entities: bool) {
        self.now = 0;
        for unit in &mut self.units {
            unit.current = None;
            unit.quantum_consumed = 0;
        }

        if keep_entities {
            self.entities.values_mut().for_each(Entity::rewind);
        } else {
            self.entities.clear();
            self.next_entity_id = FIRST_ENTITY_ID;
        }
    }

    pub fn resize_units(&mut self, unit_count: usize) {
        self.units = (0..unit_count).map(ExecutionUnit::new).collect();
        for entity in self.entities.values_mut() {
            entity.unit = None;
        }
    }
}
