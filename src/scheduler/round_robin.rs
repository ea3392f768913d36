use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::core::{EntityId, UnitId};

/// Per-unit Round-Robin rotation queues.
///
/// Each execution unit owns a FIFO of entity ids. Arrivals are spread over
/// the units (least recently filled first), expired entities go to the tail
/// of the queue of the unit they ran on, and an idle unit whose own queue is
/// empty takes the head of the longest other queue.
#[derive(Debug)]
pub struct RoundRobinQueues {
    queues: Vec<VecDeque<EntityId>>,
    // entity --> unit whose queue holds it
    membership: FxHashMap<EntityId, UnitId>,
    last_filled: Vec<u64>,
    fill_clock: u64,
}

impl RoundRobinQueues {
    pub fn new(unit_count: usize) -> Self {
        Self {
            queues: (0..unit_count).map(|_| VecDeque::new()).collect(),
            membership: FxHashMap::default(),
            last_filled: vec![0; unit_count],
            fill_clock: 0,
        }
    }

    fn push_back(&mut self, unit: UnitId, entity: EntityId) {
        assert!(
            !self.membership.contains_key(&entity),
            "Entity {entity} already present in some rotation queue"
        );

        self.queues[unit].push_back(entity);
        self.membership.insert(entity, unit);
    }

    /// Queues a newly ready entity and returns the unit whose queue received it.
    pub fn on_arrival(&mut self, entity: EntityId) -> UnitId {
        // min_by_key keeps the first minimum, so ties go to the lowest unit
        let unit = self
            .last_filled
            .iter()
            .enumerate()
            .min_by_key(|&(_, &stamp)| stamp)
            .map(|(unit, _)| unit)
            .unwrap_or(0);

        self.fill_clock += 1;
        self.last_filled[unit] = self.fill_clock;
        self.push_back(unit, entity);
        unit
    }

    pub fn on_quantum_expiry(&mut self, unit: UnitId, entity: EntityId) {
        self.push_back(unit, entity);
    }

    pub fn on_completion(&mut self, entity: EntityId) {
        self.remove(entity);
    }

    pub fn remove(&mut self, entity: EntityId) -> bool {
        match self.membership.remove(&entity) {
            Some(unit) => {
                self.queues[unit].retain(|&queued| queued != entity);
                true
            }
            None => false,
        }
    }

    fn purge<F>(&mut self, is_live: &F)
    where
        F: Fn(EntityId) -> bool,
    {
        let membership = &mut self.membership;
        for queue in &mut self.queues {
            queue.retain(|&entity| {
                let keep = is_live(entity);
                if !keep {
                    membership.remove(&entity);
                }
                keep
            });
        }
    }

    /// Head of `unit`'s queue after dropping entries that are no longer live.
    pub fn peek_head<F>(&mut self, unit: UnitId, is_live: F) -> Option<EntityId>
    where
        F: Fn(EntityId) -> bool,
    {
        self.purge(&is_live);
        self.queues[unit].front().copied()
    }

    /// Dequeues the entity `unit` should run next, stealing from the longest
    /// other queue when its own is empty.
    pub fn take_next<F>(&mut self, unit: UnitId, is_live: F) -> Option<EntityId>
    where
        F: Fn(EntityId) -> bool,
    {
        self.purge(&is_live);

        let source = if self.queues[unit].is_empty() {
            self.queues
                .iter()
                .enumerate()
                .filter(|(_, queue)| !queue.is_empty())
                .max_by(|(a, qa), (b, qb)| qa.len().cmp(&qb.len()).then_with(|| b.cmp(a)))
                .map(|(source, _)| source)?
        } else {
            unit
        };

        let entity = self.queues[source].pop_front()?;
        let removed = self.membership.remove(&entity);
        debug_assert!(removed.is_some(), "Entity {entity} missing queue membership");
        Some(entity)
    }

    pub fn queue(&self, unit: UnitId) -> &VecDeque<EntityId> {
        &self.queues[unit]
    }

    pub fn queued_on(&self, entity: EntityId) -> Option<UnitId> {
        self.membership.get(&entity).copied()
    }

    pub fn membership(&self) -> impl Iterator<Item = (EntityId, UnitId)> + '_ {
        self.membership.iter().map(|(&entity, &unit)| (entity, unit))
    }

    pub fn snapshot(&self) -> Vec<Vec<EntityId>> {
        self.queues
            .iter()
            .map(|queue| queue.iter().copied().collect())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.membership.len()
    }

    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }

    pub fn clear(&mut self) {
        self.queues.iter_mut().for_each(VecDeque::clear);
        self.membership.clear();
        self.last_filled.iter_mut().for_each(|stamp| *stamp = 0);
        self.fill_clock = 0;
    }
}
