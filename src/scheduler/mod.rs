//! Scheduling policies.
//!
//! Ordered policies (FCFS, SJF, Priority) rank the ready pool by a single
//! metric and break ties by ascending entity id. Round-Robin does not rank;
//! its dispatch order lives in [`RoundRobinQueues`].

pub mod fifo;
pub mod priority;
pub mod round_robin;
pub mod sjf;

use serde::Serialize;

use crate::core::{Entity, EntityId, Ticks};
pub use round_robin::RoundRobinQueues;

/// Lower rank wins.
pub type Rank = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Policy {
    #[default]
    Fcfs,
    Sjf { preemptive: bool },
    Priority { preemptive: bool },
    RoundRobin { quantum: Ticks },
}

impl Policy {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fcfs => "FCFS",
            Self::Sjf { preemptive: false } => "SJF (non-preemptive)",
            Self::Sjf { preemptive: true } => "SRTF (preemptive SJF)",
            Self::Priority { preemptive: false } => "Priority (non-preemptive)",
            Self::Priority { preemptive: true } => "Priority (preemptive)",
            Self::RoundRobin { .. } => "Round-Robin",
        }
    }

    /// Preemptive policies re-check the running entities against the ready pool every tick.
    pub const fn is_preemptive(&self) -> bool {
        matches!(
            self,
            Self::Sjf { preemptive: true } | Self::Priority { preemptive: true }
        )
    }

    pub const fn quantum(&self) -> Option<Ticks> {
        match self {
            Self::RoundRobin { quantum } => Some(*quantum),
            _ => None,
        }
    }

    pub const fn is_round_robin(&self) -> bool {
        matches!(self, Self::RoundRobin { .. })
    }

    /// Ranking metric of `entity` under this policy; `None` for Round-Robin.
    pub fn rank(&self, entity: &Entity) -> Option<Rank> {
        match self {
            Self::Fcfs => Some(fifo::rank(entity)),
            Self::Sjf { preemptive } => Some(sjf::rank(entity, *preemptive)),
            Self::Priority { .. } => Some(priority::rank(entity)),
            Self::RoundRobin { .. } => None,
        }
    }

    /// Picks the entity that should take the next free unit.
    ///
    /// `ready` must only hold entities that have arrived, have work left and
    /// are not on a unit. Round-Robin always answers `None` here: its next
    /// entity is the head of a unit's rotation queue.
    pub fn select_next(&self, ready: &[&Entity], now: Ticks) -> Option<EntityId> {
        debug_assert!(
            ready.iter().all(|entity| entity.is_eligible(now)),
            "Ready pool holds an entity that is not eligible at t={now}"
        );

        ready
            .iter()
            .filter_map(|entity| self.rank(entity).map(|rank| (rank, entity.id)))
            .min()
            .map(|(_, id)| id)
    }
}

pub(crate) fn ticks_rank(ticks: Ticks) -> Rank {
    Rank::try_from(ticks).unwrap_or(Rank::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimState;

    fn pool(entries: &[(Ticks, Ticks, i32)]) -> SimState {
        let mut state = SimState::new(1);
        for &(arrival, service, priority) in entries {
            let id = state.create_entity(None, arrival, service, priority);
            state.mark_ready(id);
        }
        state.advance_time(10);
        state
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        assert_eq!(Policy::Fcfs.select_next(&[], 0), None);
        assert_eq!(Policy::Sjf { preemptive: true }.select_next(&[], 0), None);
    }

    #[test]
    fn test_fcfs_orders_by_arrival() {
        let state = pool(&[(3, 1, 0), (1, 9, 0), (1, 2, 0)]);
        assert_eq!(Policy::Fcfs.select_next(&state.ready_pool(), state.now), Some(2));
    }

    #[test]
    fn test_sjf_orders_by_service_time() {
        let state = pool(&[(0, 5, 0), (0, 2, 0), (0, 2, 0)]);
        let policy = Policy::Sjf { preemptive: false };
        assert_eq!(policy.select_next(&state.ready_pool(), state.now), Some(2));
    }

    #[test]
    fn test_priority_lower_number_wins() {
        let state = pool(&[(0, 5, 3), (0, 5, -1), (0, 5, 0)]);
        let policy = Policy::Priority { preemptive: false };
        assert_eq!(policy.select_next(&state.ready_pool(), state.now), Some(2));
    }

    #[test]
    fn test_round_robin_never_ranks() {
        let state = pool(&[(0, 5, 0)]);
        let policy = Policy::RoundRobin { quantum: 2 };
        assert_eq!(policy.select_next(&state.ready_pool(), state.now), None);
        assert_eq!(policy.quantum(), Some(2));
    }

    #[test]
    fn test_preemptive_flags() {
        assert!(Policy::Sjf { preemptive: true }.is_preemptive());
        assert!(Policy::Priority { preemptive: true }.is_preemptive());
        assert!(!Policy::Sjf { preemptive: false }.is_preemptive());
        assert!(!Policy::Fcfs.is_preemptive());
        assert!(!Policy::RoundRobin { quantum: 1 }.is_preemptive());
    }
}
