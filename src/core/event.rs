use serde::Serialize;

use crate::core::{EntityId, EntityState, Ticks, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReleaseReason {
    Completed,
    /// A strictly better candidate took the unit
    Preempted,
    QuantumExpired,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SchedEvent {
    EntityStateChange {
        entity: EntityId,
        from: EntityState,
        to: EntityState,
    },
    Dispatched {
        unit: UnitId,
        entity: EntityId,
        first_run: bool,
    },
    Released {
        unit: UnitId,
        entity: EntityId,
        reason: ReleaseReason,
        at: Ticks,
    },
    // Unit idle even after selection
    UnitIdle {
        unit: UnitId,
    },
}
