pub mod config;
pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use crate::core::{
    Entity, EntityId, EntityMetrics, EntityState, HistoryEntry, MetricsReport, SchedEvent,
    SimulationSnapshot, Simulator, Ticks, TickOutcome, TickReport, UnitId,
};
pub use config::{PolicyKind, SimConfig};
pub use error::{ConfigError, EntityError, SimError};
pub use scheduler::Policy;
pub use sim::{Job, Runner, SharedSimulator, Sim};
