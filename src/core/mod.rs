pub mod driver;
pub mod event;
pub mod history;
pub mod metrics;
pub mod observer;
pub mod snapshot;
pub mod state;

pub use driver::{Simulator, TickOutcome, TickReport};
pub use event::{ReleaseReason, SchedEvent};
pub use history::{ExecutionHistory, HistoryEntry};
pub use metrics::{EntityMetrics, MetricsReport};
pub use snapshot::SimulationSnapshot;
pub use state::{Entity, EntityId, EntityState, ExecutionUnit, SimState, Ticks, UnitId};
