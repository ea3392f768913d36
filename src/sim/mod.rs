pub mod driver;
pub mod job;
pub mod runner;
pub mod shared;
pub mod workload;

pub use driver::Sim;
pub use job::{Job, JobId, JobInstance};
pub use runner::{Runner, RunnerEvent};
pub use shared::SharedSimulator;
