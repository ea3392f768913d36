use serde::{Deserialize, Serialize};

use crate::core::{EntityId, Ticks};

pub type JobId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub arrival_time: Ticks,
    pub run_time: Ticks,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInstance {
    pub job: Job,
    /// Set once the job has been handed to the simulator
    pub entity: Option<EntityId>,
    pub start_time: Option<Ticks>,
    pub completion_time: Option<Ticks>,
}

impl JobInstance {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            entity: None,
            start_time: None,
            completion_time: None,
        }
    }
}
