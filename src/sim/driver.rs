use log::trace;
use rustc_hash::FxHashMap;

use super::job::{Job, JobInstance};
use crate::{
    config::SimConfig,
    core::{EntityId, SchedEvent, Simulator, TickOutcome},
    error::{EntityError, Result},
};

/// Replays a job list against a [`Simulator`], handing each job over when it arrives.
pub struct Sim {
    pub core: Simulator,
    pub jobs: Vec<JobInstance>,
    job_cursor: usize,
    // EntityId --> jobs[index]; used to propagate start and completion to the job
    entities_to_jobs: FxHashMap<EntityId, usize>,
}

impl Sim {
    pub fn new(mut jobs: Vec<Job>, config: &SimConfig) -> Result<Self> {
        if jobs.iter().any(|job| job.run_time == 0) {
            return Err(EntityError::ZeroServiceTime.into());
        }

        jobs.sort_by(|a, b| {
            a.arrival_time
                .cmp(&b.arrival_time)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(Self {
            core: Simulator::new(config)?,
            jobs: jobs.into_iter().map(JobInstance::new).collect(),
            job_cursor: 0,
            entities_to_jobs: FxHashMap::default(),
        })
    }

    pub fn step(&mut self) -> Result<TickOutcome> {
        self.handle_arrivals()?;
        let outcome = self.core.tick();

        if let TickOutcome::Advanced(report) = &outcome {
            for event in &report.events {
                if let SchedEvent::Dispatched {
                    entity,
                    first_run: true,
                    ..
                } = event
                {
                    if let Some(&index) = self.entities_to_jobs.get(entity) {
                        self.jobs[index].start_time = Some(report.time);
                    }
                }
            }

            // Entities added straight to `core` have no job
            for entity in &report.completed {
                if let Some(&index) = self.entities_to_jobs.get(entity) {
                    self.jobs[index].completion_time = Some(report.time + 1);
                }
            }
        }

        Ok(outcome)
    }

    fn handle_arrivals(&mut self) -> Result<()> {
        let now = self.core.now();

        // Jobs are sorted, so the due ones are contiguous from the cursor. With
        // nothing left in the simulator the next job is handed over early, so
        // the clock idles forward to its arrival instead of reporting completion.
        while let Some(instance) = self.jobs.get(self.job_cursor) {
            let due = instance.job.arrival_time <= now;
            if !due && !self.core.is_complete() {
                break;
            }

            let job = &instance.job;
            let entity = self.core.add_named_entity(
                format!("job-{}", job.id),
                job.arrival_time,
                job.run_time,
                job.priority,
            )?;
            trace!("t={now} job {} -> entity {entity}", job.id);

            self.jobs[self.job_cursor].entity = Some(entity);
            self.entities_to_jobs.insert(entity, self.job_cursor);
            self.job_cursor += 1;

            if !due {
                break;
            }
        }

        Ok(())
    }

    pub fn run(&mut self, max_ticks: u64) -> Result<u64> {
        let mut ran = 0;
        while ran < max_ticks && !self.all_jobs_completed() {
            if self.step()?.is_complete() {
                break;
            }
            ran += 1;
        }
        Ok(ran)
    }

    pub fn all_jobs_completed(&self) -> bool {
        self.jobs.iter().all(|job| job.completion_time.is_some())
    }

    /// Maps `f` over the jobs that have completed.
    pub fn jobs_map<T>(&self, f: impl Fn(&JobInstance) -> T) -> impl Iterator<Item = T> {
        self.jobs
            .iter()
            .filter(|job| job.completion_time.is_some())
            .map(f)
    }
}
