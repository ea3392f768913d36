use std::ops::RangeInclusive;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::job::Job;
use crate::core::Ticks;

/// Shape of a random workload. At each of `ticks` ticks a job arrives with
/// probability `arrival_rate`; it is short with probability `short_share`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workload {
    pub ticks: Ticks,
    pub arrival_rate: f64,
    pub short_share: f64,
    pub short_ticks: Ticks,
    pub long_ticks: Ticks,
    /// Drawn uniformly; an empty range pins every job to its start
    pub priorities: RangeInclusive<i32>,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            ticks: 500,
            arrival_rate: 0.3,
            short_share: 0.3,
            short_ticks: 2,
            long_ticks: 6,
            priorities: 0..=4,
        }
    }
}

impl Workload {
    pub fn with_priorities(mut self, priorities: RangeInclusive<i32>) -> Self {
        self.priorities = priorities;
        self
    }

    /// Same seed, same jobs. Ids follow arrival order.
    pub fn generate(&self, seed: u64) -> Vec<Job> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut jobs = Vec::new();

        for t in 0..self.ticks {
            if rng.random::<f64>() >= self.arrival_rate {
                continue;
            }

            let run_time = if rng.random::<f64>() < self.short_share {
                self.short_ticks
            } else {
                self.long_ticks
            };
            let priority = if self.priorities.is_empty() {
                *self.priorities.start()
            } else {
                rng.random_range(self.priorities.clone())
            };

            jobs.push(Job {
                id: jobs.len() as u64,
                arrival_time: t,
                run_time,
                priority,
            });
        }

        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy() -> Workload {
        Workload {
            ticks: 200,
            arrival_rate: 0.4,
            short_share: 0.3,
            short_ticks: 2,
            long_ticks: 6,
            priorities: -3..=3,
        }
    }

    #[test]
    fn test_same_seed_same_workload() {
        let workload = Workload::default();
        assert_eq!(workload.generate(7), workload.generate(7));
        assert_ne!(workload.generate(7), workload.generate(8));
    }

    #[test]
    fn test_jobs_sorted_and_sized() {
        let jobs = busy().generate(1);
        assert!(!jobs.is_empty());
        assert!(jobs.windows(2).all(|w| w[0].arrival_time < w[1].arrival_time));
        assert!(jobs.iter().all(|job| job.run_time == 2 || job.run_time == 6));
        assert!(jobs.iter().all(|job| (-3..=3).contains(&job.priority)));
    }

    #[test]
    fn test_single_priority_level() {
        let jobs = busy().with_priorities(2..=2).generate(3);
        assert!(jobs.iter().all(|job| job.priority == 2));

        #[allow(clippy::reversed_empty_ranges)]
        let pinned = busy().with_priorities(5..=1).generate(3);
        assert!(pinned.iter().all(|job| job.priority == 5));
    }

    #[test]
    fn test_no_arrivals() {
        let workload = Workload {
            arrival_rate: 0.0,
            ..Workload::default()
        };
        assert!(workload.generate(0).is_empty());
    }
}
