use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{SimulationSnapshot, Simulator, TickOutcome};

/// A simulator shared between several tick triggers (say a timer thread and a
/// manual "step" button).
///
/// Each call holds the lock for its whole duration, so ticks are serialized
/// and no caller ever sees a half-applied tick.
#[derive(Debug, Clone)]
pub struct SharedSimulator {
    inner: Arc<Mutex<Simulator>>,
}

impl SharedSimulator {
    pub fn new(simulator: Simulator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(simulator)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Simulator> {
        // Only a failed debug assertion can poison the lock
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tick(&self) -> TickOutcome {
        self.lock().tick()
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        self.lock().snapshot()
    }

    /// Runs `f` with exclusive access, e.g. to add entities or reset between ticks.
    pub fn with<R>(&self, f: impl FnOnce(&mut Simulator) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Policy;
    use std::thread;

    #[test]
    fn test_concurrent_triggers_serialize_ticks() {
        let mut simulator =
            Simulator::with_policy(Policy::RoundRobin { quantum: 2 }, 2).expect("valid");
        for _ in 0..4 {
            simulator.add_entity(0, 50, 0).expect("valid");
        }
        let shared = SharedSimulator::new(simulator);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        shared.tick();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("tick thread panicked");
        }

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.now, 40);
        let executed: u64 = snapshot
            .entities
            .iter()
            .map(|e| e.service_time - e.remaining_work)
            .sum();
        assert_eq!(executed, 80);
    }

    #[test]
    fn test_with_gives_exclusive_access() {
        let shared = SharedSimulator::new(Simulator::with_policy(Policy::Fcfs, 1).expect("valid"));
        let id = shared.with(|sim| sim.add_entity(0, 1, 0)).expect("valid");
        shared.tick();
        assert!(shared.with(|sim| sim.is_complete()));
        assert_eq!(shared.snapshot().completion_order, vec![id]);
    }
}
