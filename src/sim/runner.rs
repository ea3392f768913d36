use log::debug;

use crate::core::{Simulator, TickOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerEvent {
    Quit,
    Pause,
    Resume,
    Step,
    /// Rewind to t=0 keeping the entities; leaves the runner paused
    Reset,
    /// The host's timer fired
    Timer,
    None,
}

/// Pause/resume/step control over a simulator driven by an external timer.
///
/// The runner never sleeps or spawns anything: the host calls [`Runner::run`]
/// with whatever happened (timer tick, button press) and the runner decides
/// whether that turns into a simulation tick.
#[derive(Debug)]
pub struct Runner {
    simulator: Simulator,
    paused: bool,
    last_outcome: Option<TickOutcome>,
}

impl Runner {
    pub fn new(simulator: Simulator) -> Self {
        Self {
            simulator,
            paused: false,
            last_outcome: None,
        }
    }

    fn tick(&mut self) {
        let outcome = self.simulator.tick();
        if outcome.is_complete() {
            debug!("simulation complete at t={}, pausing", self.simulator.now());
            self.paused = true;
        }
        self.last_outcome = Some(outcome);
    }

    // Returns false if the host should stop
    pub fn run(&mut self, event: RunnerEvent) -> bool {
        match event {
            RunnerEvent::Quit => return false,
            RunnerEvent::Timer if !self.paused => self.tick(),
            RunnerEvent::Pause if !self.paused => self.paused = true,
            RunnerEvent::Resume if self.paused => self.paused = false,
            RunnerEvent::Step if self.paused => self.tick(),
            RunnerEvent::Reset => {
                self.simulator.reset(true);
                self.last_outcome = None;
                self.paused = true;
            }
            _ => {}
        }
        true
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn last_outcome(&self) -> Option<&TickOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut Simulator {
        &mut self.simulator
    }

    pub fn into_inner(self) -> Simulator {
        self.simulator
    }
}
