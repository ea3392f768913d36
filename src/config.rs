//! Simulator configuration as supplied by the visualization layer.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

use crate::{core::Ticks, error::ConfigError, scheduler::Policy};

pub const DEFAULT_QUANTUM: Ticks = 2;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PolicyKind {
    #[default]
    Fcfs,
    Sjf,
    Priority,
    RoundRobin,
}

impl PolicyKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fcfs => "fcfs",
            Self::Sjf => "sjf",
            Self::Priority => "priority",
            Self::RoundRobin => "round-robin",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fcfs" | "fifo" => Ok(Self::Fcfs),
            "sjf" | "srtf" => Ok(Self::Sjf),
            "priority" | "prio" => Ok(Self::Priority),
            "rr" | "round-robin" | "round_robin" | "roundrobin" => Ok(Self::RoundRobin),
            _ => Err(ConfigError::UnknownPolicy(s.to_owned())),
        }
    }
}

impl TryFrom<String> for PolicyKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PolicyKind> for String {
    fn from(kind: PolicyKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy choice plus its parameters.
///
/// `preemptive` applies to SJF and Priority, `quantum` to Round-Robin only.
/// `tick_interval_ms` is never read by the engine; hosts that drive ticks
/// from a timer use it as their cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub policy: PolicyKind,
    pub preemptive: bool,
    pub quantum: Ticks,
    pub unit_count: usize,
    pub tick_interval_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Fcfs,
            preemptive: false,
            quantum: DEFAULT_QUANTUM,
            unit_count: 1,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl SimConfig {
    pub fn for_policy(name: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            policy: name.parse()?,
            ..Self::default()
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_units(mut self, unit_count: usize) -> Self {
        self.unit_count = unit_count;
        self
    }

    pub fn with_quantum(mut self, quantum: Ticks) -> Self {
        self.quantum = quantum;
        self
    }

    pub fn preemptive(mut self, preemptive: bool) -> Self {
        self.preemptive = preemptive;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validates the parameters and resolves them into a [`Policy`].
    pub fn policy(&self) -> Result<Policy, ConfigError> {
        let policy = match self.policy {
            PolicyKind::Fcfs => Policy::Fcfs,
            PolicyKind::Sjf => Policy::Sjf {
                preemptive: self.preemptive,
            },
            PolicyKind::Priority => Policy::Priority {
                preemptive: self.preemptive,
            },
            PolicyKind::RoundRobin => Policy::RoundRobin {
                quantum: self.quantum,
            },
        };
        validate(policy, self.unit_count)?;
        Ok(policy)
    }
}

pub(crate) fn validate(policy: Policy, unit_count: usize) -> Result<(), ConfigError> {
    if unit_count == 0 {
        return Err(ConfigError::NoExecutionUnits);
    }
    if policy.quantum() == Some(0) {
        return Err(ConfigError::ZeroQuantum);
    }
    Ok(())
}
