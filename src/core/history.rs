use rustc_hash::FxHashMap;
use serde::Serialize;

use super::state::{EntityId, Ticks, UnitId};

/// One contiguous stretch of an entity occupying a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub unit: UnitId,
    pub entity: EntityId,
    pub start: Ticks,
    pub end: Option<Ticks>,
}

impl HistoryEntry {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn duration(&self) -> Option<Ticks> {
        self.end.map(|end| end - self.start)
    }

    // Open entries count up to `now`
    fn elapsed(&self, now: Ticks) -> Ticks {
        self.end.unwrap_or(now).saturating_sub(self.start)
    }
}

/// Append-only occupancy log backing the Gantt view.
#[derive(Debug, Default)]
pub struct ExecutionHistory {
    entries: Vec<HistoryEntry>,
    // unit --> index of its open entry
    open: FxHashMap<UnitId, usize>,
    closed_order: Vec<usize>,
}

impl ExecutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, unit: UnitId, entity: EntityId, start: Ticks) {
        assert!(
            !self.open.contains_key(&unit),
            "Unit {unit} already has an open history entry"
        );

        self.open.insert(unit, self.entries.len());
        self.entries.push(HistoryEntry {
            unit,
            entity,
            start,
            end: None,
        });
    }

    pub fn close(&mut self, unit: UnitId, end: Ticks) -> Option<HistoryEntry> {
        let index = self.open.remove(&unit)?;
        let entry = &mut self.entries[index];
        debug_assert!(
            entry.start < end,
            "History entry for unit {unit} would close at {end} before it opened at {}",
            entry.start
        );

        entry.end = Some(end);
        self.closed_order.push(index);
        Some(*entry)
    }

    pub fn open_entry(&self, unit: UnitId) -> Option<&HistoryEntry> {
        self.open.get(&unit).map(|&index| &self.entries[index])
    }

    /// Every entry, open or closed, in the order it was opened.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Closed entries in the order they were closed.
    pub fn closed(&self) -> Vec<HistoryEntry> {
        self.closed_order
            .iter()
            .map(|&index| self.entries[index])
            .collect()
    }

    pub fn timeline(&self) -> Vec<HistoryEntry> {
        let mut timeline = self.entries.clone();
        timeline.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.unit.cmp(&b.unit)));
        timeline
    }

    pub fn busy_ticks_for_entity(&self, entity: EntityId, now: Ticks) -> Ticks {
        self.entries
            .iter()
            .filter(|entry| entry.entity == entity)
            .map(|entry| entry.elapsed(now))
            .sum()
    }

    pub fn busy_ticks_for_unit(&self, unit: UnitId, now: Ticks) -> Ticks {
        self.entries
            .iter()
            .filter(|entry| entry.unit == unit)
            .map(|entry| entry.elapsed(now))
            .sum()
    }

    pub fn utilization(&self, unit: UnitId, now: Ticks) -> f64 {
        if now == 0 {
            return 0.0;
        }
        self.busy_ticks_for_unit(unit, now) as f64 / now as f64
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.open.clear();
        self.closed_order.clear();
    }
}
