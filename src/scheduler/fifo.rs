use super::{Rank, ticks_rank};
use crate::core::Entity;

/// First come, first served: earliest arrival first.
pub fn rank(entity: &Entity) -> Rank {
    ticks_rank(entity.arrival_time)
}
