use super::{Rank, ticks_rank};
use crate::core::Entity;

/// Shortest job first.
///
/// The non-preemptive variant looks at the total service time and is only
/// consulted when a unit frees up. The preemptive variant (shortest remaining
/// time first) ranks by the work still left, so a short arrival can displace
/// a long job that is already running.
pub fn rank(entity: &Entity, preemptive: bool) -> Rank {
    if preemptive {
        ticks_rank(entity.remaining_work)
    } else {
        ticks_rank(entity.service_time)
    }
}
