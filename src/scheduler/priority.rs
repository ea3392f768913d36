use super::Rank;
use crate::core::Entity;

/// Static priority; a lower number is more urgent.
pub fn rank(entity: &Entity) -> Rank {
    Rank::from(entity.priority)
}
