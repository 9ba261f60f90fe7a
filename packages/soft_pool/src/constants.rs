// A poisoned lock means a panic interrupted a registry mutation, so the free registry and the
// live count may disagree. We cannot repair that, so we panic as well.
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned pool lock - the free registry \
    and live count can no longer be trusted";

pub(crate) const ERR_LIVE_COUNT_UNDERFLOW: &str =
    "reclaimed more items than the pool has created - live count accounting is broken";

pub(crate) const ERR_LIVE_COUNT_OVERFLOW: &str =
    "live count cannot exceed max_instances, which itself fits in usize";
