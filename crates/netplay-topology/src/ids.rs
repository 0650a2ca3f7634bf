//! Per-kind node identifier allocation.

use crate::device::DeviceType;
use crate::error::{Error, Result};

/// First counter value handed out for every device kind.
pub const ID_BASE: u64 = 1;

/// Issues `host_1`, `host_2`, `l2sw1`, ... for newly placed devices.
///
/// One counter per device kind. Counters start at [`ID_BASE`] and never move
/// backwards, so ids are unique for the lifetime of the allocator.
#[derive(Debug, Clone)]
pub struct IdentifierAllocator {
    next: [u64; DeviceType::COUNT],
}

impl Default for IdentifierAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierAllocator {
    /// Create an allocator with every counter at the base.
    pub fn new() -> Self {
        Self {
            next: [ID_BASE; DeviceType::COUNT],
        }
    }

    /// Allocate the next id for `kind`.
    ///
    /// Fails once the counter can no longer advance, so an id is never
    /// handed out twice.
    pub fn next_id(&mut self, kind: DeviceType) -> Result<String> {
        let slot = &mut self.next[kind.index()];
        let n = *slot;
        *slot = n.checked_add(1).ok_or(Error::IdsExhausted(kind))?;
        Ok(format!("{}{}", kind.id_prefix(), n))
    }

    /// Counter value the next call to [`next_id`](Self::next_id) will use.
    pub fn peek(&self, kind: DeviceType) -> u64 {
        self.next[kind.index()]
    }

    /// Account for an id that already exists in a loaded topology.
    ///
    /// Ids with an unknown prefix, a non-numeric suffix or a suffix at the
    /// top of the counter range are ignored. The last can never be issued
    /// by [`next_id`](Self::next_id), so it cannot collide.
    pub fn observe(&mut self, id: &str) {
        for kind in DeviceType::ALL {
            let Some(suffix) = id.strip_prefix(kind.id_prefix()) else {
                continue;
            };
            let Some(next) = suffix.parse::<u64>().ok().and_then(|n| n.checked_add(1)) else {
                continue;
            };
            let slot = &mut self.next[kind.index()];
            *slot = (*slot).max(next);
        }
    }

    /// Build an allocator that will never re-issue any of `ids`.
    pub fn resuming<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut alloc = Self::new();
        for id in ids {
            alloc.observe(id);
        }
        alloc
    }
}
