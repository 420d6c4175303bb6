//! Entity identity
//!
//! An entity is an opaque id. All of its state lives in component stores
//! keyed by that id. Ids are handed out monotonically and never reused for
//! the lifetime of an [`EntityAllocator`], so a stale id can never resolve
//! to a different logical entity.

use crate::foundation::logging::fatal;
use std::fmt;

/// Entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl EntityId {
    /// Wrap a raw id (used when decoding physics user data)
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of an entity system inside a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SystemId(pub u32);

/// Scene-wide entity reference: which system, which entity
///
/// This is what collision callbacks receive for the other party and what
/// physics bodies carry as user data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    /// Owning entity system
    pub system: SystemId,
    /// Entity inside that system
    pub entity: EntityId,
}

impl EntityKey {
    /// Create a key
    pub const fn new(system: SystemId, entity: EntityId) -> Self {
        Self { system, entity }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.system.0, self.entity)
    }
}

/// Monotonic id source for one entity system
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    next: u64,
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityAllocator {
    /// Start at 1; 0 is never a valid entity
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Start at an arbitrary id
    pub const fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Hand out the next id
    ///
    /// Exhausting the id space is fatal: wrapping around would reuse ids.
    pub fn allocate(&mut self) -> EntityId {
        let id = self.next;
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => fatal(format!("entity id space exhausted after id {id}")),
        }
        EntityId(id)
    }

    /// Number of ids handed out so far
    pub const fn allocated(&self) -> u64 {
        self.next - 1
    }
}
