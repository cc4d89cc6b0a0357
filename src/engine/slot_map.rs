//! Handles and generational slot maps.
//!
//! This module defines the entity identity and the generational index
//! that translates external handles into internal storage locations.
//!
//! ## Handle model
//! A [`Handle`] is a compact, versioned identifier composed of:
//!
//! - A **storage tag**, naming which slot map issued it
//! - An **index**, identifying the slot within that map
//! - A **generation**, incremented on erase to invalidate stale handles
//!
//! This layout allows fast validation and prevents use-after-erase bugs
//! when slots are reclaimed and reissued.
//!
//! ## Slot map model
//! A [`SlotMap`] stores its payloads in a growable vector of slots. A
//! slot is either *live* (generation + payload) or *free* (generation +
//! link to the next free slot); free slots thread an intrusive free list
//! headed by `first_free`. Erasing a slot bumps its generation, wrapping
//! past zero, which is reserved for "never issued".
//!
//! ## Invariants
//! - A handle is valid iff its slot exists, is live, and stores the
//!   handle's generation.
//! - Free slots always appear on the free list exactly once.
//! - Erasing invalidates every previously issued handle for that slot.

use std::fmt;

use crate::engine::error::{CapacityError, EcsError, EcsResult};
use crate::engine::types::{
    ArchetypeId, Generation, HandleBits, RowIndex, SlotIndex, StorageId, GENERATION_BITS,
    GENERATION_MASK, INDEX_BITS, INDEX_MASK, SLOT_CAP, STORAGE_MASK,
};

/// Opaque, versioned identifier for an entity.
///
/// ## Purpose
/// `Handle` uniquely identifies an entity instance at a point in time.
/// It encodes enough information to:
///
/// - Detect stale or reissued handles
/// - Route operations to the correct slot map
/// - Index directly into slot storage
///
/// ## Notes
/// Handles are cheap to copy and compare, hashable, and stable across
/// any internal reorganization the registry performs. Two handles with
/// the same `(storage, index)` but different generations are distinct.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Handle(HandleBits);

#[inline]
const fn make_bits(storage: StorageId, index: SlotIndex, generation: Generation) -> HandleBits {
    ((storage as HandleBits) << (INDEX_BITS + GENERATION_BITS))
        | ((generation as HandleBits) << INDEX_BITS)
        | (index as HandleBits)
}

impl Handle {
    #[inline]
    pub(crate) fn new(storage: StorageId, index: SlotIndex, generation: Generation) -> Self {
        debug_assert!((index as HandleBits) <= INDEX_MASK);
        Self(make_bits(storage, index, generation))
    }

    /// Returns the slot index encoded in this handle.
    #[inline]
    pub fn index(self) -> SlotIndex {
        (self.0 & INDEX_MASK) as SlotIndex
    }

    /// Returns the generation encoded in this handle.
    #[inline]
    pub fn generation(self) -> Generation {
        ((self.0 >> INDEX_BITS) & GENERATION_MASK) as Generation
    }

    /// Returns the storage tag encoded in this handle.
    #[inline]
    pub fn storage(self) -> StorageId {
        ((self.0 >> (INDEX_BITS + GENERATION_BITS)) & STORAGE_MASK) as StorageId
    }

    /// Returns the packed 64-bit representation.
    #[inline]
    pub fn bits(self) -> HandleBits {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}v{}", self.storage(), self.index(), self.generation())
    }
}

/// Storage location of an entity's component row.
///
/// ## Invariants
/// - Must always reflect the true location of the entity's row.
/// - Updated in the same operation as any archetype row move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityLocation {
    /// Archetype containing the entity.
    pub archetype: ArchetypeId,

    /// Row index within the archetype.
    pub row: RowIndex,
}

enum SlotState<T> {
    Live(T),
    Free { next_free: Option<SlotIndex> },
}

struct Slot<T> {
    generation: Generation,
    state: SlotState<T>,
}

/// Advances a generation counter, skipping the reserved zero value.
#[inline]
fn next_generation(generation: Generation) -> Generation {
    let next = generation.wrapping_add(1);
    if next == 0 { 1 } else { next }
}

/// Generational index mapping handles to payloads.
///
/// ## Purpose
/// Translates external handles into payloads (the registry stores an
/// [`EntityLocation`] per entity) while detecting stale handles.
///
/// ## Design
/// - Slots live in a growable vector; erased slots are reclaimed through
///   an intrusive free list.
/// - Each map carries the storage tag baked into the handles it mints,
///   so a registry can own several maps and route by tag.
///
/// ## Concurrency
/// Not internally synchronized; exclusive ownership is required for
/// mutation.
pub struct SlotMap<T> {
    storage: StorageId,
    slots: Vec<Slot<T>>,
    first_free: Option<SlotIndex>,
    live: usize,
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> SlotMap<T> {
    /// Creates an empty slot map minting handles tagged with `storage`.
    pub fn new(storage: StorageId) -> Self {
        Self { storage, slots: Vec::new(), first_free: None, live: 0 }
    }

    /// Returns the storage tag of this map.
    #[inline]
    pub fn storage(&self) -> StorageId {
        self.storage
    }

    /// Returns the number of live slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no slots are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Inserts a payload, reusing a reclaimed slot when one is free.
    ///
    /// ## Behavior
    /// - Pops the head of the free list if present, else appends a slot.
    /// - Fresh slots start at generation one; reclaimed slots keep their
    ///   bumped generation, so reissued handles never equal erased ones.
    ///
    /// ## Errors
    /// Returns a capacity error when the slot index range is exhausted.
    pub fn insert(&mut self, payload: T) -> EcsResult<Handle> {
        let index = match self.first_free {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                let next_free = match &slot.state {
                    SlotState::Free { next_free } => *next_free,
                    SlotState::Live(_) => {
                        return Err(EcsError::Internal(
                            "slot map free list points at a live slot".into(),
                        ));
                    }
                };
                slot.state = SlotState::Live(payload);
                self.first_free = next_free;
                index
            }
            None => {
                if self.slots.len() >= SLOT_CAP {
                    return Err(CapacityError {
                        needed: self.slots.len() as u64 + 1,
                        capacity: SLOT_CAP as u64,
                    }
                    .into());
                }
                self.slots.push(Slot { generation: 1, state: SlotState::Live(payload) });
                (self.slots.len() - 1) as SlotIndex
            }
        };

        self.live += 1;
        let generation = self.slots[index as usize].generation;
        Ok(Handle::new(self.storage, index, generation))
    }

    /// Returns the payload for `handle`, or `None` if the handle is
    /// stale.
    pub fn lookup(&self, handle: Handle) -> Option<&T> {
        if handle.storage() != self.storage {
            return None;
        }
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        match &slot.state {
            SlotState::Live(payload) => Some(payload),
            SlotState::Free { .. } => None,
        }
    }

    /// Returns the payload for `handle` mutably, or `None` if stale.
    pub fn lookup_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if handle.storage() != self.storage {
            return None;
        }
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        match &mut slot.state {
            SlotState::Live(payload) => Some(payload),
            SlotState::Free { .. } => None,
        }
    }

    /// Erases the slot for `handle`, returning its payload.
    ///
    /// ## Behavior
    /// - Requires a live generation match; stale handles return `None`.
    /// - Bumps the generation (skipping zero) and links the slot into
    ///   the free list, invalidating every outstanding copy of the
    ///   handle.
    pub fn erase(&mut self, handle: Handle) -> Option<T> {
        if handle.storage() != self.storage {
            return None;
        }
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation()
            || !matches!(slot.state, SlotState::Live(_))
        {
            return None;
        }

        let old = std::mem::replace(
            &mut slot.state,
            SlotState::Free { next_free: self.first_free },
        );
        slot.generation = next_generation(slot.generation);
        self.first_free = Some(handle.index());
        self.live -= 1;

        match old {
            SlotState::Live(payload) => Some(payload),
            SlotState::Free { .. } => None,
        }
    }

    /// Erases every live slot, invalidating all outstanding handles.
    ///
    /// Each live slot's generation bumps and the free list is rebuilt to
    /// thread every slot.
    pub fn clear(&mut self) {
        let mut next: Option<SlotIndex> = None;
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if matches!(slot.state, SlotState::Live(_)) {
                slot.generation = next_generation(slot.generation);
            }
            slot.state = SlotState::Free { next_free: next };
            next = Some(index as SlotIndex);
        }
        self.first_free = next;
        self.live = 0;
    }

    /// Iterates over `(handle, payload)` pairs for every live slot.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match &slot.state {
            SlotState::Live(payload) => Some((
                Handle::new(self.storage, index as SlotIndex, slot.generation),
                payload,
            )),
            SlotState::Free { .. } => None,
        })
    }
}
