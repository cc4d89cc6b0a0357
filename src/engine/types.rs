//! Core identifier types and bit-level handle layout.
//!
//! This module defines the numeric identifier types shared across the
//! engine and the packed 64-bit layout of entity handles.
//!
//! ## Handle representation
//!
//! Handles are encoded as a packed 64-bit integer:
//!
//! ```text
//! | storage | generation | index |
//! ```
//!
//! - **Index** identifies the slot within a slot map.
//! - **Generation** detects stale handles after erasure. Generation zero
//!   is reserved for "never issued"; live slots start at one and the
//!   counter skips zero when it wraps.
//! - **Storage** names one of the registry's slot maps.
//!
//! The bit widths are compile-time constants validated by static
//! assertions below.

/// Bit-width type used for compile-time layout calculations.
pub type Bits = u32;

/// Packed 64-bit handle representation.
pub type HandleBits = u64;
/// Slot index within a slot map.
pub type SlotIndex = u32;
/// Generation counter used to detect stale handles.
pub type Generation = u16;
/// Identifier of a slot map within a registry.
pub type StorageId = u16;

/// Row index within an archetype.
pub type RowIndex = u32;
/// Identifier of an archetype within the archetype index.
pub type ArchetypeId = u32;

/// Total number of bits in a packed handle.
pub const HANDLE_BITS: Bits = 64;
/// Number of bits reserved for the slot index.
pub const INDEX_BITS: Bits = 32;
/// Number of bits reserved for the generation counter.
pub const GENERATION_BITS: Bits = 16;
/// Number of bits reserved for the storage tag.
pub const STORAGE_BITS: Bits = 16;

const _: [(); 1] = [(); (INDEX_BITS + GENERATION_BITS + STORAGE_BITS == HANDLE_BITS) as usize];
const _: [(); 1] = [(); (INDEX_BITS > 0) as usize];
const _: [(); 1] = [(); (GENERATION_BITS > 0) as usize];

const fn mask(bits: Bits) -> HandleBits {
    if bits == 0 { 0 } else { ((1 as HandleBits) << bits) - 1 }
}

/// Mask selecting the index portion of a packed handle.
pub const INDEX_MASK: HandleBits = mask(INDEX_BITS);
/// Mask selecting the generation portion of a packed handle.
pub const GENERATION_MASK: HandleBits = mask(GENERATION_BITS);
/// Mask selecting the storage portion of a packed handle.
pub const STORAGE_MASK: HandleBits = mask(STORAGE_BITS);

/// Maximum number of slots per slot map.
pub const SLOT_CAP: usize = INDEX_MASK as usize;
/// Maximum number of rows per archetype.
pub const ROW_CAP: usize = RowIndex::MAX as usize;
