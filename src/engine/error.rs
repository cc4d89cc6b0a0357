//! Error types for handle resolution, column storage and registry
//! operations.
//!
//! This module declares focused, composable error types used across the
//! storage and migration pipeline. Each error carries enough context to
//! make failures actionable while remaining small and cheap to pass
//! around or convert into the aggregate [`EcsError`].
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode (e.g.
//!   stale handles, missing components, capacity exhaustion).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into aggregate
//!   errors so `?` composes across layers.
//! * **Actionability:** Structured fields (offending component type,
//!   requested vs. available capacity, out-of-bounds row) make logs
//!   useful without reproducing the issue.
//!
//! ## Typical flow
//! Low-level column operations return [`ColumnError`]. Registry-level
//! orchestration uses `?` to bubble failures into [`EcsError`], which
//! callers can match on for control flow or log with user-readable
//! messages.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is optimized for operator logs (short, imperative
//!   phrasing).
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::any::TypeId;
use std::fmt;

use crate::engine::component::ComponentTypeId;

/// Returned when a container cannot grow to hold an additional row or
/// slot because an index would exceed its representable range.
///
/// ### Fields
/// * `needed` — Total number of entries the operation required.
/// * `capacity` — The upper bound that prevented the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError {
    /// Total entries the operation attempted to address.
    pub needed: u64,

    /// Current capacity limiting the operation.
    pub capacity: u64,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "capacity exhausted ({} needed; capacity {})",
            self.needed, self.capacity
        )
    }
}

impl std::error::Error for CapacityError {}

/// Returned when a row index refers to a position outside the valid
/// bounds of a column.
///
/// ## Context
/// Used by column and archetype storage to report invalid addressing,
/// typically caused by stale metadata or incorrect index arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOutOfBoundsError {
    /// Row index that was addressed.
    pub row: usize,

    /// Number of valid rows in the column.
    pub length: usize,
}

impl fmt::Display for PositionOutOfBoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} out of bounds (column length {})",
            self.row, self.length
        )
    }
}

impl std::error::Error for PositionOutOfBoundsError {}

/// Returned when a value written through a type-erased column does not
/// match the column's element type.
///
/// This is a logic error surfaced by storage when component types
/// diverge (e.g. writing a velocity into a position column).
///
/// ### Fields
/// * `expected` — The component type the destination column declares.
/// * `actual` — The dynamic [`TypeId`] of the value provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatchError {
    /// Destination column's declared element type.
    pub expected: ComponentTypeId,

    /// Provided value's dynamic type.
    pub actual: TypeId,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type mismatch: expected {}, actual {:?}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for TypeMismatchError {}

/// Returned when a component is requested from or removed on an entity
/// whose archetype does not contain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingComponentError {
    /// The component type that was absent.
    pub component: ComponentTypeId,
}

impl fmt::Display for MissingComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing component: {}", self.component)
    }
}

impl std::error::Error for MissingComponentError {}

/// Returned when the same component type appears more than once in a
/// create, put or remove request.
///
/// A canonical type-set contains each type at most once; duplicates are
/// rejected before any state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateComponentError {
    /// The component type that was supplied twice.
    pub component: ComponentTypeId,
}

impl fmt::Display for DuplicateComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate component type: {}", self.component)
    }
}

impl std::error::Error for DuplicateComponentError {}

/// Aggregate error for column (component storage) operations.
///
/// Wraps the precise low-level failures that can occur when pushing,
/// replacing or removing component data:
///
/// * row addressing outside valid bounds,
/// * type mismatches between a column's element type and a provided value,
/// * row-index growth past the representable range.
///
/// `From<T>` conversions are implemented for the low-level errors so
/// callers can write `?` and still return a single, expressive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnError {
    /// A row index addressed storage outside valid bounds.
    Position(PositionOutOfBoundsError),

    /// The dynamic type of a value did not match the column's element type.
    TypeMismatch(TypeMismatchError),

    /// The column cannot represent another row index.
    Capacity(CapacityError),
}

impl fmt::Display for ColumnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnError::Position(e) => write!(f, "{e}"),
            ColumnError::TypeMismatch(e) => write!(f, "{e}"),
            ColumnError::Capacity(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ColumnError {}

impl From<PositionOutOfBoundsError> for ColumnError {
    fn from(e: PositionOutOfBoundsError) -> Self { ColumnError::Position(e) }
}

impl From<TypeMismatchError> for ColumnError {
    fn from(e: TypeMismatchError) -> Self { ColumnError::TypeMismatch(e) }
}

impl From<CapacityError> for ColumnError {
    fn from(e: CapacityError) -> Self { ColumnError::Capacity(e) }
}

/// Crate-level error for registry operations.
///
/// This aggregates the failure modes a caller can observe while creating
/// entities, accessing components or migrating rows between archetypes.
/// It preserves the underlying structured error to keep diagnostics
/// actionable.
///
/// ### Variants
/// * `StaleHandle` — A supplied handle referred to an erased or never
///   issued entity.
/// * `MissingComponent` — A component was requested from or removed on an
///   entity that does not carry it.
/// * `DuplicateComponent` — The same component type was supplied twice.
/// * `Column(ColumnError)` — A column push/replace/remove failed.
/// * `Capacity(CapacityError)` — A slot map or handle column ran out of
///   representable indices.
/// * `Internal` — An internal invariant was violated. This indicates an
///   engine bug, not a caller error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A handle's generation did not match its slot, or its slot never
    /// existed.
    StaleHandle,

    /// A component was requested from an entity that does not carry it.
    MissingComponent(MissingComponentError),

    /// The same component type was supplied more than once.
    DuplicateComponent(DuplicateComponentError),

    /// A column-level storage operation failed.
    Column(ColumnError),

    /// A slot map or handle column ran out of representable indices.
    Capacity(CapacityError),

    /// An internal invariant was violated.
    Internal(String),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::StaleHandle => f.write_str("stale or never issued handle"),
            EcsError::MissingComponent(e) => write!(f, "{e}"),
            EcsError::DuplicateComponent(e) => write!(f, "{e}"),
            EcsError::Column(e) => write!(f, "{e}"),
            EcsError::Capacity(e) => write!(f, "{e}"),
            EcsError::Internal(msg) => write!(f, "internal invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<MissingComponentError> for EcsError {
    fn from(e: MissingComponentError) -> Self { EcsError::MissingComponent(e) }
}

impl From<DuplicateComponentError> for EcsError {
    fn from(e: DuplicateComponentError) -> Self { EcsError::DuplicateComponent(e) }
}

impl From<ColumnError> for EcsError {
    fn from(e: ColumnError) -> Self { EcsError::Column(e) }
}

impl From<CapacityError> for EcsError {
    fn from(e: CapacityError) -> Self { EcsError::Capacity(e) }
}

impl From<PositionOutOfBoundsError> for EcsError {
    fn from(e: PositionOutOfBoundsError) -> Self { EcsError::Column(ColumnError::Position(e)) }
}

/// Convenience alias for registry-level results.
pub type EcsResult<T> = Result<T, EcsError>;
