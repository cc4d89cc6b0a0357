//! Archetype storage: aligned column groups and row migration.
//!
//! An archetype stores every entity whose component type-set is exactly
//! the archetype's canonical type-set. Component data is stored
//! column-major, one dense column per component type, plus a handle
//! column recording which entity owns each row. Entities are densely
//! packed using swap-remove semantics.
//!
//! ## Invariants
//! - All columns, including the handle column, share the same length.
//! - For every row `r`, the slot map entry of `handle_column[r]` points
//!   back at `(this archetype, r)`. The registry maintains this half of
//!   the invariant; this module reports which handle was relocated by
//!   each swap-remove so the registry can re-point it in O(1).
//! - The change counter increases on insert, swap-remove, migration and
//!   clear. Iterators snapshot it to detect structural drift.
//!
//! ## Migration
//! Moving an entity between archetypes proceeds in ordered phases, each
//! preserving row alignment:
//!
//! 1. Values shared between source and destination move column-to-column.
//! 2. Values present only in the destination are taken from the supplied
//!    additions.
//! 3. Values present only in the source are swap-removed.
//! 4. The handle columns update, and both change counters bump.
//!
//! All columns must agree on the destination row and on the source row
//! relocated by swap-remove; disagreement is an internal invariant
//! violation.

use std::any::Any;

use crate::engine::component::{Component, ComponentTypeId, TypeRegistry, TypeSet};
use crate::engine::error::{
    CapacityError, EcsError, EcsResult, PositionOutOfBoundsError,
};
use crate::engine::slot_map::Handle;
use crate::engine::storage::{Column, TypeErasedColumn};
use crate::engine::types::{ArchetypeId, RowIndex, ROW_CAP};

/// Stores all entities sharing one canonical component type-set.
pub struct Archetype {
    id: ArchetypeId,
    types: TypeSet,
    /// One column per type, parallel to `types.as_slice()`.
    columns: Vec<Box<dyn TypeErasedColumn>>,
    handles: Vec<Handle>,
    change_counter: u64,
}

impl Archetype {
    /// Builds an empty archetype for `types`, allocating one column per
    /// component type through the registry's factories.
    ///
    /// ## Errors
    /// Returns an internal error if a component type in `types` was
    /// never registered.
    pub(crate) fn new(
        id: ArchetypeId,
        types: TypeSet,
        registry: &TypeRegistry,
    ) -> EcsResult<Self> {
        let mut columns = Vec::with_capacity(types.len());
        for type_id in types.iter() {
            let column = registry.new_column(type_id).ok_or_else(|| {
                EcsError::Internal(format!("component type {type_id} not registered"))
            })?;
            columns.push(column);
        }
        Ok(Self { id, types, columns, handles: Vec::new(), change_counter: 0 })
    }

    /// Returns this archetype's identifier.
    #[inline]
    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    /// Returns the number of entities stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if no entities are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns the canonical type-set.
    #[inline]
    pub fn types(&self) -> &TypeSet {
        &self.types
    }

    /// Returns `true` if this archetype's type-set contains `id`.
    #[inline]
    pub fn has(&self, id: ComponentTypeId) -> bool {
        self.types.contains(id)
    }

    /// Returns the handle column.
    #[inline]
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    /// Returns the handle owning `row`.
    #[inline]
    pub fn handle_at(&self, row: usize) -> Option<Handle> {
        self.handles.get(row).copied()
    }

    /// Returns the current change counter.
    ///
    /// The counter increases on every structural mutation; equal values
    /// observed at two points in time mean no structural change happened
    /// in between.
    #[inline]
    pub fn change_counter(&self) -> u64 {
        self.change_counter
    }

    #[inline]
    fn bump(&mut self) {
        self.change_counter = self.change_counter.wrapping_add(1);
    }

    #[inline]
    fn column(&self, id: ComponentTypeId) -> Option<&dyn TypeErasedColumn> {
        self.types.position(id).map(|pos| self.columns[pos].as_ref())
    }

    /// Returns the component value of type `T` at `row`.
    pub fn get<T: Component>(&self, row: usize) -> Option<&T> {
        self.column(ComponentTypeId::of::<T>())?
            .as_any()
            .downcast_ref::<Column<T>>()?
            .get(row)
    }

    /// Returns the component value of type `T` at `row` mutably.
    pub fn get_mut<T: Component>(
        &mut self,
        row: usize,
    ) -> Option<&mut T> {
        let pos = self.types.position(ComponentTypeId::of::<T>())?;
        self.columns[pos]
            .as_any_mut()
            .downcast_mut::<Column<T>>()?
            .get_mut(row)
    }

    /// Returns the full column of type `T` as a slice.
    pub(crate) fn column_slice<T: Component>(&self) -> Option<&[T]> {
        Some(
            self.column(ComponentTypeId::of::<T>())?
                .as_any()
                .downcast_ref::<Column<T>>()?
                .as_slice(),
        )
    }

    /// Returns a raw pointer to the first row of the column of type `T`.
    ///
    /// The pointer stays valid until the archetype's row count changes.
    pub(crate) fn column_ptr<T: Component>(
        &mut self,
    ) -> Option<*mut T> {
        let pos = self.types.position(ComponentTypeId::of::<T>())?;
        Some(
            self.columns[pos]
                .as_any_mut()
                .downcast_mut::<Column<T>>()?
                .as_mut_ptr(),
        )
    }

    /// Inserts a full row of component values for `handle`.
    ///
    /// ## Behavior
    /// The supplied values must cover this archetype's type-set exactly;
    /// this is validated before any column is touched, so a failed
    /// insert leaves the archetype unchanged. Every column grows by
    /// exactly one row.
    ///
    /// ## Errors
    /// - Capacity exhaustion when the row index range is full.
    /// - Internal errors when the value set does not match the type-set
    ///   (the registry canonicalises bundles before calling in).
    pub(crate) fn insert(
        &mut self,
        handle: Handle,
        values: Vec<(ComponentTypeId, Box<dyn Any>)>,
    ) -> EcsResult<RowIndex> {
        if self.handles.len() >= ROW_CAP {
            return Err(CapacityError {
                needed: self.handles.len() as u64 + 1,
                capacity: ROW_CAP as u64,
            }
            .into());
        }
        if values.len() != self.types.len() {
            return Err(EcsError::Internal(format!(
                "bundle supplies {} values for an archetype of {} types",
                values.len(),
                self.types.len()
            )));
        }

        // Reorder the values into canonical column order.
        let mut ordered: Vec<Option<Box<dyn Any>>> =
            (0..values.len()).map(|_| None).collect();
        for (type_id, value) in values {
            let Some(pos) = self.types.position(type_id) else {
                return Err(EcsError::Internal(format!(
                    "bundle value of type {type_id} does not belong to this archetype"
                )));
            };
            if ordered[pos].is_some() {
                return Err(EcsError::Internal(format!(
                    "bundle supplies type {type_id} twice"
                )));
            }
            ordered[pos] = Some(value);
        }

        let row = self.handles.len();
        let mut written = 0usize;
        for (pos, value) in ordered.into_iter().enumerate() {
            let Some(value) = value else {
                return Err(EcsError::Internal("bundle value missing after reorder".into()));
            };
            match self.columns[pos].push_dyn(value) {
                Ok(pushed) => {
                    debug_assert_eq!(pushed as usize, row);
                    written += 1;
                }
                Err(e) => {
                    for column in &mut self.columns[..written] {
                        let _ = column.swap_remove(row);
                    }
                    return Err(e.into());
                }
            }
        }

        self.handles.push(handle);
        self.bump();
        self.debug_assert_aligned();
        Ok(row as RowIndex)
    }

    /// Overwrites the value of component `id` at `row` in place.
    ///
    /// In-place writes do not count as structural changes; the change
    /// counter is untouched.
    pub(crate) fn replace(
        &mut self,
        row: usize,
        id: ComponentTypeId,
        value: Box<dyn Any>,
    ) -> EcsResult<()> {
        let Some(pos) = self.types.position(id) else {
            return Err(EcsError::Internal(format!(
                "replace targets type {id} not stored in this archetype"
            )));
        };
        self.columns[pos].replace_dyn(row, value)?;
        Ok(())
    }

    /// Swap-removes `row` from every column, including the handle
    /// column.
    ///
    /// ## Returns
    /// The handle that was relocated into `row` by the swap, or `None`
    /// when the removed row was last. The caller must re-point the
    /// relocated handle's slot map entry at `row`.
    pub(crate) fn erase_row(&mut self, row: usize) -> EcsResult<Option<Handle>> {
        if row >= self.handles.len() {
            return Err(
                PositionOutOfBoundsError { row, length: self.handles.len() }.into(),
            );
        }

        let mut expected_moved: Option<Option<usize>> = None;
        for column in &mut self.columns {
            let moved = column.swap_remove(row)?;
            match expected_moved {
                Some(previous) if previous != moved => {
                    return Err(EcsError::Internal(
                        "columns disagreed on the relocated row during erase".into(),
                    ));
                }
                None => expected_moved = Some(moved),
                _ => {}
            }
        }

        let last = self.handles.len() - 1;
        self.handles.swap_remove(row);
        let relocated = (row != last).then(|| self.handles[row]);

        if let Some(moved) = expected_moved {
            let handle_moved = (row != last).then_some(last);
            if moved != handle_moved {
                return Err(EcsError::Internal(
                    "handle column disagreed with component columns during erase".into(),
                ));
            }
        }

        self.bump();
        self.debug_assert_aligned();
        Ok(relocated)
    }

    /// Moves the entity at `row` into `destination`, supplying values
    /// for components present only there.
    ///
    /// ## Behavior
    /// Implements the migration phases described in the module docs.
    /// The additions must cover `destination \ self` exactly; this is
    /// validated before any column is touched.
    ///
    /// ## Returns
    /// The entity's new row in `destination`, together with the handle
    /// relocated into `row` by the source swap-remove, if any.
    pub(crate) fn move_row_to(
        &mut self,
        destination: &mut Archetype,
        row: usize,
        mut added: Vec<(ComponentTypeId, Box<dyn Any>)>,
    ) -> EcsResult<(RowIndex, Option<Handle>)> {
        if row >= self.handles.len() {
            return Err(
                PositionOutOfBoundsError { row, length: self.handles.len() }.into(),
            );
        }
        if destination.handles.len() >= ROW_CAP {
            return Err(CapacityError {
                needed: destination.handles.len() as u64 + 1,
                capacity: ROW_CAP as u64,
            }
            .into());
        }
        for &(id, _) in &added {
            if !destination.has(id) || self.has(id) {
                return Err(EcsError::Internal(format!(
                    "added value of type {id} is not destination-only"
                )));
            }
        }
        for id in destination.types.iter() {
            if !self.has(id) && !added.iter().any(|&(added_id, _)| added_id == id) {
                return Err(EcsError::Internal(format!(
                    "no value supplied for destination-only type {id}"
                )));
            }
        }

        let destination_row = destination.handles.len();
        let mut expected_moved: Option<Option<usize>> = None;

        for (dst_pos, type_id) in destination.types.clone().iter().enumerate() {
            if let Some(src_pos) = self.types.position(type_id) {
                let (pushed, moved) = destination.columns[dst_pos]
                    .move_row_from(self.columns[src_pos].as_mut(), row)?;
                if pushed as usize != destination_row {
                    return Err(EcsError::Internal(
                        "columns disagreed on the destination row during migration".into(),
                    ));
                }
                match expected_moved {
                    Some(previous) if previous != moved => {
                        return Err(EcsError::Internal(
                            "columns disagreed on the relocated row during migration".into(),
                        ));
                    }
                    None => expected_moved = Some(moved),
                    _ => {}
                }
            } else {
                let position = added
                    .iter()
                    .position(|&(added_id, _)| added_id == type_id)
                    .ok_or_else(|| {
                        EcsError::Internal("added value vanished mid-migration".into())
                    })?;
                let (_, value) = added.swap_remove(position);
                let pushed = destination.columns[dst_pos].push_dyn(value)?;
                if pushed as usize != destination_row {
                    return Err(EcsError::Internal(
                        "columns disagreed on the destination row during migration".into(),
                    ));
                }
            }
        }

        // Discard values whose types the destination does not carry.
        for (src_pos, type_id) in self.types.clone().iter().enumerate() {
            if destination.has(type_id) {
                continue;
            }
            let moved = self.columns[src_pos].swap_remove(row)?;
            match expected_moved {
                Some(previous) if previous != moved => {
                    return Err(EcsError::Internal(
                        "columns disagreed on the relocated row during migration".into(),
                    ));
                }
                None => expected_moved = Some(moved),
                _ => {}
            }
        }

        let handle = self.handles[row];
        let last = self.handles.len() - 1;
        self.handles.swap_remove(row);
        let relocated = (row != last).then(|| self.handles[row]);
        destination.handles.push(handle);

        self.bump();
        destination.bump();
        self.debug_assert_aligned();
        destination.debug_assert_aligned();
        Ok((destination_row as RowIndex, relocated))
    }

    /// Drops every row; the type-set and columns remain.
    pub(crate) fn clear(&mut self) {
        for column in &mut self.columns {
            column.clear();
        }
        self.handles.clear();
        self.bump();
    }

    /// Asserts column parity in debug builds.
    #[inline]
    fn debug_assert_aligned(&self) {
        #[cfg(debug_assertions)]
        for column in &self.columns {
            debug_assert_eq!(
                column.len(),
                self.handles.len(),
                "column {} misaligned with handle column",
                column.element_type(),
            );
        }
    }

    /// Returns the length of every column alongside its type, for
    /// integrity checking.
    pub(crate) fn column_lengths(&self) -> impl Iterator<Item = (ComponentTypeId, usize)> + '_ {
        self.columns.iter().map(|column| (column.element_type(), column.len()))
    }
}
