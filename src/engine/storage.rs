//! Type-erased dense column storage.

use std::any::Any;

use crate::engine::component::{Component, ComponentTypeId};
use crate::engine::error::{
    CapacityError, ColumnError, PositionOutOfBoundsError, TypeMismatchError,
};
use crate::engine::types::{RowIndex, ROW_CAP};

/// Type-erased view of a component column.
///
/// Each archetype owns one implementor per component type. All row
/// mutations go through this trait; typed access goes through
/// [`Column<T>`] after a downcast via `as_any`.
pub trait TypeErasedColumn: Any + Send + Sync {
    /// Number of rows currently stored.
    fn len(&self) -> usize;

    /// Returns `true` if the column holds no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifier of the element type stored in this column.
    fn element_type(&self) -> ComponentTypeId;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Appends a type-erased value, returning the new row index.
    fn push_dyn(&mut self, value: Box<dyn Any>) -> Result<RowIndex, ColumnError>;

    /// Overwrites the value at `row` in place.
    fn replace_dyn(&mut self, row: usize, value: Box<dyn Any>) -> Result<(), ColumnError>;

    /// Removes the value at `row`, writing the last value into its place.
    ///
    /// Returns the old index of the element that now sits at `row`, or
    /// `None` when the removed row was already last.
    fn swap_remove(&mut self, row: usize) -> Result<Option<usize>, ColumnError>;

    /// Moves the value at `row` out of `source` and appends it here.
    ///
    /// The source column compacts by swap-remove in the same call.
    /// Returns the destination row together with the old index of the
    /// source element relocated into `row`, if any. Both columns must
    /// store the same element type.
    fn move_row_from(
        &mut self,
        source: &mut dyn TypeErasedColumn,
        row: usize,
    ) -> Result<(RowIndex, Option<usize>), ColumnError>;

    /// Drops all values; length becomes zero.
    fn clear(&mut self);
}

/// Dense typed column backing one component type within an archetype.
///
/// Invariant: within an archetype, every column has the same length as
/// the handle column.
pub struct Column<T> {
    items: Vec<T>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Component> Column<T> {
    /// Appends a value, returning the new row index.
    pub fn push(&mut self, value: T) -> Result<RowIndex, ColumnError> {
        if self.items.len() >= ROW_CAP {
            return Err(CapacityError {
                needed: self.items.len() as u64 + 1,
                capacity: ROW_CAP as u64,
            }
            .into());
        }
        self.items.push(value);
        Ok((self.items.len() - 1) as RowIndex)
    }

    /// Returns the value at `row`.
    #[inline]
    pub fn get(&self, row: usize) -> Option<&T> {
        self.items.get(row)
    }

    /// Returns the value at `row` mutably.
    #[inline]
    pub fn get_mut(&mut self, row: usize) -> Option<&mut T> {
        self.items.get_mut(row)
    }

    /// Returns all rows as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Returns a raw pointer to the first row.
    ///
    /// The pointer is valid until the column grows, shrinks or is
    /// dropped.
    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.items.as_mut_ptr()
    }

    #[inline]
    fn check_row(&self, row: usize) -> Result<(), ColumnError> {
        if row < self.items.len() {
            Ok(())
        } else {
            Err(PositionOutOfBoundsError { row, length: self.items.len() }.into())
        }
    }

    fn mismatch(&self, value: &dyn Any) -> ColumnError {
        TypeMismatchError {
            expected: ComponentTypeId::of::<T>(),
            actual: value.type_id(),
        }
        .into()
    }
}

impl<T: Component> TypeErasedColumn for Column<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn element_type(&self) -> ComponentTypeId {
        ComponentTypeId::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn push_dyn(&mut self, value: Box<dyn Any>) -> Result<RowIndex, ColumnError> {
        match value.downcast::<T>() {
            Ok(v) => self.push(*v),
            Err(value) => Err(self.mismatch(value.as_ref())),
        }
    }

    fn replace_dyn(&mut self, row: usize, value: Box<dyn Any>) -> Result<(), ColumnError> {
        self.check_row(row)?;
        match value.downcast::<T>() {
            Ok(v) => {
                self.items[row] = *v;
                Ok(())
            }
            Err(value) => Err(self.mismatch(value.as_ref())),
        }
    }

    fn swap_remove(&mut self, row: usize) -> Result<Option<usize>, ColumnError> {
        self.check_row(row)?;
        let last = self.items.len() - 1;
        self.items.swap_remove(row);
        Ok((row != last).then_some(last))
    }

    fn move_row_from(
        &mut self,
        source: &mut dyn TypeErasedColumn,
        row: usize,
    ) -> Result<(RowIndex, Option<usize>), ColumnError> {
        let source_type = source.element_type();
        let Some(source) = source.as_any_mut().downcast_mut::<Column<T>>() else {
            return Err(TypeMismatchError {
                expected: ComponentTypeId::of::<T>(),
                actual: source_type.type_id(),
            }
            .into());
        };

        source.check_row(row)?;
        if self.items.len() >= ROW_CAP {
            return Err(CapacityError {
                needed: self.items.len() as u64 + 1,
                capacity: ROW_CAP as u64,
            }
            .into());
        }

        let last = source.items.len() - 1;
        let value = source.items.swap_remove(row);
        self.items.push(value);
        let destination = (self.items.len() - 1) as RowIndex;
        Ok((destination, (row != last).then_some(last)))
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}
