//! Registry: the public façade over archetype storage.
//!
//! The registry owns the type metadata, the archetype index and one or
//! more slot maps, and orchestrates every operation a caller can
//! perform: entity creation and destruction, component access and
//! replacement, structural changes (which migrate rows between
//! archetypes) and query construction.
//!
//! ## Ownership
//! Registry → archetype index → archetypes (owning columns and handle
//! columns); Registry → slot maps → entity locations (plain indices into
//! the archetype arena). Archetypes store handles by value and slot maps
//! store archetype ids, so there are no reference cycles.
//!
//! ## Migration
//! A structural change (adding or removing components) runs as one
//! transaction over both archetypes involved:
//!
//! 1. Resolve the handle to its source archetype and row.
//! 2. Compute the destination type-set.
//! 3. Find or create the destination archetype.
//! 4. Move shared column values, append supplied values for new types,
//!    swap-remove values of dropped types.
//! 5. Rewrite the entity's slot map entry to the destination row.
//! 6. Re-point the slot map entry of whichever entity the source
//!    swap-remove relocated.
//! 7. Both change counters bump.
//!
//! Caller-visible failures (stale handle, missing component, duplicate
//! component types) are detected before any state changes.

use std::any::Any;

use log::{debug, trace};

use crate::engine::component::{
    check_distinct, Component, ComponentBundle, ComponentSet, ComponentTypeId, TypeRegistry,
    TypeSet,
};
use crate::engine::error::{EcsError, EcsResult, MissingComponentError};
use crate::engine::index::ArchetypeIndex;
use crate::engine::slot_map::{EntityLocation, Handle, SlotMap};
use crate::engine::types::{ArchetypeId, StorageId, STORAGE_MASK};

/// Archetype-based entity-component store.
///
/// ## Example
/// ```
/// use vecs::Registry;
///
/// let mut registry = Registry::new();
/// let handle = registry.create((5_i32, 5.5_f32)).unwrap();
/// assert!(registry.has::<i32>(handle));
/// assert_eq!(*registry.get::<i32>(handle).unwrap(), 5);
/// registry.erase(handle).unwrap();
/// assert!(!registry.exists(handle));
/// ```
pub struct Registry {
    types: TypeRegistry,
    index: ArchetypeIndex,
    storages: Vec<SlotMap<EntityLocation>>,
    next_storage: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a registry backed by a single slot map.
    pub fn new() -> Self {
        Self::with_storages(1)
    }

    /// Creates a registry sharding its entities round-robin across
    /// `count` slot maps.
    ///
    /// ## Panics
    /// Panics if `count` is zero or exceeds the storage tag range.
    pub fn with_storages(count: usize) -> Self {
        assert!(
            count >= 1 && count <= STORAGE_MASK as usize + 1,
            "slot map count out of range",
        );
        let storages = (0..count)
            .map(|storage| SlotMap::new(storage as StorageId))
            .collect();
        Self {
            types: TypeRegistry::new(),
            index: ArchetypeIndex::new(),
            storages,
            next_storage: 0,
        }
    }

    /// Creates an entity from a bundle of component values.
    ///
    /// ## Behavior
    /// - Registers every component type in the bundle on first use.
    /// - Canonicalises the bundle's type-set; duplicate types are
    ///   rejected before any state changes.
    /// - Finds or creates the archetype with that exact type-set,
    ///   appends a row, and records the entity's location.
    ///
    /// ## Errors
    /// - `DuplicateComponent` when the bundle names a type twice.
    /// - `Capacity` when the slot map or archetype is full.
    pub fn create<B: ComponentBundle>(&mut self, bundle: B) -> EcsResult<Handle> {
        B::register(&mut self.types);
        let set = TypeSet::new(B::component_ids())?;
        let archetype_id = self.index.find_or_create(set, &self.types)?;

        let storage = self.next_storage;
        self.next_storage = (self.next_storage + 1) % self.storages.len();
        let handle = self.storages[storage].insert(EntityLocation::default())?;

        match self.index.get_mut(archetype_id).insert(handle, bundle.into_values()) {
            Ok(row) => {
                self.set_location(handle, EntityLocation { archetype: archetype_id, row })?;
                Ok(handle)
            }
            Err(e) => {
                let _ = self.storages[storage].erase(handle);
                Err(e)
            }
        }
    }

    /// Returns `true` if `handle` refers to a live entity.
    pub fn exists(&self, handle: Handle) -> bool {
        self.location(handle).is_ok()
    }

    /// Returns the canonical component type list of the entity.
    pub fn types(&self, handle: Handle) -> EcsResult<&[ComponentTypeId]> {
        let location = self.location(handle)?;
        Ok(self.index.get(location.archetype).types().as_slice())
    }

    /// Returns `true` if the entity is live and carries component `T`.
    pub fn has<T: Component>(&self, handle: Handle) -> bool {
        self.location(handle)
            .map(|location| self.index.get(location.archetype).has(ComponentTypeId::of::<T>()))
            .unwrap_or(false)
    }

    /// Returns a reference to the entity's component of type `T`.
    ///
    /// ## Errors
    /// - `StaleHandle` when the handle is no longer live.
    /// - `MissingComponent` when the entity does not carry `T`.
    pub fn get<T: Component>(&self, handle: Handle) -> EcsResult<&T> {
        let location = self.location(handle)?;
        self.index
            .get(location.archetype)
            .get::<T>(location.row as usize)
            .ok_or_else(|| {
                MissingComponentError { component: ComponentTypeId::of::<T>() }.into()
            })
    }

    /// Returns a mutable reference to the entity's component of type
    /// `T`, for in-place value writes.
    pub fn get_mut<T: Component>(&mut self, handle: Handle) -> EcsResult<&mut T> {
        let location = self.location(handle)?;
        self.index
            .get_mut(location.archetype)
            .get_mut::<T>(location.row as usize)
            .ok_or_else(|| {
                MissingComponentError { component: ComponentTypeId::of::<T>() }.into()
            })
    }

    /// Writes a bundle of component values onto an existing entity.
    ///
    /// ## Behavior
    /// - Types the entity already carries are overwritten in place.
    /// - Types it does not carry are added through exactly one archetype
    ///   transition, regardless of how many there are.
    ///
    /// ## Errors
    /// - `StaleHandle` when the handle is no longer live.
    /// - `DuplicateComponent` when the bundle names a type twice;
    ///   rejected before any value is written.
    pub fn put<B: ComponentBundle>(&mut self, handle: Handle, bundle: B) -> EcsResult<()> {
        B::register(&mut self.types);
        let ids = B::component_ids();
        check_distinct(&ids)?;
        let location = self.location(handle)?;
        let source_id = location.archetype;

        let mut added: Vec<(ComponentTypeId, Box<dyn Any>)> = Vec::new();
        {
            let source = self.index.get_mut(source_id);
            for (id, value) in bundle.into_values() {
                if source.has(id) {
                    source.replace(location.row as usize, id, value)?;
                } else {
                    added.push((id, value));
                }
            }
        }
        if added.is_empty() {
            return Ok(());
        }

        let added_ids: Vec<ComponentTypeId> = added.iter().map(|&(id, _)| id).collect();
        let destination_set = self.index.get(source_id).types().with(&added_ids);
        self.migrate(handle, location, destination_set, added)
    }

    /// Removes the listed component types from an entity.
    ///
    /// The remaining components move through exactly one archetype
    /// transition. Removing every component leaves the entity alive with
    /// an empty type list; it keeps its handle and can receive
    /// components again through [`Registry::put`].
    ///
    /// ## Errors
    /// - `StaleHandle` when the handle is no longer live.
    /// - `DuplicateComponent` when the list names a type twice.
    /// - `MissingComponent` when the entity does not carry one of the
    ///   listed types; rejected before any state changes.
    pub fn remove<S: ComponentSet>(&mut self, handle: Handle) -> EcsResult<()> {
        let ids = S::component_ids();
        check_distinct(&ids)?;
        let location = self.location(handle)?;
        let source_id = location.archetype;

        let source = self.index.get(source_id);
        for &id in &ids {
            if !source.has(id) {
                return Err(MissingComponentError { component: id }.into());
            }
        }

        let destination_set = source.types().without(&ids);
        self.migrate(handle, location, destination_set, Vec::new())
    }

    /// Destroys an entity, invalidating its handle.
    ///
    /// ## Errors
    /// `StaleHandle` when the handle was already erased or never issued.
    pub fn erase(&mut self, handle: Handle) -> EcsResult<()> {
        let storage = self
            .storages
            .get_mut(handle.storage() as usize)
            .ok_or(EcsError::StaleHandle)?;
        let location = storage.erase(handle).ok_or(EcsError::StaleHandle)?;

        let relocated = self
            .index
            .get_mut(location.archetype)
            .erase_row(location.row as usize)?;
        if let Some(moved) = relocated {
            self.set_location(
                moved,
                EntityLocation { archetype: location.archetype, row: location.row },
            )?;
        }
        Ok(())
    }

    /// Returns the number of live entities.
    pub fn size(&self) -> usize {
        self.storages.iter().map(SlotMap::len).sum()
    }

    /// Destroys every entity. All previously issued handles become
    /// stale; archetypes persist empty.
    pub fn clear(&mut self) {
        for archetype in self.index.iter_mut() {
            archetype.clear();
        }
        for storage in &mut self.storages {
            storage.clear();
        }
        debug!("registry cleared");
    }

    /// Returns the number of archetypes created so far.
    ///
    /// At most one archetype exists per canonical type-set, so creating
    /// entities with the same component types in any order never grows
    /// this count past one per distinct set.
    pub fn archetype_count(&self) -> usize {
        self.index.len()
    }

    /// Verifies the storage invariants, returning the first violation.
    ///
    /// Checks that every column within an archetype has the same length
    /// as its handle column, that every stored handle round-trips
    /// through its slot map back to its row, and that every live slot
    /// points at a row holding its handle.
    pub fn check_integrity(&self) -> EcsResult<()> {
        for archetype in self.index.iter() {
            for (type_id, length) in archetype.column_lengths() {
                if length != archetype.len() {
                    return Err(EcsError::Internal(format!(
                        "archetype {}: column {type_id} has {length} rows, handle column has {}",
                        archetype.id(),
                        archetype.len(),
                    )));
                }
            }
            for (row, &handle) in archetype.handles().iter().enumerate() {
                let location = self.location(handle).map_err(|_| {
                    EcsError::Internal(format!(
                        "archetype {} row {row} holds stale handle {handle}",
                        archetype.id(),
                    ))
                })?;
                if location.archetype != archetype.id() || location.row as usize != row {
                    return Err(EcsError::Internal(format!(
                        "handle {handle} points at ({}, {}) but lives at ({}, {row})",
                        location.archetype,
                        location.row,
                        archetype.id(),
                    )));
                }
            }
        }

        for storage in &self.storages {
            for (handle, location) in storage.iter() {
                if location.archetype as usize >= self.index.len() {
                    return Err(EcsError::Internal(format!(
                        "handle {handle} points at nonexistent archetype {}",
                        location.archetype,
                    )));
                }
                let archetype = self.index.get(location.archetype);
                if archetype.handle_at(location.row as usize) != Some(handle) {
                    return Err(EcsError::Internal(format!(
                        "slot for handle {handle} disagrees with archetype {} row {}",
                        location.archetype, location.row,
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolves a handle to its storage location.
    pub(crate) fn location(&self, handle: Handle) -> EcsResult<EntityLocation> {
        self.storages
            .get(handle.storage() as usize)
            .and_then(|storage| storage.lookup(handle))
            .copied()
            .ok_or(EcsError::StaleHandle)
    }

    fn set_location(&mut self, handle: Handle, location: EntityLocation) -> EcsResult<()> {
        let entry = self
            .storages
            .get_mut(handle.storage() as usize)
            .and_then(|storage| storage.lookup_mut(handle))
            .ok_or_else(|| {
                EcsError::Internal(format!("no live slot for handle {handle}"))
            })?;
        *entry = location;
        Ok(())
    }

    /// Runs the archetype transition for `handle` into the archetype
    /// with type-set `destination_set`, supplying `added` values for the
    /// destination-only types.
    fn migrate(
        &mut self,
        handle: Handle,
        location: EntityLocation,
        destination_set: TypeSet,
        added: Vec<(ComponentTypeId, Box<dyn Any>)>,
    ) -> EcsResult<()> {
        let source_id = location.archetype;
        let destination_id = self.index.find_or_create(destination_set, &self.types)?;
        trace!("migrating {handle} from archetype {source_id} to {destination_id}");

        let (source, destination) = self.index.pair_mut(source_id, destination_id)?;
        let (row, relocated) =
            source.move_row_to(destination, location.row as usize, added)?;

        self.set_location(handle, EntityLocation { archetype: destination_id, row })?;
        if let Some(moved) = relocated {
            self.set_location(
                moved,
                EntityLocation { archetype: source_id, row: location.row },
            )?;
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn archetype(&self, id: ArchetypeId) -> &crate::engine::archetype::Archetype {
        self.index.get(id)
    }

    #[inline]
    pub(crate) fn archetype_mut(
        &mut self,
        id: ArchetypeId,
    ) -> &mut crate::engine::archetype::Archetype {
        self.index.get_mut(id)
    }

    pub(crate) fn matching_archetypes(&self, query: &[ComponentTypeId]) -> Vec<ArchetypeId> {
        self.index.matching(query)
    }
}
