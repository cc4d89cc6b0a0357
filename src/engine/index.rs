//! Archetype index: canonical type-set to archetype resolution.

use std::collections::HashMap;

use log::debug;

use crate::engine::archetype::Archetype;
use crate::engine::component::{ComponentTypeId, TypeRegistry, TypeSet};
use crate::engine::error::{EcsError, EcsResult};
use crate::engine::types::ArchetypeId;

/// Owns every archetype and resolves canonical type-sets to them.
///
/// ## Design
/// - Archetypes live in an arena ordered by creation; an [`ArchetypeId`]
///   is an index into it and is stable for the registry's lifetime.
/// - `by_types` maps each canonical type-set to its unique archetype.
/// - `by_component` maps each component type to every archetype that
///   contains it, to accelerate superset queries: matching starts from
///   the rarest queried type's list.
#[derive(Default)]
pub struct ArchetypeIndex {
    archetypes: Vec<Archetype>,
    by_types: HashMap<TypeSet, ArchetypeId>,
    by_component: HashMap<ComponentTypeId, Vec<ArchetypeId>>,
}

impl ArchetypeIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the archetype with the exact type-set `types`, creating
    /// it on demand.
    pub(crate) fn find_or_create(
        &mut self,
        types: TypeSet,
        registry: &TypeRegistry,
    ) -> EcsResult<ArchetypeId> {
        if let Some(&id) = self.by_types.get(&types) {
            return Ok(id);
        }

        let id = self.archetypes.len() as ArchetypeId;
        let archetype = Archetype::new(id, types.clone(), registry)?;
        for type_id in types.iter() {
            self.by_component.entry(type_id).or_default().push(id);
        }
        self.by_types.insert(types, id);
        self.archetypes.push(archetype);
        debug!(
            "created archetype {id} with {} component types",
            self.archetypes[id as usize].types().len()
        );
        Ok(id)
    }

    #[inline]
    pub(crate) fn get(&self, id: ArchetypeId) -> &Archetype {
        &self.archetypes[id as usize]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: ArchetypeId) -> &mut Archetype {
        &mut self.archetypes[id as usize]
    }

    /// Borrows two distinct archetypes mutably for migration.
    pub(crate) fn pair_mut(
        &mut self,
        a: ArchetypeId,
        b: ArchetypeId,
    ) -> EcsResult<(&mut Archetype, &mut Archetype)> {
        if a == b {
            return Err(EcsError::Internal(
                "migration source and destination archetype must differ".into(),
            ));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.archetypes.split_at_mut(high as usize);
        let low_ref = &mut head[low as usize];
        let high_ref = &mut tail[0];
        if a < b { Ok((low_ref, high_ref)) } else { Ok((high_ref, low_ref)) }
    }

    /// Returns every archetype whose type-set is a superset of `query`.
    ///
    /// Starts from the rarest queried type's archetype list and filters
    /// by superset check. An unknown type matches nothing.
    pub(crate) fn matching(&self, query: &[ComponentTypeId]) -> Vec<ArchetypeId> {
        if query.is_empty() {
            return (0..self.archetypes.len() as ArchetypeId).collect();
        }

        let mut rarest: Option<&Vec<ArchetypeId>> = None;
        for &type_id in query {
            match self.by_component.get(&type_id) {
                None => return Vec::new(),
                Some(candidates) => {
                    if rarest.map_or(true, |current| candidates.len() < current.len()) {
                        rarest = Some(candidates);
                    }
                }
            }
        }

        rarest
            .map(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .filter(|&id| self.get(id).types().contains_all(query))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of archetypes created so far.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Archetype> {
        self.archetypes.iter_mut()
    }
}
