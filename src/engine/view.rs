//! Typed queries and archetype iteration.
//!
//! A query names a set of component types; executing it visits every
//! live entity whose archetype carries all of them, yielding the
//! entity's handle together with references to the requested
//! components.
//!
//! ## Execution model
//! 1. [`Registry::view`] captures the query type-set; no work happens.
//! 2. The first iterator advance resolves the matching archetypes
//!    through the per-component reverse index and snapshots their change
//!    counters.
//! 3. The iterator walks archetype by archetype, row by row. Entering an
//!    archetype prepares direct column access once, so each yielded row
//!    costs one indexed load per requested component.
//!
//! ## Mutation during iteration
//! The only mutation permitted while a query runs is an in-place value
//! write through the references yielded by [`Registry::view_mut`].
//! Structural changes (create, put, remove, erase, clear) require `&mut
//! Registry` and therefore cannot overlap a live iterator; the change
//! counter snapshots double-check this in debug builds.
//!
//! ## Parallel reads
//! [`Registry::par_for_each`] fans matching archetypes out across the
//! rayon pool with shared references; it requires only `&Registry`.

use std::marker::PhantomData;

use rayon::prelude::*;

use crate::engine::archetype::Archetype;
use crate::engine::component::{check_distinct, Component, ComponentTypeId};
use crate::engine::error::{EcsError, EcsResult, MissingComponentError};
use crate::engine::registry::Registry;
use crate::engine::slot_map::Handle;
use crate::engine::types::ArchetypeId;

/// A set of component types fetched together by a query.
///
/// Implemented for tuples of one to eight component types. The same
/// trait drives shared iteration ([`Registry::view`]), mutable
/// iteration ([`Registry::view_mut`]), multi-component access
/// ([`Registry::get_many`]) and parallel reads
/// ([`Registry::par_for_each`]).
pub trait Query: 'static {
    /// Shared references to one row, e.g. `(&A, &B)`.
    type Item<'a>;

    /// Mutable references to one row, e.g. `(&mut A, &mut B)`.
    type ItemMut<'a>;

    /// Per-archetype shared column access, e.g. `(&[A], &[B])`.
    type Fetch<'a>: Copy;

    /// Per-archetype mutable column access as raw base pointers.
    type FetchMut: Copy;

    /// Returns the queried component identifiers in declaration order.
    fn component_ids() -> Vec<ComponentTypeId>;

    /// Prepares shared column access on an archetype containing every
    /// queried type; `None` if one is absent.
    fn prepare(archetype: &Archetype) -> Option<Self::Fetch<'_>>;

    /// Reads one row out of prepared columns.
    ///
    /// `row` must be below the archetype's length at preparation time.
    fn item<'a>(fetch: Self::Fetch<'a>, row: usize) -> Self::Item<'a>;

    /// Prepares mutable column access on an archetype containing every
    /// queried type; `None` if one is absent.
    fn prepare_mut(archetype: &mut Archetype) -> Option<Self::FetchMut>;

    /// Reads one row mutably out of prepared columns.
    ///
    /// # Safety
    /// - `fetch` must come from [`Query::prepare_mut`] on an archetype
    ///   whose row count has not changed since.
    /// - `row` must be below that archetype's length.
    /// - The queried types must be distinct, and no other reference to
    ///   the same row may be live.
    unsafe fn item_mut<'a>(fetch: Self::FetchMut, row: usize) -> Self::ItemMut<'a>;
}

macro_rules! impl_query {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Query for ($($T,)+) {
            type Item<'a> = ($(&'a $T,)+);
            type ItemMut<'a> = ($(&'a mut $T,)+);
            type Fetch<'a> = ($(&'a [$T],)+);
            type FetchMut = ($(*mut $T,)+);

            fn component_ids() -> Vec<ComponentTypeId> {
                vec![$(ComponentTypeId::of::<$T>()),+]
            }

            fn prepare(archetype: &Archetype) -> Option<Self::Fetch<'_>> {
                Some(($(archetype.column_slice::<$T>()?,)+))
            }

            #[allow(non_snake_case)]
            fn item<'a>(fetch: Self::Fetch<'a>, row: usize) -> Self::Item<'a> {
                let ($($T,)+) = fetch;
                ($(&$T[row],)+)
            }

            fn prepare_mut(archetype: &mut Archetype) -> Option<Self::FetchMut> {
                Some(($(archetype.column_ptr::<$T>()?,)+))
            }

            #[allow(non_snake_case)]
            unsafe fn item_mut<'a>(fetch: Self::FetchMut, row: usize) -> Self::ItemMut<'a> {
                let ($($T,)+) = fetch;
                ($(unsafe { &mut *$T.add(row) },)+)
            }
        }
    };
}

impl_query!(A);
impl_query!(A, B);
impl_query!(A, B, C);
impl_query!(A, B, C, D);
impl_query!(A, B, C, D, E);
impl_query!(A, B, C, D, E, F);
impl_query!(A, B, C, D, E, F, G);
impl_query!(A, B, C, D, E, F, G, H);

/// Lazy query over every entity carrying the component types of `Q`.
///
/// Constructing a view does no work; matching archetypes are resolved on
/// the first iterator advance. Iterate a view directly or through
/// [`View::iter`]:
///
/// ```
/// use vecs::Registry;
///
/// let mut registry = Registry::new();
/// registry.create((1_i32, 1.5_f32)).unwrap();
/// registry.create((2_i32,)).unwrap();
///
/// let mut visited = 0;
/// for (_handle, (value, weight)) in registry.view::<(i32, f32)>() {
///     let _ = (value, weight);
///     visited += 1;
/// }
/// assert_eq!(visited, 1);
/// ```
pub struct View<'r, Q: Query> {
    registry: &'r Registry,
    _query: PhantomData<fn() -> Q>,
}

impl<'r, Q: Query> View<'r, Q> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Self { registry, _query: PhantomData }
    }

    /// Starts iterating; matching archetypes resolve on first advance.
    pub fn iter(&self) -> ViewIter<'r, Q> {
        ViewIter::new(self.registry)
    }
}

impl<'r, Q: Query> IntoIterator for View<'r, Q> {
    type Item = (Handle, Q::Item<'r>);
    type IntoIter = ViewIter<'r, Q>;

    fn into_iter(self) -> Self::IntoIter {
        ViewIter::new(self.registry)
    }
}

impl<'a, 'r, Q: Query> IntoIterator for &'a View<'r, Q> {
    type Item = (Handle, Q::Item<'r>);
    type IntoIter = ViewIter<'r, Q>;

    fn into_iter(self) -> Self::IntoIter {
        ViewIter::new(self.registry)
    }
}

struct CurrentArchetype<'r, Q: Query> {
    fetch: Q::Fetch<'r>,
    handles: &'r [Handle],
}

impl<'r, Q: Query> Clone for CurrentArchetype<'r, Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'r, Q: Query> Copy for CurrentArchetype<'r, Q> {}

/// Iterator yielding `(Handle, (&Q1, .., &Qn))` for every matching
/// entity.
///
/// Advancement walks the intra-archetype row cursor; when it reaches the
/// archetype's length, the walk moves to the next matching archetype and
/// the cursor resets. Each entity is yielded exactly once because an
/// entity lives in exactly one archetype.
pub struct ViewIter<'r, Q: Query> {
    registry: &'r Registry,
    /// Matching archetypes with their change counters at resolution.
    matched: Option<Vec<(ArchetypeId, u64)>>,
    cursor: usize,
    row: usize,
    current: Option<CurrentArchetype<'r, Q>>,
}

impl<'r, Q: Query> ViewIter<'r, Q> {
    fn new(registry: &'r Registry) -> Self {
        Self { registry, matched: None, cursor: 0, row: 0, current: None }
    }
}

impl<'r, Q: Query> Iterator for ViewIter<'r, Q> {
    type Item = (Handle, Q::Item<'r>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = self.current {
                if self.row < current.handles.len() {
                    let row = self.row;
                    self.row += 1;
                    return Some((current.handles[row], Q::item(current.fetch, row)));
                }
                self.current = None;
                self.cursor += 1;
            }

            if self.matched.is_none() {
                let ids = Q::component_ids();
                let matched = self
                    .registry
                    .matching_archetypes(&ids)
                    .into_iter()
                    .map(|id| (id, self.registry.archetype(id).change_counter()))
                    .collect();
                self.matched = Some(matched);
            }

            let matched = self.matched.as_ref()?;
            let &(id, snapshot) = matched.get(self.cursor)?;
            let archetype = self.registry.archetype(id);
            debug_assert_eq!(
                archetype.change_counter(),
                snapshot,
                "archetype changed structurally during iteration",
            );
            self.row = 0;
            self.current = Q::prepare(archetype)
                .map(|fetch| CurrentArchetype { fetch, handles: archetype.handles() });
            if self.current.is_none() {
                self.cursor += 1;
            }
        }
    }
}

/// Iterator yielding `(Handle, (&mut Q1, .., &mut Qn))` for in-place
/// value writes during iteration.
///
/// Exclusive access to the registry guarantees no structural change can
/// overlap the walk; the yielded references are the sanctioned way to
/// mutate component values while iterating.
pub struct ViewIterMut<'r, Q: Query> {
    registry: &'r mut Registry,
    matched: Vec<(ArchetypeId, u64)>,
    cursor: usize,
    row: usize,
    length: usize,
    handles: *const Handle,
    fetch: Option<Q::FetchMut>,
}

impl<'r, Q: Query> ViewIterMut<'r, Q> {
    fn new(registry: &'r mut Registry) -> Self {
        let ids = Q::component_ids();
        if let Err(e) = check_distinct(&ids) {
            panic!("mutable query would alias: {e}");
        }
        let matched = registry
            .matching_archetypes(&ids)
            .into_iter()
            .map(|id| (id, registry.archetype(id).change_counter()))
            .collect();
        Self {
            registry,
            matched,
            cursor: 0,
            row: 0,
            length: 0,
            handles: std::ptr::null(),
            fetch: None,
        }
    }
}

impl<'r, Q: Query> Iterator for ViewIterMut<'r, Q> {
    type Item = (Handle, Q::ItemMut<'r>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(fetch) = self.fetch {
                if self.row < self.length {
                    let row = self.row;
                    self.row += 1;
                    // The pointers were prepared on an archetype whose
                    // row count cannot change while the registry is
                    // mutably borrowed, and the queried types are
                    // distinct.
                    let handle = unsafe { *self.handles.add(row) };
                    let item = unsafe { Q::item_mut(fetch, row) };
                    return Some((handle, item));
                }
                self.fetch = None;
                self.cursor += 1;
            }

            let &(id, snapshot) = self.matched.get(self.cursor)?;
            let archetype = self.registry.archetype_mut(id);
            debug_assert_eq!(
                archetype.change_counter(),
                snapshot,
                "archetype changed structurally during iteration",
            );
            self.length = archetype.len();
            self.handles = archetype.handles().as_ptr();
            self.row = 0;
            self.fetch = Q::prepare_mut(archetype);
            if self.fetch.is_none() {
                self.cursor += 1;
            }
        }
    }
}

impl Registry {
    /// Returns a lazy query over every entity carrying the component
    /// types of `Q`.
    pub fn view<Q: Query>(&self) -> View<'_, Q> {
        View::new(self)
    }

    /// Iterates every entity carrying the component types of `Q`,
    /// yielding mutable references for in-place value writes.
    ///
    /// ## Panics
    /// Panics if `Q` names the same component type twice, which would
    /// alias mutable references.
    pub fn view_mut<Q: Query>(&mut self) -> ViewIterMut<'_, Q> {
        ViewIterMut::new(self)
    }

    /// Returns references to several components of one entity at once.
    ///
    /// ## Errors
    /// - `StaleHandle` when the handle is no longer live.
    /// - `MissingComponent` naming the first queried type the entity
    ///   does not carry.
    pub fn get_many<Q: Query>(&self, handle: Handle) -> EcsResult<Q::Item<'_>> {
        let location = self.location(handle)?;
        let archetype = self.archetype(location.archetype);
        for id in Q::component_ids() {
            if !archetype.has(id) {
                return Err(MissingComponentError { component: id }.into());
            }
        }
        let fetch = Q::prepare(archetype).ok_or_else(|| {
            EcsError::Internal("query preparation failed on a matching archetype".into())
        })?;
        Ok(Q::item(fetch, location.row as usize))
    }

    /// Visits every entity carrying the component types of `Q`,
    /// fanning matching archetypes out across the rayon pool.
    ///
    /// The callback receives shared references; use
    /// [`Registry::view_mut`] for writes.
    pub fn par_for_each<Q, F>(&self, f: F)
    where
        Q: Query,
        F: for<'a> Fn(Handle, Q::Item<'a>) + Send + Sync,
    {
        let ids = Q::component_ids();
        let matched = self.matching_archetypes(&ids);
        matched.par_iter().for_each(|&id| {
            let archetype = self.archetype(id);
            if let Some(fetch) = Q::prepare(archetype) {
                for (row, &handle) in archetype.handles().iter().enumerate() {
                    f(handle, Q::item(fetch, row));
                }
            }
        });
    }
}
