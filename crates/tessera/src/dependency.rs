//! Dependency edges consumed by code-generation templates.
//!
//! A dependency is either a directed edge from an origin module toward a
//! request string, or a structural marker with no target. Dependencies are
//! immutable once constructed; lazily computed state (import bindings,
//! emission dedup) lives in side tables keyed by integer ids so entities
//! never hold references to one another.

use std::any::Any;

use crate::{
    hash::CodegenHash,
    module_graph::{ModuleGraph, ModuleId},
};

/// Unique identifier for a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyId(u32);

impl DependencyId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Kind of a dependency, the key templates are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Module-level ES import binding a target module.
    EsmImport,
    /// Import evaluated only for the target's side effects.
    EsmImportSideEffect,
    /// Synthetic per-module marker that aggregates and orders import
    /// initialization.
    EsmInit,
    /// Marker that a module uses ES-module export semantics.
    EsmCompatibility,
}

/// Reference descriptor for a dependency that affects build ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyReference {
    /// Target the graph resolved the dependency to.
    pub module: ModuleId,
    /// Weak edges do not force inclusion of the target.
    pub weak: bool,
    /// Declaration position among the origin module's imports.
    pub order: i32,
}

/// An edge from an origin module toward a request, or a structural marker.
///
/// Owned by the origin module's dependency list; templates receive it by
/// reference and downcast via [`Dependency::as_any`] when they need the
/// concrete type.
pub trait Dependency: std::fmt::Debug + Send + Sync {
    /// Identity of this edge within the graph.
    fn id(&self) -> DependencyId;

    /// Kind used for template dispatch.
    fn kind(&self) -> DependencyKind;

    /// Module this dependency originates from.
    fn origin(&self) -> ModuleId;

    /// Request string for module-reference dependencies; None for structural
    /// markers.
    fn request(&self) -> Option<&str> {
        None
    }

    /// Descriptor for the graph builder, or None when the dependency is
    /// unresolved or the edge does not affect build ordering.
    fn reference(&self, _graph: &ModuleGraph) -> Option<DependencyReference> {
        None
    }

    /// Fold this dependency's semantically relevant state into `hash`.
    fn update_hash(&self, hash: &mut CodegenHash, _graph: &ModuleGraph) {
        hash_dependency_base(hash, self.kind(), self.request());
    }

    /// Downcast support for templates.
    fn as_any(&self) -> &dyn Any;
}

/// Base hash contribution shared by every dependency kind: the kind itself
/// plus the request when one exists.
pub(crate) fn hash_dependency_base(
    hash: &mut CodegenHash,
    kind: DependencyKind,
    request: Option<&str>,
) {
    hash.update(format!("{kind:?}"));
    if let Some(request) = request {
        hash.update(request);
    }
}
