//! Side-effect-only ES import dependency.
//!
//! `import "x";` evaluates the target without binding anything. When the
//! target module is proven side-effect-free the whole edge is elidable: it
//! stops contributing to evaluation-order requirements and the aggregator
//! excludes it from initialization outright.

use std::any::Any;

use anyhow::Result;

use crate::{
    dependency::{
        Dependency, DependencyId, DependencyKind, DependencyReference, hash_dependency_base,
    },
    hash::CodegenHash,
    module_graph::{ModuleGraph, ModuleId},
    overlay::Overlay,
    scope::ScopeId,
    template::{DependencyTemplate, OrderedInitializer, TemplateContext},
};

use super::esm_import::{EsmImportDependency, emit_import_init, hash_import_target};

/// An import evaluated only for the target's side effects.
#[derive(Debug)]
pub struct EsmImportSideEffectDependency {
    import: EsmImportDependency,
}

impl EsmImportSideEffectDependency {
    pub fn new(
        id: DependencyId,
        origin: ModuleId,
        request: impl Into<String>,
        source_order: i32,
        scope: ScopeId,
    ) -> Self {
        Self {
            import: EsmImportDependency::new(id, origin, request, source_order, scope),
        }
    }

    /// The import core shared with [`EsmImportDependency`].
    pub(crate) fn import(&self) -> &EsmImportDependency {
        &self.import
    }

    fn target_side_effect_free(&self, graph: &ModuleGraph) -> bool {
        graph
            .resolve(self)
            .is_some_and(|module| module.factory_meta.side_effect_free)
    }
}

impl Dependency for EsmImportSideEffectDependency {
    fn id(&self) -> DependencyId {
        self.import.id()
    }

    fn kind(&self) -> DependencyKind {
        DependencyKind::EsmImportSideEffect
    }

    fn origin(&self) -> ModuleId {
        self.import.origin()
    }

    fn request(&self) -> Option<&str> {
        Dependency::request(&self.import)
    }

    fn reference(&self, graph: &ModuleGraph) -> Option<DependencyReference> {
        // A side-effect-free target makes this edge meaningless to the graph
        // builder: it need not force evaluation ordering at all.
        if self.target_side_effect_free(graph) {
            return None;
        }
        self.import.reference(graph)
    }

    fn update_hash(&self, hash: &mut CodegenHash, graph: &ModuleGraph) {
        hash_dependency_base(hash, self.kind(), Dependency::request(self));
        hash_import_target(hash, graph.resolve(self));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Template for [`EsmImportSideEffectDependency`]: same no-op apply as the
/// base import template; eligibility for initialization defers to the
/// target's side-effect verdict.
#[derive(Debug, Default)]
pub struct EsmImportSideEffectTemplate;

impl DependencyTemplate for EsmImportSideEffectTemplate {
    fn apply(
        &self,
        _dependency: &dyn Dependency,
        _overlay: &mut Overlay,
        _context: &TemplateContext<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn as_ordered_initializer(&self) -> Option<&dyn OrderedInitializer> {
        Some(self)
    }
}

impl OrderedInitializer for EsmImportSideEffectTemplate {
    fn init_order(
        &self,
        dependency: &dyn Dependency,
        context: &TemplateContext<'_>,
    ) -> Option<i32> {
        let dep = dependency
            .as_any()
            .downcast_ref::<EsmImportSideEffectDependency>()?;
        // Excluded outright, not sorted somewhere: an elided import must not
        // reserve an ordering slot.
        if dep.target_side_effect_free(context.module_graph) {
            return None;
        }
        Some(dep.import.source_order())
    }

    fn emit_init(
        &self,
        dependency: &dyn Dependency,
        overlay: &mut Overlay,
        context: &TemplateContext<'_>,
    ) -> Result<()> {
        let Some(dep) = dependency
            .as_any()
            .downcast_ref::<EsmImportSideEffectDependency>()
        else {
            return Ok(());
        };
        emit_import_init(&dep.import, overlay, context)
    }
}
