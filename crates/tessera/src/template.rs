//! Template dispatch: the polymorphic layer that turns dependencies into
//! overlay mutations.
//!
//! Each dependency kind maps to exactly one template instance. Templates are
//! stateless; everything mutable during a pass lives in the overlay or the
//! per-pass scope table, so one registry serves concurrent passes over
//! distinct modules.

use anyhow::{Result, bail};
use rustc_hash::FxHashMap;

use crate::{
    dependencies::{
        EsmCompatibilityTemplate, EsmImportSideEffectTemplate, EsmImportTemplate, EsmInitTemplate,
    },
    dependency::{Dependency, DependencyKind},
    module_graph::ModuleGraph,
    overlay::Overlay,
    runtime::RuntimeTemplate,
    scope::BindingScopes,
};

/// Read-only bundle of collaborators passed to every template invocation.
#[derive(Debug)]
pub struct TemplateContext<'a> {
    /// Frozen module graph for the duration of the pass.
    pub module_graph: &'a ModuleGraph,
    /// Registry the init aggregator re-consults for sibling dependencies.
    pub templates: &'a TemplateRegistry,
    /// Statement-producing runtime service.
    pub runtime: &'a dyn RuntimeTemplate,
    /// Import-binding scopes for this attempt.
    pub scopes: &'a BindingScopes,
}

/// Polymorphic unit of behavior: realize one dependency's effect on the
/// module's overlay, or do nothing.
///
/// There is no fallback implementation. A dependency kind without a concrete
/// template simply cannot be registered, which moves the missing-override
/// failure of a dynamic dispatch scheme to compile time.
pub trait DependencyTemplate: std::fmt::Debug + Send + Sync {
    /// Mutate `overlay` to realize `dependency`'s effect on output text.
    fn apply(
        &self,
        dependency: &dyn Dependency,
        overlay: &mut Overlay,
        context: &TemplateContext<'_>,
    ) -> Result<()>;

    /// Capability probe used by the init aggregator. Templates whose
    /// dependencies contribute ordered initialization statements return
    /// themselves.
    fn as_ordered_initializer(&self) -> Option<&dyn OrderedInitializer> {
        None
    }
}

/// Capability for templates whose dependencies contribute module
/// initialization statements emitted in a deterministic order.
pub trait OrderedInitializer {
    /// Sort key for the aggregator, or None when this dependency is excluded
    /// from initialization entirely. An excluded dependency neither emits nor
    /// reserves an ordering slot.
    fn init_order(&self, dependency: &dyn Dependency, context: &TemplateContext<'_>)
    -> Option<i32>;

    /// Emit the initialization statement. Idempotent per overlay and target:
    /// repeated calls for the same target insert once.
    fn emit_init(
        &self,
        dependency: &dyn Dependency,
        overlay: &mut Overlay,
        context: &TemplateContext<'_>,
    ) -> Result<()>;
}

/// Maps dependency kinds to template instances.
///
/// Read-only once built. An unregistered kind at lookup time means the graph
/// produced an edge the code generator cannot emit, which is fatal for the
/// whole pass rather than something to skip silently.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: FxHashMap<DependencyKind, Box<dyn DependencyTemplate>>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the ES-module template set installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DependencyKind::EsmImport, Box::new(EsmImportTemplate));
        registry.register(
            DependencyKind::EsmImportSideEffect,
            Box::new(EsmImportSideEffectTemplate),
        );
        registry.register(DependencyKind::EsmInit, Box::new(EsmInitTemplate));
        registry.register(
            DependencyKind::EsmCompatibility,
            Box::new(EsmCompatibilityTemplate),
        );
        registry
    }

    /// Install (or replace) the template for `kind`.
    pub fn register(&mut self, kind: DependencyKind, template: Box<dyn DependencyTemplate>) {
        self.templates.insert(kind, template);
    }

    /// Template for `kind`, or a fatal configuration error.
    pub fn get(&self, kind: DependencyKind) -> Result<&dyn DependencyTemplate> {
        match self.templates.get(&kind) {
            Some(template) => Ok(template.as_ref()),
            None => bail!("no dependency template registered for {kind:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_kind_is_fatal() {
        let registry = TemplateRegistry::new();
        let err = registry.get(DependencyKind::EsmImport).unwrap_err();
        assert!(err.to_string().contains("EsmImport"));
    }

    #[test]
    fn test_default_registry_covers_the_esm_family() {
        let registry = TemplateRegistry::with_defaults();
        for kind in [
            DependencyKind::EsmImport,
            DependencyKind::EsmImportSideEffect,
            DependencyKind::EsmInit,
            DependencyKind::EsmCompatibility,
        ] {
            assert!(registry.get(kind).is_ok(), "missing template for {kind:?}");
        }
    }

    #[test]
    fn test_only_import_templates_expose_init_capability() {
        let registry = TemplateRegistry::with_defaults();
        assert!(
            registry
                .get(DependencyKind::EsmImport)
                .unwrap()
                .as_ordered_initializer()
                .is_some()
        );
        assert!(
            registry
                .get(DependencyKind::EsmImportSideEffect)
                .unwrap()
                .as_ordered_initializer()
                .is_some()
        );
        assert!(
            registry
                .get(DependencyKind::EsmInit)
                .unwrap()
                .as_ordered_initializer()
                .is_none()
        );
        assert!(
            registry
                .get(DependencyKind::EsmCompatibility)
                .unwrap()
                .as_ordered_initializer()
                .is_none()
        );
    }
}
