//! Module-level ES import dependency and its template.
//!
//! An import by itself never writes text: its template is a no-op on the
//! driver's pass, and the actual initialization statement is emitted later,
//! once per target, when the init aggregator replays the eligible templates
//! in source order.

use std::any::Any;

use anyhow::Result;

use crate::{
    dependency::{
        Dependency, DependencyId, DependencyKind, DependencyReference, hash_dependency_base,
    },
    hash::CodegenHash,
    module_graph::{ExportsType, Module, ModuleGraph, ModuleId},
    overlay::{EmissionKey, InsertPoint, Overlay},
    runtime::ImportStatementArgs,
    scope::ScopeId,
    template::{DependencyTemplate, OrderedInitializer, TemplateContext},
};

use super::EsmImportSideEffectDependency;

/// A module-level ES import: binds the resolved target to an import variable
/// in the origin module's scope.
#[derive(Debug)]
pub struct EsmImportDependency {
    id: DependencyId,
    origin: ModuleId,
    request: String,
    /// Declaration position among the origin module's imports.
    source_order: i32,
    /// Binding namespace shared by all imports parsed from the same
    /// fragment.
    scope: ScopeId,
    /// Weak edges do not force inclusion of the target.
    pub weak: bool,
}

impl EsmImportDependency {
    pub fn new(
        id: DependencyId,
        origin: ModuleId,
        request: impl Into<String>,
        source_order: i32,
        scope: ScopeId,
    ) -> Self {
        Self {
            id,
            origin,
            request: request.into(),
            source_order,
            scope,
            weak: false,
        }
    }

    /// Declaration position among the origin module's imports.
    pub fn source_order(&self) -> i32 {
        self.source_order
    }

    /// Binding scope this import allocates its variable in.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Binding name for the resolved target in this import's scope, or None
    /// while the graph has no resolution for this edge.
    pub fn import_variable(&self, context: &TemplateContext<'_>) -> Option<String> {
        let module = context.module_graph.resolve(self)?;
        Some(
            context
                .scopes
                .import_variable(self.scope, module.id, &self.request),
        )
    }

    /// Render the statement that binds (for `update`, re-binds) the import
    /// variable, delegating the concrete syntax to the runtime service.
    pub fn import_statement(&self, update: bool, context: &TemplateContext<'_>) -> String {
        let module = context.module_graph.resolve(self);
        let import_var = self.import_variable(context);
        let origin = context
            .module_graph
            .module(self.origin)
            .expect("origin module must be registered in the graph");
        context.runtime.import_statement(&ImportStatementArgs {
            update,
            module,
            import_var: import_var.as_deref(),
            request: &self.request,
            origin,
        })
    }

    /// Dedup key for initialization: the resolved target, or the raw request
    /// while unresolved.
    pub(crate) fn emission_key(&self, graph: &ModuleGraph) -> EmissionKey {
        match graph.resolve(self) {
            Some(module) => EmissionKey::Module(module.id),
            None => EmissionKey::Request(self.request.clone()),
        }
    }
}

impl Dependency for EsmImportDependency {
    fn id(&self) -> DependencyId {
        self.id
    }

    fn kind(&self) -> DependencyKind {
        DependencyKind::EsmImport
    }

    fn origin(&self) -> ModuleId {
        self.origin
    }

    fn request(&self) -> Option<&str> {
        Some(&self.request)
    }

    fn reference(&self, graph: &ModuleGraph) -> Option<DependencyReference> {
        let module = graph.resolve(self)?;
        Some(DependencyReference {
            module: module.id,
            weak: self.weak,
            order: self.source_order,
        })
    }

    fn update_hash(&self, hash: &mut CodegenHash, graph: &ModuleGraph) {
        hash_dependency_base(hash, self.kind(), Dependency::request(self));
        hash_import_target(hash, graph.resolve(self));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Fold the resolved target's export shape and identity into `hash`.
///
/// Export shape is what makes an importer's generated code differ, so the
/// hash must move when the target's export kind changes even if the importer
/// text is untouched. Internal edits to the target leave both inputs alone.
pub(crate) fn hash_import_target(hash: &mut CodegenHash, module: Option<&Module>) {
    let exports_marker = match module {
        None => "no-module",
        Some(module) => match &module.build_meta {
            None => "no-build-meta",
            Some(meta) => match meta.exports_type {
                Some(ExportsType::Namespace) => "namespace",
                Some(ExportsType::DefaultOnly) => "default-only",
                None => "unspecified",
            },
        },
    };
    hash.update(exports_marker);
    match module {
        Some(module) => hash.update(module.id.as_u32().to_le_bytes()),
        None => hash.update("no-identity"),
    }
}

/// View any dependency of the ES-import family as its import core.
pub(crate) fn as_esm_import(dependency: &dyn Dependency) -> Option<&EsmImportDependency> {
    let any = dependency.as_any();
    if let Some(dep) = any.downcast_ref::<EsmImportDependency>() {
        return Some(dep);
    }
    any.downcast_ref::<EsmImportSideEffectDependency>()
        .map(EsmImportSideEffectDependency::import)
}

/// Idempotent emission shared by the import family: the first call for a
/// target inserts its initialization statement, later calls are no-ops.
pub(crate) fn emit_import_init(
    dep: &EsmImportDependency,
    overlay: &mut Overlay,
    context: &TemplateContext<'_>,
) -> Result<()> {
    let key = dep.emission_key(context.module_graph);
    if !overlay.mark_import_emitted(key) {
        log::trace!("import of {} already initialized", dep.request);
        return Ok(());
    }
    let content = dep.import_statement(false, context);
    overlay.insert(InsertPoint::Prelude, content);
    Ok(())
}

/// Template for [`EsmImportDependency`]. Applying it writes nothing; the
/// import only becomes text through the init aggregator.
#[derive(Debug, Default)]
pub struct EsmImportTemplate;

impl DependencyTemplate for EsmImportTemplate {
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

impl OrderedInitializer for EsmImportTemplate {
    fn init_order(
        &self,
        dependency: &dyn Dependency,
        _context: &TemplateContext<'_>,
    ) -> Option<i32> {
        as_esm_import(dependency).map(EsmImportDependency::source_order)
    }

    fn emit_init(
        &self,
        dependency: &dyn Dependency,
        overlay: &mut Overlay,
        context: &TemplateContext<'_>,
    ) -> Result<()> {
        let Some(dep) = as_esm_import(dependency) else {
            return Ok(());
        };
        emit_import_init(dep, overlay, context)
    }
}
