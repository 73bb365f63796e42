//! Per-module code-generation driver.
//!
//! One pass over one module is strictly sequential: dependency iteration,
//! template dispatch, and overlay mutation happen in a single undivided
//! sweep, because the init aggregator re-reads per-pass dedup state the
//! sweep populates. Across distinct modules passes are independent: the
//! registry and graph are immutable snapshots for the duration, and every
//! mutable piece (overlay, emission record, binding scopes) is created here
//! and dropped on any exit, so a failed or cancelled pass leaks nothing into
//! a retry.

use anyhow::Result;
use log::debug;

use crate::{
    hash::CodegenHash,
    module_graph::{Module, ModuleGraph},
    overlay::Overlay,
    runtime::RuntimeTemplate,
    scope::BindingScopes,
    template::{TemplateContext, TemplateRegistry},
};

/// Output of one code-generation pass over a module.
#[derive(Debug, Clone)]
pub struct GeneratedModule {
    /// Bundle-ready text.
    pub text: String,
    /// Incremental-build hash over every semantically relevant input.
    pub hash: String,
}

/// Generate bundle-ready output for one module.
pub fn generate_module(
    module: &Module,
    graph: &ModuleGraph,
    templates: &TemplateRegistry,
    runtime: &dyn RuntimeTemplate,
) -> Result<GeneratedModule> {
    let scopes = BindingScopes::new();
    let context = TemplateContext {
        module_graph: graph,
        templates,
        runtime,
        scopes: &scopes,
    };

    debug!(
        "generating code for module {} ({} dependencies)",
        module.identifier,
        module.dependencies().len()
    );
    let mut overlay = Overlay::new(module.source.clone());
    for dependency in module.dependencies() {
        let template = templates.get(dependency.kind())?;
        template.apply(dependency.as_ref(), &mut overlay, &context)?;
    }

    let text = overlay.materialize();
    let hash = codegen_hash(module, graph);
    Ok(GeneratedModule { text, hash })
}

/// Hash of everything that affects this module's generated output: its own
/// source plus every dependency's contribution. Targets contribute identity
/// and export shape only, so purely internal edits to an imported module do
/// not invalidate its importers.
pub fn codegen_hash(module: &Module, graph: &ModuleGraph) -> String {
    let mut hash = CodegenHash::new();
    hash.update(module.source.as_bytes());
    for dependency in module.dependencies() {
        dependency.update_hash(&mut hash, graph);
    }
    hash.finish()
}
