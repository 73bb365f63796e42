//! ES-module exports-flag dependency.

use std::any::Any;

use anyhow::{Result, anyhow, bail};

use crate::{
    dependency::{Dependency, DependencyId, DependencyKind},
    module_graph::{ModuleId, UsedExports},
    overlay::{InsertPoint, Overlay},
    runtime::ExportsFlagArgs,
    template::{DependencyTemplate, TemplateContext},
};

/// Marks a module that uses ES-module export semantics.
///
/// The flag statement is only emitted when every export must be assumed
/// live. When the optimizer narrowed usage to an explicit list, full
/// namespace semantics are not observably required and the cheaper path
/// applies; this template honors that verdict without re-deriving it.
#[derive(Debug)]
pub struct EsmCompatibilityDependency {
    id: DependencyId,
    origin: ModuleId,
}

impl EsmCompatibilityDependency {
    pub fn new(id: DependencyId, origin: ModuleId) -> Self {
        Self { id, origin }
    }
}

impl Dependency for EsmCompatibilityDependency {
    fn id(&self) -> DependencyId {
        self.id
    }

    fn kind(&self) -> DependencyKind {
        DependencyKind::EsmCompatibility
    }

    fn origin(&self) -> ModuleId {
        self.origin
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Template for [`EsmCompatibilityDependency`].
#[derive(Debug, Default)]
pub struct EsmCompatibilityTemplate;

impl DependencyTemplate for EsmCompatibilityTemplate {
    fn apply(
        &self,
        dependency: &dyn Dependency,
        overlay: &mut Overlay,
        context: &TemplateContext<'_>,
    ) -> Result<()> {
        let Some(dep) = dependency
            .as_any()
            .downcast_ref::<EsmCompatibilityDependency>()
        else {
            bail!(
                "esm compatibility template applied to a {:?} dependency",
                dependency.kind()
            );
        };
        let module = context
            .module_graph
            .module(dep.origin)
            .ok_or_else(|| anyhow!("unknown origin module {:?}", dep.origin))?;

        // Usage is read at apply time, not construction: the export-usage
        // pass may run after dependencies are built.
        match &module.used_exports {
            UsedExports::All => {
                let content = context.runtime.exports_flag_statement(&ExportsFlagArgs {
                    exports_argument: &module.exports_argument,
                });
                overlay.insert(InsertPoint::Prologue, content);
            }
            UsedExports::Partial(_) => {}
        }
        Ok(())
    }
}
