//! Aggregated, ordered emission of import initialization.
//!
//! Import templates write nothing on the driver's pass. This synthetic
//! per-module dependency re-scans the origin's full dependency list, probes
//! each template for the ordered-initializer capability, sorts the eligible
//! set, and replays the emissions. It is the only place cross-dependency
//! ordering is decided; every other template is order-agnostic.

use std::any::Any;

use anyhow::{Result, anyhow, bail};
use log::debug;

use crate::{
    dependency::{Dependency, DependencyId, DependencyKind},
    module_graph::ModuleId,
    overlay::Overlay,
    template::{DependencyTemplate, OrderedInitializer, TemplateContext},
};

/// Synthetic marker carried by every module that needs import
/// initialization. Exactly one instance per such module.
#[derive(Debug)]
pub struct EsmInitDependency {
    id: DependencyId,
    origin: ModuleId,
}

impl EsmInitDependency {
    pub fn new(id: DependencyId, origin: ModuleId) -> Self {
        Self { id, origin }
    }
}

impl Dependency for EsmInitDependency {
    fn id(&self) -> DependencyId {
        self.id
    }

    fn kind(&self) -> DependencyKind {
        DependencyKind::EsmInit
    }

    fn origin(&self) -> ModuleId {
        self.origin
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Template for [`EsmInitDependency`].
#[derive(Debug, Default)]
pub struct EsmInitTemplate;

struct InitEntry<'a> {
    order: i32,
    /// Position in the collection pass, the tie-break for equal orders.
    list_order: usize,
    dependency: &'a dyn Dependency,
    initializer: &'a dyn OrderedInitializer,
}

impl DependencyTemplate for EsmInitTemplate {
    fn apply(
        &self,
        dependency: &dyn Dependency,
        overlay: &mut Overlay,
        context: &TemplateContext<'_>,
    ) -> Result<()> {
        let Some(dep) = dependency.as_any().downcast_ref::<EsmInitDependency>() else {
            bail!(
                "esm init template applied to a {:?} dependency",
                dependency.kind()
            );
        };
        let module = context
            .module_graph
            .module(dep.origin)
            .ok_or_else(|| anyhow!("unknown origin module {:?}", dep.origin))?;

        let mut list: Vec<InitEntry<'_>> = Vec::new();
        for dependency in module.dependencies() {
            let template = context.templates.get(dependency.kind())?;
            let Some(initializer) = template.as_ordered_initializer() else {
                continue;
            };
            let Some(order) = initializer.init_order(dependency.as_ref(), context) else {
                // Excluded from aggregation: no emission, no ordering slot.
                continue;
            };
            list.push(InitEntry {
                order,
                list_order: list.len(),
                dependency: dependency.as_ref(),
                initializer,
            });
        }

        list.sort_by_key(|entry| (entry.order, entry.list_order));
        debug!(
            "emitting {} import initializations for module {}",
            list.len(),
            module.identifier
        );

        for entry in &list {
            entry
                .initializer
                .emit_init(entry.dependency, overlay, context)?;
        }
        Ok(())
    }
}
