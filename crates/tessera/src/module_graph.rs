//! Module identity, metadata, and the graph read during code generation.
//!
//! Graph construction and dependency resolution happen upstream. During a
//! code-generation pass the graph is a frozen snapshot: templates only ever
//! ask which module a dependency resolved to and read metadata that earlier
//! build phases have already finalized (export usage, side-effect verdicts,
//! export shape).

use std::{hash::BuildHasherDefault, sync::Arc};

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHasher};

use crate::dependency::{Dependency, DependencyId};

/// Type alias for FxHasher-based IndexMap
type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Unique identifier for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(u32);

impl ModuleId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value of the ModuleId
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Shape of a module's exports, recorded by the build phase. Read only when
/// hashing, never to drive emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportsType {
    /// Full ES-module namespace object.
    Namespace,
    /// Exports flow through a single default binding.
    DefaultOnly,
}

/// Build-phase metadata attached to a module.
#[derive(Debug, Clone, Default)]
pub struct BuildMeta {
    /// Export shape, when the build phase determined one.
    pub exports_type: Option<ExportsType>,
}

/// Metadata attached by the module factory during resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactoryMeta {
    /// Evaluation is proven free of observable side effects, so
    /// side-effect-only imports of this module may be elided.
    pub side_effect_free: bool,
}

/// Externally computed summary of which of a module's exports are consumed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UsedExports {
    /// Usage was not narrowed; every export must be assumed live and full
    /// ES-module semantics apply.
    #[default]
    All,
    /// Only the listed exports are consumed.
    Partial(Vec<String>),
}

/// A module participating in code generation, together with the dependency
/// list its parse produced.
#[derive(Debug)]
pub struct Module {
    /// Unique identifier for this module.
    pub id: ModuleId,
    /// Human-readable identifier, e.g. the module's path or specifier.
    pub identifier: String,
    /// Shared reference to the original source text.
    pub source: Arc<String>,
    /// Identifier the generated code uses for this module's exports object.
    pub exports_argument: String,
    /// Export-usage summary computed by an external optimization pass.
    pub used_exports: UsedExports,
    /// Factory metadata from resolution.
    pub factory_meta: FactoryMeta,
    /// Build metadata, absent until the build phase runs.
    pub build_meta: Option<BuildMeta>,
    /// Dependencies in declaration order.
    dependencies: Vec<Box<dyn Dependency>>,
}

impl Module {
    /// Create a module with default metadata.
    pub fn new(id: ModuleId, identifier: impl Into<String>, source: Arc<String>) -> Self {
        Self {
            id,
            identifier: identifier.into(),
            source,
            exports_argument: "__tessera_exports__".to_string(),
            used_exports: UsedExports::default(),
            factory_meta: FactoryMeta::default(),
            build_meta: None,
            dependencies: Vec::new(),
        }
    }

    /// Append a dependency. Declaration order is the iteration order code
    /// generation observes.
    pub fn add_dependency(&mut self, dependency: Box<dyn Dependency>) {
        self.dependencies.push(dependency);
    }

    /// Dependencies in declaration order.
    pub fn dependencies(&self) -> &[Box<dyn Dependency>] {
        &self.dependencies
    }
}

/// Graph of modules plus the dependency-to-module resolution table.
///
/// Mutable while the build phase constructs it, read-only for the duration of
/// a code-generation pass.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: FxIndexMap<ModuleId, Module>,
    resolution: FxHashMap<DependencyId, ModuleId>,
}

impl ModuleGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Panics if the id is already taken: two modules
    /// sharing an id means the build phase lost track of identity.
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        let id = module.id;
        if self.modules.contains_key(&id) {
            panic!("module {id:?} is already registered");
        }
        self.modules.insert(id, module);
        id
    }

    /// Record that `dependency` resolved to `module`.
    pub fn connect(&mut self, dependency: DependencyId, module: ModuleId) {
        log::trace!("resolved dependency {dependency:?} -> module {module:?}");
        self.resolution.insert(dependency, module);
    }

    /// Module a dependency resolved to, or None while the graph has no
    /// resolution for that edge.
    pub fn resolve(&self, dependency: &dyn Dependency) -> Option<&Module> {
        let module_id = self.resolution.get(&dependency.id())?;
        self.modules.get(module_id)
    }

    /// Module by id.
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Mutable module access, for build phases that run after registration
    /// (export-usage analysis, side-effect marking).
    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(&id)
    }

    /// Iterate over all modules in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when no modules are registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
