//! Per-parse-unit binding scopes for import variables.
//!
//! All import dependencies parsed from the same module fragment share one
//! scope. Within a scope the first import of a target module allocates a
//! binding name and every later import of the same target reuses it, so a
//! module that imports the same target five times still declares one
//! variable.

use std::{cell::RefCell, hash::BuildHasherDefault};

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHasher};

use crate::module_graph::ModuleId;

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Unique identifier for an import-binding scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Default)]
struct ImportScope {
    /// Binding name per resolved target, in allocation order. The map length
    /// doubles as the per-scope counter, so names stay unique even when two
    /// distinct requests sanitize to the same identifier stem.
    bindings: FxIndexMap<ModuleId, String>,
}

/// Side table of import-binding scopes for one code-generation attempt.
///
/// Interior mutability keeps the template context read-only to callers while
/// templates allocate bindings lazily. A pass touches a single module, so
/// access stays single-threaded by construction; cross-module parallelism
/// uses one table per pass.
#[derive(Debug, Default)]
pub struct BindingScopes {
    scopes: RefCell<FxHashMap<ScopeId, ImportScope>>,
}

impl BindingScopes {
    /// Create an empty scope table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or lazily create the binding name for `module` in `scope`.
    ///
    /// Names are stable for the lifetime of the scope: the first call for a
    /// given target allocates, every later call returns the same name.
    pub fn import_variable(&self, scope: ScopeId, module: ModuleId, request: &str) -> String {
        let mut scopes = self.scopes.borrow_mut();
        let scope = scopes.entry(scope).or_default();
        if let Some(name) = scope.bindings.get(&module) {
            return name.clone();
        }
        let name = format!(
            "{}__tessera_imported_module_{}__",
            to_identifier(request),
            scope.bindings.len()
        );
        log::trace!("bound import of {module:?} as {name}");
        scope.bindings.insert(module, name.clone());
        name
    }
}

/// Mangle a request string into a valid identifier stem. The first character
/// may not be a digit; every character outside `[A-Za-z0-9$_]` becomes an
/// underscore.
pub fn to_identifier(request: &str) -> String {
    let mut out = String::with_capacity(request.len());
    for (index, c) in request.chars().enumerate() {
        let valid = c == '_'
            || c == '$'
            || c.is_ascii_alphabetic()
            || (index > 0 && c.is_ascii_digit());
        out.push(if valid { c } else { '_' });
    }
    out
}
