use std::sync::Arc;

use pretty_assertions::assert_eq;
use tessera::{
    codegen::{codegen_hash, generate_module},
    dependencies::{
        EsmCompatibilityDependency, EsmImportDependency, EsmImportSideEffectDependency,
        EsmInitDependency,
    },
    dependency::{Dependency, DependencyId},
    module_graph::{BuildMeta, ExportsType, Module, ModuleGraph, ModuleId, UsedExports},
    runtime::BasicRuntimeTemplate,
    scope::{BindingScopes, ScopeId},
    template::{TemplateContext, TemplateRegistry},
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn module(id: u32, identifier: &str, source: &str) -> Module {
    Module::new(ModuleId::new(id), identifier, Arc::new(source.to_string()))
}

/// Origin module with the usual synthetic markers already attached: the
/// exports-flag dependency and the init aggregator.
fn origin_module(id: u32, source: &str) -> Module {
    let mut origin = module(id, "src/main.js", source);
    origin.add_dependency(Box::new(EsmCompatibilityDependency::new(
        DependencyId::new(0),
        ModuleId::new(id),
    )));
    origin.add_dependency(Box::new(EsmInitDependency::new(
        DependencyId::new(1),
        ModuleId::new(id),
    )));
    origin
}

#[test]
fn test_single_import_end_to_end() {
    init_logs();
    let mut graph = ModuleGraph::new();
    let mut origin = origin_module(0, "console.log(a);\n");
    origin.add_dependency(Box::new(EsmImportDependency::new(
        DependencyId::new(2),
        ModuleId::new(0),
        "./a",
        0,
        ScopeId::new(0),
    )));
    graph.add_module(origin);
    graph.add_module(module(1, "src/a.js", "export const a = 1;\n"));
    graph.connect(DependencyId::new(2), ModuleId::new(1));

    let registry = TemplateRegistry::with_defaults();
    let runtime = BasicRuntimeTemplate::new();
    let generated = generate_module(
        graph.module(ModuleId::new(0)).unwrap(),
        &graph,
        &registry,
        &runtime,
    )
    .unwrap();

    assert_eq!(
        generated.text,
        "/* esm flag */ Object.defineProperty(__tessera_exports__, \"__esModule\", { value: \
         true });\n/* module import */ var __a__tessera_imported_module_0__ = \
         __tessera_require__(1);\nconsole.log(a);\n"
    );
    assert_eq!(generated.hash.len(), 64);
}

#[test]
fn test_import_variable_is_stable_within_a_scope() {
    let mut graph = ModuleGraph::new();
    graph.add_module(module(0, "src/main.js", ""));
    graph.add_module(module(1, "src/a.js", ""));
    graph.add_module(module(2, "src/b.js", ""));

    let scope = ScopeId::new(0);
    let first = EsmImportDependency::new(DependencyId::new(2), ModuleId::new(0), "./a", 0, scope);
    let second = EsmImportDependency::new(DependencyId::new(3), ModuleId::new(0), "./a", 1, scope);
    let other = EsmImportDependency::new(DependencyId::new(4), ModuleId::new(0), "./b", 2, scope);
    let unresolved =
        EsmImportDependency::new(DependencyId::new(5), ModuleId::new(0), "./c", 3, scope);
    graph.connect(DependencyId::new(2), ModuleId::new(1));
    graph.connect(DependencyId::new(3), ModuleId::new(1));
    graph.connect(DependencyId::new(4), ModuleId::new(2));

    let registry = TemplateRegistry::with_defaults();
    let runtime = BasicRuntimeTemplate::new();
    let scopes = BindingScopes::new();
    let context = TemplateContext {
        module_graph: &graph,
        templates: &registry,
        runtime: &runtime,
        scopes: &scopes,
    };

    let name_a = first.import_variable(&context).unwrap();
    assert_eq!(name_a, second.import_variable(&context).unwrap());
    assert_ne!(name_a, other.import_variable(&context).unwrap());
    // No resolution means no binding, not an error.
    assert!(unresolved.import_variable(&context).is_none());
}

#[test]
fn test_duplicate_imports_emit_once() {
    init_logs();
    let mut graph = ModuleGraph::new();
    let mut origin = origin_module(0, "console.log(a);\n");
    // The same target imported three times from the same scope.
    for (dep_id, order) in [(2, 0), (3, 1), (4, 2)] {
        origin.add_dependency(Box::new(EsmImportDependency::new(
            DependencyId::new(dep_id),
            ModuleId::new(0),
            "./a",
            order,
            ScopeId::new(0),
        )));
        graph.connect(DependencyId::new(dep_id), ModuleId::new(1));
    }
    graph.add_module(origin);
    graph.add_module(module(1, "src/a.js", "export const a = 1;\n"));

    let registry = TemplateRegistry::with_defaults();
    let runtime = BasicRuntimeTemplate::new();
    let generated = generate_module(
        graph.module(ModuleId::new(0)).unwrap(),
        &graph,
        &registry,
        &runtime,
    )
    .unwrap();

    assert_eq!(generated.text.matches("__tessera_require__(1)").count(), 1);
}

#[test]
fn test_initialization_order_is_deterministic() {
    init_logs();
    let mut graph = ModuleGraph::new();
    let mut origin = origin_module(0, "main();\n");
    // Source orders [3, 1, 1, 2]; expected emission [1, 1, 2, 3] with the
    // two order-1 entries keeping declaration order.
    let imports = [(2, "./a", 3, 10), (3, "./b", 1, 11), (4, "./c", 1, 12), (5, "./d", 2, 13)];
    for (dep_id, request, order, target) in imports {
        origin.add_dependency(Box::new(EsmImportDependency::new(
            DependencyId::new(dep_id),
            ModuleId::new(0),
            request,
            order,
            ScopeId::new(0),
        )));
        graph.connect(DependencyId::new(dep_id), ModuleId::new(target));
    }
    graph.add_module(origin);
    for (id, name) in [(10, "src/a.js"), (11, "src/b.js"), (12, "src/c.js"), (13, "src/d.js")] {
        graph.add_module(module(id, name, ""));
    }

    let registry = TemplateRegistry::with_defaults();
    let runtime = BasicRuntimeTemplate::new();
    let generated = generate_module(
        graph.module(ModuleId::new(0)).unwrap(),
        &graph,
        &registry,
        &runtime,
    )
    .unwrap();

    let position = |needle: &str| {
        generated
            .text
            .find(needle)
            .unwrap_or_else(|| panic!("missing {needle} in {}", generated.text))
    };
    let b = position("__tessera_require__(11)");
    let c = position("__tessera_require__(12)");
    let d = position("__tessera_require__(13)");
    let a = position("__tessera_require__(10)");
    assert!(b < c && c < d && d < a, "emission order was not [b, c, d, a]");
}

#[test]
fn test_side_effect_free_target_is_elided() {
    init_logs();
    let mut graph = ModuleGraph::new();
    let mut origin = origin_module(0, "main();\n");
    origin.add_dependency(Box::new(EsmImportSideEffectDependency::new(
        DependencyId::new(2),
        ModuleId::new(0),
        "./polyfill",
        0,
        ScopeId::new(0),
    )));
    origin.add_dependency(Box::new(EsmImportDependency::new(
        DependencyId::new(3),
        ModuleId::new(0),
        "./a",
        1,
        ScopeId::new(0),
    )));
    graph.add_module(origin);

    let mut polyfill = module(1, "src/polyfill.js", "");
    polyfill.factory_meta.side_effect_free = true;
    graph.add_module(polyfill);
    graph.add_module(module(2, "src/a.js", ""));
    graph.connect(DependencyId::new(2), ModuleId::new(1));
    graph.connect(DependencyId::new(3), ModuleId::new(2));

    let registry = TemplateRegistry::with_defaults();
    let runtime = BasicRuntimeTemplate::new();
    let generated = generate_module(
        graph.module(ModuleId::new(0)).unwrap(),
        &graph,
        &registry,
        &runtime,
    )
    .unwrap();

    // The elided edge emits nothing and reserves no slot; the other import
    // still initializes.
    assert!(!generated.text.contains("__tessera_require__(1)"));
    assert!(generated.text.contains("__tessera_require__(2)"));

    // It also stops contributing to build ordering.
    let origin = graph.module(ModuleId::new(0)).unwrap();
    let side_effect_dep = &origin.dependencies()[2];
    assert!(side_effect_dep.reference(&graph).is_none());
}

#[test]
fn test_side_effect_import_of_ordinary_target_still_initializes() {
    let mut graph = ModuleGraph::new();
    let mut origin = origin_module(0, "main();\n");
    origin.add_dependency(Box::new(EsmImportSideEffectDependency::new(
        DependencyId::new(2),
        ModuleId::new(0),
        "./setup",
        0,
        ScopeId::new(0),
    )));
    graph.add_module(origin);
    graph.add_module(module(1, "src/setup.js", "window.setup = true;\n"));
    graph.connect(DependencyId::new(2), ModuleId::new(1));

    let registry = TemplateRegistry::with_defaults();
    let runtime = BasicRuntimeTemplate::new();
    let generated = generate_module(
        graph.module(ModuleId::new(0)).unwrap(),
        &graph,
        &registry,
        &runtime,
    )
    .unwrap();

    assert!(generated.text.contains("__tessera_require__(1)"));
}

#[test]
fn test_exports_flag_gating() {
    let registry = TemplateRegistry::with_defaults();
    let runtime = BasicRuntimeTemplate::new();

    // Usage not narrowed: the flag statement leads the output.
    let mut graph = ModuleGraph::new();
    graph.add_module(origin_module(0, "export const x = 1;\n"));
    let generated = generate_module(
        graph.module(ModuleId::new(0)).unwrap(),
        &graph,
        &registry,
        &runtime,
    )
    .unwrap();
    assert!(generated.text.starts_with("/* esm flag */ Object.defineProperty"));

    // Usage narrowed to an explicit list: no flag.
    let mut graph = ModuleGraph::new();
    let mut origin = origin_module(0, "export const x = 1;\n");
    origin.used_exports = UsedExports::Partial(vec!["x".to_string()]);
    graph.add_module(origin);
    let generated = generate_module(
        graph.module(ModuleId::new(0)).unwrap(),
        &graph,
        &registry,
        &runtime,
    )
    .unwrap();
    assert!(!generated.text.contains("__esModule"));
    assert_eq!(generated.text, "export const x = 1;\n");
}

#[test]
fn test_unresolved_import_fails_loudly_and_dedups_by_request() {
    let mut graph = ModuleGraph::new();
    let mut origin = origin_module(0, "main();\n");
    // Two unresolved imports of the same request share one emission.
    origin.add_dependency(Box::new(EsmImportDependency::new(
        DependencyId::new(2),
        ModuleId::new(0),
        "./gone",
        0,
        ScopeId::new(0),
    )));
    origin.add_dependency(Box::new(EsmImportDependency::new(
        DependencyId::new(3),
        ModuleId::new(0),
        "./gone",
        1,
        ScopeId::new(0),
    )));
    graph.add_module(origin);

    let registry = TemplateRegistry::with_defaults();
    let runtime = BasicRuntimeTemplate::new();
    let generated = generate_module(
        graph.module(ModuleId::new(0)).unwrap(),
        &graph,
        &registry,
        &runtime,
    )
    .unwrap();

    assert_eq!(
        generated
            .text
            .matches("Cannot find module './gone'")
            .count(),
        1
    );
    assert!(generated.text.contains("MODULE_NOT_FOUND"));
}

#[test]
fn test_hash_tracks_export_shape_not_target_internals() {
    let mut graph = ModuleGraph::new();
    let mut origin = origin_module(0, "console.log(a);\n");
    origin.add_dependency(Box::new(EsmImportDependency::new(
        DependencyId::new(2),
        ModuleId::new(0),
        "./a",
        0,
        ScopeId::new(0),
    )));
    graph.add_module(origin);
    graph.add_module(module(1, "src/a.js", "export const a = 1;\n"));
    graph.connect(DependencyId::new(2), ModuleId::new(1));

    let baseline = codegen_hash(graph.module(ModuleId::new(0)).unwrap(), &graph);

    // Internal edit to the target: importer hash must not move.
    graph.module_mut(ModuleId::new(1)).unwrap().source =
        Arc::new("export const a = 2;\n".to_string());
    let after_internal_edit = codegen_hash(graph.module(ModuleId::new(0)).unwrap(), &graph);
    assert_eq!(baseline, after_internal_edit);

    // Export-shape change in the target: importer hash must move even though
    // the importer's own source is byte-identical.
    graph.module_mut(ModuleId::new(1)).unwrap().build_meta = Some(BuildMeta {
        exports_type: Some(ExportsType::Namespace),
    });
    let after_shape_change = codegen_hash(graph.module(ModuleId::new(0)).unwrap(), &graph);
    assert_ne!(baseline, after_shape_change);

    // And again when the shape flips between concrete kinds.
    graph.module_mut(ModuleId::new(1)).unwrap().build_meta = Some(BuildMeta {
        exports_type: Some(ExportsType::DefaultOnly),
    });
    let after_second_change = codegen_hash(graph.module(ModuleId::new(0)).unwrap(), &graph);
    assert_ne!(after_shape_change, after_second_change);
}

#[test]
fn test_hash_tracks_target_identity() {
    let build = |target_id: u32| {
        let mut graph = ModuleGraph::new();
        let mut origin = origin_module(0, "console.log(a);\n");
        origin.add_dependency(Box::new(EsmImportDependency::new(
            DependencyId::new(2),
            ModuleId::new(0),
            "./a",
            0,
            ScopeId::new(0),
        )));
        graph.add_module(origin);
        graph.add_module(module(target_id, "src/a.js", "export const a = 1;\n"));
        graph.connect(DependencyId::new(2), ModuleId::new(target_id));
        codegen_hash(graph.module(ModuleId::new(0)).unwrap(), &graph)
    };
    assert_ne!(build(1), build(2));
}

#[test]
fn test_weak_flag_propagates_into_reference() {
    let mut graph = ModuleGraph::new();
    let mut dep = EsmImportDependency::new(
        DependencyId::new(2),
        ModuleId::new(0),
        "./a",
        4,
        ScopeId::new(0),
    );
    dep.weak = true;
    graph.add_module(module(1, "src/a.js", ""));
    graph.connect(DependencyId::new(2), ModuleId::new(1));

    let reference = dep.reference(&graph).unwrap();
    assert!(reference.weak);
    assert_eq!(reference.order, 4);
    assert_eq!(reference.module, ModuleId::new(1));
}

#[test]
fn test_missing_template_registration_is_fatal() {
    let mut graph = ModuleGraph::new();
    let mut origin = origin_module(0, "main();\n");
    origin.add_dependency(Box::new(EsmImportDependency::new(
        DependencyId::new(2),
        ModuleId::new(0),
        "./a",
        0,
        ScopeId::new(0),
    )));
    graph.add_module(origin);

    let registry = TemplateRegistry::new();
    let runtime = BasicRuntimeTemplate::new();
    let err = generate_module(
        graph.module(ModuleId::new(0)).unwrap(),
        &graph,
        &registry,
        &runtime,
    )
    .unwrap_err();
    assert!(err.to_string().contains("no dependency template registered"));
}
