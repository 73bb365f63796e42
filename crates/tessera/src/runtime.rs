//! Runtime-template collaborator: the service that renders the statement
//! text templates splice into modules.
//!
//! The syntax produced here is a compatibility surface for whatever execution
//! environment runs the bundle. Code generation treats the service as an
//! opaque formatter: templates decide *where* statements go and *whether*
//! they are emitted, the runtime template decides what they look like.

use crate::{config::CodegenConfig, module_graph::Module};

/// Arguments for rendering an import statement.
#[derive(Debug)]
pub struct ImportStatementArgs<'a> {
    /// Re-affirm an existing binding instead of declaring a new one.
    pub update: bool,
    /// Resolved target, when the graph has one.
    pub module: Option<&'a Module>,
    /// Bound variable name, when a binding exists.
    pub import_var: Option<&'a str>,
    /// Raw request as written in the origin module.
    pub request: &'a str,
    /// Module the import appears in.
    pub origin: &'a Module,
}

/// Arguments for rendering the ES-module flag statement.
#[derive(Debug)]
pub struct ExportsFlagArgs<'a> {
    /// Identifier of the module's exports object.
    pub exports_argument: &'a str,
}

/// Statement-producing service consumed by the templates.
pub trait RuntimeTemplate: std::fmt::Debug + Send + Sync {
    /// Statement binding (or re-binding, for updates) an imported module.
    fn import_statement(&self, args: &ImportStatementArgs<'_>) -> String;

    /// Statement flagging a module's exports object as an ES-module
    /// namespace.
    fn exports_flag_statement(&self, args: &ExportsFlagArgs<'_>) -> String;
}

/// Plain JavaScript renderer targeting the tessera bundle runtime.
#[derive(Debug, Default)]
pub struct BasicRuntimeTemplate {
    config: CodegenConfig,
}

impl BasicRuntimeTemplate {
    /// Renderer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with explicit options.
    pub fn with_config(config: CodegenConfig) -> Self {
        Self { config }
    }

    fn comment(&self, text: &str) -> String {
        if self.config.emit_comments {
            format!("/* {text} */ ")
        } else {
            String::new()
        }
    }
}

impl RuntimeTemplate for BasicRuntimeTemplate {
    fn import_statement(&self, args: &ImportStatementArgs<'_>) -> String {
        let Some(module) = args.module else {
            // Unresolved edges still produce a statement: the bundle must
            // fail loudly at the exact import the graph could not resolve.
            let request = args.request.replace('\\', "\\\\").replace('"', "\\\"");
            return format!(
                "{}!function() {{ var e = new Error(\"Cannot find module '{}'\"); e.code = \
                 'MODULE_NOT_FOUND'; throw e; }}();\n",
                self.comment("missing module"),
                request
            );
        };

        let import_var = args.import_var.unwrap_or("__tessera_unused__");
        let module_id = module.id.as_u32();
        if args.update {
            format!(
                "{}{import_var} = {}({module_id});\n",
                self.comment("module import update"),
                self.config.require_function
            )
        } else {
            format!(
                "{}var {import_var} = {}({module_id});\n",
                self.comment("module import"),
                self.config.require_function
            )
        }
    }

    fn exports_flag_statement(&self, args: &ExportsFlagArgs<'_>) -> String {
        format!(
            "{}Object.defineProperty({}, \"__esModule\", {{ value: true }});\n",
            self.comment("esm flag"),
            args.exports_argument
        )
    }
}
