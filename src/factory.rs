//! Dependency Injector / Component Factory
//!
//! Evaluates transformed code as the body of a function whose parameters
//! are the runtime library, its hooks and the allow-listed imports:
//!
//! ```text
//! (function (React, useState, ..., Calendar) { <transformed code>; return Foo; })
//! ```
//!
//! The function runs in a fresh `Sandbox`. Nothing outside the injected
//! names and the engine's built-ins is reachable from component code.

use std::collections::HashMap;
use std::fmt;

use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Object, Persistent, Value};
use tracing::{debug, warn};

use crate::allowlist::{AllowList, DependencyModule, Export};
use crate::block::Props;
use crate::config::ExecutionLimits;
use crate::error::ComponentError;
use crate::imports::{ImportBinding, SupportedImport};
use crate::sandbox::{caught, Sandbox, SandboxError, HOST_SCRIPT};
use crate::vnode::VNode;

/// Runtime names every component scope receives, in injection order.
pub const RUNTIME_NAMES: &[&str] = &[
    "React",
    "Fragment",
    "useState",
    "useReducer",
    "useEffect",
    "useLayoutEffect",
    "useMemo",
    "useCallback",
    "useRef",
    "useContext",
    "useId",
];

/// Where an injected parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedValue {
    /// A runtime library binding.
    Runtime(String),
    /// A whole allow-listed module, for `import * as X`.
    Module(String),
    Export { path: String, export: String },
    Undefined,
}

/// Parallel parameter names and values handed to the component body.
#[derive(Debug, Clone, Default)]
pub struct Injection {
    pub names: Vec<String>,
    pub values: Vec<InjectedValue>,
}

impl Injection {
    fn push(&mut self, name: &str, value: InjectedValue) {
        self.names.push(name.to_string());
        self.values.push(value);
    }
}

/// Runtime library and hooks first, then every requested import in order.
/// A later binding of the same name wins.
pub fn build_injection(imports: &[SupportedImport], allowlist: &AllowList) -> Injection {
    let mut injection = Injection::default();
    for name in RUNTIME_NAMES {
        injection.push(name, InjectedValue::Runtime(name.to_string()));
    }

    for import in imports {
        let Some(module) = allowlist.get(&import.path) else {
            warn!(path = %import.path, "import is not in the allow-list; skipping");
            continue;
        };
        for binding in &import.bindings {
            let value = resolve_binding(&import.path, module, binding).unwrap_or_else(|| {
                warn!(
                    path = %import.path,
                    name = %binding.requested_name(),
                    "{} does not export {}",
                    import.path,
                    binding.requested_name()
                );
                InjectedValue::Undefined
            });
            injection.push(binding.local(), value);
        }
    }

    injection
}

fn resolve_binding(
    path: &str,
    module: &DependencyModule,
    binding: &ImportBinding,
) -> Option<InjectedValue> {
    let export = match binding {
        ImportBinding::Namespace { .. } => return Some(InjectedValue::Module(path.to_string())),
        ImportBinding::Named { export, .. } => module.get(export).map(|_| export.as_str()),
        ImportBinding::Default { local } => module
            .default_export_name()
            .or_else(|| module.get(local).map(|_| local.as_str())),
    }?;
    Some(InjectedValue::Export {
        path: path.to_string(),
        export: export.to_string(),
    })
}

/// Builds the module object for `module` inside the engine.
fn materialise<'js>(
    ctx: &Ctx<'js>,
    host: &Object<'js>,
    module: &DependencyModule,
) -> Result<Object<'js>, SandboxError> {
    let library: Function = caught(ctx, host.get("library"))?;
    let object = Object::new(ctx.clone())?;
    for (name, export) in module.exports() {
        let value: Value = match export {
            Export::Component(component) => caught(
                ctx,
                library.call((
                    component.name.as_str(),
                    component.tag.as_str(),
                    component.class.as_str(),
                    component.slot(),
                )),
            )?,
            Export::Function { source, .. } => {
                caught(ctx, ctx.eval::<Value, _>(format!("({})", source)))?
            }
        };
        object.set(name, value)?;
    }
    if let Some(default) = module.default_export_name() {
        let value: Value = object.get(default)?;
        object.set("default", value)?;
    }
    Ok(object)
}

fn resolve_value<'js>(
    ctx: &Ctx<'js>,
    runtime: &Object<'js>,
    modules: &HashMap<&str, Object<'js>>,
    value: &InjectedValue,
) -> Result<Value<'js>, SandboxError> {
    let undefined = || Value::new_undefined(ctx.clone());
    Ok(match value {
        InjectedValue::Runtime(name) => caught(ctx, runtime.get(name.as_str()))?,
        InjectedValue::Module(path) => modules
            .get(path.as_str())
            .map(|module| module.clone().into_value())
            .unwrap_or_else(undefined),
        InjectedValue::Export { path, export } => match modules.get(path.as_str()) {
            Some(module) => caught(ctx, module.get(export.as_str()))?,
            None => undefined(),
        },
        InjectedValue::Undefined => undefined(),
    })
}

fn js_type(value: &Value<'_>) -> &'static str {
    if value.is_undefined() {
        "undefined"
    } else if value.is_null() {
        "null"
    } else if value.is_bool() {
        "boolean"
    } else if value.is_number() {
        "number"
    } else if value.is_string() {
        "string"
    } else if value.is_symbol() {
        "symbol"
    } else {
        "object"
    }
}

fn factory_source(names: &[String], code: &str, name: &str) -> String {
    // The inner function lets component code redeclare injected names.
    format!(
        "(function ({}) {{\nreturn (function () {{\n{}\nreturn {};\n}})();\n}})",
        names.join(", "),
        code,
        name
    )
}

/// A constructed component plus the engine that owns it.
pub struct DynamicComponent {
    // Persistent handles are released before the sandbox that owns them.
    component: Persistent<Function<'static>>,
    host: Persistent<Object<'static>>,
    sandbox: Sandbox,
    name: String,
}

impl fmt::Debug for DynamicComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicComponent")
            .field("name", &self.name)
            .field("sandbox", &self.sandbox)
            .finish_non_exhaustive()
    }
}

/// Builds the component named `name` from transformed `code`.
///
/// Engine setup failures, exceptions thrown while the body runs, exhausted
/// limits and a body whose result is not callable all become
/// `ComponentError::Construction`.
pub fn create_component(
    code: &str,
    name: &str,
    imports: &[SupportedImport],
    allowlist: &AllowList,
    limits: ExecutionLimits,
) -> Result<DynamicComponent, ComponentError> {
    let construction = |err: SandboxError| ComponentError::Construction(err.to_string());

    let injection = build_injection(imports, allowlist);
    debug!(component = name, bindings = injection.names.len(), "constructing component");

    let sandbox = Sandbox::new(limits).map_err(construction)?;
    let source = factory_source(&injection.names, code, name);

    let (component, host) = sandbox
        .with(|ctx| {
            let host: Object = caught(&ctx, ctx.eval(HOST_SCRIPT))?;
            let runtime: Object = caught(&ctx, host.get("runtime"))?;

            let mut modules: HashMap<&str, Object> = HashMap::new();
            for import in imports {
                if modules.contains_key(import.path.as_str()) {
                    continue;
                }
                if let Some(module) = allowlist.get(&import.path) {
                    modules.insert(import.path.as_str(), materialise(&ctx, &host, module)?);
                }
            }

            let values = injection
                .values
                .iter()
                .map(|value| resolve_value(&ctx, &runtime, &modules, value))
                .collect::<Result<Vec<_>, _>>()?;

            let factory: Function = caught(&ctx, ctx.eval(source))?;
            let component: Value = caught(&ctx, factory.call((Rest(values),)))?;
            let Some(function) = component.as_function().cloned() else {
                return Err(SandboxError::NotAComponent {
                    name: name.to_string(),
                    found: js_type(&component).to_string(),
                });
            };
            Ok((Persistent::save(&ctx, function), Persistent::save(&ctx, host)))
        })
        .map_err(construction)?;

    Ok(DynamicComponent {
        component,
        host,
        sandbox,
        name: name.to_string(),
    })
}

impl DynamicComponent {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders once with `props`; non-empty `children` become `props.children`.
    pub fn render(
        &mut self,
        props: &Props,
        children: Option<Vec<VNode>>,
    ) -> Result<Vec<VNode>, SandboxError> {
        let output_error = |err: serde_json::Error| SandboxError::Output(err.to_string());

        let props = serde_json::to_string(props).map_err(output_error)?;
        let children = match children.filter(|nodes| !nodes.is_empty()) {
            Some(nodes) => Some(serde_json::to_string(&nodes).map_err(output_error)?),
            None => None,
        };

        let component = self.component.clone();
        let host = self.host.clone();
        let rendered: String = self.sandbox.with(move |ctx| {
            let component = component.restore(&ctx)?;
            let host = host.restore(&ctx)?;
            let render: Function = caught(&ctx, host.get("render"))?;
            caught(&ctx, render.call((component, props, children)))
        })?;

        serde_json::from_str(&rendered).map_err(output_error)
    }
}
