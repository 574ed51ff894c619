//! # Blocks Native
//!
//! Dynamic block runtime for the page builder and the public page surface.
//!
//! ## Pipeline
//!
//! Custom components arrive as source text stored next to the page data:
//!
//! 1. **Import classification** (`imports`): every `import` is checked
//!    against the dependency allow-list (`allowlist`). Any unknown module
//!    stops the pipeline before compilation.
//! 2. **Discovery** (`discovery`): the top-level uppercase declaration is the
//!    component.
//! 3. **Transform** (`transform`): module syntax is stripped and oxc lowers
//!    TypeScript + JSX to plain `React.createElement` calls.
//! 4. **Injection** (`factory`): the code runs in its own QuickJS engine
//!    (`sandbox`) with the runtime library, its hooks and the allow-listed
//!    exports as the only names beyond the ECMAScript built-ins.
//! 5. **Runtime** (`runtime`): per-instance state machine
//!    (Idle → Loading → Ready | Error | UnsupportedDependency) with
//!    latest-write-wins compiles.
//!
//! ## Pages
//!
//! `render::PageRenderer` builds the block tree from flat records (`tree`),
//! resolves each block in the `registry` and renders it behind its own
//! error boundary. Output is a `VNode` tree, serialisable to HTML or JSON.
//!
//! ## Invariants
//!
//! 1. Component code can only reach the engine built-ins, `console` and the
//!    injected names. There is no module resolution at runtime.
//! 2. No failure crosses a block boundary, panics included.
//! 3. Every evaluation is bounded in time, heap and stack by
//!    `ExecutionLimits`.

pub mod allowlist;
pub mod block;
pub mod check;
pub mod config;
pub mod discovery;
pub mod error;
pub mod factory;
pub mod imports;
pub mod panel;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod sandbox;
pub mod transform;
pub mod tree;
pub mod vnode;

#[cfg(feature = "napi")]
mod bridge;


#[cfg(feature = "napi")]
pub use bridge::{
    check_source_native, classify_imports_native, render_blocks_native, transform_source_native,
};

pub use allowlist::{AllowList, DependencyModule};
pub use block::{BlockRecord, CustomComponentData, Props};
pub use check::{check_source, SourceReport};
pub use config::{ConfigError, Environment, ExecutionLimits, RuntimeConfig};
pub use discovery::discover_component_name;
pub use error::{BlockError, ComponentError};
pub use factory::{build_injection, create_component, DynamicComponent, InjectedValue, Injection};
pub use imports::{classify_imports, ImportAnalysis, ImportBinding, SupportedImport};
pub use registry::{ComponentImpl, ComponentRegistry, RegistryEntry, StaticComponent};
pub use render::{page_renderer, PageRenderer};
pub use runtime::{ComponentPipeline, ComponentRuntime, RuntimeState, RuntimeStatus};
pub use sandbox::{Sandbox, SandboxError};
pub use transform::{strip_module_syntax, transform_source, OxcTransformer, SourceTransformer, TransformOutput};
pub use tree::{build_block_tree, flatten_tree, BlockTree};
pub use vnode::{render_to_html, VNode};
