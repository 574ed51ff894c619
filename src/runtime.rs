//! Runtime Wrapper
//!
//! ## State machine
//!
//! ```text
//! Idle ──compile──▶ Loading ──▶ Ready
//!                           ├──▶ Error
//!                           └──▶ UnsupportedDependency
//! Ready ──render failure──▶ Error ──retry──▶ Idle
//! ```
//!
//! Every source change starts a new generation. Outcomes from older
//! generations are discarded when they finish, so the latest source always
//! decides what is displayed.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::allowlist::AllowList;
use crate::block::{CustomComponentData, Props};
use crate::config::RuntimeConfig;
use crate::discovery::discover_component_name;
use crate::error::ComponentError;
use crate::factory::{create_component, DynamicComponent};
use crate::imports::classify_imports;
use crate::panel;
use crate::transform::{OxcTransformer, SourceTransformer};
use crate::vnode::VNode;

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Classifier → discovery → transformer → factory, over a shared allow-list.
#[derive(Clone)]
pub struct ComponentPipeline {
    allowlist: Arc<AllowList>,
    transformer: Arc<dyn SourceTransformer>,
    config: RuntimeConfig,
}

impl ComponentPipeline {
    pub fn new(allowlist: Arc<AllowList>, config: RuntimeConfig) -> Self {
        ComponentPipeline {
            allowlist,
            transformer: Arc::new(OxcTransformer),
            config,
        }
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn SourceTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn allowlist(&self) -> &AllowList {
        &self.allowlist
    }

    /// Compiles `source` into a component. Unsupported imports short-circuit
    /// before the transformer runs.
    #[instrument(level = "debug", skip_all)]
    pub fn compile(&self, source: &str) -> Result<DynamicComponent, ComponentError> {
        let analysis = classify_imports(source, &self.allowlist);
        if analysis.has_unsupported() {
            return Err(ComponentError::UnsupportedDependency {
                paths: analysis.unsupported_imports,
            });
        }

        let name = discover_component_name(source).ok_or(ComponentError::ComponentNotFound)?;

        let output = self.transformer.transform(source);
        if let Some(error) = output.error {
            return Err(ComponentError::Transform(error));
        }

        create_component(
            &output.code,
            &name,
            &analysis.supported_imports,
            &self.allowlist,
            self.config.limits,
        )
    }

    pub fn run(&self, ticket: CompileTicket) -> CompiledSource {
        CompiledSource {
            generation: ticket.generation,
            result: self.compile(&ticket.source),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum RuntimeState {
    Idle,
    Loading,
    Ready(DynamicComponent),
    UnsupportedDependency(Vec<String>),
    Error(ComponentError),
}

/// Serializable view of `RuntimeState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum RuntimeStatus {
    Idle,
    Loading,
    Ready { component: String },
    UnsupportedDependency { paths: Vec<String> },
    Error { kind: String, message: String },
}

/// A compile request for one generation of the source.
#[derive(Debug, Clone)]
pub struct CompileTicket {
    generation: u64,
    source: String,
}

impl CompileTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Debug)]
pub struct CompiledSource {
    generation: u64,
    result: Result<DynamicComponent, ComponentError>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUNTIME
// ═══════════════════════════════════════════════════════════════════════════════

/// One rendered custom-component instance.
pub struct ComponentRuntime {
    pipeline: ComponentPipeline,
    data: CustomComponentData,
    generation: u64,
    state: RuntimeState,
}

impl ComponentRuntime {
    pub fn new(pipeline: ComponentPipeline, data: CustomComponentData) -> Self {
        ComponentRuntime {
            pipeline,
            data,
            generation: 0,
            state: RuntimeState::Idle,
        }
    }

    pub fn data(&self) -> &CustomComponentData {
        &self.data
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn error(&self) -> Option<&ComponentError> {
        match &self.state {
            RuntimeState::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn status(&self) -> RuntimeStatus {
        match &self.state {
            RuntimeState::Idle => RuntimeStatus::Idle,
            RuntimeState::Loading => RuntimeStatus::Loading,
            RuntimeState::Ready(component) => RuntimeStatus::Ready {
                component: component.name().to_string(),
            },
            RuntimeState::UnsupportedDependency(paths) => RuntimeStatus::UnsupportedDependency {
                paths: paths.clone(),
            },
            RuntimeState::Error(err) => RuntimeStatus::Error {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }

    /// Starts compiling the current source. Any earlier ticket becomes stale.
    pub fn begin_compile(&mut self) -> CompileTicket {
        self.generation += 1;
        self.state = RuntimeState::Loading;
        CompileTicket {
            generation: self.generation,
            source: self.data.code.clone(),
        }
    }

    /// Replaces the component data and starts compiling it.
    pub fn replace_source(&mut self, data: CustomComponentData) -> CompileTicket {
        self.data = data;
        self.begin_compile()
    }

    /// Applies a finished compile. Returns `false` for a stale generation,
    /// which leaves the state untouched.
    pub fn finish_compile(&mut self, compiled: CompiledSource) -> bool {
        if compiled.generation != self.generation {
            debug!(
                stale = compiled.generation,
                current = self.generation,
                "discarding stale compile result"
            );
            return false;
        }
        self.state = match compiled.result {
            Ok(component) => RuntimeState::Ready(component),
            Err(ComponentError::UnsupportedDependency { paths }) => {
                RuntimeState::UnsupportedDependency(paths)
            }
            Err(err) => {
                warn!(
                    component = %self.data.display_name,
                    kind = err.kind(),
                    "custom component failed to compile: {}",
                    err
                );
                RuntimeState::Error(err)
            }
        };
        true
    }

    /// Synchronous source change: begin, compile and apply.
    pub fn set_source(&mut self, data: CustomComponentData) {
        let ticket = self.replace_source(data);
        let compiled = self.pipeline.run(ticket);
        self.finish_compile(compiled);
    }

    /// Compiles the current source if nothing has been attempted yet.
    pub fn ensure_compiled(&mut self) {
        if matches!(self.state, RuntimeState::Idle) {
            let ticket = self.begin_compile();
            let compiled = self.pipeline.run(ticket);
            self.finish_compile(compiled);
        }
    }

    /// Clears an error so the next render compiles again. Unsupported
    /// dependencies stay terminal for the current source.
    pub fn retry(&mut self) -> bool {
        if matches!(self.state, RuntimeState::Error(_)) {
            self.state = RuntimeState::Idle;
            return true;
        }
        false
    }

    pub fn render(&mut self, props: &Props) -> Vec<VNode> {
        self.render_with_children(props, None)
    }

    /// Renders the live component, or the panel for the current state.
    /// Never fails: render errors move the runtime to `Error`.
    pub fn render_with_children(&mut self, props: &Props, children: Option<Vec<VNode>>) -> Vec<VNode> {
        self.ensure_compiled();

        let display_name = self.data.display_name.as_str();
        let rendered = match &mut self.state {
            RuntimeState::Idle | RuntimeState::Loading => return vec![panel::loading(display_name)],
            RuntimeState::UnsupportedDependency(paths) => {
                return vec![panel::unsupported_dependencies(
                    display_name,
                    paths,
                    self.pipeline.config().max_listed_dependencies,
                )]
            }
            RuntimeState::Error(err) => return vec![panel::error(display_name, err)],
            RuntimeState::Ready(component) => {
                let merged = self.data.merge_props(props);
                component.render(&merged, children)
            }
        };

        match rendered {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(component = %self.data.display_name, "custom component failed to render: {}", err);
                let err = ComponentError::Render(err.to_string());
                let nodes = vec![panel::error(&self.data.display_name, &err)];
                self.state = RuntimeState::Error(err);
                nodes
            }
        }
    }
}
