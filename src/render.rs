//! Block Tree Renderer
//!
//! Renders a page from its flat block records. Every node is its own error
//! boundary: a registry miss, a failing static component or a broken custom
//! component produces local output and an entry in `last_errors`, and the
//! rest of the page renders normally.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::allowlist::AllowList;
use crate::block::{BlockRecord, CustomComponentData};
use crate::config::RuntimeConfig;
use crate::error::{BlockError, ComponentError};
use crate::panel;
use crate::registry::{ComponentImpl, ComponentRegistry, StaticComponent};
use crate::runtime::{ComponentPipeline, ComponentRuntime, RuntimeState};
use crate::tree::{build_block_tree, flatten_tree, BlockTree};
use crate::vnode::{render_to_html, VNode};

pub struct PageRenderer {
    registry: ComponentRegistry,
    pipeline: ComponentPipeline,
    /// Custom component runtimes by block id, kept across renders.
    runtimes: HashMap<String, ComponentRuntime>,
    errors: Vec<BlockError>,
}

impl PageRenderer {
    pub fn new(registry: ComponentRegistry, pipeline: ComponentPipeline) -> Self {
        PageRenderer {
            registry,
            pipeline,
            runtimes: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Errors collected by the most recent render.
    pub fn last_errors(&self) -> &[BlockError] {
        &self.errors
    }

    pub fn runtime(&self, block_id: &str) -> Option<&ComponentRuntime> {
        self.runtimes.get(block_id)
    }

    /// For user-initiated actions such as retry.
    pub fn runtime_mut(&mut self, block_id: &str) -> Option<&mut ComponentRuntime> {
        self.runtimes.get_mut(block_id)
    }

    #[instrument(level = "debug", skip_all, fields(blocks = records.len()))]
    pub fn render_page(&mut self, records: &[BlockRecord]) -> Vec<VNode> {
        self.errors.clear();
        let tree = build_block_tree(records);

        let live: HashSet<&str> = flatten_tree(&tree).iter().map(|r| r.id.as_str()).collect();
        self.runtimes.retain(|id, _| live.contains(id.as_str()));

        let mut out = Vec::new();
        for node in &tree {
            out.extend(self.render_node(node));
        }
        debug!(errors = self.errors.len(), "page rendered");
        out
    }

    pub fn render_html(&mut self, records: &[BlockRecord]) -> String {
        render_to_html(&self.render_page(records))
    }

    fn render_node(&mut self, node: &BlockTree) -> Vec<VNode> {
        let record = &node.record;
        let Some(entry) = self.registry.get(&record.component_name).cloned() else {
            warn!(block = %record.id, component = %record.component_name, "component is not registered");
            self.errors.push(BlockError::RegistryMiss {
                name: record.component_name.clone(),
            });
            if self.pipeline.config().is_production() {
                return Vec::new();
            }
            return vec![panel::registry_miss(&record.id, &record.component_name)];
        };

        let children = if entry.supports_children && !node.children.is_empty() {
            let mut rendered = Vec::new();
            for child in &node.children {
                rendered.extend(self.render_node(child));
            }
            Some(rendered)
        } else {
            None
        };

        match entry.implementation {
            ComponentImpl::Static(component) => self.render_static(record, component.as_ref(), children),
            ComponentImpl::Custom(data) => self.render_custom(record, data, children),
        }
    }

    fn render_static(
        &mut self,
        record: &BlockRecord,
        component: &dyn StaticComponent,
        children: Option<Vec<VNode>>,
    ) -> Vec<VNode> {
        let result = catch_unwind(AssertUnwindSafe(|| {
            component.render(&record.props, children.unwrap_or_default())
        }));
        let message = match result {
            Ok(Ok(nodes)) => return nodes,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        self.block_failure(record, message)
    }

    fn block_failure(&mut self, record: &BlockRecord, message: String) -> Vec<VNode> {
        error!(block = %record.id, component = %record.component_name, "block failed to render: {}", message);
        let node = panel::block_failure(&record.id, &record.component_name, &message);
        self.errors.push(BlockError::Render {
            block_id: record.id.clone(),
            component: record.component_name.clone(),
            message,
        });
        vec![node]
    }

    fn render_custom(
        &mut self,
        record: &BlockRecord,
        data: CustomComponentData,
        children: Option<Vec<VNode>>,
    ) -> Vec<VNode> {
        let pipeline = &self.pipeline;
        let runtime = self
            .runtimes
            .entry(record.id.clone())
            .or_insert_with(|| ComponentRuntime::new(pipeline.clone(), data.clone()));
        if runtime.data() != &data {
            debug!(block = %record.id, "custom component source changed");
            runtime.set_source(data);
        }

        let rendered = catch_unwind(AssertUnwindSafe(|| {
            runtime.render_with_children(&record.props, children)
        }));
        let nodes = match rendered {
            Ok(nodes) => nodes,
            Err(payload) => {
                // The runtime may be mid-compile; start over on the next render.
                self.runtimes.remove(&record.id);
                return self.block_failure(record, panic_message(payload.as_ref()));
            }
        };

        let failure = match runtime.state() {
            RuntimeState::Error(err) => Some(err.clone()),
            RuntimeState::UnsupportedDependency(paths) => Some(ComponentError::UnsupportedDependency {
                paths: paths.clone(),
            }),
            _ => None,
        };
        if let Some(source) = failure {
            self.errors.push(BlockError::Component {
                block_id: record.id.clone(),
                source,
            });
        }
        nodes
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "component panicked".to_string())
}

/// Builds a renderer over the built-in allow-list.
pub fn page_renderer(registry: ComponentRegistry, config: RuntimeConfig) -> PageRenderer {
    let pipeline = ComponentPipeline::new(Arc::new(AllowList::builtin()), config);
    PageRenderer::new(registry, pipeline)
}
