//! Static component registry.
//!
//! Maps block component names to implementations. Entries are either
//! compiled into the host (`StaticComponent`) or custom source compiled at
//! runtime. The renderer only reads the registry.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::block::{CustomComponentData, Props};
use crate::vnode::VNode;

pub type StaticRenderError = Box<dyn Error + Send + Sync>;

/// A component implemented in the host.
pub trait StaticComponent: Send + Sync {
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<Vec<VNode>, StaticRenderError>;
}

impl<F> StaticComponent for F
where
    F: Fn(&Props, Vec<VNode>) -> Result<Vec<VNode>, StaticRenderError> + Send + Sync,
{
    fn render(&self, props: &Props, children: Vec<VNode>) -> Result<Vec<VNode>, StaticRenderError> {
        self(props, children)
    }
}

#[derive(Clone)]
pub enum ComponentImpl {
    Static(Arc<dyn StaticComponent>),
    Custom(CustomComponentData),
}

impl fmt::Debug for ComponentImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentImpl::Static(_) => f.write_str("Static(..)"),
            ComponentImpl::Custom(data) => f.debug_tuple("Custom").field(&data.display_name).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub supports_children: bool,
    pub implementation: ComponentImpl,
}

#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_static(
        &mut self,
        name: impl Into<String>,
        supports_children: bool,
        component: impl StaticComponent + 'static,
    ) -> &mut Self {
        self.entries.insert(
            name.into(),
            RegistryEntry {
                supports_children,
                implementation: ComponentImpl::Static(Arc::new(component)),
            },
        );
        self
    }

    pub fn register_custom(
        &mut self,
        name: impl Into<String>,
        supports_children: bool,
        data: CustomComponentData,
    ) -> &mut Self {
        self.entries.insert(
            name.into(),
            RegistryEntry {
                supports_children,
                implementation: ComponentImpl::Custom(data),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closures_register_as_static_components() {
        let mut registry = ComponentRegistry::new();
        registry.register_static("Divider", false, |_: &Props, _: Vec<VNode>| -> Result<Vec<VNode>, StaticRenderError> {
            Ok(vec![VNode::element("hr")])
        });
        let entry = registry.get("Divider").unwrap();
        assert!(!entry.supports_children);
        let ComponentImpl::Static(component) = &entry.implementation else {
            panic!("expected a static component");
        };
        assert_eq!(component.render(&Props::new(), Vec::new()).unwrap()[0].to_html(), "<hr>");
    }

    #[test]
    fn test_custom_entries_keep_their_data() {
        let mut registry = ComponentRegistry::new();
        registry.register_custom("Banner", true, CustomComponentData::new("Banner", "function Banner() {}"));
        assert!(registry.contains("Banner"));
        assert!(matches!(
            &registry.get("Banner").unwrap().implementation,
            ComponentImpl::Custom(data) if data.display_name == "Banner"
        ));
    }
}
