//! Error taxonomy for the component pipeline and the block renderer.
//!
//! Every variant is local to one block: nothing here is allowed to escape
//! the block boundary that produced it.

use thiserror::Error;

pub const COMPONENT_NOT_FOUND_MESSAGE: &str = "No component found. Declare a top-level component whose name starts with an uppercase letter, e.g. `function MyComponent() { ... }`.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// The source imports modules outside the allow-list.
    #[error("Unsupported dependencies: {}", .paths.join(", "))]
    UnsupportedDependency { paths: Vec<String> },

    #[error("{}", COMPONENT_NOT_FOUND_MESSAGE)]
    ComponentNotFound,

    #[error("{0}")]
    Transform(String),

    #[error("{0}")]
    Construction(String),

    #[error("{0}")]
    Render(String),
}

impl ComponentError {
    /// Stable kind label used in panels and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ComponentError::UnsupportedDependency { .. } => "unsupported-dependency",
            ComponentError::ComponentNotFound => "component-not-found",
            ComponentError::Transform(_) => "transform",
            ComponentError::Construction(_) => "construction",
            ComponentError::Render(_) => "render",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("Component \"{name}\" is not registered")]
    RegistryMiss { name: String },

    #[error("Block {block_id} ({component}) failed to render: {message}")]
    Render {
        block_id: String,
        component: String,
        message: String,
    },

    #[error("Block {block_id}: {source}")]
    Component {
        block_id: String,
        #[source]
        source: ComponentError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_plain_strings() {
        let err = ComponentError::UnsupportedDependency {
            paths: vec!["chart.js".into(), "axios".into()],
        };
        assert_eq!(err.to_string(), "Unsupported dependencies: chart.js, axios");
        assert_eq!(err.kind(), "unsupported-dependency");
        assert_eq!(
            ComponentError::Transform("Unexpected token".into()).to_string(),
            "Unexpected token"
        );
    }

    #[test]
    fn test_block_errors_carry_context() {
        let err = BlockError::RegistryMiss {
            name: "Carousel".into(),
        };
        assert_eq!(err.to_string(), "Component \"Carousel\" is not registered");
    }
}
