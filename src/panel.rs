//! Placeholder and error panels shown in place of a block.
//!
//! Class names and `data-*` hooks are stable: the admin shell styles them and
//! binds the retry affordance to `[data-action="retry"]`.

use crate::error::ComponentError;
use crate::vnode::VNode;

const MAX_MESSAGE_CHARS: usize = 600;

fn truncate(message: &str) -> String {
    match message.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((cut, _)) => format!("{}…", &message[..cut]),
        None => message.to_string(),
    }
}

fn panel(modifier: &str, state: &str) -> VNode {
    VNode::element("div")
        .with_attr("class", format!("dynamic-component dynamic-component--{}", modifier))
        .with_attr("data-state", state)
}

fn title(text: String) -> VNode {
    VNode::element("p")
        .with_attr("class", "dynamic-component__title")
        .with_child(VNode::text(text))
}

pub fn loading(display_name: &str) -> VNode {
    panel("loading", "loading")
        .with_attr("aria-busy", "true")
        .with_child(VNode::text(format!("Loading {}…", display_name)))
}

/// Names the first `max_listed` paths and counts the rest.
pub fn unsupported_dependencies(display_name: &str, paths: &[String], max_listed: usize) -> VNode {
    let listed = paths.iter().take(max_listed).map(|path| {
        VNode::element("li").with_child(VNode::element("code").with_child(VNode::text(path.as_str())))
    });
    let mut node = panel("unsupported", "unsupported-dependency")
        .with_attr("role", "note")
        .with_child(title(format!("{} uses unsupported dependencies", display_name)))
        .with_child(VNode::element("ul").with_children(listed));

    let hidden = paths.len().saturating_sub(max_listed);
    if hidden > 0 {
        node = node.with_child(
            VNode::element("p")
                .with_attr("class", "dynamic-component__more")
                .with_child(VNode::text(format!("and {} more", hidden))),
        );
    }
    node
}

pub fn error(display_name: &str, err: &ComponentError) -> VNode {
    panel("error", "error")
        .with_attr("data-error-kind", err.kind())
        .with_attr("role", "alert")
        .with_child(title(format!("{} failed to render", display_name)))
        .with_child(
            VNode::element("pre")
                .with_attr("class", "dynamic-component__message")
                .with_child(VNode::text(truncate(&err.to_string()))),
        )
        .with_child(
            VNode::element("button")
                .with_attr("type", "button")
                .with_attr("data-action", "retry")
                .with_child(VNode::text("Retry")),
        )
}

/// Inert marker for a block whose component is not registered.
pub fn registry_miss(block_id: &str, component_name: &str) -> VNode {
    VNode::element("div")
        .with_attr("class", "block-diagnostic")
        .with_attr("data-block-id", block_id)
        .with_attr("data-missing-component", component_name)
        .with_attr("role", "note")
        .with_child(VNode::text(format!(
            "Component \"{}\" is not registered",
            component_name
        )))
}

/// Error boundary output for a block that failed outside the custom runtime.
pub fn block_failure(block_id: &str, component_name: &str, message: &str) -> VNode {
    VNode::element("div")
        .with_attr("class", "block-error")
        .with_attr("data-block-id", block_id)
        .with_attr("role", "alert")
        .with_child(title(format!("{} failed to render", component_name)))
        .with_child(
            VNode::element("pre")
                .with_attr("class", "dynamic-component__message")
                .with_child(VNode::text(truncate(message))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::text_content;

    #[test]
    fn test_unsupported_list_is_capped() {
        let paths: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let node = unsupported_dependencies("Widget", &paths, 3);
        let html = node.to_html();
        assert!(html.contains("<code>c</code>"));
        assert!(!html.contains("<code>d</code>"));
        assert!(html.contains("and 2 more"));
    }

    #[test]
    fn test_error_panel_truncates_and_offers_retry() {
        let err = ComponentError::Transform("x".repeat(2000));
        let node = error("Widget", &err);
        assert_eq!(node.attr("data-error-kind"), Some("transform"));
        let message = node.find_by_attr("class", "dynamic-component__message").unwrap();
        assert_eq!(message.text_content().chars().count(), MAX_MESSAGE_CHARS + 1);
        assert!(node.find_by_attr("data-action", "retry").is_some());
    }

    #[test]
    fn test_registry_miss_names_component() {
        let node = registry_miss("b7", "Carousel");
        assert_eq!(text_content(&[node]), "Component \"Carousel\" is not registered");
    }
}
