//! Rendered output tree.
//!
//! Components render into `VNode`s. The admin shell consumes them as JSON,
//! the public surface as HTML via `render_to_html`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VNode {
    Element {
        tag: String,
        #[serde(default)]
        attributes: Vec<Attribute>,
        #[serde(default)]
        children: Vec<VNode>,
    },
    Text {
        content: String,
    },
    Comment {
        content: String,
    },
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        VNode::Comment {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element { attributes, .. } = &mut self {
            attributes.push(Attribute {
                name: name.into(),
                value: value.into(),
            });
        }
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, nodes: impl IntoIterator<Item = VNode>) -> Self {
        if let VNode::Element { children, .. } = &mut self {
            children.extend(nodes);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            VNode::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text { content } => content.clone(),
            VNode::Comment { .. } => String::new(),
            VNode::Element { children, .. } => children.iter().map(VNode::text_content).collect(),
        }
    }

    /// Depth-first search for the first element carrying `name="value"`.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<&VNode> {
        if self.attr(name) == Some(value) {
            return Some(self);
        }
        self.children()
            .iter()
            .find_map(|child| child.find_by_attr(name, value))
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            VNode::Text { content } => escape_text(content, out),
            VNode::Comment { content } => {
                out.push_str("<!--");
                out.push_str(&content.replace("--", "- -"));
                out.push_str("-->");
            }
            VNode::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if !attr.value.is_empty() {
                        out.push_str("=\"");
                        escape_attr(&attr.value, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// Serialises a node list as HTML.
pub fn render_to_html(nodes: &[VNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_html(&mut out);
    }
    out
}

/// Concatenated text of a node list.
pub fn text_content(nodes: &[VNode]) -> String {
    nodes.iter().map(VNode::text_content).collect()
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escaping() {
        let node = VNode::element("a")
            .with_attr("title", "\"quoted\" & <b>")
            .with_child(VNode::text("1 < 2 & 3"));
        assert_eq!(
            node.to_html(),
            r#"<a title="&quot;quoted&quot; &amp; &lt;b&gt;">1 &lt; 2 &amp; 3</a>"#
        );
    }

    #[test]
    fn test_void_elements_and_boolean_attributes() {
        let node = VNode::element("input").with_attr("disabled", "");
        assert_eq!(node.to_html(), "<input disabled>");
    }

    #[test]
    fn test_comments_cannot_terminate_early() {
        assert_eq!(VNode::comment("a -- b").to_html(), "<!--a - - b-->");
    }

    #[test]
    fn test_json_shape() {
        let node = VNode::element("p").with_child(VNode::text("hi"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "element",
                "tag": "p",
                "attributes": [],
                "children": [{ "type": "text", "content": "hi" }]
            })
        );
    }

    #[test]
    fn test_find_by_attr() {
        let tree = VNode::element("div").with_child(
            VNode::element("button")
                .with_attr("data-action", "retry")
                .with_child(VNode::text("Retry")),
        );
        let button = tree.find_by_attr("data-action", "retry").unwrap();
        assert_eq!(button.text_content(), "Retry");
    }
}
