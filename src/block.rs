//! Persisted records consumed by the renderer.

use serde::{Deserialize, Serialize};

pub type Props = serde_json::Map<String, serde_json::Value>;

fn default_visible() -> bool {
    true
}

/// One content unit on a page. Read-only to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub id: String,
    pub component_name: String,
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub parent_block_id: Option<String>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

impl BlockRecord {
    pub fn new(id: impl Into<String>, component_name: impl Into<String>) -> Self {
        BlockRecord {
            id: id.into(),
            component_name: component_name.into(),
            props: Props::new(),
            sort_order: 0,
            parent_block_id: None,
            is_visible: true,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_block_id = Some(parent.into());
        self
    }

    pub fn with_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Props from a JSON object; other JSON values leave props empty.
    pub fn with_props(mut self, props: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = props {
            self.props = map;
        }
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }
}

/// Source for a runtime-compiled component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomComponentData {
    pub code: String,
    pub display_name: String,
    #[serde(default)]
    pub default_props: Props,
}

impl CustomComponentData {
    pub fn new(display_name: impl Into<String>, code: impl Into<String>) -> Self {
        CustomComponentData {
            code: code.into(),
            display_name: display_name.into(),
            default_props: Props::new(),
        }
    }

    pub fn with_default_props(mut self, props: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = props {
            self.default_props = map;
        }
        self
    }

    /// Caller props over defaults; the caller wins on conflicts.
    pub fn merge_props(&self, props: &Props) -> Props {
        let mut merged = self.default_props.clone();
        for (key, value) in props {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_record_camel_case() {
        let record: BlockRecord = serde_json::from_value(json!({
            "id": "b1",
            "componentName": "Hero",
            "props": { "title": "Welcome" },
            "sortOrder": 2,
            "parentBlockId": null
        }))
        .unwrap();
        assert_eq!(record.component_name, "Hero");
        assert_eq!(record.sort_order, 2);
        assert!(record.is_visible);
        assert_eq!(record.props["title"], json!("Welcome"));
    }

    #[test]
    fn test_caller_props_win() {
        let data = CustomComponentData::new("Banner", "")
            .with_default_props(json!({ "title": "Default", "tone": "info" }));
        let mut props = Props::new();
        props.insert("title".into(), json!("Override"));
        let merged = data.merge_props(&props);
        assert_eq!(merged["title"], json!("Override"));
        assert_eq!(merged["tone"], json!("info"));
    }
}
