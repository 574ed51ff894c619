//! N-API surface for the admin shell. JSON in, JSON or HTML out.

use napi_derive::napi;
use std::collections::HashMap;
use std::sync::Arc;

use crate::allowlist::AllowList;
use crate::block::{BlockRecord, CustomComponentData};
use crate::check::check_source;
use crate::config::RuntimeConfig;
use crate::imports::classify_imports;
use crate::registry::ComponentRegistry;
use crate::render::PageRenderer;
use crate::runtime::ComponentPipeline;
use crate::transform::transform_source;

fn to_napi<T: serde::Serialize>(value: T) -> napi::Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| napi::Error::from_reason(e.to_string()))
}

fn config_from(config_json: Option<String>) -> napi::Result<RuntimeConfig> {
    match config_json {
        Some(json) => RuntimeConfig::from_json(&json).map_err(|e| napi::Error::from_reason(e.to_string())),
        None => Ok(RuntimeConfig::from_env()),
    }
}

#[napi]
pub fn classify_imports_native(source: String) -> napi::Result<serde_json::Value> {
    to_napi(classify_imports(&source, &AllowList::builtin()))
}

#[napi]
pub fn transform_source_native(source: String) -> napi::Result<serde_json::Value> {
    to_napi(transform_source(&source))
}

#[napi]
pub fn check_source_native(source: String, config_json: Option<String>) -> napi::Result<serde_json::Value> {
    let config = config_from(config_json)?;
    to_napi(check_source(&source, &AllowList::builtin(), config.limits))
}

/// Renders a page. `components_json` maps component names to custom
/// component data; static components live in the host and are not visible here.
#[napi]
pub fn render_blocks_native(
    records_json: String,
    components_json: String,
    config_json: Option<String>,
) -> napi::Result<String> {
    let records: Vec<BlockRecord> =
        serde_json::from_str(&records_json).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let components: HashMap<String, CustomComponentData> = serde_json::from_str(&components_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let config = config_from(config_json)?;

    let mut registry = ComponentRegistry::new();
    for (name, data) in components {
        registry.register_custom(name, true, data);
    }
    let pipeline = ComponentPipeline::new(Arc::new(AllowList::builtin()), config);
    Ok(PageRenderer::new(registry, pipeline).render_html(&records))
}
