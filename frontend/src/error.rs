use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid ui config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of the browser-backed presentation tree.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("no browser window available")]
    NoWindow,
    #[error("node {0:?} is not a live element")]
    UnknownNode(NodeId),
    #[error("{0} failed: {1}")]
    Js(&'static str, String),
}

impl DomError {
    pub(crate) fn js(call: &'static str, value: wasm_bindgen::JsValue) -> Self {
        DomError::Js(call, format!("{:?}", value))
    }
}
