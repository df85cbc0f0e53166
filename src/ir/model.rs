//! Model descriptions: the finalized layer list handed over by the
//! upstream passes, serialized as JSON.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::{IoType, Node};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read model '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("layers '{first}' and '{second}' share index {index}")]
    DuplicateIndex {
        index: u32,
        first: String,
        second: String,
    },
}

/// A finalized model: global settings plus its layers in graph order.
#[derive(Clone, Debug, Deserialize)]
pub struct Model {
    pub name: String,
    /// Preferred backend; command-line selection takes precedence.
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub io_type: IoType,
    pub layers: Vec<Node>,
}

impl Model {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse a model and stamp its I/O style onto every layer.
    pub fn from_json(content: &str) -> Result<Self, LoadError> {
        let mut model: Model = serde_json::from_str(content)?;

        let mut seen: BTreeMap<u32, &str> = BTreeMap::new();
        for layer in &model.layers {
            if let Some(first) = seen.insert(layer.index, &layer.name) {
                return Err(LoadError::DuplicateIndex {
                    index: layer.index,
                    first: first.to_string(),
                    second: layer.name.clone(),
                });
            }
        }

        let io_type = model.io_type;
        for layer in &mut model.layers {
            layer.io_type = io_type;
        }
        Ok(model)
    }

    pub fn layer(&self, name: &str) -> Option<&Node> {
        self.layers.iter().find(|l| l.name == name)
    }
}
