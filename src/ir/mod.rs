//! Layer-level intermediate representation consumed by the template layer.
//!
//! Nodes arrive fully annotated by upstream passes (precision inference,
//! fusion, resource allocation). Nothing in this crate mutates a node after
//! it has been built; templates only read attributes and typed references.

pub mod model;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

pub use model::{LoadError, Model};

// ─── Layer Kinds ──────────────────────────────────────────────────

/// Closed set of layer kinds a backend may know how to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum LayerKind {
    Input,
    Dense,
    Activation,
    Softmax,
    Pooling1D,
    Pooling2D,
    GlobalPooling1D,
    GlobalPooling2D,
}

impl LayerKind {
    pub const ALL: [LayerKind; 8] = [
        LayerKind::Input,
        LayerKind::Dense,
        LayerKind::Activation,
        LayerKind::Softmax,
        LayerKind::Pooling1D,
        LayerKind::Pooling2D,
        LayerKind::GlobalPooling1D,
        LayerKind::GlobalPooling2D,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Input => "Input",
            LayerKind::Dense => "Dense",
            LayerKind::Activation => "Activation",
            LayerKind::Softmax => "Softmax",
            LayerKind::Pooling1D => "Pooling1D",
            LayerKind::Pooling2D => "Pooling2D",
            LayerKind::GlobalPooling1D => "GlobalPooling1D",
            LayerKind::GlobalPooling2D => "GlobalPooling2D",
        }
    }

    /// Input layers describe the top-level ports and produce no code.
    pub fn emits_code(self) -> bool {
        self != LayerKind::Input
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown layer kind '{}'", s))
    }
}

// ─── Attributes ───────────────────────────────────────────────────

/// A scalar node attribute as written by the optimization passes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl AttrValue {
    /// Text substituted into template bodies.
    pub fn render(&self) -> String {
        match self {
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Int(i) => i.to_string(),
            AttrValue::Float(x) => x.to_string(),
            AttrValue::Str(s) => s.clone(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        AttrValue::Int(i64::from(v))
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(i64::from(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

/// Opaque numeric precision reference. Only its renderings are used here.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PrecisionType {
    /// Type alias name emitted in generated code (e.g. `accum_default_t`).
    pub name: String,
    /// Target-language definition (e.g. `ac_fixed<16,6,true>`).
    #[serde(default)]
    pub precision: String,
}

impl PrecisionType {
    pub fn new(name: impl Into<String>, precision: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            precision: precision.into(),
        }
    }
}

/// A tensor flowing between layers, or a weight array.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Name of the element type in generated code.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Explicit pipe identifier for dataflow targets.
    #[serde(default)]
    pub pipe: Option<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            pipe: None,
        }
    }

    pub fn pipe_name(&self) -> String {
        match &self.pipe {
            Some(pipe) => pipe.clone(),
            None => format!("{}_pipe", self.name),
        }
    }
}

/// I/O style of the generated project.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoType {
    #[default]
    IoParallel,
    IoStream,
}

impl IoType {
    pub fn as_str(self) -> &'static str {
        match self {
            IoType::IoParallel => "io_parallel",
            IoType::IoStream => "io_stream",
        }
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Nodes ────────────────────────────────────────────────────────

/// One layer instance of the graph being compiled.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: LayerKind,
    /// Unique position of the layer within the generated project.
    pub index: u32,
    /// Stamped from the model at load time.
    #[serde(skip)]
    pub io_type: IoType,
    #[serde(default)]
    pub input: Option<Variable>,
    #[serde(default)]
    pub output: Option<Variable>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
    #[serde(default)]
    pub types: BTreeMap<String, PrecisionType>,
    #[serde(default)]
    pub weights: BTreeMap<String, Variable>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: LayerKind, index: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            index,
            io_type: IoType::default(),
            input: None,
            output: None,
            attributes: BTreeMap::new(),
            types: BTreeMap::new(),
            weights: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn with_type(mut self, name: &str, ty: PrecisionType) -> Self {
        self.types.insert(name.to_string(), ty);
        self
    }

    pub fn with_input(mut self, var: Variable) -> Self {
        self.input = Some(var);
        self
    }

    pub fn with_output(mut self, var: Variable) -> Self {
        self.output = Some(var);
        self
    }

    pub fn with_weight(mut self, name: &str, var: Variable) -> Self {
        self.weights.insert(name.to_string(), var);
        self
    }

    pub fn with_io_type(mut self, io_type: IoType) -> Self {
        self.io_type = io_type;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(AttrValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in LayerKind::ALL {
            assert_eq!(kind.as_str().parse::<LayerKind>(), Ok(kind));
        }
        assert!("Conv2D".parse::<LayerKind>().is_err());
    }

    #[test]
    fn test_only_input_is_silent() {
        assert!(!LayerKind::Input.emits_code());
        assert!(LayerKind::Pooling2D.emits_code());
    }

    #[test]
    fn test_attr_rendering() {
        assert_eq!(AttrValue::from(false).render(), "false");
        assert_eq!(AttrValue::from(16u32).render(), "16");
        assert_eq!(AttrValue::from(0.5).render(), "0.5");
        assert_eq!(AttrValue::from("Max").render(), "Max");
    }

    #[test]
    fn test_pipe_name_defaults_to_variable_name() {
        let var = Variable::new("layer3_out", "result_t");
        assert_eq!(var.pipe_name(), "layer3_out_pipe");
        let var = Variable {
            pipe: Some("custom".to_string()),
            ..var
        };
        assert_eq!(var.pipe_name(), "custom");
    }

    #[test]
    fn test_builder_collects_attributes() {
        let node = Node::new("pool1", LayerKind::Pooling1D, 2)
            .with_attr("n_in", 8)
            .with_attr("pool_op", "Average")
            .with_type("accum_t", PrecisionType::new("accum2_t", "ac_fixed<16,6>"));
        assert_eq!(node.attr("n_in").and_then(AttrValue::as_int), Some(8));
        assert_eq!(node.attr_str("pool_op"), Some("Average"));
        assert_eq!(node.types["accum_t"].name, "accum2_t");
        assert_eq!(node.io_type, IoType::IoParallel);
    }
}
