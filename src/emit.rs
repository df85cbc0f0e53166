//! Project emission: format every layer of a model for one backend.
//!
//! Layers are independent, so they are formatted in parallel; results are
//! kept in layer order. Input layers carry no code and are skipped.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::backends::Backend;
use crate::error::{CodegenError, Result};
use crate::ir::{Model, Node};
use crate::template::Role;

/// What to do when a layer fails to format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failing layer.
    #[default]
    Abort,
    /// Keep the layers that format and report the rest.
    Continue,
}

/// Generated text for one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerSource {
    pub layer: String,
    pub index: u32,
    pub config: String,
    /// Call statement or dataflow-stage registration.
    pub invocation: String,
    /// Stage start statement, dataflow only.
    pub stream_call: Option<String>,
    pub includes: Vec<&'static str>,
}

#[derive(Clone, Debug, Default)]
pub struct EmittedProject {
    pub backend: String,
    pub layers: Vec<LayerSource>,
    /// Layers skipped under [`FailurePolicy::Continue`].
    pub failures: Vec<(String, CodegenError)>,
}

impl EmittedProject {
    /// Includes of all layers, de-duplicated in first-seen order.
    pub fn includes(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for header in self.layers.iter().flat_map(|l| l.includes.iter()) {
            if !out.contains(header) {
                out.push(*header);
            }
        }
        out
    }

    /// Include lines, then configs, then invocations in layer order.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for header in self.includes() {
            out.push_str(&format!("#include \"{}\"\n", header));
        }
        if !self.layers.is_empty() {
            out.push('\n');
        }
        for layer in &self.layers {
            out.push_str(&layer.config);
            out.push('\n');
        }
        for layer in &self.layers {
            out.push_str(&layer.invocation);
            out.push('\n');
        }
        for call in self.layers.iter().filter_map(|l| l.stream_call.as_ref()) {
            out.push_str(call);
            out.push('\n');
        }
        out
    }
}

/// Format one layer with the roles `backend` uses for its I/O style.
pub fn emit_layer(backend: &Backend, node: &Node) -> Result<LayerSource> {
    let mut source = LayerSource {
        layer: node.name.clone(),
        index: node.index,
        config: String::new(),
        invocation: String::new(),
        stream_call: None,
        includes: backend.include_headers(node.kind),
    };
    for &role in backend.roles(node.io_type) {
        let text = backend.format(role, node)?;
        match role {
            Role::Config => source.config = text,
            Role::Call | Role::TaskSequence => source.invocation = text,
            Role::StreamCall => source.stream_call = Some(text),
        }
    }
    Ok(source)
}

pub fn emit_model(backend: &Backend, model: &Model, policy: FailurePolicy) -> Result<EmittedProject> {
    let results: Vec<(&Node, Result<LayerSource>)> = model
        .layers
        .par_iter()
        .filter(|node| node.kind.emits_code())
        .map(|node| (node, emit_layer(backend, node)))
        .collect();

    let mut project = EmittedProject {
        backend: backend.name().to_string(),
        ..Default::default()
    };
    for (node, result) in results {
        match result {
            Ok(source) => project.layers.push(source),
            Err(err) if policy == FailurePolicy::Abort => return Err(err),
            Err(err) => {
                warn!(layer = %node.name, error = %err, "skipping layer");
                project.failures.push((node.name.clone(), err));
            }
        }
    }
    debug!(
        backend = backend.name(),
        layers = project.layers.len(),
        failures = project.failures.len(),
        "emitted"
    );
    Ok(project)
}
