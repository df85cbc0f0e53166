//! Template dispatch: kind-keyed bodies filled from node parameters.
//!
//! Every backend attaches, per layer family, up to four template roles.
//! The mechanism lives here once: `LayerTemplate` checks the node's kind,
//! builds the role's default parameters, runs the family's derivations,
//! selects the body for the kind and substitutes it. Families and
//! backends only supply bodies and small derivation functions.
//!
//! Consistency is checked when a template is built, not on first use:
//! every declared kind must have a body, and every placeholder must be
//! something the role, the family vocabulary or a derivation provides.

pub mod body;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::trace;

use crate::error::{CodegenError, Result};
use crate::ir::{LayerKind, Node};

pub use body::TemplateBody;

// ─── Roles ────────────────────────────────────────────────────────

/// What a template emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Configuration struct declaration.
    Config,
    /// Synchronous invocation.
    Call,
    /// Dataflow-stage registration.
    TaskSequence,
    /// Statement starting a registered stage.
    StreamCall,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Config, Role::Call, Role::TaskSequence, Role::StreamCall];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Config => "config",
            Role::Call => "call",
            Role::TaskSequence => "task_sequence",
            Role::StreamCall => "stream_call",
        }
    }

    /// Structural parameter names every template of this role receives.
    pub fn structural_names(self) -> &'static [&'static str] {
        match self {
            Role::Config => &["index", "name", "iotype", "reuse"],
            Role::Call => &[
                "index", "name", "iotype", "reuse", "config", "input_t", "output_t", "input",
                "output",
            ],
            Role::TaskSequence => &[
                "index",
                "name",
                "iotype",
                "reuse",
                "config",
                "input_t",
                "output_t",
                "input_pipe",
                "output_pipe",
            ],
            Role::StreamCall => &["index", "name", "config"],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Parameters ───────────────────────────────────────────────────

/// Placeholder name → rendered value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default parameters for `role`: node attributes, typed attribute
    /// renderings (`<attr>.name`, `<attr>.precision`) and the role's
    /// structural names. Variables the node lacks are simply absent.
    pub fn defaults(role: Role, node: &Node) -> Self {
        let mut params = Self::new();
        for (name, value) in &node.attributes {
            params.insert(name, value.render());
        }
        for (name, ty) in &node.types {
            params.insert(&format!("{}.name", name), ty.name.as_str());
            params.insert(&format!("{}.precision", name), ty.precision.as_str());
        }

        params.insert("index", node.index.to_string());
        params.insert("name", node.name.as_str());
        let config = format!("config{}", node.index);
        match role {
            Role::Config => {
                params.insert("iotype", node.io_type.as_str());
                params.insert("reuse", reuse_factor(node));
            }
            Role::Call | Role::TaskSequence => {
                params.insert("iotype", node.io_type.as_str());
                params.insert("reuse", reuse_factor(node));
                params.insert("config", config);
                if let Some(input) = &node.input {
                    params.insert("input_t", input.type_name.as_str());
                    if role == Role::Call {
                        params.insert("input", input.name.as_str());
                    } else {
                        params.insert("input_pipe", input.pipe_name());
                    }
                }
                if let Some(output) = &node.output {
                    params.insert("output_t", output.type_name.as_str());
                    if role == Role::Call {
                        params.insert("output", output.name.as_str());
                    } else {
                        params.insert("output_pipe", output.pipe_name());
                    }
                }
            }
            Role::StreamCall => {
                params.insert("config", config);
            }
        }
        params
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn reuse_factor(node: &Node) -> String {
    node.attr("reuse_factor")
        .map(|v| v.render())
        .unwrap_or_else(|| "1".to_string())
}

// ─── Families and Derivations ─────────────────────────────────────

/// Vocabulary of one family of layer kinds.
pub struct LayerFamily {
    pub name: &'static str,
    pub kinds: &'static [LayerKind],
    /// Attribute names a node of the kind is expected to carry.
    pub attributes: fn(LayerKind) -> &'static [&'static str],
    /// Typed attribute names (rendered as `<name>.name` / `<name>.precision`).
    pub types: fn(LayerKind) -> &'static [&'static str],
}

impl LayerFamily {
    fn vocabulary(&self, kind: LayerKind) -> BTreeSet<String> {
        let mut names: BTreeSet<String> =
            (self.attributes)(kind).iter().map(|s| s.to_string()).collect();
        for ty in (self.types)(kind) {
            names.insert(format!("{}.name", ty));
            names.insert(format!("{}.precision", ty));
        }
        names
    }
}

/// Context handed to derivations.
pub struct DeriveCtx<'a> {
    pub backend: &'a str,
    pub template: &'a str,
}

/// A family- or backend-specific parameter rewrite.
#[derive(Clone, Copy)]
pub struct Derivation {
    /// Names this derivation may add or override.
    pub provides: &'static [&'static str],
    pub apply: fn(&DeriveCtx<'_>, &Node, &mut Params) -> Result<()>,
}

// ─── Template Contract ────────────────────────────────────────────

/// One role of one layer-family template set.
pub trait Template: Send + Sync {
    /// Identifier used in diagnostics, e.g. `oneAPI:pooling:call`.
    fn name(&self) -> &str;
    fn role(&self) -> Role;
    fn kinds(&self) -> &[LayerKind];

    fn supports(&self, kind: LayerKind) -> bool {
        self.kinds().contains(&kind)
    }

    /// Headers the generated project must include when this template is used.
    fn include_headers(&self) -> &[&'static str] {
        &[]
    }

    fn format(&self, node: &Node) -> Result<String>;
}

/// The generic kind-keyed template.
pub struct LayerTemplate {
    name: String,
    backend: String,
    role: Role,
    kinds: Vec<LayerKind>,
    bodies: BTreeMap<LayerKind, TemplateBody>,
    includes: Vec<&'static str>,
    derivations: Vec<Derivation>,
}

impl fmt::Debug for LayerTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerTemplate")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("kinds", &self.kinds)
            .finish()
    }
}

impl LayerTemplate {
    pub fn builder(backend: &str, family: &'static LayerFamily, role: Role) -> LayerTemplateBuilder {
        LayerTemplateBuilder {
            backend: backend.to_string(),
            family,
            role,
            bodies: Vec::new(),
            shared_body: None,
            includes: Vec::new(),
            derivations: Vec::new(),
        }
    }
}

impl Template for LayerTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        self.role
    }

    fn kinds(&self) -> &[LayerKind] {
        &self.kinds
    }

    fn include_headers(&self) -> &[&'static str] {
        &self.includes
    }

    fn format(&self, node: &Node) -> Result<String> {
        if !self.supports(node.kind) {
            return Err(CodegenError::UnknownKind {
                kind: node.kind,
                template: self.name.clone(),
            });
        }

        let mut params = Params::defaults(self.role, node);
        let ctx = DeriveCtx {
            backend: &self.backend,
            template: &self.name,
        };
        for derivation in &self.derivations {
            (derivation.apply)(&ctx, node, &mut params)?;
        }

        let body = self
            .bodies
            .get(&node.kind)
            .ok_or_else(|| CodegenError::MissingTemplateBody {
                kind: node.kind,
                template: self.name.clone(),
            })?;
        trace!(template = %self.name, layer = %node.name, params = params.len(), "rendering");
        body.render(&params)
            .map_err(|placeholder| CodegenError::MissingParameter {
                placeholder: placeholder.to_string(),
                kind: node.kind,
                template: self.name.clone(),
            })
    }
}

/// Assembles and validates a [`LayerTemplate`].
pub struct LayerTemplateBuilder {
    backend: String,
    family: &'static LayerFamily,
    role: Role,
    bodies: Vec<(LayerKind, &'static str)>,
    shared_body: Option<&'static str>,
    includes: Vec<&'static str>,
    derivations: Vec<Derivation>,
}

impl LayerTemplateBuilder {
    pub fn body(mut self, kind: LayerKind, text: &'static str) -> Self {
        self.bodies.push((kind, text));
        self
    }

    /// One body for every kind of the family without its own entry.
    pub fn shared_body(mut self, text: &'static str) -> Self {
        self.shared_body = Some(text);
        self
    }

    pub fn includes(mut self, headers: &[&'static str]) -> Self {
        self.includes.extend_from_slice(headers);
        self
    }

    pub fn derive(mut self, derivation: Derivation) -> Self {
        self.derivations.push(derivation);
        self
    }

    pub fn build(self) -> Result<LayerTemplate> {
        let name = format!("{}:{}:{}", self.backend, self.family.name, self.role);
        let malformed = |reason: String| CodegenError::MalformedTemplate {
            template: name.clone(),
            reason,
        };

        let mut bodies = BTreeMap::new();
        for (kind, text) in &self.bodies {
            if !self.family.kinds.contains(kind) {
                return Err(malformed(format!(
                    "body given for {} outside family '{}'",
                    kind, self.family.name
                )));
            }
            let body = TemplateBody::parse(text).map_err(&malformed)?;
            if bodies.insert(*kind, body).is_some() {
                return Err(malformed(format!("two bodies given for {}", kind)));
            }
        }
        if let Some(text) = self.shared_body {
            let body = TemplateBody::parse(text).map_err(&malformed)?;
            for kind in self.family.kinds {
                bodies.entry(*kind).or_insert_with(|| body.clone());
            }
        }

        for kind in self.family.kinds {
            let Some(body) = bodies.get(kind) else {
                return Err(CodegenError::MissingTemplateBody {
                    kind: *kind,
                    template: name,
                });
            };
            let mut provided = self.family.vocabulary(*kind);
            provided.extend(self.role.structural_names().iter().map(|s| s.to_string()));
            for d in &self.derivations {
                provided.extend(d.provides.iter().map(|s| s.to_string()));
            }
            if let Some(unbound) = body.placeholders().into_iter().find(|p| !provided.contains(*p)) {
                return Err(CodegenError::UnboundPlaceholder {
                    placeholder: unbound.to_string(),
                    kind: *kind,
                    template: name,
                });
            }
        }

        Ok(LayerTemplate {
            name,
            backend: self.backend,
            role: self.role,
            kinds: self.family.kinds.to_vec(),
            bodies,
            includes: self.includes,
            derivations: self.derivations,
        })
    }
}
