//! Backends: named bundles of layer-family template sets.
//!
//! A backend indexes its templates by (role, kind) when it is built, so a
//! lookup never scans and two templates can never silently compete for
//! the same node.

pub mod catapult;
pub mod oneapi;
pub mod quartus;
pub mod registry;
pub mod vivado;

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::{CodegenError, Result};
use crate::ir::{IoType, LayerKind, Node};
use crate::template::{Role, Template};

pub use registry::{BackendFactory, BackendRegistry};

/// Family of template bodies and derivation rules a backend uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// Xilinx flavour: `static const` configs, either channel layout.
    Vivado,
    /// Intel HLS: call-style, channel-last only.
    Quartus,
    /// Intel oneAPI: adds task-sequence dataflow, channel-last only.
    OneApi,
}

impl Dialect {
    /// Whether the dialect can register dataflow stages.
    pub fn has_dataflow(self) -> bool {
        self == Dialect::OneApi
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Vivado => "vivado",
            Dialect::Quartus => "quartus",
            Dialect::OneApi => "oneapi",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Backend ──────────────────────────────────────────────────────

pub struct Backend {
    name: String,
    dialect: Dialect,
    templates: Vec<Box<dyn Template>>,
    index: BTreeMap<(Role, LayerKind), usize>,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("dialect", &self.dialect)
            .field("templates", &self.templates.len())
            .finish()
    }
}

impl Backend {
    pub fn builder(name: &str, dialect: Dialect) -> BackendBuilder {
        BackendBuilder {
            name: name.to_string(),
            dialect,
            templates: Vec::new(),
        }
    }

    /// A backend with every built-in family template set of `dialect`.
    pub fn with_families(name: &str, dialect: Dialect) -> Result<Self> {
        let mut builder = Self::builder(name, dialect);
        for template in crate::families::templates(name, dialect)? {
            builder = builder.template(template);
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The template emitting `role` for `kind`.
    pub fn template(&self, role: Role, kind: LayerKind) -> Result<&dyn Template> {
        match self.index.get(&(role, kind)) {
            Some(&i) => Ok(self.templates[i].as_ref()),
            None => Err(CodegenError::UnknownKind {
                kind,
                template: format!("{}:{}", self.name, role),
            }),
        }
    }

    pub fn supports(&self, role: Role, kind: LayerKind) -> bool {
        self.index.contains_key(&(role, kind))
    }

    /// Render `role` for `node`.
    pub fn format(&self, role: Role, node: &Node) -> Result<String> {
        let template = self.template(role, node.kind)?;
        debug!(backend = %self.name, template = template.name(), layer = %node.name, "format");
        template.format(node)
    }

    /// Kinds with a template for `role`, in kind order.
    pub fn kinds(&self, role: Role) -> Vec<LayerKind> {
        self.index
            .keys()
            .filter(|(r, _)| *r == role)
            .map(|&(_, k)| k)
            .collect()
    }

    /// Roles the driver emits per layer for the given I/O style.
    pub fn roles(&self, io_type: IoType) -> &'static [Role] {
        match (self.dialect.has_dataflow(), io_type) {
            (true, IoType::IoStream) => &[Role::Config, Role::TaskSequence, Role::StreamCall],
            _ => &[Role::Config, Role::Call],
        }
    }

    /// Headers required by the invocation templates of `kind`, first-seen order.
    pub fn include_headers(&self, kind: LayerKind) -> Vec<&'static str> {
        let mut headers: Vec<&'static str> = Vec::new();
        for role in [Role::Call, Role::TaskSequence] {
            if let Some(&i) = self.index.get(&(role, kind)) {
                for header in self.templates[i].include_headers() {
                    if !headers.contains(header) {
                        headers.push(*header);
                    }
                }
            }
        }
        headers
    }
}

/// Collects template sets and builds the (role, kind) index.
pub struct BackendBuilder {
    name: String,
    dialect: Dialect,
    templates: Vec<Box<dyn Template>>,
}

impl BackendBuilder {
    pub fn template(mut self, template: impl Template + 'static) -> Self {
        self.templates.push(Box::new(template));
        self
    }

    pub fn build(self) -> Result<Backend> {
        let mut index: BTreeMap<(Role, LayerKind), usize> = BTreeMap::new();
        for (i, template) in self.templates.iter().enumerate() {
            for &kind in template.kinds() {
                if let Some(&prev) = index.get(&(template.role(), kind)) {
                    let first: &dyn Template = self.templates[prev].as_ref();
                    return Err(CodegenError::ConflictingTemplates {
                        backend: self.name,
                        role: template.role(),
                        kind,
                        first: first.name().to_string(),
                        second: template.name().to_string(),
                    });
                }
                index.insert((template.role(), kind), i);
            }
        }
        debug!(backend = %self.name, templates = self.templates.len(), "backend built");
        Ok(Backend {
            name: self.name,
            dialect: self.dialect,
            templates: self.templates,
            index,
        })
    }
}
