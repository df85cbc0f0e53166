//! Backend registry: name → backend, populated once at startup.
//!
//! Registration happens on a single initialization path before any
//! lookup. Afterwards the registry is only read, and `&BackendRegistry` can
//! be shared freely across threads.

use tracing::debug;

use super::{catapult, oneapi, quartus, vivado, Backend};
use crate::error::{CodegenError, Result};

/// Builds a backend, validating all of its template sets.
pub type BackendFactory = fn() -> Result<Backend>;

/// Built-in backends in registration order.
const BUILTIN: [(&str, BackendFactory); 6] = [
    ("Vivado", vivado::vivado),
    ("VivadoAccelerator", vivado::vivado_accelerator),
    ("Vitis", vivado::vitis),
    ("Quartus", quartus::quartus),
    ("Catapult", catapult::catapult),
    ("oneAPI", oneapi::oneapi),
];

#[derive(Debug)]
struct Entry {
    name: String,
    factory: BackendFactory,
    backend: Backend,
}

#[derive(Debug, Default)]
pub struct BackendRegistry {
    entries: Vec<Entry>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in backend.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        for (name, factory) in BUILTIN {
            registry.register(name, factory)?;
        }
        Ok(registry)
    }

    /// Build a backend with `factory` and record it under `name`.
    ///
    /// Names are compared case-insensitively. Registering a known name
    /// again with the same factory does nothing; with a different factory
    /// it fails instead of shadowing the first.
    pub fn register(&mut self, name: &str, factory: BackendFactory) -> Result<()> {
        if let Some(i) = self.position(name) {
            if self.entries[i].factory as usize == factory as usize {
                debug!(backend = name, "already registered");
                return Ok(());
            }
            return Err(CodegenError::DuplicateBackend(name.to_string()));
        }
        let backend = factory()?;
        debug!(backend = name, dialect = %backend.dialect(), "registered");
        self.entries.push(Entry {
            name: name.to_string(),
            factory,
            backend,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Backend> {
        match self.position(name) {
            Some(i) => Ok(&self.entries[i].backend),
            None => Err(CodegenError::BackendNotFound {
                name: name.to_string(),
                known: self.list_available().into_iter().map(String::from).collect(),
            }),
        }
    }

    /// Registered names in registration order.
    pub fn list_available(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
    }
}
