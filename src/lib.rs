pub mod backends;
pub mod diagnostic;
pub mod emit;
pub mod error;
pub mod families;
pub mod ir;
pub mod logging;
pub mod template;

// Re-exports: the surface used by the CLI and integration tests
pub use backends::{Backend, BackendFactory, BackendRegistry, Dialect};
pub use emit::{emit_layer, emit_model, EmittedProject, FailurePolicy, LayerSource};
pub use error::{CodegenError, ErrorKind, Result};
pub use ir::{AttrValue, IoType, LayerKind, LoadError, Model, Node, PrecisionType, Variable};
pub use template::{LayerTemplate, Params, Role, Template};
