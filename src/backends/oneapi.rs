//! Intel oneAPI backend.
//!
//! Parallel I/O uses plain calls. Streaming I/O registers every layer as a
//! `task_sequence` stage wired by pipes and then starts each stage with
//! `async()`, so all four template roles are present.

use super::{Backend, Dialect};
use crate::error::Result;

pub fn oneapi() -> Result<Backend> {
    Backend::with_families("oneAPI", Dialect::OneApi)
}
