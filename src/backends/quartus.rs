//! Intel HLS compiler backend.

use super::{Backend, Dialect};
use crate::error::Result;

pub fn quartus() -> Result<Backend> {
    Backend::with_families("Quartus", Dialect::Quartus)
}
