//! Siemens Catapult HLS backend. Reuses the Xilinx layer bodies; the
//! ac_types precisions come from the model, not the templates.

use super::{Backend, Dialect};
use crate::error::Result;

pub fn catapult() -> Result<Backend> {
    Backend::with_families("Catapult", Dialect::Vivado)
}
