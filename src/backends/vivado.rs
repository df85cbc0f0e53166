//! Xilinx backends. Vivado, VivadoAccelerator and Vitis share one dialect
//! and differ only in the project tooling around the generated layers.

use super::{Backend, Dialect};
use crate::error::Result;

pub fn vivado() -> Result<Backend> {
    Backend::with_families("Vivado", Dialect::Vivado)
}

/// Vivado layers wrapped for accelerator boards.
pub fn vivado_accelerator() -> Result<Backend> {
    Backend::with_families("VivadoAccelerator", Dialect::Vivado)
}

pub fn vitis() -> Result<Backend> {
    Backend::with_families("Vitis", Dialect::Vivado)
}
