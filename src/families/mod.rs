//! Layer-family template sets.
//!
//! Each family declares its kinds and attribute vocabulary, its
//! derivations, and one table of bodies per dialect. `templates` builds
//! the roles a dialect emits for the family.

pub mod activation;
pub mod dense;
pub mod pooling;

use crate::backends::Dialect;
use crate::error::{CodegenError, Result};
use crate::ir::Node;
use crate::template::{DeriveCtx, Derivation, LayerTemplate, Params};

/// All family template sets a dialect emits, for one backend.
pub(crate) fn templates(backend: &str, dialect: Dialect) -> Result<Vec<LayerTemplate>> {
    let mut out = pooling::templates(backend, dialect)?;
    out.extend(dense::templates(backend, dialect)?);
    out.extend(activation::templates(backend, dialect)?);
    Ok(out)
}

// ─── Data Layout ──────────────────────────────────────────────────

const CHANNELS_FIRST: &str = "channels_first";

fn is_channels_first(node: &Node) -> bool {
    node.attr_str("data_format") == Some(CHANNELS_FIRST)
}

fn channels_last_only(ctx: &DeriveCtx<'_>, node: &Node, params: &mut Params) -> Result<()> {
    if is_channels_first(node) {
        return Err(CodegenError::UnsupportedLayout {
            layout: CHANNELS_FIRST.to_string(),
            backend: ctx.backend.to_string(),
            layer: node.name.clone(),
        });
    }
    params.insert("data_format", "cl");
    Ok(())
}

fn channel_format(_ctx: &DeriveCtx<'_>, node: &Node, params: &mut Params) -> Result<()> {
    let tag = if is_channels_first(node) { "cf" } else { "cl" };
    params.insert("data_format", tag);
    Ok(())
}

/// Rejects channel-first layers and rewrites the layout to `cl`. Shared
/// by every call and task-sequence role of the Intel dialects.
pub(crate) const CHANNELS_LAST_ONLY: Derivation = Derivation {
    provides: &["data_format"],
    apply: channels_last_only,
};

/// Maps the layout onto the `cf` / `cl` kernel suffix.
pub(crate) const CHANNEL_FORMAT: Derivation = Derivation {
    provides: &["data_format"],
    apply: channel_format,
};

/// The layout derivation a dialect applies to data-shape dependent roles.
pub(crate) fn layout_derivation(dialect: Dialect) -> Derivation {
    match dialect {
        Dialect::Vivado => CHANNEL_FORMAT,
        Dialect::Quartus | Dialect::OneApi => CHANNELS_LAST_ONLY,
    }
}

// ─── Attribute Helpers ────────────────────────────────────────────

/// Integer attribute, `None` when absent, an error when not an integer.
pub(crate) fn int_attr(node: &Node, name: &str) -> Result<Option<i64>> {
    match node.attr(name) {
        None => Ok(None),
        Some(value) => value.as_int().map(Some).ok_or_else(|| CodegenError::InvalidAttribute {
            layer: node.name.clone(),
            attr: name.to_string(),
            reason: format!("must be an integer, got '{}'", value.render()),
        }),
    }
}

/// Lower-cased string attribute with a fallback.
pub(crate) fn lowercase_attr(node: &Node, name: &str, default: &str) -> String {
    node.attr(name)
        .map(|v| v.render().to_lowercase())
        .unwrap_or_else(|| default.to_string())
}
