//! Dense family: fully connected layers with weight and bias arrays.

use crate::backends::Dialect;
use crate::error::{CodegenError, Result};
use crate::ir::{LayerKind, Node};
use crate::template::{DeriveCtx, Derivation, LayerFamily, LayerTemplate, Params, Role};

use super::{int_attr, lowercase_attr};

fn attributes(_kind: LayerKind) -> &'static [&'static str] {
    &[
        "n_in",
        "n_out",
        "reuse_factor",
        "strategy",
        "n_zeros",
        "rfpad",
        "bfpad",
        "product_type",
    ]
}

fn types(_kind: LayerKind) -> &'static [&'static str] {
    &["accum_t", "weight_t", "bias_t"]
}

pub static DENSE: LayerFamily = LayerFamily {
    name: "dense",
    kinds: &[LayerKind::Dense],
    attributes,
    types,
};

const CALL_INCLUDES: &[&str] = &["nnet_utils/nnet_dense.h"];
const STREAM_INCLUDES: &[&str] = &["nnet_utils/nnet_dense.h", "nnet_utils/nnet_dense_stream.h"];

// ─── Derivations ──────────────────────────────────────────────────

fn weight_names(_ctx: &DeriveCtx<'_>, node: &Node, params: &mut Params) -> Result<()> {
    if let Some(w) = node.weights.get("weight") {
        params.insert("w", w.name.as_str());
    }
    if let Some(b) = node.weights.get("bias") {
        params.insert("b", b.name.as_str());
    }
    Ok(())
}

const WEIGHT_NAMES: Derivation = Derivation {
    provides: &["w", "b"],
    apply: weight_names,
};

fn sparsity(_ctx: &DeriveCtx<'_>, node: &Node, params: &mut Params) -> Result<()> {
    let nzeros = int_attr(node, "n_zeros")?.unwrap_or(0);
    params.insert("nzeros", nzeros.to_string());

    if let (Some(n_in), Some(n_out)) = (int_attr(node, "n_in")?, int_attr(node, "n_out")?) {
        for (attr, value) in [("n_in", n_in), ("n_out", n_out)] {
            if value < 0 {
                return Err(CodegenError::InvalidAttribute {
                    layer: node.name.clone(),
                    attr: attr.to_string(),
                    reason: format!("is {} but must not be negative", value),
                });
            }
        }
        let total = n_in.checked_mul(n_out).ok_or_else(|| CodegenError::InvalidAttribute {
            layer: node.name.clone(),
            attr: "n_in".to_string(),
            reason: format!("times n_out ({} x {}) overflows the weight count", n_in, n_out),
        })?;
        if nzeros < 0 || nzeros > total {
            return Err(CodegenError::InvalidAttribute {
                layer: node.name.clone(),
                attr: "n_zeros".to_string(),
                reason: format!("is {} but the weight matrix has {} entries", nzeros, total),
            });
        }
        params.insert("nonzeros", (total - nzeros).to_string());
    }
    Ok(())
}

const SPARSITY: Derivation = Derivation {
    provides: &["nzeros", "nonzeros"],
    apply: sparsity,
};

fn strategy(_ctx: &DeriveCtx<'_>, node: &Node, params: &mut Params) -> Result<()> {
    params.insert("strategy", lowercase_attr(node, "strategy", "latency"));
    params.insert("product_type", lowercase_attr(node, "product_type", "mult"));
    for pad in ["rfpad", "bfpad"] {
        params.insert(pad, int_attr(node, pad)?.unwrap_or(0).to_string());
    }
    Ok(())
}

const STRATEGY: Derivation = Derivation {
    provides: &["strategy", "product_type", "rfpad", "bfpad"],
    apply: strategy,
};

// ─── Bodies ───────────────────────────────────────────────────────

const VIVADO_CONFIG: &str = "struct config{index} : nnet::dense_config {{
    static const unsigned n_in = {n_in};
    static const unsigned n_out = {n_out};
    static const unsigned io_type = nnet::{iotype};
    static const unsigned strategy = nnet::{strategy};
    static const unsigned reuse_factor = {reuse};
    static const unsigned n_zeros = {nzeros};
    static const unsigned n_nonzeros = {nonzeros};
    static const unsigned multiplier_limit = DIV_ROUNDUP(n_in * n_out, reuse_factor) - n_zeros / reuse_factor;
    static const bool store_weights_in_bram = false;
    typedef {accum_t.name} accum_t;
    typedef {bias_t.name} bias_t;
    typedef {weight_t.name} weight_t;
    template<class x_T, class y_T>
    using product = nnet::product::{product_type}<x_T, y_T>;
}};\n";

const INTEL_CONFIG: &str = "struct config{index} : nnet::dense_config {{
    static constexpr unsigned n_in = {n_in};
    static constexpr unsigned n_out = {n_out};
    static constexpr unsigned io_type = nnet::{iotype};
    static constexpr unsigned n_zeros = {nzeros};
    static constexpr unsigned n_nonzeros = {nonzeros};
    static constexpr bool store_weights_in_bram = false;

    static constexpr unsigned rf_pad = {rfpad};
    static constexpr unsigned bf_pad = {bfpad};

    static constexpr unsigned reuse_factor = {reuse};
    static constexpr unsigned compressed_block_factor = DIV_ROUNDUP(n_nonzeros, reuse_factor);
    static constexpr unsigned reuse_factor_rounded = reuse_factor + rf_pad;
    static constexpr unsigned block_factor = DIV_ROUNDUP(n_in * n_out, reuse_factor);
    static constexpr unsigned block_factor_rounded = block_factor + bf_pad;
    static constexpr unsigned multiplier_factor = MIN(n_in, reuse_factor);
    static constexpr unsigned multiplier_limit = DIV_ROUNDUP(n_in * n_out, multiplier_factor);
    static constexpr unsigned multiplier_scale = multiplier_limit / n_out;

    typedef {accum_t.name} accum_t;
    typedef {bias_t.name} bias_t;
    typedef {weight_t.name} weight_t;

    template<class x_T, class y_T>
    using product = nnet::product::{product_type}<x_T, y_T>;
}};\n";

const VIVADO_CALL: &str = "nnet::dense<{input_t}, {output_t}, {config}>({input}, {output}, {w}, {b});";

const INTEL_CALL: &str =
    "nnet::dense_{strategy}<{input_t}, {output_t}, {config}>({input}, {output}, {w}, {b});";

const INTEL_TASK_SEQUENCE: &str =
    "task_sequence<nnet::dense_{strategy}_stream<{input_pipe}, {output_pipe}, {config}>>({name});";

const STREAM_CALL: &str = "{name}.async({w}, {b});";

pub(crate) fn templates(backend: &str, dialect: Dialect) -> Result<Vec<LayerTemplate>> {
    let (config_body, call_body) = match dialect {
        Dialect::Vivado => (VIVADO_CONFIG, VIVADO_CALL),
        Dialect::Quartus | Dialect::OneApi => (INTEL_CONFIG, INTEL_CALL),
    };

    let mut out = vec![
        LayerTemplate::builder(backend, &DENSE, Role::Config)
            .shared_body(config_body)
            .derive(SPARSITY)
            .derive(STRATEGY)
            .build()?,
        LayerTemplate::builder(backend, &DENSE, Role::Call)
            .shared_body(call_body)
            .includes(CALL_INCLUDES)
            .derive(STRATEGY)
            .derive(WEIGHT_NAMES)
            .build()?,
    ];

    if dialect.has_dataflow() {
        out.push(
            LayerTemplate::builder(backend, &DENSE, Role::TaskSequence)
                .shared_body(INTEL_TASK_SEQUENCE)
                .includes(STREAM_INCLUDES)
                .derive(STRATEGY)
                .build()?,
        );
        out.push(
            LayerTemplate::builder(backend, &DENSE, Role::StreamCall)
                .shared_body(STREAM_CALL)
                .derive(WEIGHT_NAMES)
                .build()?,
        );
    }
    Ok(out)
}
