//! Activation family: table-based element-wise activations and softmax.

use crate::backends::Dialect;
use crate::error::Result;
use crate::ir::{LayerKind, Node};
use crate::template::{DeriveCtx, Derivation, LayerFamily, LayerTemplate, Params, Role};

use super::lowercase_attr;

fn attributes(kind: LayerKind) -> &'static [&'static str] {
    match kind {
        LayerKind::Softmax => &["n_in", "activation", "table_size", "implementation"],
        _ => &["n_in", "activation", "table_size"],
    }
}

fn types(kind: LayerKind) -> &'static [&'static str] {
    match kind {
        LayerKind::Softmax => &["exp_table_t", "inv_table_t", "accum_t"],
        _ => &["table_t"],
    }
}

pub static ACTIVATION: LayerFamily = LayerFamily {
    name: "activation",
    kinds: &[LayerKind::Activation, LayerKind::Softmax],
    attributes,
    types,
};

const CALL_INCLUDES: &[&str] = &["nnet_utils/nnet_activation.h"];
const STREAM_INCLUDES: &[&str] = &[
    "nnet_utils/nnet_activation.h",
    "nnet_utils/nnet_activation_stream.h",
];

fn activation_name(_ctx: &DeriveCtx<'_>, node: &Node, params: &mut Params) -> Result<()> {
    let default = if node.kind == LayerKind::Softmax {
        "softmax"
    } else {
        "linear"
    };
    params.insert("activation", lowercase_attr(node, "activation", default));
    if node.kind == LayerKind::Softmax {
        params.insert("implementation", lowercase_attr(node, "implementation", "stable"));
    }
    Ok(())
}

const ACTIVATION_NAME: Derivation = Derivation {
    provides: &["activation", "implementation"],
    apply: activation_name,
};

// ─── Bodies ───────────────────────────────────────────────────────

const VIVADO_ACTIV_CONFIG: &str = "struct config{index} : nnet::activ_config {{
    static const unsigned n_in = {n_in};
    static const unsigned table_size = {table_size};
    static const unsigned io_type = nnet::{iotype};
    static const unsigned reuse_factor = {reuse};
    typedef {table_t.name} table_t;
}};\n";

const VIVADO_SOFTMAX_CONFIG: &str = "struct config{index} : nnet::activ_config {{
    static const unsigned n_in = {n_in};
    static const unsigned table_size = {table_size};
    static const unsigned io_type = nnet::{iotype};
    static const unsigned reuse_factor = {reuse};
    static const nnet::softmax_implementation implementation = nnet::softmax_implementation::{implementation};
    typedef {exp_table_t.name} exp_table_t;
    typedef {inv_table_t.name} inv_table_t;
    typedef {accum_t.name} accum_t;
}};\n";

const INTEL_ACTIV_CONFIG: &str = "struct config{index} : nnet::activ_config {{
    static constexpr unsigned n_in = {n_in};
    static constexpr unsigned table_size = {table_size};
    static constexpr unsigned io_type = nnet::{iotype};
    static constexpr unsigned reuse_factor = {reuse};
    typedef {table_t.name} table_t;
}};\n";

const INTEL_SOFTMAX_CONFIG: &str = "struct config{index} : nnet::activ_config {{
    static constexpr unsigned n_in = {n_in};
    static constexpr unsigned table_size = {table_size};
    static constexpr unsigned io_type = nnet::{iotype};
    static constexpr unsigned reuse_factor = {reuse};
    static constexpr nnet::softmax_implementation implementation = nnet::softmax_implementation::{implementation};
    typedef {exp_table_t.name} exp_table_t;
    typedef {inv_table_t.name} inv_table_t;
    typedef {accum_t.name} accum_t;
}};\n";

const CALL: &str = "nnet::{activation}<{input_t}, {output_t}, {config}>({input}, {output});";

const TASK_SEQUENCE: &str =
    "task_sequence<nnet::{activation}_stream<{input_pipe}, {output_pipe}, {config}>>({name});";

const STREAM_CALL: &str = "{name}.async();";

pub(crate) fn templates(backend: &str, dialect: Dialect) -> Result<Vec<LayerTemplate>> {
    let (activ, softmax) = match dialect {
        Dialect::Vivado => (VIVADO_ACTIV_CONFIG, VIVADO_SOFTMAX_CONFIG),
        Dialect::Quartus | Dialect::OneApi => (INTEL_ACTIV_CONFIG, INTEL_SOFTMAX_CONFIG),
    };

    let mut out = vec![
        LayerTemplate::builder(backend, &ACTIVATION, Role::Config)
            .body(LayerKind::Activation, activ)
            .body(LayerKind::Softmax, softmax)
            .derive(ACTIVATION_NAME)
            .build()?,
        LayerTemplate::builder(backend, &ACTIVATION, Role::Call)
            .shared_body(CALL)
            .includes(CALL_INCLUDES)
            .derive(ACTIVATION_NAME)
            .build()?,
    ];

    if dialect.has_dataflow() {
        out.push(
            LayerTemplate::builder(backend, &ACTIVATION, Role::TaskSequence)
                .shared_body(TASK_SEQUENCE)
                .includes(STREAM_INCLUDES)
                .derive(ACTIVATION_NAME)
                .build()?,
        );
        out.push(
            LayerTemplate::builder(backend, &ACTIVATION, Role::StreamCall)
                .shared_body(STREAM_CALL)
                .build()?,
        );
    }
    Ok(out)
}
