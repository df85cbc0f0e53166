//! Pooling family: spatial and global pooling in one and two dimensions.
//!
//! Pooling reuses the generic filter/channel vocabulary of the shared
//! `nnet::pooling*_config` base, so the pool window is also exposed as the
//! filter window and the filter count as the channel count.

use crate::backends::Dialect;
use crate::error::Result;
use crate::ir::{LayerKind, Node};
use crate::template::{DeriveCtx, Derivation, LayerFamily, LayerTemplate, Params, Role};

use super::layout_derivation;

fn attributes(kind: LayerKind) -> &'static [&'static str] {
    match kind {
        LayerKind::Pooling1D => &[
            "n_in", "n_out", "n_filt", "stride_width", "pool_width", "pad_left", "pad_right",
            "count_pad", "pool_op", "data_format",
        ],
        LayerKind::Pooling2D => &[
            "in_height",
            "in_width",
            "out_height",
            "out_width",
            "n_filt",
            "stride_height",
            "stride_width",
            "pool_height",
            "pool_width",
            "pad_top",
            "pad_bottom",
            "pad_left",
            "pad_right",
            "count_pad",
            "pool_op",
            "data_format",
        ],
        LayerKind::GlobalPooling1D => &["n_in", "n_filt", "pool_op", "data_format"],
        LayerKind::GlobalPooling2D => &["in_height", "in_width", "n_filt", "pool_op", "data_format"],
        _ => &[],
    }
}

fn types(_kind: LayerKind) -> &'static [&'static str] {
    &["accum_t"]
}

pub static POOLING: LayerFamily = LayerFamily {
    name: "pooling",
    kinds: &[
        LayerKind::Pooling1D,
        LayerKind::Pooling2D,
        LayerKind::GlobalPooling1D,
        LayerKind::GlobalPooling2D,
    ],
    attributes,
    types,
};

pub const INCLUDES: &[&str] = &["nnet_utils/nnet_pooling.h", "nnet_utils/nnet_pooling_stream.h"];

// ─── Derivations ──────────────────────────────────────────────────

fn filter_slots(_ctx: &DeriveCtx<'_>, node: &Node, params: &mut Params) -> Result<()> {
    for (from, to) in [
        ("pool_width", "filt_width"),
        ("pool_height", "filt_height"),
        ("n_filt", "n_chan"),
    ] {
        if let Some(value) = node.attr(from) {
            params.insert(to, value.render());
        }
    }
    Ok(())
}

const FILTER_SLOTS: Derivation = Derivation {
    provides: &["filt_width", "filt_height", "n_chan"],
    apply: filter_slots,
};

fn implementation(_ctx: &DeriveCtx<'_>, node: &Node, params: &mut Params) -> Result<()> {
    let imp = node
        .attr_str("conv_implementation")
        .unwrap_or("LineBuffer");
    params.insert("implementation", imp);
    Ok(())
}

const IMPLEMENTATION: Derivation = Derivation {
    provides: &["implementation"],
    apply: implementation,
};

// ─── Intel Bodies (Quartus, oneAPI) ───────────────────────────────

const INTEL_POOLING1D_CONFIG: &str = "struct config{index} : nnet::pooling1d_config {{
    static const unsigned stride_width = {stride_width};
    static const unsigned pool_width = {pool_width};

    static const unsigned n_in = {n_in};
    static const unsigned n_out = {n_out};
    static const unsigned filt_width = {filt_width};

    static const unsigned n_filt = {n_filt};
    static const unsigned n_chan = {n_chan};

    static const unsigned in_width = {n_in};

    static const unsigned pad_left = {pad_left};
    static const unsigned pad_right = {pad_right};
    static const bool count_pad = {count_pad};

    static const nnet::Pool_Op pool_op = nnet::{pool_op};
    typedef {accum_t.name} accum_t;
}};\n";

const INTEL_POOLING2D_CONFIG: &str = "struct config{index} : nnet::pooling2d_config {{
    static const unsigned stride_height = {stride_height};
    static const unsigned stride_width = {stride_width};

    static const unsigned pool_height = {pool_height};
    static const unsigned pool_width = {pool_width};
    static const unsigned filt_height = {filt_height};
    static const unsigned filt_width = {filt_width};

    static const unsigned in_height = {in_height};
    static const unsigned in_width = {in_width};
    static const unsigned out_height = {out_height};
    static const unsigned out_width = {out_width};

    static const unsigned n_filt = {n_filt};
    static const unsigned n_chan = {n_chan};

    static const unsigned pad_top = {pad_top};
    static const unsigned pad_bottom = {pad_bottom};
    static const unsigned pad_left = {pad_left};
    static const unsigned pad_right = {pad_right};
    static const bool count_pad = {count_pad};

    static const nnet::Pool_Op pool_op = nnet::{pool_op};
    typedef {accum_t.name} accum_t;
}};\n";

const INTEL_GLOBAL_POOLING1D_CONFIG: &str = "struct config{index} : nnet::pooling1d_config {{
    static const unsigned n_in = {n_in};
    static const unsigned n_filt = {n_filt};
    static const nnet::Pool_Op pool_op = nnet::{pool_op};
    typedef {accum_t.name} accum_t;
}};\n";

const INTEL_GLOBAL_POOLING2D_CONFIG: &str = "struct config{index} : nnet::pooling2d_config {{
    static const unsigned in_height = {in_height};
    static const unsigned in_width = {in_width};
    static const unsigned n_filt = {n_filt};
    static const nnet::Pool_Op pool_op = nnet::{pool_op};
    typedef {accum_t.name} accum_t;
}};\n";

const INTEL_TASK_SEQUENCE: [(LayerKind, &str); 4] = [
    (
        LayerKind::Pooling1D,
        "task_sequence<nnet::pooling1d_{data_format}_stream<{input_pipe}, {output_pipe}, {config}>>({name});",
    ),
    (
        LayerKind::Pooling2D,
        "task_sequence<nnet::pooling2d_{data_format}_stream<{input_pipe}, {output_pipe}, {config}>>({name});",
    ),
    (
        LayerKind::GlobalPooling1D,
        "task_sequence<nnet::global_pooling1d_{data_format}_stream<{input_pipe}, {output_pipe}, {config}>>({name});",
    ),
    (
        LayerKind::GlobalPooling2D,
        "task_sequence<nnet::global_pooling2d_{data_format}_stream<{input_pipe}, {output_pipe}, {config}>>({name});",
    ),
];

const STREAM_CALL: &str = "{name}.async();";

// ─── Vivado Bodies ────────────────────────────────────────────────

const VIVADO_POOLING1D_CONFIG: &str = "struct config{index} : nnet::pooling1d_config {{
    static const unsigned n_in = {n_in};
    static const unsigned n_out = {n_out};
    static const unsigned n_filt = {n_filt};
    static const unsigned stride_width = {stride_width};
    static const unsigned pool_width = {pool_width};

    static const unsigned filt_width = {filt_width};
    static const unsigned n_chan = {n_chan};

    static const unsigned pad_left = {pad_left};
    static const unsigned pad_right = {pad_right};
    static const bool count_pad = {count_pad};
    static const nnet::Pool_Op pool_op = nnet::{pool_op};
    static const nnet::conv_implementation implementation = nnet::conv_implementation::{implementation};
    static const unsigned reuse_factor = {reuse};
    typedef {accum_t.name} accum_t;
}};\n";

const VIVADO_POOLING2D_CONFIG: &str = "struct config{index} : nnet::pooling2d_config {{
    static const unsigned in_height = {in_height};
    static const unsigned in_width = {in_width};
    static const unsigned n_filt = {n_filt};
    static const unsigned stride_height = {stride_height};
    static const unsigned stride_width = {stride_width};
    static const unsigned pool_height = {pool_height};
    static const unsigned pool_width = {pool_width};

    static const unsigned filt_height = {filt_height};
    static const unsigned filt_width = {filt_width};
    static const unsigned n_chan = {n_chan};

    static const unsigned out_height = {out_height};
    static const unsigned out_width = {out_width};
    static const unsigned pad_top = {pad_top};
    static const unsigned pad_bottom = {pad_bottom};
    static const unsigned pad_left = {pad_left};
    static const unsigned pad_right = {pad_right};
    static const bool count_pad = {count_pad};
    static const nnet::Pool_Op pool_op = nnet::{pool_op};
    static const nnet::conv_implementation implementation = nnet::conv_implementation::{implementation};
    static const unsigned reuse_factor = {reuse};
    typedef {accum_t.name} accum_t;
}};\n";

const VIVADO_GLOBAL_POOLING1D_CONFIG: &str = "struct config{index} : nnet::pooling1d_config {{
    static const unsigned n_in = {n_in};
    static const unsigned n_filt = {n_filt};
    static const nnet::Pool_Op pool_op = nnet::{pool_op};
    static const unsigned reuse_factor = {reuse};
    typedef {accum_t.name} accum_t;
}};\n";

const VIVADO_GLOBAL_POOLING2D_CONFIG: &str = "struct config{index} : nnet::pooling2d_config {{
    static const unsigned in_height = {in_height};
    static const unsigned in_width = {in_width};
    static const unsigned n_filt = {n_filt};
    static const nnet::Pool_Op pool_op = nnet::{pool_op};
    static const unsigned reuse_factor = {reuse};
    typedef {accum_t.name} accum_t;
}};\n";

// ─── Shared Call Bodies ───────────────────────────────────────────

const CALL: [(LayerKind, &str); 4] = [
    (
        LayerKind::Pooling1D,
        "nnet::pooling1d_{data_format}<{input_t}, {output_t}, {config}>({input}, {output});",
    ),
    (
        LayerKind::Pooling2D,
        "nnet::pooling2d_{data_format}<{input_t}, {output_t}, {config}>({input}, {output});",
    ),
    (
        LayerKind::GlobalPooling1D,
        "nnet::global_pooling1d_{data_format}<{input_t}, {output_t}, {config}>({input}, {output});",
    ),
    (
        LayerKind::GlobalPooling2D,
        "nnet::global_pooling2d_{data_format}<{input_t}, {output_t}, {config}>({input}, {output});",
    ),
];

fn with_bodies(
    mut builder: crate::template::LayerTemplateBuilder,
    bodies: &[(LayerKind, &'static str)],
) -> crate::template::LayerTemplateBuilder {
    for (kind, text) in bodies {
        builder = builder.body(*kind, *text);
    }
    builder
}

pub(crate) fn templates(backend: &str, dialect: Dialect) -> Result<Vec<LayerTemplate>> {
    let config_bodies = match dialect {
        Dialect::Vivado => [
            (LayerKind::Pooling1D, VIVADO_POOLING1D_CONFIG),
            (LayerKind::Pooling2D, VIVADO_POOLING2D_CONFIG),
            (LayerKind::GlobalPooling1D, VIVADO_GLOBAL_POOLING1D_CONFIG),
            (LayerKind::GlobalPooling2D, VIVADO_GLOBAL_POOLING2D_CONFIG),
        ],
        Dialect::Quartus | Dialect::OneApi => [
            (LayerKind::Pooling1D, INTEL_POOLING1D_CONFIG),
            (LayerKind::Pooling2D, INTEL_POOLING2D_CONFIG),
            (LayerKind::GlobalPooling1D, INTEL_GLOBAL_POOLING1D_CONFIG),
            (LayerKind::GlobalPooling2D, INTEL_GLOBAL_POOLING2D_CONFIG),
        ],
    };

    let mut config = LayerTemplate::builder(backend, &POOLING, Role::Config).derive(FILTER_SLOTS);
    if dialect == Dialect::Vivado {
        config = config.derive(IMPLEMENTATION);
    }
    let layout = layout_derivation(dialect);
    let call = LayerTemplate::builder(backend, &POOLING, Role::Call)
        .includes(INCLUDES)
        .derive(layout);

    let mut out = vec![
        with_bodies(config, &config_bodies).build()?,
        with_bodies(call, &CALL).build()?,
    ];

    if dialect.has_dataflow() {
        let task = LayerTemplate::builder(backend, &POOLING, Role::TaskSequence)
            .includes(INCLUDES)
            .derive(layout);
        out.push(with_bodies(task, &INTEL_TASK_SEQUENCE).build()?);
        out.push(
            LayerTemplate::builder(backend, &POOLING, Role::StreamCall)
                .shared_body(STREAM_CALL)
                .build()?,
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CodegenError, ErrorKind};
    use crate::ir::{PrecisionType, Variable};
    use crate::template::Template;

    fn by_role(templates: &[LayerTemplate], role: Role) -> &LayerTemplate {
        templates.iter().find(|t| t.role() == role).unwrap()
    }

    fn pool2d() -> Node {
        Node::new("pool3", LayerKind::Pooling2D, 3)
            .with_attr("stride_height", 2)
            .with_attr("stride_width", 2)
            .with_attr("pool_height", 2)
            .with_attr("pool_width", 2)
            .with_attr("in_height", 8)
            .with_attr("in_width", 8)
            .with_attr("out_height", 4)
            .with_attr("out_width", 4)
            .with_attr("n_filt", 16)
            .with_attr("pad_top", 0)
            .with_attr("pad_bottom", 0)
            .with_attr("pad_left", 0)
            .with_attr("pad_right", 0)
            .with_attr("count_pad", false)
            .with_attr("pool_op", "Max")
            .with_attr("data_format", "channels_last")
            .with_type("accum_t", PrecisionType::new("accum_default_t", "ac_fixed<16,6,true>"))
            .with_input(Variable::new("layer2_out", "input_t"))
            .with_output(Variable::new("layer3_out", "result_t"))
    }

    #[test]
    fn test_dialect_role_counts() {
        assert_eq!(templates("Vivado", Dialect::Vivado).unwrap().len(), 2);
        assert_eq!(templates("Quartus", Dialect::Quartus).unwrap().len(), 2);
        assert_eq!(templates("oneAPI", Dialect::OneApi).unwrap().len(), 4);
    }

    #[test]
    fn test_intel_pooling2d_config() {
        let ts = templates("oneAPI", Dialect::OneApi).unwrap();
        let out = by_role(&ts, Role::Config).format(&pool2d()).unwrap();
        let expected = "struct config3 : nnet::pooling2d_config {
    static const unsigned stride_height = 2;
    static const unsigned stride_width = 2;

    static const unsigned pool_height = 2;
    static const unsigned pool_width = 2;
    static const unsigned filt_height = 2;
    static const unsigned filt_width = 2;

    static const unsigned in_height = 8;
    static const unsigned in_width = 8;
    static const unsigned out_height = 4;
    static const unsigned out_width = 4;

    static const unsigned n_filt = 16;
    static const unsigned n_chan = 16;

    static const unsigned pad_top = 0;
    static const unsigned pad_bottom = 0;
    static const unsigned pad_left = 0;
    static const unsigned pad_right = 0;
    static const bool count_pad = false;

    static const nnet::Pool_Op pool_op = nnet::Max;
    typedef accum_default_t accum_t;
};\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_vivado_config_carries_implementation() {
        let ts = templates("Vivado", Dialect::Vivado).unwrap();
        let node = pool2d().with_attr("reuse_factor", 2);
        let out = by_role(&ts, Role::Config).format(&node).unwrap();
        assert!(out.contains("conv_implementation::LineBuffer;"));
        assert!(out.contains("static const unsigned reuse_factor = 2;"));

        let node = pool2d().with_attr("conv_implementation", "Encoded");
        let out = by_role(&ts, Role::Config).format(&node).unwrap();
        assert!(out.contains("conv_implementation::Encoded;"));
    }

    #[test]
    fn test_intel_call_and_task_sequence() {
        let ts = templates("oneAPI", Dialect::OneApi).unwrap();
        let node = pool2d();
        assert_eq!(
            by_role(&ts, Role::Call).format(&node).unwrap(),
            "nnet::pooling2d_cl<input_t, result_t, config3>(layer2_out, layer3_out);"
        );
        assert_eq!(
            by_role(&ts, Role::TaskSequence).format(&node).unwrap(),
            "task_sequence<nnet::pooling2d_cl_stream<layer2_out_pipe, layer3_out_pipe, config3>>(pool3);"
        );
        assert_eq!(by_role(&ts, Role::StreamCall).format(&node).unwrap(), "pool3.async();");
    }

    #[test]
    fn test_intel_rejects_channels_first() {
        let ts = templates("oneAPI", Dialect::OneApi).unwrap();
        let node = pool2d().with_attr("data_format", "channels_first");
        for role in [Role::Call, Role::TaskSequence] {
            let err = by_role(&ts, role).format(&node).unwrap_err();
            assert_eq!(
                err,
                CodegenError::UnsupportedLayout {
                    layout: "channels_first".to_string(),
                    backend: "oneAPI".to_string(),
                    layer: "pool3".to_string(),
                }
            );
        }
        // Config and stream-call carry no layout check.
        assert!(by_role(&ts, Role::Config).format(&node).is_ok());
        assert!(by_role(&ts, Role::StreamCall).format(&node).is_ok());
    }

    #[test]
    fn test_vivado_accepts_channels_first() {
        let ts = templates("Vivado", Dialect::Vivado).unwrap();
        let node = pool2d().with_attr("data_format", "channels_first");
        assert_eq!(
            by_role(&ts, Role::Call).format(&node).unwrap(),
            "nnet::pooling2d_cf<input_t, result_t, config3>(layer2_out, layer3_out);"
        );
    }

    #[test]
    fn test_global_pooling1d_reduced_shape() {
        let ts = templates("Quartus", Dialect::Quartus).unwrap();
        let node = Node::new("gap", LayerKind::GlobalPooling1D, 5)
            .with_attr("n_in", 12)
            .with_attr("n_filt", 4)
            .with_attr("pool_op", "Average")
            .with_type("accum_t", PrecisionType::new("accum5_t", ""));
        let out = by_role(&ts, Role::Config).format(&node).unwrap();
        assert_eq!(
            out,
            "struct config5 : nnet::pooling1d_config {
    static const unsigned n_in = 12;
    static const unsigned n_filt = 4;
    static const nnet::Pool_Op pool_op = nnet::Average;
    typedef accum5_t accum_t;
};\n"
        );
        assert!(!out.contains("stride"));
        assert!(!out.contains("pad_"));
    }

    #[test]
    fn test_missing_pool_width_reported() {
        let ts = templates("oneAPI", Dialect::OneApi).unwrap();
        let mut node = pool2d();
        node.attributes.remove("pool_width");
        let err = by_role(&ts, Role::Config).format(&node).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingPlaceholder);
        assert!(err.to_string().contains("pool_width"));
    }

    #[test]
    fn test_call_lists_pooling_headers() {
        let ts = templates("oneAPI", Dialect::OneApi).unwrap();
        assert_eq!(by_role(&ts, Role::Call).include_headers(), INCLUDES);
        assert_eq!(by_role(&ts, Role::TaskSequence).include_headers(), INCLUDES);
        assert!(by_role(&ts, Role::Config).include_headers().is_empty());
    }
}
