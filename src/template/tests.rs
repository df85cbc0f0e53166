use super::*;
use crate::error::ErrorKind;
use crate::ir::{PrecisionType, Variable};

fn toy_attributes(kind: LayerKind) -> &'static [&'static str] {
    match kind {
        LayerKind::Activation => &["n_in", "activation"],
        _ => &["n_in"],
    }
}

fn toy_types(_kind: LayerKind) -> &'static [&'static str] {
    &["table_t"]
}

static TOY: LayerFamily = LayerFamily {
    name: "toy",
    kinds: &[LayerKind::Activation, LayerKind::Softmax],
    attributes: toy_attributes,
    types: toy_types,
};

fn upper_activation(_ctx: &DeriveCtx<'_>, node: &Node, params: &mut Params) -> Result<()> {
    if let Some(act) = node.attr_str("activation") {
        params.insert("act_upper", act.to_uppercase());
    }
    Ok(())
}

const UPPER: Derivation = Derivation {
    provides: &["act_upper"],
    apply: upper_activation,
};

fn toy_node(kind: LayerKind) -> Node {
    Node::new("act4", kind, 4)
        .with_attr("n_in", 10)
        .with_attr("activation", "relu")
        .with_type("table_t", PrecisionType::new("table4_t", "ap_fixed<18,8>"))
        .with_input(Variable::new("layer3_out", "layer3_t"))
        .with_output(Variable::new("layer4_out", "result_t"))
}

fn toy_call() -> LayerTemplate {
    LayerTemplate::builder("Toy", &TOY, Role::Call)
        .body(
            LayerKind::Activation,
            "nnet::{activation}<{input_t}, {output_t}, {config}>({input}, {output});",
        )
        .body(
            LayerKind::Softmax,
            "nnet::softmax<{input_t}, {output_t}, {config}>({input}, {output});",
        )
        .includes(&["nnet_utils/nnet_activation.h"])
        .build()
        .unwrap()
}

#[test]
fn test_name_and_support() {
    let t = toy_call();
    assert_eq!(t.name(), "Toy:toy:call");
    assert_eq!(t.role(), Role::Call);
    assert!(t.supports(LayerKind::Softmax));
    assert!(!t.supports(LayerKind::Dense));
    assert_eq!(t.include_headers(), &["nnet_utils/nnet_activation.h"]);
}

#[test]
fn test_format_fills_structural_names() {
    let out = toy_call().format(&toy_node(LayerKind::Activation)).unwrap();
    assert_eq!(
        out,
        "nnet::relu<layer3_t, result_t, config4>(layer3_out, layer4_out);"
    );
}

#[test]
fn test_format_is_repeatable() {
    let t = toy_call();
    let node = toy_node(LayerKind::Softmax);
    assert_eq!(t.format(&node).unwrap(), t.format(&node).unwrap());
}

#[test]
fn test_unsupported_kind_fails() {
    let err = toy_call()
        .format(&Node::new("dense1", LayerKind::Dense, 1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownKind);
    assert_eq!(
        err.to_string(),
        "layer kind 'Dense' is not supported by template 'Toy:toy:call'"
    );
}

#[test]
fn test_missing_attribute_names_placeholder() {
    let node = Node::new("act4", LayerKind::Activation, 4)
        .with_input(Variable::new("x", "x_t"))
        .with_output(Variable::new("y", "y_t"));
    let err = toy_call().format(&node).unwrap_err();
    assert_eq!(
        err,
        CodegenError::MissingParameter {
            placeholder: "activation".to_string(),
            kind: LayerKind::Activation,
            template: "Toy:toy:call".to_string(),
        }
    );
}

#[test]
fn test_missing_variable_fails() {
    let node = Node::new("act4", LayerKind::Softmax, 4);
    let err = toy_call().format(&node).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingPlaceholder);
}

#[test]
fn test_typed_attribute_and_derivation() {
    let t = LayerTemplate::builder("Toy", &TOY, Role::Config)
        .shared_body("struct config{index} {{ typedef {table_t.name} table_t; // {act_upper}\n}};\n")
        .derive(UPPER)
        .build()
        .unwrap();
    let out = t.format(&toy_node(LayerKind::Activation)).unwrap();
    assert_eq!(out, "struct config4 { typedef table4_t table_t; // RELU\n};\n");
}

#[test]
fn test_shared_body_yields_to_specific_body() {
    let t = LayerTemplate::builder("Toy", &TOY, Role::StreamCall)
        .body(LayerKind::Softmax, "{name}.async_softmax();")
        .shared_body("{name}.async();")
        .build()
        .unwrap();
    assert_eq!(t.format(&toy_node(LayerKind::Activation)).unwrap(), "act4.async();");
    assert_eq!(t.format(&toy_node(LayerKind::Softmax)).unwrap(), "act4.async_softmax();");
}

#[test]
fn test_missing_body_rejected_at_build() {
    let err = LayerTemplate::builder("Toy", &TOY, Role::Call)
        .body(LayerKind::Activation, "{name}();")
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        CodegenError::MissingTemplateBody {
            kind: LayerKind::Softmax,
            template: "Toy:toy:call".to_string(),
        }
    );
}

#[test]
fn test_unbound_placeholder_rejected_at_build() {
    let err = LayerTemplate::builder("Toy", &TOY, Role::Config)
        .shared_body("static const unsigned n_out = {n_out};")
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTemplate);
    assert!(matches!(
        err,
        CodegenError::UnboundPlaceholder { ref placeholder, .. } if placeholder == "n_out"
    ));
}

#[test]
fn test_role_vocabulary_is_enforced() {
    // Pipes only exist for dataflow stages.
    let err = LayerTemplate::builder("Toy", &TOY, Role::Call)
        .shared_body("f({input_pipe});")
        .build()
        .unwrap_err();
    assert!(matches!(err, CodegenError::UnboundPlaceholder { .. }));

    let ok = LayerTemplate::builder("Toy", &TOY, Role::TaskSequence)
        .shared_body("task_sequence<f<{input_pipe}, {output_pipe}, {config}>>({name});")
        .build();
    assert!(ok.is_ok());
}

#[test]
fn test_foreign_kind_and_bad_syntax_rejected() {
    let err = LayerTemplate::builder("Toy", &TOY, Role::Call)
        .body(LayerKind::Dense, "{name}();")
        .shared_body("{name}();")
        .build()
        .unwrap_err();
    assert!(matches!(err, CodegenError::MalformedTemplate { .. }));

    let err = LayerTemplate::builder("Toy", &TOY, Role::Call)
        .shared_body("{name();")
        .build()
        .unwrap_err();
    assert!(matches!(err, CodegenError::MalformedTemplate { .. }));
}

#[test]
fn test_task_sequence_defaults_use_pipes() {
    let node = toy_node(LayerKind::Activation);
    let params = Params::defaults(Role::TaskSequence, &node);
    assert_eq!(params.get("input_pipe"), Some("layer3_out_pipe"));
    assert_eq!(params.get("output_pipe"), Some("layer4_out_pipe"));
    assert_eq!(params.get("config"), Some("config4"));
    assert!(!params.contains("input"));

    let params = Params::defaults(Role::StreamCall, &node);
    assert_eq!(params.get("name"), Some("act4"));
    assert!(!params.contains("input_t"));
}

#[test]
fn test_config_defaults() {
    let node = toy_node(LayerKind::Activation).with_attr("reuse_factor", 4);
    let params = Params::defaults(Role::Config, &node);
    assert_eq!(params.get("index"), Some("4"));
    assert_eq!(params.get("iotype"), Some("io_parallel"));
    assert_eq!(params.get("reuse"), Some("4"));
    assert_eq!(params.get("table_t.name"), Some("table4_t"));
    assert_eq!(params.get("table_t.precision"), Some("ap_fixed<18,8>"));
    assert!(!params.contains("config"));
}
