//! Template rendering throughput.
//!
//! Measures the per-layer hot path (derive, fill, render) and the whole
//! driver over a synthetic model of pooling and dense layers.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hlsgen::{emit_model, BackendRegistry, FailurePolicy, IoType, LayerKind, Model, Node, PrecisionType, Role, Variable};

fn pooling_node(index: u32) -> Node {
    Node::new(format!("pool{}", index), LayerKind::Pooling2D, index)
        .with_attr("stride_height", 2)
        .with_attr("stride_width", 2)
        .with_attr("pool_height", 2)
        .with_attr("pool_width", 2)
        .with_attr("in_height", 32)
        .with_attr("in_width", 32)
        .with_attr("out_height", 16)
        .with_attr("out_width", 16)
        .with_attr("n_filt", 16)
        .with_attr("pad_top", 0)
        .with_attr("pad_bottom", 0)
        .with_attr("pad_left", 0)
        .with_attr("pad_right", 0)
        .with_attr("count_pad", false)
        .with_attr("pool_op", "Max")
        .with_type("accum_t", PrecisionType::new("accum_t_def", ""))
        .with_input(Variable::new(format!("layer{}_in", index), "input_t"))
        .with_output(Variable::new(format!("layer{}_out", index), "result_t"))
}

fn dense_node(index: u32) -> Node {
    Node::new(format!("dense{}", index), LayerKind::Dense, index)
        .with_attr("n_in", 64)
        .with_attr("n_out", 32)
        .with_type("accum_t", PrecisionType::new("accum_t_def", ""))
        .with_type("weight_t", PrecisionType::new("weight_t_def", ""))
        .with_type("bias_t", PrecisionType::new("bias_t_def", ""))
        .with_weight("weight", Variable::new(format!("w{}", index), "weight_t_def"))
        .with_weight("bias", Variable::new(format!("b{}", index), "bias_t_def"))
        .with_input(Variable::new(format!("layer{}_in", index), "input_t"))
        .with_output(Variable::new(format!("layer{}_out", index), "result_t"))
}

/// Alternating pooling and dense layers.
fn synthetic_model(n: u32, io_type: IoType) -> Model {
    let layers = (1..=n)
        .map(|i| {
            let node = if i % 2 == 0 { dense_node(i) } else { pooling_node(i) };
            node.with_io_type(io_type)
        })
        .collect();
    Model {
        name: "bench".to_string(),
        backend: None,
        io_type,
        layers,
    }
}

fn bench_single_layer(c: &mut Criterion) {
    let registry = BackendRegistry::with_builtin().expect("builtin backends");
    let backend = registry.get("oneAPI").expect("oneAPI");
    let node = pooling_node(3);

    let mut group = c.benchmark_group("format");
    group.bench_function("pooling2d_config", |b| {
        b.iter(|| backend.format(Role::Config, black_box(&node)))
    });
    group.bench_function("pooling2d_call", |b| {
        b.iter(|| backend.format(Role::Call, black_box(&node)))
    });
    group.finish();
}

fn bench_model(c: &mut Criterion) {
    let registry = BackendRegistry::with_builtin().expect("builtin backends");
    let backend = registry.get("oneAPI").expect("oneAPI");
    let parallel = synthetic_model(100, IoType::IoParallel);
    let stream = synthetic_model(100, IoType::IoStream);

    let mut group = c.benchmark_group("emit_model");
    group.bench_function("100_layers_parallel", |b| {
        b.iter(|| emit_model(backend, black_box(&parallel), FailurePolicy::Abort))
    });
    group.bench_function("100_layers_stream", |b| {
        b.iter(|| emit_model(backend, black_box(&stream), FailurePolicy::Abort))
    });
    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    c.bench_function("registry_with_builtin", |b| b.iter(BackendRegistry::with_builtin));
}

criterion_group!(benches, bench_single_layer, bench_model, bench_registry);
criterion_main!(benches);
