use std::path::PathBuf;
use std::process;

use clap::Args;
use hlsgen::diagnostic::{render_diagnostics, Diagnostic};
use hlsgen::{emit_model, FailurePolicy};

use super::{builtin_registry, load_model, DEFAULT_BACKEND};

#[derive(Args)]
pub struct RenderArgs {
    /// Model description (.json)
    pub model: PathBuf,
    /// Backend name (default: the model's backend, else Vivado)
    #[arg(short, long)]
    pub backend: Option<String>,
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Emit the layers that format and report the rest
    #[arg(long)]
    pub keep_going: bool,
}

pub fn cmd_render(args: RenderArgs) {
    let RenderArgs {
        model: path,
        backend,
        output,
        keep_going,
    } = args;
    let filename = path.display().to_string();
    let loaded = load_model(&path);
    let registry = builtin_registry();

    let name = backend
        .or_else(|| loaded.model.backend.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND.to_string());
    let backend = match registry.get(&name) {
        Ok(b) => b,
        Err(e) => {
            let diag = Diagnostic::error(e.to_string(), None).with_help(format!(
                "available backends: {}",
                registry.list_available().join(", ")
            ));
            diag.render(&filename, &loaded.source);
            process::exit(1);
        }
    };

    // Collect every failure so each one can be located in the model file.
    let project = match emit_model(backend, &loaded.model, FailurePolicy::Continue) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let diagnostics: Vec<Diagnostic> = project
        .failures
        .iter()
        .map(|(layer, e)| Diagnostic::from_codegen_error(layer, e, &loaded.source))
        .collect();
    if !keep_going {
        if let Some(first) = diagnostics.first() {
            first.render(&filename, &loaded.source);
            process::exit(1);
        }
    }
    render_diagnostics(&diagnostics, &filename, &loaded.source);

    let source = project.to_source();
    match output {
        Some(out) => {
            if let Err(e) = std::fs::write(&out, &source) {
                eprintln!("error: cannot write '{}': {}", out.display(), e);
                process::exit(1);
            }
            eprintln!(
                "Rendered {} layers for {} -> {}",
                project.layers.len(),
                project.backend,
                out.display()
            );
        }
        None => print!("{}", source),
    }

    if !project.failures.is_empty() {
        process::exit(1);
    }
}

