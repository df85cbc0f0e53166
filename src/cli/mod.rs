pub mod backends;
pub mod check;
pub mod render;

use std::path::Path;
use std::process;

use hlsgen::diagnostic::Diagnostic;
use hlsgen::BackendRegistry;

/// Backend used when neither the command line nor the model names one.
pub const DEFAULT_BACKEND: &str = "Vivado";

/// A model file and its parsed contents.
pub struct LoadedModel {
    pub source: String,
    pub model: hlsgen::Model,
}

/// Read and parse a model, reporting failures against the file and exiting.
pub fn load_model(path: &Path) -> LoadedModel {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path.display(), e);
            process::exit(1);
        }
    };
    match hlsgen::Model::from_json(&source) {
        Ok(model) => LoadedModel { source, model },
        Err(err) => {
            let filename = path.display().to_string();
            Diagnostic::from_load_error(&err, &source).render(&filename, &source);
            process::exit(1);
        }
    }
}

/// Build every built-in backend, exiting if any template set is invalid.
pub fn builtin_registry() -> BackendRegistry {
    match BackendRegistry::with_builtin() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
