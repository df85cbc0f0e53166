//! Error types for template dispatch and backend resolution.
//!
//! Every failure is deterministic in its inputs, so nothing here is
//! retryable. Callers branch on [`ErrorKind`] rather than on messages.

use crate::ir::LayerKind;
use crate::template::Role;

/// Result type for code generation.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Coarse failure category of a [`CodegenError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No backend registered under the requested name.
    BackendNotFound,
    /// A backend name was registered twice.
    DuplicateBackend,
    /// The layer kind is outside a template set's declared support.
    UnknownKind,
    /// A placeholder had no value, or a declared kind has no body.
    MissingPlaceholder,
    /// The layer uses a data layout the target cannot emit.
    UnsupportedLayout,
    /// A template set is internally inconsistent (construction bug).
    InvalidTemplate,
    /// A node attribute has a value the derivation cannot use.
    InvalidAttribute,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    #[error("backend '{name}' not found (available: {})", .known.join(", "))]
    BackendNotFound { name: String, known: Vec<String> },

    #[error("backend '{0}' is already registered")]
    DuplicateBackend(String),

    #[error("layer kind '{kind}' is not supported by template '{template}'")]
    UnknownKind { kind: LayerKind, template: String },

    #[error("template '{template}' declares '{kind}' but has no body for it")]
    MissingTemplateBody { kind: LayerKind, template: String },

    #[error("missing parameter for placeholder '{placeholder}' in {kind} template '{template}'")]
    MissingParameter {
        placeholder: String,
        kind: LayerKind,
        template: String,
    },

    #[error("placeholder '{placeholder}' in {kind} body of '{template}' is never provided")]
    UnboundPlaceholder {
        placeholder: String,
        kind: LayerKind,
        template: String,
    },

    #[error("malformed template '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("{layout} not supported for {backend} (layer '{layer}')")]
    UnsupportedLayout {
        layout: String,
        backend: String,
        layer: String,
    },

    #[error("backend '{backend}' has two {role} templates for {kind}: '{first}' and '{second}'")]
    ConflictingTemplates {
        backend: String,
        role: Role,
        kind: LayerKind,
        first: String,
        second: String,
    },

    #[error("layer '{layer}': attribute '{attr}' {reason}")]
    InvalidAttribute {
        layer: String,
        attr: String,
        reason: String,
    },
}

impl CodegenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BackendNotFound { .. } => ErrorKind::BackendNotFound,
            Self::DuplicateBackend(_) => ErrorKind::DuplicateBackend,
            Self::UnknownKind { .. } => ErrorKind::UnknownKind,
            Self::MissingTemplateBody { .. } | Self::MissingParameter { .. } => {
                ErrorKind::MissingPlaceholder
            }
            Self::UnsupportedLayout { .. } => ErrorKind::UnsupportedLayout,
            Self::UnboundPlaceholder { .. }
            | Self::MalformedTemplate { .. }
            | Self::ConflictingTemplates { .. } => ErrorKind::InvalidTemplate,
            Self::InvalidAttribute { .. } => ErrorKind::InvalidAttribute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_not_found_lists_known() {
        let err = CodegenError::BackendNotFound {
            name: "Catapult".to_string(),
            known: vec!["Vivado".to_string(), "oneAPI".to_string()],
        };
        assert_eq!(err.kind(), ErrorKind::BackendNotFound);
        assert_eq!(
            err.to_string(),
            "backend 'Catapult' not found (available: Vivado, oneAPI)"
        );
    }

    #[test]
    fn test_layout_message_names_backend() {
        let err = CodegenError::UnsupportedLayout {
            layout: "channels_first".to_string(),
            backend: "oneAPI".to_string(),
            layer: "pool1".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::UnsupportedLayout);
        assert_eq!(
            err.to_string(),
            "channels_first not supported for oneAPI (layer 'pool1')"
        );
    }

    #[test]
    fn test_missing_body_is_placeholder_category() {
        let err = CodegenError::MissingTemplateBody {
            kind: LayerKind::Pooling1D,
            template: "oneAPI:pooling:config".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::MissingPlaceholder);
        assert!(err.to_string().contains("Pooling1D"));
    }
}
