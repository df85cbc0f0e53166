use std::ops::Range;

use crate::error::CodegenError;
use crate::ir::LoadError;

/// A model or code generation diagnostic (error or warning).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Byte range in the model description, when one can be located.
    pub span: Option<Range<usize>>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String, span: Option<Range<usize>>) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String, span: Option<Range<usize>>) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Diagnostic for a model that failed to load from `source`.
    pub fn from_load_error(err: &LoadError, source: &str) -> Self {
        match err {
            LoadError::Json(json) => {
                let span = offset_of(source, json.line(), json.column()).map(|at| at..at + 1);
                Self::error(format!("invalid model description: {}", json), span)
            }
            LoadError::DuplicateIndex { first, second, .. } => {
                Self::error(err.to_string(), locate_layer(source, second))
                    .with_note(format!("'{}' is declared first", first))
                    .with_help("every layer needs a unique index".to_string())
            }
            LoadError::Io { .. } => Self::error(err.to_string(), None),
        }
    }

    /// Diagnostic for a layer of the model in `source` that failed to format.
    pub fn from_codegen_error(layer: &str, err: &CodegenError, source: &str) -> Self {
        let diag = Self::error(err.to_string(), locate_layer(source, layer));
        match err {
            CodegenError::BackendNotFound { known, .. } => {
                diag.with_help(format!("available backends: {}", known.join(", ")))
            }
            CodegenError::UnsupportedLayout { .. } => {
                diag.with_help("set \"data_format\": \"channels_last\" on the layer".to_string())
            }
            CodegenError::MissingParameter { placeholder, .. } => diag.with_note(format!(
                "add '{}' to the layer's attributes or types",
                placeholder.split('.').next().unwrap_or(placeholder)
            )),
            _ => diag,
        }
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::Source;

        let _ = self
            .report(filename)
            .finish()
            .eprint((filename, Source::from(source)));
    }

    /// Render without colors, for logs and tests.
    pub fn render_to_string(&self, filename: &str, source: &str) -> String {
        use ariadne::Source;

        let mut out = Vec::new();
        let _ = self
            .report(filename)
            .with_config(ariadne::Config::default().with_color(false))
            .finish()
            .write((filename, Source::from(source)), &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    fn report<'a>(&self, filename: &'a str) -> ariadne::ReportBuilder<'static, (&'a str, Range<usize>)> {
        use ariadne::{Color, Label, Report, ReportKind};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let start = self.span.as_ref().map_or(0, |s| s.start);
        let mut report = Report::build(kind, filename, start).with_message(&self.message);

        if let Some(span) = &self.span {
            report = report.with_label(
                Label::new((filename, span.clone()))
                    .with_message(&self.message)
                    .with_color(color),
            );
        }

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}

/// Byte offset of a 1-based line/column position.
fn offset_of(source: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let mut offset = 0;
    for (i, text) in source.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            return Some((offset + column.saturating_sub(1)).min(source.len().saturating_sub(1)));
        }
        offset += text.len();
    }
    None
}

/// Span of the first `"name": "<layer>"` pair in `source`.
fn locate_layer(source: &str, layer: &str) -> Option<Range<usize>> {
    let quoted = format!("\"{}\"", layer);
    source.match_indices(&quoted).map(|(at, _)| at).find_map(|at| {
        let before = source[..at].trim_end().strip_suffix(':')?;
        before
            .trim_end()
            .ends_with("\"name\"")
            .then(|| at..at + quoted.len())
    })
}
