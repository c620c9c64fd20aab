use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::span::Source;

/// Pipeline errors, one variant per stage.
///
/// Every variant carries the diagnostic for the first fault encountered;
/// a stage never runs once an earlier one has failed, and no stage
/// aggregates more than one error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Lex(Diagnostic),
    #[error("{0}")]
    Syntax(Diagnostic),
    #[error("{0}")]
    Semantic(Diagnostic),
}

impl CoreError {
    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            CoreError::Lex(diag) | CoreError::Syntax(diag) | CoreError::Semantic(diag) => diag,
        }
    }

    /// Render the full caret-annotated report against the source that
    /// produced this error.
    pub fn render(&self, source: &Source) -> String {
        self.diagnostic().render(source)
    }
}
