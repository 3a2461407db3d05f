use std::fmt::Display;

use crate::Position;

/// Ordered so that, on the same location, errors sort before warnings and
/// warnings before infos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub position: Position,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn line(&self) -> u32 {
        self.position.line
    }

    pub fn col(&self) -> u32 {
        self.position.col
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.position.file, self.position.line, self.position.col, self.severity, self.message
        )
    }
}

/// Collection sink for the semantic passes. Passes never abort on a semantic
/// problem; they record it here and keep going.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    warnings_enabled: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            items: Vec::new(),
            warnings_enabled: true,
        }
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// When disabled, warnings pushed into this sink are dropped.
    pub fn with_warnings(mut self, enabled: bool) -> Self {
        self.warnings_enabled = enabled;
        self
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Warning && !self.warnings_enabled {
            return;
        }

        self.items.push(diagnostic);
    }

    pub fn report(&mut self, severity: Severity, position: &Position, message: impl Into<String>) {
        self.push(Diagnostic {
            position: position.clone(),
            message: message.into(),
            severity,
        });
    }

    pub fn error(&mut self, position: &Position, message: impl Into<String>) {
        self.report(Severity::Error, position, message);
    }

    pub fn warning(&mut self, position: &Position, message: impl Into<String>) {
        self.report(Severity::Warning, position, message);
    }

    pub fn info(&mut self, position: &Position, message: impl Into<String>) {
        self.report(Severity::Info, position, message);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.items {
            self.push(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Stable sort by file, line, column, then severity.
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| {
            (&a.position.file, a.position.line, a.position.col, a.severity).cmp(&(
                &b.position.file,
                b.position.line,
                b.position.col,
                b.severity,
            ))
        });
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for diagnostic in &self.items {
            writeln!(f, "{}", diagnostic)?;
        }

        Ok(())
    }
}
