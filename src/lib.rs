#![allow(clippy::module_inception)]

//! Front end of the Knight compiler.
//!
//! Source text goes in, a resolved and type-checked [`ast::ast::Program`] comes
//! out. The pipeline is:
//!
//! 1. [`lexer`] - regex driven tokenizer behind the [`lexer::source::TokenSource`] trait
//! 2. [`parser`] - recursive descent for declarations, operator stacks for expressions
//! 3. [`symbols`] - symbol model and the symbol-tree builder (pass 1)
//! 4. [`resolver`] - name resolution (pass 2)
//! 5. [`type_checker`] - type checking (pass 3)
//!
//! Syntax errors abort immediately with an [`errors::errors::Error`]; semantic
//! problems are collected as [`errors::diagnostics::Diagnostic`]s.

use std::rc::Rc;

use tracing::{debug, info};

use crate::{
    ast::ast::Program,
    errors::{
        diagnostics::{Diagnostic, Diagnostics},
        errors::{Error, ErrorTip},
    },
    lexer::lexer::tokenize,
    parser::parser::parse,
    symbols::{builder::SymbolTreeBuilder, symbols::SymbolProgram},
};

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod resolver;
pub mod symbols;
pub mod type_checker;

extern crate regex;

/// A location in a source file. Lines and columns start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub col: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(line: u32, col: u32, file: Rc<String>) -> Self {
        Position { line, col, file }
    }

    pub fn null() -> Self {
        Position {
            line: 0,
            col: 0,
            file: Rc::new(String::from("<null>")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }

    /// Span covering `self` up to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}

/// Pipeline switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Keep `Warning` diagnostics in the final report.
    pub warnings: bool,
    /// Run name resolution and type checking even when an earlier pass
    /// reported errors. Gives a more complete report at the price of
    /// follow-up diagnostics.
    pub continue_after_errors: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            warnings: true,
            continue_after_errors: true,
        }
    }
}

/// Lifecycle of a single semantic pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    NotStarted,
    Traversing,
    Completed,
    CompletedWithDiagnostics,
}

impl PassState {
    pub fn finished(diagnostics: &Diagnostics) -> Self {
        if diagnostics.has_errors() {
            PassState::CompletedWithDiagnostics
        } else {
            PassState::Completed
        }
    }
}

/// Result of running the front end over one or more files.
#[derive(Debug)]
pub struct Compilation {
    pub programs: Vec<Program>,
    pub symbols: SymbolProgram,
    pub diagnostics: Diagnostics,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// The annotated trees may only be handed to a backend when no pass
    /// reported an error.
    pub fn is_ready_for_codegen(&self) -> bool {
        !self.has_errors()
    }
}

/// Tokenizes and parses a single file. The first lexical or syntax error
/// aborts.
pub fn parse_source(source: &str, file: &str) -> Result<Program, Error> {
    let tokens = tokenize(source.to_string(), Some(file.to_string()))?;
    parse(tokens, Rc::new(file.to_string()))
}

pub fn compile_source(source: &str, file: &str, options: &Options) -> Result<Compilation, Error> {
    compile_sources(&[(file.to_string(), source.to_string())], options)
}

/// Runs the whole front end over `(file name, source)` pairs.
///
/// Every file is parsed first; declarations of all files are merged into one
/// symbol model before any file is resolved, so files may reference each
/// other's classes and globals.
pub fn compile_sources(sources: &[(String, String)], options: &Options) -> Result<Compilation, Error> {
    let mut programs = Vec::with_capacity(sources.len());
    for (file, source) in sources {
        let program = parse_source(source, file)?;
        debug!(file = %file, items = program.items.len(), "parsed");
        programs.push(program);
    }

    Ok(analyse(programs, options))
}

/// Runs the three semantic passes over already parsed files.
pub fn analyse(mut programs: Vec<Program>, options: &Options) -> Compilation {
    let mut diagnostics = Diagnostics::new().with_warnings(options.warnings);

    let mut builder = SymbolTreeBuilder::new();
    for program in programs.iter() {
        builder.build(program);
    }
    let (symbols, build_diagnostics) = builder.finish();
    diagnostics.extend(build_diagnostics);

    if diagnostics.has_errors() && !options.continue_after_errors {
        info!("stopping after symbol-tree construction");
        diagnostics.sort();
        return Compilation { programs, symbols, diagnostics };
    }

    for program in programs.iter_mut() {
        diagnostics.extend(resolver::resolver::resolve(program, &symbols));
    }

    if diagnostics.has_errors() && !options.continue_after_errors {
        info!("stopping after name resolution");
        diagnostics.sort();
        return Compilation { programs, symbols, diagnostics };
    }

    for program in programs.iter_mut() {
        diagnostics.extend(type_checker::type_checker::check(program, &symbols));
    }

    diagnostics.sort();
    info!(
        errors = diagnostics.error_count(),
        total = diagnostics.len(),
        "analysis finished"
    );

    Compilation { programs, symbols, diagnostics }
}

/// Returns the 1-based `line` of `source`, without its line terminator.
pub fn get_line_at_position(source: &str, line: u32) -> Option<&str> {
    if line == 0 {
        return None;
    }

    source
        .split('\n')
        .nth((line - 1) as usize)
        .map(|text| text.trim_end_matches('\r'))
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_get_line_at_position() {
        let source = "Hello, world!\nsecond\r\n\nTesting { }\n";
        assert_eq!(super::get_line_at_position(source, 1), Some("Hello, world!"));
        assert_eq!(super::get_line_at_position(source, 2), Some("second"));
        assert_eq!(super::get_line_at_position(source, 4), Some("Testing { }"));
        assert_eq!(super::get_line_at_position(source, 0), None);
        assert_eq!(super::get_line_at_position(source, 9), None);
    }

    #[test]
    fn test_format_error_points_at_column() {
        use crate::errors::errors::{Error, ErrorImpl};

        let source = "int x = 1;\n  int y = #;\n";
        let error = Error::new(
            ErrorImpl::UnrecognisedToken {
                token: String::from("#"),
            },
            crate::Position::new(2, 11, std::rc::Rc::new(String::from("main.knight"))),
        );

        let report = super::format_error(&error, source);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "Error: UnrecognisedToken");
        assert_eq!(lines[1], "-> main.knight");
        assert_eq!(lines[3], "2 | int y = #;");
        assert_eq!(lines[4], "  | --------^");
    }
}

/// Renders a fatal error in the caret style:
///
/// ```text
/// Error: UnexpectedToken (Invalid token `;`, expected Identifier)
/// -> main.knight
///   |
/// 2 | int = 5;
///   | ----^
/// ```
pub fn format_error(error: &Error, source: &str) -> String {
    let position = error.get_position();
    let heading = if let ErrorTip::None = error.get_tip() {
        format!("Error: {}", error.get_error_name())
    } else {
        format!("Error: {} ({})", error.get_error_name(), error.get_tip())
    };

    render_report(heading, position, source)
}

/// Renders a collected diagnostic in the same style as [`format_error`].
pub fn format_diagnostic(diagnostic: &Diagnostic, source: &str) -> String {
    let heading = format!("{}: {}", diagnostic.severity, diagnostic.message);
    render_report(heading, &diagnostic.position, source)
}

fn render_report(heading: String, position: &Position, source: &str) -> String {
    let mut report = String::new();
    report.push_str(&heading);
    report.push('\n');
    report.push_str(&format!("-> {}", position.file));

    let Some(line_text) = get_line_at_position(source, position.line) else {
        report.push_str(&format!(":{}:{}", position.line, position.col));
        return report;
    };

    let line_string = position.line.to_string();
    let padding = line_string.len() + 2;

    report.push('\n');
    report.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(line_text);
    report.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let arrows = (position.col as usize).saturating_sub(removed_whitespace).max(1);
    report.push_str(&format!("{:>padding$} {:->arrows$}", "|", "^"));

    report
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}
