//! Lexical analysis.
//!
//! Converts source text into tokens with line and column spans. Keywords are
//! recognised through [`tokens::RESERVED_LOOKUP`]; `//` and `/* */` comments
//! and whitespace are skipped. The parser consumes tokens through the
//! [`source::TokenSource`] trait.

pub mod lexer;
pub mod source;
pub mod tokens;
