//! Parser building the [`crate::ast`] tree from a token source.
//!
//! - Declarations and statements: recursive descent, dispatched through
//!   lookup tables keyed by the leading token
//! - Expressions: shunting-yard style operator and operand stacks with the
//!   priorities in [`lookups::Priority`]
//!
//! Parsing stops at the first syntax error.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;
