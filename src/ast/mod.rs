//! Abstract syntax tree.
//!
//! Closed enums for expressions and statements, plain structs for
//! declarations. The parser produces the tree; the name resolver fills in
//! identifier bindings and scope ids; the type checker fills in
//! `resolved_type` on every expression.
//!
//! Submodules:
//! - ast: program and declarations
//! - expressions: expression nodes and binary operators
//! - statements: statement nodes
//! - types: the [`types::Type`] enum
//! - printer: renders a tree back to source
pub mod ast;
pub mod expressions;
pub mod printer;
pub mod statements;
pub mod types;
