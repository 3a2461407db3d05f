//! Name resolution (second semantic pass).
//!
//! Walks one parsed file against the merged [`crate::symbols::symbols::SymbolProgram`],
//! opening a lexical scope for every function, block and `for` loop, and
//! stores a [`crate::symbols::binding::Binding`] on each identifier.
//! Unknown names are reported as diagnostics and left unbound.

pub mod resolver;

#[cfg(test)]
mod tests;
