//! Symbol model and the first semantic pass.
//!
//! [`symbols::SymbolProgram`] holds every class, interface, function and
//! global of the compilation, keyed by name. [`builder::SymbolTreeBuilder`]
//! fills it from the parsed files and reports duplicate declarations and
//! inheritance cycles. [`scope`] holds the lexical scopes used by the name
//! resolver, and [`binding::Binding`] is what a resolved name points at.

pub mod binding;
pub mod builder;
pub mod builtins;
pub mod scope;
pub mod symbols;

#[cfg(test)]
mod tests;
