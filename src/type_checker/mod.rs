//! Type checking (third semantic pass).
//!
//! Runs over a resolved file and:
//!
//! - Computes the type of every expression and stores it on the node
//! - Checks initializers, assignments, arguments and returns against the
//!   declared types, with subclass assignability
//! - Requires `bool` conditions and `int` indices and lengths
//! - Checks that classes implement the methods of their interfaces
//!
//! Expressions that fail to type check get the error type, which suppresses
//! follow-up diagnostics.

pub mod type_checker;
