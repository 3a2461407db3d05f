//! Error reporting for the front end.
//!
//! Two channels exist:
//!
//! - [`errors::Error`] - fatal lexical and syntax errors, returned through `Result`
//! - [`diagnostics::Diagnostics`] - semantic problems collected by the passes

pub mod diagnostics;
pub mod errors;
