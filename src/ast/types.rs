//! Types as written in declarations and as computed by the type checker.

use std::fmt::Display;

/// A Knight type.
///
/// `Named` covers both classes and interfaces; which one it is comes from the
/// symbol model. `Error` is the fallback given to expressions that failed to
/// type check and is accepted everywhere, so that one mistake produces one
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Str,
    Bool,
    Void,
    IntArray,
    StrArray,
    Function,
    Named(String),
    Error,
}

impl Type {
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn element_type(&self) -> Option<Type> {
        match self {
            Type::IntArray => Some(Type::Int),
            Type::StrArray => Some(Type::Str),
            _ => None,
        }
    }

    /// Only `int` and `string` have array forms.
    pub fn array_of(element: &Type) -> Option<Type> {
        match element {
            Type::Int => Some(Type::IntArray),
            Type::Str => Some(Type::StrArray),
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Str => write!(f, "string"),
            Type::Bool => write!(f, "bool"),
            Type::Void => write!(f, "void"),
            Type::IntArray => write!(f, "int[]"),
            Type::StrArray => write!(f, "string[]"),
            Type::Function => write!(f, "function"),
            Type::Named(name) => write!(f, "{}", name),
            Type::Error => write!(f, "<error>"),
        }
    }
}
