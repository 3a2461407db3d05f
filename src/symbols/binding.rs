use crate::ast::types::Type;

use super::symbols::{Signature, Variable};

/// What a name refers to, as decided by the name resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Local(Variable),
    Parameter(Variable),
    Field { class: String, variable: Variable },
    Global(Variable),
    /// `class` is the declaring class for methods and `None` for free
    /// functions.
    Function {
        class: Option<String>,
        name: String,
        signature: Signature,
    },
    Class(String),
    Interface(String),
}

impl Binding {
    /// Declared type of the bound entity.
    pub fn ty(&self) -> Type {
        match self {
            Binding::Local(variable)
            | Binding::Parameter(variable)
            | Binding::Global(variable)
            | Binding::Field { variable, .. } => variable.ty.clone(),
            Binding::Function { .. } => Type::Function,
            Binding::Class(name) | Binding::Interface(name) => Type::Named(name.clone()),
        }
    }

    /// The variable behind a local, parameter, field or global binding.
    pub fn variable(&self) -> Option<&Variable> {
        match self {
            Binding::Local(variable)
            | Binding::Parameter(variable)
            | Binding::Global(variable)
            | Binding::Field { variable, .. } => Some(variable),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Binding::Function { signature, .. } => Some(signature),
            _ => None,
        }
    }
}
