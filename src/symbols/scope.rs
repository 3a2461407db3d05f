use std::collections::HashMap;

use super::symbols::Variable;

/// Index of a [`Scope`] in [`crate::ast::ast::Program::scopes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Holds a function's parameters.
    Parameters,
    /// Function body, block or loop.
    Block,
}

/// A lexical scope. Lookups continue in `parent` when a name is missing.
#[derive(Debug, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub variables: HashMap<String, Variable>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Scope {
            parent,
            kind,
            variables: HashMap::new(),
        }
    }

    /// Returns `false`, keeping the existing entry, when the name is taken.
    pub fn declare(&mut self, variable: Variable) -> bool {
        if self.variables.contains_key(&variable.name) {
            return false;
        }

        self.variables.insert(variable.name.clone(), variable);
        true
    }
}

/// Finds `name` starting at `from` and walking outwards. Returns the
/// variable and the kind of scope that declared it.
pub fn lookup<'a>(scopes: &'a [Scope], from: ScopeId, name: &str) -> Option<(&'a Variable, ScopeKind)> {
    let mut current = Some(from);
    while let Some(id) = current {
        let scope = &scopes[id.0];
        if let Some(variable) = scope.variables.get(name) {
            return Some((variable, scope.kind));
        }
        current = scope.parent;
    }

    None
}
