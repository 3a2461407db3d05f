use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::trace;

use crate::{ast::types::Type, Position};

use super::builtins::BUILTINS;

/// A global, field, parameter or local.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    /// Slot among the enclosing function's parameters and locals, in
    /// declaration order. `None` for globals and fields.
    pub lv_index: Option<u32>,
    pub position: Position,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type, position: Position) -> Self {
        Variable {
            name: name.into(),
            ty,
            lv_index: None,
            position,
        }
    }
}

/// Parameter types and return type of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub parameters: Vec<(String, Type)>,
    pub return_type: Type,
}

impl Signature {
    pub fn parameter_types(&self) -> Vec<&Type> {
        self.parameters.iter().map(|(_, ty)| ty).collect()
    }

    /// Same parameter types in the same order and the same return type.
    pub fn matches(&self, other: &Signature) -> bool {
        self.return_type == other.return_type && self.parameter_types() == other.parameter_types()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub signature: Signature,
    /// Parameters and locals by name; the first declaration of a name wins.
    pub locals: HashMap<String, Variable>,
    pub position: Position,
    pub is_builtin: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, signature: Signature, position: Position) -> Self {
        Function {
            name: name.into(),
            signature,
            locals: HashMap::new(),
            position,
            is_builtin: false,
        }
    }

    pub fn return_type(&self) -> &Type {
        &self.signature.return_type
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub parent: Option<String>,
    pub functions: HashMap<String, Function>,
    pub fields: HashMap<String, Variable>,
    pub implemented_interfaces: BTreeSet<String>,
    pub position: Position,
}

impl Class {
    pub fn new(name: impl Into<String>, parent: Option<String>, position: Position) -> Self {
        Class {
            name: name.into(),
            parent,
            functions: HashMap::new(),
            fields: HashMap::new(),
            implemented_interfaces: BTreeSet::new(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    pub functions: HashMap<String, Function>,
    pub extended_interfaces: BTreeSet<String>,
    pub position: Position,
}

impl Interface {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Interface {
            name: name.into(),
            functions: HashMap::new(),
            extended_interfaces: BTreeSet::new(),
            position,
        }
    }
}

/// Every declaration visible program wide.
///
/// Adding a name that already exists in the same table keeps the first
/// definition and returns `false`.
#[derive(Debug, Clone, Default)]
pub struct SymbolProgram {
    pub classes: HashMap<String, Class>,
    pub interfaces: HashMap<String, Interface>,
    pub functions: HashMap<String, Function>,
    pub variables: HashMap<String, Variable>,
}

impl SymbolProgram {
    /// A symbol program with the builtin functions registered.
    pub fn new() -> Self {
        let mut program = SymbolProgram::default();
        for builtin in BUILTINS.iter() {
            let parameters = builtin
                .parameters
                .iter()
                .enumerate()
                .map(|(index, ty)| (format!("arg{}", index), ty.clone()))
                .collect();
            let mut function = Function::new(
                builtin.name,
                Signature {
                    parameters,
                    return_type: builtin.return_type.clone(),
                },
                Position::null(),
            );
            function.is_builtin = true;
            program.add_function(function);
        }

        program
    }

    pub fn add_class(&mut self, class: Class) -> bool {
        if self.classes.contains_key(&class.name) {
            return false;
        }

        trace!(class = %class.name, "registered class");
        self.classes.insert(class.name.clone(), class);
        true
    }

    pub fn add_interface(&mut self, interface: Interface) -> bool {
        if self.interfaces.contains_key(&interface.name) {
            return false;
        }

        self.interfaces.insert(interface.name.clone(), interface);
        true
    }

    pub fn add_function(&mut self, function: Function) -> bool {
        if self.functions.contains_key(&function.name) {
            return false;
        }

        self.functions.insert(function.name.clone(), function);
        true
    }

    pub fn add_variable(&mut self, variable: Variable) -> bool {
        if self.variables.contains_key(&variable.name) {
            return false;
        }

        self.variables.insert(variable.name.clone(), variable);
        true
    }

    pub fn get_class(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    pub fn get_interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn get_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Whether `name` names a class or an interface.
    pub fn is_type_name(&self, name: &str) -> bool {
        self.classes.contains_key(name) || self.interfaces.contains_key(name)
    }

    /// `name` followed by its ancestors, nearest first. The walk stops at the
    /// first unknown parent or at the first class seen twice.
    pub fn class_chain(&self, name: &str) -> Vec<&Class> {
        let mut chain = vec![];
        let mut seen = HashSet::new();
        let mut current = self.classes.get(name);

        while let Some(class) = current {
            if !seen.insert(class.name.as_str()) {
                break;
            }
            chain.push(class);
            current = class
                .parent
                .as_deref()
                .and_then(|parent| self.classes.get(parent));
        }

        chain
    }

    /// The nearest method called `method` on `class` or its ancestors, with
    /// the class that declares it.
    pub fn find_method(&self, class: &str, method: &str) -> Option<(&Class, &Function)> {
        self.class_chain(class)
            .into_iter()
            .find_map(|owner| owner.functions.get(method).map(|function| (owner, function)))
    }

    /// The nearest field called `field` on `class` or its ancestors, with the
    /// class that declares it.
    pub fn find_field(&self, class: &str, field: &str) -> Option<(&Class, &Variable)> {
        self.class_chain(class)
            .into_iter()
            .find_map(|owner| owner.fields.get(field).map(|variable| (owner, variable)))
    }

    /// `interface` followed by everything it extends, depth first, each at
    /// most once.
    pub fn interface_closure(&self, interface: &str) -> Vec<&Interface> {
        let mut closure = vec![];
        let mut seen = HashSet::new();
        let mut pending = vec![interface];

        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            if let Some(found) = self.interfaces.get(name) {
                closure.push(found);
                pending.extend(found.extended_interfaces.iter().map(String::as_str));
            }
        }

        closure
    }

    /// A method declared by `interface` or anything it extends.
    pub fn find_interface_method(&self, interface: &str, method: &str) -> Option<(&Interface, &Function)> {
        self.interface_closure(interface)
            .into_iter()
            .find_map(|owner| owner.functions.get(method).map(|function| (owner, function)))
    }

    /// Whether `class` names itself as an ancestor.
    pub fn has_cyclic_inheritance(&self, class: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.parent_of(class);

        while let Some(name) = current {
            if name == class {
                return true;
            }
            if !seen.insert(name) {
                return false;
            }
            current = self.parent_of(name);
        }

        false
    }

    fn parent_of(&self, class: &str) -> Option<&str> {
        self.classes
            .get(class)
            .and_then(|found| found.parent.as_deref())
    }

    /// Whether `interface` reaches itself through `ext`.
    pub fn has_cyclic_extension(&self, interface: &str) -> bool {
        let Some(start) = self.interfaces.get(interface) else {
            return false;
        };

        let mut seen = HashSet::new();
        let mut pending: Vec<&str> = start.extended_interfaces.iter().map(String::as_str).collect();
        while let Some(name) = pending.pop() {
            if name == interface {
                return true;
            }
            if !seen.insert(name) {
                continue;
            }
            if let Some(found) = self.interfaces.get(name) {
                pending.extend(found.extended_interfaces.iter().map(String::as_str));
            }
        }

        false
    }

    /// Whether `sub` is `sup` or has it among its ancestors.
    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        self.class_chain(sub).iter().any(|class| class.name == sup)
    }

    /// Whether a value of type `actual` may be stored where `expected` is
    /// required. Named types follow the class hierarchy only; an interface
    /// type accepts nothing but itself. The error type is accepted on either
    /// side.
    pub fn is_assignable(&self, expected: &Type, actual: &Type) -> bool {
        if expected.is_error() || actual.is_error() {
            return true;
        }

        match (expected, actual) {
            (Type::Named(expected), Type::Named(actual)) => {
                expected == actual || self.is_subclass(actual, expected)
            }
            _ => expected == actual,
        }
    }
}
