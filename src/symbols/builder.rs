use std::collections::HashSet;

use tracing::{debug, info_span};

use crate::{
    ast::{
        ast::{ClassDecl, EnumDecl, FunctionDecl, InterfaceDecl, Item, Param, Program},
        statements::{Stmt, StmtKind, VarDecl},
        types::Type,
    },
    errors::diagnostics::Diagnostics,
    PassState, Position,
};

use super::symbols::{Class, Function, Interface, Signature, SymbolProgram, Variable};

/// First semantic pass: collects every declaration into a [`SymbolProgram`].
///
/// `build` may be called once per file; the declarations of all files end up
/// in the same symbol program. Duplicates are reported and the first
/// definition is kept. Inheritance and extension cycles are reported by
/// `finish`, once every file has been seen.
pub struct SymbolTreeBuilder {
    symbols: SymbolProgram,
    diagnostics: Diagnostics,
    state: PassState,
}

impl Default for SymbolTreeBuilder {
    fn default() -> Self {
        SymbolTreeBuilder::new()
    }
}

impl SymbolTreeBuilder {
    pub fn new() -> Self {
        SymbolTreeBuilder {
            symbols: SymbolProgram::new(),
            diagnostics: Diagnostics::new(),
            state: PassState::NotStarted,
        }
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn symbols(&self) -> &SymbolProgram {
        &self.symbols
    }

    pub fn build(&mut self, program: &Program) {
        let _span = info_span!("build_symbols", file = %program.file).entered();
        self.state = PassState::Traversing;

        for item in program.items.iter() {
            match item {
                Item::Include(include) => {
                    debug!(name = %include.name, "include has no symbols of its own");
                }
                Item::Enum(decl) => self.build_enum(decl),
                Item::Interface(decl) => self.build_interface(decl),
                Item::Class(decl) => self.build_class(decl),
                Item::Function(decl) => {
                    let function = self.build_function(decl, None);
                    if !self.symbols.add_function(function) {
                        self.diagnostics.error(
                            &decl.span.start,
                            format!("Function '{}' is already defined", decl.name),
                        );
                    }
                }
                Item::Variable(var) => self.build_global(var),
            }
        }
    }

    /// Reports inheritance cycles and hands out the result.
    pub fn finish(&mut self) -> (SymbolProgram, Diagnostics) {
        let mut classes: Vec<&Class> = self.symbols.classes.values().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        for class in classes {
            if self.symbols.has_cyclic_inheritance(&class.name) {
                self.diagnostics.error(
                    &class.position,
                    format!("Cyclic inheritance involving class '{}'", class.name),
                );
            }
        }

        let mut interfaces: Vec<&Interface> = self.symbols.interfaces.values().collect();
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        for interface in interfaces {
            if self.symbols.has_cyclic_extension(&interface.name) {
                self.diagnostics.error(
                    &interface.position,
                    format!("Cyclic extension involving interface '{}'", interface.name),
                );
            }
        }

        self.state = PassState::finished(&self.diagnostics);
        debug!(
            classes = self.symbols.classes.len(),
            functions = self.symbols.functions.len(),
            diagnostics = self.diagnostics.len(),
            "symbol tree built"
        );

        (
            std::mem::take(&mut self.symbols),
            std::mem::take(&mut self.diagnostics),
        )
    }

    fn build_global(&mut self, var: &VarDecl) {
        let variable = Variable::new(&var.name, var.ty.clone(), var.name_span.start.clone());
        if !self.symbols.add_variable(variable) {
            self.diagnostics.error(
                &var.name_span.start,
                format!("Variable '{}' is already defined", var.name),
            );
        }
    }

    fn build_enum(&mut self, decl: &EnumDecl) {
        for (member, span) in decl.members.iter() {
            let variable = Variable::new(member, Type::Int, span.start.clone());
            if !self.symbols.add_variable(variable) {
                self.diagnostics.error(
                    &span.start,
                    format!("Enum member '{}' of '{}' is already defined", member, decl.name),
                );
            }
        }
    }

    fn build_interface(&mut self, decl: &InterfaceDecl) {
        if self.symbols.get_interface(&decl.name).is_some() {
            self.diagnostics.error(
                &decl.span.start,
                format!("Interface '{}' is already defined", decl.name),
            );
            return;
        }

        let mut interface = Interface::new(&decl.name, decl.span.start.clone());
        interface
            .extended_interfaces
            .extend(decl.extends.iter().map(|name| name.name.clone()));

        for method in decl.methods.iter() {
            let signature = self.signature(&method.params, &method.return_type, &method.name);
            let function = Function::new(&method.name, signature, method.span.start.clone());
            if interface.functions.contains_key(&method.name) {
                self.diagnostics.error(
                    &method.span.start,
                    format!(
                        "Method '{}' is already declared in interface '{}'",
                        method.name, decl.name
                    ),
                );
                continue;
            }
            interface.functions.insert(method.name.clone(), function);
        }

        self.symbols.add_interface(interface);
    }

    fn build_class(&mut self, decl: &ClassDecl) {
        if self.symbols.get_class(&decl.name).is_some() {
            self.diagnostics.error(
                &decl.span.start,
                format!("Class '{}' is already defined", decl.name),
            );
            return;
        }

        let parent = decl.parent.as_ref().map(|parent| parent.name.clone());
        let mut class = Class::new(&decl.name, parent, decl.span.start.clone());
        class
            .implemented_interfaces
            .extend(decl.interfaces.iter().map(|name| name.name.clone()));

        for field in decl.fields.iter() {
            if class.fields.contains_key(&field.name) {
                self.diagnostics.error(
                    &field.name_span.start,
                    format!(
                        "Field '{}' is already defined in class '{}'",
                        field.name, decl.name
                    ),
                );
                continue;
            }
            let variable = Variable::new(&field.name, field.ty.clone(), field.name_span.start.clone());
            class.fields.insert(field.name.clone(), variable);
        }

        for method in decl.methods.iter() {
            let function = self.build_function(method, Some(&decl.name));
            if class.functions.contains_key(&method.name) {
                self.diagnostics.error(
                    &method.span.start,
                    format!(
                        "Method '{}' is already defined in class '{}'",
                        method.name, decl.name
                    ),
                );
                continue;
            }
            class.functions.insert(method.name.clone(), function);
        }

        self.symbols.add_class(class);
    }

    /// Builds the function record with its parameters and locals.
    fn build_function(&mut self, decl: &FunctionDecl, owner: Option<&str>) -> Function {
        let display_name = match owner {
            Some(class) => format!("{}.{}", class, decl.name),
            None => decl.name.clone(),
        };

        let signature = self.signature(&decl.params, &decl.return_type, &display_name);
        let mut function = Function::new(&decl.name, signature, decl.span.start.clone());

        let mut declared = HashSet::new();
        for (slot, param) in decl.params.iter().enumerate() {
            declared.insert(param.name.clone());
            if !function.locals.contains_key(&param.name) {
                let mut variable = Variable::new(&param.name, param.ty.clone(), param.span.start.clone());
                variable.lv_index = Some(slot as u32);
                function.locals.insert(param.name.clone(), variable);
            }
        }

        let mut locals = LocalCollector {
            diagnostics: &mut self.diagnostics,
            function: &mut function,
            display_name: &display_name,
            next_slot: decl.params.len() as u32,
        };
        locals.collect(&decl.body, &mut declared);

        function
    }

    /// Reports repeated parameter names. Every parameter stays in the
    /// signature so that call sites still match positionally.
    fn signature(&mut self, params: &[Param], return_type: &Type, display_name: &str) -> Signature {
        let mut seen = HashSet::new();
        for param in params.iter() {
            if !seen.insert(param.name.as_str()) {
                self.diagnostics.error(
                    &param.span.start,
                    format!(
                        "Parameter '{}' is already defined in function '{}'",
                        param.name, display_name
                    ),
                );
            }
        }

        Signature {
            parameters: params
                .iter()
                .map(|param| (param.name.clone(), param.ty.clone()))
                .collect(),
            return_type: return_type.clone(),
        }
    }
}

/// Walks a function body registering its locals. Each block gets its own
/// set of names, so only redeclarations within one block are reported.
///
/// Every accepted declaration takes the next slot, in the same order the
/// name resolver opens scopes, so both passes agree on `lv_index`.
struct LocalCollector<'a> {
    diagnostics: &'a mut Diagnostics,
    function: &'a mut Function,
    display_name: &'a str,
    next_slot: u32,
}

impl LocalCollector<'_> {
    fn collect(&mut self, stmts: &[Stmt], declared: &mut HashSet<String>) {
        for stmt in stmts.iter() {
            match &stmt.kind {
                StmtKind::VarDecl(var) => {
                    self.declare(&var.name, &var.ty, &var.name_span.start, declared)
                }
                StmtKind::Block(block) => self.collect(&block.stmts, &mut HashSet::new()),
                StmtKind::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    self.nested(then_branch);
                    if let Some(else_branch) = else_branch {
                        self.nested(else_branch);
                    }
                }
                StmtKind::While { body, .. } => self.nested(body),
                StmtKind::For(for_loop) => {
                    let mut loop_names = HashSet::new();
                    let init = &for_loop.init;
                    self.declare(&init.name, &init.ty, &init.name_span.start, &mut loop_names);
                    self.nested(&for_loop.body);
                }
                _ => {}
            }
        }
    }

    fn nested(&mut self, stmt: &Stmt) {
        self.collect(std::slice::from_ref(stmt), &mut HashSet::new());
    }

    fn declare(&mut self, name: &str, ty: &Type, position: &Position, declared: &mut HashSet<String>) {
        if !declared.insert(name.to_string()) {
            self.diagnostics.error(
                position,
                format!(
                    "Variable '{}' is already defined in function '{}'",
                    name, self.display_name
                ),
            );
            return;
        }

        let slot = self.next_slot;
        self.next_slot += 1;
        if !self.function.locals.contains_key(name) {
            let mut variable = Variable::new(name, ty.clone(), position.clone());
            variable.lv_index = Some(slot);
            self.function.locals.insert(name.to_string(), variable);
        }
    }
}

/// Builds the symbol program of a single file.
pub fn build(program: &Program) -> (SymbolProgram, Diagnostics) {
    let mut builder = SymbolTreeBuilder::new();
    builder.build(program);
    builder.finish()
}
