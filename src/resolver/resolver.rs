use tracing::{debug, info_span, trace};

use crate::{
    ast::{
        ast::{ClassDecl, FunctionDecl, InterfaceDecl, Item, Param, Program},
        expressions::{BinaryOp, Call, Expr, ExprKind, Identifier},
        statements::{Stmt, StmtKind, VarDecl},
        types::Type,
    },
    errors::diagnostics::Diagnostics,
    symbols::{
        binding::Binding,
        scope::{lookup, Scope, ScopeId, ScopeKind},
        symbols::{SymbolProgram, Variable},
    },
    PassState, Position,
};

/// Second semantic pass: binds every identifier of one file to the entity it
/// names and records the lexical scopes on the tree.
///
/// Scopes live in an arena that is moved out of the [`Program`] while the
/// pass runs and moved back when it ends; `scope_path` is the chain of open
/// scopes, innermost last.
pub struct NameResolver<'a> {
    symbols: &'a SymbolProgram,
    diagnostics: Diagnostics,
    scopes: Vec<Scope>,
    scope_path: Vec<ScopeId>,
    current_class: Option<String>,
    /// Scope holding the parameters of the function being resolved, and the
    /// scope of its top-level locals.
    function_scopes: Option<(ScopeId, ScopeId)>,
    next_slot: u32,
    state: PassState,
}

impl<'a> NameResolver<'a> {
    pub fn new(symbols: &'a SymbolProgram) -> Self {
        NameResolver {
            symbols,
            diagnostics: Diagnostics::new(),
            scopes: vec![],
            scope_path: vec![],
            current_class: None,
            function_scopes: None,
            next_slot: 0,
            state: PassState::NotStarted,
        }
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn resolve_program(&mut self, program: &mut Program) -> Diagnostics {
        let _span = info_span!("resolve", file = %program.file).entered();
        self.state = PassState::Traversing;
        self.scopes = std::mem::take(&mut program.scopes);

        for item in program.items.iter_mut() {
            match item {
                Item::Include(_) | Item::Enum(_) => {}
                Item::Interface(decl) => self.resolve_interface(decl),
                Item::Class(decl) => self.resolve_class(decl),
                Item::Function(decl) => self.resolve_function(decl),
                Item::Variable(var) => {
                    self.check_type(&var.ty, &var.type_span.start);
                    if let Some(init) = var.init.as_mut() {
                        self.resolve_expr(init);
                    }
                }
            }
        }

        program.scopes = std::mem::take(&mut self.scopes);
        self.state = PassState::finished(&self.diagnostics);
        debug!(
            scopes = program.scopes.len(),
            diagnostics = self.diagnostics.len(),
            "names resolved"
        );

        std::mem::take(&mut self.diagnostics)
    }

    fn resolve_interface(&mut self, decl: &mut InterfaceDecl) {
        for parent in decl.extends.iter_mut() {
            self.bind_interface(parent);
        }

        for method in decl.methods.iter() {
            self.check_params(&method.params);
            self.check_type(&method.return_type, &method.return_type_span.start);
        }
    }

    fn resolve_class(&mut self, decl: &mut ClassDecl) {
        self.current_class = Some(decl.name.clone());

        if let Some(parent) = decl.parent.as_mut() {
            if self.symbols.get_class(&parent.name).is_some() {
                parent.binding = Some(Binding::Class(parent.name.clone()));
            } else {
                self.diagnostics.error(
                    &parent.span.start,
                    format!("Undefined class '{}'", parent.name),
                );
            }
        }

        for interface in decl.interfaces.iter_mut() {
            self.bind_interface(interface);
        }

        for field in decl.fields.iter_mut() {
            self.check_type(&field.ty, &field.type_span.start);
            if let Some(init) = field.init.as_mut() {
                self.resolve_expr(init);
            }
        }

        for method in decl.methods.iter_mut() {
            self.resolve_function(method);
        }

        self.current_class = None;
    }

    fn bind_interface(&mut self, name: &mut Identifier) {
        if self.symbols.get_interface(&name.name).is_some() {
            name.binding = Some(Binding::Interface(name.name.clone()));
        } else {
            self.diagnostics.error(
                &name.span.start,
                format!("Undefined interface '{}'", name.name),
            );
        }
    }

    /// Opens the parameter scope and, below it, the scope of the top-level
    /// locals.
    fn resolve_function(&mut self, decl: &mut FunctionDecl) {
        trace!(function = %decl.name, "resolving function");
        self.check_params(&decl.params);
        self.check_type(&decl.return_type, &decl.return_type_span.start);

        let params = self.open_scope(ScopeKind::Parameters);
        for (slot, param) in decl.params.iter().enumerate() {
            let mut variable = Variable::new(&param.name, param.ty.clone(), param.span.start.clone());
            variable.lv_index = Some(slot as u32);
            self.scopes[params.0].declare(variable);
        }
        self.next_slot = decl.params.len() as u32;

        let body = self.open_scope(ScopeKind::Block);
        self.function_scopes = Some((params, body));

        for stmt in decl.body.iter_mut() {
            self.resolve_stmt(stmt);
        }
        if let Some(value) = decl.ret.as_mut().and_then(|ret| ret.value.as_mut()) {
            self.resolve_expr(value);
        }

        self.close_scope();
        self.close_scope();
        self.function_scopes = None;

        decl.scope = Some(params);
        decl.body_scope = Some(body);
    }

    fn check_params(&mut self, params: &[Param]) {
        for param in params.iter() {
            self.check_type(&param.ty, &param.type_span.start);
        }
    }

    /// Class and interface names used as types must exist.
    fn check_type(&mut self, ty: &Type, position: &Position) {
        if let Type::Named(name) = ty {
            if !self.symbols.is_type_name(name) {
                self.diagnostics
                    .error(position, format!("Unknown type '{}'", name));
            }
        }
    }

    fn open_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(self.scope_path.last().copied(), kind));
        self.scope_path.push(id);
        id
    }

    fn close_scope(&mut self) {
        self.scope_path.pop();
    }

    /// Declares a local in the innermost scope. A name already declared in
    /// the same block, or shadowing a parameter at the top of the body, keeps
    /// the earlier declaration; the symbol-tree builder has reported it.
    fn declare_local(&mut self, var: &VarDecl) {
        let Some(&current) = self.scope_path.last() else {
            return;
        };

        if let Some((params, body)) = self.function_scopes {
            if current == body && self.scopes[params.0].variables.contains_key(&var.name) {
                return;
            }
        }

        let mut variable = Variable::new(&var.name, var.ty.clone(), var.name_span.start.clone());
        variable.lv_index = Some(self.next_slot);
        if self.scopes[current.0].declare(variable) {
            self.next_slot += 1;
        }
    }

    fn resolve_var_decl(&mut self, var: &mut VarDecl) {
        self.check_type(&var.ty, &var.type_span.start);
        if let Some(init) = var.init.as_mut() {
            self.resolve_expr(init);
        }
        self.declare_local(var);
    }

    fn resolve_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::VarDecl(var) => self.resolve_var_decl(var),
            StmtKind::Assign { target, value } => {
                self.resolve_identifier(target);
                self.resolve_expr(value);
            }
            StmtKind::ArrayAssign {
                target,
                index,
                value,
            } => {
                self.resolve_identifier(target);
                self.resolve_expr(index);
                self.resolve_expr(value);
            }
            StmtKind::FieldAssign {
                receiver,
                field,
                value,
            } => {
                self.resolve_expr(receiver);
                self.resolve_field(receiver, field);
                self.resolve_expr(value);
            }
            StmtKind::Expression(expr) => self.resolve_expr(expr),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            StmtKind::For(for_loop) => {
                let scope = self.open_scope(ScopeKind::Block);
                self.resolve_var_decl(&mut for_loop.init);
                self.resolve_expr(&mut for_loop.condition);
                self.resolve_stmt(&mut for_loop.update);
                self.resolve_stmt(&mut for_loop.body);
                self.close_scope();
                for_loop.scope = Some(scope);
            }
            StmtKind::Return(ret) => {
                if let Some(value) = ret.value.as_mut() {
                    self.resolve_expr(value);
                }
            }
            StmtKind::Block(block) => {
                let scope = self.open_scope(ScopeKind::Block);
                for stmt in block.stmts.iter_mut() {
                    self.resolve_stmt(stmt);
                }
                self.close_scope();
                block.scope = Some(scope);
            }
        }
    }

    /// Binds a name used as a value. Lookup order: enclosing scopes, members
    /// of the current class and its ancestors, globals, free functions.
    fn resolve_identifier(&mut self, identifier: &mut Identifier) {
        if let Some(&from) = self.scope_path.last() {
            if let Some((variable, kind)) = lookup(&self.scopes, from, &identifier.name) {
                identifier.binding = Some(match kind {
                    ScopeKind::Parameters => Binding::Parameter(variable.clone()),
                    ScopeKind::Block => Binding::Local(variable.clone()),
                });
                return;
            }
        }

        if let Some(class) = self.current_class.as_deref() {
            if let Some((owner, variable)) = self.symbols.find_field(class, &identifier.name) {
                identifier.binding = Some(Binding::Field {
                    class: owner.name.clone(),
                    variable: variable.clone(),
                });
                return;
            }
        }

        if let Some(binding) = self.method_binding(&identifier.name) {
            identifier.binding = Some(binding);
            return;
        }

        if let Some(variable) = self.symbols.get_variable(&identifier.name) {
            identifier.binding = Some(Binding::Global(variable.clone()));
            return;
        }

        if let Some(binding) = self.free_function_binding(&identifier.name) {
            identifier.binding = Some(binding);
            return;
        }

        self.diagnostics.error(
            &identifier.span.start,
            format!("Undefined variable '{}'", identifier.name),
        );
    }

    /// A method of the current class or one of its ancestors.
    fn method_binding(&self, name: &str) -> Option<Binding> {
        let class = self.current_class.as_deref()?;
        self.symbols
            .find_method(class, name)
            .map(|(owner, function)| Binding::Function {
                class: Some(owner.name.clone()),
                name: function.name.clone(),
                signature: function.signature.clone(),
            })
    }

    fn free_function_binding(&self, name: &str) -> Option<Binding> {
        self.symbols.get_function(name).map(|function| Binding::Function {
            class: None,
            name: function.name.clone(),
            signature: function.signature.clone(),
        })
    }

    fn resolve_expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::IntLiteral(_) | ExprKind::StringLiteral(_) | ExprKind::BoolLiteral(_) => {}
            ExprKind::Identifier(identifier) => self.resolve_identifier(identifier),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.resolve_expr(lhs);
                self.resolve_expr(rhs);
            }
            ExprKind::Call(call) => self.resolve_call(call),
            ExprKind::FieldAccess { receiver, field } => {
                self.resolve_expr(receiver);
                self.resolve_field(&**receiver, field);
            }
            ExprKind::NewInstance { class } => {
                if self.symbols.get_class(&class.name).is_some() {
                    class.binding = Some(Binding::Class(class.name.clone()));
                } else if self.symbols.get_interface(&class.name).is_some() {
                    self.diagnostics.error(
                        &class.span.start,
                        format!("Cannot instantiate interface '{}'", class.name),
                    );
                } else {
                    self.diagnostics.error(
                        &class.span.start,
                        format!("Cannot instantiate undefined class '{}'", class.name),
                    );
                }
            }
            ExprKind::NewArray { length, .. } => self.resolve_expr(length),
            ExprKind::Index { array, index } => {
                self.resolve_expr(array);
                self.resolve_expr(index);
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements.iter_mut() {
                    self.resolve_expr(element);
                }
            }
        }
    }

    fn resolve_call(&mut self, call: &mut Call) {
        if let Some(receiver) = call.receiver.as_mut() {
            self.resolve_expr(receiver);
        }
        for arg in call.args.iter_mut() {
            self.resolve_expr(arg);
        }

        let Some(receiver) = call.receiver.as_ref() else {
            let binding = self
                .method_binding(&call.name.name)
                .or_else(|| self.free_function_binding(&call.name.name));
            match binding {
                Some(binding) => call.name.binding = Some(binding),
                None => self.diagnostics.error(
                    &call.name.span.start,
                    format!("Undefined function '{}'", call.name.name),
                ),
            }
            return;
        };

        let method = call.name.name.clone();
        let position = call.name.span.start.clone();
        match static_type(receiver) {
            None | Some(Type::Error) => {}
            Some(Type::Named(name)) => {
                if self.symbols.get_class(&name).is_some() {
                    match self.symbols.find_method(&name, &method) {
                        Some((owner, function)) => {
                            call.name.binding = Some(Binding::Function {
                                class: Some(owner.name.clone()),
                                name: function.name.clone(),
                                signature: function.signature.clone(),
                            })
                        }
                        None => self.diagnostics.error(
                            &position,
                            format!("Undefined method '{}' in class '{}'", method, name),
                        ),
                    }
                } else if self.symbols.get_interface(&name).is_some() {
                    match self.symbols.find_interface_method(&name, &method) {
                        Some((owner, function)) => {
                            call.name.binding = Some(Binding::Function {
                                class: Some(owner.name.clone()),
                                name: function.name.clone(),
                                signature: function.signature.clone(),
                            })
                        }
                        None => self.diagnostics.error(
                            &position,
                            format!("Undefined method '{}' in interface '{}'", method, name),
                        ),
                    }
                }
            }
            Some(other) => self.diagnostics.error(
                &position,
                format!("Cannot call method '{}' on a value of type {}", method, other),
            ),
        }
    }

    fn resolve_field(&mut self, receiver: &Expr, field: &mut Identifier) {
        match static_type(receiver) {
            None | Some(Type::Error) => {}
            Some(Type::Named(name)) => {
                if self.symbols.get_class(&name).is_some() {
                    match self.symbols.find_field(&name, &field.name) {
                        Some((owner, variable)) => {
                            field.binding = Some(Binding::Field {
                                class: owner.name.clone(),
                                variable: variable.clone(),
                            })
                        }
                        None => self.diagnostics.error(
                            &field.span.start,
                            format!("Undefined field '{}' in class '{}'", field.name, name),
                        ),
                    }
                } else if self.symbols.get_interface(&name).is_some() {
                    self.diagnostics.error(
                        &field.span.start,
                        format!("Undefined field '{}' in interface '{}'", field.name, name),
                    );
                }
            }
            Some(other) => self.diagnostics.error(
                &field.span.start,
                format!("Cannot access field '{}' on a value of type {}", field.name, other),
            ),
        }
    }
}

/// Type of an already resolved expression, as far as names and literals
/// decide it. Used to find the class behind a method call or field access.
/// `None` when some name below could not be resolved.
pub fn static_type(expr: &Expr) -> Option<Type> {
    match &expr.kind {
        ExprKind::IntLiteral(_) => Some(Type::Int),
        ExprKind::StringLiteral(_) => Some(Type::Str),
        ExprKind::BoolLiteral(_) => Some(Type::Bool),
        ExprKind::Identifier(identifier) => identifier.binding.as_ref().map(Binding::ty),
        ExprKind::Call(call) => call
            .name
            .binding
            .as_ref()
            .and_then(Binding::signature)
            .map(|signature| signature.return_type.clone()),
        ExprKind::FieldAccess { field, .. } => field.binding.as_ref().map(Binding::ty),
        ExprKind::NewInstance { class } => class.binding.as_ref().map(Binding::ty),
        ExprKind::NewArray { element, .. } => Type::array_of(element),
        ExprKind::Index { array, .. } => static_type(array).and_then(|ty| ty.element_type()),
        ExprKind::ArrayLiteral(elements) => match elements.first() {
            Some(first) => static_type(first).and_then(|ty| Type::array_of(&ty)),
            None => Some(Type::IntArray),
        },
        ExprKind::Binary { op, lhs, rhs } => {
            if op.is_logical() || op.is_equality() || op.is_ordering() {
                return Some(Type::Bool);
            }
            if *op == BinaryOp::Plus {
                let lhs = static_type(lhs);
                let rhs = static_type(rhs);
                if lhs == Some(Type::Str) || rhs == Some(Type::Str) {
                    return Some(Type::Str);
                }
            }
            Some(Type::Int)
        }
    }
}

/// Resolves the names of one file against the merged symbol program.
pub fn resolve(program: &mut Program, symbols: &SymbolProgram) -> Diagnostics {
    NameResolver::new(symbols).resolve_program(program)
}
