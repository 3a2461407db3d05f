use tracing::{debug, info_span, trace};

use crate::{
    ast::{
        ast::{ClassDecl, FunctionDecl, Item, Program},
        expressions::{BinaryOp, Call, Expr, ExprKind, Identifier},
        statements::{ReturnStmt, Stmt, StmtKind, VarDecl},
        types::Type,
    },
    errors::diagnostics::Diagnostics,
    symbols::{binding::Binding, symbols::SymbolProgram},
    PassState, Position,
};

/// Third semantic pass: computes the type of every expression, stores it in
/// `resolved_type` and checks it against what the context requires.
///
/// An expression that fails to type check gets [`Type::Error`], which every
/// check accepts, so a single mistake is reported once.
pub struct TypeChecker<'a> {
    symbols: &'a SymbolProgram,
    diagnostics: Diagnostics,
    function_name: String,
    return_type: Type,
    state: PassState,
}

impl<'a> TypeChecker<'a> {
    pub fn new(symbols: &'a SymbolProgram) -> Self {
        TypeChecker {
            symbols,
            diagnostics: Diagnostics::new(),
            function_name: String::new(),
            return_type: Type::Void,
            state: PassState::NotStarted,
        }
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn check_program(&mut self, program: &mut Program) -> Diagnostics {
        let _span = info_span!("type_check", file = %program.file).entered();
        self.state = PassState::Traversing;

        for item in program.items.iter_mut() {
            match item {
                Item::Include(_) | Item::Enum(_) | Item::Interface(_) => {}
                Item::Variable(var) => self.check_var_decl(var),
                Item::Class(decl) => {
                    for field in decl.fields.iter_mut() {
                        self.check_var_decl(field);
                    }
                    for method in decl.methods.iter_mut() {
                        self.check_function(method);
                    }
                    self.check_conformance(decl);
                }
                Item::Function(decl) => self.check_function(decl),
            }
        }

        self.state = PassState::finished(&self.diagnostics);
        debug!(diagnostics = self.diagnostics.len(), "types checked");

        std::mem::take(&mut self.diagnostics)
    }

    fn check_function(&mut self, decl: &mut FunctionDecl) {
        trace!(function = %decl.name, "checking function");
        self.function_name = decl.name.clone();
        self.return_type = decl.return_type.clone();

        for stmt in decl.body.iter_mut() {
            self.check_stmt(stmt);
        }

        match decl.ret.as_mut() {
            Some(ret) => self.check_return(ret),
            None => {
                if self.return_type != Type::Void && !self.return_type.is_error() {
                    self.diagnostics.error(
                        &decl.span.start,
                        format!(
                            "Function '{}' must end with a return statement of type {}",
                            decl.name, self.return_type
                        ),
                    );
                }
            }
        }
    }

    /// Every method required by the class's interfaces, including the ones
    /// they extend, must be present with the same signature.
    fn check_conformance(&mut self, decl: &ClassDecl) {
        let Some(class) = self.symbols.get_class(&decl.name) else {
            return;
        };
        if class.position != decl.span.start {
            return;
        }

        for used in decl.interfaces.iter() {
            for interface in self.symbols.interface_closure(&used.name) {
                let mut required: Vec<_> = interface.functions.values().collect();
                required.sort_by(|a, b| a.name.cmp(&b.name));

                for method in required {
                    match self.symbols.find_method(&decl.name, &method.name) {
                        None => self.diagnostics.error(
                            &used.span.start,
                            format!(
                                "Class '{}' does not implement method '{}' of interface '{}'",
                                decl.name, method.name, interface.name
                            ),
                        ),
                        Some((_, found)) if !found.signature.matches(&method.signature) => {
                            self.diagnostics.error(
                                &found.position,
                                format!(
                                    "Method '{}' of class '{}' does not match its declaration in interface '{}'",
                                    method.name, decl.name, interface.name
                                ),
                            )
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }

    fn check_var_decl(&mut self, var: &mut VarDecl) {
        if var.ty == Type::Void {
            self.diagnostics.error(
                &var.type_span.start,
                format!("Variable '{}' cannot have type void", var.name),
            );
        }

        if let Some(init) = var.init.as_mut() {
            let actual = self.check_expr(init);
            self.expect_assignable(&var.ty, &actual, &var.name, &init.span.start);
        }
    }

    fn expect_assignable(&mut self, expected: &Type, actual: &Type, name: &str, position: &Position) {
        if !self.symbols.is_assignable(expected, actual) {
            self.diagnostics.error(
                position,
                format!(
                    "Type mismatch: cannot assign {} to '{}' of type {}",
                    actual, name, expected
                ),
            );
        }
    }

    /// Declared type of an assignment target.
    fn target_type(&mut self, target: &Identifier) -> Type {
        match target.binding.as_ref() {
            None => Type::Error,
            Some(binding) => match binding.variable() {
                Some(variable) => variable.ty.clone(),
                None => {
                    self.diagnostics.error(
                        &target.span.start,
                        format!("Cannot assign to '{}'", target.name),
                    );
                    Type::Error
                }
            },
        }
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::VarDecl(var) => self.check_var_decl(var),
            StmtKind::Assign { target, value } => {
                let expected = self.target_type(target);
                let actual = self.check_expr(value);
                self.expect_assignable(&expected, &actual, &target.name, &value.span.start);
            }
            StmtKind::ArrayAssign {
                target,
                index,
                value,
            } => {
                let array = self.target_type(target);
                self.check_index(index);
                let actual = self.check_expr(value);

                let element = match array.element_type() {
                    Some(element) => element,
                    None if array.is_error() => Type::Error,
                    None => {
                        self.diagnostics.error(
                            &target.span.start,
                            format!("Cannot index a value of type {}", array),
                        );
                        Type::Error
                    }
                };
                self.expect_assignable(&element, &actual, &target.name, &value.span.start);
            }
            StmtKind::FieldAssign {
                receiver,
                field,
                value,
            } => {
                self.check_expr(receiver);
                let expected = self.target_type(field);
                let actual = self.check_expr(value);
                self.expect_assignable(&expected, &actual, &field.name, &value.span.start);
            }
            StmtKind::Expression(expr) => {
                self.check_expr(expr);
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(condition);
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                self.check_condition(condition);
                self.check_stmt(body);
            }
            StmtKind::For(for_loop) => {
                self.check_var_decl(&mut for_loop.init);
                self.check_condition(&mut for_loop.condition);
                self.check_stmt(&mut for_loop.update);
                self.check_stmt(&mut for_loop.body);
            }
            StmtKind::Return(ret) => self.check_return(ret),
            StmtKind::Block(block) => {
                for stmt in block.stmts.iter_mut() {
                    self.check_stmt(stmt);
                }
            }
        }
    }

    fn check_return(&mut self, ret: &mut ReturnStmt) {
        let expected = self.return_type.clone();

        let Some(value) = ret.value.as_mut() else {
            if expected != Type::Void && !expected.is_error() {
                self.diagnostics.error(
                    &ret.span.start,
                    format!(
                        "Function '{}' must return a value of type {}",
                        self.function_name, expected
                    ),
                );
            }
            return;
        };

        let actual = self.check_expr(value);
        if expected == Type::Void {
            self.diagnostics.error(
                &ret.span.start,
                format!("Void function '{}' cannot return a value", self.function_name),
            );
        } else if !self.symbols.is_assignable(&expected, &actual) {
            self.diagnostics.error(
                &ret.span.start,
                format!(
                    "Return type mismatch in function '{}': expected {}, found {}",
                    self.function_name, expected, actual
                ),
            );
        }
    }

    fn check_condition(&mut self, condition: &mut Expr) {
        let ty = self.check_expr(condition);
        if !ty.is_error() && ty != Type::Bool {
            self.diagnostics.error(
                &condition.span.start,
                format!("Condition must be of type bool, found {}", ty),
            );
        }
    }

    fn check_index(&mut self, index: &mut Expr) {
        let ty = self.check_expr(index);
        if !ty.is_error() && ty != Type::Int {
            self.diagnostics.error(
                &index.span.start,
                format!("Array index must be of type int, found {}", ty),
            );
        }
    }

    /// Types `expr` and records the result on the node.
    pub fn check_expr(&mut self, expr: &mut Expr) -> Type {
        let position = expr.span.start.clone();
        let ty = match &mut expr.kind {
            ExprKind::IntLiteral(_) => Type::Int,
            ExprKind::StringLiteral(_) => Type::Str,
            ExprKind::BoolLiteral(_) => Type::Bool,
            ExprKind::Identifier(identifier) => bound_type(identifier),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.check_expr(lhs);
                let rhs = self.check_expr(rhs);
                self.binary_type(*op, &lhs, &rhs, &position)
            }
            ExprKind::Call(call) => self.check_call(call),
            ExprKind::FieldAccess { receiver, field } => {
                self.check_expr(receiver);
                bound_type(field)
            }
            ExprKind::NewInstance { class } => bound_type(class),
            ExprKind::NewArray { element, length } => {
                let length_type = self.check_expr(length);
                if !length_type.is_error() && length_type != Type::Int {
                    self.diagnostics.error(
                        &length.span.start,
                        format!("Array length must be of type int, found {}", length_type),
                    );
                }
                Type::array_of(element).unwrap_or(Type::Error)
            }
            ExprKind::Index { array, index } => {
                let array_type = self.check_expr(array);
                self.check_index(index);
                match array_type.element_type() {
                    Some(element) => element,
                    None if array_type.is_error() => Type::Error,
                    None => {
                        self.diagnostics.error(
                            &position,
                            format!("Cannot index a value of type {}", array_type),
                        );
                        Type::Error
                    }
                }
            }
            ExprKind::ArrayLiteral(elements) => self.array_literal_type(elements, &position),
        };

        expr.resolved_type = Some(ty.clone());
        ty
    }

    /// Empty literals are `int[]`. Otherwise every element must be `int`, or
    /// every element `string`.
    fn array_literal_type(&mut self, elements: &mut [Expr], position: &Position) -> Type {
        let types: Vec<Type> = elements
            .iter_mut()
            .map(|element| self.check_expr(element))
            .collect();

        if types.is_empty() {
            return Type::IntArray;
        }
        if types.iter().any(Type::is_error) {
            return Type::Error;
        }

        let first = &types[0];
        match Type::array_of(first) {
            Some(array) if types.iter().all(|ty| ty == first) => array,
            _ => {
                self.diagnostics.error(
                    position,
                    "Array elements must be all int or all string",
                );
                Type::Error
            }
        }
    }

    fn binary_type(&mut self, op: BinaryOp, lhs: &Type, rhs: &Type, position: &Position) -> Type {
        if lhs.is_error() || rhs.is_error() {
            return Type::Error;
        }

        let result = match op {
            BinaryOp::Plus => match (lhs, rhs) {
                (Type::Int, Type::Int) => Some(Type::Int),
                (Type::Str, Type::Str) => Some(Type::Str),
                (Type::Int, Type::Str) | (Type::Str, Type::Int) => {
                    self.diagnostics
                        .warning(position, "Implicit conversion to string in concatenation");
                    Some(Type::Str)
                }
                _ => None,
            },
            op if op.is_arithmetic() => {
                (*lhs == Type::Int && *rhs == Type::Int).then_some(Type::Int)
            }
            op if op.is_ordering() => {
                (*lhs == Type::Int && *rhs == Type::Int).then_some(Type::Bool)
            }
            op if op.is_logical() => {
                (*lhs == Type::Bool && *rhs == Type::Bool).then_some(Type::Bool)
            }
            _ => self.is_comparable(lhs, rhs).then_some(Type::Bool),
        };

        result.unwrap_or_else(|| {
            self.diagnostics.error(
                position,
                format!("Operator {} cannot be applied to {} and {}", op.symbol(), lhs, rhs),
            );
            Type::Error
        })
    }

    /// Operands of `==` and `!=`: two ints, two strings, two bools, or
    /// classes where one extends the other.
    fn is_comparable(&self, lhs: &Type, rhs: &Type) -> bool {
        match (lhs, rhs) {
            (Type::Int, Type::Int) | (Type::Str, Type::Str) | (Type::Bool, Type::Bool) => true,
            (Type::Named(_), Type::Named(_)) => {
                self.symbols.is_assignable(lhs, rhs) || self.symbols.is_assignable(rhs, lhs)
            }
            _ => false,
        }
    }

    /// Checks arguments against the signature the resolver bound. An unbound
    /// call was already reported and types as the error type.
    fn check_call(&mut self, call: &mut Call) -> Type {
        if let Some(receiver) = call.receiver.as_mut() {
            self.check_expr(receiver);
        }
        let args: Vec<Type> = call
            .args
            .iter_mut()
            .map(|arg| self.check_expr(arg))
            .collect();

        let Some(signature) = call.name.binding.as_ref().and_then(Binding::signature) else {
            return Type::Error;
        };

        let parameters = signature.parameter_types();
        let matches = parameters.len() == args.len()
            && parameters
                .iter()
                .zip(args.iter())
                .all(|(expected, actual)| self.symbols.is_assignable(expected, actual));

        if !matches {
            let render = |types: Vec<String>| types.join(", ");
            self.diagnostics.error(
                &call.name.span.start,
                format!(
                    "No matching function for call to {}({}); expected {}({})",
                    call.name.name,
                    render(args.iter().map(Type::to_string).collect()),
                    call.name.name,
                    render(parameters.iter().map(|ty| ty.to_string()).collect()),
                ),
            );
            return Type::Error;
        }

        signature.return_type.clone()
    }
}

fn bound_type(identifier: &Identifier) -> Type {
    identifier
        .binding
        .as_ref()
        .map(Binding::ty)
        .unwrap_or(Type::Error)
}

/// Type checks one resolved file.
pub fn check(program: &mut Program, symbols: &SymbolProgram) -> Diagnostics {
    TypeChecker::new(symbols).check_program(program)
}
