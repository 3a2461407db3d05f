//! Renders a tree back to Knight source.
//!
//! Binary expressions are always parenthesised, so reparsing the output gives
//! back a tree of the same shape regardless of the precedence rules.

use super::{
    ast::{ClassDecl, FunctionDecl, FunctionSignature, InterfaceDecl, Item, Param, Program},
    expressions::{Expr, ExprKind},
    statements::{ReturnStmt, Stmt, StmtKind, VarDecl},
    types::Type,
};

const INDENT: &str = "    ";

pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::default();
    for (index, item) in program.items.iter().enumerate() {
        if index > 0 {
            printer.out.push('\n');
        }
        printer.item(item);
    }

    printer.out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn item(&mut self, item: &Item) {
        match item {
            Item::Include(include) => self.line(&format!("include <{}>", include.name)),
            Item::Enum(decl) => {
                self.line(&format!("enum {} {{", decl.name));
                self.depth += 1;
                for (member, _) in decl.members.iter() {
                    self.line(&format!("{},", member));
                }
                self.depth -= 1;
                self.line("}");
            }
            Item::Interface(interface) => self.interface(interface),
            Item::Class(class) => self.class(class),
            Item::Function(function) => self.function(function),
            Item::Variable(var) => {
                let text = self.var_decl(var);
                self.line(&format!("{};", text));
            }
        }
    }

    fn interface(&mut self, interface: &InterfaceDecl) {
        let mut header = format!("interface {}", interface.name);
        if !interface.extends.is_empty() {
            let names: Vec<&str> = interface.extends.iter().map(|i| i.name.as_str()).collect();
            header.push_str(&format!(" ext {}", names.join(", ")));
        }
        self.line(&format!("{} {{", header));
        self.depth += 1;
        for method in interface.methods.iter() {
            let text = signature(method);
            self.line(&format!("{};", text));
        }
        self.depth -= 1;
        self.line("}");
    }

    fn class(&mut self, class: &ClassDecl) {
        let mut header = format!("class {}", class.name);
        if let Some(parent) = &class.parent {
            header.push_str(&format!(" ext {}", parent.name));
        }
        if !class.interfaces.is_empty() {
            let names: Vec<&str> = class.interfaces.iter().map(|i| i.name.as_str()).collect();
            header.push_str(&format!(" use {}", names.join(", ")));
        }
        self.line(&format!("{} {{", header));
        self.depth += 1;
        for field in class.fields.iter() {
            let text = self.var_decl(field);
            self.line(&format!("{};", text));
        }
        for method in class.methods.iter() {
            self.function(method);
        }
        self.depth -= 1;
        self.line("}");
    }

    fn function(&mut self, function: &FunctionDecl) {
        self.line(&format!(
            "fn {}({}): {} {{",
            function.name,
            params(&function.params),
            type_name(&function.return_type)
        ));
        self.depth += 1;
        for stmt in function.body.iter() {
            self.stmt(stmt);
        }
        if let Some(ret) = &function.ret {
            self.ret(ret);
        }
        self.depth -= 1;
        self.line("}");
    }

    fn var_decl(&mut self, var: &VarDecl) -> String {
        match &var.init {
            Some(init) => format!(
                "{} {} = {}",
                type_name(&var.ty),
                var.name,
                print_expr(init)
            ),
            None => format!("{} {}", type_name(&var.ty), var.name),
        }
    }

    fn ret(&mut self, ret: &ReturnStmt) {
        match &ret.value {
            Some(value) => self.line(&format!("ret {};", print_expr(value))),
            None => self.line("ret;"),
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl(var) => {
                let text = self.var_decl(var);
                self.line(&format!("{};", text));
            }
            StmtKind::Expression(expr) => self.line(&format!("{};", print_expr(expr))),
            StmtKind::Return(ret) => self.ret(ret),
            StmtKind::Block(block) => {
                self.line("{");
                self.depth += 1;
                for stmt in block.stmts.iter() {
                    self.stmt(stmt);
                }
                self.depth -= 1;
                self.line("}");
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.line(&format!("if ({})", print_expr(condition)));
                self.nested(then_branch);
                if let Some(else_branch) = else_branch {
                    self.line("else");
                    self.nested(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                self.line(&format!("while ({})", print_expr(condition)));
                self.nested(body);
            }
            StmtKind::For(for_loop) => {
                let init = self.var_decl(&for_loop.init);
                self.line(&format!(
                    "for ({}; {}; {})",
                    init,
                    print_expr(&for_loop.condition),
                    assignment(&for_loop.update)
                ));
                self.nested(&for_loop.body);
            }
            StmtKind::Assign { .. }
            | StmtKind::ArrayAssign { .. }
            | StmtKind::FieldAssign { .. } => {
                self.line(&format!("{};", assignment(stmt)));
            }
        }
    }

    // Blocks keep the current depth; single statements are indented one level.
    fn nested(&mut self, stmt: &Stmt) {
        if let StmtKind::Block(_) = stmt.kind {
            self.stmt(stmt);
        } else {
            self.depth += 1;
            self.stmt(stmt);
            self.depth -= 1;
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::IntLiteral(value) => self.out.push_str(&value.to_string()),
            ExprKind::StringLiteral(value) => self.out.push_str(&quote(value)),
            ExprKind::BoolLiteral(value) => self.out.push_str(if *value { "true" } else { "false" }),
            ExprKind::Identifier(identifier) => self.out.push_str(&identifier.name),
            ExprKind::Binary { op, lhs, rhs } => {
                self.out.push('(');
                self.expr(lhs);
                self.out.push_str(&format!(" {} ", op.symbol()));
                self.expr(rhs);
                self.out.push(')');
            }
            ExprKind::Call(call) => {
                if let Some(receiver) = &call.receiver {
                    self.expr(receiver);
                    self.out.push('.');
                }
                self.out.push_str(&call.name.name);
                self.out.push('(');
                self.list(&call.args);
                self.out.push(')');
            }
            ExprKind::FieldAccess { receiver, field } => {
                self.expr(receiver);
                self.out.push('.');
                self.out.push_str(&field.name);
            }
            ExprKind::NewInstance { class } => {
                self.out.push_str(&format!("new {}()", class.name));
            }
            ExprKind::NewArray { element, length } => {
                self.out.push_str(&format!("new {}[", type_name(element)));
                self.expr(length);
                self.out.push(']');
            }
            ExprKind::Index { array, index } => {
                self.expr(array);
                self.out.push('[');
                self.expr(index);
                self.out.push(']');
            }
            ExprKind::ArrayLiteral(elements) => {
                self.out.push('[');
                self.list(elements);
                self.out.push(']');
            }
        }
    }

    fn list(&mut self, exprs: &[Expr]) {
        for (index, expr) in exprs.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            self.expr(expr);
        }
    }
}

fn assignment(stmt: &Stmt) -> String {
    match &stmt.kind {
        StmtKind::Assign { target, value } => format!("{} = {}", target.name, print_expr(value)),
        StmtKind::ArrayAssign {
            target,
            index,
            value,
        } => format!(
            "{}[{}] = {}",
            target.name,
            print_expr(index),
            print_expr(value)
        ),
        StmtKind::FieldAssign {
            receiver,
            field,
            value,
        } => format!(
            "{}.{} = {}",
            print_expr(receiver),
            field.name,
            print_expr(value)
        ),
        _ => String::new(),
    }
}

fn signature(method: &FunctionSignature) -> String {
    format!(
        "fn {}({}): {}",
        method.name,
        params(&method.params),
        type_name(&method.return_type)
    )
}

fn params(params: &[Param]) -> String {
    params
        .iter()
        .map(|param| format!("{} {}", type_name(&param.ty), param.name))
        .collect::<Vec<String>>()
        .join(", ")
}

/// Spelling of a type in source.
pub fn type_name(ty: &Type) -> String {
    ty.to_string()
}

fn quote(value: &str) -> String {
    let mut quoted = String::from("\"");
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            '\0' => quoted.push_str("\\0"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}
