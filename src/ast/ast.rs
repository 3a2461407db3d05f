use std::rc::Rc;

use crate::{symbols::scope::{Scope, ScopeId}, Span};

use super::{
    expressions::Identifier,
    statements::{ReturnStmt, Stmt, VarDecl},
    types::Type,
};

/// Identity of an expression or statement node, unique within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// One parsed source file.
///
/// `scopes` is the arena of lexical scopes opened by the name resolver;
/// function and block nodes refer into it by [`ScopeId`].
#[derive(Debug, Clone)]
pub struct Program {
    pub file: Rc<String>,
    pub items: Vec<Item>,
    pub scopes: Vec<Scope>,
}

impl Program {
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Class(class) => Some(class),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(function) => Some(function),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Item {
    Include(Include),
    Enum(EnumDecl),
    Interface(InterfaceDecl),
    Class(ClassDecl),
    Function(FunctionDecl),
    Variable(VarDecl),
}

/// `include <name>`
#[derive(Debug, Clone)]
pub struct Include {
    pub name: String,
    pub span: Span,
}

/// `enum Name { A, B }`. Members become global `int` constants.
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<(String, Span)>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Vec<Identifier>,
    pub methods: Vec<FunctionSignature>,
    pub span: Span,
}

/// Method declared by an interface, without a body.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub return_type_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub parent: Option<Identifier>,
    pub interfaces: Vec<Identifier>,
    pub fields: Vec<VarDecl>,
    pub methods: Vec<FunctionDecl>,
    pub span: Span,
}

/// A function or method.
///
/// `body` holds declarations and statements in source order. A `ret` that
/// closes the body is kept apart in `ret`; a `ret` anywhere else is an
/// ordinary statement.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub return_type_span: Span,
    pub body: Vec<Stmt>,
    pub ret: Option<ReturnStmt>,
    /// Scope holding the parameters.
    pub scope: Option<ScopeId>,
    /// Scope holding the top-level locals, child of `scope`.
    pub body_scope: Option<ScopeId>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ty: Type,
    pub type_span: Span,
    pub name: String,
    pub span: Span,
}
