use crate::{symbols::scope::ScopeId, Span};

use super::{
    ast::NodeId,
    expressions::{Expr, Identifier},
    types::Type,
};

#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    VarDecl(VarDecl),
    Assign {
        target: Identifier,
        value: Expr,
    },
    ArrayAssign {
        target: Identifier,
        index: Expr,
        value: Expr,
    },
    /// `receiver.field = value`
    FieldAssign {
        receiver: Expr,
        field: Identifier,
        value: Expr,
    },
    /// Only calls may stand alone as statements.
    Expression(Expr),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    For(ForLoop),
    Return(ReturnStmt),
    Block(Block),
}

/// `type name (= init)?;` as a global, a field, or a local.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub ty: Type,
    pub type_span: Span,
    pub name: String,
    pub name_span: Span,
    pub init: Option<Expr>,
}

/// `{ ... }`. The resolver records the scope it opened in `scope`.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub scope: Option<ScopeId>,
}

/// `for (init cond; update) body`. `init` lives in the loop's own scope.
#[derive(Debug, Clone)]
pub struct ForLoop {
    pub init: VarDecl,
    pub condition: Expr,
    pub update: Box<Stmt>,
    pub body: Box<Stmt>,
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}
