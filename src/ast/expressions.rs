use crate::{symbols::binding::Binding, Span};

use super::{ast::NodeId, types::Type};

/// Expression node. `resolved_type` is filled in by the type checker.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
    pub resolved_type: Option<Type>,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind, span: Span) -> Self {
        Expr {
            id,
            kind,
            span,
            resolved_type: None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call(_))
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i64),
    StringLiteral(String),
    BoolLiteral(bool),
    Identifier(Identifier),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call(Call),
    FieldAccess {
        receiver: Box<Expr>,
        field: Identifier,
    },
    /// `new C()`
    NewInstance {
        class: Identifier,
    },
    /// `new int[n]` / `new string[n]`; `element` is the element type.
    NewArray {
        element: Type,
        length: Box<Expr>,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
}

/// A use of a name. `binding` is set by the name resolver.
#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
    pub binding: Option<Binding>,
}

impl Identifier {
    pub fn new(name: String, span: Span) -> Self {
        Identifier {
            name,
            span,
            binding: None,
        }
    }
}

/// Free function call, or method call when `receiver` is set.
#[derive(Debug, Clone)]
pub struct Call {
    pub receiver: Option<Box<Expr>>,
    pub name: Identifier,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Plus,
    Minus,
    Modulus,
    Times,
    Divide,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEquals => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEquals => ">=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Modulus => "%",
            BinaryOp::Times => "*",
            BinaryOp::Divide => "/",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::And)
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equals | BinaryOp::NotEquals)
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::LessEquals | BinaryOp::Greater | BinaryOp::GreaterEquals
        )
    }

    /// Integer arithmetic other than `+`, which also concatenates.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Minus | BinaryOp::Modulus | BinaryOp::Times | BinaryOp::Divide
        )
    }
}
