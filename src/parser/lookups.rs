use std::collections::HashMap;

use crate::{
    ast::{ast::Item, expressions::BinaryOp, statements::Stmt},
    errors::errors::Error,
    lexer::{source::TokenSource, tokens::TokenKind},
};

use super::{parser::Parser, stmt::*};

/// Operator priorities, lowest first. Equal priorities associate to the
/// left: pushing an operator first reduces every stacked operator whose
/// priority is greater than or equal to its own.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub enum Priority {
    Sentinel,
    Or,
    And,
    Relational,
    Additive,
    Multiplicative,
    Index,
    Member,
    New,
}

pub type ItemHandler<S> = fn(&mut Parser<S>) -> Result<Item, Error>;
pub type StmtHandler<S> = fn(&mut Parser<S>) -> Result<Stmt, Error>;

pub fn create_token_lookups<S: TokenSource>(parser: &mut Parser<S>) {
    // Logical
    parser.binary(TokenKind::Or, BinaryOp::Or, Priority::Or);
    parser.binary(TokenKind::And, BinaryOp::And, Priority::And);

    // Relational
    parser.binary(TokenKind::Equals, BinaryOp::Equals, Priority::Relational);
    parser.binary(TokenKind::NotEquals, BinaryOp::NotEquals, Priority::Relational);
    parser.binary(TokenKind::Less, BinaryOp::Less, Priority::Relational);
    parser.binary(TokenKind::LessEquals, BinaryOp::LessEquals, Priority::Relational);
    parser.binary(TokenKind::Greater, BinaryOp::Greater, Priority::Relational);
    parser.binary(TokenKind::GreaterEquals, BinaryOp::GreaterEquals, Priority::Relational);

    // Additive and multiplicative
    parser.binary(TokenKind::Plus, BinaryOp::Plus, Priority::Additive);
    parser.binary(TokenKind::Dash, BinaryOp::Minus, Priority::Additive);
    parser.binary(TokenKind::Percent, BinaryOp::Modulus, Priority::Additive);
    parser.binary(TokenKind::Star, BinaryOp::Times, Priority::Multiplicative);
    parser.binary(TokenKind::Slash, BinaryOp::Divide, Priority::Multiplicative);

    // Declarations
    parser.item(TokenKind::Include, parse_include);
    parser.item(TokenKind::Enum, parse_enum);
    parser.item(TokenKind::Interface, parse_interface);
    parser.item(TokenKind::Class, parse_class);
    parser.item(TokenKind::Fn, parse_fn_item);

    // Statements
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::While, parse_while_stmt);
    parser.stmt(TokenKind::For, parse_for_stmt);
    parser.stmt(TokenKind::Ret, parse_return_stmt);
    parser.stmt(TokenKind::OpenCurly, parse_block_stmt);
}

pub type ItemLookup<S> = HashMap<TokenKind, ItemHandler<S>>;
pub type StmtLookup<S> = HashMap<TokenKind, StmtHandler<S>>;
pub type BinaryLookup = HashMap<TokenKind, (BinaryOp, Priority)>;
