//! Expression parsing with an operator stack and an operand stack.
//!
//! Every nested expression (grouping, call arguments, index, array length)
//! starts by pushing a sentinel, so reductions never cross into an enclosing
//! expression. Pushing an operator first reduces every stacked operator of
//! greater or equal priority, which makes all binary operators left
//! associative.

use crate::{
    ast::{
        ast::NodeId,
        expressions::{BinaryOp, Call, Expr, ExprKind, Identifier},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::{source::TokenSource, tokens::TokenKind},
    Span,
};

use super::{lookups::Priority, parser::Parser};

#[derive(Debug, Clone)]
pub enum Operator {
    /// Bottom of one expression level.
    Sentinel,
    Binary(BinaryOp, Priority),
    /// `.` between a receiver and a method call or field name.
    Dot,
    /// `[ ]`; carries the span of the closing bracket once it is seen.
    Index(Span),
    /// `new C()`; carries the span of the `new` keyword.
    New(Span),
}

impl Operator {
    pub fn priority(&self) -> Priority {
        match self {
            Operator::Sentinel => Priority::Sentinel,
            Operator::Binary(_, priority) => *priority,
            Operator::Dot => Priority::Member,
            Operator::Index(_) => Priority::Index,
            Operator::New(_) => Priority::New,
        }
    }
}

/// Parses one complete expression.
pub fn parse_expr<S: TokenSource>(parser: &mut Parser<S>) -> Result<Expr, Error> {
    let base = parser.operands.len();
    parser.operators.push(Operator::Sentinel);

    parse_operand(parser)?;

    loop {
        let kind = parser.current_token_kind();

        if let Some((op, priority)) = parser.get_binary_lookup().get(&kind).copied() {
            parser.advance();
            push_operator(parser, Operator::Binary(op, priority))?;
            parse_operand(parser)?;
        } else if kind == TokenKind::Dot {
            parser.advance();
            push_operator(parser, Operator::Dot)?;
            parse_member(parser)?;
        } else if kind == TokenKind::OpenBracket {
            let open = parser.advance();
            push_operator(parser, Operator::Index(open.span))?;
            let index = parse_expr(parser)?;
            let close = parser.expect(TokenKind::CloseBracket)?;
            if let Some(Operator::Index(end)) = parser.operators.last_mut() {
                *end = close.span;
            }
            parser.operands.push(index);
        } else {
            break;
        }
    }

    while !matches!(parser.operators.last(), Some(Operator::Sentinel) | None) {
        pop_operator(parser)?;
    }
    parser.operators.pop();

    assert_eq!(
        parser.operands.len(),
        base + 1,
        "an expression level must reduce to exactly one operand"
    );
    Ok(pop_operand(parser))
}

fn push_operator<S: TokenSource>(parser: &mut Parser<S>, operator: Operator) -> Result<(), Error> {
    let priority = operator.priority();

    while let Some(top) = parser.operators.last() {
        if matches!(top, Operator::Sentinel) || top.priority() < priority {
            break;
        }
        pop_operator(parser)?;
    }

    parser.operators.push(operator);
    Ok(())
}

fn pop_operand<S: TokenSource>(parser: &mut Parser<S>) -> Expr {
    parser
        .operands
        .pop()
        .expect("operator reduced with an empty operand stack")
}

/// Reduces the top operator with its operands.
fn pop_operator<S: TokenSource>(parser: &mut Parser<S>) -> Result<(), Error> {
    let Some(operator) = parser.operators.pop() else {
        return Ok(());
    };

    let reduced = match operator {
        Operator::Sentinel => unreachable!("sentinels are only removed by parse_expr"),
        Operator::Binary(op, _) => {
            let rhs = pop_operand(parser);
            let lhs = pop_operand(parser);
            let span = lhs.span.to(&rhs.span);
            Expr::new(
                parser.advance_id(),
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            )
        }
        Operator::Dot => {
            let rhs = pop_operand(parser);
            let lhs = pop_operand(parser);
            let span = lhs.span.to(&rhs.span);
            let kind = match rhs.kind {
                ExprKind::Call(mut call) => {
                    call.receiver = Some(Box::new(lhs));
                    ExprKind::Call(call)
                }
                ExprKind::Identifier(field) => ExprKind::FieldAccess {
                    receiver: Box::new(lhs),
                    field,
                },
                _ => {
                    return Err(Error::new(
                        ErrorImpl::UnexpectedTokenDetailed {
                            found: TokenKind::Dot,
                            value: String::from("."),
                            message: String::from("expected a method call or field name after `.`"),
                        },
                        rhs.span.start.clone(),
                    ))
                }
            };
            Expr::new(rhs.id, kind, span)
        }
        Operator::Index(close) => {
            let index = pop_operand(parser);
            let array = pop_operand(parser);
            let span = array.span.to(&close);
            Expr::new(
                parser.advance_id(),
                ExprKind::Index {
                    array: Box::new(array),
                    index: Box::new(index),
                },
                span,
            )
        }
        Operator::New(keyword) => {
            let operand = pop_operand(parser);
            let span = keyword.to(&operand.span);
            let ExprKind::Identifier(class) = operand.kind else {
                unreachable!("`new` always reduces a class name pushed right after it")
            };
            Expr::new(operand.id, ExprKind::NewInstance { class }, span)
        }
    };

    parser.operands.push(reduced);
    Ok(())
}

fn push_expr<S: TokenSource>(parser: &mut Parser<S>, id: NodeId, kind: ExprKind, span: Span) {
    parser.operands.push(Expr::new(id, kind, span));
}

/// Parses a primary operand and pushes it on the operand stack.
fn parse_operand<S: TokenSource>(parser: &mut Parser<S>) -> Result<(), Error> {
    let start = parser.get_position();
    let id = parser.advance_id();

    match parser.current_token_kind() {
        TokenKind::Number => {
            let token = parser.advance();
            let value = token.value.parse::<i64>().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError {
                        token: token.value.clone(),
                    },
                    token.span.start.clone(),
                )
            })?;
            push_expr(parser, id, ExprKind::IntLiteral(value), token.span);
        }
        TokenKind::String => {
            let token = parser.advance();
            push_expr(parser, id, ExprKind::StringLiteral(token.value), token.span);
        }
        TokenKind::True | TokenKind::False => {
            let token = parser.advance();
            let value = token.kind == TokenKind::True;
            push_expr(parser, id, ExprKind::BoolLiteral(value), token.span);
        }
        TokenKind::Identifier => {
            let token = parser.advance();
            let name = Identifier::new(token.value, token.span.clone());

            if parser.current_token_kind() == TokenKind::OpenParen {
                let args = parse_args(parser)?;
                let span = parser.span_from(&start);
                let call = Call {
                    receiver: None,
                    name,
                    args,
                };
                push_expr(parser, id, ExprKind::Call(call), span);
            } else {
                push_expr(parser, id, ExprKind::Identifier(name), token.span);
            }
        }
        TokenKind::OpenParen => {
            parser.advance();
            let inner = parse_expr(parser)?;
            parser.expect(TokenKind::CloseParen)?;
            parser.operands.push(inner);
        }
        TokenKind::OpenBracket => {
            parser.advance();
            let elements = parse_list(parser, TokenKind::CloseBracket)?;
            parser.expect(TokenKind::CloseBracket)?;
            let span = parser.span_from(&start);
            push_expr(parser, id, ExprKind::ArrayLiteral(elements), span);
        }
        TokenKind::New => parse_new(parser, id)?,
        _ => return Err(parser.unexpected("expected an expression")),
    }

    Ok(())
}

/// `new C()` goes through the operator stack; `new int[n]` and
/// `new string[n]` are complete operands on their own.
fn parse_new<S: TokenSource>(parser: &mut Parser<S>, id: NodeId) -> Result<(), Error> {
    let keyword = parser.expect(TokenKind::New)?;
    let start = keyword.span.start.clone();

    match parser.current_token_kind() {
        TokenKind::Identifier => {
            let class = parser.advance();
            parser.expect(TokenKind::OpenParen)?;
            parser.expect(TokenKind::CloseParen)?;
            let span = parser.span_from(&class.span.start);

            push_operator(parser, Operator::New(keyword.span))?;
            let name = Identifier::new(class.value, class.span);
            push_expr(parser, id, ExprKind::Identifier(name), span);
        }
        TokenKind::IntType | TokenKind::StringType => {
            let element = if parser.advance().kind == TokenKind::IntType {
                Type::Int
            } else {
                Type::Str
            };
            parser.expect(TokenKind::OpenBracket)?;
            let length = parse_expr(parser)?;
            parser.expect(TokenKind::CloseBracket)?;
            let span = parser.span_from(&start);

            let kind = ExprKind::NewArray {
                element,
                length: Box::new(length),
            };
            push_expr(parser, id, kind, span);
        }
        _ => return Err(parser.unexpected("expected a class name, `int` or `string` after `new`")),
    }

    Ok(())
}

/// Right-hand side of `.`: a method call or a field name.
fn parse_member<S: TokenSource>(parser: &mut Parser<S>) -> Result<(), Error> {
    let id = parser.advance_id();
    let token = parser.expect_error(
        TokenKind::Identifier,
        Some(parser.unexpected("expected a method call or field name after `.`")),
    )?;
    let name = Identifier::new(token.value, token.span.clone());

    if parser.current_token_kind() == TokenKind::OpenParen {
        let args = parse_args(parser)?;
        let span = parser.span_from(&token.span.start);
        let call = Call {
            receiver: None,
            name,
            args,
        };
        push_expr(parser, id, ExprKind::Call(call), span);
    } else {
        push_expr(parser, id, ExprKind::Identifier(name), token.span);
    }

    Ok(())
}

/// `( expr, ... )`
pub fn parse_args<S: TokenSource>(parser: &mut Parser<S>) -> Result<Vec<Expr>, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let args = parse_list(parser, TokenKind::CloseParen)?;
    parser.expect(TokenKind::CloseParen)?;
    Ok(args)
}

/// Comma separated expressions up to, not including, `close`.
fn parse_list<S: TokenSource>(parser: &mut Parser<S>, close: TokenKind) -> Result<Vec<Expr>, Error> {
    let mut exprs = vec![];
    if parser.current_token_kind() == close {
        return Ok(exprs);
    }

    loop {
        exprs.push(parse_expr(parser)?);
        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
    }

    Ok(exprs)
}
