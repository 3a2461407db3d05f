use crate::{
    ast::{
        ast::{
            ClassDecl, EnumDecl, FunctionDecl, FunctionSignature, Include, InterfaceDecl, Item,
            Param,
        },
        expressions::{ExprKind, Identifier},
        statements::{Block, ForLoop, ReturnStmt, Stmt, StmtKind, VarDecl},
    },
    errors::errors::Error,
    lexer::{source::TokenSource, tokens::TokenKind},
};

use super::{
    expr::parse_expr,
    parser::Parser,
    types::{is_var_decl_start, parse_type},
};

/// Parses one top-level declaration.
pub fn parse_item<S: TokenSource>(parser: &mut Parser<S>) -> Result<Item, Error> {
    let kind = parser.current_token_kind();
    if let Some(handler) = parser.get_item_lookup().get(&kind).copied() {
        return handler(parser);
    }

    if is_var_decl_start(parser) {
        return Ok(Item::Variable(parse_var_decl(parser)?));
    }

    Err(parser.unexpected("expected a declaration"))
}

/// `include <name>`
pub fn parse_include<S: TokenSource>(parser: &mut Parser<S>) -> Result<Item, Error> {
    let start = parser.expect(TokenKind::Include)?.span.start;
    parser.expect(TokenKind::Less)?;
    let name = parser.expect(TokenKind::Identifier)?.value;
    parser.expect(TokenKind::Greater)?;

    Ok(Item::Include(Include {
        name,
        span: parser.span_from(&start),
    }))
}

/// `enum Name { A, B, }`
pub fn parse_enum<S: TokenSource>(parser: &mut Parser<S>) -> Result<Item, Error> {
    parser.expect(TokenKind::Enum)?;
    let name = parser.expect(TokenKind::Identifier)?;
    parser.expect(TokenKind::OpenCurly)?;

    let mut members = vec![];
    while parser.current_token_kind() == TokenKind::Identifier {
        let member = parser.advance();
        members.push((member.value, member.span));

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(Item::Enum(EnumDecl {
        name: name.value,
        members,
        span: name.span,
    }))
}

/// `interface I ext J, K { fn m(int a): int; }`
pub fn parse_interface<S: TokenSource>(parser: &mut Parser<S>) -> Result<Item, Error> {
    parser.expect(TokenKind::Interface)?;
    let name = parser.expect(TokenKind::Identifier)?;

    let mut extends = vec![];
    if parser.current_token_kind() == TokenKind::Ext {
        parser.advance();
        extends = parse_name_list(parser)?;
    }

    parser.expect(TokenKind::OpenCurly)?;
    let mut methods = vec![];
    while parser.current_token_kind() == TokenKind::Fn {
        methods.push(parse_signature(parser)?);
        parser.expect(TokenKind::Semicolon)?;
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(Item::Interface(InterfaceDecl {
        name: name.value,
        extends,
        methods,
        span: name.span,
    }))
}

/// `class C ext P use I, J { fields and methods }`
pub fn parse_class<S: TokenSource>(parser: &mut Parser<S>) -> Result<Item, Error> {
    parser.expect(TokenKind::Class)?;
    let name = parser.expect(TokenKind::Identifier)?;

    let mut parent = None;
    if parser.current_token_kind() == TokenKind::Ext {
        parser.advance();
        let token = parser.expect(TokenKind::Identifier)?;
        parent = Some(Identifier::new(token.value, token.span));
    }

    let mut interfaces = vec![];
    if parser.current_token_kind() == TokenKind::Use {
        parser.advance();
        interfaces = parse_name_list(parser)?;
    }

    parser.expect(TokenKind::OpenCurly)?;
    let mut fields = vec![];
    let mut methods = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if parser.current_token_kind() == TokenKind::Fn {
            methods.push(parse_function(parser)?);
        } else if is_var_decl_start(parser) {
            fields.push(parse_var_decl(parser)?);
        } else {
            return Err(parser.unexpected("expected a field or method declaration"));
        }
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(Item::Class(ClassDecl {
        name: name.value,
        parent,
        interfaces,
        fields,
        methods,
        span: name.span,
    }))
}

fn parse_name_list<S: TokenSource>(parser: &mut Parser<S>) -> Result<Vec<Identifier>, Error> {
    let mut names = vec![];
    loop {
        let token = parser.expect(TokenKind::Identifier)?;
        names.push(Identifier::new(token.value, token.span));

        if parser.current_token_kind() != TokenKind::Comma {
            return Ok(names);
        }
        parser.advance();
    }
}

pub fn parse_fn_item<S: TokenSource>(parser: &mut Parser<S>) -> Result<Item, Error> {
    Ok(Item::Function(parse_function(parser)?))
}

/// `fn name(type a, ...): type`
pub fn parse_signature<S: TokenSource>(parser: &mut Parser<S>) -> Result<FunctionSignature, Error> {
    parser.expect(TokenKind::Fn)?;
    let name = parser.expect(TokenKind::Identifier)?;
    let params = parse_params(parser)?;
    parser.expect(TokenKind::Colon)?;
    let (return_type, return_type_span) = parse_type(parser)?;

    Ok(FunctionSignature {
        name: name.value,
        params,
        return_type,
        return_type_span,
        span: name.span,
    })
}

/// A function or method with its body.
///
/// A `ret` directly followed by the closing brace is the trailing return and
/// is stored apart from the body.
pub fn parse_function<S: TokenSource>(parser: &mut Parser<S>) -> Result<FunctionDecl, Error> {
    let id = parser.advance_id();
    let signature = parse_signature(parser)?;

    parser.expect(TokenKind::OpenCurly)?;
    let mut body = vec![];
    let mut ret = None;
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected("expected `}` to close the function body"));
        }

        if parser.current_token_kind() == TokenKind::Ret {
            let stmt_id = parser.advance_id();
            let stmt = parse_return(parser)?;
            if parser.current_token_kind() == TokenKind::CloseCurly {
                ret = Some(stmt);
            } else {
                let span = stmt.span.clone();
                body.push(Stmt {
                    id: stmt_id,
                    kind: StmtKind::Return(stmt),
                    span,
                });
            }
        } else {
            body.push(parse_body_item(parser)?);
        }
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(FunctionDecl {
        id,
        name: signature.name,
        params: signature.params,
        return_type: signature.return_type,
        return_type_span: signature.return_type_span,
        body,
        ret,
        scope: None,
        body_scope: None,
        span: signature.span,
    })
}

fn parse_params<S: TokenSource>(parser: &mut Parser<S>) -> Result<Vec<Param>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut params = vec![];
    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            let (ty, type_span) = parse_type(parser)?;
            let name = parser.expect(TokenKind::Identifier)?;
            params.push(Param {
                ty,
                type_span,
                name: name.value,
                span: name.span,
            });

            if parser.current_token_kind() != TokenKind::Comma {
                break;
            }
            parser.advance();
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    Ok(params)
}

/// `type name (= expr)?;`
pub fn parse_var_decl<S: TokenSource>(parser: &mut Parser<S>) -> Result<VarDecl, Error> {
    let (ty, type_span) = parse_type(parser)?;
    let name = parser.expect(TokenKind::Identifier)?;

    let mut init = None;
    if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        init = Some(parse_expr(parser)?);
    }
    parser.expect(TokenKind::Semicolon)?;

    Ok(VarDecl {
        ty,
        type_span,
        name: name.value,
        name_span: name.span,
        init,
    })
}

/// A declaration or a statement, as allowed directly inside a function body
/// or a block.
pub fn parse_body_item<S: TokenSource>(parser: &mut Parser<S>) -> Result<Stmt, Error> {
    if is_var_decl_start(parser) {
        let start = parser.get_position();
        let id = parser.advance_id();
        let var = parse_var_decl(parser)?;
        return Ok(Stmt {
            id,
            kind: StmtKind::VarDecl(var),
            span: parser.span_from(&start),
        });
    }

    parse_stmt(parser)
}

pub fn parse_stmt<S: TokenSource>(parser: &mut Parser<S>) -> Result<Stmt, Error> {
    let kind = parser.current_token_kind();
    if let Some(handler) = parser.get_stmt_lookup().get(&kind).copied() {
        return handler(parser);
    }

    if kind == TokenKind::Identifier {
        return parse_identifier_stmt(parser);
    }

    Err(parser.unexpected("expected a statement"))
}

/// `{ ... }`
pub fn parse_block_stmt<S: TokenSource>(parser: &mut Parser<S>) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let id = parser.advance_id();
    parser.expect(TokenKind::OpenCurly)?;

    let mut stmts = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected("expected `}` to close the block"));
        }
        stmts.push(parse_body_item(parser)?);
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt {
        id,
        kind: StmtKind::Block(Block { stmts, scope: None }),
        span: parser.span_from(&start),
    })
}

/// `if (cond) stmt (else stmt)?`
pub fn parse_if_stmt<S: TokenSource>(parser: &mut Parser<S>) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let id = parser.advance_id();
    parser.expect(TokenKind::If)?;
    parser.expect(TokenKind::OpenParen)?;
    let condition = parse_expr(parser)?;
    parser.expect(TokenKind::CloseParen)?;
    let then_branch = Box::new(parse_stmt(parser)?);

    let mut else_branch = None;
    if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        else_branch = Some(Box::new(parse_stmt(parser)?));
    }

    Ok(Stmt {
        id,
        kind: StmtKind::If {
            condition,
            then_branch,
            else_branch,
        },
        span: parser.span_from(&start),
    })
}

/// `while (cond) stmt`
pub fn parse_while_stmt<S: TokenSource>(parser: &mut Parser<S>) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let id = parser.advance_id();
    parser.expect(TokenKind::While)?;
    parser.expect(TokenKind::OpenParen)?;
    let condition = parse_expr(parser)?;
    parser.expect(TokenKind::CloseParen)?;
    let body = Box::new(parse_stmt(parser)?);

    Ok(Stmt {
        id,
        kind: StmtKind::While { condition, body },
        span: parser.span_from(&start),
    })
}

/// `for (type i = e; cond; i = e) stmt`
pub fn parse_for_stmt<S: TokenSource>(parser: &mut Parser<S>) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let id = parser.advance_id();
    parser.expect(TokenKind::For)?;
    parser.expect(TokenKind::OpenParen)?;

    if !is_var_decl_start(parser) {
        return Err(parser.unexpected("expected a variable declaration to start the loop"));
    }
    let init = parse_var_decl(parser)?;
    let condition = parse_expr(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    if parser.current_token_kind() != TokenKind::Identifier {
        return Err(parser.unexpected("expected an assignment to update the loop"));
    }
    let update = Box::new(parse_assignment(parser)?);
    parser.expect(TokenKind::CloseParen)?;
    let body = Box::new(parse_stmt(parser)?);

    Ok(Stmt {
        id,
        kind: StmtKind::For(ForLoop {
            init,
            condition,
            update,
            body,
            scope: None,
        }),
        span: parser.span_from(&start),
    })
}

pub fn parse_return_stmt<S: TokenSource>(parser: &mut Parser<S>) -> Result<Stmt, Error> {
    let id = parser.advance_id();
    let ret = parse_return(parser)?;
    let span = ret.span.clone();

    Ok(Stmt {
        id,
        kind: StmtKind::Return(ret),
        span,
    })
}

/// `ret expr?;`
fn parse_return<S: TokenSource>(parser: &mut Parser<S>) -> Result<ReturnStmt, Error> {
    let start = parser.expect(TokenKind::Ret)?.span.start;

    let mut value = None;
    if parser.current_token_kind() != TokenKind::Semicolon {
        value = Some(parse_expr(parser)?);
    }
    parser.expect(TokenKind::Semicolon)?;

    Ok(ReturnStmt {
        value,
        span: parser.span_from(&start),
    })
}

/// Assignment, array assignment, field assignment or call statement.
fn parse_identifier_stmt<S: TokenSource>(parser: &mut Parser<S>) -> Result<Stmt, Error> {
    if matches!(
        parser.peek_token_kind(),
        TokenKind::Assignment | TokenKind::OpenBracket
    ) {
        let stmt = parse_assignment(parser)?;
        parser.expect(TokenKind::Semicolon)?;
        let span = parser.span_from(&stmt.span.start);
        return Ok(Stmt { span, ..stmt });
    }

    let start = parser.get_position();
    let id = parser.advance_id();
    let expr = parse_expr(parser)?;

    let kind = if parser.current_token_kind() == TokenKind::Assignment {
        let ExprKind::FieldAccess { receiver, field } = expr.kind else {
            return Err(parser.unexpected("only variables, array elements and fields can be assigned"));
        };
        parser.advance();
        StmtKind::FieldAssign {
            receiver: *receiver,
            field,
            value: parse_expr(parser)?,
        }
    } else if expr.is_call() {
        StmtKind::Expression(expr)
    } else {
        return Err(parser.unexpected("only calls can be used as statements"));
    };
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt {
        id,
        kind,
        span: parser.span_from(&start),
    })
}

/// `name = expr` or `name[expr] = expr`, without the semicolon.
fn parse_assignment<S: TokenSource>(parser: &mut Parser<S>) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let id = parser.advance_id();
    let name = parser.expect(TokenKind::Identifier)?;
    let target = Identifier::new(name.value, name.span);

    let mut index = None;
    if parser.current_token_kind() == TokenKind::OpenBracket {
        parser.advance();
        index = Some(parse_expr(parser)?);
        parser.expect(TokenKind::CloseBracket)?;
    }

    parser.expect(TokenKind::Assignment)?;
    let value = parse_expr(parser)?;

    let kind = match index {
        Some(index) => StmtKind::ArrayAssign {
            target,
            index,
            value,
        },
        None => StmtKind::Assign { target, value },
    };

    Ok(Stmt {
        id,
        kind,
        span: parser.span_from(&start),
    })
}
