use crate::{
    ast::types::Type,
    errors::errors::Error,
    lexer::{source::TokenSource, tokens::TokenKind},
    Span,
};

use super::parser::Parser;

/// `int`, `int[]`, `string`, `string[]`, `bool`, `void` or a class or
/// interface name.
pub fn parse_type<S: TokenSource>(parser: &mut Parser<S>) -> Result<(Type, Span), Error> {
    let start = parser.get_position();

    let ty = match parser.current_token_kind() {
        TokenKind::IntType => {
            parser.advance();
            array_suffix(parser, Type::Int)?
        }
        TokenKind::StringType => {
            parser.advance();
            array_suffix(parser, Type::Str)?
        }
        TokenKind::BoolType => {
            parser.advance();
            Type::Bool
        }
        TokenKind::VoidType => {
            parser.advance();
            Type::Void
        }
        TokenKind::Identifier => Type::Named(parser.advance().value),
        _ => return Err(parser.unexpected("expected a type")),
    };

    Ok((ty, parser.span_from(&start)))
}

fn array_suffix<S: TokenSource>(parser: &mut Parser<S>, element: Type) -> Result<Type, Error> {
    if parser.current_token_kind() != TokenKind::OpenBracket {
        return Ok(element);
    }

    parser.advance();
    parser.expect(TokenKind::CloseBracket)?;
    Ok(Type::array_of(&element).unwrap_or(element))
}

/// Whether the upcoming tokens start a variable declaration: a builtin type
/// keyword, or two identifiers in a row (`Point p`).
pub fn is_var_decl_start<S: TokenSource>(parser: &Parser<S>) -> bool {
    match parser.current_token_kind() {
        TokenKind::IntType | TokenKind::StringType | TokenKind::BoolType | TokenKind::VoidType => true,
        TokenKind::Identifier => parser.peek_token_kind() == TokenKind::Identifier,
        _ => false,
    }
}
