use crate::Span;

use super::tokens::{Token, TokenKind};

/// Pull interface the parser reads tokens through.
///
/// After the last real token, every call yields an `EOF` token.
pub trait TokenSource {
    /// Consumes and returns the next token.
    fn next_token(&mut self) -> Token;

    /// The token the next call to [`TokenSource::next_token`] will return.
    fn peek_token(&self) -> &Token;
}

/// A [`TokenSource`] over an already tokenized file.
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let needs_eof = tokens.last().map_or(true, |token| token.kind != TokenKind::EOF);
        if needs_eof {
            let span = tokens
                .last()
                .map(|token| Span::new(token.span.end.clone(), token.span.end.clone()))
                .unwrap_or_else(Span::null);

            tokens.push(Token {
                kind: TokenKind::EOF,
                value: String::from("EOF"),
                span,
            });
        }

        TokenStream { tokens, pos: 0 }
    }
}

impl TokenSource for TokenStream {
    fn next_token(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }

        token
    }

    fn peek_token(&self) -> &Token {
        &self.tokens[self.pos]
    }
}
