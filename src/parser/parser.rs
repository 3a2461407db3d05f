//! Parser state and entry point.
//!
//! Declarations and statements are parsed by recursive descent, dispatched
//! through lookup tables keyed by the leading token. Expressions are parsed
//! with an operator stack and an operand stack (see [`super::expr`]).

use std::{collections::HashMap, rc::Rc};

use tracing::debug;

use crate::{
    ast::{
        ast::{NodeId, Program},
        expressions::{BinaryOp, Expr},
    },
    errors::errors::{Error, ErrorImpl, ParseError},
    lexer::{
        source::{TokenSource, TokenStream},
        tokens::{Token, TokenKind},
    },
    Position, Span,
};

use super::{
    expr::Operator,
    lookups::{
        create_token_lookups, BinaryLookup, ItemHandler, ItemLookup, Priority, StmtHandler,
        StmtLookup,
    },
    stmt::parse_item,
};

/// The main parser structure that maintains parsing state.
pub struct Parser<S: TokenSource> {
    /// Where tokens come from
    source: S,
    /// The token under the cursor
    current: Token,
    /// End of the last consumed token, used to close spans
    previous_end: Position,
    /// The name of the source file being parsed
    file: Rc<String>,
    /// Handlers for top-level declarations
    item_lookup: ItemLookup<S>,
    /// Handlers for keyword-led statements
    stmt_lookup: StmtLookup<S>,
    /// Binary operators and their priorities
    binary_lookup: BinaryLookup,
    /// Pending operators; each expression level starts with a sentinel
    pub(super) operators: Vec<Operator>,
    /// Operands waiting for their operator
    pub(super) operands: Vec<Expr>,
    /// Counter for generating unique node ids
    current_id: u32,
}

impl<S: TokenSource> Parser<S> {
    /// Creates a new Parser instance.
    ///
    /// # Arguments
    ///
    /// * `source` - Token source to read from
    /// * `file` - Reference-counted string containing the source file name
    pub fn new(mut source: S, file: Rc<String>) -> Self {
        let current = source.next_token();
        let previous_end = current.span.start.clone();

        Parser {
            source,
            current,
            previous_end,
            file,
            item_lookup: HashMap::new(),
            stmt_lookup: HashMap::new(),
            binary_lookup: HashMap::new(),
            operators: vec![],
            operands: vec![],
            current_id: 1024, // Give some space for reserved ids
        }
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current.kind
    }

    /// Returns the kind of the token after the current one.
    pub fn peek_token_kind(&self) -> TokenKind {
        self.source.peek_token().kind
    }

    /// Advances to the next token and returns the one that was current.
    pub fn advance(&mut self) -> Token {
        let next = self.source.next_token();
        let token = std::mem::replace(&mut self.current, next);
        self.previous_end = token.span.end.clone();
        token
    }

    /// Expects a token of the specified kind, with optional custom error.
    ///
    /// # Returns
    ///
    /// Returns Ok(Token) if the current token matches, otherwise returns an Error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        if self.current.kind == expected_kind {
            return Ok(self.advance());
        }

        match error {
            Some(error) => Err(error),
            None => Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    found: self.current.kind,
                    value: self.current.value.clone(),
                    expected: expected_kind,
                },
                self.current.span.start.clone(),
            )),
        }
    }

    /// Expects a token of the specified kind with default error message.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Builds an error for the current token.
    pub fn unexpected(&self, message: &str) -> Error {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                found: self.current.kind,
                value: self.current.value.clone(),
                message: message.to_string(),
            },
            self.current.span.start.clone(),
        )
    }

    /// Returns true while the current token is not EOF.
    pub fn has_tokens(&self) -> bool {
        self.current.kind != TokenKind::EOF
    }

    pub fn get_item_lookup(&self) -> &ItemLookup<S> {
        &self.item_lookup
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup<S> {
        &self.stmt_lookup
    }

    pub fn get_binary_lookup(&self) -> &BinaryLookup {
        &self.binary_lookup
    }

    /// Registers a handler for a declaration led by `kind`.
    pub fn item(&mut self, kind: TokenKind, item_fn: ItemHandler<S>) {
        self.item_lookup.insert(kind, item_fn);
    }

    /// Registers a handler for a statement led by `kind`.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler<S>) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    /// Registers a binary operator.
    ///
    /// # Arguments
    ///
    /// * `kind` - The operator token
    /// * `op` - The AST operator it produces
    /// * `priority` - Its precedence; equal priorities associate to the left
    pub fn binary(&mut self, kind: TokenKind, op: BinaryOp, priority: Priority) {
        self.binary_lookup.insert(kind, (op, priority));
    }

    /// Advances the internal ID counter and returns the previous value.
    pub fn advance_id(&mut self) -> NodeId {
        let id = self.current_id;
        self.current_id += 1;
        NodeId(id)
    }

    /// Returns the start of the current token.
    pub fn get_position(&self) -> Position {
        self.current.span.start.clone()
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: &Position) -> Span {
        Span::new(start.clone(), self.previous_end.clone())
    }

    pub fn get_file(&self) -> Rc<String> {
        Rc::clone(&self.file)
    }
}

/// Parses a tokenized file into a [`Program`].
///
/// # Arguments
///
/// * `tokens` - Tokens as produced by [`crate::lexer::lexer::tokenize`]
/// * `file` - Reference-counted string containing the source file name
///
/// # Returns
///
/// The program, or the first syntax error.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> Result<Program, ParseError> {
    parse_from(TokenStream::new(tokens), file)
}

/// Like [`parse`], reading from any [`TokenSource`].
pub fn parse_from<S: TokenSource>(source: S, file: Rc<String>) -> Result<Program, ParseError> {
    let mut parser = Parser::new(source, file);
    create_token_lookups(&mut parser);

    let mut items = vec![];
    while parser.has_tokens() {
        items.push(parse_item(&mut parser)?);
    }

    let file = parser.get_file();
    debug!(file = %file, items = items.len(), "parse finished");
    Ok(Program {
        file,
        items,
        scopes: vec![],
    })
}
