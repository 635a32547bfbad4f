//! Pratt parser.
//!
//! Builds a [`Program`] from any [`TokenSource`]. Parsing never stops at
//! the first problem: each failure records a [`ParseError`], drops the
//! statement it happened in, and resumes at the next statement boundary.

use crate::parser::ast::{
    BlockStatement, Expression, Identifier, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::parser::error::{ParseError, ParseErrors};
use crate::parser::lexer::Lexer;
use crate::parser::token::{Span, Token, TokenKind, TokenSource};
use crate::{STACK_GROW_SIZE, STACK_RED_ZONE};
use std::collections::HashMap;

/// Binding power of operators, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,      // ==
    LessGreater, // > or <
    Sum,         // +
    Product,     // *
    Prefix,      // -X or !X
    Call,        // myFunction(X), array[X]
}

impl Precedence {
    pub fn of(kind: TokenKind) -> Precedence {
        match kind {
            TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
            TokenKind::LParen | TokenKind::LBracket => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

type PrefixParseFn<S> = fn(&mut Parser<S>) -> Option<Expression>;
type InfixParseFn<S> = fn(&mut Parser<S>, Expression) -> Option<Expression>;

pub struct Parser<S> {
    source: S,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
    /// Nesting depth of braced blocks being parsed
    depth: usize,
    prefix_fns: HashMap<TokenKind, PrefixParseFn<S>>,
    infix_fns: HashMap<TokenKind, InfixParseFn<S>>,
}

impl Parser<Lexer> {
    /// Create a parser over source text
    pub fn from_source(input: &str) -> Self {
        Parser::new(Lexer::new(input))
    }
}

impl<S: TokenSource> Parser<S> {
    pub fn new(source: S) -> Self {
        let mut parser = Parser {
            source,
            current: Token::eof(),
            peek: Token::eof(),
            errors: Vec::new(),
            depth: 0,
            prefix_fns: HashMap::new(),
            infix_fns: HashMap::new(),
        };

        parser.register_prefix(TokenKind::Ident, Self::parse_identifier);
        parser.register_prefix(TokenKind::Int, Self::parse_integer_literal);
        parser.register_prefix(TokenKind::String, Self::parse_string_literal);
        parser.register_prefix(TokenKind::True, Self::parse_boolean);
        parser.register_prefix(TokenKind::False, Self::parse_boolean);
        parser.register_prefix(TokenKind::Bang, Self::parse_prefix_expression);
        parser.register_prefix(TokenKind::Minus, Self::parse_prefix_expression);
        parser.register_prefix(TokenKind::LParen, Self::parse_grouped_expression);
        parser.register_prefix(TokenKind::LBracket, Self::parse_array_literal);
        parser.register_prefix(TokenKind::If, Self::parse_if_expression);
        parser.register_prefix(TokenKind::Function, Self::parse_function_literal);

        for kind in [
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Asterisk,
            TokenKind::Slash,
            TokenKind::Eq,
            TokenKind::NotEq,
            TokenKind::Lt,
            TokenKind::Gt,
        ] {
            parser.register_infix(kind, Self::parse_infix_expression);
        }
        parser.register_infix(TokenKind::LParen, Self::parse_call_expression);
        parser.register_infix(TokenKind::LBracket, Self::parse_index_expression);

        // Fill both current and peek
        parser.next_token();
        parser.next_token();
        parser
    }

    fn register_prefix(&mut self, kind: TokenKind, f: PrefixParseFn<S>) {
        self.prefix_fns.insert(kind, f);
    }

    fn register_infix(&mut self, kind: TokenKind, f: InfixParseFn<S>) {
        self.infix_fns.insert(kind, f);
    }

    /// Diagnostics recorded so far
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Diagnostics as plain text lines
    pub fn diagnostics(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    fn next_token(&mut self) {
        let next = self.source.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current.is(kind)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    fn peek_precedence(&self) -> Precedence {
        Precedence::of(self.peek.kind)
    }

    fn current_precedence(&self) -> Precedence {
        Precedence::of(self.current.kind)
    }

    /// Advance if the next token has the given kind, else record a diagnostic
    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.peek_error(kind);
            false
        }
    }

    fn push_error(&mut self, message: String, span: Span) {
        tracing::debug!(%span, "{}", message);
        self.errors.push(ParseError::new(message, span));
    }

    fn peek_error(&mut self, kind: TokenKind) {
        let message = format!(
            "expected next token to be {}, got {} instead",
            kind, self.peek.kind
        );
        self.push_error(message, self.peek.span);
    }

    fn no_prefix_parse_fn_error(&mut self) {
        let message = format!("no prefix parse function for {} found", self.current.kind);
        self.push_error(message, self.current.span);
    }

    /// Skip ahead after a failed statement: stop on `;`, before a token
    /// that starts a new statement, before the `}` closing the enclosing
    /// block, or at end of input.
    fn synchronize(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Semicolon | TokenKind::Eof => return,
                TokenKind::RBrace if self.depth > 0 => return,
                _ => {}
            }
            if matches!(
                self.peek.kind,
                TokenKind::Let | TokenKind::Return | TokenKind::Eof
            ) || (self.depth > 0 && self.peek_is(TokenKind::RBrace))
            {
                return;
            }
            self.next_token();
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Parse a complete program (sequence of statements)
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::new();

        while !self.current_is(TokenKind::Eof) {
            // Empty statements
            if self.current_is(TokenKind::Semicolon) {
                self.next_token();
                continue;
            }

            match self.parse_statement() {
                Some(stmt) => program.push(stmt),
                None => self.synchronize(),
            }
            self.next_token();
        }

        program
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Option<Statement> {
        tracing::trace!(token = %self.current, "statement");
        match self.current.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::LBrace => self.parse_block_statement().map(Statement::Block),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = Identifier::new(self.current.literal.clone());

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        if matches!(
            self.peek.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            if self.peek_is(TokenKind::Semicolon) {
                self.next_token();
            }
            return Some(Statement::Return { value: None });
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Return { value: Some(value) })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let value = self.parse_expression(Precedence::Lowest)?;

        // The terminator is optional so a trailing expression can stand alone
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Expression { value })
    }

    /// Parse `{ ... }`; `current` must be the opening brace
    fn parse_block_statement(&mut self) -> Option<BlockStatement> {
        let open = self.current.span;
        let mut statements = Vec::new();

        self.depth += 1;
        self.next_token();

        while !self.current_is(TokenKind::RBrace) {
            if self.current_is(TokenKind::Eof) {
                self.depth -= 1;
                self.push_error("unterminated block: expected }, got EOF".to_string(), open);
                return None;
            }

            if self.current_is(TokenKind::Semicolon) {
                self.next_token();
                continue;
            }

            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => {
                    self.synchronize();
                    if self.current_is(TokenKind::RBrace) {
                        continue;
                    }
                }
            }
            self.next_token();
        }

        self.depth -= 1;
        Some(BlockStatement::new(statements))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Nesting recurses through here, so the stack grows on demand
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.parse_expression_inner(precedence)
        })
    }

    fn parse_expression_inner(&mut self, precedence: Precedence) -> Option<Expression> {
        let Some(prefix) = self.prefix_fns.get(&self.current.kind).copied() else {
            self.no_prefix_parse_fn_error();
            return None;
        };
        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let Some(infix) = self.infix_fns.get(&self.peek.kind).copied() else {
                return Some(left);
            };
            self.next_token();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::identifier(self.current.literal.clone()))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.current.literal.parse::<i64>() {
            Ok(value) => Some(Expression::IntegerLiteral(value)),
            Err(_) => {
                let message = format!("could not parse {:?} as integer", self.current.literal);
                self.push_error(message, self.current.span);
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        Some(Expression::StringLiteral(self.current.literal.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression::Boolean(self.current_is(TokenKind::True)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = match self.current.kind {
            TokenKind::Bang => PrefixOperator::Bang,
            _ => PrefixOperator::Minus,
        };
        self.next_token();

        let operand = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::prefix(operator, operand))
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = match self.current.kind {
            TokenKind::Plus => InfixOperator::Plus,
            TokenKind::Minus => InfixOperator::Minus,
            TokenKind::Asterisk => InfixOperator::Multiply,
            TokenKind::Slash => InfixOperator::Divide,
            TokenKind::Lt => InfixOperator::Lt,
            TokenKind::Gt => InfixOperator::Gt,
            TokenKind::Eq => InfixOperator::Eq,
            _ => InfixOperator::NotEq,
        };
        let precedence = self.current_precedence();
        self.next_token();

        let right = self.parse_expression(precedence)?;
        Some(Expression::infix(operator, left, right))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();

        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();

            if self.peek_is(TokenKind::If) {
                // else if: the chained if becomes the sole statement of the branch
                self.next_token();
                let chained = self.parse_if_expression()?;
                Some(BlockStatement::new(vec![Statement::Expression {
                    value: chained,
                }]))
            } else {
                if !self.expect_peek(TokenKind::LBrace) {
                    return None;
                }
                Some(self.parse_block_statement()?)
            }
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement()?;

        Some(Expression::Function { parameters, body })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut parameters = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(parameters);
        }

        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        parameters.push(Identifier::new(self.current.literal.clone()));

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            parameters.push(Identifier::new(self.current.literal.clone()));
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(parameters)
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expression::ArrayLiteral(elements))
    }

    fn parse_call_expression(&mut self, callee: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Some(Expression::call(callee, arguments))
    }

    fn parse_index_expression(&mut self, collection: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }
        Some(Expression::index(collection, index))
    }

    /// Comma-separated expressions up to `end`; `current` is the opener
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }
}

/// Parse everything a token source yields.
///
/// Always returns a program; statements that failed to parse are left out
/// and described in the diagnostics.
pub fn parse<S: TokenSource>(source: S) -> (Program, Vec<String>) {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    (program, parser.diagnostics())
}

/// Parse source text, failing if any diagnostic was recorded
pub fn parse_program(input: &str) -> Result<Program, ParseErrors> {
    let mut parser = Parser::from_source(input);
    let program = parser.parse_program();

    if parser.errors().is_empty() {
        Ok(program)
    } else {
        Err(ParseErrors(parser.into_errors()))
    }
}
