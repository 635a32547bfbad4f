// kestrel-core/src/parser/mod.rs

pub mod ast;
pub mod error;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod token;

pub use ast::{BlockStatement, Expression, Identifier, Node, Program, Statement};
pub use error::{render_diagnostics, ParseError, ParseErrors};
pub use lexer::Lexer;
pub use parser::{parse, parse_program, Parser, Precedence};
pub use token::{Span, Token, TokenKind, TokenSource, TokenStream};
