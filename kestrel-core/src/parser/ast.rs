//! Abstract syntax tree.
//!
//! The tree is the contract between the parser and the evaluator, and the
//! payload of quoted values. Every node renders back to source through
//! `Display`; the rendering parenthesizes each prefix, infix and index
//! expression, so re-parsing it yields the same grouping.

use crate::{STACK_GROW_SIZE, STACK_RED_ZONE};
use std::fmt;

// ============================================================================
// Program and statements
// ============================================================================

/// A program is a sequence of statements
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Program {
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, stmt: Statement) {
        self.statements.push(stmt);
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    /// Variable binding: let x = 5;
    Let { name: Identifier, value: Expression },

    /// Return from the enclosing function: return x;
    Return { value: Option<Expression> },

    /// Expression statement: add(1, 2)
    Expression { value: Expression },

    /// Nested block: { ... }
    Block(BlockStatement),
}

/// Braced sequence of statements, used for bodies and if branches
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

impl BlockStatement {
    pub fn new(statements: Vec<Statement>) -> Self {
        BlockStatement { statements }
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Identifier { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrefixOperator {
    Bang,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfixOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Lt,
    Gt,
    Eq,
    NotEq,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expression {
    Identifier(Identifier),

    IntegerLiteral(i64),

    Boolean(bool),

    StringLiteral(String),

    /// [1, 2 * 2, 3 + 3]
    ArrayLiteral(Vec<Expression>),

    /// -x, !ok
    Prefix {
        operator: PrefixOperator,
        operand: Box<Expression>,
    },

    /// a + b
    Infix {
        operator: InfixOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// if (cond) { ... } else { ... }
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },

    /// fn(x, y) { x + y }
    Function {
        parameters: Vec<Identifier>,
        body: BlockStatement,
    },

    /// add(1, 2)
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },

    /// arr[1]
    Index {
        collection: Box<Expression>,
        index: Box<Expression>,
    },
}

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier::new(name))
    }

    pub fn prefix(operator: PrefixOperator, operand: Expression) -> Self {
        Expression::Prefix {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn infix(operator: InfixOperator, left: Expression, right: Expression) -> Self {
        Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            callee: Box::new(callee),
            arguments,
        }
    }

    pub fn index(collection: Expression, index: Expression) -> Self {
        Expression::Index {
            collection: Box::new(collection),
            index: Box::new(index),
        }
    }
}

/// Borrowed view of any node the evaluator can start from
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Statement(&'a Statement),
    Block(&'a BlockStatement),
    Expression(&'a Expression),
}

impl<'a> From<&'a Program> for Node<'a> {
    fn from(program: &'a Program) -> Self {
        Node::Program(program)
    }
}

impl<'a> From<&'a Statement> for Node<'a> {
    fn from(stmt: &'a Statement) -> Self {
        Node::Statement(stmt)
    }
}

impl<'a> From<&'a BlockStatement> for Node<'a> {
    fn from(block: &'a BlockStatement) -> Self {
        Node::Block(block)
    }
}

impl<'a> From<&'a Expression> for Node<'a> {
    fn from(expr: &'a Expression) -> Self {
        Node::Expression(expr)
    }
}

// ============================================================================
// Tree rewriting
// ============================================================================

/// Rewrite an expression tree bottom-up.
///
/// Children are rewritten before their parent is handed to `f`, and the
/// walk reaches into function bodies and if branches. The first error
/// returned by `f` aborts the rewrite.
pub fn modify<E, F>(expr: Expression, f: &mut F) -> Result<Expression, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || modify_expression(expr, f))
}

fn modify_expression<E, F>(expr: Expression, f: &mut F) -> Result<Expression, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    let rebuilt = match expr {
        Expression::Prefix { operator, operand } => Expression::Prefix {
            operator,
            operand: Box::new(modify(*operand, f)?),
        },
        Expression::Infix {
            operator,
            left,
            right,
        } => Expression::Infix {
            operator,
            left: Box::new(modify(*left, f)?),
            right: Box::new(modify(*right, f)?),
        },
        Expression::Index { collection, index } => Expression::Index {
            collection: Box::new(modify(*collection, f)?),
            index: Box::new(modify(*index, f)?),
        },
        Expression::If {
            condition,
            consequence,
            alternative,
        } => Expression::If {
            condition: Box::new(modify(*condition, f)?),
            consequence: modify_block(consequence, f)?,
            alternative: alternative.map(|alt| modify_block(alt, f)).transpose()?,
        },
        Expression::Function { parameters, body } => Expression::Function {
            parameters,
            body: modify_block(body, f)?,
        },
        Expression::ArrayLiteral(elements) => Expression::ArrayLiteral(
            elements
                .into_iter()
                .map(|e| modify(e, f))
                .collect::<Result<_, _>>()?,
        ),
        Expression::Call { callee, arguments } => Expression::Call {
            callee: Box::new(modify(*callee, f)?),
            arguments: arguments
                .into_iter()
                .map(|e| modify(e, f))
                .collect::<Result<_, _>>()?,
        },
        leaf => leaf,
    };

    f(rebuilt)
}

fn modify_block<E, F>(block: BlockStatement, f: &mut F) -> Result<BlockStatement, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    let statements = block
        .statements
        .into_iter()
        .map(|stmt| modify_statement(stmt, f))
        .collect::<Result<_, _>>()?;
    Ok(BlockStatement { statements })
}

fn modify_statement<E, F>(stmt: Statement, f: &mut F) -> Result<Statement, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    Ok(match stmt {
        Statement::Let { name, value } => Statement::Let {
            name,
            value: modify(value, f)?,
        },
        Statement::Return { value } => Statement::Return {
            value: value.map(|v| modify(v, f)).transpose()?,
        },
        Statement::Expression { value } => Statement::Expression {
            value: modify(value, f)?,
        },
        Statement::Block(block) => Statement::Block(modify_block(block, f)?),
    })
}

// ============================================================================
// Rendering
// ============================================================================

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in value.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            _ => write!(f, "{}", ch)?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {} = {};", name, value),
            Statement::Return { value: Some(value) } => write!(f, "return {};", value),
            Statement::Return { value: None } => write!(f, "return;"),
            Statement::Expression { value } => write!(f, "{};", value),
            Statement::Block(block) => write!(f, "{}", block),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{")?;
        for stmt in &self.statements {
            write!(f, " {}", stmt)?;
        }
        write!(f, " }}")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOperator::Bang => write!(f, "!"),
            PrefixOperator::Minus => write!(f, "-"),
        }
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            InfixOperator::Plus => "+",
            InfixOperator::Minus => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Lt => "<",
            InfixOperator::Gt => ">",
            InfixOperator::Eq => "==",
            InfixOperator::NotEq => "!=",
        };
        write!(f, "{}", op_str)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.render(f))
    }
}

impl Expression {
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            // No literal spells i64::MIN, its magnitude overflows
            Expression::IntegerLiteral(i64::MIN) => write!(f, "(-{} - 1)", i64::MAX),
            Expression::IntegerLiteral(value) => write!(f, "{}", value),
            Expression::Boolean(value) => write!(f, "{}", value),
            Expression::StringLiteral(value) => write_string_literal(f, value),
            Expression::ArrayLiteral(elements) => {
                write!(f, "[")?;
                write_joined(f, elements)?;
                write!(f, "]")
            }
            Expression::Prefix { operator, operand } => write!(f, "({}{})", operator, operand),
            Expression::Infix {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                // Prefix, infix and index expressions already carry parens
                if matches!(
                    **condition,
                    Expression::Prefix { .. } | Expression::Infix { .. } | Expression::Index { .. }
                ) {
                    write!(f, "if {} {}", condition, consequence)?;
                } else {
                    write!(f, "if ({}) {}", condition, consequence)?;
                }
                if let Some(alt) = alternative {
                    write!(f, " else {}", alt)?;
                }
                Ok(())
            }
            Expression::Function { parameters, body } => {
                write!(f, "fn(")?;
                write_joined(f, parameters)?;
                write!(f, ") {}", body)
            }
            Expression::Call { callee, arguments } => {
                write!(f, "{}(", callee)?;
                write_joined(f, arguments)?;
                write!(f, ")")
            }
            Expression::Index { collection, index } => write!(f, "({}[{}])", collection, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_let_statement_rendering() {
        let program = Program {
            statements: vec![Statement::Let {
                name: Identifier::new("myVar"),
                value: Expression::identifier("anotherVar"),
            }],
        };

        assert_eq!(program.to_string(), "let myVar = anotherVar;");
    }

    #[test]
    fn test_nested_expression_rendering() {
        let expr = Expression::infix(
            InfixOperator::Plus,
            Expression::prefix(PrefixOperator::Minus, Expression::IntegerLiteral(1)),
            Expression::index(
                Expression::identifier("arr"),
                Expression::infix(
                    InfixOperator::Multiply,
                    Expression::IntegerLiteral(2),
                    Expression::IntegerLiteral(3),
                ),
            ),
        );

        assert_eq!(expr.to_string(), "((-1) + (arr[(2 * 3)]))");
    }

    #[test]
    fn test_if_and_function_rendering() {
        let expr = Expression::If {
            condition: Box::new(Expression::infix(
                InfixOperator::Lt,
                Expression::identifier("x"),
                Expression::identifier("y"),
            )),
            consequence: BlockStatement::new(vec![Statement::Expression {
                value: Expression::identifier("x"),
            }]),
            alternative: Some(BlockStatement::new(vec![Statement::Return {
                value: Some(Expression::identifier("y")),
            }])),
        };
        assert_eq!(expr.to_string(), "if (x < y) { x; } else { return y; }");

        let func = Expression::Function {
            parameters: vec![Identifier::new("a"), Identifier::new("b")],
            body: BlockStatement::default(),
        };
        assert_eq!(func.to_string(), "fn(a, b) { }");

        let bare = Expression::If {
            condition: Box::new(Expression::identifier("ok")),
            consequence: BlockStatement::default(),
            alternative: None,
        };
        assert_eq!(bare.to_string(), "if (ok) { }");
    }

    #[test]
    fn test_string_literal_rendering_escapes() {
        let expr = Expression::StringLiteral("say \"hi\"\n".to_string());
        assert_eq!(expr.to_string(), r#""say \"hi\"\n""#);
    }

    #[test]
    fn test_modify_replaces_leaves_everywhere() {
        let one_to_two = |expr: Expression| -> Result<Expression, ()> {
            match expr {
                Expression::IntegerLiteral(1) => Ok(Expression::IntegerLiteral(2)),
                other => Ok(other),
            }
        };

        let one = || Expression::IntegerLiteral(1);
        let two = || Expression::IntegerLiteral(2);

        let cases = vec![
            (one(), two()),
            (
                Expression::infix(InfixOperator::Plus, one(), two()),
                Expression::infix(InfixOperator::Plus, two(), two()),
            ),
            (
                Expression::prefix(PrefixOperator::Minus, one()),
                Expression::prefix(PrefixOperator::Minus, two()),
            ),
            (
                Expression::index(one(), one()),
                Expression::index(two(), two()),
            ),
            (
                Expression::ArrayLiteral(vec![one(), one()]),
                Expression::ArrayLiteral(vec![two(), two()]),
            ),
            (
                Expression::If {
                    condition: Box::new(one()),
                    consequence: BlockStatement::new(vec![Statement::Expression { value: one() }]),
                    alternative: Some(BlockStatement::new(vec![Statement::Return {
                        value: Some(one()),
                    }])),
                },
                Expression::If {
                    condition: Box::new(two()),
                    consequence: BlockStatement::new(vec![Statement::Expression { value: two() }]),
                    alternative: Some(BlockStatement::new(vec![Statement::Return {
                        value: Some(two()),
                    }])),
                },
            ),
            (
                Expression::Function {
                    parameters: vec![],
                    body: BlockStatement::new(vec![Statement::Let {
                        name: Identifier::new("x"),
                        value: one(),
                    }]),
                },
                Expression::Function {
                    parameters: vec![],
                    body: BlockStatement::new(vec![Statement::Let {
                        name: Identifier::new("x"),
                        value: two(),
                    }]),
                },
            ),
        ];

        for (input, expected) in cases {
            let mut f = one_to_two;
            assert_eq!(modify(input, &mut f), Ok(expected));
        }
    }

    #[test]
    fn test_modify_stops_on_error() {
        let mut fail_on_one = |expr: Expression| match expr {
            Expression::IntegerLiteral(1) => Err("found one"),
            other => Ok(other),
        };

        let expr = Expression::ArrayLiteral(vec![
            Expression::IntegerLiteral(2),
            Expression::IntegerLiteral(1),
        ]);
        assert_eq!(modify(expr, &mut fail_on_one), Err("found one"));
    }

    #[test]
    fn test_min_integer_renders_as_parseable_source() {
        let expr = Expression::IntegerLiteral(i64::MIN);
        let rendered = expr.to_string();
        assert_eq!(rendered, "(-9223372036854775807 - 1)");

        let program = crate::parser::parse_program(&rendered).unwrap();
        let value = crate::runtime::eval(&program, &crate::runtime::Environment::new_root());
        assert_eq!(value, crate::runtime::Object::Integer(i64::MIN));
    }

    #[test]
    fn test_deeply_nested_rendering() {
        let depth = 3000;
        let mut expr = Expression::Boolean(true);
        for _ in 0..depth {
            expr = Expression::prefix(PrefixOperator::Bang, expr);
        }

        let rendered = expr.to_string();
        assert!(rendered.starts_with(&"(!".repeat(depth)));
        assert!(rendered.ends_with(&")".repeat(depth)));
    }
}
