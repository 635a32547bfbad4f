//! `quote` and `unquote`.
//!
//! `quote(expr)` returns `expr` as data. Before the fragment is frozen,
//! every `unquote(inner)` call inside it is evaluated in the caller's
//! environment and replaced by the syntax for its value.

use crate::parser::ast::{self, Expression};
use crate::runtime::environment::SharedEnvironment;
use crate::runtime::evaluator::{error, EvalResult, Evaluator, Signal};
use crate::runtime::object::Object;
use std::rc::Rc;

pub(crate) fn quote(
    evaluator: &Evaluator,
    arguments: &[Expression],
    env: &SharedEnvironment,
) -> EvalResult {
    let [fragment] = arguments else {
        return Err(error(format!(
            "wrong number of arguments: want=1, got={}",
            arguments.len()
        )));
    };

    let spliced = ast::modify(fragment.clone(), &mut |node| {
        match unquote_argument(&node) {
            Some(inner) => {
                let value = evaluator.eval_expression(inner, env)?;
                to_syntax(value)
            }
            None => Ok(node),
        }
    })?;

    Ok(Object::Quote(Rc::new(spliced)))
}

/// The argument of an `unquote(x)` call
fn unquote_argument(expr: &Expression) -> Option<&Expression> {
    match expr {
        Expression::Call { callee, arguments } if arguments.len() == 1 => match callee.as_ref() {
            Expression::Identifier(ident) if ident.name == "unquote" => arguments.first(),
            _ => None,
        },
        _ => None,
    }
}

/// Literal syntax that evaluates back to `value`
fn to_syntax(value: Object) -> Result<Expression, Signal> {
    match value {
        Object::Integer(value) => Ok(Expression::IntegerLiteral(value)),
        Object::Boolean(value) => Ok(Expression::Boolean(value)),
        Object::String(value) => Ok(Expression::StringLiteral(value)),
        Object::Array(elements) => Ok(Expression::ArrayLiteral(
            elements
                .into_iter()
                .map(to_syntax)
                .collect::<Result<_, _>>()?,
        )),
        Object::Quote(node) => Ok(Rc::unwrap_or_clone(node)),
        other => Err(error(format!(
            "unquote: cannot convert {} to syntax",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;
    use crate::runtime::environment::Environment;

    fn eval_input(input: &str) -> Object {
        let program = match parse_program(input) {
            Ok(program) => program,
            Err(errors) => panic!("parse failed for {:?}: {}", input, errors),
        };
        Evaluator::new().eval(&program, &Environment::new_root())
    }

    fn quoted(input: &str) -> String {
        match eval_input(input) {
            Object::Quote(node) => node.to_string(),
            other => panic!("Expected QUOTE for {:?}, got {}", input, other),
        }
    }

    #[test]
    fn test_quote_keeps_syntax_unevaluated() {
        let cases = [
            ("quote(5)", "5"),
            ("quote(5 + 8)", "(5 + 8)"),
            ("quote(foobar)", "foobar"),
            ("quote(foobar + barfoo)", "(foobar + barfoo)"),
            ("quote(fn(x) { x })", "fn(x) { x; }"),
        ];

        for (input, expected) in cases {
            assert_eq!(quoted(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_unquote_splices_values() {
        let cases = [
            ("quote(unquote(4))", "4"),
            ("quote(unquote(4 + 4))", "8"),
            ("quote(8 + unquote(4 + 4))", "(8 + 8)"),
            ("quote(unquote(4 + 4) + 8)", "(8 + 8)"),
            ("let foobar = 8; quote(foobar)", "foobar"),
            ("let foobar = 8; quote(unquote(foobar))", "8"),
            ("quote(unquote(true))", "true"),
            ("quote(unquote(true == false))", "false"),
            ("quote(unquote(\"hi\"))", "\"hi\""),
            ("quote(unquote([1, 1 + 1]))", "[1, 2]"),
            ("quote(unquote(quote(4 + 4)))", "(4 + 4)"),
            (
                "let quotedInfix = quote(4 + 4); quote(unquote(4 + 4) + unquote(quotedInfix))",
                "(8 + (4 + 4))",
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(quoted(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_unquote_inside_bodies_and_branches() {
        assert_eq!(
            quoted("let x = 2; quote(fn() { unquote(x * 3) })"),
            "fn() { 6; }"
        );
        assert_eq!(
            quoted("quote(if (unquote(1 < 2)) { unquote(1) } else { unquote(2) })"),
            "if (true) { 1; } else { 2; }"
        );
    }

    #[test]
    fn test_unquote_errors() {
        assert_eq!(
            eval_input("quote(unquote(fn(x) { x }))"),
            Object::Error("unquote: cannot convert FUNCTION to syntax".to_string())
        );
        assert_eq!(
            eval_input("let nothing = if (false) { 1 }; quote(unquote(nothing))"),
            Object::Error("unquote: cannot convert NULL to syntax".to_string())
        );
        assert_eq!(
            eval_input("quote(unquote(missing))"),
            Object::Error("identifier not found: missing".to_string())
        );
    }

    #[test]
    fn test_quote_arity() {
        assert_eq!(
            eval_input("quote(1, 2)"),
            Object::Error("wrong number of arguments: want=1, got=2".to_string())
        );
        assert_eq!(
            eval_input("quote()"),
            Object::Error("wrong number of arguments: want=1, got=0".to_string())
        );
    }
}
