//! Tree-walking evaluator.
//!
//! Every step returns `Result<Object, Signal>`: `Ok` carries a value,
//! `Err` carries control that must unwind (a `return` on its way to the
//! nearest call boundary, or a runtime error on its way to the top). The
//! public entry points fold the signal back into an [`Object`].

use crate::parser::ast::{
    BlockStatement, Expression, InfixOperator, Node, PrefixOperator, Program, Statement,
};
use crate::runtime::builtins::{get_registry, BuiltinRegistry};
use crate::runtime::environment::{Environment, SharedEnvironment};
use crate::runtime::object::{Function, Object};
use crate::runtime::quote_unquote;
use crate::{STACK_GROW_SIZE, STACK_RED_ZONE};
use std::cell::Cell;
use std::rc::Rc;

/// Nested user function calls allowed before evaluation gives up
pub const MAX_CALL_DEPTH: usize = 20_000;

/// Control leaving an evaluation step early
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Signal {
    Return(Object),
    Error(String),
}

pub(crate) type EvalResult = Result<Object, Signal>;

pub(crate) fn error(message: impl Into<String>) -> Signal {
    Signal::Error(message.into())
}

/// Evaluates syntax trees against an environment
pub struct Evaluator {
    builtins: &'static BuiltinRegistry,
    /// User function calls currently in progress
    depth: Cell<usize>,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator {
            builtins: get_registry(),
            depth: Cell::new(0),
        }
    }

    /// Evaluate any node; runtime errors come back as `Object::Error`
    pub fn eval<'a>(&self, node: impl Into<Node<'a>>, env: &SharedEnvironment) -> Object {
        let result = match node.into() {
            Node::Program(program) => return self.eval_program(program, env),
            Node::Statement(stmt) => self.eval_statement(stmt, env),
            Node::Block(block) => self.eval_block(block, env),
            Node::Expression(expr) => self.eval_expression(expr, env),
        };
        unwind(result)
    }

    fn eval_program(&self, program: &Program, env: &SharedEnvironment) -> Object {
        let mut result = Object::NULL;

        for stmt in &program.statements {
            match self.eval_statement(stmt, env) {
                Ok(value) => result = value,
                Err(signal) => return unwind(Err(signal)),
            }
        }

        result
    }

    /// Statements in order; the last one gives the value. A pending
    /// signal skips the rest of the block.
    pub(crate) fn eval_block(&self, block: &BlockStatement, env: &SharedEnvironment) -> EvalResult {
        let mut result = Object::NULL;

        for stmt in &block.statements {
            result = self.eval_statement(stmt, env)?;
        }

        Ok(result)
    }

    fn eval_statement(&self, stmt: &Statement, env: &SharedEnvironment) -> EvalResult {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_statement_inner(stmt, env)
        })
    }

    fn eval_statement_inner(&self, stmt: &Statement, env: &SharedEnvironment) -> EvalResult {
        match stmt {
            Statement::Let { name, value } => {
                let value = self.eval_expression(value, env)?;
                env.borrow_mut().set(name.name.as_str(), value);
                Ok(Object::NULL)
            }
            Statement::Return { value } => {
                let value = match value {
                    Some(expr) => self.eval_expression(expr, env)?,
                    None => Object::NULL,
                };
                Err(Signal::Return(value))
            }
            Statement::Expression { value } => self.eval_expression(value, env),
            Statement::Block(block) => {
                let scope = Environment::new_enclosed(env);
                self.eval_block(block, &scope)
            }
        }
    }

    /// Evaluate an expression, growing the stack when deep recursion
    /// runs low
    pub(crate) fn eval_expression(&self, expr: &Expression, env: &SharedEnvironment) -> EvalResult {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_expression_inner(expr, env)
        })
    }

    fn eval_expression_inner(&self, expr: &Expression, env: &SharedEnvironment) -> EvalResult {
        match expr {
            Expression::IntegerLiteral(value) => Ok(Object::Integer(*value)),
            Expression::Boolean(value) => Ok(Object::from_bool(*value)),
            Expression::StringLiteral(value) => Ok(Object::String(value.clone())),

            Expression::Identifier(ident) => self.eval_identifier(&ident.name, env),

            Expression::ArrayLiteral(elements) => {
                Ok(Object::Array(self.eval_expressions(elements, env)?))
            }

            Expression::Prefix { operator, operand } => {
                let operand = self.eval_expression(operand, env)?;
                eval_prefix(*operator, operand)
            }

            Expression::Infix {
                operator,
                left,
                right,
            } => {
                let left = self.eval_expression(left, env)?;
                let right = self.eval_expression(right, env)?;
                eval_infix(*operator, left, right)
            }

            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expression(condition, env)?;
                if condition.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alt) = alternative {
                    self.eval_block(alt, env)
                } else {
                    Ok(Object::NULL)
                }
            }

            Expression::Function { parameters, body } => {
                Ok(Object::Function(Rc::new(Function {
                    parameters: parameters.clone(),
                    body: body.clone(),
                    env: Rc::clone(env),
                })))
            }

            Expression::Call { callee, arguments } => {
                // quote sees its argument as syntax, so it is handled before
                // anything is evaluated
                if let Expression::Identifier(ident) = callee.as_ref() {
                    if ident.name == "quote" {
                        return quote_unquote::quote(self, arguments, env);
                    }
                }

                let function = self.eval_expression(callee, env)?;
                let args = self.eval_expressions(arguments, env)?;
                self.apply_function(function, args)
            }

            Expression::Index { collection, index } => {
                let collection = self.eval_expression(collection, env)?;
                let index = self.eval_expression(index, env)?;
                eval_index(collection, index)
            }
        }
    }

    /// Evaluate left to right, stopping at the first signal
    fn eval_expressions(
        &self,
        exprs: &[Expression],
        env: &SharedEnvironment,
    ) -> Result<Vec<Object>, Signal> {
        exprs
            .iter()
            .map(|expr| self.eval_expression(expr, env))
            .collect()
    }

    fn eval_identifier(&self, name: &str, env: &SharedEnvironment) -> EvalResult {
        if let Some(value) = env.borrow().get(name) {
            return Ok(value);
        }

        match self.builtins.lookup(name) {
            Some(builtin) => Ok(Object::Builtin(builtin)),
            None => Err(error(format!("identifier not found: {}", name))),
        }
    }

    fn apply_function(&self, function: Object, args: Vec<Object>) -> EvalResult {
        match function {
            Object::Function(func) => {
                if args.len() != func.arity() {
                    return Err(error(format!(
                        "wrong number of arguments: want={}, got={}",
                        func.arity(),
                        args.len()
                    )));
                }
                let depth = self.depth.get();
                if depth >= MAX_CALL_DEPTH {
                    return Err(error(format!(
                        "maximum call depth exceeded: {}",
                        MAX_CALL_DEPTH
                    )));
                }
                tracing::debug!(arity = func.arity(), depth, "calling function");

                let call_env = Environment::new_enclosed(&func.env);
                {
                    let mut scope = call_env.borrow_mut();
                    for (param, arg) in func.parameters.iter().zip(args) {
                        scope.set(param.name.as_str(), arg);
                    }
                }

                self.depth.set(depth + 1);
                let result = self.eval_block(&func.body, &call_env);
                self.depth.set(depth);

                // A return stops at the call boundary
                match result {
                    Err(Signal::Return(value)) => Ok(value),
                    other => other,
                }
            }
            Object::Builtin(builtin) => match builtin.call(&args) {
                Object::Error(message) => Err(Signal::Error(message)),
                value => Ok(value),
            },
            other => Err(error(format!("not a function: {}", other.type_name()))),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate a node in the given environment
pub fn eval<'a>(node: impl Into<Node<'a>>, env: &SharedEnvironment) -> Object {
    Evaluator::new().eval(node, env)
}

/// Fold a pending signal into the value seen by callers
fn unwind(result: EvalResult) -> Object {
    match result {
        Ok(value) | Err(Signal::Return(value)) => value,
        Err(Signal::Error(message)) => Object::Error(message),
    }
}

fn eval_prefix(operator: PrefixOperator, operand: Object) -> EvalResult {
    match operator {
        PrefixOperator::Bang => Ok(Object::from_bool(!operand.is_truthy())),
        PrefixOperator::Minus => match operand {
            Object::Integer(value) => Ok(Object::Integer(value.wrapping_neg())),
            other => Err(error(format!("unknown operator: -{}", other.type_name()))),
        },
    }
}

fn eval_infix(operator: InfixOperator, left: Object, right: Object) -> EvalResult {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(operator, *l, *r),
        (Object::String(l), Object::String(r)) if operator == InfixOperator::Plus => {
            Ok(Object::String(format!("{}{}", l, r)))
        }
        (Object::String(_), Object::String(_)) => Err(unknown_operator(operator, &left, &right)),
        _ if operator == InfixOperator::Eq => Ok(Object::from_bool(identical(&left, &right))),
        _ if operator == InfixOperator::NotEq => Ok(Object::from_bool(!identical(&left, &right))),
        _ if left.type_name() != right.type_name() => Err(error(format!(
            "type mismatch: {} {} {}",
            left.type_name(),
            operator,
            right.type_name()
        ))),
        _ => Err(unknown_operator(operator, &left, &right)),
    }
}

fn eval_integer_infix(operator: InfixOperator, left: i64, right: i64) -> EvalResult {
    let value = match operator {
        InfixOperator::Plus => Object::Integer(left.wrapping_add(right)),
        InfixOperator::Minus => Object::Integer(left.wrapping_sub(right)),
        InfixOperator::Multiply => Object::Integer(left.wrapping_mul(right)),
        InfixOperator::Divide => {
            if right == 0 {
                return Err(error("division by zero"));
            }
            Object::Integer(left.wrapping_div(right))
        }
        InfixOperator::Lt => Object::from_bool(left < right),
        InfixOperator::Gt => Object::from_bool(left > right),
        InfixOperator::Eq => Object::from_bool(left == right),
        InfixOperator::NotEq => Object::from_bool(left != right),
    };
    Ok(value)
}

/// Identity comparison: sentinels by value, callables by reference,
/// everything else is never identical
fn identical(left: &Object, right: &Object) -> bool {
    match (left, right) {
        (Object::Boolean(l), Object::Boolean(r)) => l == r,
        (Object::Null, Object::Null) => true,
        (Object::Function(l), Object::Function(r)) => Rc::ptr_eq(l, r),
        (Object::Builtin(l), Object::Builtin(r)) => l.name == r.name,
        _ => false,
    }
}

fn unknown_operator(operator: InfixOperator, left: &Object, right: &Object) -> Signal {
    error(format!(
        "unknown operator: {} {} {}",
        left.type_name(),
        operator,
        right.type_name()
    ))
}

fn eval_index(collection: Object, index: Object) -> EvalResult {
    match (collection, index) {
        (Object::Array(elements), Object::Integer(i)) => Ok(usize::try_from(i)
            .ok()
            .and_then(|i| elements.get(i).cloned())
            .unwrap_or(Object::NULL)),
        (collection, _) => Err(error(format!(
            "index operator not supported: {}",
            collection.type_name()
        ))),
    }
}
