//! Runtime values

use crate::parser::ast::{BlockStatement, Expression, Identifier};
use crate::runtime::builtins::Builtin;
use crate::runtime::environment::SharedEnvironment;
use std::fmt;
use std::rc::Rc;

/// A value produced by evaluation
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(String),
    Array(Vec<Object>),
    Function(Rc<Function>),
    Builtin(&'static Builtin),
    Null,
    /// Runtime error carried as an ordinary value
    Error(String),
    /// Unevaluated syntax held as data
    Quote(Rc<Expression>),
}

impl Object {
    pub const TRUE: Object = Object::Boolean(true);
    pub const FALSE: Object = Object::Boolean(false);
    pub const NULL: Object = Object::Null;

    /// Shared sentinel for a native boolean
    pub fn from_bool(value: bool) -> Object {
        if value {
            Object::TRUE
        } else {
            Object::FALSE
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::String(_) => "STRING",
            Object::Array(_) => "ARRAY",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Null => "NULL",
            Object::Error(_) => "ERROR",
            Object::Quote(_) => "QUOTE",
        }
    }

    /// Everything is truthy except `false` and `null`
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }
}

/// Structural equality for data, identity for callables
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Array(a), Object::Array(b)) => a == b,
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
            (Object::Null, Object::Null) => true,
            (Object::Error(a), Object::Error(b)) => a == b,
            (Object::Quote(a), Object::Quote(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::String(value) => write!(f, "{}", value),
            Object::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Object::Function(func) => write!(f, "{}", func),
            Object::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),
            Object::Null => write!(f, "null"),
            Object::Error(message) => write!(f, "ERROR: {}", message),
            Object::Quote(node) => write!(f, "QUOTE({})", node),
        }
    }
}

/// A user-defined function closed over its defining scope
pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: SharedEnvironment,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

// The captured environment may hold this very function, so it is left out
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        write!(f, "fn({}) {}", params.join(", "), self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Statement;
    use crate::runtime::builtins::get_registry;
    use crate::runtime::environment::Environment;

    #[test]
    fn test_truthiness() {
        assert!(Object::Integer(0).is_truthy());
        assert!(Object::String(String::new()).is_truthy());
        assert!(Object::TRUE.is_truthy());
        assert!(!Object::FALSE.is_truthy());
        assert!(!Object::NULL.is_truthy());
    }

    #[test]
    fn test_inspect() {
        assert_eq!(Object::Integer(-3).to_string(), "-3");
        assert_eq!(Object::String("hi".to_string()).to_string(), "hi");
        assert_eq!(
            Object::Array(vec![Object::Integer(1), Object::TRUE, Object::NULL]).to_string(),
            "[1, true, null]"
        );
        assert_eq!(
            Object::Error("division by zero".to_string()).to_string(),
            "ERROR: division by zero"
        );
        assert_eq!(
            Object::Quote(Rc::new(Expression::IntegerLiteral(4))).to_string(),
            "QUOTE(4)"
        );
    }

    #[test]
    fn test_function_display_and_identity() {
        let func = Rc::new(Function {
            parameters: vec![Identifier::new("x"), Identifier::new("y")],
            body: BlockStatement::new(vec![Statement::Expression {
                value: Expression::identifier("x"),
            }]),
            env: Environment::new_root(),
        });

        let a = Object::Function(Rc::clone(&func));
        let b = Object::Function(func);
        assert_eq!(a.to_string(), "fn(x, y) { x; }");
        assert_eq!(a, b);
    }

    #[test]
    fn test_builtin_display() {
        let len = get_registry().lookup("len").map(Object::Builtin);
        assert_eq!(
            len.map(|b| b.to_string()),
            Some("builtin function len".to_string())
        );
    }
}
