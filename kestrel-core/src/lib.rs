//! # Kestrel Core
//!
//! Front-end and tree-walking runtime for the kestrel expression language.
//! No terminal I/O lives here; the `kestrel` binary drives it.
//!
//! ## Features
//!
//! - **serde**: Derive `Serialize`/`Deserialize` for tokens and the AST
//! - **colored**: Colored diagnostic rendering (on by default)
//!
//! ## Example
//!
//! ```
//! use kestrel_core::runtime::{eval, Environment, Object};
//! use kestrel_core::parser::parse_program;
//!
//! let program = parse_program("let add = fn(a, b) { a + b }; add(2, 3)").unwrap();
//! let env = Environment::new_root();
//! assert_eq!(eval(&program, &env), Object::Integer(5));
//! ```

pub mod parser;
pub mod runtime;

// Re-export commonly used types
pub use parser::{parse, parse_program, Lexer, ParseError, ParseErrors, Program};
pub use runtime::{eval, Environment, Object, SharedEnvironment};

/// Remaining stack below which recursive parsing, rendering and evaluation
/// move onto a fresh segment
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each extra stack segment
pub(crate) const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Parse and evaluate source in a fresh root environment.
///
/// Fails when the source has parse diagnostics; runtime errors are
/// returned as `Object::Error` values.
pub fn eval_source(input: &str) -> anyhow::Result<Object> {
    let program = parse_program(input)?;
    Ok(eval(&program, &Environment::new_root()))
}

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize a tracing subscriber for tests, honoring `RUST_LOG`.
    /// Safe to call from every test.
    pub fn init_test_logging() {
        use tracing_subscriber::{fmt, EnvFilter};

        // Another test may already have installed one
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_source() {
        let result = eval_source("let x = 2; x * 21").unwrap();
        assert_eq!(result, Object::Integer(42));
    }

    #[test]
    fn test_eval_source_reports_parse_errors() {
        let err = eval_source("let = 1;").unwrap_err();
        assert!(err.to_string().contains("expected next token to be IDENT"));
        assert!(err.downcast_ref::<ParseErrors>().is_some());
    }
}
