//! # Kestrel
//!
//! Command-line driver for the kestrel expression language. The language
//! itself (lexer, parser, evaluator) lives in `kestrel-core`; this crate
//! adds everything that touches a terminal or the file system.
//!
//! ## Modules
//!
//! - `commands`: REPL commands (`help`, `env`, `ast`, `load`, `watch`, ...)
//!   and the prefix-matching registry that dispatches them.
//! - `repl`: The interactive loop, plus the file watcher used for hot
//!   re-running of source files.
//! - `runner`: Executes source text or files against an environment and
//!   decides what gets printed.

pub mod commands;
pub mod repl;
pub mod runner;

// Re-export the core for convenience
pub use kestrel_core::{eval, eval_source, parse_program, Environment, Object};
