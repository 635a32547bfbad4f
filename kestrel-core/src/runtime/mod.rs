// kestrel-core/src/runtime/mod.rs

pub mod builtins;
pub mod environment;
pub mod evaluator;
pub mod object;
mod quote_unquote;


pub use builtins::{get_registry, Builtin, BuiltinRegistry};
pub use environment::{Environment, SharedEnvironment};
pub use evaluator::{eval, Evaluator, MAX_CALL_DEPTH};
pub use object::{Function, Object};
