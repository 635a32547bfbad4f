//! Command registry for REPL commands
//!
//! Lines that start with a registered prefix are commands; everything else
//! is kestrel source.

pub mod general;
pub mod source;

use crate::runner::{self, Outcome};
use kestrel_core::runtime::{Environment, SharedEnvironment};

/// Result of executing a command
#[derive(Debug)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Not a command, try evaluating as source
    NotACommand,
    /// Error occurred
    Error(String),
    /// Watch a file for changes
    Watch(String),
}

/// Context passed to command handlers
pub struct CommandContext {
    /// Root scope of the session
    pub env: SharedEnvironment,
}

impl CommandContext {
    pub fn new() -> Self {
        Self {
            env: Environment::new_root(),
        }
    }

    /// Run source in the session environment
    pub fn execute(&self, input: &str) -> Outcome {
        runner::execute(input, &self.env)
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command with its prefix
    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if let Some(rest) = input.strip_prefix(prefix.as_str()) {
                // `envy` is an identifier, not `env y`
                if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                    return handler(rest.trim(), ctx);
                }
            }
        }
        CommandResult::NotACommand
    }

    /// Get all registered command prefixes
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);
    registry.register("env", general::cmd_env);

    registry.register("ast", source::cmd_ast);
    registry.register("load", source::cmd_load);
    registry.register("watch", source::cmd_watch);

    registry
}
