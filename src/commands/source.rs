//! Commands that work on source text and files (ast, load, watch)

use crate::commands::{CommandContext, CommandResult};
use crate::runner::{self, Outcome};
use kestrel_core::parser::{parse_program, render_diagnostics};
use std::path::Path;

/// Handle `ast <source>`: show the parsed program in its fully
/// parenthesized form
pub fn cmd_ast(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: ast <source>".to_string());
    }

    match parse_program(args) {
        Ok(program) => CommandResult::Message(program.to_string()),
        Err(errors) => CommandResult::Error(render_diagnostics(&errors.0)),
    }
}

/// Handle `load <file>`: run a file in the session environment
pub fn cmd_load(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: load <file>".to_string());
    }

    match runner::run_file(Path::new(args), &ctx.env) {
        Ok(Outcome::Diagnostics(errors)) => CommandResult::Error(render_diagnostics(&errors)),
        Ok(outcome) => match outcome.render() {
            Some(text) => CommandResult::Message(text),
            None => CommandResult::Success,
        },
        Err(e) => CommandResult::Error(format!("{:#}", e)),
    }
}

/// Handle `watch <file>`
pub fn cmd_watch(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: watch <file>".to_string());
    }
    CommandResult::Watch(args.to_string())
}
