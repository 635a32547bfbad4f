//! General REPL commands (help, quit, env)

use crate::commands::{CommandContext, CommandResult};
use colored::*;
use kestrel_core::runtime::get_registry;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Message(help_text())
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `env`: list the session's top-level bindings
pub fn cmd_env(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let bindings = ctx.env.borrow().bindings();
    if bindings.is_empty() {
        return CommandResult::Message("No bindings".dimmed().to_string());
    }

    let lines: Vec<String> = bindings
        .iter()
        .map(|(name, value)| {
            format!(
                "  {} {} {}",
                name.cyan(),
                ":".dimmed(),
                format!("{} = {}", value.type_name(), value).dimmed()
            )
        })
        .collect();
    CommandResult::Message(lines.join("\n"))
}

fn help_text() -> String {
    let mut out = Vec::new();

    out.push(format!("{}", "Kestrel Language Help".bold()));
    out.push(format!("{}", "=====================".bold()));
    out.push(String::new());
    out.push(format!("{}", "Basics:".green()));
    out.push(format!("  {}          - Bind a name", "let x = 5;".cyan()));
    out.push(format!(
        "  {}  - Function literal",
        "fn(a, b) { a + b }".cyan()
    ));
    out.push(format!(
        "  {}  - Conditional",
        "if (x > 1) { 1 } else { 2 }".cyan()
    ));
    out.push(format!("  {}           - Array indexing", "[1, 2, 3][0]".cyan()));
    out.push(format!(
        "  {}   - Syntax as data",
        "quote(1 + unquote(x))".cyan()
    ));
    out.push(String::new());

    out.push(format!("{}", "Builtins:".green()));
    for doc in get_registry().get_documentation() {
        out.push(format!("  {:<36} - {}", doc.signature.cyan(), doc.description));
    }
    out.push(String::new());

    out.push(format!("{}", "Commands:".green()));
    out.push(format!("  {}           - Show this help", "help".cyan()));
    out.push(format!("  {}            - List session bindings", "env".cyan()));
    out.push(format!("  {}   - Show how source parses", "ast <source>".cyan()));
    out.push(format!("  {}    - Run a file in this session", "load <file>".cyan()));
    out.push(format!("  {}   - Re-run a file when it changes", "watch <file>".cyan()));
    out.push(format!("  {}      - Leave the REPL", "quit, exit".cyan()));

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::runtime::Object;

    #[test]
    fn test_help_lists_builtins_and_commands() {
        colored::control::set_override(false);

        let text = match cmd_help("", &mut CommandContext::new()) {
            CommandResult::Message(text) => text,
            other => panic!("Expected message, got {:?}", other),
        };

        for name in ["len(", "first(", "last(", "rest(", "push(", "watch <file>"] {
            assert!(text.contains(name), "help is missing {}", name);
        }
    }

    #[test]
    fn test_env_lists_bindings() {
        colored::control::set_override(false);
        let mut ctx = CommandContext::new();

        match cmd_env("", &mut ctx) {
            CommandResult::Message(text) => assert_eq!(text, "No bindings"),
            other => panic!("Expected message, got {:?}", other),
        }

        ctx.env.borrow_mut().set("b", Object::TRUE);
        ctx.env.borrow_mut().set("a", Object::Integer(1));

        match cmd_env("", &mut ctx) {
            CommandResult::Message(text) => {
                assert_eq!(text, "  a : INTEGER = 1\n  b : BOOLEAN = true")
            }
            other => panic!("Expected message, got {:?}", other),
        }
    }
}
