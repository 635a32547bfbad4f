//! Running source text and files against an environment
//!
//! Shared by the REPL, the `load` command and the command-line runner.

use crate::repl::watcher::{changed_paths, FileWatcher};
use anyhow::{Context, Result};
use colored::*;
use crossbeam_channel::unbounded;
use kestrel_core::parser::{render_diagnostics, ParseError, Parser, Statement};
use kestrel_core::runtime::{eval, Environment, Object, SharedEnvironment};
use std::path::Path;

/// What running one piece of source produced
#[derive(Debug)]
pub enum Outcome {
    /// The program's value (possibly an `Error` object)
    Value(Object),
    /// Nothing worth printing, e.g. the last statement was a `let`
    Silent,
    /// The source did not parse; nothing was evaluated
    Diagnostics(Vec<ParseError>),
}

impl Outcome {
    /// Text to show the user, if any
    pub fn render(&self) -> Option<String> {
        match self {
            Outcome::Value(value @ Object::Error(_)) => {
                Some(value.to_string().bright_red().to_string())
            }
            Outcome::Value(value) => Some(value.to_string()),
            Outcome::Silent => None,
            Outcome::Diagnostics(errors) => Some(render_diagnostics(errors)),
        }
    }

    /// Parse diagnostics or a runtime error
    pub fn is_failure(&self) -> bool {
        match self {
            Outcome::Value(value) => value.is_error(),
            Outcome::Silent => false,
            Outcome::Diagnostics(_) => true,
        }
    }
}

/// Parse and evaluate `source` in `env`.
///
/// Source with diagnostics is not evaluated at all.
pub fn execute(source: &str, env: &SharedEnvironment) -> Outcome {
    let mut parser = Parser::from_source(source);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        tracing::debug!(count = parser.errors().len(), "source has parse errors");
        return Outcome::Diagnostics(parser.into_errors());
    }

    let value = eval(&program, env);
    let ends_in_let = matches!(
        program.statements.last(),
        None | Some(Statement::Let { .. })
    );

    // A run that reaches a trailing let always yields null; anything else
    // came from an early top-level return
    if ends_in_let && value == Object::NULL {
        Outcome::Silent
    } else {
        Outcome::Value(value)
    }
}

/// Read a file and execute it in `env`
pub fn run_file(path: &Path, env: &SharedEnvironment) -> Result<Outcome> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "running file");
    Ok(execute(&source, env))
}

/// Run a file once, then again every time it changes, each run in a
/// fresh environment. Blocks until the watcher shuts down.
pub fn watch_file(path: &Path) -> Result<()> {
    print_outcome(&run_file(path, &Environment::new_root())?);

    let (tx, rx) = unbounded();
    let mut watcher = FileWatcher::new(tx).context("Failed to create file watcher")?;
    watcher
        .watch(path)
        .with_context(|| format!("Failed to watch {}", path.display()))?;

    println!(
        "{} Watching {} for changes (Ctrl+C to stop)...",
        "👀".bright_cyan(),
        path.display().to_string().bright_green()
    );

    for res in rx {
        match res {
            Ok(event) => {
                for changed in changed_paths(event) {
                    println!(
                        "{} File changed: {}",
                        "⚡".bright_yellow(),
                        changed.display()
                    );
                    match run_file(&changed, &Environment::new_root()) {
                        Ok(outcome) => print_outcome(&outcome),
                        Err(e) => println!("{} {:#}", "Error:".bright_red().bold(), e),
                    }
                }
            }
            Err(e) => tracing::warn!("watch error: {}", e),
        }
    }

    Ok(())
}

pub fn print_outcome(outcome: &Outcome) {
    if let Some(text) = outcome.render() {
        println!("{}", text);
    }
}
