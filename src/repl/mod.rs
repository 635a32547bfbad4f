//! REPL (Read-Eval-Print Loop) for the kestrel language

use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use crate::repl::watcher::{changed_paths, FileWatcher};
use crate::runner::{self, print_outcome};
use anyhow::{anyhow, Result};
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use notify::Event;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};
use std::path::Path;
use std::thread;

pub mod watcher;

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

/// Whether the loop keeps going after handling an event
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Interactive REPL for the kestrel language
pub struct Repl {
    editor: Option<DefaultEditor>,
    /// Session state shared with command handlers
    ctx: CommandContext,
    registry: CommandRegistry,

    // Event channels
    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
    tx_watcher: Sender<notify::Result<Event>>,
    rx_watcher: Receiver<notify::Result<Event>>,

    // File watcher, created on first `watch`
    watcher: Option<FileWatcher>,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new() -> RustylineResult<Self> {
        let editor = DefaultEditor::new()?;
        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();

        Ok(Repl {
            editor: Some(editor),
            ctx: CommandContext::new(),
            registry: create_registry(),
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            watcher: None,
        })
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!(
            "{} {}",
            "🪶".bright_yellow(),
            "Kestrel".bright_cyan().bold()
        );
        println!(
            "Type expressions like: {}, {}, {}",
            "1 + 2 * 3".cyan(),
            "let add = fn(a, b) { a + b };".cyan(),
            "add(1, 2)".cyan()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );

        // Reading blocks, so it happens off the loop thread
        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| anyhow!("REPL is already running"))?;
        let tx_input = self.tx_input.clone();

        thread::spawn(move || loop {
            let prompt = format!("{} ", "kestrel>".bright_magenta().bold());
            let readline = editor.readline(&prompt);

            match readline {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = editor.add_history_entry(&line);
                    }
                    if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(ReplEvent::Input(Err(err)));
                    break;
                }
            }
        });

        loop {
            let flow = crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => self.handle_line(&line),
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted | ReadlineError::Eof))) => {
                        Flow::Exit
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        Flow::Exit
                    }
                    Err(_) => Flow::Exit, // Channel closed
                },

                recv(self.rx_watcher) -> msg => match msg {
                    Ok(Ok(event)) => {
                        for path in changed_paths(event) {
                            self.reload(&path);
                        }
                        Flow::Continue
                    }
                    Ok(Err(e)) => {
                        println!("{} Watch error: {}", "Error:".red(), e);
                        Flow::Continue
                    }
                    Err(_) => Flow::Exit,
                }
            };

            if flow == Flow::Exit {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
        }

        Ok(())
    }

    /// Run one line: a command if it matches one, source otherwise
    fn handle_line(&mut self, line: &str) -> Flow {
        if line.is_empty() {
            return Flow::Continue;
        }

        match self.registry.execute(line, &mut self.ctx) {
            CommandResult::Success => {}
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::Exit => return Flow::Exit,
            CommandResult::Error(e) => {
                println!("{} {}", "Error:".bright_red().bold(), e.red())
            }
            CommandResult::Watch(path) => self.watch(&path),
            CommandResult::NotACommand => print_outcome(&self.ctx.execute(line)),
        }

        Flow::Continue
    }

    fn watch(&mut self, path: &str) {
        if self.watcher.is_none() {
            match FileWatcher::new(self.tx_watcher.clone()) {
                Ok(w) => self.watcher = Some(w),
                Err(e) => {
                    println!("{} Failed to create watcher: {}", "Error:".red(), e);
                    return;
                }
            }
        }

        if let Some(w) = &mut self.watcher {
            match w.watch(path) {
                Ok(()) => {
                    println!(
                        "{} Watching {} for changes...",
                        "👀".bright_cyan(),
                        path.bright_green()
                    );
                    // Run it once so its bindings are available right away
                    self.reload(Path::new(path));
                }
                Err(e) => println!("{} Failed to watch {}: {}", "Error:".red(), path, e),
            }
        }
    }

    /// Re-run a watched file in the session environment
    fn reload(&mut self, path: &Path) {
        println!("{} Reloading {}", "⚡".bright_yellow(), path.display());

        match runner::run_file(path, &self.ctx.env) {
            Ok(outcome) => {
                let failed = outcome.is_failure();
                print_outcome(&outcome);
                if !failed {
                    println!("{} Reloaded successfully", "✓".bright_green());
                }
            }
            Err(e) => println!("{} {:#}", "Error:".red(), e),
        }
    }
}

/// Convenience function to start the REPL
pub fn start() -> Result<()> {
    let mut repl = Repl::new().map_err(|e| anyhow!("Failed to initialize REPL: {}", e))?;
    repl.run()
}
