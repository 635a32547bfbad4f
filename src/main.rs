use anyhow::{bail, Context, Result};
use clap::Parser;
use kestrel::runner::{self, print_outcome, Outcome};
use kestrel_core::parser::{render_diagnostics, Parser as SourceParser};
use kestrel_core::runtime::Environment;
use std::path::{Path, PathBuf};

/// Kestrel - a small expression language with closures and quoting
#[derive(Parser, Debug)]
#[command(name = "kestrel")]
#[command(about = "Run kestrel programs or start a REPL", long_about = None)]
struct Args {
    /// Source file to run (starts the REPL when omitted)
    file: Option<PathBuf>,

    /// Evaluate an expression and exit
    #[arg(short, long, value_name = "EXPR", conflicts_with = "file")]
    eval: Option<String>,

    /// Re-run FILE every time it changes
    #[arg(long, requires = "file")]
    watch: bool,

    /// Print the parsed program as JSON instead of evaluating it
    #[arg(long)]
    dump_ast: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{fmt, EnvFilter};

    // KESTREL_LOG controls the log level, default WARN
    let filter = EnvFilter::try_from_env("KESTREL_LOG").or_else(|_| EnvFilter::try_new("warn"))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    if let Some(expr) = args.eval {
        return if args.dump_ast {
            dump_ast(&expr)
        } else {
            report(runner::execute(&expr, &Environment::new_root()))
        };
    }

    let Some(path) = args.file else {
        return kestrel::repl::start();
    };

    if args.dump_ast {
        let source = read_source(&path)?;
        return dump_ast(&source);
    }

    if args.watch {
        return runner::watch_file(&path);
    }

    report(runner::run_file(&path, &Environment::new_root())?)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Print the outcome; failures make the process exit non-zero
fn report(outcome: Outcome) -> Result<()> {
    match &outcome {
        Outcome::Diagnostics(errors) => {
            eprintln!("{}", render_diagnostics(errors));
            bail!("{} parse error(s)", errors.len());
        }
        Outcome::Value(value) if value.is_error() => {
            print_outcome(&outcome);
            bail!("runtime error");
        }
        _ => {
            print_outcome(&outcome);
            Ok(())
        }
    }
}

fn dump_ast(source: &str) -> Result<()> {
    let mut parser = SourceParser::from_source(source);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        eprintln!("{}", render_diagnostics(parser.errors()));
        bail!("{} parse error(s)", parser.errors().len());
    }

    let json = serde_json::to_string_pretty(&program).context("Failed to serialize AST")?;
    println!("{}", json);
    Ok(())
}
