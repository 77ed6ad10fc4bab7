//! Aua CLI
//!
//! Runs scripts, hosts the interactive REPL, and dumps front-end stages
//! for debugging. Program output goes to stdout; logs and diagnostics go
//! to stderr, so piping script output stays clean.

use std::io;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::time::Instant;

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use rustyline::error::ReadlineError;

use aua_compiler::{Lexer, Parser};
use aua_core::Document;
use aua_runtime::{HttpModelClient, Value, Vm};

#[derive(ClapParser)]
#[command(name = "aua")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aua interpreter - a generative scripting language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an .aua script
    Run {
        /// Input source file
        input: PathBuf,

        /// Report wall-clock execution time on stderr
        #[arg(long)]
        time: bool,
    },

    /// Start an interactive session
    Repl,

    /// Dump the token stream of a source file
    Tokens {
        /// Input source file
        input: PathBuf,
    },

    /// Dump the parsed AST of a source file
    Ast {
        /// Input source file
        input: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    // Logs go to stderr; RUST_LOG controls verbosity.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(message) = dispatch(cli.command) {
        eprintln!("{}", message);
        process::exit(1);
    }
}

fn dispatch(command: Commands) -> Result<(), String> {
    match command {
        Commands::Run { input, time } => run_file(&input, time),
        Commands::Repl => repl(),
        Commands::Tokens { input } => dump_tokens(&input),
        Commands::Ast { input } => dump_ast(&input),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "aua", &mut io::stdout());
            Ok(())
        }
    }
}

fn read_document(path: &PathBuf) -> Result<Document, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    Ok(Document::new(path.display().to_string(), text))
}

fn run_file(path: &PathBuf, time: bool) -> Result<(), String> {
    let doc = read_document(path)?;
    let client = HttpModelClient::from_env().map_err(|e| e.to_string())?;
    let mut vm = Vm::new(Rc::new(client));

    let started = Instant::now();
    let value = vm.eval_source(&doc).map_err(|e| e.to_string())?;
    if time {
        eprintln!("finished in {:?}", started.elapsed());
    }
    if value != Value::Nihil {
        println!("{}", value.inspect());
    }
    Ok(())
}

fn repl() -> Result<(), String> {
    let client = HttpModelClient::from_env().map_err(|e| e.to_string())?;
    let mut vm = Vm::new(Rc::new(client));

    let mut editor = rustyline::DefaultEditor::new().map_err(|e| e.to_string())?;
    let history = home::home_dir().map(|dir| dir.join(".aua_history"));
    if let Some(history) = &history {
        // Missing history is fine on first run.
        let _ = editor.load_history(history);
    }

    loop {
        match editor.readline("aua> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);
                let doc = Document::new("<repl>", line);
                match vm.eval_source(&doc) {
                    Ok(value) => {
                        if value != Value::Nihil {
                            println!("{}", value.inspect());
                        }
                    }
                    // Errors end the line, not the session.
                    Err(e) => eprintln!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.to_string()),
        }
    }

    if let Some(history) = &history {
        let _ = editor.save_history(history);
    }
    Ok(())
}

fn dump_tokens(path: &PathBuf) -> Result<(), String> {
    let doc = read_document(path)?;
    let tokens = Lexer::new(&doc).tokenize().map_err(|e| e.to_string())?;
    for token in tokens {
        println!(
            "{:>4}:{:<3} {:?}",
            token.location.line + 1,
            token.location.column + 1,
            token.kind
        );
    }
    Ok(())
}

fn dump_ast(path: &PathBuf) -> Result<(), String> {
    let doc = read_document(path)?;
    let ast = Parser::parse_document(&doc).map_err(|e| e.to_string())?;
    println!("{:#?}", ast);
    Ok(())
}
