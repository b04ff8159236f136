use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox_interpreter as lox;

use lox::ast_printer::AstPrinter;
use lox::parser::Parser;
use lox::scanner::Scanner;
use lox::session::{Report, Session, EXIT_STATIC_ERROR};

/// Deep Lox recursion maps onto the host stack, so programs run on a
/// thread with a generous one.
const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default)
    Repl,

    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints the AST of every statement
    Parse { filename: PathBuf },
}

/// Reads a whole source file as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // `[module:line] - message`, crate prefix stripped
    Builder::new()
        .format(|buf, record| {
            let path = record.module_path().unwrap_or("<unnamed>");
            let module = path.strip_prefix("rox_interpreter::").unwrap_or(path);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn print_report(report: &Report) {
    for error in report.errors() {
        eprintln!("{}", error);
    }
}

fn run_file(filename: &Path) -> Result<ExitCode> {
    info!("Running Run subcommand");
    let source = read_file(filename)?;

    let code = std::thread::Builder::new()
        .name("interpreter".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || {
            let mut session = Session::new();
            let report = session.run(&source);
            print_report(&report);
            report.exit_code()
        })
        .context("Failed to spawn interpreter thread")?
        .join()
        .map_err(|_| anyhow::anyhow!("Interpreter thread panicked"))?;

    info!("Run finished with exit code {}", code);
    Ok(exit_code(code))
}

fn run_prompt() -> Result<ExitCode> {
    info!("Starting REPL");

    std::thread::Builder::new()
        .name("interpreter".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(|| -> Result<()> {
            let mut session = Session::new();
            let stdin = io::stdin();
            let mut lines = stdin.lock().lines();

            loop {
                print!("> ");
                io::stdout().flush().context("Failed to flush prompt")?;

                let Some(line) = lines.next() else {
                    println!();
                    break;
                };
                let line = line.context("Failed to read from stdin")?;

                let report = session.run_repl_line(&line);
                print_report(&report);
            }

            Ok(())
        })
        .context("Failed to spawn interpreter thread")?
        .join()
        .map_err(|_| anyhow::anyhow!("Interpreter thread panicked"))??;

    info!("REPL finished");
    Ok(ExitCode::SUCCESS)
}

fn tokenize(filename: &Path, json: bool) -> Result<ExitCode> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if json {
                    let line = serde_json::to_string(&token).context("Failed to serialize token")?;
                    println!("{}", line);
                } else {
                    println!("{}", token);
                }
            }

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        return Ok(exit_code(EXIT_STATIC_ERROR));
    }

    info!("Tokenization completed successfully");
    Ok(ExitCode::SUCCESS)
}

fn parse(filename: &Path) -> Result<ExitCode> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;

    let (tokens, lex_errors) = Scanner::new(&source).scan_all();
    let mut parser = Parser::new(tokens);
    let statements = parser.parse();

    let errors: Vec<_> = lex_errors.into_iter().chain(parser.take_errors()).collect();

    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }
        return Ok(exit_code(EXIT_STATIC_ERROR));
    }

    let printer = AstPrinter;
    for stmt in &statements {
        let ast = printer.print_stmt(stmt);
        debug!("AST: {}", ast);
        println!("{}", ast);
    }

    info!("Parse subcommand completed");
    Ok(ExitCode::SUCCESS)
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn main() -> Result<ExitCode> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Some(Commands::Run { filename }) => run_file(&filename),
        Some(Commands::Repl) | None => run_prompt(),
        Some(Commands::Tokenize { filename, json }) => tokenize(&filename, json),
        Some(Commands::Parse { filename }) => parse(&filename),
    }
}
