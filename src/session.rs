//! Execution context threading one source through scan → parse → resolve →
//! interpret.
//!
//! A [`Session`] owns the [`Interpreter`] (and so the global scope), which
//! lets REPL lines build on each other. Every run hands back a [`Report`]
//! instead of touching process-wide flags; the caller decides what to print
//! and which exit status to use.

use std::io::{Stdout, Write};

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// sysexits `EX_DATAERR`: the program was rejected before running.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// sysexits `EX_SOFTWARE`: the program stopped on a runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Outcome of one [`Session::run`] or [`Session::run_repl_line`].
#[derive(Debug, Default)]
pub struct Report {
    /// Lexical, syntax and resolution errors, in the order found.
    pub static_errors: Vec<LoxError>,

    /// The runtime error that halted execution, if any.
    pub runtime_error: Option<LoxError>,
}

impl Report {
    pub fn had_error(&self) -> bool {
        !self.static_errors.is_empty()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.runtime_error.is_some()
    }

    pub fn is_ok(&self) -> bool {
        !self.had_error() && !self.had_runtime_error()
    }

    /// 0 on success, 65 for static errors, 70 for a runtime error.
    pub fn exit_code(&self) -> i32 {
        if self.had_error() {
            EXIT_STATIC_ERROR
        } else if self.had_runtime_error() {
            EXIT_RUNTIME_ERROR
        } else {
            0
        }
    }

    /// Every diagnostic, static ones first.
    pub fn errors(&self) -> impl Iterator<Item = &LoxError> {
        self.static_errors.iter().chain(self.runtime_error.iter())
    }
}

pub struct Session<W: Write = Stdout> {
    interpreter: Interpreter<W>,
    /// Next unused expression id; ids stay unique across every parse.
    next_id: usize,
}

impl Session<Stdout> {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }
}

impl Default for Session<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Session<W> {
    /// A session whose `print` output goes to `output`.
    pub fn with_output(output: W) -> Self {
        Self::with_interpreter(Interpreter::with_output(output))
    }

    pub fn with_interpreter(interpreter: Interpreter<W>) -> Self {
        info!("Session created");
        Self {
            interpreter,
            next_id: 0,
        }
    }

    pub fn output(&self) -> &W {
        self.interpreter.output()
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }

    /// Run `source` as a whole program.
    ///
    /// Nothing executes unless scanning, parsing and resolution were all
    /// clean; execution stops at the first runtime error.
    pub fn run(&mut self, source: &str) -> Report {
        info!("Running program ({} bytes)", source.len());

        let mut report = Report::default();

        let (tokens, lex_errors) = Scanner::new(source).scan_all();
        report.static_errors.extend(lex_errors);

        let mut parser = Parser::with_first_id(tokens, self.next_id);
        let statements = parser.parse();
        self.next_id = parser.next_id();
        report.static_errors.extend(parser.take_errors());

        if report.had_error() {
            info!("Skipping execution: {} static error(s)", report.static_errors.len());
            return report;
        }

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            report.static_errors = errors;
            return report;
        }

        if let Err(error) = self.interpreter.interpret(&statements) {
            debug!("Runtime error: {}", error);
            report.runtime_error = Some(error);
        }

        report
    }

    /// Run one line of interactive input.
    ///
    /// Declarations are parsed, resolved and executed one at a time, so a
    /// bare expression statement echoes its value. The first error of any
    /// kind ends the line; globals defined before it persist.
    pub fn run_repl_line(&mut self, line: &str) -> Report {
        debug!("REPL line: {:?}", line);

        let mut report = Report::default();

        let (tokens, lex_errors) = Scanner::new(line).scan_all();
        if !lex_errors.is_empty() {
            report.static_errors = lex_errors;
            return report;
        }

        let mut parser = Parser::with_first_id(tokens, self.next_id);

        while !parser.is_at_end() {
            let stmt: Option<Stmt> = parser.parse_one_declaration();
            self.next_id = parser.next_id();

            // Non-fatal parse errors still yield a statement; refuse it too.
            let errors = parser.take_errors();
            if !errors.is_empty() {
                report.static_errors = errors;
                break;
            }

            let Some(stmt) = stmt else {
                break;
            };

            if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(std::slice::from_ref(&stmt)) {
                report.static_errors = errors;
                break;
            }

            if let Err(error) = self.interpreter.repl_execute(&stmt) {
                report.runtime_error = Some(error);
                break;
            }
        }

        report
    }
}
