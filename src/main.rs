// jstepper: step-by-step interpreter for a teaching subset of Java

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use env_logger::Builder;
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};

use jstepper::interpreter::checker::Checker;
use jstepper::parser::ast::{DocId, Type};
use jstepper::parser::lexer::Scanner;
use jstepper::parser::ParserOptions;
use jstepper::ui::App;
use jstepper::{Error, Session, SessionConfig};

/// Exit code for lexical, syntax and type errors
const EXIT_STATIC_ERROR: u8 = 65;
/// Exit code for errors raised while executing
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Step-by-step interpreter for a teaching subset of Java", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable logging to jstepper.log
    #[arg(long, global = true)]
    log: bool,

    /// Maximum number of nested method calls
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Maximum number of iterations of a single loop
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Accept programs whose indentation does not match their structure
    #[arg(long, global = true)]
    no_indent_check: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tokens of a file
    Tokenize { filename: PathBuf },

    /// Parse and type check a file without running it
    Check { filename: PathBuf },

    /// Run a file to completion and print its top-level variables
    Run { filename: PathBuf },

    /// Step through a file in the terminal UI
    Debug { filename: PathBuf },
}

fn init_logger() -> io::Result<()> {
    let log_file = File::create("jstepper.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("jstepper::").unwrap_or(module);
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
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to jstepper.log");
    Ok(())
}

/// Print an error with its position and the offending source line
fn report(session: &Session, error: &Error) {
    let Some(loc) = error.loc() else {
        eprintln!("{}: {}", error.kind_name(), error);
        return;
    };
    let sources = session.sources();
    eprintln!("{} at {}: {}", error.kind_name(), sources.describe(loc), error);
    if let Some(document) = sources.get(loc.doc) {
        let (line, column) = sources.line_col(loc);
        eprintln!("{:4} | {}", line, document.line_text(line - 1));
        eprintln!("     | {}^", " ".repeat(column - 1));
    }
}

fn exit_code(error: &Error) -> ExitCode {
    if error.is_static() {
        ExitCode::from(EXIT_STATIC_ERROR)
    } else {
        ExitCode::from(EXIT_RUNTIME_ERROR)
    }
}

fn open(cli: &Cli, filename: &Path) -> io::Result<(Session, DocId)> {
    info!("Reading file: {:?}", filename);
    let source = fs::read_to_string(filename)?;

    let mut config = SessionConfig::default();
    if let Some(depth) = cli.max_depth {
        config.max_call_depth = depth;
    }
    if let Some(iterations) = cli.max_iterations {
        config.max_loop_iterations = iterations;
    }
    let mut session = Session::new(config);
    session.set_parser_options(ParserOptions {
        check_indentation: !cli.no_indent_check,
    });
    let doc = session.add_document(filename.display().to_string(), source);
    Ok((session, doc))
}

fn tokenize(session: &Session, doc: DocId) -> Result<(), Error> {
    let text = session.sources().text(doc);
    for (kind, loc) in Scanner::new(doc, text).tokenize()? {
        let (line, column) = session.sources().line_col(loc);
        println!("{}:{} {} {}", line, column, kind, session.sources().snippet(loc));
    }
    Ok(())
}

fn run(session: &mut Session, doc: DocId) -> Result<(), Error> {
    let statements = session.load_script(doc)?;
    session.execute_statements(&statements)?;
    for binding in session.call_stack().toplevel_bindings() {
        println!(
            "{}: {} = {}",
            binding.name,
            binding.ty,
            session.render_value(binding.value)
        );
    }
    Ok(())
}

/// Load and check a script without running it; returns its statement count
fn check(session: &mut Session, doc: DocId) -> Result<usize, Error> {
    let statements = session.load_script(doc)?;
    Checker::for_toplevel(session.program(), std::iter::empty::<(&str, &Type)>())
        .check_statements(&statements)?;
    Ok(statements.len())
}

fn debug(mut session: Session, doc: DocId) -> Result<(), Box<dyn std::error::Error>> {
    let statements = session.load_script(doc)?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, doc, statements);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.log {
        if let Err(err) = init_logger() {
            eprintln!("Error: failed to create jstepper.log: {}", err);
            return ExitCode::FAILURE;
        }
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }
    info!("CLI arguments: {:?}", cli);

    let filename = match &cli.command {
        Commands::Tokenize { filename }
        | Commands::Check { filename }
        | Commands::Run { filename }
        | Commands::Debug { filename } => filename.clone(),
    };
    let (mut session, doc) = match open(&cli, &filename) {
        Ok(opened) => opened,
        Err(err) => {
            eprintln!("Error: cannot read '{}': {}", filename.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Tokenize { .. } => tokenize(&session, doc),
        Commands::Check { .. } => check(&mut session, doc).map(|statements| {
            println!(
                "ok: {} classes, {} top-level methods, {} statements",
                session.program().classes().len(),
                session.program().methods().len(),
                statements
            );
        }),
        Commands::Run { .. } => run(&mut session, doc),
        Commands::Debug { .. } => {
            // Static errors are reported before the terminal is taken over
            if let Err(error) = check(&mut session, doc) {
                report(&session, &error);
                return exit_code(&error);
            }
            return match debug(session, doc) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("Error: {}", err);
                    ExitCode::FAILURE
                }
            };
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&session, &error);
            exit_code(&error)
        }
    }
}
