//! charon-driver - parse Charon source files and report their diagnostics
//!
//! USAGE:
//!     charon-driver [OPTIONS] [FILE...]
//!
//! ARGS:
//!     <FILE>...    Path(s) to source file(s) to parse (use '-' for stdin)
//!
//! OPTIONS:
//!     -h, --help       Print help information
//!     -s, --symbols    Also print the file's top-level symbol table
//!     --log <LEVEL>    Logging level (error, warn, info, debug, trace); default: warn

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use charon_driver::Workspace;
use tracing_subscriber::EnvFilter;

enum Input {
    File(PathBuf),
    Stdin,
}

struct Args {
    inputs: Vec<Input>,
    show_symbols: bool,
    log_level: String,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mut inputs = Vec::new();
        let mut show_symbols = false;
        let mut log_level = "warn".to_string();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => {
                    print_help();
                    process::exit(0);
                }
                "-s" | "--symbols" => show_symbols = true,
                "--log" => log_level = args.next().ok_or("--log requires a level")?,
                "-" => inputs.push(Input::Stdin),
                path if path.starts_with('-') => return Err(format!("unknown option: {path}")),
                path => inputs.push(Input::File(PathBuf::from(path))),
            }
        }

        if inputs.is_empty() {
            inputs.push(Input::Stdin);
        }
        Ok(Self { inputs, show_symbols, log_level })
    }
}

fn print_help() {
    println!(
        "charon-driver - parse Charon source files and report their diagnostics\n\n\
         USAGE:\n    charon-driver [OPTIONS] [FILE...]\n\n\
         ARGS:\n    <FILE>...    Path(s) to source file(s) to parse (use '-' for stdin)\n\n\
         OPTIONS:\n    -h, --help       Print help information\n    \
         -s, --symbols    Also print the file's top-level symbol table\n    \
         --log <LEVEL>    Logging level (error, warn, info, debug, trace); default: warn"
    );
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level)).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn read_input(input: &Input) -> io::Result<String> {
    match input {
        Input::File(path) => fs::read_to_string(path),
        Input::Stdin => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn main() {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("Try 'charon-driver --help' for more information.");
            process::exit(1);
        }
    };

    init_logging(&args.log_level);

    let workspace = Workspace::new();
    let mut had_error = false;

    for input in &args.inputs {
        let uri = match input {
            Input::File(path) => path.display().to_string(),
            Input::Stdin => "<stdin>".to_string(),
        };

        let text = match read_input(input) {
            Ok(text) => text,
            Err(error) => {
                eprintln!("error reading {uri}: {error}");
                had_error = true;
                continue;
            }
        };

        let report = workspace.open(&uri, &text);
        if report.diagnostics.is_empty() {
            tracing::info!(%uri, "parsed with no diagnostics");
        } else {
            had_error = true;
            for diagnostic in report.diagnostics.iter() {
                let position = offset_to_line_col(&text, diagnostic.span.start);
                println!("{uri}:{}:{}: {}", position.0, position.1, diagnostic.kind);
            }
        }

        if args.show_symbols {
            if let Some(table) = workspace.symbol_table(&uri) {
                print_symbol_table(&workspace, &table, 0);
            }
        }
    }

    if had_error {
        process::exit(1);
    }
}

fn print_symbol_table(workspace: &Workspace, table: &charon_symbols::SymbolTable, depth: usize) {
    let indent = "  ".repeat(depth);
    for &key in &table.symbols {
        let Some(symbol) = workspace.symbols().symbol(key) else { continue };
        println!("{indent}{:?} {}", symbol.kind, symbol.name);
        if let Some(nested_key) = symbol.nested_table {
            if let Some(nested) = workspace.symbols().table(nested_key) {
                print_symbol_table(workspace, &nested, depth + 1);
            }
        }
    }
}

/// One-based (line, UTF-16 column) for a byte offset, for human-readable
/// diagnostic output; not the LSP-facing [`Position`] translation, which
/// callers should get from a document's own line index instead.
fn offset_to_line_col(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut last_newline = 0usize;
    for (i, byte) in text.as_bytes().iter().enumerate().take(offset) {
        if *byte == b'\n' {
            line += 1;
            last_newline = i + 1;
        }
    }
    let column = text[last_newline..offset].chars().count() + 1;
    (line, column)
}
