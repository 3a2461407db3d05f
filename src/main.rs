use std::{fs::read_to_string, path::PathBuf, process::ExitCode, time::Instant};

use clap::Parser;
use knightc::{compile_sources, format_diagnostic, format_error, Options};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "knightc")]
#[command(about = "Checks Knight source files", long_about = None)]
struct Cli {
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Only report errors.
    #[arg(long)]
    no_warnings: bool,

    /// Skip the remaining passes once a pass reports an error.
    #[arg(long)]
    stop_on_error: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = Options {
        warnings: !cli.no_warnings,
        continue_after_errors: !cli.stop_on_error,
    };

    let mut sources = Vec::with_capacity(cli.files.len());
    for path in cli.files.iter() {
        match read_to_string(path) {
            Ok(contents) => sources.push((path.to_string_lossy().into_owned(), contents)),
            Err(err) => {
                error!(path = %path.display(), "failed to read file: {}", err);
                return ExitCode::FAILURE;
            }
        }
    }

    let start = Instant::now();
    let compilation = match compile_sources(&sources, &options) {
        Ok(compilation) => compilation,
        Err(err) => {
            let source = source_of(&sources, &err.get_position().file);
            println!("{}", format_error(&err, source));
            return ExitCode::FAILURE;
        }
    };
    debug!("checked {} file(s) in {:?}", sources.len(), start.elapsed());

    for diagnostic in compilation.diagnostics.iter() {
        let source = source_of(&sources, &diagnostic.position.file);
        println!("{}\n", format_diagnostic(diagnostic, source));
    }

    if compilation.has_errors() {
        println!(
            "{} error(s) found",
            compilation.diagnostics.error_count()
        );
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn source_of<'a>(sources: &'a [(String, String)], file: &str) -> &'a str {
    sources
        .iter()
        .find(|(name, _)| name == file)
        .map(|(_, contents)| contents.as_str())
        .unwrap_or("")
}
