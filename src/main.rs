//! CLI tool that explains, parses, scope-traces and then runs a source file.

use std::process::ExitCode;

use scopetrace::report::{analysis_summary, syntax_diagnostic, token_listing};
use scopetrace::{AnalysisDriver, Config, ProcessExecutor, read_source, tokenize};

/// Install a stderr subscriber, only when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 2 {
        println!("Usage: scopetrace <path_to_source_file>");
        return ExitCode::FAILURE;
    }
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let path = &args[1];
    let source = match read_source(path) {
        Ok(source) => source,
        Err(e) => {
            println!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match tokenize(&source) {
        Ok(tokens) => match token_listing(&tokens) {
            Ok(listing) => print!("{listing}"),
            Err(e) => eprintln!("{path}: {e}"),
        },
        Err(e) => println!("Tokenization error: {e}"),
    }

    let mut driver = AnalysisDriver::new(ProcessExecutor::new(config.interpreter))
        .with_max_depth(config.max_depth);

    let analysis = match driver.analyze_source(&source) {
        Ok(analysis) => analysis,
        Err(e) => {
            print!("{}", syntax_diagnostic(&e));
            return ExitCode::FAILURE;
        }
    };
    print!("{}", analysis_summary(&analysis));

    println!("\nExecuting the code...\n");
    match driver.execute(&analysis.into_validated()) {
        Ok(()) => println!("\nCode executed successfully."),
        Err(e) => println!("Execution error: {e}"),
    }
    ExitCode::SUCCESS
}
