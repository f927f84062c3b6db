//! End-to-end tests through the driver and the command-line binary.

mod common;

use std::process::{Command, Output};

use common::{driver, write_temp};
use scopetrace::{
    AnalysisDriver, Error, ExecutionError, SyntaxErrorKind, ValidatedSource, Value, analyze_str,
};

// -----------------------------------------------------------
// Library pipeline
// -----------------------------------------------------------

#[test]
fn run_file_analyzes_contents() {
    let path = write_temp("run_file.py", "greeting = 'hi'\nalias = greeting\n");
    let analysis = driver().run_file(&path).expect("analyzes");
    assert_eq!(analysis.scope.resolve("alias"), Some(Value::Str("hi".to_string())));
}

#[test]
fn run_file_reports_syntax_errors() {
    let path = write_temp("broken.py", "def f(:)\n    pass\n");
    let err = driver().run_file(&path).unwrap_err();
    let Error::Syntax(err) = err else {
        panic!("expected syntax error, got {err:?}");
    };
    assert_eq!(err.kind, SyntaxErrorKind::InvalidSyntax);
    assert_eq!(err.line, 1);
}

#[test]
fn execution_failure_is_a_value() {
    let mut driver = AnalysisDriver::new(|_: &str| -> Result<(), ExecutionError> {
        Err(ExecutionError::Runtime("name 'q' is not defined".to_string()))
    });
    let validated: ValidatedSource = driver
        .analyze_source("print(q)\n")
        .expect("parses")
        .into_validated();
    let err = driver.execute(&validated).unwrap_err();
    assert_eq!(err.to_string(), "name 'q' is not defined");
}

#[test]
fn configured_depth_reaches_analyzer() {
    let source = format!("x = {}\n", ["1"; 40].join(" + "));
    let analysis = driver().with_max_depth(10).analyze_source(&source).expect("parses");
    assert!(analysis.error.is_some());
    assert!(analysis.trace.is_empty());
}

#[test]
fn analyze_str_shortcut() {
    let analysis = analyze_str("a = 1\n").expect("analyzes");
    assert_eq!(analysis.trace.len(), 1);
    assert!(matches!(analyze_str("a = (\n"), Err(Error::Syntax(_))));
}

#[test]
fn long_expression_is_a_syntax_error() {
    let source = format!("total = 0{}\n", " + 1".repeat(200_000));
    let Err(Error::Syntax(err)) = analyze_str(&source) else {
        panic!("expected syntax error");
    };
    assert_eq!(err.kind, SyntaxErrorKind::TooComplex);
}

// -----------------------------------------------------------
// Command-line binary
// -----------------------------------------------------------

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scopetrace"))
        .args(args)
        .env("SCOPETRACE_INTERPRETER", "cat")
        .env_remove("RUST_LOG")
        .output()
        .expect("binary runs")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn cli_requires_one_argument() {
    let output = run_cli(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).starts_with("Usage:"));

    let output = run_cli(&["a.py", "b.py"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn cli_missing_file() {
    let output = run_cli(&["/nonexistent/scopetrace/missing.py"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "Error: The file '/nonexistent/scopetrace/missing.py' cannot be accessed or does not exist.\n"
    );
}

#[test]
fn cli_successful_run() {
    let path = write_temp("ok.py", "y = 5\nz = y\n");
    let output = run_cli(&[path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(0));

    let out = stdout(&output);
    assert!(out.starts_with("Token explanations:\nID= 68         Type= ENCODING  'utf-8'\n"));
    assert!(out.contains("ID= 1          Type=     NAME  'y'\n"));
    assert!(out.contains("Binding trace:\n  y = 5\n  z = 5\n"));
    assert!(out.contains("\nExecuting the code...\n"));
    assert!(out.trim_end().ends_with("Code executed successfully."));

    let listing = out.find("Token explanations:").expect("listing");
    let trace = out.find("Binding trace:").expect("trace");
    let executing = out.find("Executing the code...").expect("execution");
    assert!(listing < trace && trace < executing);
}

#[test]
fn cli_syntax_error_skips_execution() {
    let path = write_temp("bad.py", "x = 1\nif x\n    pass\n");
    let output = run_cli(&[path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(1));

    let out = stdout(&output);
    assert!(out.contains(
        "Syntax Error Detected:\nLine 2: expected ':'\nError at text: 'if x' near position 5\n"
    ));
    assert!(!out.contains("Executing the code..."));
}

#[test]
fn cli_reports_execution_failure_without_failing() {
    let path = write_temp("exec_fail.py", "a = 1\n");
    let output = Command::new(env!("CARGO_BIN_EXE_scopetrace"))
        .arg(&path)
        .env("SCOPETRACE_INTERPRETER", "scopetrace-no-such-interpreter")
        .output()
        .expect("binary runs");
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Execution error: cannot start interpreter"));
}

#[test]
fn cli_rejects_invalid_config() {
    let path = write_temp("config.py", "a = 1\n");
    let output = Command::new(env!("CARGO_BIN_EXE_scopetrace"))
        .arg(&path)
        .env("SCOPETRACE_MAX_DEPTH", "lots")
        .output()
        .expect("binary runs");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("SCOPETRACE_MAX_DEPTH"));
}
