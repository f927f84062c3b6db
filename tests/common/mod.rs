#![allow(dead_code)]

use std::path::PathBuf;

use scopetrace::{Analysis, AnalysisDriver, BindingEvent, ExecutionError, Value};

/// Driver whose executor accepts everything.
pub fn driver() -> AnalysisDriver<impl FnMut(&str) -> Result<(), ExecutionError>> {
    AnalysisDriver::new(|_: &str| -> Result<(), ExecutionError> { Ok(()) })
}

/// Analyze `source`, panicking with the diagnostic if it does not parse.
pub fn analyze(source: &str) -> Analysis {
    driver()
        .analyze_source(source)
        .unwrap_or_else(|e| panic!("failed to parse:\n{source}\n--- error ---\n{e}"))
}

/// Trace as `(name, value)` pairs, oldest first.
pub fn trace_pairs(analysis: &Analysis) -> Vec<(String, Option<Value>)> {
    analysis
        .trace
        .iter()
        .map(|BindingEvent { name, value }| (name.clone(), value.clone()))
        .collect()
}

pub fn int(n: i64) -> Option<Value> {
    Some(Value::Int(n))
}

/// Write `contents` to a fresh file in the system temp directory.
pub fn write_temp(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("scopetrace-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write temp file");
    path
}
