//! Text rendering for the command-line report.

use crate::driver::Analysis;
use crate::lexer::{HostToken, UnknownKindCode, explain_token};
use crate::parser::SyntaxError;

/// One token listing row: `ID= <code> Type= <name>  '<text>'`.
///
/// # Errors
///
/// Returns `UnknownKindCode` when the token's code has no name.
pub fn token_line(token: &HostToken) -> Result<String, UnknownKindCode> {
    let row = explain_token(token)?;
    Ok(format!(
        "ID= {:<10} Type= {:>8}  '{}'",
        row.id,
        row.kind,
        row.text
    ))
}

/// Header plus one row per token.
///
/// # Errors
///
/// Returns `UnknownKindCode` for the first token whose code has no name.
pub fn token_listing(tokens: &[HostToken]) -> Result<String, UnknownKindCode> {
    let mut out = String::from("Token explanations:\n");
    for token in tokens {
        out.push_str(&token_line(token)?);
        out.push('\n');
    }
    Ok(out)
}

/// Three-line syntax diagnostic.
#[must_use]
pub fn syntax_diagnostic(err: &SyntaxError) -> String {
    let offset = err
        .offset
        .map_or_else(|| "None".to_string(), |offset| offset.to_string());
    format!(
        "Syntax Error Detected:\nLine {}: {}\nError at text: '{}' near position {offset}\n",
        err.line,
        err.message(),
        err.text_or_placeholder().trim()
    )
}

/// Analysis error, if any, followed by the binding trace oldest first.
#[must_use]
pub fn analysis_summary(analysis: &Analysis) -> String {
    let mut out = String::new();
    if let Some(err) = &analysis.error {
        out.push_str(&format!("Semantic Analysis Error: {err}\n"));
    }
    if analysis.trace.is_empty() {
        out.push_str("Binding trace: (empty)\n");
        return out;
    }
    out.push_str("Binding trace:\n");
    for event in &analysis.trace {
        out.push_str(&format!("  {event}\n"));
    }
    out
}
