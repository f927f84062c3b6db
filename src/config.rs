//! Runtime settings read from the environment.

use std::fmt;

use crate::analyzer::DEFAULT_MAX_DEPTH;

/// Variable naming the interpreter used to run validated source.
pub const INTERPRETER_VAR: &str = "SCOPETRACE_INTERPRETER";
/// Variable overriding the analyzer recursion bound.
pub const MAX_DEPTH_VAR: &str = "SCOPETRACE_MAX_DEPTH";

const DEFAULT_INTERPRETER: &str = "python3";

/// Classifies a configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Empty,
    NotANumber(String),
    Zero,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "value is empty"),
            Self::NotANumber(raw) => write!(f, "'{raw}' is not a positive integer"),
            Self::Zero => write!(f, "value must be at least 1"),
        }
    }
}

/// Invalid value in an environment variable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {var}: {kind}")]
pub struct ConfigError {
    pub var: &'static str,
    pub kind: ConfigErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Program that receives validated source on stdin.
    pub interpreter: String,
    /// Recursion bound for the scope analyzer.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its
    /// value. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(INTERPRETER_VAR) {
            let interpreter = raw.trim();
            if interpreter.is_empty() {
                return Err(ConfigError {
                    var: INTERPRETER_VAR,
                    kind: ConfigErrorKind::Empty,
                });
            }
            config.interpreter = interpreter.to_string();
        }

        if let Some(raw) = lookup(MAX_DEPTH_VAR) {
            config.max_depth = parse_depth(raw)?;
        }

        Ok(config)
    }
}

fn parse_depth(raw: String) -> Result<usize, ConfigError> {
    let kind = match raw.trim().parse::<usize>() {
        Ok(0) => ConfigErrorKind::Zero,
        Ok(depth) => return Ok(depth),
        Err(_) => ConfigErrorKind::NotANumber(raw),
    };
    Err(ConfigError {
        var: MAX_DEPTH_VAR,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |var| {
            pairs
                .iter()
                .find(|(name, _)| *name == var)
                .map(|(_, value)| (*value).to_string())
        }
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, Config::default());
        assert_eq!(config.interpreter, "python3");
        assert_eq!(config.max_depth, 500);
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            (INTERPRETER_VAR, "pypy3"),
            (MAX_DEPTH_VAR, " 64 "),
        ]))
        .expect("valid overrides");
        assert_eq!(config.interpreter, "pypy3");
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn invalid_depth() {
        let err = Config::from_lookup(lookup(&[(MAX_DEPTH_VAR, "deep")])).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::NotANumber("deep".to_string()));
        assert_eq!(
            err.to_string(),
            "invalid SCOPETRACE_MAX_DEPTH: 'deep' is not a positive integer"
        );

        let err = Config::from_lookup(lookup(&[(MAX_DEPTH_VAR, "0")])).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::Zero);
    }

    #[test]
    fn empty_interpreter() {
        let err = Config::from_lookup(lookup(&[(INTERPRETER_VAR, "  ")])).unwrap_err();
        assert_eq!(err.var, INTERPRETER_VAR);
        assert_eq!(err.kind, ConfigErrorKind::Empty);
    }
}
