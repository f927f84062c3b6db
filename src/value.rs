//! Literal values bound to names during analysis.

use std::fmt;

/// A literal value.
///
/// Name resolution yields `Option<Value>`; `None` there is the unresolved
/// marker and is distinct from [`Value::None`], the `None` literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    /// Integer literal that does not fit in `i64`, kept as written
    /// without separators.
    BigInt(String),
    Float(f64),
    /// Imaginary literal; the value is the imaginary part.
    Complex(f64),
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
    None,
    Ellipsis,
}

impl Value {
    /// Value of a numeric literal as it appears in source.
    ///
    /// Returns `None` when the text is not a well-formed literal.
    #[must_use]
    pub fn from_number_literal(text: &str) -> Option<Self> {
        let digits: String = text.chars().filter(|&c| c != '_').collect();
        let lower = digits.to_ascii_lowercase();

        if let Some(imag) = lower.strip_suffix('j') {
            return imag.parse::<f64>().ok().map(Self::Complex);
        }

        let radix = match lower.get(..2) {
            Some("0x") => Some(16),
            Some("0o") => Some(8),
            Some("0b") => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            let parsed = i64::from_str_radix(&lower[2..], radix);
            return Some(match parsed {
                Ok(n) => Self::Int(n),
                Err(_) => Self::BigInt(lower),
            });
        }

        if lower.contains(['.', 'e']) {
            return lower.parse::<f64>().ok().map(Self::Float);
        }

        if !lower.bytes().all(|b| b.is_ascii_digit()) || lower.is_empty() {
            return None;
        }
        let parsed = lower.parse::<i64>();
        Some(match parsed {
            Ok(n) => Self::Int(n),
            Err(_) => Self::BigInt(lower),
        })
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) | Self::BigInt(_) => "int",
            Self::Float(_) => "float",
            Self::Complex(_) => "complex",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Bool(_) => "bool",
            Self::None => "NoneType",
            Self::Ellipsis => "ellipsis",
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        write!(f, "{value:.1}")
    } else if value.is_nan() {
        f.write_str("nan")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "inf" } else { "-inf" })
    } else {
        write!(f, "{value}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::BigInt(text) => f.write_str(text),
            Self::Float(x) => write_float(f, *x),
            Self::Complex(x) => {
                if x.is_finite() && x.fract() == 0.0 {
                    write!(f, "{x}j")
                } else {
                    write_float(f, *x)?;
                    f.write_str("j")
                }
            }
            Self::Str(s) => {
                f.write_str("'")?;
                for ch in s.chars() {
                    match ch {
                        '\'' => f.write_str("\\'")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("'")
            }
            Self::Bytes(bytes) => {
                f.write_str("b'")?;
                for &b in bytes {
                    match b {
                        b'\'' => f.write_str("\\'")?,
                        b'\\' => f.write_str("\\\\")?,
                        b'\n' => f.write_str("\\n")?,
                        b'\t' => f.write_str("\\t")?,
                        b'\r' => f.write_str("\\r")?,
                        0x20..=0x7e => write!(f, "{}", char::from(b))?,
                        _ => write!(f, "\\x{b:02x}")?,
                    }
                }
                f.write_str("'")
            }
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::None => f.write_str("None"),
            Self::Ellipsis => f.write_str("Ellipsis"),
        }
    }
}
