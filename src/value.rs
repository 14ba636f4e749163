use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A dynamically typed value, as bound to variables and returned by built-ins
///
/// Bindings loaded from JSON map integers to `Int`, other numbers to `Float`,
/// booleans to `Bool` and strings to `Str`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A 64 bits signed integer
    Int(i64),
    /// A 64 bits floating point number
    Float(f64),
    /// A boolean, as produced by comparison and logical built-ins
    Bool(bool),
    /// A string
    Str(String),
}

impl Value {
    /// Convert to an integer the way a loose cast would: floats are
    /// truncated, booleans are 0 or 1, and strings are parsed, with
    /// anything unparsable becoming 0.
    #[must_use]
    pub fn to_i64(&self) -> i64 {
        match self {
            Self::Int(i) => *i,
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) => *f as i64,
            Self::Bool(b) => i64::from(*b),
            Self::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                    .unwrap_or(0)
            }
        }
    }

    /// Convert to a float the way a loose cast would. Unparsable strings
    /// become 0.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Str(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    /// Truthiness of the value. Zero numbers are false. Strings are false
    /// when empty, numerically zero, or `false` in any case; every other
    /// string is true.
    #[must_use]
    pub fn to_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => {
                let s = s.trim();
                !(s.is_empty()
                    || s.eq_ignore_ascii_case("false")
                    || s.parse::<f64>().map_or(false, |f| f == 0.0))
            }
        }
    }

    /// Name of the variant, for diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Str(_) => "str",
        }
    }
}

impl Display for Value {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Int(i) => write!(fmt, "{}", i),
            Self::Float(f) => write!(fmt, "{}", f),
            Self::Bool(b) => write!(fmt, "{}", b),
            Self::Str(s) => write!(fmt, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
