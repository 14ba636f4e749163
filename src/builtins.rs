//! The default function table.
//!
//! Every built-in takes the already evaluated arguments of a call and never
//! fails: missing arguments degrade to a neutral result instead.

use crate::config::decimal_scale;
use crate::value::Value;
use regex::Regex;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;

/// Signature of the built-in functions
pub type Builtin = fn(&[Value]) -> Value;

/// All built-ins, by the name call notation refers to them with
pub const BUILTINS: &[(&str, Builtin)] = &[
    ("append", append),
    ("trim", trim),
    ("trimInt", trim_int),
    ("add", add),
    ("sub", sub),
    ("multi", multi),
    ("div", div),
    ("mod", modulo),
    ("eq", eq),
    ("ne", ne),
    ("gt", gt),
    ("gte", gte),
    ("lt", lt),
    ("lte", lte),
    ("hasPrefix", has_prefix),
    ("hasSuffix", has_suffix),
    ("contains", contains),
    ("regexp", regexp),
    ("not", not),
    ("and", and),
    ("or", or),
];

/// Arithmetic domain a binary operation is computed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeType {
    /// 64-bit integer arithmetic
    Int,
    /// Decimal arithmetic, rounded to the decimal scale
    Float,
}

enum ArgType {
    Int,
    Float,
    Other,
}

fn arg_type(value: &Value) -> ArgType {
    match value {
        Value::Int(_) => ArgType::Int,
        Value::Float(_) => ArgType::Float,
        Value::Bool(_) | Value::Str(_) => ArgType::Other,
    }
}

/// Pick the arithmetic domain for two operands. A float on either side
/// wins, two integers stay integers, and anything else is a float only if
/// its text contains a decimal point.
#[must_use]
pub fn compute_type(a: &Value, b: &Value) -> ComputeType {
    match (arg_type(a), arg_type(b)) {
        (ArgType::Float, _) | (_, ArgType::Float) => ComputeType::Float,
        (ArgType::Int, ArgType::Int) => ComputeType::Int,
        _ if a.to_string().contains('.') || b.to_string().contains('.') => ComputeType::Float,
        _ => ComputeType::Int,
    }
}

/// Apply `op` in decimal, rounded to the configured scale. `fallback` is
/// used when an operand or the result does not fit a `Decimal`.
fn decimal_op(
    a: f64,
    b: f64,
    op: fn(Decimal, Decimal) -> Option<Decimal>,
    fallback: fn(f64, f64) -> f64,
) -> f64 {
    let scale = decimal_scale();
    Decimal::from_f64(a)
        .zip(Decimal::from_f64(b))
        .and_then(|(a, b)| op(a, b))
        .map(|d| d.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| fallback(a, b))
}

fn arithmetic(
    args: &[Value],
    int_op: fn(i64, i64) -> i64,
    decimal: fn(Decimal, Decimal) -> Option<Decimal>,
    float: fn(f64, f64) -> f64,
) -> Value {
    let (a, b) = match args {
        [] => return Value::Int(0),
        [a] => return a.clone(),
        [a, b, ..] => (a, b),
    };
    match compute_type(a, b) {
        ComputeType::Float => Value::Float(decimal_op(a.to_f64(), b.to_f64(), decimal, float)),
        ComputeType::Int => Value::Int(int_op(a.to_i64(), b.to_i64())),
    }
}

fn add(args: &[Value]) -> Value {
    arithmetic(args, i64::wrapping_add, Decimal::checked_add, |a, b| a + b)
}

fn sub(args: &[Value]) -> Value {
    arithmetic(args, i64::wrapping_sub, Decimal::checked_sub, |a, b| a - b)
}

fn multi(args: &[Value]) -> Value {
    arithmetic(args, i64::wrapping_mul, Decimal::checked_mul, |a, b| a * b)
}

/// Division by zero gives zero, in either domain.
fn div(args: &[Value]) -> Value {
    if let [a, b, ..] = args {
        match compute_type(a, b) {
            ComputeType::Int if b.to_i64() == 0 => return Value::Int(0),
            ComputeType::Float if b.to_f64() == 0.0 => return Value::Float(0.0),
            _ => {}
        }
    }
    arithmetic(args, i64::wrapping_div, Decimal::checked_div, |a, b| a / b)
}

/// Always integer. A zero divisor gives zero.
fn modulo(args: &[Value]) -> Value {
    match args {
        [] => Value::Int(0),
        [a] => a.clone(),
        [a, b, ..] => match b.to_i64() {
            0 => Value::Int(0),
            m => Value::Int(a.to_i64().wrapping_rem(m)),
        },
    }
}

/// Equality compares the text of both operands, never their numbers.
fn eq(args: &[Value]) -> Value {
    match args {
        [a, b, ..] => Value::Bool(a.to_string() == b.to_string()),
        _ => Value::Bool(false),
    }
}

fn ne(args: &[Value]) -> Value {
    match args {
        [a, b, ..] => Value::Bool(a.to_string() != b.to_string()),
        _ => Value::Bool(false),
    }
}

fn compare(args: &[Value], accept: fn(Ordering) -> bool) -> Value {
    let (a, b) = match args {
        [a, b, ..] => (a, b),
        _ => return Value::Bool(false),
    };
    let ordering = match compute_type(a, b) {
        ComputeType::Float => a.to_f64().partial_cmp(&b.to_f64()),
        ComputeType::Int => Some(a.to_i64().cmp(&b.to_i64())),
    };
    Value::Bool(ordering.map_or(false, accept))
}

fn gt(args: &[Value]) -> Value {
    compare(args, Ordering::is_gt)
}

fn gte(args: &[Value]) -> Value {
    compare(args, Ordering::is_ge)
}

fn lt(args: &[Value]) -> Value {
    compare(args, Ordering::is_lt)
}

fn lte(args: &[Value]) -> Value {
    compare(args, Ordering::is_le)
}

fn append(args: &[Value]) -> Value {
    match args {
        [] => Value::Str(String::new()),
        [a] => a.clone(),
        [a, b, ..] => Value::Str(format!("{}{}", a, b)),
    }
}

fn trim_cutset(value: &Value, cutset: &Value) -> String {
    let cutset = cutset.to_string();
    value
        .to_string()
        .trim_matches(|c: char| cutset.contains(c))
        .to_owned()
}

/// Strip every character of the second argument from both ends of the first.
fn trim(args: &[Value]) -> Value {
    match args {
        [] => Value::Str(String::new()),
        [a] => a.clone(),
        [a, b, ..] => Value::Str(trim_cutset(a, b)),
    }
}

fn trim_int(args: &[Value]) -> Value {
    match args {
        [] => Value::Int(0),
        [a] => Value::Int(a.to_i64()),
        [a, b, ..] => Value::Int(Value::Str(trim_cutset(a, b)).to_i64()),
    }
}

fn string_predicate(args: &[Value], predicate: fn(&str, &str) -> bool) -> Value {
    match args {
        [a, b, ..] => Value::Bool(predicate(&a.to_string(), &b.to_string())),
        _ => Value::Bool(false),
    }
}

fn has_prefix(args: &[Value]) -> Value {
    string_predicate(args, |a, b| a.starts_with(b))
}

fn has_suffix(args: &[Value]) -> Value {
    string_predicate(args, |a, b| a.ends_with(b))
}

fn contains(args: &[Value]) -> Value {
    string_predicate(args, |a, b| a.contains(b))
}

/// Match the first argument against the pattern in the second. An invalid
/// pattern never matches.
fn regexp(args: &[Value]) -> Value {
    string_predicate(args, |a, pattern| {
        Regex::new(pattern).map_or(false, |re| re.is_match(a))
    })
}

fn not(args: &[Value]) -> Value {
    match args {
        [a, ..] => Value::Bool(!a.to_bool()),
        [] => Value::Bool(false),
    }
}

fn and(args: &[Value]) -> Value {
    match args {
        [a, b, ..] => Value::Bool(a.to_bool() && b.to_bool()),
        _ => Value::Bool(false),
    }
}

fn or(args: &[Value]) -> Value {
    match args {
        [a, b, ..] => Value::Bool(a.to_bool() || b.to_bool()),
        _ => Value::Bool(false),
    }
}
