#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(
    clippy::needless_return,
    clippy::missing_docs_in_private_items,
    clippy::module_name_repetitions
)]

//! Ruleexpr, a crate for compiling and evaluating business rule expressions.
//!
//! Expressions are written in a small infix language over integers, floats,
//! strings and booleans. The easiest way to use this crate is with the
//! [`eval`](fn.eval.html) function:
//!
//! ```
//! use std::collections::HashMap;
//! use ruleexpr::Value;
//! assert_eq!(ruleexpr::eval("3 + 5 * 2", &HashMap::new()), Ok(Value::Int(13)));
//! ```
//!
//! The second argument to `eval` is a [`HashMap`](std::collections::HashMap)
//! binding the variables, which are prefixed with `$` in expressions:
//!
//! ```
//! use std::collections::HashMap;
//! use ruleexpr::Value;
//!
//! let mut context: HashMap<String, Value> = HashMap::new();
//! context.insert("stock".into(), Value::from("stock:120"));
//! assert_eq!(
//!     ruleexpr::eval(r#"@trim($stock, "stock:") * 100 + 5"#, &context),
//!     Ok(Value::Int(12005))
//! );
//! ```
//!
//! Compiling and evaluating can be separated with the [`Expr`] type, to
//! evaluate the same expression many times with different bindings. An
//! `if` / `then` / `otherwise` [`Rule`] compiles to a [`Conditional`]:
//!
//! ```
//! use std::collections::HashMap;
//! use ruleexpr::{Rule, Value};
//!
//! let rule = Rule::new("$stock").when("$stock > 100").otherwise("0");
//! let conditional = rule.compile().unwrap();
//!
//! let mut context: HashMap<String, Value> = HashMap::new();
//! context.insert("stock".into(), Value::Int(200));
//! assert_eq!(conditional.eval(&context), Ok(Value::Int(200)));
//! context.insert("stock".into(), Value::Int(50));
//! assert_eq!(conditional.eval(&context), Ok(Value::Int(0)));
//! ```
//!
//! # Language definition
//!
//! - integer and float literals: `12`, `0.5`. There is no sign in literals,
//!   write `0 - 3` for `-3`;
//! - string literals in double quotes, which can not contain `(`, `)` or
//!   `,`;
//! - variables: `$` followed by a letter, then letters, digits or `_`;
//! - arithmetic: `+`, `-`, `*`, `/` and `%`;
//! - comparisons: `==`, `!=`, `>`, `>=`, `<` and `<=`;
//! - logic: `&&`, `||` and `!`;
//! - parentheses;
//! - function calls: `@name(arg, ...)`, where `name` is a function of the
//!   [`Registry`].
//!
//! Integer operands stay integers, a float on either side of an arithmetic
//! operator gives a float. Floating point results are rounded to
//! [`decimal_scale`] fractional digits. `==` and `!=` compare the text of
//! their operands. Division or modulo by zero give zero.
//!
//! Evaluation never fails: a variable without binding evaluates to its own
//! name, and functions degrade to neutral values on missing arguments.
//!
//! # Technical details
//!
//! An expression is first rewritten in call notation by a recursive descent
//! parser, for example `1+2*3` becomes `add(1:int,multi(2:int,3:int))`.
//! The call notation is then parsed into a tree of [`Ast`] nodes, where every
//! function is resolved once. Both parsers bound their recursion, see
//! [`Config`].

#[macro_use]
extern crate lazy_static;

mod ast;
mod builtins;
mod conditional;
mod config;
mod error;
mod expr;
mod lexer;
mod parser;
mod registry;
mod token;
mod value;

pub use ast::{Ast, FunctionCall};
pub use builtins::{compute_type, Builtin, ComputeType, BUILTINS};
pub use conditional::{Branch, Conditional, Rule};
pub use config::{
    decimal_scale, set_decimal_scale, Config, DEFAULT_DECIMAL_SCALE, DEFAULT_MAX_CALL_DEPTH,
    DEFAULT_MAX_DEPTH,
};
pub use error::Error;
pub use expr::{eval, Expr};
pub use lexer::{is_identifier, tokenize};
pub use parser::to_call_notation;
pub use registry::{register_builtin, Function, Registry};
pub use token::{Token, TokenKind};
pub use value::Value;
