use crate::ast::Ast;
use crate::config::Config;
use crate::parser::Parser;
use crate::registry::{self, Registry};
use crate::value::Value;
use crate::Error;
use std::collections::{HashMap, HashSet};

/// Compile and evaluate a single expression from `input`.
///
/// Returns `Ok(result)` if the expression compiles, or `Err(cause)` if
/// lexing, parsing or resolving its functions failed.
///
/// # Example
///
/// ```
/// # use std::collections::HashMap;
/// # use ruleexpr::{eval, Value};
///
/// assert_eq!(eval("45 - 2*3", &HashMap::new()), Ok(Value::Int(39)));
///
/// let mut context: HashMap<String, Value> = HashMap::new();
/// context.insert("a".into(), Value::Int(-5));
/// assert_eq!(eval("3 * $a", &context), Ok(Value::Int(-15)));
/// ```
///
/// # Errors
///
/// Any compile error of [`Expr::parse`].
pub fn eval<'a, C>(input: &str, context: C) -> Result<Value, Error>
where
    C: Into<&'a HashMap<String, Value>>,
{
    Expr::parse(input).map(|expr| expr.eval(context))
}

/// A compiled expression.
///
/// Compiling resolves every function once, so that evaluation is a plain
/// walk of the call tree. An `Expr` is immutable and can be evaluated from
/// many threads at once.
///
/// # Examples
/// ```
/// # use ruleexpr::{Expr, Value};
/// # use std::collections::HashMap;
/// let expr = Expr::parse("3 + 5 * 2").unwrap();
/// assert_eq!(expr.eval(&HashMap::new()), Value::Int(13));
///
/// let mut context: HashMap<String, Value> = HashMap::new();
/// context.insert("a".into(), Value::Float(1.5));
/// let expr = Expr::parse("$a * 2").unwrap();
/// assert_eq!(expr.eval(&context), Value::Float(3.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    source: String,
    canonical: String,
    ast: Ast,
}

impl Expr {
    /// Compile `expression` with the process-wide registry and the default
    /// [`Config`]. The process-wide registry is frozen afterwards.
    ///
    /// # Examples
    /// ```
    /// # use ruleexpr::Expr;
    /// // A valid expression
    /// assert!(Expr::parse("@trimInt($stock, \"stock:\") * 100 + 5").is_ok());
    /// // invalid ones
    /// assert!(Expr::parse("$a &").is_err());
    /// assert!(Expr::parse("@unknownFn(1)").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// `Error::Lex`, `Error::Parse` or `Error::TooDeep` for invalid infix
    /// syntax, and `Error::Resolution` for unknown functions.
    pub fn parse(expression: &str) -> Result<Self, Error> {
        registry::with_default(|registry| {
            Self::parse_with(expression, registry, &Config::default())
        })
    }

    /// Compile `expression` against the functions of `registry`, which is
    /// frozen afterwards.
    ///
    /// # Errors
    ///
    /// The same as [`Expr::parse`].
    pub fn parse_with(
        expression: &str,
        registry: &Registry,
        config: &Config,
    ) -> Result<Self, Error> {
        registry.freeze();
        let compiled = Parser::new(expression, config)
            .and_then(Parser::parse)
            .and_then(|canonical| {
                Ast::from_call_notation(&canonical, registry, config.max_call_depth)
                    .map(|ast| (canonical, ast))
            });
        match compiled {
            Ok((canonical, ast)) => {
                log::debug!("compiled `{}` to `{}`", expression, canonical);
                Ok(Self {
                    source: expression.to_owned(),
                    canonical,
                    ast,
                })
            }
            Err(err) => {
                log::debug!("failed to compile `{}`: {}", expression, err);
                Err(err)
            }
        }
    }

    /// Evaluate the expression with the variables of `context`.
    ///
    /// Evaluation does not fail: a variable missing from `context` evaluates
    /// to its own name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ruleexpr::{Expr, Value};
    /// # use std::collections::HashMap;
    /// let expr = Expr::parse("$stock > 100").unwrap();
    ///
    /// let mut context: HashMap<String, Value> = HashMap::new();
    /// context.insert("stock".into(), Value::Int(120));
    /// assert_eq!(expr.eval(&context), Value::Bool(true));
    /// context.insert("stock".into(), Value::from("80"));
    /// assert_eq!(expr.eval(&context), Value::Bool(false));
    ///
    /// let expr = Expr::parse("$missing").unwrap();
    /// assert_eq!(expr.eval(&HashMap::new()), Value::from("missing"));
    /// ```
    pub fn eval<'a, C>(&self, context: C) -> Value
    where
        C: Into<&'a HashMap<String, Value>>,
    {
        self.ast.execute(context.into())
    }

    /// The infix text this expression was compiled from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The expression in call notation.
    ///
    /// ```
    /// # use ruleexpr::Expr;
    /// let expr = Expr::parse("($a+1)>=10").unwrap();
    /// assert_eq!(expr.canonical(), "gte(add($a,1:int),10:int)");
    /// ```
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The call tree evaluated by [`Expr::eval`]
    #[must_use]
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Names of the variables used by the expression.
    ///
    /// # Examples
    /// ```
    /// # use ruleexpr::Expr;
    /// # use std::collections::HashSet;
    /// let expr = Expr::parse("3 + 5 * 2").unwrap();
    /// assert_eq!(expr.variables(), HashSet::new());
    ///
    /// let expr = Expr::parse("$a > 0 && $b < $a").unwrap();
    /// assert_eq!(expr.variables(), HashSet::from(["a", "b"]));
    /// ```
    #[must_use]
    pub fn variables(&self) -> HashSet<&str> {
        let mut variables = HashSet::new();
        self.ast.collect_variables(&mut variables);
        variables
    }
}
