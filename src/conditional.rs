//! `if` / `then` / `otherwise` rules.
//!
//! A [`Rule`] holds the source text of the three branches, and can be
//! loaded from JSON:
//!
//! ```
//! # use ruleexpr::Rule;
//! let rule: Rule = serde_json::from_str(
//!     r#"{"if": "$stock>100", "then": "$stock*100+5", "otherwise": "0"}"#,
//! ).unwrap();
//! assert_eq!(rule.condition.as_deref(), Some("$stock>100"));
//! ```
//!
//! Compiling a rule gives a [`Conditional`], which evaluates `then` when
//! the condition holds and `otherwise` when it does not.

use crate::config::Config;
use crate::error::Error;
use crate::expr::Expr;
use crate::registry::{self, Registry};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The branches of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// The condition
    If,
    /// Evaluated when the condition holds
    Then,
    /// Evaluated when the condition does not hold
    Otherwise,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::If => "if",
            Self::Then => "then",
            Self::Otherwise => "otherwise",
        })
    }
}

/// Source text of a conditional rule. Empty texts count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// Condition, `true` when absent
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub then: Option<String>,
    /// Result when the condition does not hold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<String>,
}

impl Rule {
    /// A rule without condition, always giving `then`
    pub fn new(then: impl Into<String>) -> Self {
        Self {
            condition: None,
            then: Some(then.into()),
            otherwise: None,
        }
    }

    /// Set the condition
    #[must_use]
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Set the `otherwise` branch
    #[must_use]
    pub fn otherwise(mut self, otherwise: impl Into<String>) -> Self {
        self.otherwise = Some(otherwise.into());
        self
    }

    /// Compile every branch with the process-wide registry.
    ///
    /// # Errors
    ///
    /// `Error::Config` when `then` is missing, and `Error::Branch` wrapping
    /// the compile error of the first branch that fails.
    pub fn compile(&self) -> Result<Conditional, Error> {
        registry::with_default(|registry| self.compile_with(registry, &Config::default()))
    }

    /// Compile every branch against `registry`.
    ///
    /// # Errors
    ///
    /// The same as [`Rule::compile`].
    pub fn compile_with(&self, registry: &Registry, config: &Config) -> Result<Conditional, Error> {
        let then = present(&self.then).ok_or_else(|| Error::Config("then is required".into()))?;
        // branches compile in reading order, so the first broken one is reported
        let condition = present(&self.condition)
            .map(|text| compile_branch(Branch::If, text, registry, config))
            .transpose()?;
        let then = compile_branch(Branch::Then, then, registry, config)?;
        let otherwise = present(&self.otherwise)
            .map(|text| compile_branch(Branch::Otherwise, text, registry, config))
            .transpose()?;

        Ok(Conditional {
            rule: self.clone(),
            condition,
            then,
            otherwise,
        })
    }
}

fn present(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|text| !text.is_empty())
}

fn compile_branch(
    branch: Branch,
    text: &str,
    registry: &Registry,
    config: &Config,
) -> Result<Expr, Error> {
    Expr::parse_with(text, registry, config).map_err(|err| Error::Branch {
        branch,
        expression: text.to_owned(),
        source: Box::new(err),
    })
}

/// A compiled [`Rule`].
///
/// ```
/// # use ruleexpr::{Rule, Value};
/// # use std::collections::HashMap;
/// let rule = Rule::new("$stock*100+5").when("$stock>100").otherwise("0");
/// let conditional = rule.compile().unwrap();
///
/// let mut bindings = HashMap::new();
/// bindings.insert("stock".to_owned(), Value::Int(120));
/// assert_eq!(conditional.eval(&bindings), Ok(Value::Int(12005)));
/// bindings.insert("stock".to_owned(), Value::Int(12));
/// assert_eq!(conditional.eval(&bindings), Ok(Value::Int(0)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    rule: Rule,
    condition: Option<Expr>,
    then: Expr,
    otherwise: Option<Expr>,
}

impl Conditional {
    /// Evaluate the rule with `bindings`.
    ///
    /// # Errors
    ///
    /// `Error::Eval` when the condition does not hold and there is no
    /// `otherwise` branch.
    pub fn eval(&self, bindings: &HashMap<String, Value>) -> Result<Value, Error> {
        let holds = self
            .condition
            .as_ref()
            .map_or(true, |condition| condition.eval(bindings).to_bool());

        if holds {
            log::trace!("`{}`: taking then", self.then.source());
            return Ok(self.then.eval(bindings));
        }
        match &self.otherwise {
            Some(otherwise) => {
                log::trace!("`{}`: taking otherwise", otherwise.source());
                Ok(otherwise.eval(bindings))
            }
            None => Err(Error::Eval("invalid expression".into())),
        }
    }

    /// The rule this was compiled from
    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// The compiled condition, if any
    #[must_use]
    pub fn condition(&self) -> Option<&Expr> {
        self.condition.as_ref()
    }

    /// The compiled `then` branch
    #[must_use]
    pub fn then(&self) -> &Expr {
        &self.then
    }

    /// The compiled `otherwise` branch, if any
    #[must_use]
    pub fn otherwise(&self) -> Option<&Expr> {
        self.otherwise.as_ref()
    }
}

impl fmt::Display for Conditional {
    /// `if: <source> [<call notation>], then: ..., otherwise: ...`
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let branches = [
            (Branch::If, self.condition.as_ref()),
            (Branch::Then, Some(&self.then)),
            (Branch::Otherwise, self.otherwise.as_ref()),
        ];
        let mut first = true;
        for (branch, expr) in branches {
            if let Some(expr) = expr {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{}: {} [{}]", branch, expr.source(), expr.canonical())?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn compile(rule: &Rule) -> Result<Conditional, Error> {
        rule.compile_with(&Registry::with_builtins(), &Config::default())
    }

    fn bindings(name: &str, value: Value) -> HashMap<String, Value> {
        let mut bindings = HashMap::new();
        bindings.insert(name.to_owned(), value);
        bindings
    }

    #[test_case("$MIN_ORD_QTY>0", "MIN_ORD_QTY", Value::Int(120) => Value::Int(120) ; "positive quantity")]
    #[test_case("($MIN_ORD_QTY+1)>=10", "MIN_ORD_QTY", Value::Int(5) => Value::Int(0) ; "small quantity")]
    #[test_case("$stock>100", "stock", Value::from("200") => Value::from("200") ; "numeric string")]
    #[test_case("$stock>0", "stock", Value::from("a") => Value::Int(0) ; "non numeric string counts as zero")]
    #[test_case("$stock>0", "other", Value::Int(1) => Value::Int(0) ; "unbound variable")]
    fn then_or_otherwise(condition: &str, name: &str, value: Value) -> Value {
        let then = format!("${}", name);
        let rule = Rule::new(then).when(condition).otherwise("0");
        compile(&rule).unwrap().eval(&bindings(name, value)).unwrap()
    }

    #[test]
    fn without_condition() {
        let conditional = compile(&Rule::new("1+1")).unwrap();
        assert_eq!(conditional.eval(&HashMap::new()), Ok(Value::Int(2)));

        let rule = Rule {
            condition: Some(String::new()),
            then: Some("1+1".into()),
            otherwise: Some(String::new()),
        };
        let conditional = compile(&rule).unwrap();
        assert!(conditional.condition().is_none());
        assert!(conditional.otherwise().is_none());
        assert_eq!(conditional.eval(&HashMap::new()), Ok(Value::Int(2)));
    }

    #[test]
    fn missing_otherwise() {
        let conditional = compile(&Rule::new("1").when("$x>1")).unwrap();
        assert_eq!(
            conditional.eval(&bindings("x", Value::Int(0))),
            Err(Error::Eval("invalid expression".into()))
        );
        assert_eq!(
            conditional.eval(&bindings("x", Value::Int(2))),
            Ok(Value::Int(1))
        );
    }

    #[test_case(Rule::default() ; "empty rule")]
    #[test_case(Rule::default().when("$a>1").otherwise("0") ; "no then")]
    #[test_case(Rule::new("") ; "empty then")]
    fn then_is_required(rule: Rule) {
        assert_eq!(
            compile(&rule).unwrap_err(),
            Error::Config("then is required".into())
        );
    }

    #[test]
    fn branch_errors() {
        let err = compile(&Rule::new("(1+2")).unwrap_err();
        assert_eq!(
            err,
            Error::Branch {
                branch: Branch::Then,
                expression: "(1+2".into(),
                source: Box::new(Error::Parse {
                    message: "expected )".into(),
                    offset: 4
                }),
            }
        );
        assert_eq!(err.to_string(), "then `(1+2`: ParseError: expected ) (at offset 4)");

        let err = compile(&Rule::new("1").when("@nope(1)")).unwrap_err();
        assert_eq!(
            err.root_cause(),
            &Error::Resolution("function not found: nope".into())
        );
        assert!(err.to_string().starts_with("if `@nope(1)`: "));

        let err = compile(&Rule::new("(1").when("@nope(1)").otherwise("$a &")).unwrap_err();
        assert!(matches!(err, Error::Branch { branch: Branch::If, .. }));
        let err = compile(&Rule::new("(1").when("1>0").otherwise("$a &")).unwrap_err();
        assert!(matches!(err, Error::Branch { branch: Branch::Then, .. }));

        let err = compile(&Rule::new("1").when("1>0").otherwise("$a &")).unwrap_err();
        assert!(matches!(
            err,
            Error::Branch {
                branch: Branch::Otherwise,
                ..
            }
        ));
    }

    #[test]
    fn display() {
        let rule = Rule::new("$stock*100+5").when("$stock>100");
        assert_eq!(
            compile(&rule).unwrap().to_string(),
            "if: $stock>100 [gt($stock,100:int)], then: $stock*100+5 [add(multi($stock,100:int),5:int)]"
        );

        let rule = Rule::new("1").otherwise("2");
        assert_eq!(
            compile(&rule).unwrap().to_string(),
            "then: 1 [1:int], otherwise: 2 [2:int]"
        );
    }

    #[test]
    fn json() {
        let rule: Rule = serde_json::from_str(r#"{"if": "$a>1", "then": "$a"}"#).unwrap();
        assert_eq!(rule, Rule::new("$a").when("$a>1"));

        let text = serde_json::to_string(&rule).unwrap();
        assert_eq!(text, r#"{"if":"$a>1","then":"$a"}"#);

        let conditional = compile(&rule).unwrap();
        assert_eq!(conditional.rule(), &rule);
        assert_eq!(conditional.then().canonical(), "$a");
    }
}
