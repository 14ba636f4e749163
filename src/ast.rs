use crate::error::Error;
use crate::lexer::is_identifier;
use crate::registry::{Function, Registry};
use crate::value::Value;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Formatter};

/// Sigil in front of variable names in call notation
const VARIABLE_PREFIX: char = '$';

/// Call tree nodes
#[derive(Clone, PartialEq)]
pub enum Ast {
    /// A call of a native function, resolved at parse time
    Call(FunctionCall),
    /// A variable, to be resolved in the bindings at evaluation
    Variable(String),
    /// A typed constant
    Value(Value),
}

/// name(<args>)
#[derive(Clone)]
pub struct FunctionCall {
    name: String,
    function: Function,
    args: Vec<Ast>,
}

impl FunctionCall {
    /// Name the function was resolved from
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments, in call order
    #[must_use]
    pub fn args(&self) -> &[Ast] {
        &self.args
    }
}

/// Two calls are equal when they name the same function with equal arguments
impl PartialEq for FunctionCall {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args
    }
}

impl Debug for FunctionCall {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_struct("FunctionCall")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

impl Debug for Ast {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Call(call) => call.fmt(fmt),
            Self::Variable(name) => write!(fmt, "Variable({:?})", name),
            Self::Value(value) => write!(fmt, "Value({:?})", value),
        }
    }
}

impl Ast {
    /// Build the call tree for an expression in call notation, such as
    /// `add($a,multi(2:int,3:int))`. Functions are looked up in `registry`.
    ///
    /// # Errors
    ///
    /// Fails with `Error::Resolution` on unknown functions and malformed
    /// constants, and with `Error::TooDeep` when calls nest deeper than
    /// `max_depth`.
    pub fn from_call_notation(
        expression: &str,
        registry: &Registry,
        max_depth: usize,
    ) -> Result<Self, Error> {
        CallParser {
            registry,
            max_depth,
        }
        .parse(expression, 1)
    }

    /// Evaluate the tree against `context`.
    ///
    /// Arguments are evaluated depth first, from left to right, before the
    /// call that receives them. A variable without binding evaluates to its
    /// own name.
    #[must_use]
    pub fn execute(&self, context: &HashMap<String, Value>) -> Value {
        match self {
            Self::Variable(name) => match context.get(name) {
                Some(value) => value.clone(),
                None => {
                    log::trace!("no binding for `{}`, using its name", name);
                    Value::Str(name.clone())
                }
            },
            Self::Value(value) => value.clone(),
            Self::Call(call) => {
                let args: Vec<Value> = call.args.iter().map(|arg| arg.execute(context)).collect();
                (call.function)(&args)
            }
        }
    }

    /// If the node is a constant, get `Some(constant)`. Else, get `None`
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        if let Self::Value(value) = self {
            Some(value)
        } else {
            None
        }
    }

    pub(crate) fn collect_variables<'a>(&'a self, variables: &mut HashSet<&'a str>) {
        match self {
            Self::Variable(name) => {
                variables.insert(name);
            }
            Self::Value(_) => {}
            Self::Call(call) => {
                for arg in &call.args {
                    arg.collect_variables(variables);
                }
            }
        }
    }
}

struct CallParser<'r> {
    registry: &'r Registry,
    max_depth: usize,
}

impl CallParser<'_> {
    fn parse(&self, expression: &str, depth: usize) -> Result<Ast, Error> {
        if depth > self.max_depth {
            return Err(Error::TooDeep {
                limit: self.max_depth,
            });
        }

        let left = match expression.find('(') {
            Some(left) => left,
            // Without parentheses it is a variable or a constant
            None => return parse_leaf(expression),
        };
        let expression = expression.trim_end();
        if !expression.ends_with(')') {
            return Err(Error::Resolution(format!(
                "unbalanced parentheses: {}",
                expression
            )));
        }

        let name = expression[..left].trim();
        let function = self
            .registry
            .get(name)
            .ok_or_else(|| Error::Resolution(format!("function not found: {}", name)))?
            .clone();

        let params = &expression[left + 1..expression.len() - 1];
        let args = if params.trim().is_empty() {
            Vec::new()
        } else {
            split_args(params)?
                .into_iter()
                .map(|arg| self.parse_arg(arg, depth))
                .collect::<Result<Vec<_>, Error>>()?
        };

        Ok(Ast::Call(FunctionCall {
            name: name.to_owned(),
            function,
            args,
        }))
    }

    fn parse_arg(&self, arg: &str, depth: usize) -> Result<Ast, Error> {
        if arg.contains('(') {
            self.parse(arg, depth + 1)
        } else {
            parse_leaf(arg)
        }
    }
}

/// Split a parameter list on the commas outside of nested calls
fn split_args(params: &str) -> Result<Vec<&str>, Error> {
    let mut args = Vec::new();
    let mut level = 0_usize;
    let mut start = 0;
    for (i, c) in params.char_indices() {
        match c {
            '(' => level += 1,
            ')' => {
                level = level.checked_sub(1).ok_or_else(|| {
                    Error::Resolution(format!("unbalanced parentheses: ({})", params))
                })?;
            }
            ',' if level == 0 => {
                args.push(&params[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if level != 0 {
        return Err(Error::Resolution(format!(
            "unbalanced parentheses: ({})",
            params
        )));
    }
    args.push(&params[start..]);
    Ok(args)
}

/// Parse a variable or a typed constant such as `12:int`, `1.5:float` or
/// `text:str`. Untagged constants are integers, and an empty slot is the
/// empty string. The text of a `str` constant is kept as is, spaces
/// included.
fn parse_leaf(arg: &str) -> Result<Ast, Error> {
    let trimmed = arg.trim();
    if trimmed.is_empty() {
        return Ok(Ast::Value(Value::Str(String::new())));
    }

    if let Some(name) = trimmed.strip_prefix(VARIABLE_PREFIX) {
        if is_identifier(name) {
            return Ok(Ast::Variable(name.to_owned()));
        }
    }

    let (text, tag) = match arg.rfind(':') {
        Some(index) => (&arg[..index], arg[index + 1..].trim()),
        None => (trimmed, "int"),
    };
    let invalid = || Error::Resolution(format!("invalid argument: {}", trimmed));
    let value = match tag {
        "int" => Value::Int(text.trim().parse().map_err(|_| invalid())?),
        "float" => Value::Float(text.trim().parse().map_err(|_| invalid())?),
        "str" => Value::Str(text.to_owned()),
        _ => return Err(invalid()),
    };
    Ok(Ast::Value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_CALL_DEPTH;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use test_case::test_case;

    fn parse(expression: &str) -> Result<Ast, Error> {
        Ast::from_call_notation(expression, &Registry::with_builtins(), DEFAULT_MAX_CALL_DEPTH)
    }

    fn run(expression: &str, context: &HashMap<String, Value>) -> Value {
        parse(expression).unwrap().execute(context)
    }

    #[test_case("12:int" => Ast::Value(Value::Int(12)) ; "int")]
    #[test_case("-3:int" => Ast::Value(Value::Int(-3)) ; "negative int")]
    #[test_case("12" => Ast::Value(Value::Int(12)) ; "untagged int")]
    #[test_case("1.5:float" => Ast::Value(Value::Float(1.5)) ; "float")]
    #[test_case("motorola:str" => Ast::Value(Value::from("motorola")) ; "string")]
    #[test_case("stock::str" => Ast::Value(Value::from("stock:")) ; "string with colon")]
    #[test_case(":str" => Ast::Value(Value::from("")) ; "empty string")]
    #[test_case("$x:str" => Ast::Value(Value::from("$x")) ; "string with sigil")]
    #[test_case("$stock" => Ast::Variable("stock".into()) ; "variable")]
    #[test_case(" $stock " => Ast::Variable("stock".into()) ; "padded variable")]
    #[test_case(" 12:int " => Ast::Value(Value::Int(12)) ; "padded int")]
    #[test_case(" bob:str" => Ast::Value(Value::from(" bob")) ; "string keeps leading space")]
    #[test_case(" x :str" => Ast::Value(Value::from(" x ")) ; "string keeps both spaces")]
    #[test_case("  :str" => Ast::Value(Value::from("  ")) ; "blank string")]
    fn leaves(expression: &str) -> Ast {
        parse(expression).unwrap()
    }

    #[test]
    fn calls() {
        let ast = parse("add($a,multi(2:int,3:int))").unwrap();
        let call = match &ast {
            Ast::Call(call) => call,
            other => panic!("expected a call, got {:?}", other),
        };
        assert_eq!(call.name(), "add");
        assert_eq!(call.args()[0], Ast::Variable("a".into()));
        match &call.args()[1] {
            Ast::Call(inner) => {
                assert_eq!(inner.name(), "multi");
                assert_eq!(
                    inner.args(),
                    &[Ast::Value(Value::Int(2)), Ast::Value(Value::Int(3))]
                );
            }
            other => panic!("expected a call, got {:?}", other),
        }

        // the same text always gives the same tree
        assert_eq!(ast, parse("add($a,multi(2:int,3:int))").unwrap());
        assert_ne!(ast, parse("add($a,multi(2:int,4:int))").unwrap());
    }

    #[test]
    fn empty_slots() {
        match parse("append(,x:str)").unwrap() {
            Ast::Call(call) => assert_eq!(
                call.args(),
                &[Ast::Value(Value::from("")), Ast::Value(Value::from("x"))]
            ),
            other => panic!("expected a call, got {:?}", other),
        }
        assert_eq!(parse(":str").unwrap().value(), Some(&Value::from("")));
        assert_eq!(parse("$a").unwrap().value(), None);
        match parse("append()").unwrap() {
            Ast::Call(call) => assert!(call.args().is_empty()),
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test_case("unknownFn(1:int)" => Error::Resolution("function not found: unknownFn".into()) ; "unknown function")]
    #[test_case("add(1:int,nope(2:int))" => Error::Resolution("function not found: nope".into()) ; "unknown nested function")]
    #[test_case("add(1:int,2:bool)" => Error::Resolution("invalid argument: 2:bool".into()) ; "unknown tag")]
    #[test_case("add(x:int,2:int)" => Error::Resolution("invalid argument: x:int".into()) ; "malformed int")]
    #[test_case("1.2.3:float" => Error::Resolution("invalid argument: 1.2.3:float".into()) ; "malformed float")]
    #[test_case("$" => Error::Resolution("invalid argument: $".into()) ; "sigil without name")]
    #[test_case("add(1:int,2:int" => Error::Resolution("unbalanced parentheses: add(1:int,2:int".into()) ; "missing closing paren")]
    #[test_case("add(1:int),2:int)" => Error::Resolution("unbalanced parentheses: (1:int),2:int)".into()) ; "extra closing paren")]
    fn rejects(expression: &str) -> Error {
        parse(expression).unwrap_err()
    }

    #[test]
    fn depth_limit() {
        let nested = format!("{}1:int{}", "not(".repeat(10), ")".repeat(10));
        let registry = Registry::with_builtins();
        assert!(Ast::from_call_notation(&nested, &registry, 10).is_ok());
        assert_eq!(
            Ast::from_call_notation(&nested, &registry, 9).unwrap_err(),
            Error::TooDeep { limit: 9 }
        );
    }

    #[test]
    fn execute() {
        let mut context = HashMap::new();
        context.insert("stock".to_owned(), Value::Int(120));
        context.insert("mfr".to_owned(), Value::from("motorola"));

        assert_eq!(run("add(multi($stock,100:int),5:int)", &context), Value::Int(12005));
        assert_eq!(run("gt($stock,100:int)", &context), Value::Bool(true));
        assert_eq!(run("eq($mfr,motorola:str)", &context), Value::Bool(true));
        assert_eq!(run("$stock", &context), Value::Int(120));
        assert_eq!(run("7:int", &context), Value::Int(7));
    }

    #[test_case("missing" ; "plain name")]
    #[test_case("MIN_ORD_QTY" ; "upper case name")]
    #[test_case("a1" ; "name with digit")]
    fn unbound_variable_is_its_name(name: &str) {
        let context = HashMap::new();
        let expected = Value::from(name);
        assert_eq!(run(&format!("${}", name), &context), expected);
        assert_eq!(run(&format!("append(${},:str)", name), &context), expected);
    }

    #[test]
    fn evaluation_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::with_builtins();
        let log = Arc::clone(&seen);
        registry
            .register("tap", move |args| {
                log.lock().unwrap().push(args[0].to_i64());
                args[0].clone()
            })
            .unwrap();

        let ast = Ast::from_call_notation(
            "add(tap(1:int),multi(tap(2:int),tap(3:int)))",
            &registry,
            DEFAULT_MAX_CALL_DEPTH,
        )
        .unwrap();
        assert_eq!(ast.execute(&HashMap::new()), Value::Int(7));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn functions_are_bound_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::empty();
        let counter = Arc::clone(&calls);
        registry
            .register("count", move |_| {
                Value::Int(counter.fetch_add(1, Ordering::SeqCst) as i64)
            })
            .unwrap();

        let ast = Ast::from_call_notation("count()", &registry, DEFAULT_MAX_CALL_DEPTH).unwrap();
        drop(registry);
        assert_eq!(ast.execute(&HashMap::new()), Value::Int(0));
        assert_eq!(ast.execute(&HashMap::new()), Value::Int(1));
    }
}
