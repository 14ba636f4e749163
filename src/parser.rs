//! Infix syntax to call notation.
//!
//! The parser is a recursive descent over the lexer's tokens. Instead of
//! building a tree it directly writes the expression in call notation, where
//! every operator became a call of the matching built-in:
//!
//! ```text
//! 1+2*3            add(1:int,multi(2:int,3:int))
//! ($a+1)>=10       gte(add($a,1:int),10:int)
//! !($b || $c)      not(or($b,$c))
//! ```
//!
//! Grammar, from lowest to highest precedence:
//!
//! ```text
//! logical     := comparison (("&&" | "||") comparison)*
//! comparison  := "!" comparison
//!              | "(" (logical | additive) ")" (cmp_op additive)?
//!              | additive (cmp_op additive)?
//! additive    := term (("+" | "-") term)*
//! term        := factor (("*" | "/" | "%") factor)*
//! factor      := "(" additive ")"
//!              | "@" identifier "(" (logical ("," logical)*)? ")"
//!              | "$" identifier ("+" term)?
//!              | literal
//! ```

use crate::config::Config;
use crate::error::Error;
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};

/// Convert an infix `expression` to call notation, with the default
/// configuration.
///
/// # Examples
///
/// ```
/// assert_eq!(
///     ruleexpr::to_call_notation("1+2*3").unwrap(),
///     "add(1:int,multi(2:int,3:int))"
/// );
/// ```
///
/// # Errors
///
/// Fails with `Error::Lex` or `Error::Parse` on invalid input, and with
/// `Error::TooDeep` when the expression nests too deeply.
pub fn to_call_notation(expression: &str) -> Result<String, Error> {
    Parser::new(expression, &Config::default())?.parse()
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(expression: &str, config: &Config) -> Result<Self, Error> {
        Ok(Self {
            tokens: tokenize(expression)?,
            pos: 0,
            end: expression.len(),
            depth: 0,
            max_depth: config.max_depth,
        })
    }

    /// Parse the whole token stream
    pub fn parse(mut self) -> Result<String, Error> {
        let output = self.logical()?;
        match self.peek() {
            None => Ok(output),
            Some(token) => Err(Error::parse(
                format!("unexpected token: {}", token),
                token.offset,
            )),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Offset of the current token, or of the end of input
    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |token| token.offset)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, Error> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            _ => Err(Error::parse(format!("expected {}", what), self.offset())),
        }
    }

    fn descend(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::TooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn logical(&mut self) -> Result<String, Error> {
        let mut left = self.comparison()?;
        while let Some(name) = self
            .peek_kind()
            .filter(|kind| matches!(kind, TokenKind::And | TokenKind::Or))
            .and_then(TokenKind::builtin)
        {
            self.pos += 1;
            let right = self.comparison()?;
            left = call(name, &left, &right);
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<String, Error> {
        self.descend()?;
        let result = self.comparison_inner();
        self.ascend();
        result
    }

    fn comparison_inner(&mut self) -> Result<String, Error> {
        match self.peek_kind() {
            None => Err(Error::parse("unexpected end of input", self.end)),
            Some(TokenKind::Not) => {
                self.pos += 1;
                Ok(format!("not({})", self.comparison()?))
            }
            Some(TokenKind::LParen) => {
                self.pos += 1;
                let left = self.grouped()?;
                self.expect(TokenKind::RParen, ")")?;
                self.compared_to(left)
            }
            Some(_) => {
                let left = self.additive()?;
                self.compared_to(left)
            }
        }
    }

    /// Contents of parentheses at the start of a comparison: a logical
    /// expression when one parses, else a plain arithmetic one.
    fn grouped(&mut self) -> Result<String, Error> {
        let (pos, depth) = (self.pos, self.depth);
        match self.logical() {
            Ok(expression) => Ok(expression),
            Err(err @ Error::TooDeep { .. }) => Err(err),
            Err(_) => {
                self.pos = pos;
                self.depth = depth;
                self.additive()
            }
        }
    }

    /// Take `left` as the left operand of a comparison, if one follows.
    fn compared_to(&mut self, left: String) -> Result<String, Error> {
        match self
            .peek_kind()
            .filter(|kind| kind.is_comparison())
            .and_then(TokenKind::builtin)
        {
            Some(name) => {
                self.pos += 1;
                let right = self.additive()?;
                Ok(call(name, &left, &right))
            }
            None => Ok(left),
        }
    }

    fn additive(&mut self) -> Result<String, Error> {
        let mut left = self.term()?;
        while let Some(name) = self
            .peek_kind()
            .filter(|kind| matches!(kind, TokenKind::Plus | TokenKind::Minus))
            .and_then(TokenKind::builtin)
        {
            self.pos += 1;
            let right = self.term()?;
            left = call(name, &left, &right);
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<String, Error> {
        let mut left = self.factor()?;
        while let Some(name) = self
            .peek_kind()
            .filter(|kind| matches!(kind, TokenKind::Mul | TokenKind::Div | TokenKind::Mod))
            .and_then(TokenKind::builtin)
        {
            self.pos += 1;
            let right = self.factor()?;
            left = call(name, &left, &right);
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<String, Error> {
        self.descend()?;
        let result = self.factor_inner();
        self.ascend();
        result
    }

    fn factor_inner(&mut self) -> Result<String, Error> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(Error::parse("unexpected end of input", self.end)),
        };
        self.pos += 1;

        match token.kind {
            TokenKind::LParen => {
                let expression = self.additive()?;
                self.expect(TokenKind::RParen, ")")?;
                Ok(expression)
            }
            TokenKind::At => self.function_call(),
            TokenKind::Dollar => {
                let name = self.expect(TokenKind::Identifier, "variable name")?;
                let variable = format!("${}", name.text);
                // `$a+b*c` folds the following term right here
                if self.peek_kind() == Some(TokenKind::Plus) {
                    self.pos += 1;
                    let right = self.term()?;
                    return Ok(call("add", &variable, &right));
                }
                Ok(variable)
            }
            TokenKind::Literal => Ok(token.text),
            _ => Err(Error::parse(
                format!("expected literal, found {}", token),
                token.offset,
            )),
        }
    }

    /// Parse `name(arg, ...)`, the `@` being already consumed
    fn function_call(&mut self) -> Result<String, Error> {
        let name = self.expect(TokenKind::Identifier, "function name")?;
        self.expect(TokenKind::LParen, "(")?;

        // A trailing comma before `)` is allowed
        let mut args = Vec::new();
        while self.peek_kind() != Some(TokenKind::RParen) {
            args.push(self.logical()?);
            match self.peek_kind() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RParen) => break,
                _ => return Err(Error::parse("expected , or )", self.offset())),
            }
        }
        self.expect(TokenKind::RParen, ")")?;
        Ok(format!("{}({})", name.text, args.join(",")))
    }
}

fn call(name: &str, left: &str, right: &str) -> String {
    format!("{}({},{})", name, left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1+2" => "add(1:int,2:int)" ; "addition")]
    #[test_case("1+2*3" => "add(1:int,multi(2:int,3:int))" ; "precedence")]
    #[test_case("1+2*3-4" => "sub(add(1:int,multi(2:int,3:int)),4:int)" ; "left associative")]
    #[test_case("1+2*3-4/5" => "sub(add(1:int,multi(2:int,3:int)),div(4:int,5:int))" ; "chaining")]
    #[test_case("7 % 2 * 1.5" => "multi(mod(7:int,2:int),1.5:float)" ; "modulo and float")]
    #[test_case("1+2*3-4/5+@sum(1,2,3)" => "add(sub(add(1:int,multi(2:int,3:int)),div(4:int,5:int)),sum(1:int,2:int,3:int))" ; "trailing call")]
    #[test_case("1+2*@funA($a,2)-3" => "sub(add(1:int,multi(2:int,funA($a,2:int))),3:int)" ; "call as factor")]
    #[test_case("1+2*@funA($a)-@funB(3,4)+@funC(5,6)" => "add(sub(add(1:int,multi(2:int,funA($a))),funB(3:int,4:int)),funC(5:int,6:int))" ; "several calls")]
    #[test_case("@now()" => "now()" ; "call without arguments")]
    #[test_case("@f(1,)" => "f(1:int)" ; "trailing comma")]
    #[test_case("@f($a, 2 ,)" => "f($a,2:int)" ; "trailing comma after several arguments")]
    #[test_case("$a+\"s\"" => "add($a,s:str)" ; "variable plus string")]
    #[test_case("$a+\"s\"+$b" => "add(add($a,s:str),$b)" ; "variable fold then additive")]
    #[test_case("$a+\"s\"+$b+\"t\"" => "add(add($a,s:str),add($b,t:str))" ; "variable folds nest")]
    #[test_case("$a+\"s\"+$b+\"t\"+$c" => "add(add(add($a,s:str),add($b,t:str)),$c)" ; "variable folds chain")]
    #[test_case("$a+2*3" => "add($a,multi(2:int,3:int))" ; "variable fold takes a term")]
    #[test_case("@funA($a+1,2)" => "funA(add($a,1:int),2:int)" ; "expression argument")]
    #[test_case("1+2*@funA($a+1,$b)" => "add(1:int,multi(2:int,funA(add($a,1:int),$b)))" ; "nested expression argument")]
    #[test_case("@f($a > 1 && $b, !$c)" => "f(and(gt($a,1:int),$b),not($c))" ; "logical arguments")]
    #[test_case("1*(2+3)" => "multi(1:int,add(2:int,3:int))" ; "grouping in factor")]
    #[test_case("$a > 1 && $b < 2" => "and(gt($a,1:int),lt($b,2:int))" ; "and")]
    #[test_case("$a == 1 || $b != 2 && $c <= 3" => "and(or(eq($a,1:int),ne($b,2:int)),lte($c,3:int))" ; "and or share precedence")]
    #[test_case("($a > 1 && $b < 2) || $c == 3" => "or(and(gt($a,1:int),lt($b,2:int)),eq($c,3:int))" ; "grouped logical")]
    #[test_case("!($a > 1 && $b < 2)" => "not(and(gt($a,1:int),lt($b,2:int)))" ; "not grouped")]
    #[test_case("!!$a" => "not(not($a))" ; "double not")]
    #[test_case("($a+1)>=10" => "gte(add($a,1:int),10:int)" ; "grouped comparison")]
    #[test_case("(1)" => "1:int" ; "grouped literal")]
    #[test_case("($stock>100 && $stock<200) && $mfr==\"motorola\"" => "and(and(gt($stock,100:int),lt($stock,200:int)),eq($mfr,motorola:str))" ; "rule and")]
    #[test_case("($stock>100 && $stock<200) || $mfr==\"motorola\"" => "or(and(gt($stock,100:int),lt($stock,200:int)),eq($mfr,motorola:str))" ; "rule or")]
    #[test_case("@trimInt($stock,\"stock:\")*100+5" => "add(multi(trimInt($stock,stock::str),100:int),5:int)" ; "string with colon")]
    fn converts(expression: &str) -> String {
        to_call_notation(expression).unwrap()
    }

    #[test_case("(1+2" => Error::parse("expected )", 4) ; "missing closing paren")]
    #[test_case("1*(2+3" => Error::parse("expected )", 6) ; "missing closing paren in factor")]
    #[test_case("1+" => Error::parse("unexpected end of input", 2) ; "missing operand")]
    #[test_case("" => Error::parse("unexpected end of input", 0) ; "empty input")]
    #[test_case("$" => Error::parse("expected variable name", 1) ; "missing variable name")]
    #[test_case("$1" => Error::parse("expected variable name", 1) ; "invalid variable name")]
    #[test_case("@(1)" => Error::parse("expected function name", 1) ; "missing function name")]
    #[test_case("@f 1" => Error::parse("expected (", 3) ; "missing call paren")]
    #[test_case("@f(1 2)" => Error::parse("expected , or )", 5) ; "missing comma")]
    #[test_case("@f(1," => Error::parse("unexpected end of input", 5) ; "unterminated call")]
    #[test_case("@f(,)" => Error::parse("expected literal, found ,", 3) ; "comma without argument")]
    #[test_case("@f(1,,)" => Error::parse("expected literal, found ,", 5) ; "double comma")]
    #[test_case("abc" => Error::parse("expected literal, found abc", 0) ; "bare identifier")]
    #[test_case("1 2" => Error::parse("unexpected token: 2:int", 2) ; "trailing token")]
    #[test_case("(1+2)*3" => Error::parse("unexpected token: *", 5) ; "arithmetic after group")]
    #[test_case("$a &" => Error::lex("expected &&", 3) ; "lex error surfaces")]
    fn rejects(expression: &str) -> Error {
        to_call_notation(expression).unwrap_err()
    }

    #[test]
    fn depth_limit() {
        let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(
            to_call_notation(&deep).unwrap_err(),
            Error::TooDeep { limit: 64 }
        );

        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(to_call_notation(&shallow).unwrap(), "1:int");

        let config = Config::with_max_depth(8);
        let nested = "1*(1*(1*(1*(1*(1*(1*(1*(1))))))))";
        assert_eq!(
            Parser::new(nested, &config).unwrap().parse().unwrap_err(),
            Error::TooDeep { limit: 8 }
        );
        let not_chain = format!("{}$a", "!".repeat(200));
        assert_eq!(
            to_call_notation(&not_chain).unwrap_err(),
            Error::TooDeep { limit: 64 }
        );
    }
}
