use crate::error::Error;
use crate::token::{Token, TokenKind};
use std::iter::Peekable;
use std::str::CharIndices;

#[must_use]
/// Check if `ident` is a valid variable or function name
///
/// # Examples
///
/// ```
/// # use ruleexpr::is_identifier;
///
/// assert_eq!(is_identifier("MIN_ORD_QTY"), true);
/// assert_eq!(is_identifier("_abc"), false);
/// assert_eq!(is_identifier("34zb"), false);
/// ```
pub fn is_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    // Check first char
    if !chars.next().map_or(false, is_identifier_start) {
        return false;
    }
    // Check all others
    chars.all(is_identifier_part)
}

/// An helper struct for lexing the input
pub struct Lexer<'a> {
    input: Peekable<CharIndices<'a>>,
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            input: source.char_indices().peekable(),
            source,
        }
    }

    /// Split the whole input into tokens, in one left to right pass.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, Error> {
        let mut output = Vec::new();
        while let Some(token) = self.next_token()? {
            output.push(token);
        }
        Ok(output)
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        // Only the space character separates tokens
        while let Some(&(_, ' ')) = self.input.peek() {
            self.input.next();
        }

        let (start, c) = match self.input.next() {
            Some(next) => next,
            None => return Ok(None),
        };

        let single = |kind: TokenKind| -> Result<Option<Token>, Error> {
            Ok(Some(Token::new(kind, c.to_string(), start)))
        };
        match c {
            '+' => single(TokenKind::Plus),
            '-' => single(TokenKind::Minus),
            '*' => single(TokenKind::Mul),
            '/' => single(TokenKind::Div),
            '%' => single(TokenKind::Mod),
            '(' => single(TokenKind::LParen),
            ')' => single(TokenKind::RParen),
            '@' => single(TokenKind::At),
            '$' => single(TokenKind::Dollar),
            ',' => single(TokenKind::Comma),
            '&' => self.pair(start, '&', TokenKind::And, None),
            '|' => self.pair(start, '|', TokenKind::Or, None),
            '=' => self.pair(start, '=', TokenKind::Eq, None),
            '!' => self.pair(start, '=', TokenKind::Ne, Some(TokenKind::Not)),
            '>' => self.pair(start, '=', TokenKind::Gte, Some(TokenKind::Gt)),
            '<' => self.pair(start, '=', TokenKind::Lte, Some(TokenKind::Lt)),
            '"' => self.string(start).map(Some),
            c if c.is_ascii_digit() => Ok(Some(self.number(start))),
            c if is_identifier_start(c) => Ok(Some(self.identifier(start))),
            other => Err(Error::lex(
                format!("unexpected character: {}", other),
                start,
            )),
        }
    }

    /// Lex an operator whose first character was already consumed. If
    /// `second` follows, the result is `double`. Otherwise the result is
    /// `single`, and operators without a one-character form are an error.
    fn pair(
        &mut self,
        start: usize,
        second: char,
        double: TokenKind,
        single: Option<TokenKind>,
    ) -> Result<Option<Token>, Error> {
        let source = self.source;
        let first = &source[start..=start];
        if self.input.next_if(|&(_, c)| c == second).is_some() {
            let text = format!("{}{}", first, second);
            return Ok(Some(Token::new(double, text, start)));
        }
        match single {
            Some(kind) => Ok(Some(Token::new(kind, first, start))),
            None => Err(Error::lex(format!("expected {}{}", first, second), start)),
        }
    }

    fn string(&mut self, start: usize) -> Result<Token, Error> {
        let body = start + 1;
        for (i, c) in self.input.by_ref() {
            match c {
                '"' => {
                    let value = &self.source[body..i];
                    return Ok(Token::new(TokenKind::Literal, format!("{}:str", value), start));
                }
                // Call notation splits on these, so a string holding one
                // could not be read back unambiguously
                '(' | ')' | ',' => {
                    return Err(Error::lex(
                        format!("character not allowed in string literal: {}", c),
                        i,
                    ))
                }
                _ => {}
            }
        }
        Err(Error::lex("expected \"", self.source.len()))
    }

    fn number(&mut self, start: usize) -> Token {
        let mut end = self.digits(start + 1);

        // The fractional part is only taken when a digit follows the dot
        let mut lookahead = self.input.clone();
        let is_float = matches!(lookahead.next(), Some((_, '.')))
            && matches!(lookahead.next(), Some((_, c)) if c.is_ascii_digit());
        if is_float {
            self.input.next();
            end = self.digits(end + 1);
        }

        let tag = if is_float { "float" } else { "int" };
        let text = format!("{}:{}", &self.source[start..end], tag);
        Token::new(TokenKind::Literal, text, start)
    }

    /// Consume a run of ASCII digits, returning the offset just past it.
    fn digits(&mut self, mut end: usize) -> usize {
        while let Some((i, _)) = self.input.next_if(|&(_, c)| c.is_ascii_digit()) {
            end = i + 1;
        }
        end
    }

    fn identifier(&mut self, start: usize) -> Token {
        let mut end = start + self.source[start..].chars().next().map_or(1, char::len_utf8);
        while let Some((i, c)) = self.input.next_if(|&(_, c)| is_identifier_part(c)) {
            end = i + c.len_utf8();
        }
        Token::new(TokenKind::Identifier, &self.source[start..end], start)
    }
}

/// Split `input` into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    Lexer::new(input).tokenize()
}

/// Check if `c` can appear at the first character of an identifier
fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic()
}

/// Check if `c` can appear inside an identifier
fn is_identifier_part(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
