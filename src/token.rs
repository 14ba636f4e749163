use std::fmt::{self, Display, Formatter};

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is
    pub kind: TokenKind,
    /// The token text. Literals carry their `:int`, `:float` or `:str` tag.
    pub text: String,
    /// Byte offset of the token in the source text
    pub offset: usize,
}

impl Token {
    /// Create a token of `kind` found at byte `offset`
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
        }
    }
}

/// Possible tokens to find in the input string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Number or string literal, with its type tag
    Literal,
    /// Variable or function name
    Identifier,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// Left parenthesis
    LParen,
    /// Right parenthesis
    RParen,
    /// `@`, introduces a function call
    At,
    /// `$`, introduces a variable
    Dollar,
    /// `,` between function arguments
    Comma,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl TokenKind {
    /// Name of the built-in emitted for a binary operator, if this is one.
    pub fn builtin(self) -> Option<&'static str> {
        let name = match self {
            Self::Plus => "add",
            Self::Minus => "sub",
            Self::Mul => "multi",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::And => "and",
            Self::Or => "or",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Eq => "eq",
            Self::Ne => "ne",
            _ => return None,
        };
        Some(name)
    }

    /// Check if the token is one of the six comparison operators
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Eq | Self::Ne
        )
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "{}", self.text)
    }
}
