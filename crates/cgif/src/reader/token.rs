//! CGIF token types.

/// A token with its source span and any comments that preceded it.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Raw `/* ... */` comments between the previous token and this one
    pub special: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            start,
            end,
            special: None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Raw source text of a word, quoted string or set
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(text) | TokenKind::Quoted(text) | TokenKind::Set(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `<`
    LAngle,
    /// `>`
    RAngle,
    /// `|`
    Pipe,
    /// `:`
    Colon,
    /// `~`
    Tilde,

    /// Bare word such as `Cat`, `*x1` or `?x1`
    Word(String),

    /// Quoted literal, quotes and optional `*`/`?` sigil included
    Quoted(String),

    /// Set referent such as `{*x1}` or `{*}@3`
    Set(String),

    Eof,
}

impl TokenKind {
    /// Characters that end a bare word
    pub fn is_delimiter(c: char) -> bool {
        c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '<' | '>' | '|' | ':' | '~' | '"')
    }

    pub fn punctuation(c: char) -> Option<TokenKind> {
        let kind = match c {
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '<' => TokenKind::LAngle,
            '>' => TokenKind::RAngle,
            '|' => TokenKind::Pipe,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            _ => return None,
        };
        Some(kind)
    }
}
