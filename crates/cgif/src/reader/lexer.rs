//! CGIF lexer built on winnow.
//!
//! Comments are not tokens: each run of `/* ... */` comments is attached to
//! the token that follows it as its special text, which is where layout
//! annotations are picked up from.

use winnow::combinator::{alt, cut_err, opt};
use winnow::error::ContextError;
use winnow::stream::Location;
use winnow::token::{any, one_of, take_till, take_until, take_while};
use winnow::{LocatingSlice, ModalResult, Parser};

use super::token::{Token, TokenKind};
use crate::error::{CgifError, Result};

/// Input type for the lexer, tracking byte offsets for spans.
pub type Input<'a> = LocatingSlice<&'a str>;

pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Tokenize the entire input, always ending with an `Eof` token.
    ///
    /// Fails on the first unterminated string, set or comment.
    pub fn tokenize(self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut input = LocatingSlice::new(self.input);

        loop {
            let comments = skip_ws_and_comments(&mut input)?;
            let special = if comments.is_empty() {
                None
            } else {
                Some(comments.join(" "))
            };

            let start = input.current_token_start();
            if input.is_empty() {
                let mut eof = Token::new(TokenKind::Eof, start, start);
                eof.special = special;
                tokens.push(eof);
                break;
            }

            match next_token(&mut input) {
                Ok(kind) => {
                    let mut token = Token::new(kind, start, input.current_token_start());
                    token.special = special;
                    tokens.push(token);
                }
                Err(_) => return Err(self.make_error(start)),
            }
        }

        Ok(tokens)
    }

    fn make_error(&self, position: usize) -> CgifError {
        let rest = &self.input[position..];
        let mut chars = rest.chars();
        let first = chars.next().unwrap_or('?');
        let message = match first {
            '"' => "unterminated string literal".to_string(),
            '*' | '?' if chars.next() == Some('"') => "unterminated string literal".to_string(),
            '{' => "unterminated set referent".to_string(),
            c => format!("unexpected character {:?}", c),
        };
        CgifError::parse(position, message)
    }
}

/// Skip whitespace and collect the raw text of any comments passed over.
fn skip_ws_and_comments<'a>(input: &mut Input<'a>) -> Result<Vec<&'a str>> {
    let mut comments = Vec::new();
    loop {
        let _: ModalResult<&str, ContextError> =
            take_while(0.., char::is_whitespace).parse_next(input);

        if !input.starts_with("/*") {
            return Ok(comments);
        }

        let start = input.current_token_start();
        match parse_comment(input) {
            Ok(text) => comments.push(text),
            Err(_) => return Err(CgifError::parse(start, "unterminated comment")),
        }
    }
}

fn parse_comment<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    ("/*", take_until(0.., "*/"), "*/").take().parse_next(input)
}

fn next_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((parse_punctuation, parse_quoted, parse_set, parse_word)).parse_next(input)
}

fn parse_punctuation(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    any.verify_map(TokenKind::punctuation).parse_next(input)
}

/// `"..."`, optionally behind a `*` or `?` sigil. Once the opening quote
/// is seen the literal must close.
fn parse_quoted(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    (opt(one_of(['*', '?'])), '"', cut_err((quoted_body, '"')))
        .take()
        .map(|text: &str| TokenKind::Quoted(text.to_string()))
        .parse_next(input)
}

/// A `"` right after a backslash never closes the literal.
fn quoted_body(input: &mut Input<'_>) -> ModalResult<()> {
    loop {
        let _: &str = take_till(0.., ['"', '\\']).parse_next(input)?;
        if !input.starts_with('\\') {
            return Ok(());
        }
        ('\\', opt('"')).void().parse_next(input)?;
    }
}

/// `{ ... }` up to the first `}`, plus any suffix such as `@3`
fn parse_set(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    (set_body, word_body)
        .take()
        .map(|text: &str| TokenKind::Set(text.to_string()))
        .parse_next(input)
}

fn set_body(input: &mut Input<'_>) -> ModalResult<()> {
    ('{', take_till(0.., '}'), '}').void().parse_next(input)
}

fn parse_word(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    word_body
        .take()
        .verify(|text: &str| !text.is_empty())
        .map(|text: &str| TokenKind::Word(text.to_string()))
        .parse_next(input)
}

/// Word characters up to a delimiter or comment; an embedded `{...}` is
/// taken whole. An unclosed `{` ends the word so the set error points at it.
fn word_body(input: &mut Input<'_>) -> ModalResult<()> {
    loop {
        let _: &str = take_while(0.., |c: char| {
            !TokenKind::is_delimiter(c) && c != '{' && c != '/'
        })
        .parse_next(input)?;

        if input.starts_with("/*") {
            return Ok(());
        } else if input.starts_with('/') {
            '/'.parse_next(input)?;
        } else if input.starts_with('{') {
            if opt(set_body).parse_next(input)?.is_none() {
                return Ok(());
            }
        } else {
            return Ok(());
        }
    }
}

/// Tokenize CGIF text
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn word(s: &str) -> TokenKind {
        TokenKind::Word(s.to_string())
    }

    #[test]
    fn test_concept_and_relation() {
        assert_eq!(
            kinds("[Cat: *x1] (On ?x1 Mat)"),
            vec![
                TokenKind::LBracket,
                word("Cat"),
                TokenKind::Colon,
                word("*x1"),
                TokenKind::RBracket,
                TokenKind::LParen,
                word("On"),
                word("?x1"),
                word("Mat"),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_literals_keep_sigil_and_escapes() {
        assert_eq!(
            kinds(r#"?"New York" "say \"hi\"" "#),
            vec![
                TokenKind::Quoted(r#"?"New York""#.to_string()),
                TokenKind::Quoted(r#""say \"hi\"""#.to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_sets_are_single_tokens() {
        assert_eq!(
            kinds("[Cat: {*}@3] {*x1}"),
            vec![
                TokenKind::LBracket,
                word("Cat"),
                TokenKind::Colon,
                TokenKind::Set("{*}@3".to_string()),
                TokenKind::RBracket,
                TokenKind::Set("{*x1}".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_attach_to_next_token() {
        let tokens = tokenize("[ /*a*/ /*b*/ Cat] /*tail*/").unwrap();
        assert_eq!(tokens[0].special, None);
        assert_eq!(tokens[1].kind, word("Cat"));
        assert_eq!(tokens[1].special.as_deref(), Some("/*a*/ /*b*/"));
        assert_eq!(tokens[2].special, None);
        assert!(tokens[3].is_eof());
        assert_eq!(tokens[3].special.as_deref(), Some("/*tail*/"));
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let tokens = tokenize("  [Café]").unwrap();
        assert_eq!(tokens[0].start, 2);
        assert_eq!((tokens[1].start, tokens[1].end), (3, 8));
        assert_eq!(tokens[2].start, 8);
    }

    #[test]
    fn test_unterminated_input_fails() {
        assert!(matches!(tokenize("[Cat: \"open]"), Err(CgifError::Parse { position: 6, .. })));
        assert!(matches!(tokenize("/* never closed"), Err(CgifError::Parse { position: 0, .. })));
        assert!(matches!(tokenize("[Cat: {*x1]"), Err(CgifError::Parse { position: 6, .. })));
    }

    #[test]
    fn test_unterminated_sigil_literal_reports_the_sigil() {
        assert!(matches!(tokenize("(On ?\"open)"), Err(CgifError::Parse { position: 4, .. })));
    }

    #[test]
    fn test_backslash_quote_stays_inside_literal() {
        assert_eq!(
            kinds(r#""a\"b" Cat"#),
            vec![TokenKind::Quoted(r#""a\"b""#.to_string()), word("Cat"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_words_stop_at_comments_and_swallow_braces() {
        let tokens = tokenize("Tom/*c*/ a/b Cat{*x1}@2").unwrap();
        assert_eq!(tokens[0].kind, word("Tom"));
        assert_eq!(tokens[1].kind, word("a/b"));
        assert_eq!(tokens[1].special.as_deref(), Some("/*c*/"));
        assert_eq!(tokens[2].kind, word("Cat{*x1}@2"));
    }

    #[test]
    fn test_unclosed_brace_inside_word_points_at_brace() {
        let err = tokenize("[Cat: Tom{x]").unwrap_err();
        assert!(matches!(err, CgifError::Parse { position: 9, .. }), "got {err:?}");
    }
}
