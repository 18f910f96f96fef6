//! Recursive-descent parser for the CGIF subset the writer produces.
//!
//! Productions are handed to a [`ParserBuilder`] as soon as they are
//! recognized; nested contexts are created before their contents are
//! parsed so inner productions have somewhere to go.

use super::lexer::tokenize;
use super::token::{Token, TokenKind};
use crate::builder::{first_layout_comment, ParserBuilder};
use crate::error::{CgifError, Result};
use cg_graph::ObjectId;

/// Type name that turns `[Type: NAME]` into a type declaration
const TYPE_DECLARATION: &str = "type";

/// Relation label that turns `(subtype A B)` into a gen-spec link
const SUBTYPE_RELATION: &str = "subtype";

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    builder: &'a mut ParserBuilder,
    max_depth: usize,
}

/// Header of a concept box: everything before its nested items
struct ConceptHeader {
    negated: bool,
    type_label: String,
    referent: String,
    layout: Option<String>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &str, builder: &'a mut ParserBuilder, max_depth: usize) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(input)?,
            pos: 0,
            builder,
            max_depth,
        })
    }

    /// Parse every top-level production into the root context
    pub fn parse(mut self) -> Result<()> {
        while !self.is_at_end() {
            self.parse_item(ObjectId::ROOT, 0)?;
        }
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.current().is_eof()
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek(&self, offset: usize) -> &Token {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn advance(&mut self) -> &Token {
        let index = self.pos;
        if !self.is_at_end() {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("{:?}", kind)))
        }
    }

    fn unexpected(&self, wanted: &str) -> CgifError {
        CgifError::parse(
            self.current().start,
            format!("expected {}, found {:?}", wanted, self.current().kind),
        )
    }

    /// Consume a word, quoted literal or set and return its raw text
    fn text(&mut self) -> Result<String> {
        match self.current().text() {
            Some(text) => {
                let text = text.to_string();
                self.advance();
                Ok(text)
            }
            None => Err(self.unexpected("a label or literal")),
        }
    }

    fn parse_item(&mut self, ctx: ObjectId, depth: usize) -> Result<()> {
        match self.current().kind {
            TokenKind::LBracket | TokenKind::Tilde => self.parse_concept(ctx, depth),
            TokenKind::LParen => self.parse_relation(ctx),
            TokenKind::LAngle => self.parse_actor(ctx),
            _ => Err(self.unexpected("'[', '~[', '(' or '<'")),
        }
    }

    /// `~? [ (TYPE :)? REFERENT? item* ]`
    fn parse_concept(&mut self, ctx: ObjectId, depth: usize) -> Result<()> {
        let header = self.parse_concept_header()?;

        if self.check(&TokenKind::RBracket) {
            self.advance();
            return self.finish_plain_concept(ctx, header);
        }

        if depth >= self.max_depth {
            return Err(CgifError::DepthLimit {
                limit: self.max_depth,
            });
        }

        let context = self.builder.make_context(
            ctx,
            &header.type_label,
            &header.referent,
            header.negated,
            header.layout.as_deref(),
        )?;

        while !self.check(&TokenKind::RBracket) {
            if self.is_at_end() {
                return Err(self.unexpected("']'"));
            }
            self.parse_item(context, depth + 1)?;
        }
        self.advance();

        Ok(())
    }

    fn parse_concept_header(&mut self) -> Result<ConceptHeader> {
        let negated = self.check(&TokenKind::Tilde);
        if negated {
            self.advance();
        }

        let open_special = self.expect(&TokenKind::LBracket)?.special.clone();
        let layout = first_layout_comment(open_special.as_deref(), self.current().special.as_deref());

        let mut type_label = String::new();
        if self.check(&TokenKind::Colon) {
            self.advance();
        } else if self.current().text().is_some() && matches!(self.peek(1).kind, TokenKind::Colon) {
            type_label = self.text()?;
            self.advance();
        } else if matches!(&self.current().kind, TokenKind::Word(word) if !is_referent_word(word)) {
            // `[Cat]`: a type with no referent
            type_label = self.text()?;
        }

        let mut parts = Vec::new();
        while self.current().text().is_some() {
            parts.push(self.text()?);
        }

        Ok(ConceptHeader {
            negated,
            type_label,
            referent: parts.join(" "),
            layout,
        })
    }

    fn finish_plain_concept(&mut self, ctx: ObjectId, header: ConceptHeader) -> Result<()> {
        let layout = header.layout.as_deref();

        if !header.negated
            && header.type_label.eq_ignore_ascii_case(TYPE_DECLARATION)
            && !header.referent.is_empty()
        {
            self.builder.make_type_label(ctx, &header.referent, layout)?;
            return Ok(());
        }

        let id = self
            .builder
            .make_concept(ctx, &header.type_label, &header.referent, layout)?;
        if header.negated {
            self.builder.negate(id)?;
        }
        Ok(())
    }

    /// `( LABEL arg* )`, or `(subtype SUB SUPER)`
    fn parse_relation(&mut self, ctx: ObjectId) -> Result<()> {
        let open_special = self.expect(&TokenKind::LParen)?.special.clone();
        let layout = first_layout_comment(open_special.as_deref(), self.current().special.as_deref());
        let label = self.text()?;

        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            args.push(self.text().map_err(|_| self.unexpected("an argument or ')'"))?);
        }
        self.advance();

        if label.eq_ignore_ascii_case(SUBTYPE_RELATION) && args.len() == 2 {
            self.builder
                .make_gen_spec_link(ctx, &args[0], &args[1], layout.as_deref())?;
        } else {
            self.builder.make_relation(ctx, &label, &args, layout.as_deref())?;
        }
        Ok(())
    }

    /// `< LABEL in* | out* >`; without the bar every argument is an input
    fn parse_actor(&mut self, ctx: ObjectId) -> Result<()> {
        let open_special = self.expect(&TokenKind::LAngle)?.special.clone();
        let layout = first_layout_comment(open_special.as_deref(), self.current().special.as_deref());
        let label = self.text()?;

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut after_bar = false;
        loop {
            match self.current().kind {
                TokenKind::RAngle => break,
                TokenKind::Pipe if !after_bar => {
                    after_bar = true;
                    self.advance();
                }
                _ => {
                    let arg = self.text().map_err(|_| self.unexpected("an argument, '|' or '>'"))?;
                    if after_bar {
                        outputs.push(arg);
                    } else {
                        inputs.push(arg);
                    }
                }
            }
        }
        self.advance();

        self.builder
            .make_actor(ctx, &label, &inputs, &outputs, layout.as_deref())?;
        Ok(())
    }
}

/// Bare words that can only be referents, never type names
fn is_referent_word(word: &str) -> bool {
    word.starts_with(['*', '?', '#', '@']) || word.starts_with(|c: char| c.is_ascii_digit())
}
