//! Recursive-descent parser over the token stream.
//!
//! Close tags are not checked against the tag they close: `<a>x</b>` parses
//! as an `a` element. An element still open at the end of the input is closed
//! implicitly. Elements nest at most `MAX_NESTING` levels deep.
use tracing::debug;
use crate::errors::SyntaxError;
use crate::frontend::ast::*;
use crate::frontend::tokenizer::{self, TagToken, Token};

/// Deepest element nesting the parser accepts. Every later stage walks the
/// tree recursively, so this also bounds their stack use.
pub const MAX_NESTING: usize = 256;

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    /// Elements currently open.
    depth: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with `Token::Eof`, as `tokenize` guarantees.
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        Parser {tokens, pos: 0, depth: 0}
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_boundary(&self) -> bool {
        self.peek().map(|x| x.is_close() || x.is_eof()).unwrap_or(true)
    }

    pub fn parse_program(&mut self) -> Result<Node<'a>, SyntaxError> {
        let mut children = Vec::new();
        loop {
            children.extend(self.parse_children()?);
            match self.peek() {
                Some(Token::Close{name, location}) => {
                    debug!(tag = *name, %location, "skipping stray close tag");
                    self.pos += 1;
                }
                _ => break,
            }
        }
        Ok(Node::Program(children))
    }

    /// Siblings up to the next close tag or the end of input. The close tag
    /// is left for the caller.
    pub fn parse_children(&mut self) -> Result<Vec<Node<'a>>, SyntaxError> {
        let mut children = Vec::new();
        while !self.at_boundary() {
            if let Some(node) = self.parse_node()? {
                children.push(node);
            }
        }
        Ok(children)
    }

    fn parse_node(&mut self) -> Result<Option<Node<'a>>, SyntaxError> {
        let node = match self.next() {
            Some(Token::Open(tag)) => Some(self.parse_element(tag, false)?),
            Some(Token::SelfClose(tag)) => Some(self.parse_element(tag, true)?),
            Some(Token::Text{text, location}) => Some(Node::new_text(text, location)),
            Some(Token::Expr{expr, location}) => Some(Node::new_expression(expr, location)),
            Some(Token::Close{..}) | Some(Token::Eof{..}) | None => None,
        };
        Ok(node)
    }

    fn parse_element(&mut self, tag: TagToken<'a>, self_closing: bool) -> Result<Node<'a>, SyntaxError> {
        let TagToken {name, attributes, location} = tag;
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::NestingTooDeep {location, limit: MAX_NESTING});
        }
        if self_closing {
            return Ok(Node::new_tag(name, attributes, Vec::new(), location));
        }
        self.depth += 1;
        let children = self.parse_children()?;
        self.depth -= 1;
        match self.peek() {
            Some(Token::Close{..}) => {
                self.pos += 1;
            }
            _ => {
                debug!(tag = name, %location, "element left open at end of input");
            }
        }
        Ok(Node::new_tag(name, attributes, children, location))
    }
}

pub fn parse_tokens<'a>(tokens: Vec<Token<'a>>) -> Result<Node<'a>, SyntaxError> {
    Parser::new(tokens).parse_program()
}

/// Tokenizes and parses `source` into a `Node::Program`.
pub fn parse_source(source: &str) -> Result<Node<'_>, SyntaxError> {
    let tokens = tokenizer::tokenize(source)?;
    parse_tokens(tokens)
}
