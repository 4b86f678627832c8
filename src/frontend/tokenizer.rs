//! Template tokenizer.
//!
//! A single forward pass over the (trimmed) source. The tokenizer is zero-copy:
//! token payloads are slices of the input. Unlike a fault tolerant editor
//! parser, reaching the end of the input inside a tag or an expression is an
//! error.
use tracing::{debug, trace};
use unicode_segmentation::UnicodeSegmentation;
use crate::errors::SyntaxError;
use crate::frontend::data::*;

///////////////////////////////////////////////////////////////////////////////
// TOKENS
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Open,
    SelfClose,
    Close,
    Text,
    Expr,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken<'a> {
    pub name: &'a str,
    pub attributes: Attributes<'a>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Open(TagToken<'a>),
    SelfClose(TagToken<'a>),
    Close {
        name: &'a str,
        location: Location,
    },
    Text {
        text: &'a str,
        location: Location,
    },
    /// Braces stripped; nested braces kept verbatim.
    Expr {
        expr: &'a str,
        location: Location,
    },
    Eof {
        location: Location,
    },
}

impl<'a> Token<'a> {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Open(_) => TokenKind::Open,
            Token::SelfClose(_) => TokenKind::SelfClose,
            Token::Close{..} => TokenKind::Close,
            Token::Text{..} => TokenKind::Text,
            Token::Expr{..} => TokenKind::Expr,
            Token::Eof{..} => TokenKind::Eof,
        }
    }
    pub fn location(&self) -> Location {
        match self {
            Token::Open(x) => x.location,
            Token::SelfClose(x) => x.location,
            Token::Close{location, ..} => *location,
            Token::Text{location, ..} => *location,
            Token::Expr{location, ..} => *location,
            Token::Eof{location} => *location,
        }
    }
    pub fn is_close(&self) -> bool {
        self.kind() == TokenKind::Close
    }
    pub fn is_eof(&self) -> bool {
        self.kind() == TokenKind::Eof
    }
}

///////////////////////////////////////////////////////////////////////////////
// CURSOR
///////////////////////////////////////////////////////////////////////////////

pub struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    /// Byte offset on the current line whose column is already known.
    mark: usize,
    mark_column: usize,
}

impl<'a> Tokenizer<'a> {
    /// The source is trimmed first; locations are relative to the trimmed text.
    pub fn new(source: &'a str) -> Self {
        Tokenizer {
            source: source.trim(),
            pos: 0,
            line: 1,
            mark: 0,
            mark_column: 1,
        }
    }

    /// Counts graphemes only since the previous call on the same line.
    fn location(&mut self) -> Location {
        self.mark_column += self.source[self.mark..self.pos].graphemes(true).count();
        self.mark = self.pos;
        Location {offset: self.pos, line: self.line, column: self.mark_column}
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.mark = self.pos;
            self.mark_column = 1;
        }
        Some(ch)
    }

    fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !f(ch) {
                break;
            }
            self.bump();
        }
        &self.source[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }

    ///////////////////////////////////////////////////////////////////////////
    // READERS
    ///////////////////////////////////////////////////////////////////////////

    /// Expects the cursor on `{`. Returns the text between the outer braces.
    fn read_balanced(&mut self) -> Result<&'a str, SyntaxError> {
        let start = self.location();
        self.bump();
        let begin = self.pos;
        let mut depth = 1usize;
        loop {
            match self.bump() {
                None => return Err(SyntaxError::UnterminatedExpression(start)),
                Some('{') => depth += 1,
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&self.source[begin..self.pos - 1]);
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn read_attr_value(&mut self, tag_start: Location) -> Result<AttrValue<'a>, SyntaxError> {
        match self.peek() {
            None => Err(SyntaxError::UnterminatedTag(tag_start)),
            Some(quote) if quote == '"' || quote == '\'' => {
                self.bump();
                let value = self.eat_while(|ch| ch != quote);
                match self.bump() {
                    Some(_) => Ok(AttrValue::Literal(value.into())),
                    None => Err(SyntaxError::UnterminatedTag(tag_start)),
                }
            }
            Some('{') => {
                let expr = self.read_balanced()?;
                Ok(AttrValue::Dynamic(expr.into()))
            }
            Some(_) => {
                let start = self.pos;
                while let Some(ch) = self.peek() {
                    let ends_tag = ch == '>' || (ch == '/' && self.peek_nth(1) == Some('>'));
                    if ch.is_whitespace() || ends_tag {
                        break;
                    }
                    self.bump();
                }
                let value: &'a str = &self.source[start..self.pos];
                Ok(AttrValue::Literal(value.into()))
            }
        }
    }

    fn read_open_tag(&mut self) -> Result<Token<'a>, SyntaxError> {
        let location = self.location();
        self.bump();
        let name = self.eat_while(is_ident_char);
        let mut attributes = Attributes::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(SyntaxError::UnterminatedTag(location)),
                Some('>') => {
                    self.bump();
                    break;
                }
                Some('/') => {
                    self.bump();
                    self_closing = true;
                }
                Some(ch) if is_ident_char(ch) => {
                    self_closing = false;
                    let attr_name = self.eat_while(is_ident_char);
                    self.skip_whitespace();
                    let value = if self.peek() == Some('=') {
                        self.bump();
                        self.skip_whitespace();
                        self.read_attr_value(location)?
                    } else {
                        AttrValue::Flag
                    };
                    attributes.insert(attr_name, value);
                }
                Some(ch) => {
                    debug!(tag = name, %location, "skipping unexpected {:?} in tag", ch);
                    self.bump();
                }
            }
        }
        let tag = TagToken {name, attributes, location};
        if self_closing {
            Ok(Token::SelfClose(tag))
        } else {
            Ok(Token::Open(tag))
        }
    }

    fn read_close_tag(&mut self) -> Result<Token<'a>, SyntaxError> {
        let location = self.location();
        self.bump();
        self.bump();
        let name = self.eat_while(|ch| ch != '>');
        match self.bump() {
            Some(_) => Ok(Token::Close {name: name.trim(), location}),
            None => Err(SyntaxError::UnterminatedTag(location)),
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // ENTRYPOINT
    ///////////////////////////////////////////////////////////////////////////

    pub fn tokenize(mut self) -> Result<Vec<Token<'a>>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let token = match self.peek() {
                None => {
                    tokens.push(Token::Eof {location: self.location()});
                    break;
                }
                Some('<') if self.peek_nth(1) == Some('/') => self.read_close_tag()?,
                Some('<') => self.read_open_tag()?,
                Some('{') => {
                    let location = self.location();
                    let expr = self.read_balanced()?;
                    Token::Expr {expr, location}
                }
                Some(_) => {
                    let location = self.location();
                    let text = self.eat_while(|ch| ch != '<' && ch != '{');
                    Token::Text {text: text.trim_end(), location}
                }
            };
            trace!(kind = ?token.kind(), location = %token.location(), "token");
            tokens.push(token);
        }
        Ok(tokens)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, SyntaxError> {
    Tokenizer::new(source).tokenize()
}
