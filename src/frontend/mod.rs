//! Template source to AST.
pub mod data;
pub mod tokenizer;
pub mod parser;
pub mod ast;

pub use ast::Node;
pub use parser::parse_source;
pub use tokenizer::{tokenize, Token, TokenKind};
