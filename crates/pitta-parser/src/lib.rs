//! Pitta parser: converts a token stream into an AST.

mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{parse_source, parse_source_from, ParseResult, Parser, MAX_ARGUMENTS, MAX_NESTING};
