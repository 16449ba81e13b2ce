//! Reader for Specctra DSN text.
//!
//! DSN is the S-expression format PCB tools use to hand boards to
//! autorouters. A file is a tree of parenthesized declarations, each a name
//! followed by argument tokens and nested declarations.
//!
//! # Grammar Overview
//!
//! ```text
//! file        = { declaration }
//! declaration = '(' identifier { argument | declaration } ')'
//! argument    = identifier | string | integer | float
//!
//! identifier  = ident_start { ident_start | digit }
//! ident_start = letter | '_' | '-' | '@' | '/' | '.' | '+' | ':' | '[' | ']' | ','
//! string      = quote { any_char - ( quote | '\' | newline ) } quote
//! integer     = ['-'] digit { digit }
//! float       = ['-'] digit { digit } '.' { digit }
//! ```
//!
//! `quote` starts as `"`. The identifier `string_quote` makes the next
//! non-blank character the quote for the rest of the input, as in
//! `(parser (string_quote "))`.
//!
//! # Selective parsing
//!
//! [`Parser::parse_filter`] takes a predicate over token literals. Rejected
//! declarations are skipped without being built, which keeps memory flat
//! when only one section of a large board is needed.
//!
//! # Example
//!
//! ```
//! let tree = dsnparse::dsn::parse_str("(pcb board.dsn (unit um) (placement))").unwrap();
//! let pcb = tree.roots().next().unwrap();
//! assert_eq!(pcb.name(), "pcb");
//! assert_eq!(pcb.child("unit").unwrap().args()[0].literal(), "um");
//! ```

mod decl;
mod lexer;
mod parser;

pub use decl::{Decl, DeclId, DeclTree, TokenLit, Walk};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{DsnError, Result};

/// Parse a DSN string, keeping every declaration.
pub fn parse_str(input: &str) -> Result<DeclTree> {
    parse_str_filter(input, |_| true)
}

/// Parse a DSN string, keeping what `filter` accepts.
pub fn parse_str_filter<F>(input: &str, filter: F) -> Result<DeclTree>
where
    F: FnMut(&str) -> bool,
{
    Parser::new(Lexer::new(input.as_bytes())).parse_filter(filter)
}

/// Parse DSN text from a reader, naming it `source` in diagnostics.
pub fn parse_reader<R, F>(source: &str, reader: R, filter: F) -> Result<DeclTree>
where
    R: Read,
    F: FnMut(&str) -> bool,
{
    Parser::new(Lexer::with_source(source, reader)).parse_filter(filter)
}

/// Parse a DSN file.
pub fn parse_file<F>(path: &Path, filter: F) -> Result<DeclTree>
where
    F: FnMut(&str) -> bool,
{
    let file = File::open(path).map_err(|e| DsnError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_reader(&path.display().to_string(), file, filter)
}
