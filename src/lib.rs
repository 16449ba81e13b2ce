//! # dsnparse
//!
//! A streaming reader for Specctra DSN files, the S-expression format PCB
//! design tools use to describe boards for autorouting.
//!
//! This library provides:
//! - A lexer that tokenizes DSN text from any reader in one pass
//! - A parser that builds a declaration tree, optionally skipping sections
//!   the caller does not need without materializing them
//! - A small netlist model that can be built from a parsed `network` section
//!
//! ## Architecture
//!
//! - [`dsn`] - Lexer, parser and the declaration tree
//! - [`netlist`] - Nets, pads, components and connections
//! - [`error`] - Error types shared by both
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! dsnparse board.dsn --exclude placement
//! ```
//!
//! ### Library
//!
//! ```
//! use dsnparse::dsn::{Lexer, Parser};
//!
//! let input = "(pcb board.dsn (structure (layer F.Cu)) (placement (component R1)))";
//! let mut parser = Parser::new(Lexer::new(input.as_bytes()));
//! let tree = parser.parse_filter(|literal| literal != "placement").unwrap();
//!
//! assert!(tree.find("layer").is_some());
//! assert!(tree.find("component").is_none());
//! ```

pub mod dsn;
pub mod error;
pub mod netlist;

// Re-export main types for convenience
pub use dsn::{Decl, DeclTree, Lexer, Parser, TokenKind, TokenLit};
pub use error::{DsnError, LexError, Location, Result};
pub use netlist::Circuit;

/// Character that delimits strings until a `string_quote` directive changes it
pub const DEFAULT_STRING_QUOTE: char = '"';

/// Identifier that makes the next character the string delimiter
pub const STRING_QUOTE_DIRECTIVE: &str = "string_quote";
