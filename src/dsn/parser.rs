//! Single-pass parser building a [`DeclTree`] from lexer tokens.

use std::io::Read;

use tracing::{debug, trace};

use super::decl::{DeclId, DeclTree, TokenLit};
use super::lexer::{Lexer, TokenKind};
use crate::error::{DsnError, Result};
use crate::STRING_QUOTE_DIRECTIVE;

/// Parser for DSN declarations.
pub struct Parser<R> {
    lexer: Lexer<R>,
}

impl<R: Read> Parser<R> {
    /// Create a new parser over the given lexer.
    pub fn new(lexer: Lexer<R>) -> Self {
        Self { lexer }
    }

    /// The underlying lexer, for position queries after a parse.
    pub fn lexer(&self) -> &Lexer<R> {
        &self.lexer
    }

    /// Give back the lexer, e.g. to [`Lexer::reset`] it for another input.
    pub fn into_lexer(self) -> Lexer<R> {
        self.lexer
    }

    /// Parse every declaration in the input.
    pub fn parse(&mut self) -> Result<DeclTree> {
        self.parse_filter(|_| true)
    }

    /// Parse the input, materializing only what `filter` keeps.
    ///
    /// `filter` sees the literal of every declaration name and argument
    /// token. Parentheses carry no literal and are never passed to it, so a
    /// filter that counts its calls counts only names and arguments.
    /// Rejecting a name drops that whole declaration, children
    /// included; rejecting an argument drops just that token. Dropped tokens
    /// are still consumed, so lexer position and depth stay exact and the
    /// input is read in one pass either way.
    pub fn parse_filter<F>(&mut self, mut filter: F) -> Result<DeclTree>
    where
        F: FnMut(&str) -> bool,
    {
        let mut tree = DeclTree::default();
        // `None` is the implicit top-level group.
        let mut current: Option<DeclId> = None;
        // Depth of a rejected declaration whose tokens are being discarded.
        let mut skip_depth: Option<usize> = None;
        let mut awaiting_name = false;

        let last = loop {
            let kind = self.lexer.next_token().kind;
            if self.lexer.err().is_some() || kind.is_terminal() {
                break kind;
            }
            let depth = self.lexer.parens();

            if let Some(skip) = skip_depth {
                if depth < skip {
                    trace!(depth, "resuming after rejected declaration");
                    skip_depth = None;
                }
                continue;
            }

            if awaiting_name && kind != TokenKind::Identifier {
                let location = self.lexer.location();
                return Err(match kind {
                    TokenKind::LParen => DsnError::AdjacentOpenParens { location },
                    found => DsnError::ExpectedIdentifier { found, location },
                });
            }

            let literal = self.lexer.literal();
            if kind.has_literal() && !filter(literal) {
                if awaiting_name {
                    trace!(name = literal, depth, "declaration rejected");
                    awaiting_name = false;
                    skip_depth = Some(depth);
                }
                continue;
            }

            if awaiting_name {
                awaiting_name = false;
                let id = tree.push(current, literal.to_owned(), depth);
                if literal == STRING_QUOTE_DIRECTIVE {
                    tree.set_quote(id, self.lexer.string_quote());
                }
                current = Some(id);
                continue;
            }

            match kind {
                TokenKind::LParen => awaiting_name = true,
                TokenKind::RParen => current = current.and_then(|id| tree.parent_of(id)),
                _ => match current {
                    Some(id) => {
                        let mut arg = TokenLit::new(kind, literal);
                        if kind == TokenKind::Identifier && literal == STRING_QUOTE_DIRECTIVE {
                            arg = arg.with_quote(self.lexer.string_quote());
                        }
                        tree.push_arg(id, arg);
                    }
                    None => debug!(token = literal, "dropping token outside any declaration"),
                },
            }
        };

        let location = self.lexer.location();
        if let Some(err) = self.lexer.err() {
            return Err(DsnError::lexer(location, err.clone()));
        }
        if last == TokenKind::Illegal {
            return Err(DsnError::IllegalToken { location });
        }
        // Depth 1 is the implicit top-level group left open; deeper is unclosed.
        let open = self.lexer.parens();
        if open > 1 {
            return Err(DsnError::UnclosedParens {
                location,
                depth: open,
            });
        }

        debug!(
            declarations = tree.len(),
            top_level = tree.roots().len(),
            bytes = self.lexer.pos(),
            "parse complete"
        );
        Ok(tree)
    }
}
