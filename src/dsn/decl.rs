//! Declaration tree produced by the parser.
//!
//! Declarations live in an arena ([`DeclTree`]) and refer to each other by
//! [`DeclId`]. A parent link is only an index, so the tree has a single owner
//! and lookups in both directions are O(1). Callers navigate through the
//! borrowed [`Decl`] view.

use std::fmt;

use super::lexer::TokenKind;
use crate::STRING_QUOTE_DIRECTIVE;

/// Index of a declaration inside its [`DeclTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub usize);

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// An argument token of a declaration: its kind and exact source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenLit {
    kind: TokenKind,
    literal: String,
    /// Delimiter adopted when this token is a `string_quote` directive
    quote: Option<char>,
}

impl TokenLit {
    /// Create a token literal.
    pub fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
            quote: None,
        }
    }

    pub(crate) fn with_quote(mut self, quote: char) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Quote character adopted here, for a `string_quote` argument.
    pub fn string_quote(&self) -> Option<char> {
        self.quote
    }

    /// The token kind.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The source text, quotes included for strings.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Integer value, for `Integer` tokens.
    pub fn as_i64(&self) -> Option<i64> {
        match self.kind {
            TokenKind::Integer => self.literal.parse().ok(),
            _ => None,
        }
    }

    /// Numeric value, for `Integer` and `Float` tokens.
    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Integer | TokenKind::Float => self.literal.parse().ok(),
            _ => None,
        }
    }

    /// Text without delimiters for strings, the literal itself otherwise.
    pub fn unquoted(&self) -> &str {
        if self.kind != TokenKind::String {
            return &self.literal;
        }
        let mut chars = self.literal.chars();
        chars.next();
        chars.next_back();
        chars.as_str()
    }
}

impl fmt::Display for TokenLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)?;
        match self.quote {
            Some(quote) => write!(f, " {}", quote),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DeclNode {
    name: String,
    depth: usize,
    parent: Option<DeclId>,
    args: Vec<TokenLit>,
    children: Vec<DeclId>,
    /// Delimiter adopted by a `string_quote` declaration
    quote: Option<char>,
}

/// A parsed DSN document: every kept declaration, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclTree {
    nodes: Vec<DeclNode>,
    roots: Vec<DeclId>,
}

impl DeclTree {
    /// Number of declarations at any depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no declaration was kept.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level declarations in source order.
    pub fn roots(&self) -> impl ExactSizeIterator<Item = Decl<'_>> + '_ {
        self.roots.iter().map(move |&id| Decl { tree: self, id })
    }

    /// Look up a declaration by id.
    pub fn get(&self, id: DeclId) -> Option<Decl<'_>> {
        (id.0 < self.nodes.len()).then_some(Decl { tree: self, id })
    }

    /// Depth-first, pre-order traversal of all declarations.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            tree: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// First declaration named `name`, in source order.
    pub fn find(&self, name: &str) -> Option<Decl<'_>> {
        self.walk().find(|decl| decl.name() == name)
    }

    pub(crate) fn push(&mut self, parent: Option<DeclId>, name: String, depth: usize) -> DeclId {
        let id = DeclId(self.nodes.len());
        self.nodes.push(DeclNode {
            name,
            depth,
            parent,
            args: Vec::new(),
            children: Vec::new(),
            quote: None,
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub(crate) fn push_arg(&mut self, id: DeclId, arg: TokenLit) {
        self.nodes[id.0].args.push(arg);
    }

    pub(crate) fn set_quote(&mut self, id: DeclId, quote: char) {
        self.nodes[id.0].quote = Some(quote);
    }

    pub(crate) fn parent_of(&self, id: DeclId) -> Option<DeclId> {
        self.nodes[id.0].parent
    }

    fn node(&self, id: DeclId) -> &DeclNode {
        &self.nodes[id.0]
    }
}

impl fmt::Display for DeclTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for decl in self.roots() {
            write!(f, "{}", decl)?;
        }
        Ok(())
    }
}

/// A borrowed view of one declaration.
#[derive(Clone, Copy)]
pub struct Decl<'a> {
    tree: &'a DeclTree,
    id: DeclId,
}

impl<'a> Decl<'a> {
    /// Arena index of this declaration.
    pub fn id(&self) -> DeclId {
        self.id
    }

    /// The declaration's name.
    pub fn name(&self) -> &'a str {
        &self.tree.node(self.id).name
    }

    /// Parenthesis depth the declaration was opened at. Top level is 1.
    pub fn depth(&self) -> usize {
        self.tree.node(self.id).depth
    }

    /// The tokens after the declaration's name.
    pub fn args(&self) -> &'a [TokenLit] {
        &self.tree.node(self.id).args
    }

    /// First argument, if any.
    pub fn first_arg(&self) -> Option<&'a TokenLit> {
        self.args().first()
    }

    /// Declarations nested directly within this one.
    pub fn children(&self) -> impl ExactSizeIterator<Item = Decl<'a>> + 'a {
        let tree = self.tree;
        tree.node(self.id)
            .children
            .iter()
            .map(move |&id| Decl { tree, id })
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<Decl<'a>> {
        self.children().find(|child| child.name() == name)
    }

    /// The enclosing declaration; `None` at top level.
    pub fn parent(&self) -> Option<Decl<'a>> {
        self.tree
            .parent_of(self.id)
            .map(|id| Decl { tree: self.tree, id })
    }

    /// Quote character adopted here, for `string_quote` declarations.
    pub fn string_quote(&self) -> Option<char> {
        self.tree.node(self.id).quote
    }
}

impl fmt::Debug for Decl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decl")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("depth", &self.depth())
            .field("args", &self.args())
            .field("children", &self.children().len())
            .finish()
    }
}

/// Indented S-expression text, one declaration per line.
impl fmt::Display for Decl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = " ".repeat(self.depth());
        write!(f, "{}({}", indent, self.name())?;
        if let Some(quote) = self.string_quote() {
            debug_assert_eq!(self.name(), STRING_QUOTE_DIRECTIVE);
            write!(f, " {}", quote)?;
        }
        for arg in self.args() {
            write!(f, " {}", arg)?;
        }
        if self.children().len() == 0 {
            return writeln!(f, ")");
        }
        writeln!(f)?;
        for child in self.children() {
            write!(f, "{}", child)?;
        }
        writeln!(f, "{})", indent)
    }
}

/// Iterator returned by [`DeclTree::walk`].
pub struct Walk<'a> {
    tree: &'a DeclTree,
    stack: Vec<DeclId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Decl<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(Decl {
            tree: self.tree,
            id,
        })
    }
}
