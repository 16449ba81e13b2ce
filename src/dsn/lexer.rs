//! Streaming lexer (tokenizer) for DSN text.

use std::fmt;
use std::io::{BufRead, BufReader, Read};

use tracing::debug;

use crate::error::{DsnError, LexError, Location, Result};
use crate::{DEFAULT_STRING_QUOTE, STRING_QUOTE_DIRECTIVE};

/// Token types in DSN text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input, terminal
    EndOfInput,
    /// Unrecognized character or failed scan, terminal
    Illegal,
    /// Open parenthesis '('
    LParen,
    /// Close parenthesis ')'
    RParen,
    /// An identifier such as `pcb`, `F.Cu` or `U7`
    Identifier,
    /// An integer such as `42` or `-3`
    Integer,
    /// A quoted string, quotes included
    String,
    /// A decimal number such as `-12.5`
    Float,
}

impl TokenKind {
    /// Whether tokens of this kind carry literal text.
    pub fn has_literal(&self) -> bool {
        matches!(
            self,
            Self::Identifier | Self::Integer | Self::String | Self::Float
        )
    }

    /// Whether the lexer stops producing new tokens after this kind.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EndOfInput | Self::Illegal)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EndOfInput => "EOF",
            Self::Illegal => "ILLEGAL",
            Self::LParen => "LPAREN",
            Self::RParen => "RPAREN",
            Self::Identifier => "IDENTIFIER",
            Self::Integer => "INTEGER",
            Self::String => "STRING",
            Self::Float => "FLOAT",
        };
        f.write_str(name)
    }
}

/// A token produced by the lexer.
///
/// `literal` borrows the lexer's scratch buffer, so it lives only until the
/// next call to [`Lexer::next_token`]. Copy it out to keep it longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// The kind of token
    pub kind: TokenKind,
    /// Byte offset of the token's first character
    pub start: usize,
    /// Source text for identifiers, strings and numbers; empty otherwise
    pub literal: &'a str,
}

enum State {
    Running,
    Ended,
    Failed(LexError),
}

/// Lexer for tokenizing DSN input from any reader.
pub struct Lexer<R> {
    input: BufReader<R>,
    source: Option<String>,
    /// Lookahead character; `None` once the stream has ended or failed
    ch: Option<char>,
    quote: char,
    state: State,
    buf: String,

    line: usize,
    col: usize,
    pos: usize,
    parens: usize,
}

impl<R: Read> Lexer<R> {
    /// Create a new lexer reading from `reader`.
    ///
    /// The first character is read immediately. A failure there is recorded
    /// and reported by the first call to [`Lexer::next_token`].
    pub fn new(reader: R) -> Self {
        let mut lexer = Self {
            input: BufReader::new(reader),
            source: None,
            ch: None,
            quote: DEFAULT_STRING_QUOTE,
            state: State::Running,
            buf: String::with_capacity(1024),
            line: 1,
            col: 0,
            pos: 0,
            parens: 0,
        };
        lexer.read_char();
        lexer
    }

    /// Create a new lexer whose diagnostics name `source` (usually a file name).
    pub fn with_source(source: impl Into<String>, reader: R) -> Self {
        let mut lexer = Self::new(reader);
        lexer.source = Some(source.into());
        lexer
    }

    /// Discard all state and start lexing `reader`.
    ///
    /// The scratch buffer's allocation is kept. Returns the error from the
    /// priming read, if any; empty input is not an error.
    pub fn reset(&mut self, reader: R) -> Result<()> {
        self.input = BufReader::new(reader);
        self.source = None;
        self.ch = None;
        self.quote = DEFAULT_STRING_QUOTE;
        self.state = State::Running;
        self.buf.clear();
        self.line = 1;
        self.col = 0;
        self.pos = 0;
        self.parens = 0;
        self.read_char();
        match self.err() {
            Some(err) => Err(DsnError::lexer(self.location(), err.clone())),
            None => Ok(()),
        }
    }

    /// Like [`Lexer::reset`], naming the new input `source` in diagnostics.
    pub fn reset_with_source(&mut self, source: impl Into<String>, reader: R) -> Result<()> {
        let result = self.reset(reader);
        self.source = Some(source.into());
        result.map_err(|err| match err {
            DsnError::Lexer { source, .. } => DsnError::lexer(self.location(), source),
            other => other,
        })
    }

    /// Scan the next token.
    ///
    /// Once the input has ended this keeps returning
    /// [`TokenKind::EndOfInput`]; once a fatal error was hit it keeps
    /// returning [`TokenKind::Illegal`]. Neither touches the reader again.
    pub fn next_token(&mut self) -> Token<'_> {
        self.skip_whitespace();
        self.buf.clear();
        let start = self.pos - self.ch.map_or(0, char::len_utf8);

        let ch = match (&self.state, self.ch) {
            (State::Running, Some(ch)) => ch,
            (State::Failed(_), _) => return Token::bare(TokenKind::Illegal, start),
            _ => return Token::bare(TokenKind::EndOfInput, start),
        };

        let kind = if ch == self.quote {
            self.read_string()
        } else {
            match ch {
                '(' => {
                    self.read_char();
                    self.parens += 1;
                    TokenKind::LParen
                }
                ')' => {
                    self.read_char();
                    if self.parens == 0 {
                        self.fail(LexError::UnbalancedParens);
                    } else {
                        self.parens -= 1;
                    }
                    TokenKind::RParen
                }
                c if c.is_ascii_digit() || c == '-' => self.read_number(),
                c if is_ident_char(c) => self.read_identifier(),
                _ => TokenKind::Illegal,
            }
        };

        Token {
            kind,
            start,
            literal: &self.buf,
        }
    }

    fn read_string(&mut self) -> TokenKind {
        let quote = self.quote;
        self.buf.push(quote);
        self.read_char();
        loop {
            match self.ch {
                None => {
                    self.fail(LexError::UnterminatedString);
                    return TokenKind::Illegal;
                }
                Some('\\') => {
                    self.fail(LexError::Escape);
                    return TokenKind::Illegal;
                }
                Some('\n') => {
                    self.fail(LexError::NewlineInString);
                    return TokenKind::Illegal;
                }
                Some(c) => {
                    self.buf.push(c);
                    self.read_char();
                    if c == quote {
                        return TokenKind::String;
                    }
                }
            }
        }
    }

    fn read_number(&mut self) -> TokenKind {
        let mut seen_dot = false;
        if self.ch == Some('-') {
            self.buf.push('-');
            self.read_char();
        }
        while let Some(c) = self.ch {
            if c == '.' && !seen_dot {
                seen_dot = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            self.buf.push(c);
            self.read_char();
        }
        if seen_dot {
            TokenKind::Float
        } else {
            TokenKind::Integer
        }
    }

    fn read_identifier(&mut self) -> TokenKind {
        while let Some(c) = self.ch.filter(|&c| is_ident_char(c) || c.is_ascii_digit()) {
            self.buf.push(c);
            self.read_char();
        }
        if self.buf == STRING_QUOTE_DIRECTIVE {
            self.skip_whitespace();
            if let Some(quote) = self.ch {
                debug!(%quote, line = self.line, "string quote changed");
                self.quote = quote;
                self.read_char();
            }
        }
        TokenKind::Identifier
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, Some(' ' | '\t' | '\r' | '\n')) {
            self.read_char();
        }
    }

    fn read_char(&mut self) {
        if !matches!(self.state, State::Running) {
            self.ch = None;
            return;
        }
        match read_utf8_char(&mut self.input) {
            Ok(Some((ch, width))) => {
                if ch == '\n' {
                    self.line += 1;
                    self.col = 0;
                } else {
                    self.col += 1;
                }
                self.pos += width;
                self.ch = Some(ch);
            }
            Ok(None) => {
                self.state = State::Ended;
                self.ch = None;
            }
            Err(err) => self.fail(err),
        }
    }

    /// Record a fatal error. The first failure wins.
    fn fail(&mut self, err: LexError) {
        if !matches!(self.state, State::Failed(_)) {
            self.state = State::Failed(err);
        }
        self.ch = None;
    }
}

impl<R> Lexer<R> {
    /// The literal of the most recent token.
    pub fn literal(&self) -> &str {
        &self.buf
    }

    /// The fatal error that stopped the lexer. A clean end of input is not an error.
    pub fn err(&self) -> Option<&LexError> {
        match &self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the lexer reached a terminal state.
    pub fn is_done(&self) -> bool {
        !matches!(self.state, State::Running)
    }

    /// Current line number and column (UTF-8 code points) of the lookahead.
    pub fn line_col(&self) -> (usize, usize) {
        (self.line, self.col)
    }

    /// Number of bytes consumed from the reader.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Parenthesis depth at the current position.
    pub fn parens(&self) -> usize {
        self.parens
    }

    /// Name of the input used in diagnostics.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The character currently delimiting strings.
    pub fn string_quote(&self) -> char {
        self.quote
    }

    /// Change the string delimiter, as the `string_quote` directive does.
    pub fn set_string_quote(&mut self, quote: char) {
        self.quote = quote;
    }

    /// Current position for diagnostics.
    pub fn location(&self) -> Location {
        Location {
            source: self.source.clone(),
            line: self.line,
            column: self.col,
        }
    }
}

impl Token<'static> {
    fn bare(kind: TokenKind, start: usize) -> Self {
        Self {
            kind,
            start,
            literal: "",
        }
    }
}

/// Characters allowed in identifiers besides digits.
fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphabetic()
        || matches!(ch, '_' | '-' | '@' | '/' | '.' | '+' | ':' | '[' | ']' | ',')
}

/// Read one UTF-8 encoded character, returning it with its width in bytes.
fn read_utf8_char<R: BufRead>(input: &mut R) -> std::result::Result<Option<(char, usize)>, LexError> {
    let mut bytes = [0u8; 4];
    let (width, have) = {
        let available = input.fill_buf()?;
        let Some(&first) = available.first() else {
            return Ok(None);
        };
        let width = match first {
            0x00..=0x7F => 1,
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Err(LexError::InvalidUtf8),
        };
        let have = width.min(available.len());
        bytes[..have].copy_from_slice(&available[..have]);
        (width, have)
    };
    input.consume(have);
    if have < width {
        input.read_exact(&mut bytes[have..width]).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                LexError::InvalidUtf8
            } else {
                LexError::from(err)
            }
        })?;
    }
    let ch = std::str::from_utf8(&bytes[..width])
        .ok()
        .and_then(|s| s.chars().next())
        .ok_or(LexError::InvalidUtf8)?;
    Ok(Some((ch, width)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(input: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(input.as_bytes());
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind.is_terminal();
            out.push((tok.kind, tok.literal.to_string()));
            if done {
                return out;
            }
        }
    }

    #[test]
    fn test_lexer_basic() {
        let toks = lex_all("(pcb board.dsn (unit um))");
        let kinds: Vec<_> = toks.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::RParen,
                TokenKind::EndOfInput,
            ]
        );
        assert_eq!(toks[1].1, "pcb");
        assert_eq!(toks[2].1, "board.dsn");
        assert_eq!(toks[0].1, "");
    }

    #[test]
    fn test_string_keeps_quotes() {
        let input = r#""hello word's""#;
        let mut lexer = Lexer::new(input.as_bytes());
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::String);
        assert_eq!(tok.literal, input);
        assert_eq!(lexer.next_token().kind, TokenKind::EndOfInput);
        assert!(lexer.err().is_none());
    }

    #[test]
    fn test_string_errors() {
        let mut lexer = Lexer::new("\"line one\nline two\"".as_bytes());
        assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
        assert_eq!(lexer.err(), Some(&LexError::NewlineInString));

        let mut lexer = Lexer::new(r#""C:\path""#.as_bytes());
        assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
        assert_eq!(lexer.err(), Some(&LexError::Escape));
        assert_eq!(lexer.err().map(|e| e.to_string()).as_deref(), Some("does not support escaping"));

        let mut lexer = Lexer::new("\"never closed".as_bytes());
        assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
        assert_eq!(lexer.err(), Some(&LexError::UnterminatedString));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex_all("-12.5 42 1.2.3"),
            vec![
                (TokenKind::Float, "-12.5".to_string()),
                (TokenKind::Integer, "42".to_string()),
                (TokenKind::Float, "1.2".to_string()),
                (TokenKind::Identifier, ".3".to_string()),
                (TokenKind::EndOfInput, String::new()),
            ]
        );
    }

    #[test]
    fn test_identifier_charset() {
        let toks = lex_all("Package_SO:SOIC-8 @net/a+b [0] x,y");
        let lits: Vec<_> = toks.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(lits, vec!["Package_SO:SOIC-8", "@net/a+b", "[0]", "x,y", ""]);
        assert!(toks[..4].iter().all(|(k, _)| *k == TokenKind::Identifier));
    }

    #[test]
    fn test_illegal_character() {
        let mut lexer = Lexer::new("(pcb #)".as_bytes());
        assert_eq!(lexer.next_token().kind, TokenKind::LParen);
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
        assert!(lexer.err().is_none());
    }

    #[test]
    fn test_string_quote_directive() {
        let input = "(parser (string_quote ') (host_cad \"KiCad's\")) 'quoted \"text\"'";
        let mut lexer = Lexer::new(input.as_bytes());
        let mut strings = Vec::new();
        let mut last = TokenKind::EndOfInput;
        for _ in 0..20 {
            let tok = lexer.next_token();
            last = tok.kind;
            if tok.kind == TokenKind::String {
                strings.push(tok.literal.to_string());
            }
            if tok.kind.is_terminal() {
                break;
            }
        }
        assert_eq!(lexer.string_quote(), '\'');
        // The old quote cannot start a token any more.
        assert_eq!(last, TokenKind::Illegal);
        assert!(strings.is_empty());
    }

    #[test]
    fn test_string_quote_switches_delimiter() {
        let input = "(string_quote ') 'it is \"fine\"'";
        let toks = lex_all(input);
        assert_eq!(toks[1], (TokenKind::Identifier, "string_quote".to_string()));
        assert_eq!(toks[2].0, TokenKind::RParen);
        assert_eq!(toks[3], (TokenKind::String, "'it is \"fine\"'".to_string()));
    }

    #[test]
    fn test_unbalanced_close_is_sticky() {
        let mut lexer = Lexer::new("a) b c".as_bytes());
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().kind, TokenKind::RParen);
        assert_eq!(lexer.err(), Some(&LexError::UnbalancedParens));
        let pos = lexer.pos();
        for _ in 0..3 {
            assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
        }
        assert_eq!(lexer.pos(), pos);
    }

    #[test]
    fn test_end_is_sticky() {
        let mut lexer = Lexer::new("x".as_bytes());
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        for _ in 0..3 {
            assert_eq!(lexer.next_token().kind, TokenKind::EndOfInput);
        }
        assert!(lexer.err().is_none());
        assert!(lexer.is_done());
    }

    #[test]
    fn test_position_tracking() {
        let mut lexer = Lexer::new("(a\n  \"µm\" b)".as_bytes());
        assert_eq!(lexer.next_token().start, 0);
        assert_eq!(lexer.next_token().start, 1);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::String);
        assert_eq!(tok.start, 5);
        assert_eq!(lexer.parens(), 1);

        let tok = lexer.next_token();
        assert_eq!(tok.literal, "b");
        // "µ" is two bytes but one column.
        assert_eq!(tok.start, 11);
        assert_eq!(lexer.line_col(), (2, 9));

        assert_eq!(lexer.next_token().kind, TokenKind::RParen);
        assert_eq!(lexer.parens(), 0);
        assert_eq!(lexer.pos(), 13);
    }

    #[test]
    fn test_invalid_utf8() {
        let input: &[u8] = &[b'(', b'a', 0xFF, b')'];
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().kind, TokenKind::LParen);
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
        assert_eq!(lexer.err(), Some(&LexError::InvalidUtf8));
    }

    /// Hands out one byte per `read`, so every multi-byte character
    /// straddles a buffer refill.
    struct ByteAtATime<'a>(&'a [u8]);

    impl Read for ByteAtATime<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match (self.0.split_first(), buf.first_mut()) {
                (Some((&byte, rest)), Some(slot)) => {
                    *slot = byte;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_multibyte_across_refills() {
        let input = "(unit \"µm\")\n(net \"Ω€𝄞\" 1.5)";
        let mut whole = Lexer::new(input.as_bytes());
        let mut split = Lexer::new(ByteAtATime(input.as_bytes()));
        let mut literals = Vec::new();
        loop {
            let expected = whole.next_token();
            let (kind, start, literal) = (expected.kind, expected.start, expected.literal.to_string());
            let tok = split.next_token();
            assert_eq!((tok.kind, tok.start, tok.literal), (kind, start, literal.as_str()));
            if kind.is_terminal() {
                break;
            }
            literals.push(literal);
        }
        assert_eq!(split.err(), None);
        assert!(literals.contains(&"\"µm\"".to_string()));
        assert!(literals.contains(&"\"Ω€𝄞\"".to_string()));
        assert_eq!(split.pos(), input.len());
        assert_eq!(split.line_col(), whole.line_col());
    }

    #[test]
    fn test_truncated_multibyte_across_refills() {
        let input: &[u8] = &[b'(', b'a', b' ', b'"', 0xE2, 0x82];
        let mut lexer = Lexer::new(ByteAtATime(input));
        assert_eq!(lexer.next_token().kind, TokenKind::LParen);
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
        assert_eq!(lexer.err(), Some(&LexError::InvalidUtf8));
    }

    #[test]
    fn test_read_failure_is_sticky() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "boom"))
            }
        }

        let mut lexer = Lexer::new(Broken);
        assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
        let err = lexer.err().cloned();
        assert!(matches!(&err, Some(LexError::Io(io)) if io.kind() == std::io::ErrorKind::BrokenPipe));
        assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
        assert_eq!(lexer.err().cloned(), err);
    }

    #[test]
    fn test_reset_reuses_lexer() {
        let mut lexer = Lexer::with_source("first.dsn", "(a (string_quote ') ".as_bytes());
        while !lexer.next_token().kind.is_terminal() {}
        assert_eq!(lexer.string_quote(), '\'');

        lexer.reset_with_source("second.dsn", "(b)".as_bytes()).unwrap();
        assert_eq!(lexer.source(), Some("second.dsn"));
        assert_eq!(lexer.string_quote(), '"');
        assert_eq!(lexer.parens(), 0);
        assert_eq!(lexer.line_col(), (1, 1));
        assert_eq!(lexer.next_token().kind, TokenKind::LParen);
        assert_eq!(lexer.next_token().literal, "b");

        lexer.reset("".as_bytes()).unwrap();
        assert_eq!(lexer.next_token().kind, TokenKind::EndOfInput);
    }
}
