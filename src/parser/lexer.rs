//! Scanner (tokenizer) for source text
//!
//! The [`Scanner`] is pulled by the parser one token at a time: [`Scanner::next_token`]
//! returns the kind of the next token, and the parser reads the start offset and
//! matched text from the scanner afterwards. Nothing is buffered, so the parser can
//! rewind by restoring a saved [`Scanner::pos`].
//!
//! # Token classes
//!
//! - Numbers: unsigned decimal digit runs
//! - Identifiers: classified by the case of the first character
//!   ([`TokenKind::TypeIdent`] for uppercase, [`TokenKind::Ident`] otherwise)
//! - Keywords, including the unsupported Java primitives so that the parser can
//!   report them precisely
//! - Operators: longest match over [`OPERATORS`]

use super::ast::{DocId, Loc};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Every operator and punctuation token of the language
pub const OPERATORS: &[&str] = &[
    "(", ")", "{", "}", "[", "]", ";", ",", ".", "=", "==", "!=", "<", "<=", ">", ">=", "+", "-",
    "*", "/", "%", "!", "~", "&", "|", "^", "&&", "||", "<<", ">>", ">>>", "++", "--", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", ">>>=",
];

/// All non-empty prefixes of [`OPERATORS`]
static OPERATOR_PREFIXES: LazyLock<FxHashSet<&'static str>> = LazyLock::new(|| {
    let mut prefixes = FxHashSet::default();
    for op in OPERATORS {
        for end in 1..=op.len() {
            prefixes.insert(&op[..end]);
        }
    }
    prefixes
});

/// Reserved words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    New,
    This,
    Null,
    True,
    False,
    Int,
    Boolean,
    Void,
    If,
    Else,
    While,
    For,
    Return,
    Assert,
    Public,
    Private,
    Protected,
    Static,
    Final,
    // Java primitives the language does not support
    Byte,
    Short,
    Long,
    Float,
    Double,
    Char,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        Some(match word {
            "class" => Keyword::Class,
            "new" => Keyword::New,
            "this" => Keyword::This,
            "null" => Keyword::Null,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "int" => Keyword::Int,
            "boolean" => Keyword::Boolean,
            "void" => Keyword::Void,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "return" => Keyword::Return,
            "assert" => Keyword::Assert,
            "public" => Keyword::Public,
            "private" => Keyword::Private,
            "protected" => Keyword::Protected,
            "static" => Keyword::Static,
            "final" => Keyword::Final,
            "byte" => Keyword::Byte,
            "short" => Keyword::Short,
            "long" => Keyword::Long,
            "float" => Keyword::Float,
            "double" => Keyword::Double,
            "char" => Keyword::Char,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::New => "new",
            Keyword::This => "this",
            Keyword::Null => "null",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Int => "int",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::Return => "return",
            Keyword::Assert => "assert",
            Keyword::Public => "public",
            Keyword::Private => "private",
            Keyword::Protected => "protected",
            Keyword::Static => "static",
            Keyword::Final => "final",
            Keyword::Byte => "byte",
            Keyword::Short => "short",
            Keyword::Long => "long",
            Keyword::Float => "float",
            Keyword::Double => "double",
            Keyword::Char => "char",
        }
    }

    /// Java primitive types that are rejected with a hint to use `int`
    pub fn is_unsupported_primitive(self) -> bool {
        matches!(
            self,
            Keyword::Byte
                | Keyword::Short
                | Keyword::Long
                | Keyword::Float
                | Keyword::Double
                | Keyword::Char
        )
    }
}

/// Kind of a scanned token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    /// Identifier starting with a lowercase letter or underscore
    Ident,
    /// Identifier starting with an uppercase letter
    TypeIdent,
    Keyword(Keyword),
    /// Operator or punctuation, one of [`OPERATORS`]
    Op(&'static str),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number => write!(f, "number"),
            TokenKind::Ident => write!(f, "identifier"),
            TokenKind::TypeIdent => write!(f, "class name"),
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenKind::Op(op) => write!(f, "'{}'", op),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Lexical error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub loc: Loc,
}

/// On-demand scanner over a single document
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    doc: DocId,
    text: &'a str,
    pos: usize,
    token_start: usize,
    value: (usize, usize),
}

impl<'a> Scanner<'a> {
    pub fn new(doc: DocId, text: &'a str) -> Self {
        Self::at(doc, text, 0)
    }

    /// Scanner resuming at byte offset `pos`
    pub fn at(doc: DocId, text: &'a str, pos: usize) -> Self {
        Scanner {
            doc,
            text,
            pos: pos.min(text.len()),
            token_start: pos.min(text.len()),
            value: (0, 0),
        }
    }

    /// Offset just past the most recently returned token
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Start offset of the most recently returned token
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Matched text of the most recent number or identifier token
    pub fn value(&self) -> &'a str {
        &self.text[self.value.0..self.value.1]
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match (self.peek_byte(0), self.peek_byte(1)) {
                (Some(b' ' | b'\t' | b'\n' | b'\r'), _) => self.pos += 1,
                (Some(b'/'), Some(b'/')) => {
                    while !matches!(self.peek_byte(0), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match (self.peek_byte(0), self.peek_byte(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => {
                                return Err(LexError {
                                    message: "unterminated comment: '*/' expected".to_string(),
                                    loc: Loc::new(self.doc, start, start + 2),
                                });
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Scan the next token. After the end of the text, keeps returning [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Result<TokenKind, LexError> {
        self.skip_trivia()?;
        self.token_start = self.pos;

        let Some(c) = self.text[self.pos..].chars().next() else {
            return Ok(TokenKind::Eof);
        };

        if c.is_ascii_digit() {
            while self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
            self.value = (self.token_start, self.pos);
            return Ok(TokenKind::Number);
        }

        if c.is_ascii_alphabetic() || c == '_' {
            while self
                .peek_byte(0)
                .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
            {
                self.pos += 1;
            }
            self.value = (self.token_start, self.pos);
            let word = self.value();
            if let Some(keyword) = Keyword::from_word(word) {
                return Ok(TokenKind::Keyword(keyword));
            }
            return Ok(if c.is_ascii_uppercase() {
                TokenKind::TypeIdent
            } else {
                TokenKind::Ident
            });
        }

        self.scan_operator(c)
    }

    fn scan_operator(&mut self, first: char) -> Result<TokenKind, LexError> {
        let start = self.token_start;
        let mut end = start;
        // Extend greedily while the candidate is still a prefix of some operator
        while end < self.text.len()
            && self.text.is_char_boundary(end + 1)
            && OPERATOR_PREFIXES.contains(&self.text[start..end + 1])
        {
            end += 1;
        }
        // Back off to the longest candidate that is itself an operator
        while end > start {
            let candidate = &self.text[start..end];
            if let Some(&op) = OPERATORS.iter().find(|op| **op == candidate) {
                self.pos = end;
                return Ok(TokenKind::Op(op));
            }
            end -= 1;
        }
        Err(LexError {
            message: format!("unexpected character '{}'", first),
            loc: Loc::new(self.doc, start, start + first.len_utf8()),
        })
    }

    /// Scan the whole text; used for diagnostics and the `tokenize` command
    pub fn tokenize(mut self) -> Result<Vec<(TokenKind, Loc)>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let kind = self.next_token()?;
            tokens.push((kind, Loc::new(self.doc, self.token_start, self.pos)));
            if kind == TokenKind::Eof {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Scanner::new(DocId(0), text)
            .tokenize()
            .expect("tokenize failed")
            .into_iter()
            .map(|(kind, _)| kind)
            .collect()
    }

    #[test]
    fn test_identifier_classes() {
        assert_eq!(
            kinds("Point p new _tmp"),
            vec![
                TokenKind::TypeIdent,
                TokenKind::Ident,
                TokenKind::Keyword(Keyword::New),
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_longest_match() {
        assert_eq!(
            kinds("a>>>=b>>c>=d"),
            vec![
                TokenKind::Ident,
                TokenKind::Op(">>>="),
                TokenKind::Ident,
                TokenKind::Op(">>"),
                TokenKind::Ident,
                TokenKind::Op(">="),
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("i+++j"),
            vec![
                TokenKind::Ident,
                TokenKind::Op("++"),
                TokenKind::Op("+"),
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_number_value_and_start() {
        let mut scanner = Scanner::new(DocId(0), "  123 x");
        assert_eq!(scanner.next_token(), Ok(TokenKind::Number));
        assert_eq!(scanner.token_start(), 2);
        assert_eq!(scanner.value(), "123");
        assert_eq!(scanner.pos(), 5);
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("// line\n/* block\n comment */ 1"),
            vec![TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Scanner::new(DocId(0), "1 /* open")
            .tokenize()
            .expect_err("should fail");
        assert_eq!(err.loc, Loc::new(DocId(0), 2, 4));
    }

    #[test]
    fn test_bad_character() {
        let mut scanner = Scanner::new(DocId(0), "x # y");
        assert_eq!(scanner.next_token(), Ok(TokenKind::Ident));
        let err = scanner.next_token().expect_err("should fail");
        assert_eq!(err.loc, Loc::new(DocId(0), 2, 3));
        assert!(err.message.contains('#'));
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut scanner = Scanner::new(DocId(0), "");
        assert_eq!(scanner.next_token(), Ok(TokenKind::Eof));
        assert_eq!(scanner.next_token(), Ok(TokenKind::Eof));
    }
}
