//! Go lexer.
//!
//! Produces the token stream the declaration parser works on, including the
//! semicolons Go inserts automatically at line ends. Comments are dropped.

use std::fmt;

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Operators and punctuation, longest first.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", "(", ")", "[", "]", "{", "}", ",", ";", ".", ":", "~",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Keyword,
    Int,
    Float,
    Imaginary,
    Rune,
    /// Interpreted or raw string; the text keeps its quotes.
    String,
    Operator,
    /// Explicit or inserted `;`.
    Semicolon,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    pub fn is_op(&self, op: &str) -> bool {
        self.is(TokenKind::Operator, op)
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is(TokenKind::Keyword, keyword)
    }

    /// Whether a newline after this token ends the statement.
    fn ends_statement(&self) -> bool {
        match self.kind {
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imaginary
            | TokenKind::Rune
            | TokenKind::String => true,
            TokenKind::Keyword => matches!(
                self.text.as_str(),
                "break" | "continue" | "fallthrough" | "return"
            ),
            TokenKind::Operator => matches!(self.text.as_str(), "++" | "--" | ")" | "]" | "}"),
            TokenKind::Semicolon | TokenKind::Eof => false,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of file"),
            TokenKind::Semicolon if self.text == "\n" => f.write_str("newline"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// A lexical error with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole input; the last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.peek(0) {
            match c {
                '\n' => {
                    self.newline();
                    self.bump();
                }
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '/' if self.peek(1) == Some('/') => self.line_comment(),
                '/' if self.peek(1) == Some('*') => self.block_comment()?,
                '"' => self.interpreted_string()?,
                '`' => self.raw_string()?,
                '\'' => self.rune()?,
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek(1).is_some_and(|d| d.is_ascii_digit()) => self.number(),
                c if c == '_' || c.is_alphabetic() => self.identifier(),
                _ => self.operator()?,
            }
        }
        self.newline();
        let (line, column) = (self.line, self.column);
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            line,
            column,
        });
        Ok(self.tokens)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> LexError {
        LexError {
            line,
            column,
            message: message.into(),
        }
    }

    fn push(&mut self, kind: TokenKind, text: String, line: usize, column: usize) {
        self.tokens.push(Token {
            kind,
            text,
            line,
            column,
        });
    }

    /// Insert a semicolon if the line's last token ends a statement.
    fn newline(&mut self) {
        if self.tokens.last().is_some_and(Token::ends_statement) {
            let (line, column) = (self.line, self.column);
            self.push(TokenKind::Semicolon, "\n".to_string(), line, column);
        }
    }

    fn line_comment(&mut self) {
        while self.peek(0).is_some_and(|c| c != '\n') {
            self.bump();
        }
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        self.bump();
        let mut spans_lines = false;
        loop {
            match self.peek(0) {
                None => return Err(self.error(line, column, "comment not terminated")),
                Some('*') if self.peek(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some(c) => {
                    spans_lines |= c == '\n';
                    self.bump();
                }
            }
        }
        // A comment spanning lines acts like a newline.
        if spans_lines {
            self.newline();
        }
        Ok(())
    }

    fn identifier(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            if c == '_' || c.is_alphanumeric() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };
        self.push(kind, text, line, column);
    }

    fn number(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        let hex = self.peek(0) == Some('0') && matches!(self.peek(1), Some('x' | 'X'));

        while let Some(c) = self.peek(0) {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                if c == '.' && self.peek(1) == Some('.') {
                    break;
                }
                text.push(c);
                self.bump();
                let exponent = if hex {
                    matches!(c, 'p' | 'P')
                } else {
                    matches!(c, 'e' | 'E')
                };
                if exponent && matches!(self.peek(0), Some('+' | '-')) {
                    if let Some(sign) = self.bump() {
                        text.push(sign);
                    }
                }
            } else {
                break;
            }
        }

        let kind = if text.ends_with('i') {
            TokenKind::Imaginary
        } else if text.contains('.')
            || (hex && text.contains(['p', 'P']))
            || (!hex && text.contains(['e', 'E']))
        {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        self.push(kind, text, line, column);
    }

    /// Consume a quoted literal body up to `quote`, keeping escapes verbatim.
    fn quoted(&mut self, quote: char, what: &str) -> Result<String, LexError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        if let Some(open) = self.bump() {
            text.push(open);
        }
        loop {
            match self.peek(0) {
                None | Some('\n') => {
                    return Err(self.error(line, column, format!("{what} literal not terminated")))
                }
                Some('\\') => {
                    text.push('\\');
                    self.bump();
                    match self.bump() {
                        Some(escaped) if escaped != '\n' => text.push(escaped),
                        _ => {
                            return Err(self.error(
                                line,
                                column,
                                format!("{what} literal not terminated"),
                            ))
                        }
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                    if c == quote {
                        return Ok(text);
                    }
                }
            }
        }
    }

    fn interpreted_string(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let text = self.quoted('"', "string")?;
        self.push(TokenKind::String, text, line, column);
        Ok(())
    }

    fn rune(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let text = self.quoted('\'', "rune")?;
        if text.len() <= 2 {
            return Err(self.error(line, column, "empty rune literal"));
        }
        self.push(TokenKind::Rune, text, line, column);
        Ok(())
    }

    fn raw_string(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        if let Some(open) = self.bump() {
            text.push(open);
        }
        loop {
            match self.bump() {
                None => return Err(self.error(line, column, "raw string literal not terminated")),
                Some('\r') => {}
                Some('`') => {
                    text.push('`');
                    break;
                }
                Some(c) => text.push(c),
            }
        }
        self.push(TokenKind::String, text, line, column);
        Ok(())
    }

    fn operator(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let rest: String = self.chars[self.pos..].iter().take(3).collect();
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            let c = self.peek(0).unwrap_or_default();
            return Err(self.error(line, column, format!("invalid character {c:?}")));
        };
        for _ in 0..op.chars().count() {
            self.bump();
        }
        let kind = if *op == ";" {
            TokenKind::Semicolon
        } else {
            TokenKind::Operator
        };
        self.push(kind, op.to_string(), line, column);
        Ok(())
    }
}

/// Tokenize `source`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_semicolon_insertion() {
        let tokens = texts("package p\n\ntype A struct {\n\tX int\n}\n");
        assert_eq!(
            tokens,
            vec!["package", "p", "\n", "type", "A", "struct", "{", "X", "int", "\n", "}", "\n"]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        let tokens = texts("a +\nb");
        assert_eq!(tokens, vec!["a", "+", "b", "\n"]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = kinds("map chan mapping");
        assert_eq!(tokens[0], (TokenKind::Keyword, "map".to_string()));
        assert_eq!(tokens[1], (TokenKind::Keyword, "chan".to_string()));
        assert_eq!(tokens[2], (TokenKind::Ident, "mapping".to_string()));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 0x1F 3.14 1e-9 0x1p-2 2i 1_000 .5");
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            &kinds[..8],
            &[
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Imaginary,
                TokenKind::Int,
                TokenKind::Float,
            ]
        );
        assert_eq!(tokens[3].1, "1e-9");
    }

    #[test]
    fn test_strings_and_runes() {
        let tokens = kinds(r#""a\"b" `raw
line` 'x' '\n'"#);
        assert_eq!(tokens[0], (TokenKind::String, r#""a\"b""#.to_string()));
        assert_eq!(tokens[1], (TokenKind::String, "`raw\nline`".to_string()));
        assert_eq!(tokens[2], (TokenKind::Rune, "'x'".to_string()));
        assert_eq!(tokens[3], (TokenKind::Rune, r"'\n'".to_string()));
    }

    #[test]
    fn test_comments_are_dropped() {
        let tokens = texts("a // trailing\nb /* inline */ c /* multi\nline */ d");
        assert_eq!(tokens, vec!["a", "\n", "b", "c", "\n", "d", "\n"]);
    }

    #[test]
    fn test_operators_longest_match() {
        let tokens = texts("<-chan ... &^= :=");
        assert_eq!(tokens, vec!["<-", "chan", "...", "&^=", ":="]);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("package p\ntype T int").unwrap();
        let t = tokens.iter().find(|t| t.text == "T").unwrap();
        assert_eq!((t.line, t.column), (2, 6));
    }

    #[test]
    fn test_errors() {
        let err = tokenize("x := \"open").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("not terminated"));

        let err = tokenize("a\n  /* never closed").unwrap_err();
        assert_eq!((err.line, err.column), (2, 3));

        let err = tokenize("a @ b").unwrap_err();
        assert!(err.message.contains("invalid character"));
    }
}
