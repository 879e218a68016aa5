//! Go source parsing for type extraction.
//!
//! This module parses Go source files far enough to extract what the
//! generator needs: the package clause, the import table, every `type`
//! declaration with its full type expression, and the name and result shape
//! of every method. Function bodies, `var` and `const` declarations are
//! skipped by bracket matching.

use crate::error::AnalysisError;
use crate::lexer::{self, Token, TokenKind};
use crate::scanner::SourceFile;
use deep_copy::{FieldDescriptor, MethodDecl, MethodSig, TypeDecl, TypeDescriptor};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Location of a declaration in the sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

/// A parsed `type` declaration.
#[derive(Debug, Clone)]
pub struct ParsedType {
    pub decl: TypeDecl,
    pub location: SourceLocation,
}

/// A parsed method declaration.
#[derive(Debug, Clone)]
pub struct ParsedMethod {
    /// Receiver base type name.
    pub receiver: String,
    pub name: String,
    pub decl: MethodDecl,
    pub location: SourceLocation,
}

/// Everything extracted from one file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub package: String,

    /// Qualifier to import path.
    pub imports: BTreeMap<String, String>,

    pub types: Vec<ParsedType>,
    pub methods: Vec<ParsedMethod>,
}

/// Parser for Go declarations.
#[derive(Debug, Default)]
pub struct GoParser;

impl GoParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a single source file.
    pub fn parse_source(&self, content: &str, path: &Path) -> Result<ParsedFile, AnalysisError> {
        let tokens = lexer::tokenize(content)
            .map_err(|e| AnalysisError::syntax(path, e.line, e.column, e.message))?;
        Cursor::new(&tokens, path).file()
    }

    /// Parse multiple source files, collecting errors.
    pub fn parse_files(&self, files: &[SourceFile]) -> (Vec<ParsedFile>, Vec<AnalysisError>) {
        let mut parsed = Vec::new();
        let mut errors = Vec::new();

        for file in files {
            match self.parse_source(&file.content, &file.path) {
                Ok(result) => {
                    tracing::debug!(
                        file = %file.path.display(),
                        types = result.types.len(),
                        methods = result.methods.len(),
                        "parsed source file"
                    );
                    parsed.push(result);
                }
                Err(e) => errors.push(e),
            }
        }

        (parsed, errors)
    }
}

type ParseResult<T> = Result<T, AnalysisError>;

/// Position in a token stream.
struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    file: &'t Path,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Token], file: &'t Path) -> Self {
        Self {
            tokens,
            pos: 0,
            file,
        }
    }

    // -------------------------------------------------------------------------
    // Token access
    // -------------------------------------------------------------------------

    fn peek(&self) -> &'t Token {
        self.peek_at(0)
    }

    /// The token `offset` ahead; the trailing `Eof` repeats forever.
    fn peek_at(&self, offset: usize) -> &'t Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn advance(&mut self) -> &'t Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> AnalysisError {
        AnalysisError::syntax(self.file, token.line, token.column, message)
    }

    fn unexpected(&self, expected: &str) -> AnalysisError {
        let token = self.peek();
        self.error_at(token, format!("expected {expected}, found {token}"))
    }

    fn location(&self, token: &Token) -> SourceLocation {
        SourceLocation {
            file: self.file.to_path_buf(),
            line: token.line,
            column: token.column,
        }
    }

    fn at_op(&self, op: &str) -> bool {
        self.peek().is_op(op)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> ParseResult<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{op}'")))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<&'t Token> {
        if self.peek().kind == TokenKind::Ident {
            Ok(self.advance())
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.peek().is_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{keyword}'")))
        }
    }

    /// A `;` is required unless the list closes right here.
    fn end_of_item(&mut self) -> ParseResult<()> {
        let token = self.peek();
        if token.kind == TokenKind::Semicolon {
            self.advance();
            Ok(())
        } else if token.is_op(")") || token.is_op("}") || token.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.unexpected("';' or newline"))
        }
    }

    /// Index of the bracket closing the one at `open`.
    fn matching(&self, open: usize) -> ParseResult<usize> {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(open) {
            if token.kind != TokenKind::Operator {
                continue;
            }
            match token.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(index);
                    }
                }
                _ => {}
            }
        }
        Err(self.error_at(&self.tokens[open], format!("unclosed {}", self.tokens[open])))
    }

    /// Skip a bracketed group starting at the current token.
    fn skip_group(&mut self) -> ParseResult<()> {
        let close = self.matching(self.pos)?;
        self.pos = close + 1;
        Ok(())
    }

    /// Source-like text of the tokens in `start..end`.
    fn text(&self, start: usize, end: usize) -> String {
        let tokens = &self.tokens[start..end];
        let mut out = String::new();
        let mut prev: Option<&Token> = None;
        for (index, token) in tokens.iter().enumerate() {
            if token.kind == TokenKind::Semicolon {
                let closes = tokens.get(index + 1).map_or(true, |next| next.is_op("}"));
                if closes {
                    continue;
                }
            }
            let piece = if token.kind == TokenKind::Semicolon {
                ";"
            } else {
                token.text.as_str()
            };
            if let Some(prev) = prev {
                if needs_space(prev, token) {
                    out.push(' ');
                }
            }
            out.push_str(piece);
            prev = Some(token);
        }
        out
    }

    /// Package qualifiers (`pkg` in `pkg.Name`) used in `start..end`.
    fn qualifiers_in(&self, start: usize, end: usize) -> Vec<String> {
        let mut out = BTreeSet::new();
        for index in start..end.saturating_sub(2) {
            let token = &self.tokens[index];
            let selected = token.kind == TokenKind::Ident
                && self.tokens[index + 1].is_op(".")
                && self.tokens[index + 2].kind == TokenKind::Ident
                && (index == 0 || !self.tokens[index - 1].is_op("."));
            if selected {
                out.insert(token.text.clone());
            }
        }
        out.into_iter().collect()
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    fn file(mut self) -> ParseResult<ParsedFile> {
        self.expect_keyword("package")?;
        let package = self.expect_ident()?.text.clone();
        self.end_of_item()?;

        let mut parsed = ParsedFile {
            path: self.file.to_path_buf(),
            package,
            imports: BTreeMap::new(),
            types: Vec::new(),
            methods: Vec::new(),
        };

        while self.peek().is_keyword("import") {
            self.import_decl(&mut parsed.imports)?;
        }

        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Keyword => match token.text.as_str() {
                    "type" => self.type_decl(&mut parsed.types)?,
                    "func" => self.func_decl(&mut parsed.methods)?,
                    "var" | "const" => self.skip_decl()?,
                    "import" => {
                        return Err(self.error_at(token, "imports must appear before other declarations"))
                    }
                    _ => return Err(self.error_at(token, format!("unexpected {token} outside function body"))),
                },
                _ => return Err(self.error_at(token, format!("unexpected {token} outside function body"))),
            }
        }

        Ok(parsed)
    }

    fn import_decl(&mut self, imports: &mut BTreeMap<String, String>) -> ParseResult<()> {
        self.expect_keyword("import")?;
        if self.eat_op("(") {
            while !self.at_op(")") {
                self.import_spec(imports)?;
                self.end_of_item()?;
            }
            self.expect_op(")")?;
        } else {
            self.import_spec(imports)?;
        }
        self.end_of_item()
    }

    fn import_spec(&mut self, imports: &mut BTreeMap<String, String>) -> ParseResult<()> {
        let name = match self.peek() {
            token if token.kind == TokenKind::Ident => Some(self.advance().text.clone()),
            token if token.is_op(".") => Some(self.advance().text.clone()),
            _ => None,
        };

        let token = self.peek();
        if token.kind != TokenKind::String {
            return Err(self.unexpected("import path"));
        }
        self.advance();
        let path = unquote(&token.text);

        let qualifier = name.unwrap_or_else(|| default_qualifier(&path));
        if qualifier != "_" && qualifier != "." {
            imports.insert(qualifier, path);
        }
        Ok(())
    }

    fn type_decl(&mut self, types: &mut Vec<ParsedType>) -> ParseResult<()> {
        self.expect_keyword("type")?;
        if self.eat_op("(") {
            while !self.at_op(")") {
                types.push(self.type_spec()?);
                self.end_of_item()?;
            }
            self.expect_op(")")?;
        } else {
            types.push(self.type_spec()?);
        }
        self.end_of_item()
    }

    fn type_spec(&mut self) -> ParseResult<ParsedType> {
        let name = self.expect_ident()?;
        let location = self.location(name);

        let generic = self.at_op("[") && self.at_type_params()?;
        if generic {
            self.skip_group()?;
        }
        let alias = self.eat_op("=");
        let underlying = self.parse_type()?;

        let decl = TypeDecl {
            alias,
            ..TypeDecl::new(name.text.clone(), underlying).with_generic(generic)
        };
        Ok(ParsedType { decl, location })
    }

    /// Whether the `[` after a type name opens type parameters rather than an array length.
    ///
    /// A name followed by a constraint opens a parameter list. `N*2` and `N(x)`
    /// stay array lengths unless the right operand is a type element, as in
    /// `P *[]int`, or a comma forces a list, as in `P *C,`.
    fn at_type_params(&self) -> ParseResult<bool> {
        if self.peek_at(1).kind != TokenKind::Ident {
            return Ok(false);
        }
        let second = self.peek_at(2);
        if second.is_op("*") || second.is_op("(") {
            return Ok(starts_type_elem(self.peek_at(3)) || self.has_top_level_comma()?);
        }
        Ok(matches!(second.kind, TokenKind::Ident | TokenKind::Keyword)
            || ["[", ",", "~"].iter().any(|op| second.is_op(op)))
    }

    /// Whether the group opened at the current token holds a comma of its own.
    fn has_top_level_comma(&self) -> ParseResult<bool> {
        let close = self.matching(self.pos)?;
        let mut depth = 0usize;
        for token in &self.tokens[self.pos + 1..close] {
            if token.kind != TokenKind::Operator {
                continue;
            }
            match token.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                "," if depth == 0 => return Ok(true),
                _ => {}
            }
        }
        Ok(false)
    }

    fn func_decl(&mut self, methods: &mut Vec<ParsedMethod>) -> ParseResult<()> {
        self.expect_keyword("func")?;

        let receiver = if self.at_op("(") {
            Some(self.receiver()?)
        } else {
            None
        };

        let name = self.expect_ident()?;
        if receiver.is_none() && self.at_op("[") {
            self.skip_group()?;
        }

        if !self.at_op("(") {
            return Err(self.unexpected("'('"));
        }
        self.skip_group()?;
        let pointer_result = self.result()?;

        if self.at_op("{") {
            self.skip_group()?;
        }
        self.end_of_item()?;

        if let Some((receiver, pointer_receiver)) = receiver {
            methods.push(ParsedMethod {
                receiver,
                name: name.text.clone(),
                decl: MethodDecl {
                    pointer_receiver,
                    pointer_result,
                },
                location: self.location(name),
            });
        }
        Ok(())
    }

    /// Receiver base type name and whether it is a pointer.
    fn receiver(&mut self) -> ParseResult<(String, bool)> {
        let open = self.pos;
        let close = self.matching(open)?;
        let inner = &self.tokens[open + 1..close];

        let mut index = 0;
        if inner.len() > 1
            && inner[0].kind == TokenKind::Ident
            && (inner[1].kind == TokenKind::Ident || inner[1].is_op("*"))
        {
            index = 1;
        }
        let pointer = inner.get(index).is_some_and(|t| t.is_op("*"));
        if pointer {
            index += 1;
        }
        let base = match inner.get(index) {
            Some(token) if token.kind == TokenKind::Ident => token.text.clone(),
            _ => return Err(self.error_at(&self.tokens[open], "invalid receiver")),
        };

        self.pos = close + 1;
        Ok((base, pointer))
    }

    /// Skip a result list, reporting whether it is a single pointer.
    fn result(&mut self) -> ParseResult<bool> {
        if self.at_op("(") {
            let open = self.pos;
            let close = self.matching(open)?;
            let inner = &self.tokens[open + 1..close];
            let mut depth = 0usize;
            let mut single = true;
            for token in inner {
                match token.text.as_str() {
                    "(" | "[" | "{" if token.kind == TokenKind::Operator => depth += 1,
                    ")" | "]" | "}" if token.kind == TokenKind::Operator => {
                        depth = depth.saturating_sub(1)
                    }
                    "," if depth == 0 => single = false,
                    _ => {}
                }
            }
            let pointer = match inner {
                [first, ..] if first.is_op("*") => true,
                [first, second, ..] => first.kind == TokenKind::Ident && second.is_op("*"),
                _ => false,
            };
            self.pos = close + 1;
            return Ok(single && pointer);
        }
        if self.at_type_start() {
            return Ok(matches!(self.parse_type()?, TypeDescriptor::Pointer { .. }));
        }
        Ok(false)
    }

    fn skip_decl(&mut self) -> ParseResult<()> {
        self.advance();
        if self.at_op("(") {
            self.skip_group()?;
            return self.end_of_item();
        }
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Semicolon | TokenKind::Eof => break,
                TokenKind::Operator if ["(", "[", "{"].contains(&token.text.as_str()) => {
                    self.skip_group()?
                }
                _ => {
                    self.advance();
                }
            }
        }
        self.end_of_item()
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    fn at_type_start(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Ident => true,
            TokenKind::Keyword => matches!(
                token.text.as_str(),
                "func" | "map" | "chan" | "struct" | "interface"
            ),
            TokenKind::Operator => ["*", "[", "(", "<-"].iter().any(|op| token.is_op(op)),
            _ => false,
        }
    }

    fn parse_type(&mut self) -> ParseResult<TypeDescriptor> {
        let token = self.peek();
        match token.kind {
            TokenKind::Ident => self.type_name(),
            TokenKind::Keyword => match token.text.as_str() {
                "map" => {
                    self.advance();
                    self.expect_op("[")?;
                    let key = self.parse_type()?;
                    self.expect_op("]")?;
                    let value = self.parse_type()?;
                    Ok(TypeDescriptor::map(key, value))
                }
                "chan" => {
                    self.advance();
                    let prefix = if self.eat_op("<-") { "chan<- " } else { "chan " };
                    let elem = self.parse_type()?;
                    Ok(opaque(format!("{prefix}{elem}"), &elem))
                }
                "func" => {
                    let start = self.pos;
                    self.advance();
                    self.signature()?;
                    Ok(TypeDescriptor::Opaque {
                        text: self.text(start, self.pos),
                        qualifiers: self.qualifiers_in(start, self.pos),
                    })
                }
                "struct" => self.struct_type(),
                "interface" => self.interface_type(),
                _ => Err(self.unexpected("type")),
            },
            TokenKind::Operator => match token.text.as_str() {
                "*" => {
                    self.advance();
                    Ok(TypeDescriptor::pointer(self.parse_type()?))
                }
                "[" => {
                    self.advance();
                    if self.eat_op("]") {
                        return Ok(TypeDescriptor::slice(self.parse_type()?));
                    }
                    let start = self.pos;
                    let close = self.matching(start - 1)?;
                    let len = self.text(start, close);
                    self.pos = close + 1;
                    Ok(TypeDescriptor::array(len, self.parse_type()?))
                }
                "<-" => {
                    self.advance();
                    self.expect_keyword("chan")?;
                    let elem = self.parse_type()?;
                    Ok(opaque(format!("<-chan {elem}"), &elem))
                }
                "(" => {
                    self.advance();
                    let inner = self.parse_type()?;
                    self.expect_op(")")?;
                    Ok(inner)
                }
                _ => Err(self.unexpected("type")),
            },
            _ => Err(self.unexpected("type")),
        }
    }

    /// `Name`, `pkg.Name`, or either with type arguments.
    fn type_name(&mut self) -> ParseResult<TypeDescriptor> {
        let first = self.expect_ident()?.text.clone();
        let base = if self.eat_op(".") {
            let name = self.expect_ident()?.text.clone();
            TypeDescriptor::qualified(first, name)
        } else {
            TypeDescriptor::predeclared(&first).unwrap_or_else(|| TypeDescriptor::named(first))
        };

        if !self.at_op("[") {
            return Ok(base);
        }

        // Instantiation of a generic type: copied by value.
        self.advance();
        let mut args = Vec::new();
        while !self.at_op("]") {
            args.push(self.parse_type()?);
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op("]")?;

        let mut qualifiers = base.qualifiers();
        for arg in &args {
            qualifiers.extend(arg.qualifiers());
        }
        let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
        Ok(TypeDescriptor::Opaque {
            text: format!("{base}[{}]", rendered.join(", ")),
            qualifiers: qualifiers.into_iter().collect(),
        })
    }

    /// Parameters and optional result of a function type.
    fn signature(&mut self) -> ParseResult<()> {
        if !self.at_op("(") {
            return Err(self.unexpected("'('"));
        }
        self.skip_group()?;
        if self.at_op("(") {
            self.skip_group()?;
        } else if self.at_type_start() {
            self.parse_type()?;
        }
        Ok(())
    }

    fn struct_type(&mut self) -> ParseResult<TypeDescriptor> {
        self.expect_keyword("struct")?;
        self.expect_op("{")?;
        let mut fields = Vec::new();
        while !self.at_op("}") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.unexpected("'}'"));
            }
            self.field_decl(&mut fields)?;
            self.end_of_item()?;
        }
        self.expect_op("}")?;
        Ok(TypeDescriptor::structure(fields))
    }

    fn field_decl(&mut self, fields: &mut Vec<FieldDescriptor>) -> ParseResult<()> {
        let token = self.peek();
        let mut declared = if token.is_op("*") {
            self.advance();
            let ty = self.parse_type()?;
            vec![FieldDescriptor::new(embedded_name(&ty), TypeDescriptor::pointer(ty)).embedded()]
        } else if token.kind == TokenKind::Ident {
            if self.at_embedded_field() {
                let ty = self.parse_type()?;
                vec![FieldDescriptor::new(embedded_name(&ty), ty).embedded()]
            } else {
                let mut names = vec![self.advance().text.clone()];
                while self.eat_op(",") {
                    names.push(self.expect_ident()?.text.clone());
                }
                let ty = self.parse_type()?;
                names
                    .into_iter()
                    .map(|name| FieldDescriptor::new(name, ty.clone()))
                    .collect()
            }
        } else {
            return Err(self.unexpected("field name or embedded type"));
        };

        if self.peek().kind == TokenKind::String {
            let tag = self.advance().text.clone();
            declared = declared
                .into_iter()
                .map(|field| field.with_tag(tag.clone()))
                .collect();
        }
        fields.extend(declared);
        Ok(())
    }

    /// Whether the identifier at the cursor starts an embedded field.
    fn at_embedded_field(&self) -> bool {
        let next = self.peek_at(1);
        if next.kind == TokenKind::Semicolon
            || next.kind == TokenKind::String
            || next.is_op("}")
            || next.is_op(".")
        {
            return true;
        }
        if next.is_op("[") {
            // `T[int]` ends the field; `Name [4]int` continues with the element type.
            if let Ok(close) = self.matching(self.pos + 1) {
                let after = &self.tokens[(close + 1).min(self.tokens.len() - 1)];
                return after.kind == TokenKind::Semicolon
                    || after.kind == TokenKind::String
                    || after.is_op("}");
            }
        }
        false
    }

    fn interface_type(&mut self) -> ParseResult<TypeDescriptor> {
        let start = self.pos;
        self.expect_keyword("interface")?;
        self.expect_op("{")?;

        let mut methods = Vec::new();
        while !self.at_op("}") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.unexpected("'}'"));
            }
            if self.peek().kind == TokenKind::Ident && self.peek_at(1).is_op("(") {
                methods.push(self.method_spec()?);
            } else {
                // Embedded interface or type union.
                self.eat_op("~");
                self.parse_type()?;
                while self.eat_op("|") {
                    self.eat_op("~");
                    self.parse_type()?;
                }
            }
            self.end_of_item()?;
        }
        self.expect_op("}")?;

        Ok(TypeDescriptor::Interface {
            text: self.text(start, self.pos),
            methods,
            qualifiers: self.qualifiers_in(start, self.pos),
        })
    }

    fn method_spec(&mut self) -> ParseResult<MethodSig> {
        let name = self.expect_ident()?.text.clone();

        let open = self.pos;
        let close = self.matching(open)?;
        let params = self.text(open + 1, close);
        self.pos = close + 1;

        let start = self.pos;
        if self.at_op("(") {
            self.skip_group()?;
        } else if self.at_type_start() {
            self.parse_type()?;
        }
        let results = self.text(start, self.pos);

        Ok(MethodSig::new(name, params, results))
    }
}

/// Whether a space separates two adjacent tokens in rendered text.
fn needs_space(prev: &Token, token: &Token) -> bool {
    let wordish = |t: &Token| {
        !matches!(t.kind, TokenKind::Operator | TokenKind::Semicolon | TokenKind::Eof)
    };
    if prev.kind == TokenKind::Semicolon || prev.is_op(",") {
        return true;
    }
    if token.is_op("}") {
        return !prev.is_op("{");
    }
    if prev.is_op("{") {
        return true;
    }
    if prev.is_op(")") || prev.is_op("}") {
        return wordish(token) || ["*", "(", "["].iter().any(|op| token.is_op(op));
    }
    if prev.is_op("|") || token.is_op("|") {
        return true;
    }
    if token.is_op("...") {
        return wordish(prev);
    }
    wordish(prev) && wordish(token)
}

/// A token that can only begin a type, never an expression operand.
fn starts_type_elem(token: &Token) -> bool {
    ["[", "~", "<-"].iter().any(|op| token.is_op(op))
        || ["struct", "func", "interface", "map", "chan"]
            .iter()
            .any(|keyword| token.is_keyword(keyword))
}

fn opaque(text: String, elem: &TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::Opaque {
        text,
        qualifiers: elem.qualifiers().into_iter().collect(),
    }
}

/// Field name of an embedded type.
fn embedded_name(ty: &TypeDescriptor) -> String {
    match ty {
        TypeDescriptor::Pointer { elem } => embedded_name(elem),
        TypeDescriptor::Named { name }
        | TypeDescriptor::Basic { name }
        | TypeDescriptor::Qualified { name, .. } => name.clone(),
        TypeDescriptor::Opaque { text, .. } | TypeDescriptor::Interface { text, .. } => {
            let base = text.split('[').next().unwrap_or(text);
            base.rsplit('.').next().unwrap_or(base).to_string()
        }
        other => other.to_string(),
    }
}

/// Strip the quotes of a string literal.
fn unquote(literal: &str) -> String {
    literal
        .strip_prefix(['"', '`'])
        .and_then(|s| s.strip_suffix(['"', '`']))
        .unwrap_or(literal)
        .to_string()
}

/// Package name implied by an import path without an explicit name.
///
/// Uses the last path element, skipping a major-version suffix (`/v2`) and
/// dropping `gopkg.in` style versions (`yaml.v3`) and `go-` style prefixes.
pub fn default_qualifier(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let mut last = segments.next().unwrap_or(path);
    let is_major = |s: &str| {
        s.strip_prefix('v')
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    };
    if is_major(last) {
        if let Some(previous) = segments.next() {
            last = previous;
        }
    }
    let last = last.split('.').next().unwrap_or(last);
    last.rsplit('-').next().unwrap_or(last).to_string()
}
