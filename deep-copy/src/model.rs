//! Type descriptor model.
//!
//! This module defines the structural view of the analyzed types that the
//! planner and synthesizer consume. Descriptors are produced by a
//! [`TypeOracle`] and are never mutated afterwards.
//!
//! A type graph may be cyclic: cycles always pass through a
//! [`TypeDescriptor::Named`] reference and are resolved by name through the
//! oracle, never by structural comparison.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Predeclared Go value types.
const BASIC_TYPES: &[&str] = &[
    "bool",
    "string",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "byte",
    "rune",
    "float32",
    "float64",
    "complex64",
    "complex128",
];

/// Struct tag key holding the shallow-copy override.
pub const OVERRIDE_TAG_KEY: &str = "deepcopy";

/// Structural description of a type expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// Predeclared value type (`int64`, `string`, ...).
    Basic { name: String },

    /// Reference to a type declared in the analyzed package.
    Named { name: String },

    /// Named type declared in another package; copied by value.
    Qualified { package: String, name: String },

    /// Channels, function types and generic instantiations.
    Opaque {
        text: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        qualifiers: Vec<String>,
    },

    /// `*T`
    Pointer { elem: Box<TypeDescriptor> },

    /// `[N]T`, with the length kept as written.
    Array {
        len: String,
        elem: Box<TypeDescriptor>,
    },

    /// `[]T`
    Slice { elem: Box<TypeDescriptor> },

    /// `map[K]V`
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },

    /// `struct { ... }`
    Struct { fields: Vec<FieldDescriptor> },

    /// `interface { ... }`, `any` or `error`.
    Interface {
        text: String,
        methods: Vec<MethodSig>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        qualifiers: Vec<String>,
    },
}

impl TypeDescriptor {
    /// A predeclared value type.
    pub fn basic(name: impl Into<String>) -> Self {
        Self::Basic { name: name.into() }
    }

    /// A reference to a declared type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    /// A type from another package.
    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    /// An opaque type copied by value.
    pub fn opaque(text: impl Into<String>) -> Self {
        Self::Opaque {
            text: text.into(),
            qualifiers: Vec::new(),
        }
    }

    pub fn pointer(elem: TypeDescriptor) -> Self {
        Self::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: TypeDescriptor) -> Self {
        Self::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn array(len: impl Into<String>, elem: TypeDescriptor) -> Self {
        Self::Array {
            len: len.into(),
            elem: Box::new(elem),
        }
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn structure(fields: Vec<FieldDescriptor>) -> Self {
        Self::Struct { fields }
    }

    /// An interface type built from its method set.
    pub fn interface(methods: Vec<MethodSig>) -> Self {
        let text = if methods.is_empty() {
            "interface{}".to_string()
        } else {
            let body: Vec<String> = methods.iter().map(ToString::to_string).collect();
            format!("interface {{ {} }}", body.join("; "))
        };
        Self::Interface {
            text,
            methods,
            qualifiers: Vec::new(),
        }
    }

    /// Map a bare identifier to a predeclared type, if it is one.
    ///
    /// `any` and `error` are predeclared interfaces.
    pub fn predeclared(ident: &str) -> Option<Self> {
        if BASIC_TYPES.contains(&ident) {
            return Some(Self::basic(ident));
        }
        match ident {
            "any" | "error" => Some(Self::Interface {
                text: ident.to_string(),
                methods: Vec::new(),
                qualifiers: Vec::new(),
            }),
            _ => None,
        }
    }

    /// Whether values of this kind own storage that a deep copy must duplicate.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::Named { .. }
                | Self::Pointer { .. }
                | Self::Array { .. }
                | Self::Slice { .. }
                | Self::Map { .. }
                | Self::Struct { .. }
        )
    }

    /// Package qualifiers referenced anywhere in this type expression.
    pub fn qualifiers(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_qualifiers(&mut out);
        out
    }

    fn collect_qualifiers(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Basic { .. } | Self::Named { .. } => {}
            Self::Qualified { package, .. } => {
                out.insert(package.clone());
            }
            Self::Opaque { qualifiers, .. } | Self::Interface { qualifiers, .. } => {
                out.extend(qualifiers.iter().cloned());
            }
            Self::Pointer { elem } | Self::Slice { elem } | Self::Array { elem, .. } => {
                elem.collect_qualifiers(out)
            }
            Self::Map { key, value } => {
                key.collect_qualifiers(out);
                value.collect_qualifiers(out);
            }
            Self::Struct { fields } => {
                for field in fields {
                    field.ty.collect_qualifiers(out);
                }
            }
        }
    }
}

/// Renders the type as Go source.
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { name } | Self::Named { name } => f.write_str(name),
            Self::Qualified { package, name } => write!(f, "{package}.{name}"),
            Self::Opaque { text, .. } | Self::Interface { text, .. } => f.write_str(text),
            Self::Pointer { elem } => write!(f, "*{elem}"),
            Self::Array { len, elem } => write!(f, "[{len}]{elem}"),
            Self::Slice { elem } => write!(f, "[]{elem}"),
            Self::Map { key, value } => write!(f, "map[{key}]{value}"),
            Self::Struct { fields } => {
                if fields.is_empty() {
                    return f.write_str("struct{}");
                }
                let rendered: Vec<String> = fields.iter().map(ToString::to_string).collect();
                write!(f, "struct {{ {} }}", rendered.join("; "))
            }
        }
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Field name; for embedded fields, the embedded type's name.
    pub name: String,

    /// Whether the field is exported (first character is uppercase).
    pub exported: bool,

    /// Field type.
    pub ty: TypeDescriptor,

    /// Whether the field is embedded.
    pub embedded: bool,

    /// Raw tag literal as written in the source, quotes included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Whether the tag carries the `deepcopy:"-"` override.
    pub shallow: bool,
}

impl FieldDescriptor {
    /// Create a field; visibility follows the Go export rule.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        let name = name.into();
        Self {
            exported: is_exported(&name),
            name,
            ty,
            embedded: false,
            tag: None,
            shallow: false,
        }
    }

    /// Attach a raw tag literal and parse the override marker from it.
    pub fn with_tag(mut self, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        self.shallow = tag_lookup(&unquote_tag(&raw), OVERRIDE_TAG_KEY).as_deref() == Some("-");
        self.tag = Some(raw);
        self
    }

    /// Mark the field as embedded.
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.embedded {
            write!(f, "{}", self.ty)?;
        } else {
            write!(f, "{} {}", self.name, self.ty)?;
        }
        if let Some(tag) = &self.tag {
            write!(f, " {tag}")?;
        }
        Ok(())
    }
}

/// A method in an interface's method set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSig {
    pub name: String,

    /// Parameter list as written, without the enclosing parentheses.
    pub params: String,

    /// Result list as written (empty, a single type, or a parenthesized list).
    pub results: String,
}

impl MethodSig {
    pub fn new(
        name: impl Into<String>,
        params: impl Into<String>,
        results: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            results: results.into(),
        }
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params)?;
        if !self.results.is_empty() {
            write!(f, " {}", self.results)?;
        }
        Ok(())
    }
}

/// A method already declared on a named type in the analyzed sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodDecl {
    pub pointer_receiver: bool,

    /// Whether the (single) result is a pointer type.
    pub pointer_result: bool,
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDecl {
    /// Type identity.
    pub name: String,

    /// Right-hand side of the declaration.
    pub underlying: TypeDescriptor,

    /// `type A = B`
    pub alias: bool,

    /// Whether the declaration has type parameters.
    pub generic: bool,

    /// Methods declared on this type, by name.
    pub methods: BTreeMap<String, MethodDecl>,

    /// Import table of the declaring file: qualifier to import path.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub imports: BTreeMap<String, String>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, underlying: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            underlying,
            alias: false,
            generic: false,
            methods: BTreeMap::new(),
            imports: BTreeMap::new(),
        }
    }

    /// An alias declaration (`type A = B`).
    pub fn alias(name: impl Into<String>, target: TypeDescriptor) -> Self {
        Self {
            alias: true,
            ..Self::new(name, target)
        }
    }

    pub fn with_method(mut self, name: impl Into<String>, method: MethodDecl) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    pub fn with_import(mut self, qualifier: impl Into<String>, path: impl Into<String>) -> Self {
        self.imports.insert(qualifier.into(), path.into());
        self
    }

    pub fn with_generic(mut self, generic: bool) -> Self {
        self.generic = generic;
        self
    }
}

/// Resolves type names of one analyzed package.
pub trait TypeOracle {
    /// Name of the package the generated code belongs to.
    fn package_name(&self) -> &str;

    /// Look up a declared type by name.
    fn lookup(&self, name: &str) -> Option<&TypeDecl>;

    /// Resolve a package qualifier used in the declaration of `declared_in`.
    fn import_path(&self, qualifier: &str, declared_in: &str) -> Option<String> {
        self.lookup(declared_in)
            .and_then(|decl| decl.imports.get(qualifier).cloned())
    }
}

/// In-memory type oracle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Universe {
    package: String,
    decls: BTreeMap<String, TypeDecl>,
}

impl Universe {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            decls: BTreeMap::new(),
        }
    }

    /// Add a declaration, returning the previous one with the same name.
    pub fn insert(&mut self, decl: TypeDecl) -> Option<TypeDecl> {
        self.decls.insert(decl.name.clone(), decl)
    }

    /// Builder form of [`Universe::insert`].
    pub fn with_decl(mut self, decl: TypeDecl) -> Self {
        self.insert(decl);
        self
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeDecl> {
        self.decls.get_mut(name)
    }

    pub fn decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.values()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl TypeOracle for Universe {
    fn package_name(&self) -> &str {
        &self.package
    }

    fn lookup(&self, name: &str) -> Option<&TypeDecl> {
        self.decls.get(name)
    }

    /// Falls back to any file of the package importing `qualifier`.
    fn import_path(&self, qualifier: &str, declared_in: &str) -> Option<String> {
        self.decls
            .get(declared_in)
            .and_then(|decl| decl.imports.get(qualifier))
            .or_else(|| {
                self.decls
                    .values()
                    .find_map(|decl| decl.imports.get(qualifier))
            })
            .cloned()
    }
}

/// Go export rule: the first character is an uppercase letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Strip the quotes of a tag literal, unescaping interpreted strings.
pub fn unquote_tag(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        return inner.to_string();
    }
    if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => {}
                }
            } else {
                out.push(c);
            }
        }
        return out;
    }
    raw.to_string()
}

/// Look up `key` in a struct tag using the `key:"value"` convention.
///
/// Follows `reflect.StructTag.Lookup`: pairs are space separated, values are
/// interpreted string literals, and parsing stops at the first malformed pair.
pub fn tag_lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\x7f')
            .unwrap_or(rest.len());
        if name_len == 0 || !rest[name_len..].starts_with(":\"") {
            return None;
        }
        let name = &rest[..name_len];
        rest = &rest[name_len + 1..];

        // Find the closing quote, honoring escapes.
        let bytes = rest.as_bytes();
        let mut end = 1;
        while end < bytes.len() && bytes[end] != b'"' {
            if bytes[end] == b'\\' {
                end += 1;
            }
            end += 1;
        }
        if end >= bytes.len() {
            return None;
        }
        let quoted = &rest[..=end];
        rest = &rest[end + 1..];

        if name == key {
            return Some(unquote_tag(quoted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predeclared_types() {
        assert_eq!(
            TypeDescriptor::predeclared("int64"),
            Some(TypeDescriptor::basic("int64"))
        );
        assert!(matches!(
            TypeDescriptor::predeclared("error"),
            Some(TypeDescriptor::Interface { .. })
        ));
        assert_eq!(TypeDescriptor::predeclared("Player"), None);
    }

    #[test]
    fn test_display_renders_go_syntax() {
        let ty = TypeDescriptor::map(
            TypeDescriptor::basic("string"),
            TypeDescriptor::slice(TypeDescriptor::pointer(TypeDescriptor::named("Basic"))),
        );
        assert_eq!(ty.to_string(), "map[string][]*Basic");

        let anon = TypeDescriptor::structure(vec![
            FieldDescriptor::new("A", TypeDescriptor::array("4", TypeDescriptor::basic("byte"))),
            FieldDescriptor::new("B", TypeDescriptor::qualified("time", "Time"))
                .with_tag("`json:\"b\"`"),
        ]);
        assert_eq!(anon.to_string(), "struct { A [4]byte; B time.Time `json:\"b\"` }");
    }

    #[test]
    fn test_qualifiers_are_collected_recursively() {
        let ty = TypeDescriptor::map(
            TypeDescriptor::qualified("uuid", "UUID"),
            TypeDescriptor::structure(vec![FieldDescriptor::new(
                "At",
                TypeDescriptor::qualified("time", "Time"),
            )]),
        );
        let quals: Vec<String> = ty.qualifiers().into_iter().collect();
        assert_eq!(quals, vec!["time".to_string(), "uuid".to_string()]);
    }

    #[test]
    fn test_field_visibility() {
        assert!(FieldDescriptor::new("Level", TypeDescriptor::basic("int32")).exported);
        assert!(!FieldDescriptor::new("level", TypeDescriptor::basic("int32")).exported);
        assert!(!FieldDescriptor::new("_", TypeDescriptor::basic("int32")).exported);
    }

    #[test]
    fn test_override_tag_parsing() {
        let field = FieldDescriptor::new("Ctl", TypeDescriptor::named("Ctl"))
            .with_tag("`deepcopy:\"-\"`");
        assert!(field.shallow);

        let field = FieldDescriptor::new("ID", TypeDescriptor::basic("int64"))
            .with_tag("`bson:\"_id\" deepcopy:\"-\"`");
        assert!(field.shallow);

        let field = FieldDescriptor::new("ID", TypeDescriptor::basic("int64"))
            .with_tag("`bson:\"-\"`");
        assert!(!field.shallow);

        let field = FieldDescriptor::new("ID", TypeDescriptor::basic("int64"))
            .with_tag("\"deepcopy:\\\"-\\\"\"");
        assert!(field.shallow);
    }

    #[test]
    fn test_tag_lookup() {
        let tag = r#"json:"name,omitempty" xml:"n""#;
        assert_eq!(tag_lookup(tag, "json").as_deref(), Some("name,omitempty"));
        assert_eq!(tag_lookup(tag, "xml").as_deref(), Some("n"));
        assert_eq!(tag_lookup(tag, "yaml"), None);
        assert_eq!(tag_lookup("malformed", "json"), None);
        assert_eq!(tag_lookup(r#"a:"x\"y""#, "a").as_deref(), Some("x\"y"));
    }

    #[test]
    fn test_universe_import_fallback() {
        let universe = Universe::new("pkg")
            .with_decl(TypeDecl::new("A", TypeDescriptor::basic("int")))
            .with_decl(
                TypeDecl::new("B", TypeDescriptor::qualified("time", "Time"))
                    .with_import("time", "time"),
            );
        assert_eq!(universe.import_path("time", "B").as_deref(), Some("time"));
        assert_eq!(universe.import_path("time", "A").as_deref(), Some("time"));
        assert_eq!(universe.import_path("uuid", "A"), None);
    }
}
