//! Declaration headers and brace-delimited bodies.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Kind keyword of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Struct,
    Enum,
}

impl DeclKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "class" => Some(DeclKind::Class),
            "struct" => Some(DeclKind::Struct),
            "enum" => Some(DeclKind::Enum),
            _ => None,
        }
    }
}

/// One type declaration located in the dump.
///
/// `body` borrows the text between the opening brace and its matching
/// closing brace, exclusive of both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration<'a> {
    pub kind: DeclKind,
    pub name: String,
    pub is_abstract: bool,
    /// First type named after the colon (base class, or storage type for enums).
    pub base_class: Option<String>,
    pub body: &'a str,
}

/// Declaration header: attributes, modifiers, kind keyword, name, optional
/// generic parameter list and `: Base`. Nested types keep their full
/// `Outer.Inner` name.
static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:\[[^\]\n]*\][ \t]*)*(?P<mods>(?:(?:public|private|protected|internal|sealed|static|abstract|unsafe|readonly|partial|new|ref)[ \t]+)*)(?P<kind>class|struct|enum)[ \t]+(?P<name>[A-Za-z_][\w`]*(?:\.[A-Za-z_][\w`]*)*)(?P<generic>[ \t]*<)?[^:\n{/]*(?::[ \t]*(?P<base>[A-Za-z_][\w\.]*))?",
    )
    .unwrap()
});

/// Every class, struct and enum declaration in a dump, indexed by name.
///
/// When a name is declared more than once for the same kind, the first
/// declaration wins. Declarations whose body cannot be located are left out.
#[derive(Debug, Default)]
pub struct DumpIndex<'a> {
    declarations: Vec<Declaration<'a>>,
    by_name: HashMap<(DeclKind, String), usize>,
}

impl<'a> DumpIndex<'a> {
    /// Scan the dump text for declarations.
    pub fn scan(text: &'a str) -> Self {
        let mut index = DumpIndex::default();

        for caps in HEADER.captures_iter(text) {
            let (Some(whole), Some(kind), Some(name)) =
                (caps.get(0), caps.name("kind"), caps.name("name"))
            else {
                continue;
            };
            let Some(kind) = DeclKind::from_keyword(kind.as_str()) else {
                continue;
            };
            let name = name.as_str().to_string();

            if caps.name("generic").is_some() {
                tracing::debug!(%name, "skipping generic declaration");
                continue;
            }

            let Some(body) = locate_body(text, whole.end()) else {
                tracing::debug!(%name, ?kind, "declaration body not found");
                continue;
            };

            let key = (kind, name.clone());
            if index.by_name.contains_key(&key) {
                tracing::debug!(%name, ?kind, "duplicate declaration ignored");
                continue;
            }

            let is_abstract = caps
                .name("mods")
                .map(|m| m.as_str().split_whitespace().any(|w| w == "abstract"))
                .unwrap_or(false);
            let base_class = caps.name("base").map(|b| b.as_str().to_string());

            index.by_name.insert(key, index.declarations.len());
            index.declarations.push(Declaration { kind, name, is_abstract, base_class, body });
        }

        index
    }

    pub fn get(&self, kind: DeclKind, name: &str) -> Option<&Declaration<'a>> {
        self.by_name.get(&(kind, name.to_string())).map(|&i| &self.declarations[i])
    }

    /// Class declaration by name, abstract or not.
    pub fn class(&self, name: &str) -> Option<&Declaration<'a>> {
        self.get(DeclKind::Class, name)
    }

    /// Declarations of one kind in dump order.
    pub fn of_kind(&self, kind: DeclKind) -> impl Iterator<Item = &Declaration<'a>> {
        self.declarations.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Find the body that follows a header ending at `from`.
///
/// Only the rest of the header line (interface lists, trailing comments) and
/// whitespace may sit between the header and the opening brace.
fn locate_body(text: &str, from: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut i = from;
    let mut on_header_line = true;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                let close = matching_brace(text, i)?;
                return Some(&text[i + 1..close]);
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = line_end(bytes, i);
            }
            b';' | b'}' => return None,
            b'\n' => {
                on_header_line = false;
                i += 1;
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ if on_header_line => i += 1,
            _ => return None,
        }
    }
    None
}

/// Index of the `}` matching the `{` at `open`.
///
/// Braces inside line comments, block comments, string literals and char
/// literals do not count.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = line_end(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = block_comment_end(bytes, i),
            b'"' | b'\'' => i = literal_end(bytes, i),
            _ => i += 1,
        }
    }
    None
}

/// Net brace depth change of one line, ignoring comments and literals.
pub(crate) fn brace_delta(line: &str) -> isize {
    let bytes = line.as_bytes();
    let mut delta = 0isize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                delta += 1;
                i += 1;
            }
            b'}' => {
                delta -= 1;
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => break,
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = block_comment_end(bytes, i),
            b'"' | b'\'' => i = literal_end(bytes, i),
            _ => i += 1,
        }
    }
    delta
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().position(|&b| b == b'\n').map(|p| from + p).unwrap_or(bytes.len())
}

fn block_comment_end(bytes: &[u8], from: usize) -> usize {
    let mut i = from + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// Position just past a string or char literal starting at `from`.
///
/// An unterminated literal ends at the line break so one stray quote cannot
/// swallow the rest of the dump.
fn literal_end(bytes: &[u8], from: usize) -> usize {
    let quote = bytes[from];
    let mut i = from + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}
