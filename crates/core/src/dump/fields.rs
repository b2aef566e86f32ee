//! Field triples and enum members inside a declaration body.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::declaration::{brace_delta, DeclKind};
use crate::config::ClassificationRules;
use crate::model::{parse_offset, EnumDef};

/// `<visibility> [modifiers] <type> <name>; // 0x<offset>`
static FIELD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:\[[^\]]*\]\s*)*(?:public|private|protected|internal)(?P<mods>(?:\s+(?:static|readonly|const|volatile|new|protected|internal|private|fixed|unsafe))*)\s+(?P<ty>[A-Za-z_][\w\.]*(?:<.*?>)?(?:\[[,\s]*\])*)\s+(?P<name>[A-Za-z_<][\w<>]*)\s*;\s*//\s*0[xX](?P<offset>[0-9A-Fa-f]+)",
    )
    .unwrap()
});

/// `<visibility> const <type> <name> = <integer>;`
static ENUM_MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:(?:public|private|protected|internal)\s+)?const\s+[\w\.]+\s+(?P<name>[A-Za-z_]\w*)\s*=\s*(?P<value>-?\d+)\s*;",
    )
    .unwrap()
});

/// Storage field every IL2CPP enum carries: `public int value__; // 0x0`.
static ENUM_STORAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:public|private|protected|internal)\s+(?P<ty>[\w\.]+)\s+value__\s*;")
        .unwrap()
});

/// One instance field as written in the dump, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub declared_type: String,
    /// `0x`-prefixed offset, digits kept as written.
    pub offset: String,
}

impl RawField {
    pub fn offset_value(&self) -> Option<u64> {
        parse_offset(&self.offset)
    }
}

/// Instance fields declared directly in `body`, in declaration order.
///
/// Lines inside nested blocks (method bodies, nested types) are ignored.
/// Static and const members and generated bookkeeping names are dropped. A
/// field at offset 0 survives only as the first field of a struct.
pub fn parse_fields(body: &str, kind: DeclKind, rules: &ClassificationRules) -> Vec<RawField> {
    let mut fields: Vec<RawField> = Vec::new();
    let mut depth = 0isize;

    for line in body.lines() {
        let line_depth = depth;
        depth += brace_delta(line);
        if line_depth != 0 {
            continue;
        }

        let Some(caps) = FIELD_LINE.captures(line) else {
            continue;
        };
        let (Some(ty), Some(name), Some(offset)) =
            (caps.name("ty"), caps.name("name"), caps.name("offset"))
        else {
            continue;
        };
        let name = name.as_str();

        let mods = caps.name("mods").map(|m| m.as_str()).unwrap_or_default();
        if mods.split_whitespace().any(|m| m == "static" || m == "const") {
            continue;
        }
        if rules.is_generated_field(name) {
            tracing::debug!(field = name, "skipping generated field");
            continue;
        }

        let field = RawField {
            name: name.to_string(),
            declared_type: ty.as_str().trim().to_string(),
            offset: format!("0x{}", offset.as_str()),
        };
        if field.offset_value() == Some(0) && !(kind == DeclKind::Struct && fields.is_empty()) {
            tracing::debug!(field = name, "skipping offset-0 member");
            continue;
        }
        fields.push(field);
    }

    fields
}

/// Parse an enum body.
///
/// The storage type comes from the `value__` field, then the declared
/// `: type`, then `int`. Returns `None` when no member parses.
pub fn parse_enum(body: &str, declared_storage: Option<&str>) -> Option<EnumDef> {
    let underlying_type = ENUM_STORAGE
        .captures(body)
        .and_then(|c| c.name("ty"))
        .map(|m| m.as_str())
        .or(declared_storage)
        .unwrap_or("int")
        .to_string();

    let mut values = BTreeMap::new();
    for caps in ENUM_MEMBER.captures_iter(body) {
        let (Some(name), Some(value)) = (caps.name("name"), caps.name("value")) else {
            continue;
        };
        match value.as_str().parse::<i64>() {
            Ok(v) => {
                values.insert(name.as_str().to_string(), v);
            }
            Err(_) => tracing::debug!(member = name.as_str(), "enum value out of range"),
        }
    }

    if values.is_empty() {
        return None;
    }
    Some(EnumDef { underlying_type, values })
}
