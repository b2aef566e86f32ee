//! Declared type string -> field category.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ClassificationRules;
use crate::model::FieldCategory;

/// `List<T>`, optionally namespace-qualified.
static LIST_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[\w\.]+\.)?List<\s*(?P<elem>.+?)\s*>$").unwrap());

/// `T[]`, `T[,]` and friends.
static ARRAY_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<elem>.+?)\s*\[[,\s]*\]$").unwrap());

/// Type names declared in the dump, gathered before any field is classified.
#[derive(Debug, Clone, Default)]
pub struct KnownTypes {
    pub enums: BTreeSet<String>,
    pub structs: BTreeSet<String>,
    pub templates: BTreeSet<String>,
}

impl KnownTypes {
    pub fn contains(&self, name: &str) -> bool {
        self.enums.contains(name) || self.structs.contains(name) || self.templates.contains(name)
    }
}

/// Result of classifying one declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: FieldCategory,
    /// Element type of a collection.
    pub element_type: Option<String>,
}

impl Classification {
    fn plain(category: FieldCategory) -> Self {
        Self { category, element_type: None }
    }
}

/// Classify `declared_type`. The first matching rule wins, in this order:
/// primitive, string, known enum, known struct, localized text, external asset,
/// collection, known template, capitalized plain name, unknown.
pub fn classify(
    declared_type: &str,
    known: &KnownTypes,
    rules: &ClassificationRules,
) -> Classification {
    let ty = declared_type.trim();

    if rules.primitive_types.contains(ty) {
        return Classification::plain(FieldCategory::Primitive);
    }
    if rules.string_types.contains(ty) {
        return Classification::plain(FieldCategory::String);
    }
    if known.enums.contains(ty) {
        return Classification::plain(FieldCategory::Enum);
    }
    if known.structs.contains(ty) {
        return Classification::plain(FieldCategory::Struct);
    }
    if rules.localized_text_types.contains(ty) {
        return Classification::plain(FieldCategory::LocalizedText);
    }
    if rules.external_asset_types.contains(ty) {
        return Classification::plain(FieldCategory::ExternalAsset);
    }
    if let Some(element) = collection_element(ty) {
        return Classification {
            category: FieldCategory::Collection,
            element_type: Some(element.to_string()),
        };
    }
    if ty.ends_with(&rules.template_suffix) && known.templates.contains(ty) {
        return Classification::plain(FieldCategory::Reference);
    }
    if is_plain_type_name(ty) {
        return Classification::plain(FieldCategory::Reference);
    }
    Classification::plain(FieldCategory::Unknown)
}

/// Element type of a `List<T>` or array type.
pub fn collection_element(declared_type: &str) -> Option<&str> {
    let caps = LIST_TYPE.captures(declared_type).or_else(|| ARRAY_TYPE.captures(declared_type))?;
    caps.name("elem").map(|m| m.as_str())
}

fn is_plain_type_name(ty: &str) -> bool {
    ty.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && !ty.contains(['<', '>', '[', ']', '.'])
}
