//! Schema data model.
//!
//! A [`Schema`] is the immutable snapshot produced from one dump file. Its JSON
//! form is the contract read by the differ, the validator and every downstream
//! code generator, so field names here are part of a public format:
//!
//! - `version`, `dump_hash`
//! - `enums`, `structs`, `templates`, `embedded_classes` (name-keyed maps)
//! - `inheritance` (template name -> root-to-leaf template names)
//!
//! Maps are `BTreeMap`s so serialized output is stable across runs. Unknown keys
//! are ignored on read and unknown field categories read as
//! [`FieldCategory::Unknown`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format tag written into every schema.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Semantic category of a field's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum FieldCategory {
    Primitive,
    String,
    Enum,
    Struct,
    Reference,
    Collection,
    ExternalAsset,
    LocalizedText,
    Unknown,
}

impl From<String> for FieldCategory {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "primitive" => FieldCategory::Primitive,
            "string" => FieldCategory::String,
            "enum" => FieldCategory::Enum,
            "struct" => FieldCategory::Struct,
            "reference" => FieldCategory::Reference,
            "collection" => FieldCategory::Collection,
            "external_asset" | "unity_asset" => FieldCategory::ExternalAsset,
            "localized_text" | "localization" => FieldCategory::LocalizedText,
            _ => FieldCategory::Unknown,
        }
    }
}

impl FieldCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldCategory::Primitive => "primitive",
            FieldCategory::String => "string",
            FieldCategory::Enum => "enum",
            FieldCategory::Struct => "struct",
            FieldCategory::Reference => "reference",
            FieldCategory::Collection => "collection",
            FieldCategory::ExternalAsset => "external_asset",
            FieldCategory::LocalizedText => "localized_text",
            FieldCategory::Unknown => "unknown",
        }
    }

    /// Categories whose values show up as plain keys in extracted instances.
    pub fn is_simple(self) -> bool {
        !matches!(
            self,
            FieldCategory::Collection
                | FieldCategory::ExternalAsset
                | FieldCategory::LocalizedText
                | FieldCategory::Unknown
        )
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a struct, template or embedded class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Declared type exactly as written in the dump.
    #[serde(rename = "type", alias = "declared_type")]
    pub declared_type: String,
    /// Byte offset as a `0x`-prefixed hex string.
    pub offset: String,
    #[serde(default = "unknown_category")]
    pub category: FieldCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
}

fn unknown_category() -> FieldCategory {
    FieldCategory::Unknown
}

impl FieldDef {
    /// Numeric value of [`FieldDef::offset`], if it parses as hex.
    pub fn offset_value(&self) -> Option<u64> {
        parse_offset(&self.offset)
    }
}

/// Parse a `0x`-prefixed (or bare) hex offset.
pub fn parse_offset(offset: &str) -> Option<u64> {
    let digits = offset
        .trim()
        .strip_prefix("0x")
        .or_else(|| offset.trim().strip_prefix("0X"))
        .unwrap_or(offset.trim());
    u64::from_str_radix(digits, 16).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub underlying_type: String,
    pub values: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    /// Rough size estimate: highest field offset plus four bytes, saturating.
    pub size_bytes: u64,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub base_class: Option<String>,
    pub is_abstract: bool,
    /// Fields flattened across all ancestors, ancestor fields first.
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedClassDef {
    pub base_class: Option<String>,
    pub fields: Vec<FieldDef>,
}

/// Structured snapshot of one dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub version: String,
    /// Hex SHA-256 of the raw dump bytes.
    #[serde(rename = "dump_hash")]
    pub content_hash: String,
    #[serde(default)]
    pub enums: BTreeMap<String, EnumDef>,
    #[serde(default)]
    pub structs: BTreeMap<String, StructDef>,
    #[serde(default)]
    pub embedded_classes: BTreeMap<String, EmbeddedClassDef>,
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateDef>,
    #[serde(default)]
    pub inheritance: BTreeMap<String, Vec<String>>,
}

impl Schema {
    /// Names of templates that can have instances.
    pub fn concrete_templates(&self) -> impl Iterator<Item = (&String, &TemplateDef)> {
        self.templates.iter().filter(|(_, t)| !t.is_abstract)
    }

    pub fn summary(&self) -> SchemaSummary {
        let abstract_templates = self.templates.values().filter(|t| t.is_abstract).count();
        SchemaSummary {
            enums: self.enums.len(),
            structs: self.structs.len(),
            embedded_classes: self.embedded_classes.len(),
            templates: self.templates.len(),
            concrete_templates: self.templates.len() - abstract_templates,
            abstract_templates,
            template_fields: self.templates.values().map(|t| t.fields.len()).sum(),
            inheritance_chains: self.inheritance.len(),
        }
    }

    /// Read a schema JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaFileError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)
            .map_err(|source| SchemaFileError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&body)
            .map_err(|source| SchemaFileError::Parse { path: path.to_path_buf(), source })
    }

    /// Write the schema as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SchemaFileError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| SchemaFileError::Write { path: path.to_path_buf(), source })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| SchemaFileError::Parse { path: path.to_path_buf(), source })?;
        std::fs::write(path, json)
            .map_err(|source| SchemaFileError::Write { path: path.to_path_buf(), source })
    }
}

/// Counts reported after a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaSummary {
    pub enums: usize,
    pub structs: usize,
    pub embedded_classes: usize,
    pub templates: usize,
    pub concrete_templates: usize,
    pub abstract_templates: usize,
    pub template_fields: usize,
    pub inheritance_chains: usize,
}

/// Errors reading or writing schema files.
#[derive(Debug, Error)]
pub enum SchemaFileError {
    #[error("Failed to read schema {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid schema JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write schema {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
