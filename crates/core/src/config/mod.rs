//! Classification rules and validation thresholds.
//!
//! Every fixed list of type names the builder and validator care about lives
//! here, in one place: primitive and string type names, engine asset types,
//! localized-text wrappers, the terminal root types where inheritance walks
//! stop, and the framework types that are never treated as embedded game data.
//!
//! The defaults match an IL2CPP dump of a Unity game. A project can override any
//! part of them with a JSON or YAML config file; missing keys keep their default.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse YAML config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Unsupported config extension for {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),
}

/// Top-level config file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpscopeConfig {
    pub rules: ClassificationRules,
    pub validation: ValidationThresholds,
}

impl DumpscopeConfig {
    /// Load a config file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_lowercase();
        if !matches!(ext.as_str(), "json" | "yaml" | "yml") {
            return Err(ConfigError::UnsupportedFormat(path.to_path_buf()));
        }

        let body = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        let config = if ext == "json" {
            serde_json::from_str(&body)
                .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?
        } else {
            serde_yaml::from_str(&body)
                .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })?
        };
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// Fixed type-name sets and naming conventions used to read a dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationRules {
    /// Exact names classified as `primitive`.
    pub primitive_types: BTreeSet<String>,
    /// Exact names classified as `string`.
    pub string_types: BTreeSet<String>,
    /// Localized-text wrapper types.
    pub localized_text_types: BTreeSet<String>,
    /// Engine asset types that live outside the data tables.
    pub external_asset_types: BTreeSet<String>,
    /// Base types where an inheritance walk stops.
    pub terminal_root_types: BTreeSet<String>,
    /// Framework value/engine types never parsed as embedded classes.
    pub framework_types: BTreeSet<String>,
    /// Name suffix that marks a template class.
    pub template_suffix: String,
    /// Template-suffixed names containing any of these substrings are not templates.
    pub template_excluded_substrings: Vec<String>,
    /// Template-suffixed names that are not templates.
    pub template_excluded_names: BTreeSet<String>,
    /// Field-name prefixes emitted by the decompiler for its own bookkeeping.
    pub generated_field_prefixes: Vec<String>,
    /// Field-name substrings marking compiler-generated backing fields.
    pub generated_field_markers: Vec<String>,
    /// Field names dropped from embedded classes (back-references to the owner).
    pub embedded_skip_fields: BTreeSet<String>,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            primitive_types: set(&[
                "int", "Int32", "uint", "UInt32", "float", "Single", "bool", "Boolean", "byte",
                "Byte", "sbyte", "SByte", "short", "Int16", "ushort", "UInt16", "long", "Int64",
                "ulong", "UInt64", "double", "Double",
            ]),
            string_types: set(&["string", "String"]),
            localized_text_types: set(&["LocalizedLine", "LocalizedMultiLine"]),
            external_asset_types: set(&[
                "Sprite",
                "Texture2D",
                "Material",
                "Mesh",
                "AudioClip",
                "AnimationClip",
                "GameObject",
                "RuntimeAnimatorController",
            ]),
            terminal_root_types: set(&[
                "ScriptableObject",
                "MonoBehaviour",
                "Object",
                "SerializedScriptableObject",
            ]),
            framework_types: set(&[
                "Transform",
                "Component",
                "Color",
                "Vector2",
                "Vector3",
                "Vector4",
                "Quaternion",
                "Rect",
                "Bounds",
            ]),
            template_suffix: "Template".to_string(),
            template_excluded_substrings: vec!["Uxml".to_string()],
            template_excluded_names: set(&["DataTemplateLoader"]),
            generated_field_prefixes: vec!["NativeFieldInfoPtr".to_string(), "Il2Cpp".to_string()],
            generated_field_markers: vec!["k__BackingField".to_string()],
            embedded_skip_fields: set(&["Parent"]),
        }
    }
}

impl ClassificationRules {
    /// Names that embedded-class discovery never tries to parse.
    ///
    /// Derived from the other sets so the classifier and the discovery loop
    /// always agree on what counts as a framework type.
    pub fn skip_types(&self) -> BTreeSet<String> {
        self.primitive_types
            .iter()
            .chain(&self.string_types)
            .chain(&self.localized_text_types)
            .chain(&self.external_asset_types)
            .chain(&self.terminal_root_types)
            .chain(&self.framework_types)
            .cloned()
            .collect()
    }

    /// Whether a class name follows the template naming convention.
    pub fn is_template_name(&self, name: &str) -> bool {
        name.ends_with(&self.template_suffix)
            && !name.contains('.')
            && !self.template_excluded_substrings.iter().any(|s| name.contains(s.as_str()))
            && !self.template_excluded_names.contains(name)
    }

    /// Whether a field name is decompiler or compiler bookkeeping.
    pub fn is_generated_field(&self, name: &str) -> bool {
        self.generated_field_prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || self.generated_field_markers.iter().any(|m| name.contains(m.as_str()))
    }

    pub fn is_terminal_root(&self, name: &str) -> bool {
        self.terminal_root_types.contains(name)
    }
}

/// Ratios and limits used by the extraction validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    /// Minimum template coverage ratio for WARN instead of FAIL.
    pub coverage_warn_ratio: f64,
    /// Minimum named-instance ratio for WARN instead of FAIL.
    pub naming_warn_ratio: f64,
    /// Field coverage ratio needed for PASS.
    pub field_pass_ratio: f64,
    /// Field coverage ratio needed for WARN.
    pub field_warn_ratio: f64,
    /// Number of leading instances per file that get value checks.
    pub type_check_sample: usize,
    /// Float magnitude above which a value is treated as read from a stale offset.
    pub garbage_float_magnitude: f64,
    /// Prefix of the positional fallback names given to unnamed instances.
    pub placeholder_name_prefix: String,
    /// Instance keys that never correspond to schema fields.
    pub ignored_instance_keys: BTreeSet<String>,
    /// Maximum number of detail lines listed under one record.
    pub max_detail_lines: usize,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            coverage_warn_ratio: 0.70,
            naming_warn_ratio: 0.50,
            field_pass_ratio: 0.90,
            field_warn_ratio: 0.60,
            type_check_sample: 50,
            garbage_float_magnitude: 1e10,
            placeholder_name_prefix: "unknown_".to_string(),
            ignored_instance_keys: set(&["name", "_template_type"]),
            max_detail_lines: 5,
        }
    }
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}
