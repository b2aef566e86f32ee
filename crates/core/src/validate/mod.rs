//! Extraction validation.
//!
//! Checks previously extracted instance data against a schema, one concern at
//! a time:
//!
//! 1. template coverage: every concrete template has an instance file
//! 2. naming: instances carry real names, not positional placeholders
//! 3. field coverage: a representative instance has the schema's simple fields
//! 4. type validation: primitive values have the right JSON shape and range,
//!    and floats are not the huge garbage a stale offset produces
//!
//! Each check is a pure function over already loaded files and returns
//! [`CheckRecord`]s. [`validate`] runs all four and derives the [`Verdict`].

pub mod source;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use source::{DataDir, InstanceFile, InstanceSource, SourceError};

use crate::config::ValidationThresholds;
use crate::model::{FieldCategory, FieldDef, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Pass,
    Warn,
    Fail,
    Info,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Pass => "PASS",
            Level::Warn => "WARN",
            Level::Fail => "FAIL",
            Level::Info => "INFO",
        }
    }

    /// Five-column tag used in text reports.
    pub fn tag(self) -> &'static str {
        match self {
            Level::Pass => "PASS ",
            Level::Warn => "WARN ",
            Level::Fail => "FAIL ",
            Level::Info => "     ",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub level: Level,
    pub message: String,
}

impl CheckRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}

/// Overall outcome of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

impl Verdict {
    /// Process exit code: 0 pass, 1 soft failure, 2 hard failure.
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Pass => 0,
            Verdict::Warn => 1,
            Verdict::Fail => 2,
        }
    }
}

/// Instance files that exist, keyed by template name.
pub type LoadedFiles = BTreeMap<String, InstanceFile>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub coverage: Vec<CheckRecord>,
    pub naming: Vec<CheckRecord>,
    pub field_coverage: Vec<CheckRecord>,
    pub type_validation: Vec<CheckRecord>,
    /// No concrete template had an instance file; later checks were skipped.
    pub no_data: bool,
}

impl ValidationReport {
    pub fn sections(&self) -> [(&'static str, &[CheckRecord]); 4] {
        [
            ("Template Coverage", self.coverage.as_slice()),
            ("Instance Names", self.naming.as_slice()),
            ("Field Coverage", self.field_coverage.as_slice()),
            ("Type Validation", self.type_validation.as_slice()),
        ]
    }

    pub fn records(&self) -> impl Iterator<Item = &CheckRecord> {
        self.coverage
            .iter()
            .chain(&self.naming)
            .chain(&self.field_coverage)
            .chain(&self.type_validation)
    }

    pub fn count(&self, level: Level) -> usize {
        self.records().filter(|r| r.level == level).count()
    }

    pub fn verdict(&self) -> Verdict {
        if self.no_data || self.count(Level::Fail) > 0 {
            Verdict::Fail
        } else if self.count(Level::Warn) > 0 {
            Verdict::Warn
        } else {
            Verdict::Pass
        }
    }
}

/// Run every check of `schema` against the files in `source`.
pub fn validate(
    schema: &Schema,
    source: &dyn InstanceSource,
    thresholds: &ValidationThresholds,
) -> ValidationReport {
    let loaded = load_instances(schema, source);
    let coverage = check_template_coverage(schema, &loaded, thresholds);

    if loaded.is_empty() {
        tracing::warn!("no instance files found for any concrete template");
        return ValidationReport {
            coverage,
            naming: Vec::new(),
            field_coverage: Vec::new(),
            type_validation: Vec::new(),
            no_data: true,
        };
    }

    ValidationReport {
        coverage,
        naming: check_instance_names(&loaded, thresholds),
        field_coverage: check_field_coverage(schema, &loaded, thresholds),
        type_validation: check_type_validation(schema, &loaded, thresholds),
        no_data: false,
    }
}

/// Read the instance file of every concrete template that has one.
pub fn load_instances(schema: &Schema, source: &dyn InstanceSource) -> LoadedFiles {
    schema
        .concrete_templates()
        .filter_map(|(name, _)| source.load(name).map(|file| (name.clone(), file)))
        .collect()
}

pub fn check_template_coverage(
    schema: &Schema,
    loaded: &LoadedFiles,
    thresholds: &ValidationThresholds,
) -> Vec<CheckRecord> {
    let expected: BTreeSet<&String> = schema.concrete_templates().map(|(name, _)| name).collect();
    let abstract_count = schema.templates.len() - expected.len();
    let found = expected.iter().filter(|name| loaded.contains_key(name.as_str())).count();
    let missing: Vec<&&String> =
        expected.iter().filter(|name| !loaded.contains_key(name.as_str())).collect();

    let level = if missing.is_empty() {
        Level::Pass
    } else if ratio(found, expected.len()) >= thresholds.coverage_warn_ratio {
        Level::Warn
    } else {
        Level::Fail
    };

    let mut out = vec![CheckRecord::new(
        level,
        format!(
            "{found}/{} types have output ({abstract_count} abstract, expected no output)",
            expected.len()
        ),
    )];
    for name in missing {
        out.push(CheckRecord::new(Level::Info, format!("  Missing: {name}")));
    }
    out
}

pub fn check_instance_names(
    loaded: &LoadedFiles,
    thresholds: &ValidationThresholds,
) -> Vec<CheckRecord> {
    let mut out = Vec::new();

    for (template, file) in loaded {
        let instances = match file {
            InstanceFile::Unreadable(_) => {
                out.push(CheckRecord::new(Level::Fail, format!("{template}: Could not read JSON")));
                continue;
            }
            InstanceFile::NotAList => {
                out.push(CheckRecord::new(Level::Warn, format!("{template}: Not a list")));
                continue;
            }
            InstanceFile::Instances(items) if items.is_empty() => {
                out.push(CheckRecord::new(Level::Warn, format!("{template}: Empty file")));
                continue;
            }
            InstanceFile::Instances(items) => items,
        };

        let total = instances.len();
        let named = instances
            .iter()
            .filter_map(instance_name)
            .filter(|n| !n.starts_with(&thresholds.placeholder_name_prefix))
            .count();
        let share = ratio(named, total);

        let level = if named == total {
            Level::Pass
        } else if share >= thresholds.naming_warn_ratio {
            Level::Warn
        } else {
            Level::Fail
        };
        out.push(CheckRecord::new(
            level,
            format!("{template}: {named}/{total} named ({:.0}%)", share * 100.0),
        ));
    }

    out
}

pub fn check_field_coverage(
    schema: &Schema,
    loaded: &LoadedFiles,
    thresholds: &ValidationThresholds,
) -> Vec<CheckRecord> {
    let mut out = Vec::new();

    for (template, file) in loaded {
        let Some(def) = schema.templates.get(template) else {
            continue;
        };
        let Some(sample) = file.instances().and_then(representative) else {
            continue;
        };

        let expected: BTreeSet<&str> = def
            .fields
            .iter()
            .filter(|f| f.category.is_simple())
            .map(|f| f.name.as_str())
            .collect();
        let skipped = def.fields.iter().filter(|f| !f.category.is_simple()).count();
        if expected.is_empty() {
            continue;
        }

        let keys: BTreeSet<&str> = sample
            .keys()
            .map(String::as_str)
            .filter(|k| !thresholds.ignored_instance_keys.contains(*k))
            .collect();
        let missing: Vec<&str> = expected.difference(&keys).copied().collect();
        let present = expected.len() - missing.len();
        let share = ratio(present, expected.len());

        let level = if share >= thresholds.field_pass_ratio {
            Level::Pass
        } else if share >= thresholds.field_warn_ratio {
            Level::Warn
        } else {
            Level::Fail
        };

        let mut message = format!("{template}: {present}/{} fields", expected.len());
        if skipped > 0 {
            message.push_str(&format!(" ({skipped} complex skipped)"));
        }
        out.push(CheckRecord::new(level, message));

        if level != Level::Pass {
            out.extend(
                missing
                    .iter()
                    .take(thresholds.max_detail_lines)
                    .map(|m| CheckRecord::new(Level::Info, format!("  Missing: {m}"))),
            );
        }
    }

    out
}

pub fn check_type_validation(
    schema: &Schema,
    loaded: &LoadedFiles,
    thresholds: &ValidationThresholds,
) -> Vec<CheckRecord> {
    let mut out = Vec::new();

    for (template, file) in loaded {
        let Some(def) = schema.templates.get(template) else {
            continue;
        };
        let Some(instances) = file.instances() else {
            continue;
        };

        let checked: BTreeMap<&str, &FieldDef> = def
            .fields
            .iter()
            .filter(|f| f.category == FieldCategory::Primitive)
            .map(|f| (f.name.as_str(), f))
            .collect();

        let mut errors = Vec::new();
        for instance in instances.iter().take(thresholds.type_check_sample) {
            let Some(obj) = instance.as_object() else {
                continue;
            };
            let label = obj.get("name").map(display_value).unwrap_or_else(|| "?".to_string());

            for (field, def) in &checked {
                let Some(value) = obj.get(*field) else {
                    continue;
                };
                if let Some(problem) = check_value(&def.declared_type, value, thresholds) {
                    errors.push(format!("{template}.{field}[{label}]: {problem}"));
                }
            }
        }

        if errors.is_empty() {
            let has_data = instances
                .iter()
                .take(5)
                .any(|i| i.as_object().is_some_and(|o| o.len() > 1));
            if has_data {
                out.push(CheckRecord::new(
                    Level::Pass,
                    format!("{template}: all values match expected types"),
                ));
            }
            continue;
        }

        out.push(CheckRecord::new(Level::Fail, format!("{template}: {} type errors", errors.len())));
        let shown = thresholds.max_detail_lines;
        out.extend(
            errors.iter().take(shown).map(|e| CheckRecord::new(Level::Info, format!("  {e}"))),
        );
        if errors.len() > shown {
            out.push(CheckRecord::new(
                Level::Info,
                format!("  ... and {} more", errors.len() - shown),
            ));
        }
    }

    out
}

/// JSON shape a primitive declared type must have.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ValueKind {
    Integer { min: i128, max: i128 },
    Float,
    Bool,
}

fn value_kind(declared_type: &str) -> Option<ValueKind> {
    let (min, max): (i128, i128) = match declared_type {
        "byte" | "Byte" => (0, u8::MAX.into()),
        "sbyte" | "SByte" => (i8::MIN.into(), i8::MAX.into()),
        "short" | "Int16" => (i16::MIN.into(), i16::MAX.into()),
        "ushort" | "UInt16" => (0, u16::MAX.into()),
        "int" | "Int32" => (i32::MIN.into(), i32::MAX.into()),
        "uint" | "UInt32" => (0, u32::MAX.into()),
        "long" | "Int64" => (i64::MIN.into(), i64::MAX.into()),
        "ulong" | "UInt64" => (0, u64::MAX.into()),
        "float" | "Single" | "double" | "Double" => return Some(ValueKind::Float),
        "bool" | "Boolean" => return Some(ValueKind::Bool),
        _ => return None,
    };
    Some(ValueKind::Integer { min, max })
}

/// Description of what is wrong with `value`, if anything.
fn check_value(
    declared_type: &str,
    value: &Value,
    thresholds: &ValidationThresholds,
) -> Option<String> {
    let mismatch = || format!("expected {declared_type}, got {}={value}", json_kind(value));

    match value_kind(declared_type)? {
        ValueKind::Integer { min, max } => {
            let n = value.as_i64().map(i128::from).or_else(|| value.as_u64().map(i128::from));
            match n {
                Some(n) if (min..=max).contains(&n) => None,
                _ => Some(mismatch()),
            }
        }
        ValueKind::Float => {
            let Some(x) = value.as_f64() else {
                return Some(mismatch());
            };
            if x.abs() > thresholds.garbage_float_magnitude {
                Some(format!(
                    "expected {declared_type}, got {x:.3e} (garbage - wrong offset?)"
                ))
            } else {
                None
            }
        }
        ValueKind::Bool => (!value.is_boolean()).then(mismatch),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Non-empty `name` of an object instance.
fn instance_name(instance: &Value) -> Option<&str> {
    instance.get("name").and_then(Value::as_str).filter(|n| !n.is_empty())
}

/// First named object instance, else the first instance when it is an object.
fn representative(instances: &[Value]) -> Option<&serde_json::Map<String, Value>> {
    instances
        .iter()
        .find(|i| instance_name(i).is_some())
        .or_else(|| instances.first())
        .and_then(Value::as_object)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}
