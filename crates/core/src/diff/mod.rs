//! Schema comparison.
//!
//! The differ compares two [`Schema`] snapshots grain by grain (enums, structs,
//! templates) and reports what changed as severity-tagged [`ChangeRecord`]s.
//! Anything that silently corrupts extraction against the new build (a moved
//! field, a renumbered enum value, a resized struct) is [`Severity::Crit`].
//!
//! Records within a section are ordered: added names, removed names, then
//! changed names, each group sorted by name.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{parse_offset, EnumDef, FieldDef, Schema, StructDef, TemplateDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Add,
    Del,
    Chg,
    Crit,
    Warn,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Add => "ADD",
            Severity::Del => "DEL",
            Severity::Chg => "CHG",
            Severity::Crit => "CRIT",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
        }
    }

    /// Five-column tag used in text reports. Detail lines get a blank tag.
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Add => " ADD ",
            Severity::Del => " DEL ",
            Severity::Chg => " CHG ",
            Severity::Crit => "CRIT ",
            Severity::Warn => "WARN ",
            Severity::Info => "     ",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub severity: Severity,
    pub message: String,
}

impl ChangeRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into() }
    }
}

/// Full comparison of two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    pub old_hash: String,
    pub new_hash: String,
    pub enums: Vec<ChangeRecord>,
    pub structs: Vec<ChangeRecord>,
    pub templates: Vec<ChangeRecord>,
}

impl SchemaDiff {
    pub fn between(old: &Schema, new: &Schema) -> Self {
        Self {
            old_hash: old.content_hash.clone(),
            new_hash: new.content_hash.clone(),
            enums: diff_enums(&old.enums, &new.enums),
            structs: diff_structs(&old.structs, &new.structs),
            templates: diff_templates(&old.templates, &new.templates),
        }
    }

    /// Sections in report order.
    pub fn sections(&self) -> [(&'static str, &[ChangeRecord]); 3] {
        [
            ("Enums", self.enums.as_slice()),
            ("Structs", self.structs.as_slice()),
            ("Templates", self.templates.as_slice()),
        ]
    }

    pub fn records(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.enums.iter().chain(&self.structs).chain(&self.templates)
    }

    pub fn is_empty(&self) -> bool {
        self.records().next().is_none()
    }

    /// Records other than detail lines.
    pub fn change_count(&self) -> usize {
        self.records().filter(|r| r.severity != Severity::Info).count()
    }

    pub fn critical_count(&self) -> usize {
        self.records().filter(|r| r.severity == Severity::Crit).count()
    }

    pub fn has_critical(&self) -> bool {
        self.critical_count() > 0
    }
}

struct KeyDelta<'a> {
    added: Vec<&'a String>,
    removed: Vec<&'a String>,
    common: Vec<&'a String>,
}

fn key_delta<'a, V>(
    old: &'a BTreeMap<String, V>,
    new: &'a BTreeMap<String, V>,
) -> KeyDelta<'a> {
    KeyDelta {
        added: new.keys().filter(|k| !old.contains_key(*k)).collect(),
        removed: old.keys().filter(|k| !new.contains_key(*k)).collect(),
        common: old.keys().filter(|k| new.contains_key(*k)).collect(),
    }
}

pub fn diff_enums(
    old: &BTreeMap<String, EnumDef>,
    new: &BTreeMap<String, EnumDef>,
) -> Vec<ChangeRecord> {
    let mut out = Vec::new();
    let delta = key_delta(old, new);

    if !delta.added.is_empty() {
        out.push(ChangeRecord::new(Severity::Add, format!("{} new enums", delta.added.len())));
        for name in &delta.added {
            let count = new[*name].values.len();
            out.push(ChangeRecord::new(Severity::Info, format!("  + {name} ({count} values)")));
        }
    }
    if !delta.removed.is_empty() {
        out.push(ChangeRecord::new(Severity::Del, format!("{} removed enums", delta.removed.len())));
        for name in &delta.removed {
            out.push(ChangeRecord::new(Severity::Info, format!("  - {name}")));
        }
    }

    for name in delta.common {
        let (was, now) = (&old[name], &new[name]);
        if was.underlying_type != now.underlying_type {
            out.push(ChangeRecord::new(
                Severity::Crit,
                format!("{name}: storage type {} -> {}", was.underlying_type, now.underlying_type),
            ));
        }

        let values = key_delta(&was.values, &now.values);
        let changed: Vec<&String> =
            values.common.into_iter().filter(|v| was.values[*v] != now.values[*v]).collect();
        if values.added.is_empty() && values.removed.is_empty() && changed.is_empty() {
            continue;
        }

        out.push(ChangeRecord::new(
            Severity::Chg,
            format!(
                "{name}: +{} -{} ~{} values",
                values.added.len(),
                values.removed.len(),
                changed.len()
            ),
        ));
        for v in values.added {
            out.push(ChangeRecord::new(Severity::Info, format!("  + {v} = {}", now.values[v])));
        }
        for v in values.removed {
            out.push(ChangeRecord::new(Severity::Info, format!("  - {v} = {}", was.values[v])));
        }
        for v in changed {
            out.push(ChangeRecord::new(
                Severity::Crit,
                format!("  ~ {v}: {} -> {}", was.values[v], now.values[v]),
            ));
        }
    }

    out
}

pub fn diff_structs(
    old: &BTreeMap<String, StructDef>,
    new: &BTreeMap<String, StructDef>,
) -> Vec<ChangeRecord> {
    let mut out = Vec::new();
    let delta = key_delta(old, new);

    if !delta.added.is_empty() {
        out.push(ChangeRecord::new(Severity::Add, format!("{} new structs", delta.added.len())));
        for name in &delta.added {
            out.push(ChangeRecord::new(Severity::Info, format!("  + {name}")));
        }
    }
    if !delta.removed.is_empty() {
        out.push(ChangeRecord::new(
            Severity::Del,
            format!("{} removed structs", delta.removed.len()),
        ));
        for name in &delta.removed {
            out.push(ChangeRecord::new(Severity::Info, format!("  - {name}")));
        }
    }

    for name in delta.common {
        let (was, now) = (old[name].size_bytes, new[name].size_bytes);
        if was != now {
            out.push(ChangeRecord::new(
                Severity::Crit,
                format!("{name}: size changed {was} -> {now}"),
            ));
        }
    }

    out
}

/// Offsets compare by numeric value when both parse, otherwise as text.
fn same_offset(a: &str, b: &str) -> bool {
    match (parse_offset(a), parse_offset(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

pub fn diff_templates(
    old: &BTreeMap<String, TemplateDef>,
    new: &BTreeMap<String, TemplateDef>,
) -> Vec<ChangeRecord> {
    let mut out = Vec::new();
    let delta = key_delta(old, new);

    if !delta.added.is_empty() {
        out.push(ChangeRecord::new(
            Severity::Add,
            format!("{} new templates", delta.added.len()),
        ));
        for name in &delta.added {
            let count = new[*name].fields.len();
            out.push(ChangeRecord::new(Severity::Info, format!("  + {name} ({count} fields)")));
        }
    }
    if !delta.removed.is_empty() {
        out.push(ChangeRecord::new(
            Severity::Del,
            format!("{} removed templates", delta.removed.len()),
        ));
        for name in &delta.removed {
            out.push(ChangeRecord::new(Severity::Info, format!("  - {name}")));
        }
    }

    let mut offset_changes = 0usize;
    for name in delta.common {
        let was = fields_by_name(&old[name].fields);
        let now = fields_by_name(&new[name].fields);
        let fields = key_delta(&was, &now);

        let mut details = Vec::new();
        for f in fields.added {
            let def = now[f];
            details.push(ChangeRecord::new(
                Severity::Info,
                format!("  + {f}: {} @ {}", def.declared_type, def.offset),
            ));
        }
        for f in fields.removed {
            let def = was[f];
            details.push(ChangeRecord::new(
                Severity::Info,
                format!("  - {f}: {} @ {}", def.declared_type, def.offset),
            ));
        }

        let mut type_changes = Vec::new();
        for f in fields.common {
            let (a, b) = (was[f], now[f]);
            let type_changed = a.declared_type != b.declared_type;
            if !same_offset(&a.offset, &b.offset) {
                offset_changes += 1;
                let mut message = format!("  OFFSET {f}: {} -> {}", a.offset, b.offset);
                if type_changed {
                    message.push_str(&format!(" (type {} -> {})", a.declared_type, b.declared_type));
                }
                details.push(ChangeRecord::new(Severity::Crit, message));
            } else if type_changed {
                type_changes.push(ChangeRecord::new(
                    Severity::Warn,
                    format!("  TYPE {f}: {} -> {}", a.declared_type, b.declared_type),
                ));
            }
        }
        details.extend(type_changes);

        if !details.is_empty() {
            out.push(ChangeRecord::new(Severity::Chg, format!("{name}:")));
            out.extend(details);
        }
    }

    if offset_changes > 0 {
        out.insert(
            0,
            ChangeRecord::new(
                Severity::Crit,
                format!(
                    "*** {offset_changes} OFFSET CHANGES - extraction code must be regenerated ***"
                ),
            ),
        );
    }

    out
}

/// Later fields with a repeated name replace earlier ones.
fn fields_by_name(fields: &[FieldDef]) -> BTreeMap<String, &FieldDef> {
    fields.iter().map(|f| (f.name.clone(), f)).collect()
}

