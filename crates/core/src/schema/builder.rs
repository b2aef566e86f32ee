//! Dump text -> [`Schema`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use sha2::{Digest, Sha256};

use super::classify::{classify, KnownTypes};
use super::hierarchy::{ancestor_chain, collect_fields};
use crate::config::ClassificationRules;
use crate::dump::{parse_enum, parse_fields, DeclKind, DumpIndex, RawField};
use crate::model::{EmbeddedClassDef, FieldDef, Schema, StructDef, TemplateDef, SCHEMA_VERSION};

/// Build a schema from dump text using the built-in rules.
pub fn build(text: &str) -> Schema {
    let rules = ClassificationRules::default();
    SchemaBuilder::new(&rules).build(text)
}

/// Hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Runs every parsing phase over one dump with a fixed rule set.
pub struct SchemaBuilder<'r> {
    rules: &'r ClassificationRules,
}

/// A template after flattening, before its fields are classified.
struct PendingTemplate {
    base_class: Option<String>,
    is_abstract: bool,
    fields: Vec<RawField>,
}

impl<'r> SchemaBuilder<'r> {
    pub fn new(rules: &'r ClassificationRules) -> Self {
        Self { rules }
    }

    /// Build from raw dump bytes. The hash covers the bytes exactly as given;
    /// invalid UTF-8 is replaced before parsing.
    pub fn build_bytes(&self, bytes: &[u8]) -> Schema {
        let text = String::from_utf8_lossy(bytes);
        self.assemble(&text, content_hash(bytes))
    }

    pub fn build(&self, text: &str) -> Schema {
        self.assemble(text, content_hash(text.as_bytes()))
    }

    fn assemble(&self, text: &str, content_hash: String) -> Schema {
        let index = DumpIndex::scan(text);
        tracing::debug!(declarations = index.len(), "indexed dump");

        let mut enums = BTreeMap::new();
        for decl in index.of_kind(DeclKind::Enum) {
            match parse_enum(decl.body, decl.base_class.as_deref()) {
                Some(def) => {
                    enums.insert(decl.name.clone(), def);
                }
                None => tracing::debug!(name = %decl.name, "enum without members skipped"),
            }
        }
        tracing::info!(count = enums.len(), "parsed enums");

        let mut raw_structs: BTreeMap<String, Vec<RawField>> = BTreeMap::new();
        for decl in index.of_kind(DeclKind::Struct) {
            let fields = parse_fields(decl.body, DeclKind::Struct, self.rules);
            if fields.is_empty() {
                tracing::debug!(name = %decl.name, "struct without fields skipped");
                continue;
            }
            raw_structs.insert(decl.name.clone(), fields);
        }
        tracing::info!(count = raw_structs.len(), "parsed structs");

        let mut pending: BTreeMap<String, PendingTemplate> = BTreeMap::new();
        for decl in index.of_kind(DeclKind::Class) {
            if !self.rules.is_template_name(&decl.name) {
                continue;
            }
            let fields = collect_fields(&index, self.rules, &decl.name);
            pending.insert(
                decl.name.clone(),
                PendingTemplate {
                    base_class: decl.base_class.clone(),
                    is_abstract: decl.is_abstract,
                    fields,
                },
            );
        }
        tracing::info!(count = pending.len(), "flattened templates");

        // Every name set is complete from here on; classification may start.
        let known = KnownTypes {
            enums: enums.keys().cloned().collect(),
            structs: raw_structs.keys().cloned().collect(),
            templates: pending.keys().cloned().collect(),
        };

        let structs: BTreeMap<String, StructDef> = raw_structs
            .into_iter()
            .map(|(name, raw)| {
                let highest = raw.iter().filter_map(RawField::offset_value).max().unwrap_or(0);
                let size_bytes = highest.saturating_add(4);
                (name, StructDef { size_bytes, fields: self.classify_all(raw, &known) })
            })
            .collect();

        let templates: BTreeMap<String, TemplateDef> = pending
            .into_iter()
            .map(|(name, t)| {
                let fields = self.classify_all(t.fields, &known);
                (name, TemplateDef { base_class: t.base_class, is_abstract: t.is_abstract, fields })
            })
            .collect();

        let mut inheritance = BTreeMap::new();
        for name in templates.keys() {
            let chain = ancestor_chain(&templates, name);
            if chain.len() >= 2 {
                inheritance.insert(name.clone(), chain);
            }
        }
        tracing::info!(count = inheritance.len(), "resolved inheritance chains");

        let embedded_classes = self.discover_embedded(&index, &known, &templates);
        tracing::info!(count = embedded_classes.len(), "discovered embedded classes");

        Schema {
            version: SCHEMA_VERSION.to_string(),
            content_hash,
            enums,
            structs,
            embedded_classes,
            templates,
            inheritance,
        }
    }

    fn classify_all(&self, raw: Vec<RawField>, known: &KnownTypes) -> Vec<FieldDef> {
        raw.into_iter()
            .map(|f| {
                let class = classify(&f.declared_type, known, self.rules);
                FieldDef {
                    name: f.name,
                    declared_type: f.declared_type,
                    offset: f.offset,
                    category: class.category,
                    element_type: class.element_type,
                }
            })
            .collect()
    }

    /// Worklist over collection element types that are not otherwise known.
    ///
    /// Each name is processed at most once. Newly parsed embedded classes feed
    /// their own collection element types back into the worklist, so the loop
    /// ends at the fixed point.
    fn discover_embedded(
        &self,
        index: &DumpIndex<'_>,
        known: &KnownTypes,
        templates: &BTreeMap<String, TemplateDef>,
    ) -> BTreeMap<String, EmbeddedClassDef> {
        let skip = self.rules.skip_types();
        let wanted = |name: &str| !known.contains(name) && !skip.contains(name);

        let mut worklist: BTreeSet<String> = templates
            .values()
            .flat_map(|t| &t.fields)
            .filter_map(|f| f.element_type.as_deref())
            .filter(|&e| wanted(e))
            .map(str::to_string)
            .collect();
        let mut processed: HashSet<String> = HashSet::new();
        let mut embedded = BTreeMap::new();

        while let Some(name) = worklist.pop_first() {
            if !processed.insert(name.clone()) {
                continue;
            }
            let Some(decl) = index.class(&name).filter(|d| !d.is_abstract) else {
                tracing::debug!(%name, "element type has no concrete class declaration");
                continue;
            };

            let raw: Vec<RawField> = parse_fields(decl.body, DeclKind::Class, self.rules)
                .into_iter()
                .filter(|f| !self.rules.embedded_skip_fields.contains(&f.name))
                .collect();
            if raw.is_empty() {
                continue;
            }

            let fields = self.classify_all(raw, known);
            for element in fields.iter().filter_map(|f| f.element_type.as_deref()) {
                if wanted(element) && !processed.contains(element) {
                    worklist.insert(element.to_string());
                }
            }
            embedded.insert(name, EmbeddedClassDef { base_class: decl.base_class.clone(), fields });
        }

        embedded
    }
}
