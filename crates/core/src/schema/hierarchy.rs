//! Base-chain walks: inherited field flattening and template ancestry.

use std::collections::{BTreeMap, HashSet};

use crate::config::ClassificationRules;
use crate::dump::{parse_fields, DeclKind, Declaration, DumpIndex, RawField};
use crate::model::TemplateDef;

/// Longest base chain followed before the walk gives up.
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Fields of `type_name` flattened across its base chain, ancestor fields first.
///
/// The walk stops at a terminal root type, at a base that is not declared as a
/// class in the dump, at a repeated name, or after [`MAX_CHAIN_DEPTH`] levels.
/// A field name declared again lower in the chain shadows the inherited one:
/// the inherited occurrence is dropped and the derived one keeps its own
/// position.
pub fn collect_fields(
    index: &DumpIndex<'_>,
    rules: &ClassificationRules,
    type_name: &str,
) -> Vec<RawField> {
    let chain = base_chain(index, rules, type_name);

    let mut fields: Vec<RawField> = Vec::new();
    for decl in chain.iter().rev() {
        for field in parse_fields(decl.body, DeclKind::Class, rules) {
            if fields.iter().any(|f| f.name == field.name) {
                tracing::debug!(
                    class = %decl.name,
                    field = %field.name,
                    "field shadows an inherited field"
                );
                fields.retain(|f| f.name != field.name);
            }
            fields.push(field);
        }
    }
    fields
}

/// Declarations from `type_name` up to (not including) its terminal root.
fn base_chain<'i, 'a>(
    index: &'i DumpIndex<'a>,
    rules: &ClassificationRules,
    type_name: &str,
) -> Vec<&'i Declaration<'a>> {
    let mut chain = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = Some(type_name);

    while let Some(name) = current {
        if !visited.insert(name) {
            tracing::warn!(type_name, repeated = name, "inheritance cycle in base chain");
            break;
        }
        if chain.len() >= MAX_CHAIN_DEPTH {
            tracing::warn!(type_name, depth = MAX_CHAIN_DEPTH, "base chain too deep, truncated");
            break;
        }
        let Some(decl) = index.class(name) else {
            break;
        };
        chain.push(decl);
        current = decl.base_class.as_deref().filter(|base| !rules.is_terminal_root(base));
    }
    chain
}

/// Template ancestry of `type_name`, root to leaf, ending with `type_name`.
///
/// Only template names appear: the walk follows `base_class` while the parent
/// is itself in `templates` and stops at anything else or at a repeat.
pub fn ancestor_chain(templates: &BTreeMap<String, TemplateDef>, type_name: &str) -> Vec<String> {
    let mut chain = vec![type_name.to_string()];
    let mut current = type_name;

    while let Some(parent) = templates.get(current).and_then(|t| t.base_class.as_deref()) {
        if !templates.contains_key(parent) {
            break;
        }
        if chain.iter().any(|n| n == parent) {
            tracing::warn!(type_name, repeated = parent, "inheritance cycle in template chain");
            break;
        }
        if chain.len() >= MAX_CHAIN_DEPTH {
            tracing::warn!(type_name, depth = MAX_CHAIN_DEPTH, "template chain too deep, truncated");
            break;
        }
        chain.push(parent.to_string());
        current = parent;
    }

    chain.reverse();
    chain
}
