//! Naming-convention signals.
//!
//! Column names never decide anything on their own here: they break ties
//! between equally scored key candidates and gate the weaker foreign-key
//! confidence bands. Table names are singularized before comparison so
//! `customers.id` is recognised behind `customer_id`.

use inflector::Inflector;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Column names that look like surrogate or natural identifiers.
static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|_)(?i:id|key|pk|code|uuid|guid|no)$|[a-z0-9](?:Id|ID|Key)$").unwrap()
});

/// Identifier names that carry no information about the entity they belong to.
const GENERIC_IDENTIFIERS: &[&str] = &["id", "key", "pk", "uuid", "guid", "code"];

/// Irregular plurals the inflector gets wrong for schema vocabulary.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("half", "halves"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("crisis", "crises"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

/// Strength of the naming link between a column and a candidate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameAffinity {
    None,
    /// Shares a stem or an identifier suffix with the key.
    Loose,
    /// Spells out the referenced entity, e.g. `customer_id` → `customers.id`.
    Strong,
}

/// Singularize a table or word, handling irregulars before the inflector.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return singular.to_string();
        }
    }

    lower.to_singular()
}

/// Strip the schema qualifier from `schema.table`.
pub fn unqualified(table: &str) -> &str {
    table.rsplit('.').next().unwrap_or(table)
}

/// Whether a column name follows an identifier convention (`id`, `*_id`, `*_key`, `customerId`).
pub fn is_identifier_name(column: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(column)
}

fn is_generic_identifier(column: &str) -> bool {
    GENERIC_IDENTIFIERS.contains(&column)
}

fn normalize_source(column: &str) -> String {
    let lower = column.to_lowercase();
    let lower = lower.strip_prefix("fk_").unwrap_or(&lower);
    lower.strip_suffix("_fk").unwrap_or(lower).to_string()
}

/// Naming affinity between `source_column` and the key `target_table.target_column`.
///
/// ```ignore
/// assert_eq!(name_affinity("customer_id", "customers", "id"), NameAffinity::Strong);
/// assert_eq!(name_affinity("manager_id", "employees", "id"), NameAffinity::Loose);
/// assert_eq!(name_affinity("email", "customers", "id"), NameAffinity::None);
/// ```
pub fn name_affinity(source_column: &str, target_table: &str, target_column: &str) -> NameAffinity {
    let source = normalize_source(source_column);
    let target = target_column.to_lowercase();
    let table = unqualified(target_table).to_lowercase();
    let stem = singularize(&table);
    let generic = is_generic_identifier(&target);

    if source == target && !generic {
        return NameAffinity::Strong;
    }

    let spelled_out = [
        format!("{stem}_{target}"),
        format!("{stem}{target}"),
        format!("{table}_{target}"),
    ];
    if spelled_out.contains(&source) {
        return NameAffinity::Strong;
    }

    if source == target {
        return NameAffinity::Loose;
    }
    if generic && source.ends_with(&format!("_{target}")) {
        return NameAffinity::Loose;
    }
    if stem.len() >= 3 && source.contains(&stem) {
        return NameAffinity::Loose;
    }

    NameAffinity::None
}
