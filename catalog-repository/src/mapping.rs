//! Index definitions: settings and field mappings.
//!
//! A mapping is an explicit `{field_name: {kind, analyzer?}}` structure handed to
//! the store when an index is created, so field indexing behavior is declared in
//! one place instead of being attached to the entity's fields.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How a field is indexed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Analysed full text. Supports match queries, not sorting or aggregations.
    Text,
    /// Exact, un-analysed string. Supports term queries, sorting and aggregations.
    Keyword,
    /// 64-bit integer.
    Long,
    /// 64-bit floating point number.
    Double,
    /// Boolean value.
    Boolean,
}

impl FieldKind {
    /// The type name used in search engine mappings.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Keyword => "keyword",
            FieldKind::Long => "long",
            FieldKind::Double => "double",
            FieldKind::Boolean => "boolean",
        }
    }

    /// Returns true for numeric kinds.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Long | FieldKind::Double)
    }

    /// Returns true if values of this kind can be sorted and aggregated on.
    pub fn has_doc_values(&self) -> bool {
        !matches!(self, FieldKind::Text)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping of a single field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldMapping {
    /// How the field is indexed.
    pub kind: FieldKind,
    /// Analyzer name, only meaningful for `Text` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
}

impl FieldMapping {
    /// A text field analysed with `analyzer`.
    pub fn text(analyzer: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Text,
            analyzer: Some(analyzer.into()),
        }
    }

    /// A text field using the default analyzer.
    pub fn standard_text() -> Self {
        Self {
            kind: FieldKind::Text,
            analyzer: None,
        }
    }

    /// An exact-match keyword field.
    pub fn keyword() -> Self {
        Self::of(FieldKind::Keyword)
    }

    /// A long integer field.
    pub fn long() -> Self {
        Self::of(FieldKind::Long)
    }

    /// A double precision field.
    pub fn double() -> Self {
        Self::of(FieldKind::Double)
    }

    /// A boolean field.
    pub fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            analyzer: None,
        }
    }
}

/// Field mappings of an index, keyed by field name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IndexMapping {
    pub fields: BTreeMap<String, FieldMapping>,
}

impl IndexMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field mapping, replacing any previous mapping for the same name.
    pub fn field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.fields.insert(name.into(), mapping);
        self
    }

    /// Look up the mapping of a field.
    pub fn get(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.get(name)
    }

    /// Returns true if no fields are mapped.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check whether `other` can be merged into this mapping.
    ///
    /// New fields are always accepted. A field already present must keep the same
    /// kind and analyzer. Returns a description of the first conflict.
    pub fn conflict_with(&self, other: &IndexMapping) -> Option<String> {
        other.fields.iter().find_map(|(name, incoming)| {
            let existing = self.fields.get(name)?;
            if existing.kind != incoming.kind {
                return Some(format!(
                    "mapper [{}] cannot be changed from type [{}] to [{}]",
                    name, existing.kind, incoming.kind
                ));
            }
            if existing.analyzer != incoming.analyzer {
                return Some(format!(
                    "mapper [{}] has different [analyzer]: [{}] vs [{}]",
                    name,
                    existing.analyzer.as_deref().unwrap_or("default"),
                    incoming.analyzer.as_deref().unwrap_or("default")
                ));
            }
            None
        })
    }

    /// Merge `other` into this mapping. Callers check `conflict_with` first.
    pub fn merge(&mut self, other: &IndexMapping) {
        for (name, mapping) in &other.fields {
            self.fields
                .entry(name.clone())
                .or_insert_with(|| mapping.clone());
        }
    }
}

/// Shard layout of an index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexSettings {
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

impl IndexSettings {
    /// Create settings with the given shard and replica counts.
    pub fn new(number_of_shards: u32, number_of_replicas: u32) -> Self {
        Self {
            number_of_shards,
            number_of_replicas,
        }
    }
}

/// Everything needed to create and map an index for one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    /// The index name.
    pub name: String,
    /// Shard layout.
    pub settings: IndexSettings,
    /// Field mappings.
    pub mapping: IndexMapping,
}

impl IndexDefinition {
    /// Create a new index definition.
    pub fn new(name: impl Into<String>, settings: IndexSettings, mapping: IndexMapping) -> Self {
        Self {
            name: name.into(),
            settings,
            mapping,
        }
    }
}
