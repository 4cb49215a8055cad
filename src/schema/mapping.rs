//! Index mapping definitions
//!
//! Mappings are read in the engine's own `_mapping` format and flattened into a
//! dotted path -> declared type table that the field resolver searches.

use super::field_type::FieldType;
use crate::error::DslError;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Field mapping as declared in an index mapping
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Declared type, absent for plain objects
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    /// Sub-properties (for object and nested types)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, FieldMapping>>,

    /// Multi-fields, e.g. a `keyword` sibling of a `text` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, FieldMapping>>,
}

impl FieldMapping {
    /// Create a new field mapping with the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Default::default()
        }
    }

    /// Create a text field mapping
    pub fn text() -> Self {
        Self::new(FieldType::Text)
    }

    /// Create a keyword field mapping
    pub fn keyword() -> Self {
        Self::new(FieldType::Keyword)
    }

    /// Create a text field with a `keyword` multi-field, the engine's dynamic default for strings
    pub fn text_with_keyword() -> Self {
        Self::text().with_subfield("keyword", Self::keyword())
    }

    /// Add a multi-field
    pub fn with_subfield(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), mapping);
        self
    }

    /// Add a sub-property (for object types)
    pub fn with_property(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), mapping);
        self
    }

    /// Effective type, plain objects have no declared type
    pub fn effective_type(&self) -> FieldType {
        self.field_type.clone().unwrap_or(FieldType::Object)
    }
}

/// Index mapping (schema) definition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    /// Field mappings
    #[serde(default)]
    pub properties: BTreeMap<String, FieldMapping>,
}

impl IndexMapping {
    /// Create a new empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field mapping
    pub fn field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.properties.insert(name.into(), mapping);
        self
    }

    /// Parse the body of an index's `mappings` section
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Parse a `GET <index>/_mapping` response for the given index
    ///
    /// Accepts `{index: {mappings: {...}}}`, `{mappings: {...}}` or a bare
    /// `{properties: {...}}` body.
    pub fn from_response(index: &str, response: &Value) -> Result<Self> {
        let body = response
            .get(index)
            .and_then(|v| v.get("mappings"))
            .or_else(|| response.get("mappings"))
            .unwrap_or(response);

        if !body.is_object() {
            return Err(DslError::MappingLookup {
                index: index.to_string(),
                reason: "mapping body must be a JSON object".to_string(),
            });
        }

        Self::from_value(body)
    }

    /// Flatten into a dotted path -> type table
    pub fn flatten(&self) -> FieldMap {
        let mut map = FieldMap::new();
        Self::collect(&self.properties, "", &mut map);
        map
    }

    fn collect(props: &BTreeMap<String, FieldMapping>, prefix: &str, map: &mut FieldMap) {
        for (name, mapping) in props {
            let full_name = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };

            map.insert(full_name.clone(), mapping.effective_type());

            if let Some(ref nested_props) = mapping.properties {
                Self::collect(nested_props, &full_name, map);
            }
            if let Some(ref multi_fields) = mapping.fields {
                Self::collect(multi_fields, &full_name, map);
            }
        }
    }
}

/// Flattened dotted field path -> declared type table for one index
///
/// Paths are kept sorted so lookups by prefix are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldType>,
}

impl FieldMap {
    /// Create an empty field map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(path, declared type)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let fields = pairs
            .into_iter()
            .map(|(path, ty)| (path.into(), FieldType::from_declared(ty.as_ref())))
            .collect();
        Self { fields }
    }

    /// Insert or replace a path
    pub fn insert(&mut self, path: impl Into<String>, field_type: FieldType) {
        self.fields.insert(path.into(), field_type);
    }

    /// Declared type of an exact path
    pub fn declared_type(&self, path: &str) -> Option<&FieldType> {
        self.fields.get(path)
    }

    /// First path at or below `name` that can serve exact match, sort and aggregation
    pub fn find_indexable(&self, name: &str) -> Option<&str> {
        self.fields
            .range::<str, _>((Bound::Included(name), Bound::Unbounded))
            .take_while(|(path, _)| path.starts_with(name))
            .find(|(path, ty)| is_at_or_below(path, name) && ty.is_indexable())
            .map(|(path, _)| path.as_str())
    }

    /// Paths equal to `name` or nested below it, in sorted order
    pub fn paths_under<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a FieldType)> + 'a {
        self.fields
            .range::<str, _>((Bound::Included(name), Bound::Unbounded))
            .take_while(move |(path, _)| path.starts_with(name))
            .filter(move |(path, _)| is_at_or_below(path, name))
            .map(|(path, ty)| (path.as_str(), ty))
    }

    /// Check if a path exists
    pub fn has_field(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all `(path, type)` pairs in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields.iter().map(|(path, ty)| (path.as_str(), ty))
    }
}

fn is_at_or_below(path: &str, name: &str) -> bool {
    path.len() == name.len() || path.as_bytes().get(name.len()) == Some(&b'.')
}

impl From<&IndexMapping> for FieldMap {
    fn from(mapping: &IndexMapping) -> Self {
        mapping.flatten()
    }
}
