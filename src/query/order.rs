//! Order and highlight compiler
//!
//! Turns order descriptors into DSL sort entries, merges ad hoc sorts into
//! them, and builds highlight and inner hits fragments.

use crate::config::CompilerSettings;
use crate::query::descriptor::{AdHocSort, HighlightRequest, OrderKind, OrderSpec};
use crate::query::nodes::{self, filter_options};
use crate::query::resolver::FieldResolver;
use crate::Result;
use serde_json::{Map, Value};

pub const SORT_OPTIONS: &[&str] = &[
    "missing",
    "mode",
    "nested",
    "unmapped_type",
    "numeric_type",
    "format",
];

/// Keys an ad hoc sort may set on a sort entry
pub const AD_HOC_SORT_OPTIONS: &[&str] = &[
    "order",
    "missing",
    "mode",
    "nested",
    "unmapped_type",
    "numeric_type",
    "format",
];

pub const HIGHLIGHT_OPTIONS: &[&str] = &[
    "boundary_chars",
    "boundary_max_scan",
    "boundary_scanner",
    "boundary_scanner_locale",
    "encoder",
    "fragmenter",
    "fragment_offset",
    "fragment_size",
    "highlight_query",
    "matched_fields",
    "max_analyzed_offset",
    "no_match_size",
    "number_of_fragments",
    "order",
    "phrase_limit",
    "require_field_match",
    "tags_schema",
    "type",
];

/// Highlight every field when none is named
const ALL_FIELDS: &str = "*";

pub struct OrderCompiler<'a> {
    resolver: &'a FieldResolver,
    settings: &'a CompilerSettings,
}

impl<'a> OrderCompiler<'a> {
    pub fn new(resolver: &'a FieldResolver, settings: &'a CompilerSettings) -> Self {
        Self { resolver, settings }
    }

    /// Compile one sort entry
    pub fn compile_order(&self, order: &OrderSpec) -> Result<Value> {
        match &order.kind {
            OrderKind::Basic => {
                let field = self.resolver.resolve(&order.column)?;
                let mut body = filter_options(&order.options, SORT_OPTIONS);
                body.insert(
                    "order".to_string(),
                    Value::from(order.direction.as_str()),
                );
                let mut entry = Map::new();
                entry.insert(field, Value::Object(body));
                Ok(Value::Object(entry))
            }
            // distance sorts run on the geo field itself, never a keyword sub-field
            OrderKind::GeoDistance { point } => Ok(nodes::geo_distance_sort(
                &order.column,
                point,
                order.direction.as_str(),
                &self.settings.geo_distance_unit,
                &order.options,
            )),
        }
    }

    /// Compile sort entries in order
    pub fn compile_orders(&self, orders: &[OrderSpec]) -> Result<Vec<Value>> {
        orders.iter().map(|order| self.compile_order(order)).collect()
    }

    /// Merge ad hoc sorts into compiled entries by resolved column
    ///
    /// Settings of a matching entry are overwritten key by key; sorts with no
    /// matching entry are appended in their given order.
    pub fn merge_sorts(&self, mut compiled: Vec<Value>, sorts: &[AdHocSort]) -> Result<Vec<Value>> {
        for sort in sorts {
            let field = self.resolver.resolve(&sort.column)?;
            let settings = filter_options(&sort.settings, AD_HOC_SORT_OPTIONS);

            let existing = compiled
                .iter_mut()
                .filter(|entry| entry.get(nodes::GEO_DISTANCE_SORT_FIELD).is_none())
                .find_map(|entry| entry.get_mut(field.as_str()).and_then(Value::as_object_mut));

            match existing {
                Some(body) => body.extend(settings),
                None => {
                    let mut entry = Map::new();
                    entry.insert(field, Value::Object(settings));
                    compiled.push(Value::Object(entry));
                }
            }
        }
        Ok(compiled)
    }

    /// Compile a highlight request
    pub fn compile_highlight(&self, request: &HighlightRequest) -> Value {
        let mut fields = Map::new();
        if request.fields.is_empty() {
            fields.insert(ALL_FIELDS.to_string(), Value::Object(Map::new()));
        }
        for field in &request.fields {
            let settings = field
                .options
                .as_ref()
                .map(|options| filter_options(options, HIGHLIGHT_OPTIONS))
                .unwrap_or_default();
            fields.insert(field.name.clone(), Value::Object(settings));
        }

        let pre_tags = request
            .pre_tags
            .clone()
            .unwrap_or_else(|| vec![self.settings.highlight_pre_tag.clone()]);
        let post_tags = request
            .post_tags
            .clone()
            .unwrap_or_else(|| vec![self.settings.highlight_post_tag.clone()]);

        let mut body = filter_options(&request.options, HIGHLIGHT_OPTIONS);
        body.insert("pre_tags".to_string(), Value::from(pre_tags));
        body.insert("post_tags".to_string(), Value::from(post_tags));
        body.insert("fields".to_string(), Value::Object(fields));
        Value::Object(body)
    }

    /// Bounded `inner_hits` for a nested scope
    pub fn inner_hits(
        &self,
        orders: &[OrderSpec],
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Value> {
        Ok(nodes::inner_hits(self.compile_orders(orders)?, offset, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::{Direction, GeoPoint, Options};
    use crate::schema::{FieldMap, StaticMappingProvider};
    use serde_json::json;
    use std::sync::Arc;

    fn resolver() -> FieldResolver {
        let fields = FieldMap::from_pairs([
            ("name", "text"),
            ("name.keyword", "keyword"),
            ("age", "integer"),
            ("location", "geo_point"),
        ]);
        FieldResolver::new(
            "people",
            Arc::new(StaticMappingProvider::new().with_index("people", fields)),
        )
    }

    #[test]
    fn test_basic_order_resolves_and_filters() {
        let resolver = resolver();
        let settings = CompilerSettings::default();
        let compiler = OrderCompiler::new(&resolver, &settings);

        let order = OrderSpec::desc("name")
            .with_option("missing", "_last")
            .with_option("boost", 2);
        assert_eq!(
            compiler.compile_order(&order).unwrap(),
            json!({ "name.keyword": { "order": "desc", "missing": "_last" } })
        );
        assert_eq!(
            compiler.compile_order(&OrderSpec::asc("_score")).unwrap(),
            json!({ "_score": { "order": "asc" } })
        );
    }

    #[test]
    fn test_geo_order_skips_resolution() {
        let resolver = resolver();
        let settings = CompilerSettings::default();
        let compiler = OrderCompiler::new(&resolver, &settings);

        let order = OrderSpec::geo_distance("pin", GeoPoint::new(1.0, 2.0), Direction::Asc)
            .with_option("mode", "min");
        assert_eq!(
            compiler.compile_order(&order).unwrap(),
            json!({ "_geo_distance": {
                "pin": { "lat": 1.0, "lon": 2.0 },
                "order": "asc",
                "unit": "km",
                "mode": "min"
            } })
        );
    }

    #[test]
    fn test_merge_sorts() {
        let resolver = resolver();
        let settings = CompilerSettings::default();
        let compiler = OrderCompiler::new(&resolver, &settings);

        let compiled = compiler.compile_orders(&[OrderSpec::asc("name")]).unwrap();
        let mut missing = Options::new();
        missing.insert("missing".to_string(), json!("_first"));
        missing.insert("junk".to_string(), json!(1));
        let sorts = vec![
            AdHocSort::new("name", missing),
            AdHocSort::direction("age", Direction::Desc),
        ];

        assert_eq!(
            compiler.merge_sorts(compiled, &sorts).unwrap(),
            vec![
                json!({ "name.keyword": { "order": "asc", "missing": "_first" } }),
                json!({ "age": { "order": "desc" } }),
            ]
        );
    }

    #[test]
    fn test_merge_sorts_skips_geo_entries() {
        let resolver = resolver().with_bypass(true);
        let settings = CompilerSettings::default();
        let compiler = OrderCompiler::new(&resolver, &settings);

        let geo = OrderSpec::geo_distance("location", GeoPoint::new(1.0, 2.0), Direction::Asc);
        let compiled = compiler.compile_orders(&[geo]).unwrap();
        let sorts = vec![AdHocSort::direction(
            nodes::GEO_DISTANCE_SORT_FIELD,
            Direction::Desc,
        )];

        let merged = compiler.merge_sorts(compiled.clone(), &sorts).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], compiled[0]);
        assert_eq!(merged[1], json!({ "_geo_distance": { "order": "desc" } }));
    }

    #[test]
    fn test_highlight_defaults() {
        let resolver = resolver();
        let settings = CompilerSettings::default();
        let compiler = OrderCompiler::new(&resolver, &settings);

        let request = HighlightRequest::new().with_option("fragment_size", 150).with_option("size", 3);
        assert_eq!(
            compiler.compile_highlight(&request),
            json!({
                "fragment_size": 150,
                "pre_tags": ["<em>"],
                "post_tags": ["</em>"],
                "fields": { "*": {} }
            })
        );
    }

    #[test]
    fn test_highlight_per_field() {
        let resolver = resolver();
        let settings = CompilerSettings::default();
        let compiler = OrderCompiler::new(&resolver, &settings);

        let request = HighlightRequest::new()
            .field("title")
            .field_with(
                "body",
                json!({ "number_of_fragments": 2, "nope": 1 })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .with_tags("<b>", "</b>");
        assert_eq!(
            compiler.compile_highlight(&request),
            json!({
                "pre_tags": ["<b>"],
                "post_tags": ["</b>"],
                "fields": {
                    "title": {},
                    "body": { "number_of_fragments": 2 }
                }
            })
        );
    }

    #[test]
    fn test_inner_hits() {
        let resolver = resolver();
        let settings = CompilerSettings::default();
        let compiler = OrderCompiler::new(&resolver, &settings);

        assert_eq!(
            compiler.inner_hits(&[OrderSpec::asc("age")], Some(10), Some(5)).unwrap(),
            json!({ "sort": [{ "age": { "order": "asc" } }], "from": 10, "size": 5 })
        );
        assert_eq!(compiler.inner_hits(&[], None, None).unwrap(), json!({}));
    }
}
