//! Clause, order and highlight descriptors
//!
//! Descriptors are produced by the query-builder layer, handed to the compiler
//! once and dropped afterwards. Clauses form a tree: nested and relationship
//! kinds carry their own clause lists.

use crate::error::DslError;
use crate::query::types::{Combinator, Direction, GeoPoint, Operator, Options};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One atomic query condition plus how it joins its predecessors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClauseDescriptor {
    #[serde(flatten)]
    pub kind: ClauseKind,
    #[serde(default)]
    pub combinator: Combinator,
    /// Independent of the combinator: `and not` and `or not` both exist
    #[serde(default)]
    pub negate: bool,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

/// Kind-specific payload of a clause
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClauseKind {
    Basic {
        column: String,
        operator: Operator,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    Between {
        column: String,
        values: [Value; 2],
    },
    Match {
        column: String,
        value: Value,
    },
    Phrase {
        column: String,
        value: Value,
    },
    PhrasePrefix {
        column: String,
        value: Value,
    },
    Fuzzy {
        column: String,
        value: Value,
    },
    Term {
        column: String,
        value: Value,
    },
    Regex {
        column: String,
        value: String,
    },
    Prefix {
        column: String,
        value: String,
    },
    Script {
        source: String,
    },
    MultiMatch {
        columns: Vec<String>,
        value: Value,
    },
    QueryString {
        #[serde(default)]
        columns: Vec<String>,
        value: String,
    },
    Exists {
        column: String,
    },
    Date {
        column: String,
        operator: Operator,
        value: Value,
    },
    GeoDistance {
        column: String,
        point: GeoPoint,
        distance: String,
    },
    GeoBox {
        column: String,
        top_left: GeoPoint,
        bottom_right: GeoPoint,
    },
    Nested {
        path: String,
        clauses: Vec<ClauseDescriptor>,
    },
    /// Nested scope that still requires the path to exist when `clauses` is empty
    NestedObject {
        path: String,
        clauses: Vec<ClauseDescriptor>,
    },
    /// Nested scope returning the matching inner documents
    InnerNested {
        path: String,
        clauses: Vec<ClauseDescriptor>,
        #[serde(default)]
        orders: Vec<OrderSpec>,
        #[serde(default)]
        offset: Option<usize>,
        #[serde(default)]
        limit: Option<usize>,
    },
    FunctionScore {
        /// Score function name, e.g. `field_value_factor`
        function: String,
        #[serde(default)]
        params: Value,
        clauses: Vec<ClauseDescriptor>,
    },
    Parent {
        parent_type: String,
        #[serde(default)]
        query: Vec<ClauseDescriptor>,
        #[serde(default)]
        filter: Vec<ClauseDescriptor>,
    },
    Child {
        child_type: String,
        #[serde(default)]
        query: Vec<ClauseDescriptor>,
        #[serde(default)]
        filter: Vec<ClauseDescriptor>,
    },
    ParentId {
        child_type: String,
        id: Value,
    },
    Raw {
        query: Value,
    },
}

/// Tag names accepted in the `type` member of a serialized clause
pub const CLAUSE_KINDS: &[&str] = &[
    "basic",
    "in",
    "between",
    "match",
    "phrase",
    "phrase_prefix",
    "fuzzy",
    "term",
    "regex",
    "prefix",
    "script",
    "multi_match",
    "query_string",
    "exists",
    "date",
    "geo_distance",
    "geo_box",
    "nested",
    "nested_object",
    "inner_nested",
    "function_score",
    "parent",
    "child",
    "parent_id",
    "raw",
];

/// `column` under a nested `path`, unchanged when already there
pub fn scoped_column(path: &str, column: &str) -> String {
    let under = column.len() > path.len()
        && column.starts_with(path)
        && column.as_bytes()[path.len()] == b'.';
    if column == path || under {
        column.to_string()
    } else {
        format!("{}.{}", path, column)
    }
}

impl ClauseKind {
    /// Tag name of this kind
    pub fn name(&self) -> &'static str {
        match self {
            ClauseKind::Basic { .. } => "basic",
            ClauseKind::In { .. } => "in",
            ClauseKind::Between { .. } => "between",
            ClauseKind::Match { .. } => "match",
            ClauseKind::Phrase { .. } => "phrase",
            ClauseKind::PhrasePrefix { .. } => "phrase_prefix",
            ClauseKind::Fuzzy { .. } => "fuzzy",
            ClauseKind::Term { .. } => "term",
            ClauseKind::Regex { .. } => "regex",
            ClauseKind::Prefix { .. } => "prefix",
            ClauseKind::Script { .. } => "script",
            ClauseKind::MultiMatch { .. } => "multi_match",
            ClauseKind::QueryString { .. } => "query_string",
            ClauseKind::Exists { .. } => "exists",
            ClauseKind::Date { .. } => "date",
            ClauseKind::GeoDistance { .. } => "geo_distance",
            ClauseKind::GeoBox { .. } => "geo_box",
            ClauseKind::Nested { .. } => "nested",
            ClauseKind::NestedObject { .. } => "nested_object",
            ClauseKind::InnerNested { .. } => "inner_nested",
            ClauseKind::FunctionScore { .. } => "function_score",
            ClauseKind::Parent { .. } => "parent",
            ClauseKind::Child { .. } => "child",
            ClauseKind::ParentId { .. } => "parent_id",
            ClauseKind::Raw { .. } => "raw",
        }
    }

    /// Prefix every column of this clause with a nested path
    ///
    /// Columns already under the path are left alone. Sub-clauses are not
    /// visited; nested kinds scope their own clauses when compiled.
    fn scope_to(&mut self, path: &str) {
        let prefix = |column: &mut String| *column = scoped_column(path, column);

        match self {
            ClauseKind::Basic { column, .. }
            | ClauseKind::In { column, .. }
            | ClauseKind::Between { column, .. }
            | ClauseKind::Match { column, .. }
            | ClauseKind::Phrase { column, .. }
            | ClauseKind::PhrasePrefix { column, .. }
            | ClauseKind::Fuzzy { column, .. }
            | ClauseKind::Term { column, .. }
            | ClauseKind::Regex { column, .. }
            | ClauseKind::Prefix { column, .. }
            | ClauseKind::Exists { column }
            | ClauseKind::Date { column, .. }
            | ClauseKind::GeoDistance { column, .. }
            | ClauseKind::GeoBox { column, .. } => prefix(column),
            ClauseKind::MultiMatch { columns, .. } | ClauseKind::QueryString { columns, .. } => {
                columns.iter_mut().for_each(prefix)
            }
            ClauseKind::Nested { path: inner, .. }
            | ClauseKind::NestedObject { path: inner, .. }
            | ClauseKind::InnerNested { path: inner, .. } => prefix(inner),
            ClauseKind::Script { .. }
            | ClauseKind::FunctionScore { .. }
            | ClauseKind::Parent { .. }
            | ClauseKind::Child { .. }
            | ClauseKind::ParentId { .. }
            | ClauseKind::Raw { .. } => {}
        }
    }
}

impl ClauseDescriptor {
    /// Create an `and` clause with no options
    pub fn new(kind: ClauseKind) -> Self {
        Self {
            kind,
            combinator: Combinator::And,
            negate: false,
            options: Options::new(),
        }
    }

    /// Parse a serialized clause, rejecting unknown kinds up front
    pub fn from_value(value: &Value) -> Result<Self> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DslError::InvalidDescriptor("clause must have a 'type'".to_string()))?;

        if !CLAUSE_KINDS.contains(&tag) {
            return Err(DslError::UnsupportedClause(tag.to_string()));
        }

        Ok(serde_json::from_value(value.clone())?)
    }

    /// `column <operator> value`
    pub fn basic(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::new(ClauseKind::Basic {
            column: column.into(),
            operator,
            value: value.into(),
        })
    }

    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::basic(column, Operator::Eq, value)
    }

    pub fn in_values(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(ClauseKind::In {
            column: column.into(),
            values,
        })
    }

    pub fn between(column: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(ClauseKind::Between {
            column: column.into(),
            values: [low.into(), high.into()],
        })
    }

    pub fn matches(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(ClauseKind::Match {
            column: column.into(),
            value: value.into(),
        })
    }

    pub fn exists(column: impl Into<String>) -> Self {
        Self::new(ClauseKind::Exists {
            column: column.into(),
        })
    }

    pub fn nested(path: impl Into<String>, clauses: Vec<ClauseDescriptor>) -> Self {
        Self::new(ClauseKind::Nested {
            path: path.into(),
            clauses,
        })
    }

    pub fn raw(query: Value) -> Self {
        Self::new(ClauseKind::Raw { query })
    }

    /// Join with `or` instead of `and`
    pub fn or(mut self) -> Self {
        self.combinator = Combinator::Or;
        self
    }

    /// Negate the clause
    pub fn not(mut self) -> Self {
        self.negate = true;
        self
    }

    /// Add a DSL option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Copy of this clause with its columns scoped under a nested path
    pub fn scoped_to(&self, path: &str) -> Self {
        let mut scoped = self.clone();
        scoped.kind.scope_to(path);
        scoped
    }
}

/// Order entry kind
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderKind {
    #[default]
    Basic,
    /// Distance from a point, sorted on the engine's geo pseudo-field
    GeoDistance { point: GeoPoint },
}

/// One sort entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub column: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub kind: OrderKind,
    /// Missing-value policy, nested scope, geo unit/mode/distance type
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

impl OrderSpec {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
            kind: OrderKind::Basic,
            options: Options::new(),
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Desc)
    }

    pub fn geo_distance(column: impl Into<String>, point: GeoPoint, direction: Direction) -> Self {
        Self {
            kind: OrderKind::GeoDistance { point },
            ..Self::new(column, direction)
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Ad hoc sort settings merged into the compiled orders by column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdHocSort {
    pub column: String,
    pub settings: Options,
}

impl AdHocSort {
    pub fn new(column: impl Into<String>, settings: Options) -> Self {
        Self {
            column: column.into(),
            settings,
        }
    }

    /// Sort with only a direction
    pub fn direction(column: impl Into<String>, direction: Direction) -> Self {
        let mut settings = Options::new();
        settings.insert("order".to_string(), Value::from(direction.as_str()));
        Self::new(column, settings)
    }
}

/// Highlight request for one query
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightRequest {
    /// Fields to highlight, all fields when empty
    #[serde(default)]
    pub fields: Vec<HighlightField>,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub pre_tags: Option<Vec<String>>,
    #[serde(default)]
    pub post_tags: Option<Vec<String>>,
}

/// One highlighted field and its optional per-field settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HighlightField {
    pub name: String,
    #[serde(default)]
    pub options: Option<Options>,
}

impl HighlightRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(HighlightField {
            name: name.into(),
            options: None,
        });
        self
    }

    pub fn field_with(mut self, name: impl Into<String>, options: Options) -> Self {
        self.fields.push(HighlightField {
            name: name.into(),
            options: Some(options),
        });
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.pre_tags = Some(vec![pre.into()]);
        self.post_tags = Some(vec![post.into()]);
        self
    }
}
