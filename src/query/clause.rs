//! Clause compiler
//!
//! Reduces an ordered clause list into one [`CompiledQuery`]. Each clause
//! first compiles to a leaf fragment, then a small fold decides where it goes:
//!
//! - `and` appends to the current AND run (`must`, or `must_not` when negated)
//! - `or` closes the current run as a disjunct and starts a new one
//!
//! When any disjunct was closed the result is `{"bool": {"should": [...]}}`.
//! Otherwise a single non-negated clause comes back bare, no clauses come back
//! as `match_all`, and anything else is the current run as a bool query.
//!
//! Where, filter and post-filter lists are compiled independently with the
//! same compiler.

use crate::config::CompilerSettings;
use crate::error::DslError;
use crate::query::compiled::{BoolGroup, CompiledQuery};
use crate::query::date::day_math;
use crate::query::descriptor::{scoped_column, ClauseDescriptor, ClauseKind};
use crate::query::nodes;
use crate::query::order::OrderCompiler;
use crate::query::resolver::FieldResolver;
use crate::query::types::{Combinator, Operator, Options};
use crate::Result;
use serde_json::Value;
use std::mem;
use tracing::trace;

/// Reducer state threaded through the clause fold
#[derive(Debug, Default)]
struct ClauseFold {
    current: BoolGroup,
    disjuncts: Vec<Value>,
    /// Plain clauses count 1, negated ones 2
    clause_count: usize,
    last_clause: Option<Value>,
}

impl ClauseFold {
    fn push(mut self, leaf: Value, combinator: Combinator, negated: bool) -> Self {
        if combinator == Combinator::Or {
            self.close_run();
        }

        if negated {
            self.current.must_not.push(leaf);
            self.clause_count += 2;
        } else {
            self.last_clause = Some(leaf.clone());
            self.current.must.push(leaf);
            self.clause_count += 1;
        }
        self
    }

    /// Move a non-empty current run into the disjunct list
    fn close_run(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let run = mem::take(&mut self.current);
        self.disjuncts.push(render_run(run));
    }

    fn finish(mut self) -> CompiledQuery {
        if !self.disjuncts.is_empty() {
            self.close_run();
            return CompiledQuery::Bool(BoolGroup {
                should: self.disjuncts,
                ..BoolGroup::default()
            });
        }

        if self.current.is_empty() {
            return CompiledQuery::MatchAll;
        }

        match (self.clause_count, self.last_clause) {
            (1, Some(leaf)) => CompiledQuery::Leaf(leaf),
            _ => CompiledQuery::Bool(self.current),
        }
    }
}

/// A disjunct holding one plain clause is that clause
fn render_run(run: BoolGroup) -> Value {
    match run.single_must() {
        Some(leaf) => leaf.clone(),
        None => run.to_value(),
    }
}

/// SQL `LIKE` pattern to a wildcard pattern; bare values match as substrings
///
/// Literal `*`, `?` and `\\` are escaped so only `%` and `_` act as wildcards.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '%' => pattern.push('*'),
            '_' => pattern.push('?'),
            '*' | '?' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            _ => pattern.push(c),
        }
    }
    if value.contains('%') {
        pattern
    } else {
        format!("*{}*", pattern)
    }
}

/// Compiles clause lists against one index
pub struct ClauseCompiler<'a> {
    resolver: &'a FieldResolver,
    settings: &'a CompilerSettings,
}

impl<'a> ClauseCompiler<'a> {
    pub fn new(resolver: &'a FieldResolver, settings: &'a CompilerSettings) -> Self {
        Self { resolver, settings }
    }

    /// Compile an ordered clause list
    ///
    /// Relationship clauses are validated over the whole tree first so a
    /// malformed clause fails before any fragment is built.
    pub fn compile(&self, clauses: &[ClauseDescriptor]) -> Result<CompiledQuery> {
        validate_relationships(clauses)?;
        self.fold(clauses)
    }

    fn fold(&self, clauses: &[ClauseDescriptor]) -> Result<CompiledQuery> {
        let fold = clauses
            .iter()
            .try_fold(ClauseFold::default(), |fold, clause| {
                let (leaf, inverted) = self.compile_leaf(clause)?;
                trace!(kind = clause.kind.name(), "compiled clause");
                Ok::<_, DslError>(fold.push(leaf, clause.combinator, clause.negate ^ inverted))
            })?;
        Ok(fold.finish())
    }

    /// Compile one clause to its leaf fragment
    ///
    /// The flag is true when the fragment matches the complement of the clause
    /// (`!=`, `not like`, `= null`) and so flips the clause's negation.
    pub fn compile_leaf(&self, clause: &ClauseDescriptor) -> Result<(Value, bool)> {
        let options = &clause.options;

        let leaf = match &clause.kind {
            ClauseKind::Basic {
                column,
                operator,
                value,
            } => return self.compile_basic(column, *operator, value, options),
            ClauseKind::Date {
                column,
                operator,
                value,
            } => return self.compile_date(column, *operator, value, options),
            ClauseKind::In { column, values } => {
                nodes::terms(&self.resolver.resolve(column)?, values, options)
            }
            ClauseKind::Between { column, values } => {
                let [low, high] = values;
                nodes::range(
                    &self.resolver.resolve(column)?,
                    &[("gte", low.clone()), ("lte", high.clone())],
                    options,
                )
            }
            ClauseKind::Match { column, value } => nodes::match_query(column, value, options),
            ClauseKind::Phrase { column, value } => nodes::match_phrase(column, value, options),
            ClauseKind::PhrasePrefix { column, value } => {
                nodes::match_phrase_prefix(column, value, options)
            }
            ClauseKind::Fuzzy { column, value } => nodes::fuzzy(column, value, options),
            ClauseKind::Term { column, value } => {
                nodes::term(&self.resolver.resolve(column)?, value, options)
            }
            ClauseKind::Regex { column, value } => {
                nodes::regexp(&self.resolver.resolve(column)?, value, options)
            }
            ClauseKind::Prefix { column, value } => {
                nodes::prefix(&self.resolver.resolve(column)?, value, options)
            }
            ClauseKind::Script { source } => nodes::script(source, options),
            ClauseKind::MultiMatch { columns, value } => nodes::multi_match(columns, value, options),
            ClauseKind::QueryString { columns, value } => {
                nodes::query_string(columns, value, options)
            }
            ClauseKind::Exists { column } => nodes::exists(column, options),
            ClauseKind::GeoDistance {
                column,
                point,
                distance,
            } => nodes::geo_distance(column, point, distance, options),
            ClauseKind::GeoBox {
                column,
                top_left,
                bottom_right,
            } => nodes::geo_bounding_box(column, top_left, bottom_right, options),
            ClauseKind::Nested { path, clauses } => {
                let inner = self.fold_scoped(path, clauses)?;
                nodes::nested(path, inner.into_value(), None, options)
            }
            ClauseKind::NestedObject { path, clauses } => {
                let inner = self.fold_scoped(path, clauses)?;
                if inner.is_match_all() {
                    nodes::exists(path, options)
                } else {
                    nodes::nested(path, inner.into_value(), None, options)
                }
            }
            ClauseKind::InnerNested {
                path,
                clauses,
                orders,
                offset,
                limit,
            } => {
                let inner = self.fold_scoped(path, clauses)?;
                let scoped_orders: Vec<_> = orders
                    .iter()
                    .cloned()
                    .map(|mut order| {
                        order.column = scoped_column(path, &order.column);
                        order
                    })
                    .collect();
                let inner_hits = OrderCompiler::new(self.resolver, self.settings).inner_hits(
                    &scoped_orders,
                    *offset,
                    *limit,
                )?;
                nodes::nested(path, inner.into_value(), Some(inner_hits), options)
            }
            ClauseKind::FunctionScore {
                function,
                params,
                clauses,
            } => {
                let inner = self.fold(clauses)?;
                nodes::function_score(inner.into_value(), function, params, options)
            }
            ClauseKind::Parent {
                parent_type,
                query,
                filter,
            } => {
                let inner = self.compile_relationship(query, filter)?;
                nodes::has_parent(parent_type, inner, options)
            }
            ClauseKind::Child {
                child_type,
                query,
                filter,
            } => {
                let inner = self.compile_relationship(query, filter)?;
                nodes::has_child(child_type, inner, options)
            }
            ClauseKind::ParentId { child_type, id } => nodes::parent_id(child_type, id, options),
            ClauseKind::Raw { query } => query.clone(),
        };

        Ok((leaf, false))
    }

    fn compile_basic(
        &self,
        column: &str,
        operator: Operator,
        value: &Value,
        options: &Options,
    ) -> Result<(Value, bool)> {
        let inverted = operator.is_negative();

        match operator {
            // `= null` means the field is absent
            Operator::Eq | Operator::NotEq if value.is_null() => {
                Ok((nodes::exists(column, options), !inverted))
            }
            Operator::Eq | Operator::NotEq => {
                let field = self.resolver.resolve(column)?;
                Ok((nodes::term(&field, value, options), inverted))
            }
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                let field = self.resolver.resolve(column)?;
                let bound = operator.range_key().unwrap_or("gte");
                Ok((nodes::range(&field, &[(bound, value.clone())], options), inverted))
            }
            Operator::Like | Operator::NotLike => {
                let pattern = value.as_str().ok_or_else(|| {
                    DslError::InvalidDescriptor(format!(
                        "'{}' on '{}' needs a string value",
                        operator, column
                    ))
                })?;
                let field = self.resolver.resolve(column)?;
                Ok((nodes::wildcard(&field, &like_pattern(pattern), options), inverted))
            }
        }
    }

    /// Date comparison rounded to whole days
    fn compile_date(
        &self,
        column: &str,
        operator: Operator,
        value: &Value,
        options: &Options,
    ) -> Result<(Value, bool)> {
        let day = Value::from(day_math(value)?);
        let bounds = match operator {
            Operator::Eq | Operator::NotEq => vec![("gte", day.clone()), ("lte", day)],
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                vec![(operator.range_key().unwrap_or("gte"), day)]
            }
            Operator::Like | Operator::NotLike => {
                return Err(DslError::UnsupportedOperator(format!(
                    "{} on date column '{}'",
                    operator, column
                )))
            }
        };

        let field = self.resolver.resolve(column)?;
        Ok((nodes::range(&field, &bounds, options), operator.is_negative()))
    }

    /// Sub-clauses of a nested scope with their columns under `path`
    fn fold_scoped(&self, path: &str, clauses: &[ClauseDescriptor]) -> Result<CompiledQuery> {
        let scoped: Vec<_> = clauses.iter().map(|clause| clause.scoped_to(path)).collect();
        self.fold(&scoped)
    }

    /// Inner query of a parent/child clause, filter context when `filter` is set
    fn compile_relationship(
        &self,
        query: &[ClauseDescriptor],
        filter: &[ClauseDescriptor],
    ) -> Result<Value> {
        if filter.is_empty() {
            return Ok(self.fold(query)?.into_value());
        }
        let inner = self.fold(filter)?.into_value();
        Ok(nodes::bool_query(&[], &[], &[], &[inner]))
    }
}

/// Reject parent/child clauses that set both a query and a filter
fn validate_relationships(clauses: &[ClauseDescriptor]) -> Result<()> {
    for clause in clauses {
        match &clause.kind {
            ClauseKind::Parent {
                parent_type: name,
                query,
                filter,
            }
            | ClauseKind::Child {
                child_type: name,
                query,
                filter,
            } => {
                if !query.is_empty() && !filter.is_empty() {
                    return Err(DslError::MalformedRelationship(format!(
                        "'{}' sets both a query and a filter",
                        name
                    )));
                }
                validate_relationships(query)?;
                validate_relationships(filter)?;
            }
            ClauseKind::Nested { clauses, .. }
            | ClauseKind::NestedObject { clauses, .. }
            | ClauseKind::InnerNested { clauses, .. }
            | ClauseKind::FunctionScore { clauses, .. } => validate_relationships(clauses)?,
            _ => {}
        }
    }
    Ok(())
}
