// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The logical plan tree: what result the query wants, before any
//! physical decisions.
//!
//! Plan nodes are immutable; every rewrite builds a fresh node, which
//! is what lets the optimizer detect change by pointer identity. All
//! expression ids refer into the arena owned by the lazy frame the plan
//! belongs to.

use crate::arena::{Arena, NodeId};
use crate::naming::output_name;
use crate::source::DataSource;
use crate::typing::type_of;
use itertools::Itertools;
use lamina_common::error::{LaminaError, Result};
use lamina_common::operator::JoinType;
use lamina_common::schema::{Field, Schema, SchemaRef};
use parking_lot::Mutex;
use std::sync::Arc;

/// Lazily computed schema attached to plan nodes whose schema is
/// derived from expressions. A rebuilt node starts with an empty cache.
#[derive(Debug, Default)]
struct SchemaCache(Mutex<Option<SchemaRef>>);

impl SchemaCache {
    fn get_or_try_init(
        &self,
        init: impl FnOnce() -> Result<SchemaRef>,
    ) -> Result<SchemaRef> {
        let mut guard = self.0.lock();
        if let Some(schema) = guard.as_ref() {
            return Ok(schema.clone());
        }
        let schema = init()?;
        *guard = Some(schema.clone());
        Ok(schema)
    }
}

impl Clone for SchemaCache {
    fn clone(&self) -> Self {
        SchemaCache(Mutex::new(self.0.lock().clone()))
    }
}

/// Produces rows from a [DataSource]. `projections` and `predicates`
/// start empty; the pushdown rules populate them.
#[derive(Debug, Clone)]
pub struct Scan {
    pub source: Arc<dyn DataSource>,
    pub projections: Vec<NodeId>,
    pub predicates: Vec<NodeId>,
    pub schema_hint: Option<SchemaRef>,
}

impl Scan {
    pub fn new(source: Arc<dyn DataSource>) -> Scan {
        Scan {
            source,
            projections: vec![],
            predicates: vec![],
            schema_hint: None,
        }
    }

    pub fn with_schema_hint(mut self, schema: SchemaRef) -> Scan {
        self.schema_hint = Some(schema);
        self
    }

    /// The source schema before any pushed projection.
    pub fn source_schema(&self) -> Result<SchemaRef> {
        match &self.schema_hint {
            Some(schema) => Ok(schema.clone()),
            None => self.source.schema(),
        }
    }

    fn schema(&self, arena: &Arena) -> Result<SchemaRef> {
        let base = self.source_schema()?;
        if self.projections.is_empty() {
            return Ok(base);
        }
        let fields = self
            .projections
            .iter()
            .map(|&id| {
                let name = output_name(arena, id)?;
                let data_type = type_of(arena, id, &base)?;
                Ok(Field::new(name, data_type, true))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Arc::new(Schema::new(fields)))
    }
}

/// Emits one column per expression.
#[derive(Debug, Clone)]
pub struct Projection {
    pub input: Arc<LogicalPlan>,
    pub exprs: Vec<NodeId>,
    cache: SchemaCache,
}

impl Projection {
    pub fn new(input: Arc<LogicalPlan>, exprs: Vec<NodeId>) -> Projection {
        Projection {
            input,
            exprs,
            cache: SchemaCache::default(),
        }
    }

    fn schema(&self, arena: &Arena) -> Result<SchemaRef> {
        self.cache.get_or_try_init(|| {
            let input = self.input.schema(arena)?;
            let fields =
                fields_for(arena, &self.exprs, &input, "projection")?;
            Ok(Arc::new(Schema::new(fields)))
        })
    }
}

/// Keeps the rows where the boolean predicate holds.
#[derive(Debug, Clone)]
pub struct Filter {
    pub input: Arc<LogicalPlan>,
    pub predicate: NodeId,
}

impl Filter {
    pub fn new(input: Arc<LogicalPlan>, predicate: NodeId) -> Filter {
        Filter { input, predicate }
    }
}

/// Groups by the key expressions and emits keys followed by aggregates.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub input: Arc<LogicalPlan>,
    pub keys: Vec<NodeId>,
    pub aggs: Vec<NodeId>,
    cache: SchemaCache,
}

impl Aggregate {
    pub fn new(input: Arc<LogicalPlan>, keys: Vec<NodeId>, aggs: Vec<NodeId>) -> Aggregate {
        Aggregate {
            input,
            keys,
            aggs,
            cache: SchemaCache::default(),
        }
    }

    fn schema(&self, arena: &Arena) -> Result<SchemaRef> {
        self.cache.get_or_try_init(|| {
            let input = self.input.schema(arena)?;
            let ids: Vec<NodeId> = self.keys.iter().chain(&self.aggs).copied().collect();
            let fields = fields_for(arena, &ids, &input, "aggregation")?;
            Ok(Arc::new(Schema::new(fields)))
        })
    }
}

/// Combines two inputs on key equality. Right-hand name collisions are
/// suffixed with `_right`.
#[derive(Debug, Clone)]
pub struct Join {
    pub left: Arc<LogicalPlan>,
    pub right: Arc<LogicalPlan>,
    pub left_on: Vec<NodeId>,
    pub right_on: Vec<NodeId>,
    pub join_type: JoinType,
    cache: SchemaCache,
}

impl Join {
    pub fn new(
        left: Arc<LogicalPlan>,
        right: Arc<LogicalPlan>,
        left_on: Vec<NodeId>,
        right_on: Vec<NodeId>,
        join_type: JoinType,
    ) -> Join {
        Join {
            left,
            right,
            left_on,
            right_on,
            join_type,
            cache: SchemaCache::default(),
        }
    }

    fn schema(&self, arena: &Arena) -> Result<SchemaRef> {
        self.cache.get_or_try_init(|| {
            let left = self.left.schema(arena)?;
            match self.join_type {
                JoinType::Semi | JoinType::Anti => Ok(left),
                _ => {
                    let right = self.right.schema(arena)?;
                    Ok(Arc::new(Schema::merge_join(&left, &right)))
                }
            }
        })
    }
}

/// A node of the logical plan tree.
#[derive(Debug, Clone)]
pub enum LogicalPlan {
    Scan(Scan),
    Projection(Projection),
    Filter(Filter),
    Aggregate(Aggregate),
    Join(Join),
}

impl LogicalPlan {
    /// Direct plan inputs, left to right.
    pub fn children(&self) -> Vec<&Arc<LogicalPlan>> {
        match self {
            LogicalPlan::Scan(_) => vec![],
            LogicalPlan::Projection(p) => vec![&p.input],
            LogicalPlan::Filter(f) => vec![&f.input],
            LogicalPlan::Aggregate(a) => vec![&a.input],
            LogicalPlan::Join(j) => vec![&j.left, &j.right],
        }
    }

    /// Rebuild this node over new inputs. The child count must match
    /// the node's arity.
    pub fn with_new_children(&self, mut children: Vec<Arc<LogicalPlan>>) -> Result<LogicalPlan> {
        let expected = self.children().len();
        if children.len() != expected {
            return Err(LaminaError::InvalidChildren(format!(
                "{} expects {} children, got {}",
                self.describe(),
                expected,
                children.len()
            )));
        }
        Ok(match self {
            LogicalPlan::Scan(scan) => LogicalPlan::Scan(scan.clone()),
            LogicalPlan::Projection(p) => {
                LogicalPlan::Projection(Projection::new(children.remove(0), p.exprs.clone()))
            }
            LogicalPlan::Filter(f) => {
                LogicalPlan::Filter(Filter::new(children.remove(0), f.predicate))
            }
            LogicalPlan::Aggregate(a) => LogicalPlan::Aggregate(Aggregate::new(
                children.remove(0),
                a.keys.clone(),
                a.aggs.clone(),
            )),
            LogicalPlan::Join(j) => {
                let left = children.remove(0);
                let right = children.remove(0);
                LogicalPlan::Join(Join::new(
                    left,
                    right,
                    j.left_on.clone(),
                    j.right_on.clone(),
                    j.join_type,
                ))
            }
        })
    }

    /// The output schema, derived lazily and cached on nodes whose
    /// schema depends on expressions.
    pub fn schema(&self, arena: &Arena) -> Result<SchemaRef> {
        match self {
            LogicalPlan::Scan(scan) => scan.schema(arena),
            LogicalPlan::Projection(p) => p.schema(arena),
            LogicalPlan::Filter(f) => f.input.schema(arena),
            LogicalPlan::Aggregate(a) => a.schema(arena),
            LogicalPlan::Join(j) => j.schema(arena),
        }
    }

    /// Every expression id the node refers to.
    pub fn expressions(&self) -> Vec<NodeId> {
        match self {
            LogicalPlan::Scan(scan) => scan
                .projections
                .iter()
                .chain(&scan.predicates)
                .copied()
                .collect(),
            LogicalPlan::Projection(p) => p.exprs.clone(),
            LogicalPlan::Filter(f) => vec![f.predicate],
            LogicalPlan::Aggregate(a) => a.keys.iter().chain(&a.aggs).copied().collect(),
            LogicalPlan::Join(j) => j.left_on.iter().chain(&j.right_on).copied().collect(),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            LogicalPlan::Scan(_) => "Scan",
            LogicalPlan::Projection(_) => "Projection",
            LogicalPlan::Filter(_) => "Filter",
            LogicalPlan::Aggregate(_) => "Aggregate",
            LogicalPlan::Join(_) => "Join",
        }
    }
}

// fields for an expression list, rejecting duplicate output names
fn fields_for(
    arena: &Arena,
    ids: &[NodeId],
    input: &Schema,
    what: &str,
) -> Result<Vec<Field>> {
    let fields = ids
        .iter()
        .map(|&id| {
            let name = output_name(arena, id)?;
            let data_type = type_of(arena, id, input)?;
            Ok(Field::new(name, data_type, true))
        })
        .collect::<Result<Vec<_>>>()?;
    if let Some(name) = fields.iter().map(Field::name).duplicates().next() {
        return Err(LaminaError::DuplicateProjection(format!("{name} in {what}")));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use lamina_common::operator::{AggregateFunction, Operator};
    use lamina_common::scalar::ScalarValue;
    use lamina_common::types::DataType;

    #[derive(Debug)]
    struct StaticSource(SchemaRef);

    impl DataSource for StaticSource {
        fn name(&self) -> String {
            "static".to_string()
        }

        fn schema(&self) -> Result<SchemaRef> {
            Ok(self.0.clone())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn scan() -> Arc<LogicalPlan> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int64, true),
            Field::new("b", DataType::Utf8, true),
        ]));
        Arc::new(LogicalPlan::Scan(Scan::new(Arc::new(StaticSource(schema)))))
    }

    #[test]
    fn filter_passes_schema_through() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let one = arena.add_literal(ScalarValue::Int64(1));
        let pred = arena.add_binary(a, Operator::Gt, one);

        let plan = LogicalPlan::Filter(Filter::new(scan(), pred));
        let schema = plan.schema(&arena).unwrap();
        assert_eq!(schema.field_names(), vec!["a", "b"]);
    }

    #[test]
    fn projection_schema_is_cached_and_stable() {
        let mut arena = Arena::new();
        let b = arena.add_column("b");
        let plan = LogicalPlan::Projection(Projection::new(scan(), vec![b]));

        let first = plan.schema(&arena).unwrap();
        let second = plan.schema(&arena).unwrap();
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.field_names(), vec!["b"]);
    }

    #[test]
    fn aggregate_schema_orders_keys_then_aggs() {
        let mut arena = Arena::new();
        let b = arena.add_column("b");
        let a = arena.add_column("a");
        let sum = arena.add_agg(AggregateFunction::Sum, a);

        let plan = LogicalPlan::Aggregate(Aggregate::new(scan(), vec![b], vec![sum]));
        let schema = plan.schema(&arena).unwrap();
        assert_eq!(schema.field_names(), vec!["b", "a_sum"]);
        assert_eq!(schema.field(1).data_type(), DataType::Int64);
    }

    #[test]
    fn join_schema_suffixes_right_collisions() {
        let arena = Arena::new();
        let plan = LogicalPlan::Join(Join::new(
            scan(),
            scan(),
            vec![],
            vec![],
            JoinType::Inner,
        ));
        let schema = plan.schema(&arena).unwrap();
        assert_eq!(schema.field_names(), vec!["a", "b", "a_right", "b_right"]);
    }

    #[test]
    fn with_new_children_checks_arity() {
        let mut arena = Arena::new();
        let pred = arena.add_literal(ScalarValue::Boolean(true));
        let filter = LogicalPlan::Filter(Filter::new(scan(), pred));

        let err = filter.with_new_children(vec![]).unwrap_err();
        assert!(matches!(err, LaminaError::InvalidChildren(_)));

        let rebuilt = filter.with_new_children(vec![scan()]).unwrap();
        assert_eq!(rebuilt.describe(), "Filter");
    }

    #[test]
    fn duplicate_projection_names_are_rejected() {
        let mut arena = Arena::new();
        let a1 = arena.add_column("a");
        let a2 = arena.add_column("a");
        let plan = LogicalPlan::Projection(Projection::new(scan(), vec![a1, a2]));
        let err = plan.schema(&arena).unwrap_err();
        assert!(matches!(err, LaminaError::DuplicateProjection(_)));
    }
}
