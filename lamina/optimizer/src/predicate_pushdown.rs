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

//! Moves filters sitting directly on a scan into the scan itself, so
//! the source side evaluates them before any other operator runs.
//!
//! Predicates are appended in the order the filters applied, which
//! keeps the conjunction's left-to-right evaluation order. Filters
//! above any other plan kind stay where they are; the rule still
//! recurses below them so deeper `Filter(Scan)` pairs collapse.

use crate::OptimizerRule;
use lamina_common::error::Result;
use lamina_expr::arena::Arena;
use lamina_expr::logical_plan::{LogicalPlan, Scan};
use std::sync::Arc;

/// Optimizer rule that pushes filter predicates into scans.
#[derive(Default)]
pub struct PredicatePushDown;

impl PredicatePushDown {
    pub fn new() -> Self {
        Self {}
    }
}

impl OptimizerRule for PredicatePushDown {
    fn name(&self) -> &str {
        "predicate_pushdown"
    }

    fn rewrite(&self, plan: &Arc<LogicalPlan>, arena: &mut Arena) -> Result<Arc<LogicalPlan>> {
        let children = plan.children();
        let mut new_children = Vec::with_capacity(children.len());
        let mut changed = false;
        for child in children {
            let rewritten = self.rewrite(child, arena)?;
            changed |= !Arc::ptr_eq(&rewritten, child);
            new_children.push(rewritten);
        }

        if let LogicalPlan::Filter(filter) = plan.as_ref() {
            if let LogicalPlan::Scan(scan) = new_children[0].as_ref() {
                let mut predicates = scan.predicates.clone();
                predicates.push(filter.predicate);
                return Ok(Arc::new(LogicalPlan::Scan(Scan {
                    source: scan.source.clone(),
                    projections: scan.projections.clone(),
                    predicates,
                    schema_hint: scan.schema_hint.clone(),
                })));
            }
        }

        if !changed {
            return Ok(plan.clone());
        }
        Ok(Arc::new(plan.with_new_children(new_children)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_common::operator::Operator;
    use lamina_common::scalar::ScalarValue;
    use lamina_common::schema::{Field, Schema, SchemaRef};
    use lamina_expr::fmt_plan;
    use lamina_expr::logical_plan::{Filter, Projection};
    use lamina_expr::source::DataSource;

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
            Field::new("a", lamina_common::types::DataType::Int64, true),
            Field::new("b", lamina_common::types::DataType::Int64, true),
        ]));
        Arc::new(LogicalPlan::Scan(Scan::new(Arc::new(StaticSource(schema)))))
    }

    fn predicate(arena: &mut Arena, column: &str, value: i64) -> lamina_expr::arena::NodeId {
        let col = arena.add_column(column);
        let lit = arena.add_literal(ScalarValue::Int64(value));
        arena.add_binary(col, Operator::Gt, lit)
    }

    #[test]
    fn filter_over_scan_collapses() {
        let mut arena = Arena::new();
        let pred = predicate(&mut arena, "a", 1);
        let plan = Arc::new(LogicalPlan::Filter(Filter::new(scan(), pred)));

        let out = PredicatePushDown::new().rewrite(&plan, &mut arena).unwrap();
        assert_eq!(
            fmt_plan(&out, &arena).unwrap(),
            "Scan: static predicates=[(col(a) > lit(1))]"
        );
    }

    #[test]
    fn stacked_filters_keep_their_order() {
        let mut arena = Arena::new();
        let first = predicate(&mut arena, "a", 1);
        let second = predicate(&mut arena, "b", 2);
        let plan = Arc::new(LogicalPlan::Filter(Filter::new(
            Arc::new(LogicalPlan::Filter(Filter::new(scan(), first))),
            second,
        )));

        // children collapse first, so both filters land in one pass
        let out = PredicatePushDown::new().rewrite(&plan, &mut arena).unwrap();
        assert_eq!(
            fmt_plan(&out, &arena).unwrap(),
            "Scan: static predicates=[(col(a) > lit(1)), (col(b) > lit(2))]"
        );
    }

    #[test]
    fn filter_above_projection_stays_in_place() {
        let mut arena = Arena::new();
        let b = arena.add_column("b");
        let pred = predicate(&mut arena, "a", 1);
        let plan = Arc::new(LogicalPlan::Filter(Filter::new(
            Arc::new(LogicalPlan::Projection(Projection::new(scan(), vec![b]))),
            pred,
        )));

        let out = PredicatePushDown::new().rewrite(&plan, &mut arena).unwrap();
        assert!(Arc::ptr_eq(&out, &plan));
    }
}
