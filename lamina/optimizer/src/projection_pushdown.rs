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

//! Moves a projection of plain column references into the scan it
//! reads from, directly or through any number of filters, so the
//! source side narrows the columns that flow upward.
//!
//! Only pure column selections move; a projection computing anything
//! stays in place. A scan that already carries projections keeps them
//! untouched. Pushed-down predicates are unaffected: the scan applies
//! its predicates before its projection, so a predicate may keep using
//! columns the projection drops.

use crate::OptimizerRule;
use lamina_common::error::Result;
use lamina_expr::arena::{Arena, NodeId, NodeKind};
use lamina_expr::logical_plan::{LogicalPlan, Scan};
use std::sync::Arc;

/// Optimizer rule that pushes pure column projections into scans.
#[derive(Default)]
pub struct ProjectionPushDown;

impl ProjectionPushDown {
    pub fn new() -> Self {
        Self {}
    }
}

impl OptimizerRule for ProjectionPushDown {
    fn name(&self) -> &str {
        "projection_pushdown"
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

        if let LogicalPlan::Projection(projection) = plan.as_ref() {
            if all_plain_columns(arena, &projection.exprs)? {
                if let Some(pushed) = push_through(&new_children[0], &projection.exprs)? {
                    return Ok(pushed);
                }
            }
        }

        if !changed {
            return Ok(plan.clone());
        }
        Ok(Arc::new(plan.with_new_children(new_children)?))
    }
}

fn all_plain_columns(arena: &Arena, ids: &[NodeId]) -> Result<bool> {
    for &id in ids {
        let node = arena.get(id)?;
        if node.kind() != NodeKind::Column {
            return Ok(false);
        }
        // the wildcard is a selector, not a selection
        if let lamina_expr::arena::NodePayload::Column { name } = &node.payload {
            if arena.string(*name)? == lamina_expr::arena::WILDCARD {
                return Ok(false);
            }
        }
    }
    Ok(!ids.is_empty())
}

/// Rebuild `plan` with the projection applied at its scan, descending
/// through filters. `None` when the chain does not end in a scan with
/// room for projections.
fn push_through(
    plan: &Arc<LogicalPlan>,
    projections: &[NodeId],
) -> Result<Option<Arc<LogicalPlan>>> {
    match plan.as_ref() {
        LogicalPlan::Scan(scan) if scan.projections.is_empty() => {
            Ok(Some(Arc::new(LogicalPlan::Scan(Scan {
                source: scan.source.clone(),
                projections: projections.to_vec(),
                predicates: scan.predicates.clone(),
                schema_hint: scan.schema_hint.clone(),
            }))))
        }
        LogicalPlan::Filter(filter) => match push_through(&filter.input, projections)? {
            Some(new_input) => Ok(Some(Arc::new(plan.with_new_children(vec![new_input])?))),
            None => Ok(None),
        },
        _ => Ok(None),
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
            Field::new("b", lamina_common::types::DataType::Utf8, true),
        ]));
        Arc::new(LogicalPlan::Scan(Scan::new(Arc::new(StaticSource(schema)))))
    }

    #[test]
    fn column_projection_moves_into_the_scan() {
        let mut arena = Arena::new();
        let b = arena.add_column("b");
        let plan = Arc::new(LogicalPlan::Projection(Projection::new(scan(), vec![b])));

        let out = ProjectionPushDown::new().rewrite(&plan, &mut arena).unwrap();
        assert_eq!(
            fmt_plan(&out, &arena).unwrap(),
            "Scan: static projection=[col(b)]"
        );
    }

    #[test]
    fn pushdown_passes_through_filters() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let one = arena.add_literal(ScalarValue::Int64(1));
        let pred = arena.add_binary(a, Operator::Gt, one);
        let b = arena.add_column("b");

        let plan = Arc::new(LogicalPlan::Projection(Projection::new(
            Arc::new(LogicalPlan::Filter(Filter::new(scan(), pred))),
            vec![b],
        )));

        let out = ProjectionPushDown::new().rewrite(&plan, &mut arena).unwrap();
        assert_eq!(
            fmt_plan(&out, &arena).unwrap(),
            "Filter: (col(a) > lit(1))\n  Scan: static projection=[col(b)]"
        );
    }

    #[test]
    fn computed_projections_stay_in_place() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let one = arena.add_literal(ScalarValue::Int64(1));
        let add = arena.add_binary(a, Operator::Plus, one);
        let plan = Arc::new(LogicalPlan::Projection(Projection::new(scan(), vec![add])));

        let out = ProjectionPushDown::new().rewrite(&plan, &mut arena).unwrap();
        assert!(Arc::ptr_eq(&out, &plan));
    }

    #[test]
    fn existing_scan_projections_are_not_replaced() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let b = arena.add_column("b");
        let mut inner = Scan::new(match scan().as_ref() {
            LogicalPlan::Scan(s) => s.source.clone(),
            _ => unreachable!(),
        });
        inner.projections = vec![a];
        let plan = Arc::new(LogicalPlan::Projection(Projection::new(
            Arc::new(LogicalPlan::Scan(inner)),
            vec![b],
        )));

        let out = ProjectionPushDown::new().rewrite(&plan, &mut arena).unwrap();
        assert!(Arc::ptr_eq(&out, &plan));
    }
}
