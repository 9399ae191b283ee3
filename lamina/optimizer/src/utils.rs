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

//! Collection of utility functions shared by the optimizer rules.

use lamina_common::error::Result;
use lamina_expr::arena::{Arena, NodeId};
use lamina_expr::logical_plan::{
    Aggregate, Filter, Join, LogicalPlan, Projection, Scan,
};
use lamina_common::internal_err;
use std::sync::Arc;

/// Rewrite the expression subtree at `id` bottom-up.
///
/// `f` sees every node after its children have been rewritten and
/// returns the id to use in its place; returning the input id means no
/// change. New nodes are appended, never mutated in place.
pub fn rewrite_expr(
    arena: &mut Arena,
    id: NodeId,
    f: &mut dyn FnMut(&mut Arena, NodeId) -> Result<NodeId>,
) -> Result<NodeId> {
    let children = arena.get(id)?.children.clone();
    let mut new_children = Vec::with_capacity(children.len());
    for child in children {
        new_children.push(rewrite_expr(arena, child, f)?);
    }
    let id = arena.with_children(id, new_children)?;
    f(arena, id)
}

/// Returns a plan with the same shape as `plan`, but with `exprs` and
/// `inputs` in place of its own. The slices must carry exactly the
/// values [`LogicalPlan::expressions`] and [`LogicalPlan::children`]
/// produce, in the same order.
pub fn from_plan(
    plan: &LogicalPlan,
    exprs: &[NodeId],
    inputs: &[Arc<LogicalPlan>],
) -> Result<LogicalPlan> {
    match plan {
        LogicalPlan::Scan(scan) => {
            let (projections, predicates) = exprs.split_at(scan.projections.len());
            Ok(LogicalPlan::Scan(Scan {
                source: scan.source.clone(),
                projections: projections.to_vec(),
                predicates: predicates.to_vec(),
                schema_hint: scan.schema_hint.clone(),
            }))
        }
        LogicalPlan::Projection(_) => Ok(LogicalPlan::Projection(Projection::new(
            inputs[0].clone(),
            exprs.to_vec(),
        ))),
        LogicalPlan::Filter(_) => {
            if exprs.len() != 1 {
                return internal_err!("a filter is rebuilt from exactly one predicate");
            }
            Ok(LogicalPlan::Filter(Filter::new(inputs[0].clone(), exprs[0])))
        }
        LogicalPlan::Aggregate(agg) => {
            let (keys, aggs) = exprs.split_at(agg.keys.len());
            Ok(LogicalPlan::Aggregate(Aggregate::new(
                inputs[0].clone(),
                keys.to_vec(),
                aggs.to_vec(),
            )))
        }
        LogicalPlan::Join(join) => {
            let (left_on, right_on) = exprs.split_at(join.left_on.len());
            Ok(LogicalPlan::Join(Join::new(
                inputs[0].clone(),
                inputs[1].clone(),
                left_on.to_vec(),
                right_on.to_vec(),
                join.join_type,
            )))
        }
    }
}

/// Apply an expression rewriter to every plan node, bottom-up.
///
/// Plan nodes whose inputs and expressions all come back unchanged are
/// returned as the same [Arc], so callers (and the pass loop) can
/// detect change by pointer identity.
pub fn rewrite_plan_exprs(
    plan: &Arc<LogicalPlan>,
    arena: &mut Arena,
    f: &mut dyn FnMut(&mut Arena, NodeId) -> Result<NodeId>,
) -> Result<Arc<LogicalPlan>> {
    let children = plan.children();
    let mut new_children = Vec::with_capacity(children.len());
    let mut children_changed = false;
    for child in children {
        let rewritten = rewrite_plan_exprs(child, arena, f)?;
        children_changed |= !Arc::ptr_eq(&rewritten, child);
        new_children.push(rewritten);
    }

    let exprs = plan.expressions();
    let mut new_exprs = Vec::with_capacity(exprs.len());
    for id in &exprs {
        new_exprs.push(rewrite_expr(arena, *id, f)?);
    }

    if !children_changed && new_exprs == exprs {
        return Ok(plan.clone());
    }
    Ok(Arc::new(from_plan(plan, &new_exprs, &new_children)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_common::operator::Operator;
    use lamina_common::scalar::ScalarValue;

    #[test]
    fn rewrite_expr_threads_new_children_upward() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let one = arena.add_literal(ScalarValue::Int64(1));
        let add = arena.add_binary(a, Operator::Plus, one);

        // replace every literal 1 with literal 2
        let rewritten = rewrite_expr(&mut arena, add, &mut |arena, id| {
            let node = arena.get(id)?;
            if let lamina_expr::arena::NodePayload::Literal { value } = &node.payload {
                if *value == ScalarValue::Int64(1) {
                    return Ok(arena.add_literal(ScalarValue::Int64(2)));
                }
            }
            Ok(id)
        })
        .unwrap();

        assert_ne!(rewritten, add);
        let node = arena.get(rewritten).unwrap();
        assert_eq!(node.children[0], a);
        let right = arena.get(node.children[1]).unwrap();
        assert_eq!(
            right.payload,
            lamina_expr::arena::NodePayload::Literal {
                value: ScalarValue::Int64(2)
            }
        );
        // the original subtree still reads back unchanged
        assert_eq!(arena.get(add).unwrap().children, vec![a, one]);
    }
}
