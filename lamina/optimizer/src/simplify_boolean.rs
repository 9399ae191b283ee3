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

//! Boolean identity rewrites, applied after constant folding so the
//! literal side of a conjunction is already a single node:
//!
//! * `x AND true` → `x`, `x AND false` → `false`
//! * `x OR false` → `x`, `x OR true` → `true`
//!
//! and the symmetric forms. A filter whose predicate has collapsed to
//! literal `true` is dropped entirely.

use crate::utils::rewrite_plan_exprs;
use crate::OptimizerRule;
use lamina_common::error::Result;
use lamina_common::operator::Operator;
use lamina_common::scalar::ScalarValue;
use lamina_expr::arena::{Arena, NodeId, NodePayload};
use lamina_expr::logical_plan::LogicalPlan;
use std::sync::Arc;

/// Optimizer rule applying the boolean short-circuit identities.
#[derive(Default)]
pub struct SimplifyBoolean;

impl SimplifyBoolean {
    pub fn new() -> Self {
        Self {}
    }
}

impl OptimizerRule for SimplifyBoolean {
    fn name(&self) -> &str {
        "simplify_boolean"
    }

    fn rewrite(&self, plan: &Arc<LogicalPlan>, arena: &mut Arena) -> Result<Arc<LogicalPlan>> {
        let plan = rewrite_plan_exprs(plan, arena, &mut simplify_node)?;
        drop_trivial_filters(&plan, arena)
    }
}

fn as_boolean_literal(arena: &Arena, id: NodeId) -> Result<Option<bool>> {
    Ok(match &arena.get(id)?.payload {
        NodePayload::Literal {
            value: ScalarValue::Boolean(value),
        } => Some(*value),
        _ => None,
    })
}

fn simplify_node(arena: &mut Arena, id: NodeId) -> Result<NodeId> {
    let node = arena.get(id)?;
    let op = match &node.payload {
        NodePayload::Binary { op } if op.is_logical() => *op,
        _ => return Ok(id),
    };
    let (left, right) = (node.children[0], node.children[1]);

    for (literal_side, other_side) in [(left, right), (right, left)] {
        if let Some(value) = as_boolean_literal(arena, literal_side)? {
            return Ok(match (op, value) {
                // the literal side wins
                (Operator::And, false) | (Operator::Or, true) => literal_side,
                // the literal side is the identity element
                (Operator::And, true) | (Operator::Or, false) => other_side,
                _ => id,
            });
        }
    }
    Ok(id)
}

// a predicate that folded to `true` keeps every row; drop the filter
fn drop_trivial_filters(
    plan: &Arc<LogicalPlan>,
    arena: &mut Arena,
) -> Result<Arc<LogicalPlan>> {
    let children = plan.children();
    let mut new_children = Vec::with_capacity(children.len());
    let mut changed = false;
    for child in children {
        let rewritten = drop_trivial_filters(child, arena)?;
        changed |= !Arc::ptr_eq(&rewritten, child);
        new_children.push(rewritten);
    }

    if let LogicalPlan::Filter(filter) = plan.as_ref() {
        if as_boolean_literal(arena, filter.predicate)? == Some(true) {
            return Ok(new_children.remove(0));
        }
    }

    if !changed {
        return Ok(plan.clone());
    }
    Ok(Arc::new(plan.with_new_children(new_children)?))
}
