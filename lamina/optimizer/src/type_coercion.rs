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

//! Makes mixed-type numeric binary expressions explicit by inserting
//! casts to the merged type on whichever side differs from it.
//!
//! Only arithmetic and comparison operators over two numeric operands
//! are coerced; logical operators and non-numeric types pass through.

use crate::utils::{from_plan, rewrite_expr};
use crate::OptimizerRule;
use lamina_common::error::Result;
use lamina_common::schema::Schema;
use lamina_expr::arena::{Arena, NodeId, NodePayload};
use lamina_expr::logical_plan::LogicalPlan;
use lamina_expr::typing::type_of;
use lamina_common::types::merge_numeric;
use std::sync::Arc;

/// Optimizer rule that aligns the operand types of numeric binary
/// expressions.
#[derive(Default)]
pub struct TypeCoercion;

impl TypeCoercion {
    pub fn new() -> Self {
        Self {}
    }
}

impl OptimizerRule for TypeCoercion {
    fn name(&self) -> &str {
        "type_coercion"
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

        // expressions are typed against the node's input schema; when it
        // cannot be resolved the node passes through untouched
        let input_schema = match plan.as_ref() {
            LogicalPlan::Scan(scan) => scan.source_schema().ok(),
            LogicalPlan::Join(_) => None,
            _ => new_children[0].schema(arena).ok(),
        };

        let exprs = plan.expressions();
        let mut new_exprs = exprs.clone();
        if let Some(schema) = input_schema {
            for (slot, &id) in exprs.iter().enumerate() {
                new_exprs[slot] =
                    rewrite_expr(arena, id, &mut |arena, id| coerce_node(arena, id, &schema))?;
            }
        }

        if !changed && new_exprs == exprs {
            return Ok(plan.clone());
        }
        Ok(Arc::new(from_plan(plan, &new_exprs, &new_children)?))
    }
}

fn coerce_node(arena: &mut Arena, id: NodeId, schema: &Schema) -> Result<NodeId> {
    let node = arena.get(id)?;
    match &node.payload {
        NodePayload::Binary { op } if op.is_arithmetic() || op.is_comparison() => {}
        _ => return Ok(id),
    }
    let (left, right) = (node.children[0], node.children[1]);
    let left_type = type_of(arena, left, schema)?;
    let right_type = type_of(arena, right, schema)?;

    if !left_type.is_numeric() || !right_type.is_numeric() || left_type == right_type {
        return Ok(id);
    }
    let target = merge_numeric(left_type, right_type);
    if !target.is_numeric() {
        return Ok(id);
    }

    let new_left = if left_type != target {
        arena.add_cast(left, target.canonical_name())
    } else {
        left
    };
    let new_right = if right_type != target {
        arena.add_cast(right, target.canonical_name())
    } else {
        right
    };
    arena.with_children(id, vec![new_left, new_right])
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_common::operator::Operator;
    use lamina_common::schema::Field;
    use lamina_common::types::DataType;
    use lamina_expr::fmt_expr;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("i", DataType::Int64, true),
            Field::new("f", DataType::Float64, true),
            Field::new("s", DataType::Utf8, true),
        ])
    }

    fn coerce(arena: &mut Arena, id: NodeId) -> NodeId {
        let schema = schema();
        rewrite_expr(arena, id, &mut |arena, id| coerce_node(arena, id, &schema)).unwrap()
    }

    #[test]
    fn int_plus_float_casts_the_int_side() {
        let mut arena = Arena::new();
        let i = arena.add_column("i");
        let f = arena.add_column("f");
        let add = arena.add_binary(i, Operator::Plus, f);

        let out = coerce(&mut arena, add);
        assert_ne!(out, add);
        assert_eq!(
            fmt_expr(&arena, out).unwrap(),
            "(cast(col(i) AS f64) + col(f))"
        );
        // the coerced node now types as the merged type
        assert_eq!(
            type_of(&arena, out, &schema()).unwrap(),
            DataType::Float64
        );
    }

    #[test]
    fn comparisons_coerce_like_arithmetic() {
        let mut arena = Arena::new();
        let i = arena.add_column("i");
        let f = arena.add_column("f");
        let cmp = arena.add_binary(f, Operator::Lt, i);

        let out = coerce(&mut arena, cmp);
        assert_eq!(
            fmt_expr(&arena, out).unwrap(),
            "(col(f) < cast(col(i) AS f64))"
        );
    }

    #[test]
    fn same_types_and_non_numeric_pass_through() {
        let mut arena = Arena::new();
        let i = arena.add_column("i");
        let s = arena.add_column("s");
        let same = arena.add_binary(i, Operator::Plus, i);
        let text = arena.add_binary(s, Operator::Eq, s);

        assert_eq!(coerce(&mut arena, same), same);
        assert_eq!(coerce(&mut arena, text), text);
    }

    #[test]
    fn coercion_is_idempotent() {
        let mut arena = Arena::new();
        let i = arena.add_column("i");
        let f = arena.add_column("f");
        let add = arena.add_binary(i, Operator::Plus, f);

        let once = coerce(&mut arena, add);
        let twice = coerce(&mut arena, once);
        assert_eq!(once, twice);
    }
}
