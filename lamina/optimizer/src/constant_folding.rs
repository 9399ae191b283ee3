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

//! Rewrites pure-literal subtrees to a single literal.
//!
//! Folding recurses children first, so nested constant arithmetic
//! collapses in one application. The scalar kernels decline anything
//! that could change observable semantics, notably division by zero,
//! which is left in the plan untouched.

use crate::utils::rewrite_plan_exprs;
use crate::OptimizerRule;
use lamina_common::error::Result;
use lamina_common::scalar::ScalarValue;
use lamina_expr::arena::{Arena, NodeId, NodePayload};
use lamina_expr::logical_plan::LogicalPlan;
use std::sync::Arc;

/// Optimizer rule that evaluates constant expressions at plan time.
#[derive(Default)]
pub struct ConstantFolding;

impl ConstantFolding {
    pub fn new() -> Self {
        Self {}
    }
}

impl OptimizerRule for ConstantFolding {
    fn name(&self) -> &str {
        "constant_folding"
    }

    fn rewrite(&self, plan: &Arc<LogicalPlan>, arena: &mut Arena) -> Result<Arc<LogicalPlan>> {
        rewrite_plan_exprs(plan, arena, &mut fold_node)
    }
}

fn literal_value(arena: &Arena, id: NodeId) -> Result<Option<ScalarValue>> {
    Ok(match &arena.get(id)?.payload {
        NodePayload::Literal { value } => Some(value.clone()),
        _ => None,
    })
}

// children are already folded when this runs
fn fold_node(arena: &mut Arena, id: NodeId) -> Result<NodeId> {
    let node = arena.get(id)?;
    let folded = match &node.payload {
        NodePayload::Binary { op } => {
            let op = *op;
            let (left, right) = (node.children[0], node.children[1]);
            match (literal_value(arena, left)?, literal_value(arena, right)?) {
                (Some(l), Some(r)) => {
                    if op.is_arithmetic() {
                        ScalarValue::arithmetic(op, &l, &r)
                    } else if op.is_comparison() {
                        ScalarValue::compare(op, &l, &r)
                    } else {
                        ScalarValue::logical(op, &l, &r)
                    }
                }
                _ => None,
            }
        }
        NodePayload::Unary { op } => {
            let op = *op;
            match literal_value(arena, node.children[0])? {
                Some(value) => ScalarValue::unary(op, &value),
                None => None,
            }
        }
        _ => None,
    };
    Ok(match folded {
        Some(value) => arena.add_literal(value),
        None => id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rewrite_expr;
    use lamina_common::operator::{Operator, UnaryOperator};

    fn fold(arena: &mut Arena, id: NodeId) -> NodeId {
        rewrite_expr(arena, id, &mut fold_node).unwrap()
    }

    fn expect_literal(arena: &Arena, id: NodeId, expected: ScalarValue) {
        match &arena.must_get(id).payload {
            NodePayload::Literal { value } => assert_eq!(*value, expected),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn nested_arithmetic_collapses() {
        let mut arena = Arena::new();
        let one = arena.add_literal(ScalarValue::Int64(1));
        let two = arena.add_literal(ScalarValue::Int64(2));
        let add = arena.add_binary(one, Operator::Plus, two);
        let gt = arena.add_binary(add, Operator::Gt, two);

        let out = fold(&mut arena, gt);
        expect_literal(&arena, out, ScalarValue::Boolean(true));
    }

    #[test]
    fn non_literal_sides_stop_folding() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let one = arena.add_literal(ScalarValue::Int64(1));
        let add = arena.add_binary(a, Operator::Plus, one);

        assert_eq!(fold(&mut arena, add), add);
    }

    #[test]
    fn division_by_zero_is_left_alone() {
        let mut arena = Arena::new();
        let one = arena.add_literal(ScalarValue::Int64(1));
        let zero = arena.add_literal(ScalarValue::Int64(0));
        let div = arena.add_binary(one, Operator::Divide, zero);

        assert_eq!(fold(&mut arena, div), div);
    }

    #[test]
    fn null_propagates() {
        let mut arena = Arena::new();
        let null = arena.add_literal(ScalarValue::Null);
        let two = arena.add_literal(ScalarValue::Int64(2));
        let add = arena.add_binary(null, Operator::Plus, two);
        let lt = arena.add_binary(null, Operator::Lt, two);

        let out = fold(&mut arena, add);
        expect_literal(&arena, out, ScalarValue::Null);
        let out = fold(&mut arena, lt);
        expect_literal(&arena, out, ScalarValue::Null);
    }

    #[test]
    fn equality_folds_structurally() {
        let mut arena = Arena::new();
        let x = arena.add_literal(ScalarValue::Utf8("x".into()));
        let y = arena.add_literal(ScalarValue::Utf8("y".into()));
        let eq = arena.add_binary(x, Operator::Eq, y);

        let out = fold(&mut arena, eq);
        expect_literal(&arena, out, ScalarValue::Boolean(false));
    }

    #[test]
    fn boolean_and_unary_folds() {
        let mut arena = Arena::new();
        let t = arena.add_literal(ScalarValue::Boolean(true));
        let f = arena.add_literal(ScalarValue::Boolean(false));
        let and = arena.add_binary(t, Operator::And, f);
        let out = fold(&mut arena, and);
        expect_literal(&arena, out, ScalarValue::Boolean(false));

        let not = arena.add_unary(UnaryOperator::Not, t);
        let out = fold(&mut arena, not);
        expect_literal(&arena, out, ScalarValue::Boolean(false));

        let null = arena.add_literal(ScalarValue::Null);
        let is_null = arena.add_unary(UnaryOperator::IsNull, null);
        let out = fold(&mut arena, is_null);
        expect_literal(&arena, out, ScalarValue::Boolean(true));
    }
}
