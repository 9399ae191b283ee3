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

//! Text rendering of expressions and plans, used by tests and debug
//! logging. The format is stable for a given tree.

use crate::arena::{Arena, NodeId, NodePayload};
use crate::logical_plan::LogicalPlan;
use itertools::Itertools;
use lamina_common::error::Result;
use lamina_common::operator::UnaryOperator;

/// Render the expression at `id`.
pub fn fmt_expr(arena: &Arena, id: NodeId) -> Result<String> {
    let node = arena.get(id)?;
    let out = match &node.payload {
        NodePayload::Column { name } => format!("col({})", arena.string(*name)?),
        NodePayload::Literal { value } => format!("lit({value})"),
        NodePayload::Binary { op } => format!(
            "({} {} {})",
            fmt_expr(arena, node.children[0])?,
            op,
            fmt_expr(arena, node.children[1])?
        ),
        NodePayload::Unary { op } => match op {
            UnaryOperator::Not | UnaryOperator::Negative => {
                format!("{} {}", op, fmt_expr(arena, node.children[0])?)
            }
            _ => format!("{} {}", fmt_expr(arena, node.children[0])?, op),
        },
        NodePayload::Agg { op } => {
            format!("{}.{}()", fmt_expr(arena, node.children[0])?, op)
        }
        NodePayload::Function { name } => format!(
            "{}({})",
            arena.string(*name)?,
            node.children
                .iter()
                .map(|&child| fmt_expr(arena, child))
                .collect::<Result<Vec<_>>>()?
                .join(", ")
        ),
        NodePayload::Cast { type_name } => format!(
            "cast({} AS {})",
            fmt_expr(arena, node.children[0])?,
            arena.string(*type_name)?
        ),
        NodePayload::Alias { name } => format!(
            "{} AS {}",
            fmt_expr(arena, node.children[0])?,
            arena.string(*name)?
        ),
        NodePayload::Window { func, spec } => {
            let over = format!("over(partition_by=[{}])", spec.partition_columns().join(", "));
            match node.children.first() {
                Some(&child) => {
                    format!("{}.{}().{}", fmt_expr(arena, child)?, func.name(), over)
                }
                None => format!("{}().{}", func.name(), over),
            }
        }
        NodePayload::Sort { descending } => format!(
            "sort({}, descending={})",
            fmt_expr(arena, node.children[0])?,
            descending
        ),
        NodePayload::Filter => format!(
            "filter({}, {})",
            fmt_expr(arena, node.children[0])?,
            fmt_expr(arena, node.children[1])?
        ),
        NodePayload::Slice { offset, len } => format!(
            "slice({}, {}, {})",
            fmt_expr(arena, node.children[0])?,
            offset,
            len
        ),
        NodePayload::Ternary => format!(
            "when({}, {}, {})",
            fmt_expr(arena, node.children[0])?,
            fmt_expr(arena, node.children[1])?,
            fmt_expr(arena, node.children[2])?
        ),
    };
    Ok(out)
}

/// Render the plan as an indented tree, children two spaces deeper.
pub fn fmt_plan(plan: &LogicalPlan, arena: &Arena) -> Result<String> {
    let mut out = String::new();
    fmt_plan_indent(plan, arena, 0, &mut out)?;
    Ok(out)
}

fn fmt_plan_indent(
    plan: &LogicalPlan,
    arena: &Arena,
    indent: usize,
    out: &mut String,
) -> Result<()> {
    if indent > 0 {
        out.push('\n');
        out.push_str(&"  ".repeat(indent));
    }
    let exprs = |ids: &[NodeId]| -> Result<String> {
        Ok(ids
            .iter()
            .map(|&id| fmt_expr(arena, id))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    };
    match plan {
        LogicalPlan::Scan(scan) => {
            out.push_str(&format!("Scan: {}", scan.source.name()));
            if !scan.projections.is_empty() {
                out.push_str(&format!(" projection=[{}]", exprs(&scan.projections)?));
            }
            if !scan.predicates.is_empty() {
                out.push_str(&format!(" predicates=[{}]", exprs(&scan.predicates)?));
            }
        }
        LogicalPlan::Projection(p) => {
            out.push_str(&format!("Projection: {}", exprs(&p.exprs)?));
        }
        LogicalPlan::Filter(f) => {
            out.push_str(&format!("Filter: {}", fmt_expr(arena, f.predicate)?));
        }
        LogicalPlan::Aggregate(a) => {
            out.push_str(&format!(
                "Aggregate: keys=[{}], aggs=[{}]",
                exprs(&a.keys)?,
                exprs(&a.aggs)?
            ));
        }
        LogicalPlan::Join(j) => {
            out.push_str(&format!(
                "Join: type={}, left_on=[{}], right_on=[{}]",
                j.join_type,
                exprs(&j.left_on)?,
                exprs(&j.right_on)?
            ));
        }
    }
    for child in plan.children() {
        fmt_plan_indent(child, arena, indent + 1, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_common::operator::Operator;
    use lamina_common::scalar::ScalarValue;

    #[test]
    fn expression_rendering() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let one = arena.add_literal(ScalarValue::Int64(1));
        let gt = arena.add_binary(a, Operator::Gt, one);
        let aliased = arena.add_alias(gt, "flag");

        assert_eq!(
            fmt_expr(&arena, aliased).unwrap(),
            "(col(a) > lit(1)) AS flag"
        );
    }
}
