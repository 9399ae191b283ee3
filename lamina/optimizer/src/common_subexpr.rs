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

//! Eliminate common sub-expression.
//!
//! Structurally identical expression subtrees collapse onto their
//! first occurrence. Nodes are keyed by their payload
//! signature plus their (already canonicalized) children ids, walked
//! bottom-up, so identical subtrees of any depth converge without a
//! separate pairwise comparison. The arena is append-only with stable
//! ids, which makes the resulting expression DAG safe to share.

use crate::utils::rewrite_plan_exprs;
use crate::OptimizerRule;
use hashbrown::HashMap;
use itertools::Itertools;
use lamina_common::error::Result;
use lamina_common::scalar::ScalarValue;
use lamina_expr::arena::{Arena, NodeId, NodePayload};
use lamina_expr::logical_plan::LogicalPlan;
use lamina_expr::window::WindowKind;
use std::sync::Arc;

/// Perform common sub-expression elimination within each plan node.
#[derive(Default)]
pub struct CommonSubexprEliminate;

impl CommonSubexprEliminate {
    pub fn new() -> Self {
        Self {}
    }
}

impl OptimizerRule for CommonSubexprEliminate {
    fn name(&self) -> &str {
        "common_subexpr_eliminate"
    }

    fn rewrite(&self, plan: &Arc<LogicalPlan>, arena: &mut Arena) -> Result<Arc<LogicalPlan>> {
        // expressions of the whole plan share one arena, so one
        // expression set covers every node of the tree
        let mut seen: HashMap<String, NodeId> = HashMap::new();
        rewrite_plan_exprs(plan, arena, &mut |arena, id| canonicalize(arena, id, &mut seen))
    }
}

/// Deterministic signature of a node's payload, or `None` for payloads
/// that do not compare structurally.
fn signature(arena: &Arena, id: NodeId) -> Result<Option<String>> {
    let node = arena.get(id)?;
    let sig = match &node.payload {
        NodePayload::Column { name } => format!("Column-{}", arena.string(*name)?),
        NodePayload::Literal { value } => {
            if float_nan(value) {
                return Ok(None);
            }
            format!("Literal-{}-{}", value.data_type(), value)
        }
        NodePayload::Binary { op } => format!("Binary-{op:?}"),
        NodePayload::Unary { op } => format!("Unary-{op:?}"),
        NodePayload::Agg { op } => format!("Agg-{op}"),
        NodePayload::Function { name } => format!("Function-{}", arena.string(*name)?),
        NodePayload::Cast { type_name } => format!("Cast-{}", arena.string(*type_name)?),
        NodePayload::Alias { name } => format!("Alias-{}", arena.string(*name)?),
        NodePayload::Sort { descending } => format!("Sort-{descending}"),
        NodePayload::Filter => "Filter".to_string(),
        NodePayload::Slice { offset, len } => format!("Slice-{offset}-{len}"),
        NodePayload::Ternary => "Ternary".to_string(),
        // an opaque window capability carries state its name does not
        // expose (offsets, bucket counts); only lifted aggregates
        // compare structurally
        NodePayload::Window { func, spec } => match func {
            WindowKind::Function(_) => return Ok(None),
            WindowKind::Aggregate(op) => format!(
                "Window-{op}-[{}]-[{}]",
                spec.partition_columns().iter().join(","),
                spec.order_columns().iter().join(",")
            ),
        },
    };
    Ok(Some(sig))
}

fn float_nan(value: &ScalarValue) -> bool {
    match value {
        ScalarValue::Float32(v) => v.is_nan(),
        ScalarValue::Float64(v) => v.is_nan(),
        _ => false,
    }
}

fn canonicalize(
    arena: &mut Arena,
    id: NodeId,
    seen: &mut HashMap<String, NodeId>,
) -> Result<NodeId> {
    let Some(sig) = signature(arena, id)? else {
        return Ok(id);
    };
    let key = format!(
        "{sig}|{}",
        arena.get(id)?.children.iter().map(|c| c.value()).join(",")
    );
    Ok(*seen.entry(key).or_insert(id))
}
