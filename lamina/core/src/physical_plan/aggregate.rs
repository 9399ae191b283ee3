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

//! Group-by aggregation operator.
//!
//! Keys must be plain column references and every aggregate must apply
//! to a column, optionally under an alias. Output columns are the keys
//! followed by the aggregates; an unaliased aggregate over column `v`
//! is named `v_<op>`.

use crate::execution::TaskContext;
use crate::physical_plan::ExecutionPlan;
use lamina_common::error::{LaminaError, Result};
use lamina_expr::arena::{Arena, NodeId, NodePayload};
use lamina_expr::dsl::ArenaRef;
use lamina_expr::naming::output_name;
use lamina_frame::{col, DataFrame, FrameExpr};
use std::any::Any;
use std::sync::Arc;

/// Groups its input by key columns and reduces each group.
#[derive(Debug)]
pub struct AggregateExec {
    input: Arc<dyn ExecutionPlan>,
    arena: ArenaRef,
    keys: Vec<NodeId>,
    aggs: Vec<NodeId>,
}

impl AggregateExec {
    pub fn new(
        input: Arc<dyn ExecutionPlan>,
        arena: ArenaRef,
        keys: Vec<NodeId>,
        aggs: Vec<NodeId>,
    ) -> AggregateExec {
        AggregateExec {
            input,
            arena,
            keys,
            aggs,
        }
    }
}

impl ExecutionPlan for AggregateExec {
    fn name(&self) -> &str {
        "AggregateExec"
    }

    fn children(&self) -> Vec<&Arc<dyn ExecutionPlan>> {
        vec![&self.input]
    }

    fn execute(&self, ctx: &TaskContext) -> Result<DataFrame> {
        let input = self.input.execute(ctx)?;
        ctx.token().check()?;
        let arena = self.arena.lock();

        let keys = self
            .keys
            .iter()
            .map(|&id| column_name(&arena, id))
            .collect::<Result<Vec<_>>>()?;

        let aggs = self
            .aggs
            .iter()
            .map(|&id| frame_aggregate(&arena, id))
            .collect::<Result<Vec<_>>>()?;

        input.group_by(&keys)?.agg(&aggs)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn column_name(arena: &Arena, id: NodeId) -> Result<String> {
    match &arena.get(id)?.payload {
        NodePayload::Column { name } => Ok(arena.string(*name)?.to_string()),
        other => Err(LaminaError::UnsupportedExpression(format!(
            "expected a column reference, got {:?}",
            other.kind()
        ))),
    }
}

/// Translate an aggregate node (optionally aliased) into the frame's
/// named aggregation.
fn frame_aggregate(arena: &Arena, id: NodeId) -> Result<(String, FrameExpr)> {
    let node = arena.get(id)?;
    let (agg_id, name) = match &node.payload {
        NodePayload::Alias { name } => (node.children[0], arena.string(*name)?.to_string()),
        NodePayload::Agg { .. } => (id, output_name(arena, id)?),
        other => {
            return Err(LaminaError::UnsupportedExpression(format!(
                "aggregations must be aggregate expressions, got {:?}",
                other.kind()
            )))
        }
    };
    let agg = arena.get(agg_id)?;
    let NodePayload::Agg { op } = &agg.payload else {
        return Err(LaminaError::UnsupportedExpression(format!(
            "aggregations must be aggregate expressions, got {:?}",
            agg.kind()
        )));
    };
    let column = column_name(arena, agg.children[0])?;
    Ok((
        name,
        FrameExpr::Aggregate {
            func: *op,
            expr: Box::new(col(column)),
        },
    ))
}
