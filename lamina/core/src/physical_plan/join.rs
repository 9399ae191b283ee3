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

//! Naive hash join operator: the left input drives, the right input is
//! built into a key map. Both inputs evaluate on the caller's thread,
//! left first.

use crate::execution::TaskContext;
use crate::physical_plan::ExecutionPlan;
use lamina_common::error::{LaminaError, Result};
use lamina_common::operator::JoinType;
use lamina_expr::arena::{Arena, NodeId, NodePayload};
use lamina_expr::dsl::ArenaRef;
use lamina_frame::DataFrame;
use std::any::Any;
use std::sync::Arc;

/// Joins two inputs on key column equality.
#[derive(Debug)]
pub struct HashJoinExec {
    left: Arc<dyn ExecutionPlan>,
    right: Arc<dyn ExecutionPlan>,
    arena: ArenaRef,
    left_on: Vec<NodeId>,
    right_on: Vec<NodeId>,
    join_type: JoinType,
}

impl HashJoinExec {
    pub fn new(
        left: Arc<dyn ExecutionPlan>,
        right: Arc<dyn ExecutionPlan>,
        arena: ArenaRef,
        left_on: Vec<NodeId>,
        right_on: Vec<NodeId>,
        join_type: JoinType,
    ) -> HashJoinExec {
        HashJoinExec {
            left,
            right,
            arena,
            left_on,
            right_on,
            join_type,
        }
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }
}

impl ExecutionPlan for HashJoinExec {
    fn name(&self) -> &str {
        "HashJoinExec"
    }

    fn children(&self) -> Vec<&Arc<dyn ExecutionPlan>> {
        vec![&self.left, &self.right]
    }

    fn execute(&self, ctx: &TaskContext) -> Result<DataFrame> {
        let left = self.left.execute(ctx)?;
        let right = self.right.execute(ctx)?;
        ctx.token().check()?;

        let arena = self.arena.lock();
        let left_keys = key_names(&arena, &self.left_on)?;
        let right_keys = key_names(&arena, &self.right_on)?;
        left.join(&right, &left_keys, &right_keys, self.join_type)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn key_names(arena: &Arena, ids: &[NodeId]) -> Result<Vec<String>> {
    ids.iter()
        .map(|&id| match &arena.get(id)?.payload {
            NodePayload::Column { name } => Ok(arena.string(*name)?.to_string()),
            other => Err(LaminaError::UnsupportedExpression(format!(
                "join keys must be columns, got {:?}",
                other.kind()
            ))),
        })
        .collect()
}
