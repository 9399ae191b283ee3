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

//! Operator producing one output column per expression.
//!
//! A projection of plain column references turns into a `select` on the
//! input table. Anything computed, including window expressions that
//! the engine evaluates itself, is built column by column and
//! assembled into a fresh frame.

use crate::execution::TaskContext;
use crate::physical_plan::windows::execute_window;
use crate::physical_plan::ExecutionPlan;
use crate::reconstruct::reconstruct;
use itertools::Itertools;
use lamina_common::error::{LaminaError, Result};
use lamina_expr::arena::{Arena, NodeId, NodeKind, NodePayload};
use lamina_expr::dsl::ArenaRef;
use lamina_expr::naming::output_name;
use lamina_frame::eval::evaluate;
use lamina_frame::{DataFrame, Series};
use std::any::Any;
use std::sync::Arc;

/// Emits the projected columns of its input.
#[derive(Debug)]
pub struct ProjectionExec {
    input: Arc<dyn ExecutionPlan>,
    arena: ArenaRef,
    exprs: Vec<NodeId>,
}

impl ProjectionExec {
    pub fn new(input: Arc<dyn ExecutionPlan>, arena: ArenaRef, exprs: Vec<NodeId>) -> ProjectionExec {
        ProjectionExec {
            input,
            arena,
            exprs,
        }
    }

    pub fn exprs(&self) -> &[NodeId] {
        &self.exprs
    }
}

impl ExecutionPlan for ProjectionExec {
    fn name(&self) -> &str {
        "ProjectionExec"
    }

    fn children(&self) -> Vec<&Arc<dyn ExecutionPlan>> {
        vec![&self.input]
    }

    fn execute(&self, ctx: &TaskContext) -> Result<DataFrame> {
        let input = self.input.execute(ctx)?;
        ctx.token().check()?;
        let arena = self.arena.lock();

        let names = self
            .exprs
            .iter()
            .map(|&id| output_name(&arena, id))
            .collect::<Result<Vec<_>>>()?;
        if let Some(name) = names.iter().duplicates().next() {
            return Err(LaminaError::DuplicateProjection(name.clone()));
        }

        if self
            .exprs
            .iter()
            .map(|&id| Ok(arena.get(id)?.kind() == NodeKind::Column))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .all(|plain| plain)
        {
            return input.select(&names);
        }

        let columns = self
            .exprs
            .iter()
            .map(|&id| project_column(&input, &arena, id))
            .collect::<Result<Vec<Series>>>()?;
        DataFrame::new(columns)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn project_column(input: &DataFrame, arena: &Arena, id: NodeId) -> Result<Series> {
    let node = arena.get(id)?;
    match &node.payload {
        NodePayload::Window { .. } => execute_window(input, arena, id),
        NodePayload::Alias { name } => {
            let child = node.children[0];
            let name = arena.string(*name)?.to_string();
            if arena.get(child)?.kind() == NodeKind::Window {
                Ok(execute_window(input, arena, child)?.with_name(name))
            } else {
                let expr = reconstruct(arena, id)?;
                evaluate(input, &expr)
            }
        }
        _ => {
            let expr = reconstruct(arena, id)?;
            evaluate(input, &expr)
        }
    }
}
