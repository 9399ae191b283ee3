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

//! Operator filtering its input by a boolean predicate.

use crate::execution::TaskContext;
use crate::physical_plan::ExecutionPlan;
use crate::reconstruct::reconstruct;
use lamina_common::error::Result;
use lamina_expr::arena::NodeId;
use lamina_expr::dsl::ArenaRef;
use lamina_frame::DataFrame;
use std::any::Any;
use std::sync::Arc;

/// Keeps the input rows for which the predicate evaluates to true.
#[derive(Debug)]
pub struct FilterExec {
    input: Arc<dyn ExecutionPlan>,
    arena: ArenaRef,
    predicate: NodeId,
}

impl FilterExec {
    pub fn new(input: Arc<dyn ExecutionPlan>, arena: ArenaRef, predicate: NodeId) -> FilterExec {
        FilterExec {
            input,
            arena,
            predicate,
        }
    }

    pub fn predicate(&self) -> NodeId {
        self.predicate
    }
}

impl ExecutionPlan for FilterExec {
    fn name(&self) -> &str {
        "FilterExec"
    }

    fn children(&self) -> Vec<&Arc<dyn ExecutionPlan>> {
        vec![&self.input]
    }

    fn execute(&self, ctx: &TaskContext) -> Result<DataFrame> {
        let input = self.input.execute(ctx)?;
        ctx.token().check()?;
        let predicate = reconstruct(&self.arena.lock(), self.predicate)?;
        input.filter(&predicate)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
