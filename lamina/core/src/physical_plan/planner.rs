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

//! Maps the optimized logical plan to physical operators.
//!
//! A scan compiles to [ScanExec], wrapped innermost-out by one
//! [FilterExec] per pushed predicate (in pushdown order) and then a
//! single [ProjectionExec] when projections were pushed. Every node
//! that carries expressions needs the arena they live in; compiling
//! such a node through a planner built without one is `MissingArena`.

use crate::datasource::source_as_executable;
use crate::physical_plan::{
    AggregateExec, ExecutionPlan, FilterExec, HashJoinExec, ProjectionExec, ScanExec,
};
use lamina_common::error::{LaminaError, Result};
use lamina_expr::dsl::ArenaRef;
use lamina_expr::logical_plan::LogicalPlan;
use log::debug;
use std::sync::Arc;

/// Compiles logical plans into executable operator trees.
#[derive(Default)]
pub struct PhysicalPlanner {
    arena: Option<ArenaRef>,
}

impl PhysicalPlanner {
    /// A planner with no arena; only expression-free plans compile.
    pub fn new() -> PhysicalPlanner {
        PhysicalPlanner { arena: None }
    }

    /// A planner resolving expressions against the given arena.
    pub fn with_arena(arena: ArenaRef) -> PhysicalPlanner {
        PhysicalPlanner { arena: Some(arena) }
    }

    pub fn create_physical_plan(&self, plan: &LogicalPlan) -> Result<Arc<dyn ExecutionPlan>> {
        let physical = self.compile(plan)?;
        debug!("compiled {} into {}", plan.describe(), physical.name());
        Ok(physical)
    }

    fn compile(&self, plan: &LogicalPlan) -> Result<Arc<dyn ExecutionPlan>> {
        match plan {
            LogicalPlan::Scan(scan) => {
                let source = source_as_executable(&scan.source)?;
                let mut exec: Arc<dyn ExecutionPlan> = Arc::new(ScanExec::new(source));
                if scan.predicates.is_empty() && scan.projections.is_empty() {
                    return Ok(exec);
                }
                let arena = self.require_arena(plan)?;
                for &predicate in &scan.predicates {
                    exec = Arc::new(FilterExec::new(exec, arena.clone(), predicate));
                }
                if !scan.projections.is_empty() {
                    exec = Arc::new(ProjectionExec::new(
                        exec,
                        arena,
                        scan.projections.clone(),
                    ));
                }
                Ok(exec)
            }
            LogicalPlan::Filter(filter) => {
                let input = self.compile(&filter.input)?;
                Ok(Arc::new(FilterExec::new(
                    input,
                    self.require_arena(plan)?,
                    filter.predicate,
                )))
            }
            LogicalPlan::Projection(projection) => {
                let input = self.compile(&projection.input)?;
                Ok(Arc::new(ProjectionExec::new(
                    input,
                    self.require_arena(plan)?,
                    projection.exprs.clone(),
                )))
            }
            LogicalPlan::Aggregate(aggregate) => {
                let input = self.compile(&aggregate.input)?;
                Ok(Arc::new(AggregateExec::new(
                    input,
                    self.require_arena(plan)?,
                    aggregate.keys.clone(),
                    aggregate.aggs.clone(),
                )))
            }
            LogicalPlan::Join(join) => {
                let left = self.compile(&join.left)?;
                let right = self.compile(&join.right)?;
                Ok(Arc::new(HashJoinExec::new(
                    left,
                    right,
                    self.require_arena(plan)?,
                    join.left_on.clone(),
                    join.right_on.clone(),
                    join.join_type,
                )))
            }
        }
    }

    fn require_arena(&self, plan: &LogicalPlan) -> Result<ArenaRef> {
        self.arena.clone().ok_or_else(|| {
            LaminaError::MissingArena(format!(
                "{} carries expressions but the planner has no arena",
                plan.describe()
            ))
        })
    }
}
