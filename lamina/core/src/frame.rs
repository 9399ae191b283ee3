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

//! The lazy frame: the user-facing query builder.
//!
//! A [LazyFrame] owns the expression arena for its whole lineage and
//! accumulates a logical plan; nothing runs until [LazyFrame::collect],
//! which optimizes, compiles and executes. Expressions built with the
//! free factories are detached and splice into the frame's arena on
//! insertion; an expression that belongs to a *different* frame's arena
//! is rejected with `ArenaMismatch`.

use crate::datasource::{DefaultSource, ExecutableSource, MemSource};
use crate::execution::TaskContext;
use crate::physical_plan::PhysicalPlanner;
use lamina_common::error::Result;
use lamina_common::operator::JoinType;
use lamina_expr::arena::{NodeId, WILDCARD};
use lamina_expr::dsl::{col, new_arena, ArenaRef, Expr};
use lamina_expr::logical_plan::{Aggregate, Filter, Join, LogicalPlan, Projection, Scan};
use lamina_expr::fmt_plan;
use lamina_frame::DataFrame;
use lamina_optimizer::utils::from_plan;
use lamina_optimizer::{Optimizer, OptimizerOptions};
use std::sync::Arc;

/// A deferred query over a data source.
#[derive(Clone, Debug)]
pub struct LazyFrame {
    arena: ArenaRef,
    plan: Arc<LogicalPlan>,
    options: OptimizerOptions,
}

impl LazyFrame {
    /// Start a query over an executable source.
    pub fn scan(source: Arc<dyn ExecutableSource>) -> LazyFrame {
        let arena = new_arena();
        arena.lock().mark_adopted();
        let plan = Arc::new(LogicalPlan::Scan(Scan::new(Arc::new(DefaultSource::new(
            source,
        )))));
        LazyFrame {
            arena,
            plan,
            options: OptimizerOptions::default(),
        }
    }

    /// Start a query over an in-memory frame.
    pub fn from_frame(frame: DataFrame) -> LazyFrame {
        LazyFrame::scan(Arc::new(MemSource::new("mem", frame)))
    }

    pub fn logical_plan(&self) -> &Arc<LogicalPlan> {
        &self.plan
    }

    pub fn arena(&self) -> &ArenaRef {
        &self.arena
    }

    pub fn with_optimizer_options(mut self, options: OptimizerOptions) -> LazyFrame {
        self.options = options;
        self
    }

    fn derive(&self, plan: LogicalPlan) -> LazyFrame {
        LazyFrame {
            arena: self.arena.clone(),
            plan: Arc::new(plan),
            options: self.options.clone(),
        }
    }

    fn bind(&self, expr: &Expr) -> Result<NodeId> {
        expr.bind_to(&self.arena)
    }

    /// Keep the rows where `predicate` holds.
    pub fn filter(&self, predicate: Expr) -> Result<LazyFrame> {
        let predicate = self.bind(&predicate)?;
        Ok(self.derive(LogicalPlan::Filter(Filter::new(self.plan.clone(), predicate))))
    }

    /// Project one output column per expression.
    pub fn select(&self, exprs: impl IntoIterator<Item = Expr>) -> Result<LazyFrame> {
        let exprs = exprs
            .into_iter()
            .map(|e| self.bind(&e))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.derive(LogicalPlan::Projection(Projection::new(
            self.plan.clone(),
            exprs,
        ))))
    }

    /// Keep every column and add (or replace) `name` with `expr`.
    pub fn with_column(&self, name: &str, expr: Expr) -> Result<LazyFrame> {
        self.select([col(WILDCARD), expr.alias(name)])
    }

    /// Iterated [`LazyFrame::with_column`].
    pub fn with_columns(
        &self,
        named: impl IntoIterator<Item = (String, Expr)>,
    ) -> Result<LazyFrame> {
        let mut frame = self.clone();
        for (name, expr) in named {
            frame = frame.with_column(&name, expr)?;
        }
        Ok(frame)
    }

    /// Group by key expressions; aggregate with
    /// [`LazyGroupBy::agg`].
    pub fn group_by(&self, keys: impl IntoIterator<Item = Expr>) -> Result<LazyGroupBy> {
        let keys = keys
            .into_iter()
            .map(|e| self.bind(&e))
            .collect::<Result<Vec<_>>>()?;
        Ok(LazyGroupBy {
            frame: self.clone(),
            keys,
        })
    }

    /// Join with another lazy frame on key column equality.
    pub fn join(
        &self,
        other: &LazyFrame,
        left_on: impl IntoIterator<Item = Expr>,
        right_on: impl IntoIterator<Item = Expr>,
        join_type: JoinType,
    ) -> Result<LazyFrame> {
        let left_on = left_on
            .into_iter()
            .map(|e| self.bind(&e))
            .collect::<Result<Vec<_>>>()?;
        let right_on = right_on
            .into_iter()
            .map(|e| self.bind(&e))
            .collect::<Result<Vec<_>>>()?;
        let right_plan = import_plan(&other.plan, &other.arena, &self.arena)?;
        Ok(self.derive(LogicalPlan::Join(Join::new(
            self.plan.clone(),
            right_plan,
            left_on,
            right_on,
            join_type,
        ))))
    }

    /// Run the optimizer pipeline, returning the optimized frame.
    pub fn optimize(&self) -> Result<LazyFrame> {
        let optimized = {
            let mut arena = self.arena.lock();
            Optimizer::with_options(&self.options).optimize(self.plan.clone(), &mut arena)?
        };
        Ok(LazyFrame {
            arena: self.arena.clone(),
            plan: optimized,
            options: self.options.clone(),
        })
    }

    /// The plan rendered as an indented tree.
    pub fn explain(&self) -> Result<String> {
        fmt_plan(&self.plan, &self.arena.lock())
    }

    /// Optimize, compile and execute with a fresh context.
    pub fn collect(&self) -> Result<DataFrame> {
        self.collect_with_context(&TaskContext::new())
    }

    /// Optimize, compile and execute under the given context; the
    /// context's token cancels cooperatively at operator boundaries.
    pub fn collect_with_context(&self, ctx: &TaskContext) -> Result<DataFrame> {
        let optimized = self.optimize()?;
        let physical = PhysicalPlanner::with_arena(self.arena.clone())
            .create_physical_plan(&optimized.plan)?;
        physical.execute(ctx)
    }
}

/// A grouped lazy frame awaiting aggregation.
pub struct LazyGroupBy {
    frame: LazyFrame,
    keys: Vec<NodeId>,
}

impl LazyGroupBy {
    /// Finish the group-by with aggregate expressions; output columns
    /// are the keys followed by the aggregates.
    pub fn agg(&self, aggs: impl IntoIterator<Item = Expr>) -> Result<LazyFrame> {
        let aggs = aggs
            .into_iter()
            .map(|e| self.frame.bind(&e))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.frame.derive(LogicalPlan::Aggregate(Aggregate::new(
            self.frame.plan.clone(),
            self.keys.clone(),
            aggs,
        ))))
    }
}

// rebuild a plan whose expressions live in another frame's arena,
// splicing every referenced subtree into `to`
fn import_plan(
    plan: &Arc<LogicalPlan>,
    from: &ArenaRef,
    to: &ArenaRef,
) -> Result<Arc<LogicalPlan>> {
    if Arc::ptr_eq(from, to) {
        return Ok(plan.clone());
    }
    let children = plan
        .children()
        .iter()
        .map(|child| import_plan(child, from, to))
        .collect::<Result<Vec<_>>>()?;
    let exprs = plan.expressions();
    let new_exprs: Vec<NodeId> = {
        let source = from.lock();
        let mut target = to.lock();
        exprs
            .iter()
            .map(|&id| target.splice_from(&source, id))
            .collect()
    };
    Ok(Arc::new(from_plan(plan, &new_exprs, &children)?))
}
