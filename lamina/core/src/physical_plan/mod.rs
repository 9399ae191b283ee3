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

//! Physical operators: the tree that actually produces a table.
//!
//! Evaluation is strictly bottom-up on the caller's thread; every
//! operator re-checks the cancellation token before producing its
//! output, so a signalled token short-circuits at the next operator
//! boundary.

pub mod aggregate;
pub mod filter;
pub mod join;
pub mod planner;
pub mod projection;
pub mod scan;
pub mod windows;

use crate::execution::TaskContext;
use lamina_common::error::Result;
use lamina_frame::DataFrame;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

pub use aggregate::AggregateExec;
pub use filter::FilterExec;
pub use join::HashJoinExec;
pub use planner::PhysicalPlanner;
pub use projection::ProjectionExec;
pub use scan::ScanExec;

/// A node of the physical plan.
pub trait ExecutionPlan: Debug + Send + Sync {
    /// Short operator name, e.g. `FilterExec`.
    fn name(&self) -> &str;

    /// Direct inputs, left to right.
    fn children(&self) -> Vec<&Arc<dyn ExecutionPlan>>;

    /// Run the operator and produce its table.
    fn execute(&self, ctx: &TaskContext) -> Result<DataFrame>;

    /// Downcast seam for tests and introspection.
    fn as_any(&self) -> &dyn Any;
}
