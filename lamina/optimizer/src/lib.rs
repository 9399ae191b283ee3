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

//! Rule based logical plan optimizer.
//!
//! An [Optimizer] runs an ordered list of [OptimizerRule]s over the
//! plan until one full pass leaves it untouched, bounded by
//! `max_passes`. Change is detected by pointer identity: a rule that
//! rewrites anything returns a newly allocated plan node. Rules are
//! total: on input they cannot resolve (say, a source whose schema is
//! unavailable) they return the plan unchanged rather than failing.

pub mod common_subexpr;
pub mod constant_folding;
pub mod expand_columns;
pub mod predicate_pushdown;
pub mod projection_pushdown;
pub mod simplify_boolean;
pub mod type_coercion;
pub mod utils;

use lamina_common::error::Result;
use lamina_expr::arena::Arena;
use lamina_expr::logical_plan::LogicalPlan;
use log::{debug, trace};
use std::sync::Arc;

pub use common_subexpr::CommonSubexprEliminate;
pub use constant_folding::ConstantFolding;
pub use expand_columns::ExpandColumns;
pub use predicate_pushdown::PredicatePushDown;
pub use projection_pushdown::ProjectionPushDown;
pub use simplify_boolean::SimplifyBoolean;
pub use type_coercion::TypeCoercion;

/// A transformation of the logical plan that preserves its semantics.
///
/// A rule signals "changed" by returning a different [Arc] than it was
/// given; returning the input untouched means no rewrite applied. Rules
/// may allocate new expression nodes in the arena but never mutate
/// existing ones.
pub trait OptimizerRule {
    /// A human readable name, used in logs.
    fn name(&self) -> &str;

    fn rewrite(&self, plan: &Arc<LogicalPlan>, arena: &mut Arena) -> Result<Arc<LogicalPlan>>;
}

/// Tunables for the optimizer pipeline. Every rule defaults to on.
#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    /// Upper bound on full passes over the rule list.
    pub max_passes: usize,
    pub constant_folding: bool,
    pub simplify_boolean: bool,
    pub expand_columns: bool,
    pub type_coercion: bool,
    pub common_subexpr: bool,
    pub predicate_pushdown: bool,
    pub projection_pushdown: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        OptimizerOptions {
            max_passes: 5,
            constant_folding: true,
            simplify_boolean: true,
            expand_columns: true,
            type_coercion: true,
            common_subexpr: true,
            predicate_pushdown: true,
            projection_pushdown: true,
        }
    }
}

/// The rule pipeline.
pub struct Optimizer {
    rules: Vec<Box<dyn OptimizerRule>>,
    max_passes: usize,
}

impl Optimizer {
    /// The default pipeline with every rule enabled.
    pub fn new() -> Optimizer {
        Optimizer::with_options(&OptimizerOptions::default())
    }

    /// A pipeline with the rules the options enable, in the default
    /// order.
    pub fn with_options(options: &OptimizerOptions) -> Optimizer {
        let mut rules: Vec<Box<dyn OptimizerRule>> = vec![];
        if options.constant_folding {
            rules.push(Box::new(ConstantFolding::new()));
        }
        if options.simplify_boolean {
            rules.push(Box::new(SimplifyBoolean::new()));
        }
        if options.expand_columns {
            rules.push(Box::new(ExpandColumns::new()));
        }
        if options.type_coercion {
            rules.push(Box::new(TypeCoercion::new()));
        }
        if options.common_subexpr {
            rules.push(Box::new(CommonSubexprEliminate::new()));
        }
        if options.predicate_pushdown {
            rules.push(Box::new(PredicatePushDown::new()));
        }
        if options.projection_pushdown {
            rules.push(Box::new(ProjectionPushDown::new()));
        }
        Optimizer {
            rules,
            max_passes: options.max_passes,
        }
    }

    /// Run the pipeline to fixed point.
    pub fn optimize(
        &self,
        mut plan: Arc<LogicalPlan>,
        arena: &mut Arena,
    ) -> Result<Arc<LogicalPlan>> {
        for pass in 0..self.max_passes {
            let mut changed = false;
            for rule in &self.rules {
                let rewritten = rule.rewrite(&plan, arena)?;
                if !Arc::ptr_eq(&rewritten, &plan) {
                    debug!("pass {}: rule '{}' rewrote the plan", pass, rule.name());
                    changed = true;
                }
                plan = rewritten;
            }
            if !changed {
                trace!("optimizer reached fixed point after {} passes", pass + 1);
                break;
            }
        }
        Ok(plan)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::new()
    }
}
