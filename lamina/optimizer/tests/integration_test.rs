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

use lamina_common::error::Result;
use lamina_common::operator::Operator;
use lamina_common::scalar::ScalarValue;
use lamina_common::schema::{Field, Schema, SchemaRef};
use lamina_common::types::DataType;
use lamina_expr::arena::{Arena, NodeId, WILDCARD};
use lamina_expr::logical_plan::{Filter, LogicalPlan, Projection, Scan};
use lamina_expr::source::DataSource;
use lamina_expr::{fmt_expr, fmt_plan};
use lamina_optimizer::{Optimizer, OptimizerOptions};
use std::sync::Arc;

#[ctor::ctor]
fn init() {
    // enable RUST_LOG=debug to see which rules fire
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug)]
struct TestSource {
    schema: SchemaRef,
}

impl TestSource {
    fn new() -> Arc<TestSource> {
        Arc::new(TestSource {
            schema: Arc::new(Schema::new(vec![
                Field::new("a", DataType::Int64, true),
                Field::new("b", DataType::Utf8, true),
                Field::new("c", DataType::Float64, true),
            ])),
        })
    }
}

impl DataSource for TestSource {
    fn name(&self) -> String {
        "test".to_string()
    }

    fn schema(&self) -> Result<SchemaRef> {
        Ok(self.schema.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn scan() -> Arc<LogicalPlan> {
    Arc::new(LogicalPlan::Scan(Scan::new(TestSource::new())))
}

fn assert_optimized_plan_eq(plan: Arc<LogicalPlan>, arena: &mut Arena, expected: &str) {
    let optimized = Optimizer::new()
        .optimize(plan, arena)
        .expect("failed to optimize plan");
    assert_eq!(fmt_plan(&optimized, arena).unwrap(), expected);
}

fn gt_literal(arena: &mut Arena, column: &str, value: i64) -> NodeId {
    let col = arena.add_column(column);
    let lit = arena.add_literal(ScalarValue::Int64(value));
    arena.add_binary(col, Operator::Gt, lit)
}

#[test]
fn filter_collapses_into_scan() {
    // filter(a > 1) over a scan ends as a scan predicate with no
    // separate filter node
    let mut arena = Arena::new();
    let pred = gt_literal(&mut arena, "a", 1);
    let plan = Arc::new(LogicalPlan::Filter(Filter::new(scan(), pred)));

    assert_optimized_plan_eq(
        plan,
        &mut arena,
        "Scan: test predicates=[(col(a) > lit(1))]",
    );
}

#[test]
fn constant_true_filter_disappears() {
    // filter(1 + 2 > 2) folds to true and the filter is dropped
    let mut arena = Arena::new();
    let one = arena.add_literal(ScalarValue::Int64(1));
    let two = arena.add_literal(ScalarValue::Int64(2));
    let add = arena.add_binary(one, Operator::Plus, two);
    let pred = arena.add_binary(add, Operator::Gt, two);
    let plan = Arc::new(LogicalPlan::Filter(Filter::new(scan(), pred)));

    assert_optimized_plan_eq(plan, &mut arena, "Scan: test");
}

#[test]
fn wildcard_expands_then_pushes_into_scan() {
    let mut arena = Arena::new();
    let star = arena.add_column(WILDCARD);
    let plan = Arc::new(LogicalPlan::Projection(Projection::new(scan(), vec![star])));

    assert_optimized_plan_eq(
        plan,
        &mut arena,
        "Scan: test projection=[col(a), col(b), col(c)]",
    );
}

#[test]
fn mixed_numeric_comparison_gets_a_cast() {
    // a (i64) > c (f64): the integer side is cast to f64
    let mut arena = Arena::new();
    let a = arena.add_column("a");
    let c = arena.add_column("c");
    let pred = arena.add_binary(a, Operator::Gt, c);
    let plan = Arc::new(LogicalPlan::Filter(Filter::new(scan(), pred)));

    assert_optimized_plan_eq(
        plan,
        &mut arena,
        "Scan: test predicates=[(cast(col(a) AS f64) > col(c))]",
    );
}

#[test]
fn computed_projection_stays_above_the_scan() {
    let mut arena = Arena::new();
    let a = arena.add_column("a");
    let one = arena.add_literal(ScalarValue::Int64(1));
    let add = arena.add_binary(a, Operator::Plus, one);
    let aliased = arena.add_alias(add, "a1");
    let plan = Arc::new(LogicalPlan::Projection(Projection::new(scan(), vec![aliased])));

    assert_optimized_plan_eq(plan, &mut arena, "Projection: (col(a) + lit(1)) AS a1\n  Scan: test");
}

#[test]
fn common_subexpressions_share_nodes() {
    // (a + 1) as x, (a + 1) as y: both aliases end up over one subtree
    let mut arena = Arena::new();
    let a1 = arena.add_column("a");
    let one1 = arena.add_literal(ScalarValue::Int64(1));
    let add1 = arena.add_binary(a1, Operator::Plus, one1);
    let x = arena.add_alias(add1, "x");

    let a2 = arena.add_column("a");
    let one2 = arena.add_literal(ScalarValue::Int64(1));
    let add2 = arena.add_binary(a2, Operator::Plus, one2);
    let y = arena.add_alias(add2, "y");

    let plan = Arc::new(LogicalPlan::Projection(Projection::new(scan(), vec![x, y])));
    let optimized = Optimizer::new().optimize(plan, &mut arena).unwrap();

    let LogicalPlan::Projection(projection) = optimized.as_ref() else {
        panic!("expected projection, got {}", optimized.describe());
    };
    let lhs = arena.get(projection.exprs[0]).unwrap();
    let rhs = arena.get(projection.exprs[1]).unwrap();
    // same shared (a + 1) node under both aliases
    assert_eq!(lhs.children[0], rhs.children[0]);
}

#[test]
fn pipeline_reaches_a_fixed_point() {
    let mut arena = Arena::new();
    let pred = gt_literal(&mut arena, "a", 1);
    let b = arena.add_column("b");
    let plan = Arc::new(LogicalPlan::Projection(Projection::new(
        Arc::new(LogicalPlan::Filter(Filter::new(scan(), pred))),
        vec![b],
    )));

    let optimizer = Optimizer::new();
    let once = optimizer.optimize(plan, &mut arena).unwrap();
    let twice = optimizer.optimize(once.clone(), &mut arena).unwrap();
    // a fully optimized plan passes through every rule untouched
    assert!(Arc::ptr_eq(&once, &twice));
}

#[test]
fn disabled_rules_leave_the_plan_alone() {
    let mut arena = Arena::new();
    let pred = gt_literal(&mut arena, "a", 1);
    let plan = Arc::new(LogicalPlan::Filter(Filter::new(scan(), pred)));

    let options = OptimizerOptions {
        predicate_pushdown: false,
        ..Default::default()
    };
    let out = Optimizer::with_options(&options)
        .optimize(plan, &mut arena)
        .unwrap();
    assert_eq!(
        fmt_plan(&out, &arena).unwrap(),
        "Filter: (col(a) > lit(1))\n  Scan: test"
    );
}

#[test]
fn optimization_preserves_the_schema() {
    let mut arena = Arena::new();
    let star = arena.add_column(WILDCARD);
    let pred = gt_literal(&mut arena, "a", 0);
    let plan = Arc::new(LogicalPlan::Projection(Projection::new(
        Arc::new(LogicalPlan::Filter(Filter::new(scan(), pred))),
        vec![star],
    )));

    let optimized = Optimizer::new().optimize(plan, &mut arena).unwrap();
    let schema = optimized.schema(&arena).unwrap();
    assert_eq!(schema.field_names(), vec!["a", "b", "c"]);

    // sanity: the predicate survived somewhere in the tree
    let mut stack = vec![optimized];
    let mut predicates = vec![];
    while let Some(node) = stack.pop() {
        if let LogicalPlan::Scan(scan) = node.as_ref() {
            for &p in &scan.predicates {
                predicates.push(fmt_expr(&arena, p).unwrap());
            }
        }
        for child in node.children() {
            stack.push(child.clone());
        }
    }
    assert_eq!(predicates, vec!["(col(a) > lit(0))"]);
}
