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

//! Expands the wildcard column `*` and `col_type(<type>)` selectors in
//! projections into explicit column references over the input schema.
//!
//! Expansion needs the child plan's schema; when it cannot be computed
//! the plan is returned unchanged so the rule stays total.

use crate::utils::from_plan;
use crate::OptimizerRule;
use lamina_common::error::Result;
use lamina_common::scalar::ScalarValue;
use lamina_expr::arena::{Arena, NodeId, NodePayload, COL_TYPE_FUNCTION, WILDCARD};
use lamina_expr::logical_plan::LogicalPlan;
use std::sync::Arc;

/// Optimizer rule that replaces column selectors with the columns they
/// select, in schema order.
#[derive(Default)]
pub struct ExpandColumns;

impl ExpandColumns {
    pub fn new() -> Self {
        Self {}
    }
}

impl OptimizerRule for ExpandColumns {
    fn name(&self) -> &str {
        "expand_columns"
    }

    fn rewrite(&self, plan: &Arc<LogicalPlan>, arena: &mut Arena) -> Result<Arc<LogicalPlan>> {
        let children = plan.children();
        let mut new_children = Vec::with_capacity(children.len());
        let mut changed = false;
        for child in children {
            let rewritten = self.rewrite(child, arena)?;
            changed |= !Arc::ptr_eq(&rewritten, child);
            new_children.push(rewritten);
        }

        if let LogicalPlan::Projection(projection) = plan.as_ref() {
            let input = &new_children[0];
            if let Ok(schema) = input.schema(arena) {
                let mut exprs = Vec::with_capacity(projection.exprs.len());
                let mut expanded = false;
                for &id in &projection.exprs {
                    match selector(arena, id)? {
                        Some(Selector::Wildcard) => {
                            expanded = true;
                            for field in schema.fields() {
                                exprs.push(arena.add_column(field.name()));
                            }
                        }
                        Some(Selector::ByType(data_type)) => {
                            expanded = true;
                            for field in schema.fields() {
                                if field.data_type() == data_type {
                                    exprs.push(arena.add_column(field.name()));
                                }
                            }
                        }
                        None => exprs.push(id),
                    }
                }
                if expanded {
                    return Ok(Arc::new(from_plan(plan, &exprs, &new_children)?));
                }
            }
        }

        if !changed {
            return Ok(plan.clone());
        }
        Ok(Arc::new(plan.with_new_children(new_children)?))
    }
}

enum Selector {
    Wildcard,
    ByType(lamina_common::types::DataType),
}

fn selector(arena: &Arena, id: NodeId) -> Result<Option<Selector>> {
    let node = arena.get(id)?;
    match &node.payload {
        NodePayload::Column { name } => {
            if arena.string(*name)? == WILDCARD {
                Ok(Some(Selector::Wildcard))
            } else {
                Ok(None)
            }
        }
        NodePayload::Function { name } => {
            if arena.string(*name)? != COL_TYPE_FUNCTION || node.children.len() != 1 {
                return Ok(None);
            }
            match &arena.get(node.children[0])?.payload {
                NodePayload::Literal {
                    value: ScalarValue::Type(data_type),
                } => Ok(Some(Selector::ByType(*data_type))),
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_common::error::LaminaError;
    use lamina_common::schema::{Field, Schema, SchemaRef};
    use lamina_common::types::DataType;
    use lamina_expr::logical_plan::{Projection, Scan};
    use lamina_expr::source::DataSource;
    use lamina_expr::{fmt_plan, output_name};

    #[derive(Debug)]
    struct StaticSource(Option<SchemaRef>);

    impl DataSource for StaticSource {
        fn name(&self) -> String {
            "static".to_string()
        }

        fn schema(&self) -> Result<SchemaRef> {
            self.0
                .clone()
                .ok_or_else(|| LaminaError::MissingSource("no schema".to_string()))
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn scan(schema: Option<SchemaRef>) -> Arc<LogicalPlan> {
        Arc::new(LogicalPlan::Scan(Scan::new(Arc::new(StaticSource(schema)))))
    }

    fn three_column_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int64, true),
            Field::new("b", DataType::Utf8, true),
            Field::new("c", DataType::Int64, true),
        ]))
    }

    #[test]
    fn wildcard_expands_in_schema_order() {
        let mut arena = Arena::new();
        let star = arena.add_column(WILDCARD);
        let plan = Arc::new(LogicalPlan::Projection(Projection::new(
            scan(Some(three_column_schema())),
            vec![star],
        )));

        let out = ExpandColumns::new().rewrite(&plan, &mut arena).unwrap();
        assert_eq!(
            fmt_plan(&out, &arena).unwrap(),
            "Projection: col(a), col(b), col(c)\n  Scan: static"
        );
    }

    #[test]
    fn type_selector_keeps_matching_columns_only() {
        let mut arena = Arena::new();
        let marker = arena.add_literal(ScalarValue::Type(DataType::Int64));
        let selector = arena.add_function(COL_TYPE_FUNCTION, vec![marker]);
        let plan = Arc::new(LogicalPlan::Projection(Projection::new(
            scan(Some(three_column_schema())),
            vec![selector],
        )));

        let out = ExpandColumns::new().rewrite(&plan, &mut arena).unwrap();
        let LogicalPlan::Projection(projection) = out.as_ref() else {
            panic!("expected projection");
        };
        let names: Vec<String> = projection
            .exprs
            .iter()
            .map(|&id| output_name(&arena, id).unwrap())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn absent_schema_short_circuits() {
        let mut arena = Arena::new();
        let star = arena.add_column(WILDCARD);
        let plan = Arc::new(LogicalPlan::Projection(Projection::new(
            scan(None),
            vec![star],
        )));

        let out = ExpandColumns::new().rewrite(&plan, &mut arena).unwrap();
        assert!(Arc::ptr_eq(&out, &plan));
    }
}
