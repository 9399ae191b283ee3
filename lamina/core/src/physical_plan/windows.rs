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

//! Window evaluation over a materialized frame.
//!
//! Rows are partitioned by the spec's partition-by columns (compound
//! key, zero-byte delimited). A lifted aggregate computes one scalar
//! per partition and scatters it to every partition row; an opaque
//! window function computes per-partition vectors that are scattered
//! back into a single output column. The output element type follows
//! the first partition's result and only `i64` and `f64` elements can
//! be assembled.

use lamina_common::error::{LaminaError, Result};
use lamina_common::exec_err;
use lamina_common::scalar::ScalarValue;
use lamina_common::types::DataType;
use lamina_expr::arena::{Arena, NodeId, NodePayload};
use lamina_expr::naming::output_name;
use lamina_expr::window::{WindowKind, WindowPartition, WindowSpec};
use lamina_frame::groupby::partition_indices;
use lamina_frame::{DataFrame, Series};
use std::cmp::Ordering;

/// Evaluate the window node at `id` against `df`, producing one output
/// column of `df.height()` rows.
pub fn execute_window(df: &DataFrame, arena: &Arena, id: NodeId) -> Result<Series> {
    let node = arena.get(id)?;
    let NodePayload::Window { func, spec } = &node.payload else {
        return Err(LaminaError::UnsupportedExpression(format!(
            "{:?} is not a window expression",
            node.kind()
        )));
    };

    let column = match node.children.first() {
        Some(&child) => {
            let name = output_name(arena, child)?;
            Some(df.column(&name)?)
        }
        None => None,
    };

    let mut partitions = partition_indices(df, spec.partition_columns())?;
    let ordering = OrderContext::new(df, spec)?;
    for rows in &mut partitions {
        ordering.sort(rows);
    }

    let name = output_name(arena, id)?;
    match func {
        WindowKind::Aggregate(op) => {
            let column = column.ok_or_else(|| {
                LaminaError::BadWindowInput("aggregate window without a column".to_string())
            })?;
            let mut out = vec![ScalarValue::Null; df.height()];
            for rows in &partitions {
                let value = column.take(rows).aggregate(*op)?;
                for &row in rows {
                    out[row] = value.clone();
                }
            }
            let dtype = WindowKind::Aggregate(*op).data_type(column.data_type());
            Series::from_scalars_typed(name, dtype, &out)
        }
        WindowKind::Function(function) => {
            let mut out = vec![ScalarValue::Null; df.height()];
            for rows in &partitions {
                let values: Option<Vec<ScalarValue>> =
                    column.map(|c| rows.iter().map(|&row| c.get(row)).collect());
                let peer_starts = ordering.peer_starts(rows);
                let partition = WindowPartition {
                    rows,
                    values: values.as_deref(),
                    peer_starts: peer_starts.as_deref(),
                };
                let result = function.compute(&partition)?;
                if result.len() != rows.len() {
                    return exec_err!(
                        "window function '{}' produced {} values for a partition of {} rows",
                        function.name(),
                        result.len(),
                        rows.len()
                    );
                }
                for (value, &row) in result.into_iter().zip(rows) {
                    out[row] = value;
                }
            }
            let dtype = scatter_type(&partitions, &out)?;
            Series::from_scalars_typed(name, dtype, &out)
        }
    }
}

// the first partition's first non-null element dictates the output type
fn scatter_type(partitions: &[Vec<usize>], out: &[ScalarValue]) -> Result<DataType> {
    for rows in partitions {
        for &row in rows {
            match &out[row] {
                ScalarValue::Null => continue,
                ScalarValue::Int64(_) => return Ok(DataType::Int64),
                ScalarValue::Float64(_) => return Ok(DataType::Float64),
                other => {
                    return Err(LaminaError::UnsupportedWindowResult(
                        other.data_type().to_string(),
                    ))
                }
            }
        }
    }
    Ok(DataType::Null)
}

// resolves the spec's order-by columns once per window evaluation
struct OrderContext<'a> {
    columns: Vec<&'a Series>,
    descending: Vec<bool>,
}

impl<'a> OrderContext<'a> {
    fn new(df: &'a DataFrame, spec: &WindowSpec) -> Result<OrderContext<'a>> {
        let columns = spec
            .order_columns()
            .iter()
            .map(|name| df.column(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(OrderContext {
            columns,
            descending: spec.descending().to_vec(),
        })
    }

    /// Stable in-partition sort by the order columns; rows tie into
    /// peer groups. Without order columns this is the identity.
    fn sort(&self, rows: &mut [usize]) {
        if self.columns.is_empty() {
            return;
        }
        rows.sort_by(|&a, &b| self.compare_rows(a, b));
    }

    fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        for (i, column) in self.columns.iter().enumerate() {
            let ordering = column
                .get(a)
                .order(&column.get(b))
                .unwrap_or(Ordering::Equal);
            let ordering = if self.descending.get(i).copied().unwrap_or(false) {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Peer-group starts for a sorted partition; `None` without an
    /// ordering (every row is then its own peer group).
    fn peer_starts(&self, rows: &[usize]) -> Option<Vec<bool>> {
        if self.columns.is_empty() {
            return None;
        }
        let starts = rows
            .iter()
            .enumerate()
            .map(|(i, &row)| i == 0 || self.compare_rows(rows[i - 1], row) != Ordering::Equal)
            .collect();
        Some(starts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_common::operator::AggregateFunction;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new_utf8("k", vec!["a", "a", "b"]),
            Series::new_i64("v", vec![1, 2, 3]),
        ])
        .unwrap()
    }

    fn window_node(arena: &mut Arena, kind: WindowKind, bound: bool) -> NodeId {
        let child = bound.then(|| arena.add_column("v"));
        arena.add_window(kind, WindowSpec::partition_by(["k"]), child)
    }

    #[test]
    fn aggregate_window_scatters_partition_sums() {
        let mut arena = Arena::new();
        let id = window_node(
            &mut arena,
            WindowKind::Aggregate(AggregateFunction::Sum),
            true,
        );
        let out = execute_window(&frame(), &arena, id).unwrap();
        assert_eq!(out.name(), "v_sum");
        assert_eq!(
            out.iter().collect::<Vec<_>>(),
            vec![
                ScalarValue::Int64(3),
                ScalarValue::Int64(3),
                ScalarValue::Int64(3)
            ]
        );
    }

    #[test]
    fn function_window_numbers_each_partition() {
        let mut arena = Arena::new();
        let id = window_node(
            &mut arena,
            WindowKind::Function(std::sync::Arc::new(
                crate::window_functions::RowNumber,
            )),
            false,
        );
        let out = execute_window(&frame(), &arena, id).unwrap();
        assert_eq!(out.name(), "row_number");
        assert_eq!(
            out.iter().collect::<Vec<_>>(),
            vec![
                ScalarValue::Int64(1),
                ScalarValue::Int64(2),
                ScalarValue::Int64(1)
            ]
        );
    }

    #[test]
    fn string_window_results_are_rejected() {
        let mut arena = Arena::new();
        let child = arena.add_column("k");
        let id = arena.add_window(
            WindowKind::Function(std::sync::Arc::new(crate::window_functions::FirstValue)),
            WindowSpec::partition_by(["k"]),
            Some(child),
        );
        let err = execute_window(&frame(), &arena, id).unwrap_err();
        assert!(matches!(err, LaminaError::UnsupportedWindowResult(_)));
    }
}
