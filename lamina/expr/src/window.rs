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

//! Window specifications and the window-function capability.
//!
//! A window expression either lifts an aggregate over a partition
//! (`col("v").sum().over(spec)`) or applies a ranking/positional
//! function supplied through the opaque [WindowFunction] capability.

use crate::arena::NodeKind;
use crate::dsl::Expr;
use lamina_common::error::{LaminaError, Result};
use lamina_common::operator::AggregateFunction;
use lamina_common::scalar::ScalarValue;
use lamina_common::types::DataType;
use std::fmt::Debug;
use std::sync::Arc;

/// Partition-by columns plus opaque ordering metadata, attached to a
/// window expression with `.over(spec)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    partition_by: Vec<String>,
    order_by: Vec<String>,
    descending: Vec<bool>,
}

impl WindowSpec {
    /// A spec partitioning by the given columns, with no ordering.
    pub fn partition_by<I, S>(columns: I) -> WindowSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WindowSpec {
            partition_by: columns.into_iter().map(Into::into).collect(),
            order_by: vec![],
            descending: vec![],
        }
    }

    /// Order rows within each partition by the given columns.
    pub fn with_order_by<I, S>(mut self, columns: I, descending: Vec<bool>) -> WindowSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = columns.into_iter().map(Into::into).collect();
        self.descending = descending;
        self
    }

    pub fn partition_columns(&self) -> &[String] {
        &self.partition_by
    }

    pub fn order_columns(&self) -> &[String] {
        &self.order_by
    }

    pub fn descending(&self) -> &[bool] {
        &self.descending
    }
}

/// One partition's view of the input, handed to
/// [`WindowFunction::compute`].
pub struct WindowPartition<'a> {
    /// Source row positions of this partition. When the spec carries an
    /// ordering the positions come pre-sorted by it.
    pub rows: &'a [usize],
    /// Values of the bound input column at `rows`, when the function is
    /// bound to a column.
    pub values: Option<&'a [ScalarValue]>,
    /// `true` at each position that starts a new peer group under the
    /// spec's ordering. Absent when the spec has no ordering, in which
    /// case every row is its own peer group.
    pub peer_starts: Option<&'a [bool]>,
}

impl WindowPartition<'_> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether position `i` begins a new peer group.
    pub fn is_peer_start(&self, i: usize) -> bool {
        self.peer_starts.map(|starts| starts[i]).unwrap_or(true)
    }
}

/// A pluggable window algorithm. The engine partitions rows, calls
/// `compute` once per partition and scatters the results back; it never
/// inspects the implementation.
pub trait WindowFunction: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Output type given the bound column's type.
    fn data_type(&self, input: DataType) -> DataType;

    /// One output value per partition row, in partition order.
    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>>;
}

/// What a window node computes over each partition: a lifted aggregate,
/// executed by the engine itself, or an opaque [WindowFunction].
#[derive(Debug, Clone)]
pub enum WindowKind {
    Aggregate(AggregateFunction),
    Function(Arc<dyn WindowFunction>),
}

impl WindowKind {
    pub fn name(&self) -> &str {
        match self {
            WindowKind::Aggregate(func) => func.name(),
            WindowKind::Function(func) => func.name(),
        }
    }

    pub fn data_type(&self, input: DataType) -> DataType {
        match self {
            WindowKind::Aggregate(func) => match func {
                AggregateFunction::Count => DataType::Int64,
                AggregateFunction::Mean
                | AggregateFunction::Std
                | AggregateFunction::Var
                | AggregateFunction::Median => DataType::Float64,
                _ => input,
            },
            WindowKind::Function(func) => func.data_type(input),
        }
    }
}

/// Builder returned by window-function factories such as `row_number()`;
/// `.over(spec)` finalizes it into a window expression.
#[derive(Debug)]
pub struct WindowExprBuilder {
    func: Arc<dyn WindowFunction>,
    input: Option<Expr>,
}

impl WindowExprBuilder {
    /// A builder with no input column, e.g. `row_number()`.
    pub fn new(func: Arc<dyn WindowFunction>) -> WindowExprBuilder {
        WindowExprBuilder { func, input: None }
    }

    /// A builder bound to a column, e.g. `lag(col("v"), 1)`.
    pub fn new_bound(func: Arc<dyn WindowFunction>, input: Expr) -> WindowExprBuilder {
        WindowExprBuilder {
            func,
            input: Some(input),
        }
    }

    /// Finalize into a window expression over `spec`.
    ///
    /// A bound input must be a plain column reference; anything else is
    /// [`LaminaError::BadWindowInput`].
    pub fn over(self, spec: WindowSpec) -> Result<Expr> {
        match self.input {
            None => Ok(Expr::new_window(WindowKind::Function(self.func), spec, None)),
            Some(input) => {
                let kind = input.with_arena(|arena| Ok(arena.must_get(input.id()).kind()))?;
                if kind != NodeKind::Column {
                    return Err(LaminaError::BadWindowInput(format!("{kind:?}")));
                }
                Ok(input.map_window(WindowKind::Function(self.func), spec))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_window_types() {
        let sum = WindowKind::Aggregate(AggregateFunction::Sum);
        assert_eq!(sum.data_type(DataType::Int32), DataType::Int32);

        let count = WindowKind::Aggregate(AggregateFunction::Count);
        assert_eq!(count.data_type(DataType::Utf8), DataType::Int64);

        let mean = WindowKind::Aggregate(AggregateFunction::Mean);
        assert_eq!(mean.data_type(DataType::Int64), DataType::Float64);
    }

    #[test]
    fn spec_builder() {
        let spec = WindowSpec::partition_by(["k"]).with_order_by(["v"], vec![true]);
        assert_eq!(spec.partition_columns(), &["k".to_string()]);
        assert_eq!(spec.order_columns(), &["v".to_string()]);
        assert_eq!(spec.descending(), &[true]);
    }
}
