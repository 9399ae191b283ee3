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

//! Window functions provide the ability to perform calculations across
//! sets of rows that are related to the current query row.
//!
//! The ranking family works over the partition's peer groups (rows that
//! tie under the spec's ordering); the positional family reads the
//! bound column's values at fixed offsets within the partition.

use lamina_common::error::Result;
use lamina_common::exec_err;
use lamina_common::scalar::ScalarValue;
use lamina_common::types::DataType;
use lamina_expr::dsl::Expr;
use lamina_expr::window::{WindowExprBuilder, WindowFunction, WindowPartition};
use std::sync::Arc;

/// number of the current row within its partition, counting from 1
#[derive(Debug)]
pub struct RowNumber;

impl WindowFunction for RowNumber {
    fn name(&self) -> &str {
        "row_number"
    }

    fn data_type(&self, _input: DataType) -> DataType {
        DataType::Int64
    }

    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>> {
        Ok((1..=partition.len() as i64)
            .map(ScalarValue::Int64)
            .collect())
    }
}

/// rank of the current row with gaps; equals the row number of its
/// first peer
#[derive(Debug)]
pub struct Rank;

impl WindowFunction for Rank {
    fn name(&self) -> &str {
        "rank"
    }

    fn data_type(&self, _input: DataType) -> DataType {
        DataType::Int64
    }

    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>> {
        let mut out = Vec::with_capacity(partition.len());
        let mut rank = 0i64;
        for i in 0..partition.len() {
            if partition.is_peer_start(i) {
                rank = i as i64 + 1;
            }
            out.push(ScalarValue::Int64(rank));
        }
        Ok(out)
    }
}

/// rank of the current row without gaps; counts peer groups
#[derive(Debug)]
pub struct DenseRank;

impl WindowFunction for DenseRank {
    fn name(&self) -> &str {
        "dense_rank"
    }

    fn data_type(&self, _input: DataType) -> DataType {
        DataType::Int64
    }

    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>> {
        let mut out = Vec::with_capacity(partition.len());
        let mut rank = 0i64;
        for i in 0..partition.len() {
            if partition.is_peer_start(i) {
                rank += 1;
            }
            out.push(ScalarValue::Int64(rank));
        }
        Ok(out)
    }
}

/// relative rank of the current row: (rank - 1) / (total rows - 1)
#[derive(Debug)]
pub struct PercentRank;

impl WindowFunction for PercentRank {
    fn name(&self) -> &str {
        "percent_rank"
    }

    fn data_type(&self, _input: DataType) -> DataType {
        DataType::Float64
    }

    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>> {
        let n = partition.len();
        let mut out = Vec::with_capacity(n);
        let mut rank = 0usize;
        for i in 0..n {
            if partition.is_peer_start(i) {
                rank = i + 1;
            }
            let value = if n <= 1 {
                0.0
            } else {
                (rank - 1) as f64 / (n - 1) as f64
            };
            out.push(ScalarValue::Float64(value));
        }
        Ok(out)
    }
}

/// integer from 1 to `tiles`, splitting the partition as evenly as
/// possible with the larger buckets first
#[derive(Debug)]
pub struct Ntile {
    tiles: usize,
}

impl Ntile {
    pub fn new(tiles: usize) -> Ntile {
        Ntile { tiles }
    }
}

impl WindowFunction for Ntile {
    fn name(&self) -> &str {
        "ntile"
    }

    fn data_type(&self, _input: DataType) -> DataType {
        DataType::Int64
    }

    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>> {
        if self.tiles == 0 {
            return exec_err!("ntile requires at least one bucket");
        }
        let n = partition.len();
        let base = n / self.tiles;
        let remainder = n % self.tiles;
        let mut out = Vec::with_capacity(n);
        let mut row = 0usize;
        for tile in 0..self.tiles {
            let size = base + usize::from(tile < remainder);
            for _ in 0..size {
                out.push(ScalarValue::Int64(tile as i64 + 1));
                row += 1;
            }
        }
        // more buckets than rows: every row got its own bucket already
        debug_assert!(row == n);
        Ok(out)
    }
}

fn values_of<'a>(
    partition: &'a WindowPartition,
    func: &str,
) -> Result<&'a [ScalarValue]> {
    match partition.values {
        Some(values) => Ok(values),
        None => exec_err!("{func} requires a column input"),
    }
}

/// value of the row `offset` rows before the current one, null at the
/// start of the partition
#[derive(Debug)]
pub struct Lag {
    offset: usize,
}

impl Lag {
    pub fn new(offset: usize) -> Lag {
        Lag { offset }
    }
}

impl WindowFunction for Lag {
    fn name(&self) -> &str {
        "lag"
    }

    fn data_type(&self, input: DataType) -> DataType {
        input
    }

    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>> {
        let values = values_of(partition, "lag")?;
        Ok((0..values.len())
            .map(|i| {
                i.checked_sub(self.offset)
                    .map(|j| values[j].clone())
                    .unwrap_or(ScalarValue::Null)
            })
            .collect())
    }
}

/// value of the row `offset` rows after the current one, null at the
/// end of the partition
#[derive(Debug)]
pub struct Lead {
    offset: usize,
}

impl Lead {
    pub fn new(offset: usize) -> Lead {
        Lead { offset }
    }
}

impl WindowFunction for Lead {
    fn name(&self) -> &str {
        "lead"
    }

    fn data_type(&self, input: DataType) -> DataType {
        input
    }

    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>> {
        let values = values_of(partition, "lead")?;
        Ok((0..values.len())
            .map(|i| {
                values
                    .get(i + self.offset)
                    .cloned()
                    .unwrap_or(ScalarValue::Null)
            })
            .collect())
    }
}

/// value of the partition's first row
#[derive(Debug)]
pub struct FirstValue;

impl WindowFunction for FirstValue {
    fn name(&self) -> &str {
        "first_value"
    }

    fn data_type(&self, input: DataType) -> DataType {
        input
    }

    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>> {
        let values = values_of(partition, "first_value")?;
        let first = values.first().cloned().unwrap_or(ScalarValue::Null);
        Ok(vec![first; partition.len()])
    }
}

/// value of the partition's last row
#[derive(Debug)]
pub struct LastValue;

impl WindowFunction for LastValue {
    fn name(&self) -> &str {
        "last_value"
    }

    fn data_type(&self, input: DataType) -> DataType {
        input
    }

    fn compute(&self, partition: &WindowPartition) -> Result<Vec<ScalarValue>> {
        let values = values_of(partition, "last_value")?;
        let last = values.last().cloned().unwrap_or(ScalarValue::Null);
        Ok(vec![last; partition.len()])
    }
}

/// Create a `row_number()` window builder.
pub fn row_number() -> WindowExprBuilder {
    WindowExprBuilder::new(Arc::new(RowNumber))
}

/// Create a `rank()` window builder.
pub fn rank() -> WindowExprBuilder {
    WindowExprBuilder::new(Arc::new(Rank))
}

/// Create a `dense_rank()` window builder.
pub fn dense_rank() -> WindowExprBuilder {
    WindowExprBuilder::new(Arc::new(DenseRank))
}

/// Create a `percent_rank()` window builder.
pub fn percent_rank() -> WindowExprBuilder {
    WindowExprBuilder::new(Arc::new(PercentRank))
}

/// Create an `ntile(k)` window builder.
pub fn ntile(tiles: usize) -> WindowExprBuilder {
    WindowExprBuilder::new(Arc::new(Ntile::new(tiles)))
}

/// Create a `lag(input, offset)` window builder bound to a column.
pub fn lag(input: Expr, offset: usize) -> WindowExprBuilder {
    WindowExprBuilder::new_bound(Arc::new(Lag::new(offset)), input)
}

/// Create a `lead(input, offset)` window builder bound to a column.
pub fn lead(input: Expr, offset: usize) -> WindowExprBuilder {
    WindowExprBuilder::new_bound(Arc::new(Lead::new(offset)), input)
}

/// Create a `first_value(input)` window builder bound to a column.
pub fn first_value(input: Expr) -> WindowExprBuilder {
    WindowExprBuilder::new_bound(Arc::new(FirstValue), input)
}

/// Create a `last_value(input)` window builder bound to a column.
pub fn last_value(input: Expr) -> WindowExprBuilder {
    WindowExprBuilder::new_bound(Arc::new(LastValue), input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition<'a>(
        rows: &'a [usize],
        values: Option<&'a [ScalarValue]>,
        peers: Option<&'a [bool]>,
    ) -> WindowPartition<'a> {
        WindowPartition {
            rows,
            values,
            peer_starts: peers,
        }
    }

    #[test]
    fn row_numbers_are_one_based() {
        let rows = [4, 7, 9];
        let out = RowNumber.compute(&partition(&rows, None, None)).unwrap();
        assert_eq!(
            out,
            vec![
                ScalarValue::Int64(1),
                ScalarValue::Int64(2),
                ScalarValue::Int64(3)
            ]
        );
    }

    #[test]
    fn rank_respects_peers() {
        let rows = [0, 1, 2, 3];
        // values tie in the middle: peers are rows 1 and 2
        let peers = [true, true, false, true];
        let out = Rank.compute(&partition(&rows, None, Some(&peers))).unwrap();
        assert_eq!(
            out,
            vec![
                ScalarValue::Int64(1),
                ScalarValue::Int64(2),
                ScalarValue::Int64(2),
                ScalarValue::Int64(4)
            ]
        );

        let out = DenseRank
            .compute(&partition(&rows, None, Some(&peers)))
            .unwrap();
        assert_eq!(
            out,
            vec![
                ScalarValue::Int64(1),
                ScalarValue::Int64(2),
                ScalarValue::Int64(2),
                ScalarValue::Int64(3)
            ]
        );
    }

    #[test]
    fn percent_rank_of_single_row_is_zero() {
        let rows = [0];
        let out = PercentRank.compute(&partition(&rows, None, None)).unwrap();
        assert_eq!(out, vec![ScalarValue::Float64(0.0)]);
    }

    #[test]
    fn ntile_fills_larger_buckets_first() {
        let rows = [0, 1, 2, 3, 4];
        let out = Ntile::new(2).compute(&partition(&rows, None, None)).unwrap();
        assert_eq!(
            out,
            vec![
                ScalarValue::Int64(1),
                ScalarValue::Int64(1),
                ScalarValue::Int64(1),
                ScalarValue::Int64(2),
                ScalarValue::Int64(2)
            ]
        );
    }

    #[test]
    fn lag_and_lead_shift_with_null_fill() {
        let rows = [0, 1, 2];
        let values = [
            ScalarValue::Int64(10),
            ScalarValue::Int64(20),
            ScalarValue::Int64(30),
        ];
        let out = Lag::new(1)
            .compute(&partition(&rows, Some(&values), None))
            .unwrap();
        assert_eq!(
            out,
            vec![
                ScalarValue::Null,
                ScalarValue::Int64(10),
                ScalarValue::Int64(20)
            ]
        );

        let out = Lead::new(2)
            .compute(&partition(&rows, Some(&values), None))
            .unwrap();
        assert_eq!(
            out,
            vec![ScalarValue::Int64(30), ScalarValue::Null, ScalarValue::Null]
        );
    }

    #[test]
    fn first_and_last_value_broadcast() {
        let rows = [0, 1, 2];
        let values = [
            ScalarValue::Int64(10),
            ScalarValue::Int64(20),
            ScalarValue::Int64(30),
        ];
        let out = FirstValue
            .compute(&partition(&rows, Some(&values), None))
            .unwrap();
        assert_eq!(out, vec![ScalarValue::Int64(10); 3]);

        let out = LastValue
            .compute(&partition(&rows, Some(&values), None))
            .unwrap();
        assert_eq!(out, vec![ScalarValue::Int64(30); 3]);
    }

    #[test]
    fn unbound_positional_functions_error() {
        let rows = [0, 1];
        assert!(Lag::new(1).compute(&partition(&rows, None, None)).is_err());
    }
}
