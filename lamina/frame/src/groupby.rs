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

//! Hash grouping and per-group aggregation.

use crate::eval::evaluate;
use crate::expr::FrameExpr;
use crate::frame::DataFrame;
use crate::series::Series;
use ahash::RandomState;
use hashbrown::HashMap;
use lamina_common::error::Result;
use lamina_common::plan_err;

/// Partition the frame's row indices by the rendered compound key of
/// the given columns. Groups keep first-seen order, and rows within a
/// group keep their original order.
///
/// The compound key is each key column's string rendering, joined by a
/// zero byte so multi-column keys cannot collide by concatenation.
pub fn partition_indices(df: &DataFrame, keys: &[impl AsRef<str>]) -> Result<Vec<Vec<usize>>> {
    let key_columns = keys
        .iter()
        .map(|k| df.column(k.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let mut slots: HashMap<String, usize, RandomState> = HashMap::default();
    let mut groups: Vec<Vec<usize>> = vec![];
    for row in 0..df.height() {
        let mut key = String::new();
        for (i, column) in key_columns.iter().enumerate() {
            if i > 0 {
                key.push('\0');
            }
            key.push_str(&column.str_key(row));
        }
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(vec![]);
            groups.len() - 1
        });
        groups[slot].push(row);
    }
    Ok(groups)
}

/// The result of [`DataFrame::group_by`]: grouped row indices awaiting
/// an aggregation.
#[derive(Debug)]
pub struct GroupBy<'a> {
    df: &'a DataFrame,
    keys: Vec<String>,
    groups: Vec<Vec<usize>>,
}

impl<'a> GroupBy<'a> {
    pub(crate) fn new(df: &'a DataFrame, keys: &[impl AsRef<str>]) -> Result<GroupBy<'a>> {
        let groups = partition_indices(df, keys)?;
        Ok(GroupBy {
            df,
            keys: keys.iter().map(|k| k.as_ref().to_string()).collect(),
            groups,
        })
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Aggregate each group with the given named aggregate expressions.
    ///
    /// The output holds one row per group: the key columns (value of
    /// the group's first row) followed by one column per aggregation,
    /// in the order given.
    pub fn agg(&self, aggs: &[(String, FrameExpr)]) -> Result<DataFrame> {
        let firsts: Vec<usize> = self.groups.iter().map(|g| g[0]).collect();

        let mut columns = Vec::with_capacity(self.keys.len() + aggs.len());
        for key in &self.keys {
            columns.push(self.df.column(key)?.take(&firsts));
        }

        for (name, expr) in aggs {
            let FrameExpr::Aggregate { func, expr: input } = expr else {
                return plan_err!("group-by aggregation requires an aggregate expression, got {expr}");
            };
            let input = evaluate(self.df, input)?;
            let values = self
                .groups
                .iter()
                .map(|g| input.take(g).aggregate(*func))
                .collect::<Result<Vec<_>>>()?;
            columns.push(Series::from_scalars(name.clone(), &values)?);
        }

        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::col;
    use lamina_common::scalar::ScalarValue;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new_utf8("k", vec!["a", "a", "b"]),
            Series::new_i64("v", vec![1, 2, 3]),
        ])
        .unwrap()
    }

    #[test]
    fn partitions_keep_first_seen_order() {
        let df = frame();
        let groups = partition_indices(&df, &["k"]).unwrap();
        assert_eq!(groups, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn group_by_sum() {
        let df = frame();
        let out = df
            .group_by(&["k"])
            .unwrap()
            .agg(&[("v_sum".to_string(), col("v").sum())])
            .unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.width(), 2);
        assert_eq!(out.column("k").unwrap().get(0), ScalarValue::Utf8("a".into()));
        assert_eq!(out.column("v_sum").unwrap().get(0), ScalarValue::Int64(3));
        assert_eq!(out.column("v_sum").unwrap().get(1), ScalarValue::Int64(3));
    }

    #[test]
    fn compound_keys_do_not_collide() {
        let df = DataFrame::new(vec![
            Series::new_utf8("x", vec!["a", "ab"]),
            Series::new_utf8("y", vec!["bc", "c"]),
        ])
        .unwrap();
        let groups = partition_indices(&df, &["x", "y"]).unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn non_aggregate_expression_is_rejected() {
        let df = frame();
        let err = df
            .group_by(&["k"])
            .unwrap()
            .agg(&[("v".to_string(), col("v"))])
            .unwrap_err();
        assert!(matches!(err, lamina_common::error::LaminaError::Plan(_)));
    }
}
