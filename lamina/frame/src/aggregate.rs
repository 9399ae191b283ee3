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

//! Scalar aggregations over a single column.
//!
//! `count` yields `Int64`; `mean`, `std`, `var` and `median` yield
//! `Float64`; the remaining functions keep the input type. Nulls are
//! skipped, and an aggregation over no non-null values yields null
//! (`count` yields 0).

use crate::series::Series;
use lamina_common::error::Result;
use lamina_common::operator::{AggregateFunction, Operator};
use lamina_common::scalar::ScalarValue;
use lamina_common::exec_err;
use std::cmp::Ordering;

/// Reduce `series` with the given aggregate function.
pub fn aggregate_series(series: &Series, func: AggregateFunction) -> Result<ScalarValue> {
    let non_null: Vec<ScalarValue> = series.iter().filter(|v| !v.is_null()).collect();

    if func == AggregateFunction::Count {
        return Ok(ScalarValue::Int64(non_null.len() as i64));
    }
    if non_null.is_empty() {
        return Ok(ScalarValue::Null);
    }

    match func {
        AggregateFunction::Sum => sum(series, &non_null),
        AggregateFunction::Mean => {
            let total = float_sum(&non_null)?;
            Ok(ScalarValue::Float64(total / non_null.len() as f64))
        }
        AggregateFunction::Min => extremum(&non_null, Ordering::Less),
        AggregateFunction::Max => extremum(&non_null, Ordering::Greater),
        AggregateFunction::Std => {
            Ok(variance(&non_null)?.map(|v| ScalarValue::Float64(v.sqrt())).unwrap_or(ScalarValue::Null))
        }
        AggregateFunction::Var => {
            Ok(variance(&non_null)?.map(ScalarValue::Float64).unwrap_or(ScalarValue::Null))
        }
        AggregateFunction::First => Ok(non_null[0].clone()),
        AggregateFunction::Last => Ok(non_null[non_null.len() - 1].clone()),
        AggregateFunction::Median => median(&non_null),
        AggregateFunction::Count => unreachable!("count handled above"),
    }
}

fn sum(series: &Series, values: &[ScalarValue]) -> Result<ScalarValue> {
    let mut acc = values[0].clone();
    for value in &values[1..] {
        acc = match ScalarValue::arithmetic(Operator::Plus, &acc, value) {
            Some(v) => v,
            None => return exec_err!("cannot sum values of type {}", series.data_type()),
        };
    }
    // the kernel widens to i64/f64; restore the input type
    Ok(acc.cast_to(series.data_type()))
}

fn float_sum(values: &[ScalarValue]) -> Result<f64> {
    values.iter().try_fold(0f64, |acc, v| match v.to_f64() {
        Some(x) => Ok(acc + x),
        None => exec_err!("cannot average values of type {}", v.data_type()),
    })
}

fn extremum(values: &[ScalarValue], keep: Ordering) -> Result<ScalarValue> {
    let mut best = values[0].clone();
    for value in &values[1..] {
        match value.order(&best) {
            Some(ordering) if ordering == keep => best = value.clone(),
            Some(_) => {}
            None => return exec_err!("values of type {} do not order", value.data_type()),
        }
    }
    Ok(best)
}

// sample variance with the n-1 denominator; fewer than two values is null
fn variance(values: &[ScalarValue]) -> Result<Option<f64>> {
    if values.len() < 2 {
        return Ok(None);
    }
    let n = values.len() as f64;
    let mean = float_sum(values)? / n;
    let squares = values.iter().try_fold(0f64, |acc, v| match v.to_f64() {
        Some(x) => Ok(acc + (x - mean) * (x - mean)),
        None => exec_err!("cannot compute variance of type {}", v.data_type()),
    })?;
    Ok(Some(squares / (n - 1.0)))
}

fn median(values: &[ScalarValue]) -> Result<ScalarValue> {
    let mut floats = Vec::with_capacity(values.len());
    for value in values {
        match value.to_f64() {
            Some(x) => floats.push(x),
            None => return exec_err!("cannot compute a median of type {}", value.data_type()),
        }
    }
    floats.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = floats.len() / 2;
    let out = if floats.len() % 2 == 1 {
        floats[mid]
    } else {
        (floats[mid - 1] + floats[mid]) / 2.0
    };
    Ok(ScalarValue::Float64(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_common::types::DataType;

    #[test]
    fn sum_keeps_input_type() {
        let s = Series::new_i32("v", vec![1, 2, 3]);
        assert_eq!(s.aggregate(AggregateFunction::Sum).unwrap(), ScalarValue::Int32(6));
    }

    #[test]
    fn count_skips_nulls_and_is_int64() {
        let s = Series::new_opt_i64("v", vec![Some(1), None, Some(3)]);
        let out = s.aggregate(AggregateFunction::Count).unwrap();
        assert_eq!(out, ScalarValue::Int64(2));
        assert_eq!(out.data_type(), DataType::Int64);
    }

    #[test]
    fn mean_and_median_are_float64() {
        let s = Series::new_i64("v", vec![1, 2, 3, 4]);
        assert_eq!(
            s.aggregate(AggregateFunction::Mean).unwrap(),
            ScalarValue::Float64(2.5)
        );
        assert_eq!(
            s.aggregate(AggregateFunction::Median).unwrap(),
            ScalarValue::Float64(2.5)
        );
    }

    #[test]
    fn sample_variance() {
        let s = Series::new_f64("v", vec![1.0, 2.0, 3.0]);
        assert_eq!(
            s.aggregate(AggregateFunction::Var).unwrap(),
            ScalarValue::Float64(1.0)
        );
        let single = Series::new_f64("v", vec![1.0]);
        assert_eq!(
            single.aggregate(AggregateFunction::Var).unwrap(),
            ScalarValue::Null
        );
    }

    #[test]
    fn min_max_over_strings() {
        let s = Series::new_utf8("s", vec!["pear", "apple", "plum"]);
        assert_eq!(
            s.aggregate(AggregateFunction::Min).unwrap(),
            ScalarValue::Utf8("apple".into())
        );
        assert_eq!(
            s.aggregate(AggregateFunction::Max).unwrap(),
            ScalarValue::Utf8("plum".into())
        );
    }

    #[test]
    fn first_last_skip_nulls() {
        let s = Series::new_opt_i64("v", vec![None, Some(7), Some(9), None]);
        assert_eq!(
            s.aggregate(AggregateFunction::First).unwrap(),
            ScalarValue::Int64(7)
        );
        assert_eq!(
            s.aggregate(AggregateFunction::Last).unwrap(),
            ScalarValue::Int64(9)
        );
    }

    #[test]
    fn empty_aggregations() {
        let s = Series::new_opt_i64("v", vec![None, None]);
        assert_eq!(s.aggregate(AggregateFunction::Sum).unwrap(), ScalarValue::Null);
        assert_eq!(
            s.aggregate(AggregateFunction::Count).unwrap(),
            ScalarValue::Int64(0)
        );
    }
}
