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

//! Row-wise evaluation of [FrameExpr] against a [DataFrame].
//!
//! Evaluation shares its scalar kernels with the optimizer's constant
//! folder, so a folded expression and its unfolded form produce the
//! same column. Operations a kernel declines (a zero divisor, say)
//! surface as null in that row.

use crate::expr::FrameExpr;
use crate::frame::DataFrame;
use crate::series::Series;
use lamina_common::error::Result;
use lamina_common::exec_err;
use lamina_common::operator::{Operator, UnaryOperator};
use lamina_common::scalar::ScalarValue;
use lamina_common::types::{merge_numeric, DataType};

/// Evaluate `expr` against `df`, producing a column of `df.height()`
/// rows named after the expression's output name.
pub fn evaluate(df: &DataFrame, expr: &FrameExpr) -> Result<Series> {
    let series = evaluate_inner(df, expr)?;
    Ok(series.with_name(expr.output_name()))
}

fn evaluate_inner(df: &DataFrame, expr: &FrameExpr) -> Result<Series> {
    match expr {
        FrameExpr::Column(name) => Ok(df.column(name)?.clone()),
        FrameExpr::Literal(value) => broadcast(value, df.height()),
        FrameExpr::BinaryExpr { left, op, right } => {
            let l = evaluate_inner(df, left)?;
            let r = evaluate_inner(df, right)?;
            binary(&l, *op, &r)
        }
        FrameExpr::Unary { op, expr } => {
            let input = evaluate_inner(df, expr)?;
            unary(*op, &input)
        }
        FrameExpr::Aggregate { func, expr } => {
            let input = evaluate_inner(df, expr)?;
            let value = input.aggregate(*func)?;
            broadcast(&value, df.height())
        }
        FrameExpr::Alias { expr, .. } => evaluate_inner(df, expr),
        FrameExpr::Cast { expr, to } => evaluate_inner(df, expr)?.cast(*to),
    }
}

fn broadcast(value: &ScalarValue, height: usize) -> Result<Series> {
    let dtype = value.data_type();
    let values = vec![value.clone(); height];
    if dtype == DataType::Unknown {
        return exec_err!("cannot materialize a column from {value}");
    }
    Series::from_scalars_typed("literal", dtype, &values)
}

fn binary(left: &Series, op: Operator, right: &Series) -> Result<Series> {
    if left.len() != right.len() {
        return exec_err!(
            "binary expression over columns of different heights: {} vs {}",
            left.len(),
            right.len()
        );
    }
    if op.is_arithmetic() {
        let values: Vec<ScalarValue> = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| ScalarValue::arithmetic(op, &l, &r).unwrap_or(ScalarValue::Null))
            .collect();
        let out_type = merge_numeric(left.data_type(), right.data_type());
        if out_type == DataType::Unknown {
            // a null column on either side leaves the type to inference
            Series::from_scalars("", &values)
        } else {
            Series::from_scalars_typed("", out_type, &values)
        }
    } else if op.is_comparison() {
        let values: Vec<ScalarValue> = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| ScalarValue::compare(op, &l, &r).unwrap_or(ScalarValue::Null))
            .collect();
        Series::from_scalars_typed("", DataType::Boolean, &values)
    } else {
        let values: Vec<ScalarValue> = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| ScalarValue::logical(op, &l, &r).unwrap_or(ScalarValue::Null))
            .collect();
        Series::from_scalars_typed("", DataType::Boolean, &values)
    }
}

fn unary(op: UnaryOperator, input: &Series) -> Result<Series> {
    let values: Vec<ScalarValue> = input
        .iter()
        .map(|v| ScalarValue::unary(op, &v).unwrap_or(ScalarValue::Null))
        .collect();
    let out_type = match op {
        UnaryOperator::Negative => input.data_type(),
        _ => DataType::Boolean,
    };
    Series::from_scalars_typed("", out_type, &values)
}

/// Row positions where the boolean filter mask is true. Null rows are
/// dropped, matching conjunctive filter semantics.
pub fn filter_indices(mask: &Series) -> Result<Vec<usize>> {
    match mask.data_type() {
        DataType::Boolean | DataType::Null => {}
        other => return exec_err!("filter predicate must be boolean, got {other}"),
    }
    Ok((0..mask.len())
        .filter(|&i| matches!(mask.get(i), ScalarValue::Boolean(true)))
        .collect())
}
