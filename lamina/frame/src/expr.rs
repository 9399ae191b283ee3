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

//! The table's own expression handle, accepted by [`DataFrame::filter`],
//! [`DataFrame::with_column`] and group-by aggregation.
//!
//! [`DataFrame::filter`]: crate::frame::DataFrame::filter
//! [`DataFrame::with_column`]: crate::frame::DataFrame::with_column

use lamina_common::operator::{AggregateFunction, Operator, UnaryOperator};
use lamina_common::scalar::ScalarValue;
use lamina_common::types::DataType;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Div, Mul, Sub};

/// An eager expression evaluated row-wise against a
/// [`DataFrame`](crate::frame::DataFrame).
#[derive(Debug, Clone, PartialEq)]
pub enum FrameExpr {
    /// Reference to a column by name
    Column(String),
    /// A constant value
    Literal(ScalarValue),
    /// Binary expression such as `a + b` or `a > b`
    BinaryExpr {
        left: Box<FrameExpr>,
        op: Operator,
        right: Box<FrameExpr>,
    },
    /// Unary expression such as `NOT a` or `a IS NULL`
    Unary {
        op: UnaryOperator,
        expr: Box<FrameExpr>,
    },
    /// Aggregation of the input expression to a single value
    Aggregate {
        func: AggregateFunction,
        expr: Box<FrameExpr>,
    },
    /// Renames the output of the inner expression
    Alias { expr: Box<FrameExpr>, name: String },
    /// Converts the inner expression to another type
    Cast { expr: Box<FrameExpr>, to: DataType },
}

/// Create a column reference expression.
pub fn col(name: impl Into<String>) -> FrameExpr {
    FrameExpr::Column(name.into())
}

/// Create a literal expression.
pub fn lit(value: impl Into<ScalarValue>) -> FrameExpr {
    FrameExpr::Literal(value.into())
}

macro_rules! binary_method {
    ($fn_name:ident, $op:ident) => {
        pub fn $fn_name(self, rhs: FrameExpr) -> FrameExpr {
            FrameExpr::BinaryExpr {
                left: Box::new(self),
                op: Operator::$op,
                right: Box::new(rhs),
            }
        }
    };
}

macro_rules! agg_method {
    ($fn_name:ident, $func:ident) => {
        pub fn $fn_name(self) -> FrameExpr {
            FrameExpr::Aggregate {
                func: AggregateFunction::$func,
                expr: Box::new(self),
            }
        }
    };
}

impl FrameExpr {
    binary_method!(eq, Eq);
    binary_method!(neq, NotEq);
    binary_method!(lt, Lt);
    binary_method!(lt_eq, LtEq);
    binary_method!(gt, Gt);
    binary_method!(gt_eq, GtEq);
    binary_method!(and, And);
    binary_method!(or, Or);

    agg_method!(sum, Sum);
    agg_method!(mean, Mean);
    agg_method!(min, Min);
    agg_method!(max, Max);
    agg_method!(count, Count);
    agg_method!(std, Std);
    agg_method!(var, Var);
    agg_method!(first, First);
    agg_method!(last, Last);
    agg_method!(median, Median);

    pub fn not(self) -> FrameExpr {
        FrameExpr::Unary {
            op: UnaryOperator::Not,
            expr: Box::new(self),
        }
    }

    pub fn neg(self) -> FrameExpr {
        FrameExpr::Unary {
            op: UnaryOperator::Negative,
            expr: Box::new(self),
        }
    }

    pub fn is_null(self) -> FrameExpr {
        FrameExpr::Unary {
            op: UnaryOperator::IsNull,
            expr: Box::new(self),
        }
    }

    pub fn is_not_null(self) -> FrameExpr {
        FrameExpr::Unary {
            op: UnaryOperator::IsNotNull,
            expr: Box::new(self),
        }
    }

    pub fn alias(self, name: impl Into<String>) -> FrameExpr {
        FrameExpr::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    pub fn cast(self, to: DataType) -> FrameExpr {
        FrameExpr::Cast {
            expr: Box::new(self),
            to,
        }
    }

    /// The column name this expression produces.
    pub fn output_name(&self) -> String {
        match self {
            FrameExpr::Column(name) => name.clone(),
            FrameExpr::Alias { name, .. } => name.clone(),
            FrameExpr::Aggregate { func, expr } => {
                format!("{}_{}", expr.output_name(), func)
            }
            FrameExpr::Literal(_) => "literal".to_string(),
            FrameExpr::BinaryExpr { left, .. } => left.output_name(),
            FrameExpr::Unary { expr, .. } | FrameExpr::Cast { expr, .. } => expr.output_name(),
        }
    }
}

macro_rules! impl_arith_op {
    ($trait:ident, $fn_name:ident, $op:ident) => {
        impl $trait for FrameExpr {
            type Output = FrameExpr;

            fn $fn_name(self, rhs: FrameExpr) -> FrameExpr {
                FrameExpr::BinaryExpr {
                    left: Box::new(self),
                    op: Operator::$op,
                    right: Box::new(rhs),
                }
            }
        }
    };
}

impl_arith_op!(Add, add, Plus);
impl_arith_op!(Sub, sub, Minus);
impl_arith_op!(Mul, mul, Multiply);
impl_arith_op!(Div, div, Divide);

impl Display for FrameExpr {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            FrameExpr::Column(name) => write!(f, "col({name})"),
            FrameExpr::Literal(value) => write!(f, "lit({value})"),
            FrameExpr::BinaryExpr { left, op, right } => write!(f, "({left} {op} {right})"),
            FrameExpr::Unary { op, expr } => match op {
                UnaryOperator::Not | UnaryOperator::Negative => write!(f, "{op} {expr}"),
                _ => write!(f, "{expr} {op}"),
            },
            FrameExpr::Aggregate { func, expr } => write!(f, "{expr}.{func}()"),
            FrameExpr::Alias { expr, name } => write!(f, "{expr} AS {name}"),
            FrameExpr::Cast { expr, to } => write!(f, "cast({expr} AS {to})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        assert_eq!(col("a").output_name(), "a");
        assert_eq!(col("v").sum().output_name(), "v_sum");
        assert_eq!((col("a") + lit(1)).output_name(), "a");
        assert_eq!(col("a").alias("b").output_name(), "b");
        assert_eq!(lit(1).output_name(), "literal");
    }

    #[test]
    fn display() {
        let e = (col("a") + lit(1)).gt(lit(2.5));
        assert_eq!(e.to_string(), "((col(a) + lit(1)) > lit(2.5))");
    }
}
